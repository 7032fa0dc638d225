// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::model::{FieldValue, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Number,
    Bool,
    Date,
    DateTime,
}

impl ColumnKind {
    pub const fn is_temporal(self) -> bool {
        matches!(self, Self::Date | Self::DateTime)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: ColumnKind,
    pub required: bool,
    /// Other spellings the backend uses for this field.
    pub remote_aliases: &'static [&'static str],
    /// Name written in outbound bodies when the backend reads a different one.
    pub remote_key: Option<&'static str>,
}

impl Column {
    const fn text(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            kind: ColumnKind::Text,
            required: false,
            remote_aliases: &[],
            remote_key: None,
        }
    }

    const fn of(key: &'static str, label: &'static str, kind: ColumnKind) -> Self {
        Self {
            key,
            label,
            kind,
            required: false,
            remote_aliases: &[],
            remote_key: None,
        }
    }

    const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    const fn aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.remote_aliases = aliases;
        self
    }

    const fn sends_as(mut self, remote_key: &'static str) -> Self {
        self.remote_key = Some(remote_key);
        self
    }

    pub fn wire_key(&self) -> &'static str {
        self.remote_key.unwrap_or(self.key)
    }

    pub fn answers_to(&self, remote_key: &str) -> bool {
        self.key == remote_key
            || self.remote_key == Some(remote_key)
            || self.remote_aliases.contains(&remote_key)
            || self.key.eq_ignore_ascii_case(remote_key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabPredicate {
    Any,
    Equals {
        field: &'static str,
        value: &'static str,
    },
    NotEquals {
        field: &'static str,
        value: &'static str,
    },
    Flag {
        field: &'static str,
        expected: bool,
    },
}

impl TabPredicate {
    pub fn matches(&self, record: &Record) -> bool {
        match *self {
            Self::Any => true,
            Self::Equals { field, value } => record.text(field) == Some(value),
            Self::NotEquals { field, value } => record.text(field) != Some(value),
            Self::Flag { field, expected } => flag_value(record.get(field)) == expected,
        }
    }
}

fn flag_value(value: Option<&FieldValue>) -> bool {
    match value {
        Some(FieldValue::Bool(flag)) => *flag,
        Some(FieldValue::Text(text)) => text.eq_ignore_ascii_case("true"),
        Some(FieldValue::Number(number)) => *number != 0.0,
        Some(FieldValue::Null) | None => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tab {
    pub key: &'static str,
    pub label: &'static str,
    pub predicate: TabPredicate,
}

pub const TAB_ALL: Tab = Tab {
    key: "all",
    label: "All",
    predicate: TabPredicate::Any,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMethod {
    Get,
    /// POST with `{"email": <user>}` as the body.
    Post,
}

/// Paths are relative to the configured API base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointFamily {
    pub fetch_method: FetchMethod,
    pub fetch_path: &'static str,
    pub add_path: &'static str,
    pub update_path: &'static str,
    pub delete_path: &'static str,
    /// Key carrying the acting user in a delete body.
    pub delete_user_key: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntitySchema {
    pub name: &'static str,
    pub title: &'static str,
    pub columns: &'static [Column],
    pub tabs: &'static [Tab],
    pub endpoints: EndpointFamily,
    pub created_at_field: Option<&'static str>,
    pub updated_at_field: Option<&'static str>,
    pub page_size: usize,
}

impl EntitySchema {
    pub const ALL: [&'static Self; 6] = [
        &SUPPLIERS,
        &CUSTOMER_ORDERS,
        &DELIVERY_NOTICES,
        &MATERIAL_INQUIRIES,
        &MATERIAL_REPLENISHMENT,
        &DAILY_WORK_REPORTS,
    ];

    pub fn builtin(name: &str) -> Option<&'static Self> {
        Self::ALL.into_iter().find(|schema| schema.name == name)
    }

    pub fn column(&self, key: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.key == key)
    }

    /// Canonical column for a key as spelled by the backend.
    pub fn column_for_remote(&self, remote_key: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|column| column.key == remote_key)
            .or_else(|| self.columns.iter().find(|column| column.answers_to(remote_key)))
    }

    pub fn tab(&self, key: &str) -> Option<&Tab> {
        self.tabs.iter().find(|tab| tab.key == key)
    }

    pub fn default_tab(&self) -> &Tab {
        self.tabs.first().unwrap_or(&TAB_ALL)
    }

    pub fn export_file_name(&self, date: time::Date) -> String {
        format!(
            "{}-data-{:04}-{:02}-{:02}.csv",
            self.name,
            date.year(),
            u8::from(date.month()),
            date.day()
        )
    }
}

const MONITORED_BY_STATUS: [Tab; 3] = [
    TAB_ALL,
    Tab {
        key: "monitored",
        label: "Monitored",
        predicate: TabPredicate::Equals {
            field: "status",
            value: "Active",
        },
    },
    Tab {
        key: "unmonitored",
        label: "Unmonitored",
        predicate: TabPredicate::NotEquals {
            field: "status",
            value: "Active",
        },
    },
];

pub const SUPPLIERS: EntitySchema = EntitySchema {
    name: "suppliers",
    title: "Supplier Information",
    columns: &[
        Column::text("supplierNumber", "Supplier No").aliases(&["customerNumber", "SupplierNumber"]),
        Column::text("supplier", "Supplier")
            .required()
            .aliases(&["Customer", "customer", "Supplier"]),
        Column::text("buyer", "Buyer").aliases(&["Buyer"]),
        Column::text("secondOrderClassification", "Second Order Classification")
            .aliases(&["SecondOrderClassification"]),
        Column::text("status", "Status").aliases(&["Status"]),
        Column::text("documentStatus", "Document Status").aliases(&["DocumentStatus"]),
        Column::text("abnormalInfo", "Abnormal Info").aliases(&["AbnormalInfo"]),
        Column::text("invitee", "Invitee").aliases(&["Invite", "Invitee"]),
        Column::text("reAuthPerson", "Re-Auth Person").aliases(&["ReAuthPerson"]),
        Column::text("contactInfo", "Contact Info").aliases(&["ContactInfo"]),
        Column::of("invitationDate", "Invitation Date", ColumnKind::Date)
            .aliases(&["InvitationDate"]),
    ],
    tabs: &MONITORED_BY_STATUS,
    endpoints: EndpointFamily {
        fetch_method: FetchMethod::Post,
        fetch_path: "suppliers/get-data",
        add_path: "supplier/add-material",
        update_path: "suppliers/update-data",
        delete_path: "suppliers/delete-data",
        delete_user_key: "user",
    },
    created_at_field: None,
    updated_at_field: None,
    page_size: 10,
};

pub const CUSTOMER_ORDERS: EntitySchema = EntitySchema {
    name: "customer-orders",
    title: "Customer Orders",
    columns: &[
        Column::text("customerNumber", "Customer No").aliases(&["CustomerNumber"]),
        Column::text("customer", "Customer")
            .required()
            .aliases(&["Customer"]),
        Column::text("buyer", "Buyer").aliases(&["Buyer"]),
        Column::text("platformNo", "Platform No").aliases(&["PlatformNo", "platformNumber"]),
        Column::text("poNo", "PO No").aliases(&["PoNo", "PONo", "poNumber"]),
        Column::of("purchaseDate", "Purchase Date", ColumnKind::Date).aliases(&["PurchaseDate"]),
        Column::of("orderAmount", "Order Amount", ColumnKind::Number).aliases(&["OrderAmount"]),
        Column::text("currency", "Currency").aliases(&["Currency"]),
        Column::text("purchasingDepartment", "Purchasing Department")
            .aliases(&["PurchasingDepartment"]),
        Column::text("purchaser", "Purchaser").aliases(&["Purchaser"]),
        Column::text("requisitionBusinessGroup", "Requisition Business Group")
            .aliases(&["RequisitionBusinessGroup"]),
        Column::text("deliveryStatus", "Delivery Status").aliases(&["DeliveryStatus"]),
        Column::text("orderStatus", "Order Status").aliases(&["OrderStatus"]),
        Column::text("acceptanceStatus", "Acceptance Status").aliases(&["AcceptanceStatus"]),
        Column::text("statementStatus", "Statement Status").aliases(&["StatementStatus"]),
    ],
    tabs: &[
        TAB_ALL,
        Tab {
            key: "open",
            label: "Open",
            predicate: TabPredicate::NotEquals {
                field: "orderStatus",
                value: "Completed",
            },
        },
        Tab {
            key: "completed",
            label: "Completed",
            predicate: TabPredicate::Equals {
                field: "orderStatus",
                value: "Completed",
            },
        },
    ],
    endpoints: EndpointFamily {
        fetch_method: FetchMethod::Post,
        fetch_path: "customer/get-data",
        add_path: "customer/add-data",
        update_path: "customer/update-data",
        delete_path: "customer/delete-data",
        delete_user_key: "user",
    },
    created_at_field: None,
    updated_at_field: None,
    page_size: 10,
};

pub const DELIVERY_NOTICES: EntitySchema = EntitySchema {
    name: "delivery-notices",
    title: "Customer Delivery Notices",
    columns: &[
        Column::text("orderNumber", "Order Number").aliases(&["OrderNumber"]),
        Column::text("customer", "Customer").aliases(&["Customer"]),
        Column::text("deliveryNoticeNo", "Delivery Notice No").aliases(&["DeliveryNoticeNo"]),
        Column::text("materialCategory", "Material Category").aliases(&["MaterialCategory"]),
        Column::text("vendor", "Vendor").aliases(&["Vendor"]),
        Column::text("invitee", "Invitee").aliases(&["Invitee", "Invite"]),
        Column::text("hostInviterContactInfo", "Host/Inviter Contact Info")
            .aliases(&["HostInviterContactInfo"]),
        Column::text("sender", "Sender").aliases(&["Sender", "creator"]),
        Column::text("status", "Status").aliases(&["Status"]),
        Column::text("orderStatus", "Order Status").aliases(&["OrderStatus"]),
        Column::text("supplementTemplate", "Supplement Template")
            .aliases(&["SupplementTemplate"]),
        Column::of("startTime", "Start Time", ColumnKind::DateTime).aliases(&["StartTime"]),
        Column::of("endTime", "End Time", ColumnKind::DateTime).aliases(&["EndTime"]),
        Column::of("urgentMaterial", "Urgent Material", ColumnKind::Bool)
            .aliases(&["UrgentMaterial"]),
        Column::of("isMonitored", "Monitored", ColumnKind::Bool).aliases(&["IsMonitored"]),
        Column::of("createTime", "Create Time", ColumnKind::DateTime)
            .aliases(&["createdTime", "CreateTime"]),
    ],
    tabs: &[
        TAB_ALL,
        Tab {
            key: "monitored",
            label: "Monitored",
            predicate: TabPredicate::Flag {
                field: "isMonitored",
                expected: true,
            },
        },
        Tab {
            key: "unmonitored",
            label: "Unmonitored",
            predicate: TabPredicate::Flag {
                field: "isMonitored",
                expected: false,
            },
        },
    ],
    endpoints: EndpointFamily {
        fetch_method: FetchMethod::Get,
        fetch_path: "customerdelivery/get-all",
        add_path: "customerdelivery/add-data",
        update_path: "customerdelivery/update-data",
        delete_path: "customerdelivery/delete-data",
        delete_user_key: "user",
    },
    created_at_field: Some("createTime"),
    updated_at_field: None,
    page_size: 10,
};

pub const MATERIAL_INQUIRIES: EntitySchema = EntitySchema {
    name: "material-inquiries",
    title: "Material Inquiry",
    columns: &[
        Column::text("supplierMaterial", "Supplier Material")
            .required()
            .aliases(&["SupplierMaterial"])
            .sends_as("Suppliermaterial"),
        Column::text("supplementOrderNumber", "Supplement Order Number")
            .aliases(&["orderNumber"])
            .sends_as("OrderNumber"),
        Column::text("status", "Status").aliases(&["Status"]),
        Column::text("explanation", "Explanation")
            .aliases(&["Explanation"])
            .sends_as("explaination"),
        Column::of("createTime", "Create Time", ColumnKind::DateTime)
            .aliases(&["CreateTime"])
            .sends_as("createdTime"),
        Column::of("updateTime", "Update Time", ColumnKind::DateTime)
            .aliases(&["updatedTime", "UpdateTime"]),
    ],
    tabs: &MONITORED_BY_STATUS,
    endpoints: EndpointFamily {
        fetch_method: FetchMethod::Post,
        fetch_path: "material-inquiry/get-data",
        add_path: "material-inquiry/add-material",
        update_path: "material-inquiry/update-data",
        delete_path: "material-inquiry/delete-material",
        delete_user_key: "email",
    },
    created_at_field: Some("createTime"),
    updated_at_field: Some("updateTime"),
    page_size: 10,
};

pub const MATERIAL_REPLENISHMENT: EntitySchema = EntitySchema {
    name: "material-replenishment",
    title: "Material Replenishment",
    columns: &[
        Column::text("orderNumber", "Order Number")
            .required()
            .aliases(&["OrderNumber"]),
        Column::text("materialCategory", "Material Category").aliases(&["MaterialCategory"]),
        Column::text("vendor", "Vendor").aliases(&["Vendor"]),
        Column::text("invitee", "Invitee").aliases(&["Invitee", "Invite"]),
        Column::text("hostInviterContactInfo", "Host/Inviter Contact Info")
            .aliases(&["HostInviterContactInfo"]),
        Column::text("sender", "Sender").aliases(&["Sender"]),
        Column::text("status", "Status").aliases(&["Status"]),
        Column::text("supplementTemplate", "Supplement Template")
            .aliases(&["SupplementTemplate"]),
        Column::of("createTime", "Create Time", ColumnKind::DateTime)
            .aliases(&["createdTime", "CreateTime"]),
        Column::of("updateTime", "Update Time", ColumnKind::DateTime)
            .aliases(&["updatedTime", "UpdateTime"]),
    ],
    tabs: &MONITORED_BY_STATUS,
    endpoints: EndpointFamily {
        fetch_method: FetchMethod::Post,
        fetch_path: "material-replenishment/get-data",
        add_path: "material-replenishment/add-data",
        update_path: "material-replenishment/update-data",
        delete_path: "material-replenishment/delete-data",
        delete_user_key: "email",
    },
    created_at_field: Some("createTime"),
    updated_at_field: Some("updateTime"),
    page_size: 10,
};

pub const DAILY_WORK_REPORTS: EntitySchema = EntitySchema {
    name: "daily-work-reports",
    title: "Daily Work Report",
    columns: &[
        Column::text("companyName", "Company Name")
            .required()
            .aliases(&["CompanyName"]),
        Column::text("projectName", "Project Name").aliases(&["ProjectName"]),
        Column::text("supervisorName", "Supervisor").aliases(&["SupervisorName"]),
        Column::text("managerName", "Manager").aliases(&["ManagerName"]),
        Column::text("prepaidBy", "Prepaid By").aliases(&["PrepaidBy"]),
        Column::of("employees", "Employees", ColumnKind::Number).aliases(&["Employees"]),
        Column::text("workType", "Work Type").aliases(&["WorkType"]),
        Column::text("progress", "Progress").aliases(&["Progress"]),
        Column::of("hours", "Hours", ColumnKind::Number).aliases(&["Hours"]),
        Column::of("charges", "Charges", ColumnKind::Number).aliases(&["Charges"]),
        Column::of("date", "Date", ColumnKind::Date).aliases(&["Date"]),
    ],
    tabs: &[TAB_ALL],
    endpoints: EndpointFamily {
        fetch_method: FetchMethod::Post,
        fetch_path: "dailywork/get-data",
        add_path: "dailywork/add-data",
        update_path: "dailywork/update-data",
        delete_path: "dailywork/delete-data",
        delete_user_key: "user",
    },
    created_at_field: Some("date"),
    updated_at_field: None,
    page_size: 10,
};

#[cfg(test)]
mod tests {
    use super::{DELIVERY_NOTICES, EntitySchema, MATERIAL_INQUIRIES, SUPPLIERS, TabPredicate};
    use crate::model::Record;
    use std::collections::HashSet;

    #[test]
    fn builtin_names_are_unique_and_resolvable() {
        let mut seen = HashSet::new();
        for schema in EntitySchema::ALL {
            assert!(seen.insert(schema.name), "duplicate schema {}", schema.name);
            assert_eq!(EntitySchema::builtin(schema.name), Some(schema));
            assert!(!schema.columns.is_empty(), "schema {}", schema.name);
            assert_eq!(schema.default_tab().key, "all", "schema {}", schema.name);
            assert!(schema.page_size > 0);
        }
        assert!(EntitySchema::builtin("nope").is_none());
    }

    #[test]
    fn column_keys_are_unique_per_schema() {
        for schema in EntitySchema::ALL {
            let mut keys = HashSet::new();
            for column in schema.columns {
                assert!(keys.insert(column.key), "{}: {}", schema.name, column.key);
            }
            if let Some(field) = schema.created_at_field {
                assert!(schema.column(field).is_some(), "{}: {field}", schema.name);
            }
        }
    }

    #[test]
    fn remote_aliases_resolve_to_canonical_columns() {
        assert_eq!(
            SUPPLIERS.column_for_remote("Status").map(|c| c.key),
            Some("status")
        );
        assert_eq!(
            SUPPLIERS.column_for_remote("Customer").map(|c| c.key),
            Some("supplier")
        );
        assert_eq!(
            SUPPLIERS.column_for_remote("CONTACTINFO").map(|c| c.key),
            Some("contactInfo")
        );
        assert!(SUPPLIERS.column_for_remote("user").is_none());
    }

    #[test]
    fn wire_keys_resolve_back_to_their_columns() {
        for schema in EntitySchema::ALL {
            for column in schema.columns {
                assert_eq!(
                    schema.column_for_remote(column.wire_key()).map(|c| c.key),
                    Some(column.key),
                    "{}: {}",
                    schema.name,
                    column.key
                );
            }
        }
        let explanation = MATERIAL_INQUIRIES.column("explanation").expect("explanation");
        assert_eq!(explanation.wire_key(), "explaination");
        assert_eq!(SUPPLIERS.column("buyer").map(|c| c.wire_key()), Some("buyer"));
    }

    #[test]
    fn status_tabs_split_active_rows() {
        let active = Record::new(1).with("status", "Active");
        let inactive = Record::new(2).with("status", "Inactive");
        let missing = Record::new(3);

        let monitored = SUPPLIERS.tab("monitored").expect("monitored tab");
        let unmonitored = SUPPLIERS.tab("unmonitored").expect("unmonitored tab");

        assert!(monitored.predicate.matches(&active));
        assert!(!monitored.predicate.matches(&inactive));
        assert!(unmonitored.predicate.matches(&inactive));
        assert!(unmonitored.predicate.matches(&missing));
    }

    #[test]
    fn flag_tabs_accept_bool_and_text_flags() {
        let monitored = DELIVERY_NOTICES.tab("monitored").expect("monitored tab");
        assert!(
            monitored
                .predicate
                .matches(&Record::new(1).with("isMonitored", true))
        );
        assert!(
            monitored
                .predicate
                .matches(&Record::new(2).with("isMonitored", "TRUE"))
        );
        assert!(!monitored.predicate.matches(&Record::new(3)));
        assert!(TabPredicate::Any.matches(&Record::new(4)));
    }

    #[test]
    fn export_file_name_uses_iso_date() {
        let date = time::macros::date!(2026 - 03 - 07);
        assert_eq!(
            SUPPLIERS.export_file_name(date),
            "suppliers-data-2026-03-07.csv"
        );
    }
}

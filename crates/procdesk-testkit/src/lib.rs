// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use procdesk_app::{Record, RecordId, RemoteSource, Session};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use time::macros::date;
use time::{Date, Duration};

const SUPPLIER_NAMES: [&str; 12] = [
    "Apex Metals",
    "Summit Plastics",
    "Heritage Fasteners",
    "Eagle Logistics",
    "Greenleaf Packaging",
    "Central Electronics",
    "Reliable Castings",
    "Bright Optics",
    "Quality Resins",
    "Hartley Tooling",
    "Sparks Components",
    "Premier Textiles",
];

const FIRST_NAMES: [&str; 16] = [
    "Avery", "Jordan", "Taylor", "Riley", "Morgan", "Casey", "Alex", "Quinn", "Parker", "Drew",
    "Kai", "Elliot", "Robin", "Cameron", "Hayden", "Rowan",
];
const LAST_NAMES: [&str; 18] = [
    "Walker", "Martin", "Hill", "Evans", "Lopez", "Gray", "Ward", "Young", "Diaz", "Reed",
    "Campbell", "Turner", "Flores", "Bennett", "Price", "Morris", "Foster", "Brooks",
];

const MATERIAL_CATEGORIES: [&str; 8] = [
    "Raw Material",
    "Packaging",
    "Electronics",
    "Fasteners",
    "Chemicals",
    "Castings",
    "Textiles",
    "Spare Parts",
];

const DOCUMENT_STATUSES: [&str; 3] = ["Pending", "Completed", "Rejected"];
const ORDER_STATUSES: [&str; 4] = ["Pending", "Processing", "Delayed", "Completed"];
const DELIVERY_STATUSES: [&str; 3] = ["Shipped", "Delivered", "Pending"];
const CURRENCIES: [&str; 4] = ["USD", "EUR", "CNY", "JPY"];
const WORK_TYPES: [&str; 5] = ["Assembly", "Inspection", "Installation", "Repair", "Survey"];

const REFERENCE_DATE: Date = date!(2026 - 01 - 01);

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

/// Seeded generator of plausible back-office rows, one method per view.
#[derive(Debug, Clone)]
pub struct ProcurementFaker {
    rng: DeterministicRng,
    next_id: i64,
}

impl ProcurementFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            next_id: 1,
        }
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    pub fn supplier(&mut self) -> Record {
        let id = self.take_id();
        let status = if self.rng.bool() { "Active" } else { "Inactive" };
        Record::new(id)
            .with("supplierNumber", format!("S-{:05}", 10_000 + id))
            .with("supplier", self.pick(&SUPPLIER_NAMES))
            .with("buyer", self.person())
            .with("secondOrderClassification", self.pick(&["A", "B", "C"]))
            .with("status", status)
            .with("documentStatus", self.pick(&DOCUMENT_STATUSES))
            .with("abnormalInfo", self.pick(&["None", "Delayed", "Quality hold"]))
            .with("invitee", self.person())
            .with("reAuthPerson", self.person())
            .with("contactInfo", self.phone())
            .with("invitationDate", self.date_text())
    }

    pub fn customer_order(&mut self) -> Record {
        let id = self.take_id();
        let amount = self.int_range(500, 250_000) as f64;
        Record::new(id)
            .with("customerNumber", format!("C-{:05}", 20_000 + id))
            .with("customer", self.pick(&SUPPLIER_NAMES))
            .with("buyer", self.person())
            .with("platformNo", format!("PL-{}", self.int_range(1_000, 9_999)))
            .with("poNo", format!("PO-{}", self.int_range(100_000, 999_999)))
            .with("purchaseDate", self.date_text())
            .with("orderAmount", amount)
            .with("currency", self.pick(&CURRENCIES))
            .with("purchasingDepartment", self.pick(&["Operations", "Facilities", "R&D"]))
            .with("purchaser", self.person())
            .with("requisitionBusinessGroup", self.pick(&["North", "South", "Export"]))
            .with("deliveryStatus", self.pick(&DELIVERY_STATUSES))
            .with("orderStatus", self.pick(&ORDER_STATUSES))
            .with("acceptanceStatus", self.pick(&["Accepted", "Rejected", "Pending"]))
            .with("statementStatus", self.pick(&["Generated", "Pending"]))
    }

    pub fn delivery_notice(&mut self) -> Record {
        let id = self.take_id();
        let start = self.date_text();
        Record::new(id)
            .with("orderNumber", format!("ORD-{}", self.int_range(1_000, 9_999)))
            .with("customer", self.pick(&SUPPLIER_NAMES))
            .with("deliveryNoticeNo", format!("DN-{}", self.int_range(10_000, 99_999)))
            .with("materialCategory", self.pick(&MATERIAL_CATEGORIES))
            .with("vendor", self.pick(&SUPPLIER_NAMES))
            .with("sender", self.person())
            .with("status", "Active")
            .with("orderStatus", self.pick(&ORDER_STATUSES))
            .with("startTime", format!("{start}T08:00:00Z"))
            .with("endTime", format!("{start}T17:00:00Z"))
            .with("urgentMaterial", self.rng.bool())
            .with("isMonitored", self.rng.bool())
    }

    pub fn material_inquiry(&mut self) -> Record {
        let id = self.take_id();
        let created = self.date_text();
        Record::new(id)
            .with("supplierMaterial", self.pick(&MATERIAL_CATEGORIES))
            .with("supplementOrderNumber", format!("SO-{}", self.int_range(1_000, 9_999)))
            .with("status", if self.rng.bool() { "Active" } else { "Closed" })
            .with("explanation", "awaiting supplier confirmation")
            .with("createTime", format!("{created}T09:00"))
            .with("updateTime", format!("{created}T09:00"))
    }

    pub fn daily_work_report(&mut self) -> Record {
        let id = self.take_id();
        Record::new(id)
            .with("companyName", self.pick(&SUPPLIER_NAMES))
            .with("projectName", format!("Line {}", self.int_range(1, 12)))
            .with("supervisorName", self.person())
            .with("managerName", self.person())
            .with("prepaidBy", self.pick(&["Customer", "Vendor"]))
            .with("employees", self.int_range(1, 40) as f64)
            .with("workType", self.pick(&WORK_TYPES))
            .with("progress", format!("{}%", self.int_range(0, 100)))
            .with("hours", self.int_range(1, 12) as f64)
            .with("charges", self.int_range(100, 5_000) as f64)
            .with("date", self.date_text())
    }

    pub fn suppliers(&mut self, count: usize) -> Vec<Record> {
        (0..count).map(|_| self.supplier()).collect()
    }

    fn take_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn int_range(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = max - min + 1;
        min + (self.rng.next_u64() % (span as u64)) as i64
    }

    fn person(&mut self) -> String {
        format!("{} {}", self.pick(&FIRST_NAMES), self.pick(&LAST_NAMES))
    }

    fn phone(&mut self) -> String {
        format!(
            "{:03}-{:03}-{:04}",
            self.int_range(200, 999),
            self.int_range(200, 999),
            self.int_range(0, 9_999),
        )
    }

    fn date_text(&mut self) -> String {
        let offset = self.int_range(0, 364);
        let date = REFERENCE_DATE + Duration::days(offset);
        format!(
            "{:04}-{:02}-{:02}",
            date.year(),
            u8::from(date.month()),
            date.day()
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteCall {
    Fetch,
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub call: RemoteCall,
    pub user: String,
    pub id: Option<RecordId>,
    pub record: Option<Record>,
}

#[derive(Debug, Default)]
struct MemoryState {
    rows: Vec<Record>,
    failing: Vec<RemoteCall>,
    calls: Vec<RecordedCall>,
}

/// In-process backend that applies calls to its own copy of the rows.
///
/// Calls listed via [`MemorySource::fail`] are rejected without touching
/// the stored rows, like a backend returning HTTP 500.
#[derive(Debug, Default)]
pub struct MemorySource {
    state: Mutex<MemoryState>,
}

impl MemorySource {
    pub fn new(rows: Vec<Record>) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                rows,
                ..MemoryState::default()
            }),
        }
    }

    pub fn fail(&self, call: RemoteCall) {
        let mut state = self.lock();
        if !state.failing.contains(&call) {
            state.failing.push(call);
        }
    }

    pub fn recover(&self, call: RemoteCall) {
        self.lock().failing.retain(|failing| *failing != call);
    }

    pub fn rows(&self) -> Vec<Record> {
        self.lock().rows.clone()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn record(
        &self,
        session: &Session,
        call: RemoteCall,
        id: Option<&RecordId>,
        record: Option<&Record>,
    ) -> Result<MutexGuard<'_, MemoryState>> {
        let mut state = self.lock();
        state.calls.push(RecordedCall {
            call,
            user: session.current_user().to_owned(),
            id: id.cloned(),
            record: record.cloned(),
        });
        if state.failing.contains(&call) {
            bail!("HTTP 500 Internal Server Error ({call:?} rejected)");
        }
        Ok(state)
    }
}

impl RemoteSource for MemorySource {
    fn fetch_all(&self, session: &Session) -> Result<Vec<Record>> {
        let state = self.record(session, RemoteCall::Fetch, None, None)?;
        Ok(state.rows.clone())
    }

    fn create(&self, session: &Session, record: &Record) -> Result<()> {
        let mut state = self.record(session, RemoteCall::Create, Some(&record.id), Some(record))?;
        state.rows.push(record.clone());
        Ok(())
    }

    fn update(&self, session: &Session, record: &Record) -> Result<()> {
        let mut state = self.record(session, RemoteCall::Update, Some(&record.id), Some(record))?;
        let Some(existing) = state.rows.iter_mut().find(|row| row.id == record.id) else {
            bail!("HTTP 404 row {} not found", record.id);
        };
        *existing = record.clone();
        Ok(())
    }

    fn delete(&self, session: &Session, id: &RecordId) -> Result<()> {
        let mut state = self.record(session, RemoteCall::Delete, Some(id), None)?;
        state.rows.retain(|row| &row.id != id);
        Ok(())
    }
}

pub fn temp_config_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join("config.toml");
    Ok((dir, path))
}

pub fn fixture_user() -> &'static str {
    "buyer@example.com"
}

#[cfg(test)]
mod tests {
    use super::{MemorySource, ProcurementFaker, RemoteCall};
    use procdesk_app::{Record, RecordId, RemoteSource, Session};
    use std::collections::BTreeSet;

    #[test]
    fn new_deterministic_seed() {
        let mut a = ProcurementFaker::new(42);
        let mut b = ProcurementFaker::new(42);
        assert_eq!(a.supplier(), b.supplier());
        assert_eq!(a.customer_order(), b.customer_order());
    }

    #[test]
    fn ids_are_sequential_across_views() {
        let mut faker = ProcurementFaker::new(3);
        assert_eq!(faker.supplier().id, RecordId::Number(1));
        assert_eq!(faker.daily_work_report().id, RecordId::Number(2));
        assert_eq!(faker.delivery_notice().id, RecordId::Number(3));
        assert_eq!(faker.material_inquiry().id, RecordId::Number(4));
    }

    #[test]
    fn suppliers_have_status_and_date() {
        let mut faker = ProcurementFaker::new(5);
        for supplier in faker.suppliers(20) {
            let status = supplier.text("status").expect("status");
            assert!(status == "Active" || status == "Inactive");
            let date = supplier.text("invitationDate").expect("date");
            assert!(date.starts_with("2026-"), "date {date}");
        }
    }

    #[test]
    fn variety_across_seeds() {
        let mut names = BTreeSet::new();
        for seed in 0_u64..20_u64 {
            let mut faker = ProcurementFaker::new(seed);
            names.insert(faker.supplier().text("buyer").unwrap_or_default().to_owned());
        }
        assert!(names.len() >= 10, "got {}", names.len());
    }

    #[test]
    fn int_n() {
        let mut faker = ProcurementFaker::new(42);
        for _ in 0..100 {
            assert!(faker.int_n(5) < 5);
        }
    }

    #[test]
    fn memory_source_applies_and_records_calls() -> anyhow::Result<()> {
        let source = MemorySource::new(vec![Record::new(1).with("supplier", "A")]);
        let session = Session::new("ops@example.com");

        source.create(&session, &Record::new(2))?;
        source.update(&session, &Record::new(1).with("supplier", "B"))?;
        source.delete(&session, &RecordId::Number(2))?;

        let rows = source.rows();
        assert_eq!(rows, vec![Record::new(1).with("supplier", "B")]);
        let calls = source.calls();
        assert_eq!(calls.len(), 3);
        assert!(calls.iter().all(|call| call.user == "ops@example.com"));
        Ok(())
    }

    #[test]
    fn memory_source_failures_leave_rows_alone() {
        let source = MemorySource::new(vec![Record::new(1)]);
        source.fail(RemoteCall::Delete);
        let session = Session::default();

        let error = source
            .delete(&session, &RecordId::Number(1))
            .expect_err("delete should fail");
        assert!(error.to_string().contains("HTTP 500"));
        assert_eq!(source.rows().len(), 1);

        source.recover(RemoteCall::Delete);
        assert!(source.delete(&session, &RecordId::Number(1)).is_ok());
        assert!(source.rows().is_empty());
    }
}

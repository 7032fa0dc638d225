// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use procdesk_app::{
    DELIVERY_NOTICES, FieldValue, Fields, NoticeLevel, Record, RecordId, SUPPLIERS, SearchField,
    Session, TableController,
};
use procdesk_testkit::{MemorySource, ProcurementFaker, RemoteCall, fixture_user};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const WAIT: Duration = Duration::from_secs(5);

fn loaded(source: &Arc<MemorySource>) -> Result<TableController> {
    let mut controller =
        TableController::new(&SUPPLIERS, source.clone(), Session::new(fixture_user()))?;
    assert!(controller.load_blocking(WAIT), "initial load should settle");
    Ok(controller)
}

fn fields(pairs: &[(&str, FieldValue)]) -> Fields {
    pairs
        .iter()
        .map(|(key, value)| ((*key).to_owned(), value.clone()))
        .collect()
}

fn ids(records: &[Record]) -> Vec<RecordId> {
    records.iter().map(|record| record.id.clone()).collect()
}

#[test]
fn monitored_tab_then_create_shows_new_active_row() -> Result<()> {
    let source = Arc::new(MemorySource::new(vec![
        Record::new(1).with("status", "Active"),
        Record::new(2).with("status", "Inactive"),
    ]));
    let mut controller = loaded(&source)?;

    assert!(controller.apply_tab_filter("monitored"));
    assert_eq!(ids(controller.display_records()), vec![RecordId::Number(1)]);

    let id = controller.create(fields(&[
        ("id", FieldValue::from(3_i64)),
        ("status", FieldValue::from("Active")),
    ]));
    assert_eq!(id, RecordId::Number(3));
    assert_eq!(
        ids(controller.display_records()),
        vec![RecordId::Number(1), RecordId::Number(3)]
    );
    assert_eq!(controller.all_records().len(), 3);
    Ok(())
}

#[test]
fn search_all_fields_for_doe() -> Result<()> {
    let source = Arc::new(MemorySource::new(vec![
        Record::new(1).with("name", "John Doe"),
        Record::new(2).with("name", "Alice Smith"),
    ]));
    let mut controller = loaded(&source)?;

    controller.set_search("doe", SearchField::All);
    controller.search();
    assert_eq!(ids(controller.display_records()), vec![RecordId::Number(1)]);
    Ok(())
}

#[test]
fn filters_are_idempotent() -> Result<()> {
    let mut faker = ProcurementFaker::new(11);
    let source = Arc::new(MemorySource::new(faker.suppliers(30)));
    let mut controller = loaded(&source)?;

    controller.apply_tab_filter("monitored");
    let once = ids(controller.display_records());
    controller.apply_tab_filter("monitored");
    assert_eq!(ids(controller.display_records()), once);

    controller.set_search("a", SearchField::Field("buyer".to_owned()));
    controller.search();
    let searched = ids(controller.display_records());
    controller.search();
    assert_eq!(ids(controller.display_records()), searched);
    Ok(())
}

#[test]
fn display_is_conjunction_of_tab_and_search() -> Result<()> {
    let mut faker = ProcurementFaker::new(29);
    let source = Arc::new(MemorySource::new(faker.suppliers(40)));
    let mut controller = loaded(&source)?;

    controller.set_search("e", SearchField::Field("supplier".to_owned()));
    controller.apply_tab_filter("unmonitored");

    let expected: Vec<RecordId> = controller
        .all_records()
        .iter()
        .filter(|record| record.text("status") != Some("Active"))
        .filter(|record| {
            record
                .text("supplier")
                .is_some_and(|supplier| supplier.to_lowercase().contains('e'))
        })
        .map(|record| record.id.clone())
        .collect();
    assert_eq!(ids(controller.display_records()), expected);

    controller.clear();
    let tab_only = controller
        .all_records()
        .iter()
        .filter(|record| record.text("status") != Some("Active"))
        .count();
    assert_eq!(controller.display_records().len(), tab_only);
    assert_eq!(controller.active_tab().key, "unmonitored");
    Ok(())
}

#[test]
fn created_row_hidden_when_it_fails_the_tab() -> Result<()> {
    let source = Arc::new(MemorySource::new(vec![Record::new(1).with("status", "Active")]));
    let mut controller = loaded(&source)?;
    controller.apply_tab_filter("monitored");

    let id = controller.create(fields(&[("status", FieldValue::from("Inactive"))]));
    assert!(controller.find(&id).is_some());
    assert!(!ids(controller.display_records()).contains(&id));
    Ok(())
}

#[test]
fn failed_delete_does_not_resurrect_until_reload() -> Result<()> {
    let source = Arc::new(MemorySource::new(vec![
        Record::new(1).with("supplier", "Keep"),
        Record::new(2).with("supplier", "Drop"),
    ]));
    source.fail(RemoteCall::Delete);
    let mut controller = loaded(&source)?;
    controller.take_notices();

    assert!(controller.delete(&RecordId::Number(2)));
    assert!(controller.settle(WAIT));

    assert!(controller.find(&RecordId::Number(2)).is_none());
    assert_eq!(ids(controller.display_records()), vec![RecordId::Number(1)]);
    let notices = controller.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Warning);
    assert!(notices[0].message.contains("HTTP 500"), "{}", notices[0]);

    assert!(controller.load_blocking(WAIT));
    assert!(controller.find(&RecordId::Number(2)).is_some());
    Ok(())
}

#[test]
fn deleting_last_row_of_last_page_clamps_page() -> Result<()> {
    let mut faker = ProcurementFaker::new(7);
    let source = Arc::new(MemorySource::new(faker.suppliers(10)));
    let mut controller = loaded(&source)?.with_page_size(9);

    assert_eq!(controller.go_to_page(2), 2);
    assert_eq!(controller.visible().len(), 1);

    let last = controller.visible()[0].id.clone();
    assert!(controller.delete(&last));
    assert_eq!(controller.page(), 1);
    assert_eq!(controller.page_count(), 1);
    assert_eq!(controller.visible().len(), 9);
    Ok(())
}

#[test]
fn go_to_page_clamps_to_valid_range() -> Result<()> {
    let mut faker = ProcurementFaker::new(8);
    let source = Arc::new(MemorySource::new(faker.suppliers(25)));
    let mut controller = loaded(&source)?;

    assert_eq!(controller.page_count(), 3);
    assert_eq!(controller.go_to_page(99), 3);
    assert_eq!(controller.visible().len(), 5);
    assert_eq!(controller.go_to_page(0), 1);
    Ok(())
}

#[test]
fn later_loads_keep_page_first_load_resets() -> Result<()> {
    let mut faker = ProcurementFaker::new(9);
    let source = Arc::new(MemorySource::new(faker.suppliers(25)));
    let mut controller = loaded(&source)?;
    assert_eq!(controller.page(), 1);

    controller.go_to_page(2);
    assert!(controller.load_blocking(WAIT));
    assert_eq!(controller.page(), 2);
    Ok(())
}

#[test]
fn identifiers_stay_unique_across_creates() -> Result<()> {
    let mut faker = ProcurementFaker::new(13);
    let source = Arc::new(MemorySource::new(faker.suppliers(5)));
    let mut controller = loaded(&source)?;

    for index in 0..20 {
        let supplied = if index % 3 == 0 {
            vec![("id", FieldValue::from(2_i64))]
        } else {
            Vec::new()
        };
        controller.create(fields(&supplied));
    }

    let unique: HashSet<RecordId> = ids(controller.all_records()).into_iter().collect();
    assert_eq!(unique.len(), controller.all_records().len());
    assert_eq!(unique.len(), 25);
    Ok(())
}

#[test]
fn failed_load_keeps_previous_rows() -> Result<()> {
    let source = Arc::new(MemorySource::new(vec![Record::new(1), Record::new(2)]));
    let mut controller = loaded(&source)?;
    controller.take_notices();

    source.fail(RemoteCall::Fetch);
    assert!(controller.load_blocking(WAIT));
    assert_eq!(controller.all_records().len(), 2);
    assert!(!controller.is_loading());

    let notices = controller.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
    assert_eq!(notices[0].title, "Error fetching data");
    Ok(())
}

#[test]
fn confirmed_mutations_reach_the_source_with_the_session_user() -> Result<()> {
    let source = Arc::new(MemorySource::new(vec![Record::new(1).with("supplier", "Old")]));
    let mut controller = loaded(&source)?;
    controller.take_notices();

    let id = controller.create(fields(&[("supplier", FieldValue::from("Acme"))]));
    controller.update(
        &RecordId::Number(1),
        fields(&[("supplier", FieldValue::from("New"))]),
    );
    assert!(controller.settle(WAIT));

    let rows = source.rows();
    assert!(rows.iter().any(|row| row.id == id));
    assert!(
        rows.iter()
            .any(|row| row.id == RecordId::Number(1) && row.text("supplier") == Some("New"))
    );
    assert!(source.calls().iter().all(|call| call.user == fixture_user()));

    let titles: Vec<String> = controller
        .take_notices()
        .into_iter()
        .map(|notice| notice.title)
        .collect();
    assert_eq!(titles, vec!["Record added", "Record updated"]);
    Ok(())
}

#[test]
fn update_moves_row_out_of_filtered_view() -> Result<()> {
    let source = Arc::new(MemorySource::new(vec![
        Record::new(1).with("status", "Active"),
        Record::new(2).with("status", "Active"),
    ]));
    let mut controller = loaded(&source)?;
    controller.apply_tab_filter("monitored");

    controller.update(
        &RecordId::Number(1),
        fields(&[("status", FieldValue::from("Inactive"))]),
    );
    assert_eq!(ids(controller.display_records()), vec![RecordId::Number(2)]);
    assert_eq!(
        controller
            .find(&RecordId::Number(1))
            .and_then(|record| record.text("status")),
        Some("Inactive")
    );
    Ok(())
}

#[test]
fn flag_tabs_split_delivery_notices() -> Result<()> {
    let mut faker = ProcurementFaker::new(21);
    let rows: Vec<Record> = (0..12).map(|_| faker.delivery_notice()).collect();
    let monitored = rows
        .iter()
        .filter(|row| row.get("isMonitored") == Some(&FieldValue::Bool(true)))
        .count();
    let source = Arc::new(MemorySource::new(rows));
    let mut controller =
        TableController::new(&DELIVERY_NOTICES, source, Session::new(fixture_user()))?;
    assert!(controller.load_blocking(WAIT));

    controller.apply_tab_filter("monitored");
    assert_eq!(controller.display_records().len(), monitored);
    controller.apply_tab_filter("unmonitored");
    assert_eq!(controller.display_records().len(), 12 - monitored);
    Ok(())
}

#[test]
fn dropped_controller_lets_in_flight_sync_finish() -> Result<()> {
    let source = Arc::new(MemorySource::new(Vec::new()));
    {
        let mut controller = loaded(&source)?;
        controller.create(fields(&[("supplier", FieldValue::from("Late"))]));
    }

    let deadline = Instant::now() + WAIT;
    while source.rows().is_empty() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(source.rows().len(), 1);
    Ok(())
}

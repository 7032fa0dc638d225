// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use tracing::{debug, error, info, warn};

use crate::filter::{ColumnFilter, FilterChain, SearchField};
use crate::ids::{IdAllocator, RecordId};
use crate::model::{FieldValue, Fields, Record};
use crate::notice::{ControllerError, Notice, NoticeLevel, SyncOp};
use crate::pager::Pager;
use crate::schema::{ColumnKind, EntitySchema, Tab};
use crate::session::Session;
use crate::sync::{RemoteSource, SyncJob, SyncOutcome, SyncWorker};

/// Field names a caller may use to hand over a server identifier.
const ID_KEYS: [&str; 2] = ["id", "_id"];

/// Local mirror of one remote collection, filtered and paged for display.
///
/// Mutations land locally first and are then queued for the backend; a
/// failed sync is reported as a notice and never rolled back.
pub struct TableController {
    schema: &'static EntitySchema,
    session: Session,
    worker: SyncWorker,
    all: Vec<Record>,
    display: Vec<Record>,
    active_tab: Tab,
    search_term: String,
    search_field: SearchField,
    column_filters: Vec<ColumnFilter>,
    pager: Pager,
    ids: IdAllocator,
    loaded_once: bool,
    loading: bool,
    notices: Vec<Notice>,
    clock: fn() -> OffsetDateTime,
}

impl TableController {
    pub fn new(
        schema: &'static EntitySchema,
        source: Arc<dyn RemoteSource>,
        session: Session,
    ) -> Result<Self> {
        let worker = SyncWorker::spawn(source, session.clone())?;
        Ok(Self {
            schema,
            session,
            worker,
            all: Vec::new(),
            display: Vec::new(),
            active_tab: *schema.default_tab(),
            search_term: String::new(),
            search_field: SearchField::All,
            column_filters: Vec::new(),
            pager: Pager::new(schema.page_size),
            ids: IdAllocator::new(),
            loaded_once: false,
            loading: false,
            notices: Vec::new(),
            clock: OffsetDateTime::now_utc,
        })
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.pager = Pager::new(page_size);
        self.pager.clamp(self.display.len());
        self
    }

    pub fn with_clock(mut self, clock: fn() -> OffsetDateTime) -> Self {
        self.clock = clock;
        self
    }

    pub fn schema(&self) -> &'static EntitySchema {
        self.schema
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn all_records(&self) -> &[Record] {
        &self.all
    }

    pub fn display_records(&self) -> &[Record] {
        &self.display
    }

    pub fn find(&self, id: &RecordId) -> Option<&Record> {
        self.all.iter().find(|record| &record.id == id)
    }

    pub fn active_tab(&self) -> &Tab {
        &self.active_tab
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn search_field(&self) -> &SearchField {
        &self.search_field
    }

    pub fn column_filters(&self) -> &[ColumnFilter] {
        &self.column_filters
    }

    pub fn page(&self) -> usize {
        self.pager.page()
    }

    pub fn page_size(&self) -> usize {
        self.pager.page_size()
    }

    pub fn page_count(&self) -> usize {
        self.pager.page_count(self.display.len())
    }

    /// The slice of the display collection on the current page.
    pub fn visible(&self) -> &[Record] {
        &self.display[self.pager.window(self.display.len())]
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn has_loaded(&self) -> bool {
        self.loaded_once
    }

    pub fn pending_sync(&self) -> usize {
        self.worker.in_flight()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn load(&mut self) {
        match self.worker.submit(SyncJob::Load) {
            Ok(()) => {
                self.loading = true;
                debug!(view = self.schema.name, "load requested");
            }
            Err(error) => self.raise(ControllerError::FetchFailure {
                reason: format!("{error:#}"),
            }),
        }
    }

    /// Dispatches a load and waits for it (and anything queued before it).
    pub fn load_blocking(&mut self, timeout: Duration) -> bool {
        self.load();
        self.settle(timeout)
    }

    /// Applies every sync outcome that has already arrived; never blocks.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Some(outcome) = self.worker.try_next() {
            self.apply_outcome(outcome);
            applied += 1;
        }
        applied
    }

    /// Pumps until nothing is in flight or `timeout` passes. Returns whether
    /// the queue drained.
    pub fn settle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        self.pump();
        while self.worker.in_flight() > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match self.worker.next_timeout(remaining) {
                Some(outcome) => self.apply_outcome(outcome),
                None => break,
            }
        }
        if self.worker.in_flight() == 0 {
            self.loading = false;
            true
        } else {
            false
        }
    }

    pub fn apply_tab_filter(&mut self, key: &str) -> bool {
        let Some(tab) = self.schema.tab(key) else {
            self.raise(ControllerError::UnknownTab {
                key: key.to_owned(),
            });
            return false;
        };
        self.active_tab = *tab;
        self.rederive();
        self.pager.reset();
        true
    }

    pub fn set_search(&mut self, term: impl Into<String>, field: SearchField) {
        self.search_term = term.into();
        self.search_field = field;
    }

    pub fn search(&mut self) {
        self.rederive();
        self.pager.reset();
    }

    pub fn clear(&mut self) {
        self.search_term.clear();
        self.search_field = SearchField::All;
        self.rederive();
        self.pager.reset();
    }

    pub fn set_column_filter(&mut self, field: &str, value: Option<&str>) {
        self.column_filters.retain(|filter| filter.field != field);
        if let Some(value) = value {
            self.column_filters.push(ColumnFilter {
                field: field.to_owned(),
                value: value.to_owned(),
            });
        }
        self.rederive();
        self.pager.reset();
    }

    /// Values present for `field` across the whole collection, for filter
    /// choices.
    pub fn distinct_values(&self, field: &str) -> Vec<String> {
        self.all
            .iter()
            .filter_map(|record| record.get(field))
            .filter(|value| !value.is_null())
            .map(FieldValue::display)
            .filter(|value| !value.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn tab_counts(&self) -> Vec<(&'static str, usize)> {
        self.schema
            .tabs
            .iter()
            .map(|tab| {
                let count = self
                    .all
                    .iter()
                    .filter(|record| tab.predicate.matches(record))
                    .count();
                (tab.key, count)
            })
            .collect()
    }

    pub fn create(&mut self, mut fields: Fields) -> RecordId {
        let taken: HashSet<RecordId> = self.all.iter().map(|record| record.id.clone()).collect();
        let supplied = take_supplied_id(&mut fields).filter(|id| !taken.contains(id));
        let id = match supplied {
            Some(id) => {
                self.ids.observe(&id);
                id
            }
            None => self.ids.allocate(&taken),
        };

        let mut record = Record {
            id: id.clone(),
            fields: self.blank_fields(),
        };
        record.merge(&fields);
        let now = (self.clock)();
        for stamp in [self.schema.created_at_field, self.schema.updated_at_field]
            .into_iter()
            .flatten()
        {
            if is_blank(record.get(stamp)) {
                record.set(stamp, self.timestamp(stamp, now));
            }
        }

        info!(view = self.schema.name, id = %id, "row created locally");
        self.all.push(record.clone());
        self.rederive();
        self.dispatch(SyncOp::Create, SyncJob::Create { record }, &id);
        id
    }

    pub fn update(&mut self, id: &RecordId, mut changes: Fields) -> bool {
        let Some(index) = self.all.iter().position(|record| &record.id == id) else {
            self.raise(ControllerError::NotFound { id: id.clone() });
            return false;
        };

        for key in ID_KEYS {
            changes.remove(key);
        }
        if let Some(stamp) = self.schema.updated_at_field {
            let value = self.timestamp(stamp, (self.clock)());
            changes.insert(stamp.to_owned(), value);
        }

        let record = &mut self.all[index];
        record.merge(&changes);
        let merged = record.clone();

        info!(view = self.schema.name, id = %id, "row updated locally");
        self.rederive();
        self.dispatch(SyncOp::Update, SyncJob::Update { record: merged }, id);
        true
    }

    pub fn delete(&mut self, id: &RecordId) -> bool {
        let Some(index) = self.all.iter().position(|record| &record.id == id) else {
            self.raise(ControllerError::NotFound { id: id.clone() });
            return false;
        };

        self.all.remove(index);
        self.display.retain(|record| &record.id != id);
        self.pager.clamp(self.display.len());

        info!(view = self.schema.name, id = %id, "row deleted locally");
        self.dispatch(SyncOp::Delete, SyncJob::Delete { id: id.clone() }, id);
        true
    }

    pub fn go_to_page(&mut self, page: usize) -> usize {
        self.pager.go_to(page, self.display.len())
    }

    fn chain(&self) -> FilterChain<'_> {
        FilterChain {
            tab: self.active_tab.predicate,
            columns: &self.column_filters,
            term: &self.search_term,
            field: &self.search_field,
        }
    }

    /// Rebuilds the display collection from `all`, never from a previous
    /// filtered snapshot.
    fn rederive(&mut self) {
        self.display = self.chain().derive(&self.all);
        self.pager.clamp(self.display.len());
    }

    fn dispatch(&mut self, op: SyncOp, job: SyncJob, id: &RecordId) {
        if let Err(error) = self.worker.submit(job) {
            self.raise(ControllerError::SyncFailure {
                op,
                id: id.clone(),
                reason: format!("{error:#}"),
            });
        }
    }

    fn apply_outcome(&mut self, outcome: SyncOutcome) {
        match outcome {
            SyncOutcome::Loaded(Ok(records)) => self.replace_all(records),
            SyncOutcome::Loaded(Err(reason)) => {
                self.loading = false;
                self.raise(ControllerError::FetchFailure { reason });
            }
            SyncOutcome::Synced {
                op,
                id,
                result: Ok(()),
            } => {
                debug!(view = self.schema.name, id = %id, op = op.as_str(), "sync confirmed");
                let title = match op {
                    SyncOp::Create => "Record added",
                    SyncOp::Update => "Record updated",
                    SyncOp::Delete => "Row deleted",
                };
                self.push_notice(Notice::new(
                    NoticeLevel::Success,
                    title,
                    format!("row {id} synced with server"),
                ));
            }
            SyncOutcome::Synced {
                op,
                id,
                result: Err(reason),
            } => self.raise(ControllerError::SyncFailure { op, id, reason }),
        }
    }

    fn replace_all(&mut self, records: Vec<Record>) {
        let mut seen = HashSet::with_capacity(records.len());
        let mut unique = Vec::with_capacity(records.len());
        for record in records {
            if seen.insert(record.id.clone()) {
                self.ids.observe(&record.id);
                unique.push(record);
            } else {
                warn!(view = self.schema.name, id = %record.id, "duplicate id in fetch; keeping first");
            }
        }

        info!(view = self.schema.name, rows = unique.len(), "collection loaded");
        self.all = unique;
        self.loading = false;
        self.rederive();
        if !self.loaded_once {
            self.loaded_once = true;
            self.pager.reset();
        }
    }

    fn blank_fields(&self) -> Fields {
        self.schema
            .columns
            .iter()
            .map(|column| {
                let value = match column.kind {
                    ColumnKind::Bool => FieldValue::Bool(false),
                    _ => FieldValue::text(""),
                };
                (column.key.to_owned(), value)
            })
            .collect()
    }

    fn timestamp(&self, field: &str, now: OffsetDateTime) -> FieldValue {
        let kind = self
            .schema
            .column(field)
            .map_or(ColumnKind::DateTime, |column| column.kind);
        let rendered = match kind {
            ColumnKind::Date => now
                .format(&format_description!("[year]-[month]-[day]"))
                .unwrap_or_default(),
            _ => now.format(&Rfc3339).unwrap_or_default(),
        };
        FieldValue::Text(rendered)
    }

    fn raise(&mut self, error: ControllerError) {
        self.push_notice(error.to_notice());
    }

    fn push_notice(&mut self, notice: Notice) {
        match notice.level {
            NoticeLevel::Error => error!(view = self.schema.name, "{notice}"),
            NoticeLevel::Warning => warn!(view = self.schema.name, "{notice}"),
            NoticeLevel::Info | NoticeLevel::Success => {
                debug!(view = self.schema.name, "{notice}")
            }
        }
        self.notices.push(notice);
    }
}

fn take_supplied_id(fields: &mut Fields) -> Option<RecordId> {
    let mut supplied = None;
    for key in ID_KEYS {
        if let Some(value) = fields.remove(key) {
            let parsed = match value {
                FieldValue::Number(number) if number.fract() == 0.0 => {
                    Some(RecordId::Number(number as i64))
                }
                FieldValue::Text(text) => RecordId::text(&text),
                _ => None,
            };
            supplied = supplied.or(parsed);
        }
    }
    supplied
}

fn is_blank(value: Option<&FieldValue>) -> bool {
    match value {
        None | Some(FieldValue::Null) => true,
        Some(FieldValue::Text(text)) => text.trim().is_empty(),
        Some(_) => false,
    }
}

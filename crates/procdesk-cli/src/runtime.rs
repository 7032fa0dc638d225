// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use procdesk_app::{
    EntitySchema, ExportOptions, Notice, RecordDraft, RecordId, RemoteSource, SearchField,
    Session, TableController, export_csv,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use time::{Date, UtcOffset};
use tracing::info;

const MAX_CELL_WIDTH: usize = 28;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Add,
    Update(RecordId),
    Delete(RecordId),
}

/// What to show after loading a view, and what to change first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewRequest {
    pub tab: Option<String>,
    pub search: Option<String>,
    pub field: SearchField,
    pub filters: Vec<(String, String)>,
    pub page: Option<usize>,
    pub mutation: Option<Mutation>,
    pub sets: Vec<(String, String)>,
}

pub struct ViewRuntime {
    controller: TableController,
    wait: Duration,
}

impl ViewRuntime {
    /// Builds the controller and waits for the first load.
    pub fn open(
        schema: &'static EntitySchema,
        source: Arc<dyn RemoteSource>,
        session: Session,
        page_size: Option<usize>,
        wait: Duration,
    ) -> Result<Self> {
        let mut controller = TableController::new(schema, source, session)?;
        if let Some(page_size) = page_size {
            controller = controller.with_page_size(page_size);
        }
        if !controller.load_blocking(wait) {
            bail!(
                "loading {} did not finish within {}ms",
                schema.name,
                wait.as_millis()
            );
        }
        Ok(Self { controller, wait })
    }

    pub fn controller(&self) -> &TableController {
        &self.controller
    }

    pub fn apply(&mut self, request: &ViewRequest) -> Result<Option<RecordId>> {
        let changed = match &request.mutation {
            Some(mutation) => self.mutate(mutation, &request.sets)?,
            None => {
                if !request.sets.is_empty() {
                    bail!("--set only applies together with --add or --update");
                }
                None
            }
        };

        if let Some(tab) = &request.tab
            && !self.controller.apply_tab_filter(tab)
        {
            let known: Vec<&str> = self.controller.schema().tabs.iter().map(|t| t.key).collect();
            bail!("unknown tab {tab:?}; choose one of: {}", known.join(", "));
        }
        for (field, value) in &request.filters {
            self.controller.set_column_filter(field, Some(value.as_str()));
        }
        if let Some(term) = &request.search {
            self.controller.set_search(term.clone(), request.field.clone());
            self.controller.search();
        }
        if let Some(page) = request.page {
            self.controller.go_to_page(page);
        }
        Ok(changed)
    }

    fn mutate(&mut self, mutation: &Mutation, sets: &[(String, String)]) -> Result<Option<RecordId>> {
        let schema = self.controller.schema();
        let id = match mutation {
            Mutation::Add => {
                let mut draft = RecordDraft::blank(schema);
                fill(&mut draft, sets)?;
                let fields = draft.into_fields()?;
                self.controller.create(fields)
            }
            Mutation::Update(typed) => {
                let id = self
                    .resolve(typed)
                    .ok_or_else(|| anyhow!("no {} row with id {typed}", schema.name))?;
                let record = self
                    .controller
                    .find(&id)
                    .ok_or_else(|| anyhow!("no {} row with id {id}", schema.name))?;
                let mut draft = RecordDraft::from_record(schema, record);
                fill(&mut draft, sets)?;
                let fields = draft.into_fields()?;
                self.controller.update(&id, fields);
                id
            }
            Mutation::Delete(typed) => {
                if !sets.is_empty() {
                    bail!("--set cannot be combined with --delete");
                }
                let id = self
                    .resolve(typed)
                    .ok_or_else(|| anyhow!("no {} row with id {typed}", schema.name))?;
                self.controller.delete(&id);
                id
            }
        };

        info!(view = schema.name, id = %id, "waiting for sync");
        if !self.controller.settle(self.wait) {
            bail!(
                "sync with server did not finish within {}ms",
                self.wait.as_millis()
            );
        }
        Ok(Some(id))
    }

    /// A typed id matches a row by value, or else by its printed form, so
    /// `--delete 7` reaches a row the backend keyed with the string "7".
    fn resolve(&self, typed: &RecordId) -> Option<RecordId> {
        if self.controller.find(typed).is_some() {
            return Some(typed.clone());
        }
        let printed = typed.to_string();
        self.controller
            .all_records()
            .iter()
            .find(|record| record.id.to_string() == printed)
            .map(|record| record.id.clone())
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.controller.take_notices()
    }

    /// Writes every displayed row. A directory target gets the default
    /// `<view>-data-<date>.csv` name.
    pub fn export(&self, target: &Path, today: Date, offset: UtcOffset) -> Result<PathBuf> {
        let schema = self.controller.schema();
        let path = if target.is_dir() {
            target.join(schema.export_file_name(today))
        } else {
            target.to_path_buf()
        };
        let csv = export_csv(
            schema,
            self.controller.display_records(),
            ExportOptions {
                offset,
                row_numbers: false,
            },
        )?;
        fs::write(&path, csv).with_context(|| format!("write export {}", path.display()))?;
        info!(view = schema.name, path = %path.display(), "exported");
        Ok(path)
    }

    pub fn render(&self) -> String {
        render_table(&self.controller)
    }
}

fn fill(draft: &mut RecordDraft, sets: &[(String, String)]) -> Result<()> {
    for (field, value) in sets {
        draft
            .set(field, value.clone())
            .with_context(|| format!("--set {field}={value}"))?;
    }
    Ok(())
}

/// The current page as aligned columns, plus tab counts and a page footer.
pub fn render_table(controller: &TableController) -> String {
    let schema = controller.schema();
    let mut headers = vec!["ID"];
    headers.extend(schema.columns.iter().map(|column| column.label));

    let rows: Vec<Vec<String>> = controller
        .visible()
        .iter()
        .map(|record| {
            let mut cells = vec![record.id.to_string()];
            cells.extend(schema.columns.iter().map(|column| {
                let value = record.get(column.key).map(|v| v.display()).unwrap_or_default();
                clip(&value)
            }));
            cells
        })
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    out.push_str(schema.title);
    out.push('\n');
    let tabs: Vec<String> = controller
        .tab_counts()
        .into_iter()
        .map(|(key, count)| {
            if key == controller.active_tab().key {
                format!("[{key} ({count})]")
            } else {
                format!("{key} ({count})")
            }
        })
        .collect();
    out.push_str(&tabs.join("  "));
    out.push_str("\n\n");

    push_line(&mut out, &widths, headers.iter().map(|h| (*h).to_owned()));
    push_line(&mut out, &widths, widths.iter().map(|w| "-".repeat(*w)));
    if rows.is_empty() {
        out.push_str("(no rows)\n");
    }
    for row in rows {
        push_line(&mut out, &widths, row.into_iter());
    }

    out.push_str(&format!(
        "\npage {}/{} | {} of {} rows\n",
        controller.page(),
        controller.page_count(),
        controller.display_records().len(),
        controller.all_records().len(),
    ));
    out
}

fn push_line(out: &mut String, widths: &[usize], cells: impl Iterator<Item = String>) {
    let line: Vec<String> = cells
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

fn clip(value: &str) -> String {
    let flat = value.replace(['\n', '\r'], " ");
    if flat.chars().count() <= MAX_CELL_WIDTH {
        return flat;
    }
    let mut clipped: String = flat.chars().take(MAX_CELL_WIDTH - 3).collect();
    clipped.push_str("...");
    clipped
}

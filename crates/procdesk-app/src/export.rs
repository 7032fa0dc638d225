// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use csv::{QuoteStyle, WriterBuilder};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::model::{FieldValue, Record};
use crate::schema::{ColumnKind, EntitySchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    /// Offset dates are rendered in; callers pass the local one.
    pub offset: UtcOffset,
    /// Leading `#` column numbering the rows from 1.
    pub row_numbers: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            offset: UtcOffset::UTC,
            row_numbers: false,
        }
    }
}

/// Header of column labels, then one row per record in column order.
///
/// Quoting follows the value, not its look: text and dates are wrapped in
/// double quotes with inner quotes doubled, numbers and booleans are bare.
/// Missing cells are `""` in text and date columns and empty otherwise.
pub fn export_csv(
    schema: &EntitySchema,
    records: &[Record],
    options: ExportOptions,
) -> Result<String> {
    let mut out = Vec::new();

    {
        let mut header = WriterBuilder::new()
            .quote_style(QuoteStyle::Necessary)
            .from_writer(&mut out);
        let mut labels: Vec<&str> = Vec::with_capacity(schema.columns.len() + 1);
        if options.row_numbers {
            labels.push("#");
        }
        labels.extend(schema.columns.iter().map(|column| column.label));
        header.write_record(&labels).context("write CSV header")?;
        header.flush().context("flush CSV header")?;
    }

    {
        let mut rows = WriterBuilder::new()
            .quote_style(QuoteStyle::Never)
            .from_writer(&mut out);
        for (index, record) in records.iter().enumerate() {
            let mut cells = Vec::with_capacity(schema.columns.len() + 1);
            if options.row_numbers {
                cells.push((index + 1).to_string());
            }
            for column in schema.columns {
                cells.push(render_cell(column.kind, record.get(column.key), options.offset));
            }
            rows.write_record(&cells)
                .with_context(|| format!("write CSV row for {}", record.id))?;
        }
        rows.flush().context("flush CSV rows")?;
    }

    String::from_utf8(out).context("CSV output is not UTF-8")
}

fn render_cell(kind: ColumnKind, value: Option<&FieldValue>, offset: UtcOffset) -> String {
    match (kind, value) {
        (_, Some(value @ (FieldValue::Number(_) | FieldValue::Bool(_)))) => value.display(),
        (ColumnKind::Date | ColumnKind::DateTime, Some(FieldValue::Text(raw))) => {
            quoted(&long_date(kind, raw, offset).unwrap_or_else(|| raw.clone()))
        }
        (_, Some(FieldValue::Text(raw))) => quoted(raw),
        (ColumnKind::Number | ColumnKind::Bool, _) => String::new(),
        (ColumnKind::Text | ColumnKind::Date | ColumnKind::DateTime, _) => quoted(""),
    }
}

fn quoted(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

/// `February 19, 2026` for dates, `February 19, 2026 12:34 PM` for times.
pub fn long_date(kind: ColumnKind, raw: &str, offset: UtcOffset) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(date) = Date::parse(raw, &format_description!("[year]-[month]-[day]")) {
        return date
            .format(&format_description!(
                "[month repr:long] [day padding:none], [year]"
            ))
            .ok();
    }

    let moment = OffsetDateTime::parse(raw, &Rfc3339)
        .map(|moment| moment.to_offset(offset))
        .or_else(|_| {
            PrimitiveDateTime::parse(
                raw,
                &format_description!("[year]-[month]-[day]T[hour]:[minute]"),
            )
            .map(|moment| moment.assume_offset(offset))
        })
        .ok()?;

    let rendered = match kind {
        ColumnKind::Date => moment.format(&format_description!(
            "[month repr:long] [day padding:none], [year]"
        )),
        _ => moment.format(&format_description!(
            "[month repr:long] [day padding:none], [year] [hour repr:12 padding:none]:[minute] [period]"
        )),
    };
    rendered.ok()
}

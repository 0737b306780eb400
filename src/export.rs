use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::info;

use crate::errors::AppResult;
use crate::models::{AddressRow, RowStatus};

const MISSING_COORDINATE: &str = "N/A";
const NO_SHIFT: &str = "Sem Turno";

#[derive(Debug, Serialize)]
struct ExportRecord<'a> {
    nome: &'a str,
    endereco: &'a str,
    turno: &'a str,
    latitude: String,
    longitude: String,
    status: &'static str,
    erro: &'a str,
}

impl<'a> From<&'a AddressRow> for ExportRecord<'a> {
    fn from(row: &'a AddressRow) -> Self {
        Self {
            nome: &row.name,
            endereco: &row.raw_address,
            turno: &row.shift,
            latitude: format_coordinate(row.latitude),
            longitude: format_coordinate(row.longitude),
            status: status_label(row.status),
            erro: row.error_message.as_deref().unwrap_or_default(),
        }
    }
}

fn format_coordinate(value: Option<f64>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| MISSING_COORDINATE.to_string())
}

pub fn status_label(status: RowStatus) -> &'static str {
    match status {
        RowStatus::Success => "Sucesso",
        RowStatus::Error => "Erro",
        RowStatus::Pending => "Pendente",
    }
}

pub fn write_csv<W: Write>(writer: W, rows: &[AddressRow]) -> AppResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(ExportRecord::from(row))?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn export_file_name(date: NaiveDate) -> String {
    format!("enderecos_geocodificados_{}.csv", date.format("%Y-%m-%d"))
}

/// Writes the annotated rows to `dir`, named after today's UTC date.
pub fn export_to_dir(dir: &Path, rows: &[AddressRow]) -> AppResult<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name(Utc::now().date_naive()));
    write_csv(File::create(&path)?, rows)?;
    info!(path = %path.display(), rows = rows.len(), "exported geocoded rows");
    Ok(path)
}

/// Collection name for a shift: blank shifts share one bucket and
/// whitespace runs become underscores.
pub fn shift_collection_name(shift: &str) -> String {
    let shift = if shift.trim().is_empty() { NO_SHIFT } else { shift };
    let mut name = String::with_capacity(shift.len());
    let mut in_gap = false;
    for ch in shift.chars() {
        if ch.is_whitespace() {
            if !in_gap {
                name.push('_');
            }
            in_gap = true;
        } else {
            name.push(ch);
            in_gap = false;
        }
    }
    name
}

/// Groups rows by shift collection name, keeping input order within each
/// group.
pub fn group_by_shift(rows: &[AddressRow]) -> BTreeMap<String, Vec<&AddressRow>> {
    let mut groups: BTreeMap<String, Vec<&AddressRow>> = BTreeMap::new();
    for row in rows {
        groups
            .entry(shift_collection_name(&row.shift))
            .or_default()
            .push(row);
    }
    groups
}

use std::io::Read;

use tracing::debug;

use crate::errors::{AppError, AppResult};
use crate::models::AddressRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Name,
    Address,
    Shift,
    ServiceLevel,
}

impl Column {
    fn from_header(header: &str) -> Option<Self> {
        match header.trim().to_lowercase().as_str() {
            "nome" | "name" => Some(Column::Name),
            "endereco" | "endereço" | "address" => Some(Column::Address),
            "turno" | "shift" | "periodo" | "período" => Some(Column::Shift),
            "nivelatendimento"
            | "nivel_atendimento"
            | "nível de atendimento"
            | "service_level"
            | "servicelevel" => Some(Column::ServiceLevel),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct ColumnMap {
    name: Option<usize>,
    address: Option<usize>,
    shift: Option<usize>,
    service_level: Option<usize>,
}

impl ColumnMap {
    fn from_headers<S: AsRef<str>>(headers: &[S]) -> AppResult<Self> {
        let mut map = ColumnMap::default();
        for (idx, header) in headers.iter().enumerate() {
            let slot = match Column::from_header(header.as_ref()) {
                Some(Column::Name) => &mut map.name,
                Some(Column::Address) => &mut map.address,
                Some(Column::Shift) => &mut map.shift,
                Some(Column::ServiceLevel) => &mut map.service_level,
                None => continue,
            };
            slot.get_or_insert(idx);
        }

        if map.name.is_none() || map.address.is_none() || map.shift.is_none() {
            return Err(AppError::MissingColumns {
                found: headers
                    .iter()
                    .map(|h| h.as_ref().trim())
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }
        Ok(map)
    }
}

/// Builds pending rows from a header line and its records, accepting the
/// Portuguese and English column names used by the operations sheets.
pub fn rows_from_records<S, R>(headers: &[S], records: R) -> AppResult<Vec<AddressRow>>
where
    S: AsRef<str>,
    R: IntoIterator,
    R::Item: AsRef<[String]>,
{
    let map = ColumnMap::from_headers(headers)?;
    let field = |record: &[String], idx: Option<usize>| -> Option<String> {
        idx.and_then(|i| record.get(i))
            .map(|value| value.trim().to_string())
    };

    let mut rows = Vec::new();
    for record in records {
        let record = record.as_ref();
        if record.iter().all(|value| value.trim().is_empty()) {
            continue;
        }
        let mut row = AddressRow::new(
            field(record, map.name).unwrap_or_default(),
            field(record, map.address).unwrap_or_default(),
            field(record, map.shift).unwrap_or_default(),
        );
        row.service_level = field(record, map.service_level).filter(|v| !v.is_empty());
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(AppError::EmptyInput);
    }
    debug!(rows = rows.len(), "loaded address rows");
    Ok(rows)
}

pub fn read_csv_rows<R: Read>(reader: R) -> AppResult<Vec<AddressRow>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();
    let records = csv_reader
        .records()
        .map(|record| record.map(|r| r.iter().map(str::to_string).collect::<Vec<_>>()))
        .collect::<Result<Vec<_>, _>>()?;
    rows_from_records(&headers, records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RowStatus;

    fn owned(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn maps_portuguese_headers() {
        let headers = ["Nome", " Endereço ", "TURNO"];
        let rows = rows_from_records(
            &headers,
            vec![owned(&["R1", "Rua A, 100", "Turno1"])],
        )
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "R1");
        assert_eq!(rows[0].raw_address, "Rua A, 100");
        assert_eq!(rows[0].shift, "Turno1");
        assert_eq!(rows[0].status, RowStatus::Pending);
    }

    #[test]
    fn maps_english_headers_and_service_level() {
        let headers = ["shift", "address", "name", "service_level"];
        let rows = rows_from_records(
            &headers,
            vec![
                owned(&["Night", "Rua B, 200", "R2", "VIP"]),
                owned(&["Night", "Rua C, 300", "R3", ""]),
            ],
        )
        .unwrap();
        assert_eq!(rows[0].service_level.as_deref(), Some("VIP"));
        assert!(rows[1].service_level.is_none());
    }

    #[test]
    fn rejects_missing_columns() {
        let headers = ["nome", "cidade"];
        let err = rows_from_records(&headers, vec![owned(&["R1", "SP"])]).unwrap_err();
        match err {
            AppError::MissingColumns { found } => assert_eq!(found, "nome, cidade"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_empty_input() {
        let headers = ["nome", "endereco", "turno"];
        let err = rows_from_records(&headers, vec![owned(&["", " ", ""])]).unwrap_err();
        assert!(matches!(err, AppError::EmptyInput));
    }

    #[test]
    fn reads_csv_source() {
        let data = "nome,endereco,turno\nR1,\"Rua A, 100\",Turno1\nR2,\"Rua B, 200\",Turno 2\n";
        let rows = read_csv_rows(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].raw_address, "Rua B, 200");
        assert_eq!(rows[1].shift, "Turno 2");
    }
}

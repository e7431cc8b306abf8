//! Raw user tables read from CSV before any schema interpretation.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use plantgen_core::errors::{ErrorInfo, PlantgenError};
use serde::Serialize;

/// A user table as read from CSV: a header and rows of trimmed text cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserTable {
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl UserTable {
    /// Builds a table from in-memory cells.
    pub fn new(name: impl Into<String>, columns: &[&str], rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }

    /// Parses a CSV document whose first record is the header.
    pub fn from_reader<R: Read>(name: &str, reader: R) -> Result<Self, PlantgenError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let csv_error = |err: csv::Error| {
            PlantgenError::Serde(
                ErrorInfo::new("csv-read", err.to_string()).with_context("table", name),
            )
        };
        let columns = rdr
            .headers()
            .map_err(csv_error)?
            .iter()
            .map(str::to_string)
            .collect();
        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record.map_err(csv_error)?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(Self {
            name: name.to_string(),
            columns,
            rows,
        })
    }

    /// Reads a CSV file from disk.
    pub fn from_path(name: &str, path: &Path) -> Result<Self, PlantgenError> {
        let file = File::open(path).map_err(|err| {
            PlantgenError::Serde(
                ErrorInfo::new("csv-open", err.to_string())
                    .with_context("table", name)
                    .with_context("path", path.display()),
            )
        })?;
        Self::from_reader(name, file)
    }

    /// Name used to refer to the table in diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Header of the table.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Data rows of the table.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table carries no data row.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Fails unless the header is exactly `expected`, in order, and every
    /// row carries one cell per column.
    pub fn expect_columns(&self, expected: &[&str]) -> Result<(), PlantgenError> {
        if !self.columns.iter().map(String::as_str).eq(expected.iter().copied()) {
            return Err(PlantgenError::Input(
                ErrorInfo::new("column-mismatch", "table does not have the expected columns")
                    .with_context("table", &self.name)
                    .with_context("expected", expected.join(", "))
                    .with_context("found", self.columns.join(", ")),
            ));
        }
        if let Some(row) = self.rows.iter().position(|row| row.len() != expected.len()) {
            return Err(PlantgenError::Input(
                ErrorInfo::new("row-length", "row does not carry one cell per column")
                    .with_context("table", &self.name)
                    .with_context("row", row + 1),
            ));
        }
        Ok(())
    }
}

fn is_missing(raw: &str) -> bool {
    raw.is_empty() || raw.eq_ignore_ascii_case("nan") || raw.eq_ignore_ascii_case("na")
}

/// Locates one cell for diagnostics.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CellRef<'a> {
    pub table: &'a str,
    pub row: usize,
    pub column: &'a str,
}

impl CellRef<'_> {
    fn error(&self, code: &str, message: &str, raw: &str) -> PlantgenError {
        PlantgenError::Input(
            ErrorInfo::new(code, message)
                .with_context("table", self.table)
                .with_context("row", self.row + 1)
                .with_context("column", self.column)
                .with_context("value", raw),
        )
    }

    /// Parses an optional real value; empty and `NaN` cells are unset.
    pub fn optional_f64(&self, raw: &str) -> Result<Option<f64>, PlantgenError> {
        if is_missing(raw) {
            return Ok(None);
        }
        match raw.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(Some(value)),
            _ => Err(self.error("invalid-cell", "cell is not a finite number", raw)),
        }
    }

    /// Parses a required real value.
    pub fn required_f64(&self, raw: &str) -> Result<f64, PlantgenError> {
        self.optional_f64(raw)?
            .ok_or_else(|| self.error("missing-cell", "cell must be documented", raw))
    }

    /// Parses a required positive integer, accepting `11.0` style floats.
    pub fn required_index(&self, raw: &str) -> Result<u32, PlantgenError> {
        let value = self.required_f64(raw)?;
        if value < 1.0 || value.fract() != 0.0 || value > f64::from(u32::MAX) {
            return Err(self.error("invalid-index", "cell must be a positive integer", raw));
        }
        Ok(value as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_header_and_trims_cells() {
        let csv = "id_axis, a_cohort\nMS, 0.0102\n T1 ,\n";
        let table = UserTable::from_reader("dynT_user", csv.as_bytes()).unwrap();
        assert_eq!(table.columns(), ["id_axis", "a_cohort"]);
        assert_eq!(table.rows()[1], vec!["T1".to_string(), String::new()]);
        assert!(table.expect_columns(&["id_axis", "a_cohort"]).is_ok());
    }

    #[test]
    fn column_order_matters() {
        let table = UserTable::new("dimT_user", &["W_blade", "L_blade"], Vec::new());
        let err = table.expect_columns(&["L_blade", "W_blade"]).unwrap_err();
        assert_eq!(err.info().code, "column-mismatch");
        assert_eq!(err.info().context["table"], "dimT_user");
    }

    #[test]
    fn cells_parse_with_positions() {
        let cell = CellRef {
            table: "dimT_user",
            row: 2,
            column: "index_phytomer",
        };
        assert_eq!(cell.optional_f64("NaN").unwrap(), None);
        assert_eq!(cell.required_index("4.0").unwrap(), 4);
        let err = cell.required_index("4.5").unwrap_err();
        assert_eq!(err.info().code, "invalid-index");
        assert_eq!(err.info().context["row"], "3");
    }
}

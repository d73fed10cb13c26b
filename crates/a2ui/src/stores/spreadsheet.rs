use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Mutex;

use super::{StoreError, StoreResult};

/// One spreadsheet row, cells in column order
pub type Row = Vec<Value>;

/// A workbook of named sheets
pub trait Spreadsheet: Send + Sync {
    fn has_sheet(&self, sheet: &str) -> bool;

    /// All rows of `sheet`, header included
    fn rows(&self, sheet: &str) -> StoreResult<Vec<Row>>;

    fn append_rows(&self, sheet: &str, rows: Vec<Row>) -> StoreResult<()>;

    /// Create an empty sheet; fails if the name is taken
    fn insert_sheet(&self, sheet: &str) -> StoreResult<()>;
}

#[derive(Debug, Default)]
pub struct InMemorySpreadsheet {
    sheets: Mutex<BTreeMap<String, Vec<Row>>>,
}

impl InMemorySpreadsheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet<S: Into<String>>(self, sheet: S, rows: Vec<Row>) -> Self {
        self.sheets.lock().unwrap().insert(sheet.into(), rows);
        self
    }
}

impl Spreadsheet for InMemorySpreadsheet {
    fn has_sheet(&self, sheet: &str) -> bool {
        self.sheets.lock().unwrap().contains_key(sheet)
    }

    fn rows(&self, sheet: &str) -> StoreResult<Vec<Row>> {
        self.sheets
            .lock()
            .unwrap()
            .get(sheet)
            .cloned()
            .ok_or_else(|| StoreError::SheetNotFound(sheet.to_string()))
    }

    fn append_rows(&self, sheet: &str, rows: Vec<Row>) -> StoreResult<()> {
        self.sheets
            .lock()
            .unwrap()
            .get_mut(sheet)
            .ok_or_else(|| StoreError::SheetNotFound(sheet.to_string()))?
            .extend(rows);
        Ok(())
    }

    fn insert_sheet(&self, sheet: &str) -> StoreResult<()> {
        let mut sheets = self.sheets.lock().unwrap();
        if sheets.contains_key(sheet) {
            return Err(StoreError::SheetExists(sheet.to_string()));
        }
        sheets.insert(sheet.to_string(), Vec::new());
        Ok(())
    }
}

/// Render a cell the way a sheet displays it
pub fn display_cell(cell: &Value) -> String {
    match cell {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Read a cell as a number, accepting numeric strings
pub fn numeric_cell(cell: &Value) -> Option<f64> {
    match cell {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

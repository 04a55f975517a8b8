// 📄 Workbook Layer - the cell grid every reader works against
// Backends: in-memory grid, Excel (calamine) and CSV (csv).

use std::fs::File;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use tracing::debug;

use crate::error::{Result, TaxonomyError};

// ============================================================================
// CELL VALUE
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Cell rendered as text. Integral numbers lose their fractional part so a
    /// code cell holding `12.0` reads as `"12"`.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(s) if s.trim().is_empty() => None,
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Number(v) if v.fract() == 0.0 && v.abs() < 1e15 => {
                Some(format!("{}", *v as i64))
            }
            CellValue::Number(v) => Some(format!("{v}")),
            CellValue::Bool(v) => Some(if *v { "1".to_string() } else { "0".to_string() }),
        }
    }

    /// Text equality, used for header markers.
    pub fn text_eq(&self, expected: &str) -> bool {
        self.as_text().as_deref() == Some(expected)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s.to_string())
        }
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Number(v)
    }
}

// ============================================================================
// TRAITS
// ============================================================================

/// One sheet of a workbook. Rows and columns are 1-based, matching the
/// spreadsheets' own addressing.
pub trait Worksheet {
    fn title(&self) -> &str;

    /// Number of the last row holding data (0 for an empty sheet).
    fn row_count(&self) -> usize;

    /// Out-of-range addresses read as `CellValue::Empty`.
    fn cell(&self, row: usize, col: usize) -> &CellValue;

    fn text(&self, row: usize, col: usize) -> Option<String> {
        self.cell(row, col).as_text()
    }

    fn is_blank_row(&self, row: usize) -> bool;
}

pub trait Workbook {
    /// Where the workbook came from, for error messages.
    fn source_name(&self) -> &str;

    fn sheets(&self) -> Vec<&dyn Worksheet>;

    fn sheet(&self, index: usize) -> Option<&dyn Worksheet> {
        self.sheets().get(index).copied()
    }
}

// ============================================================================
// IN-MEMORY BACKEND
// ============================================================================

static EMPTY: CellValue = CellValue::Empty;

#[derive(Debug, Clone, Default)]
pub struct MemorySheet {
    title: String,
    rows: Vec<Vec<CellValue>>,
}

impl MemorySheet {
    pub fn new(title: &str) -> Self {
        MemorySheet {
            title: title.to_string(),
            rows: Vec::new(),
        }
    }

    /// Set a cell, growing the grid as needed.
    pub fn set(&mut self, row: usize, col: usize, value: impl Into<CellValue>) {
        assert!(row >= 1 && col >= 1, "cells are 1-based");
        if self.rows.len() < row {
            self.rows.resize_with(row, Vec::new);
        }
        let cells = &mut self.rows[row - 1];
        if cells.len() < col {
            cells.resize(col, CellValue::Empty);
        }
        cells[col - 1] = value.into();
    }

    /// Builder form of `set`.
    pub fn with(mut self, row: usize, col: usize, value: impl Into<CellValue>) -> Self {
        self.set(row, col, value);
        self
    }

    /// Append a row of text cells starting at column 1; `""` leaves a cell empty.
    pub fn push_row(&mut self, cells: &[&str]) {
        self.rows.push(cells.iter().map(|c| CellValue::from(*c)).collect());
    }

    pub fn from_rows(title: &str, rows: Vec<Vec<CellValue>>) -> Self {
        MemorySheet {
            title: title.to_string(),
            rows,
        }
    }
}

impl Worksheet for MemorySheet {
    fn title(&self) -> &str {
        &self.title
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn cell(&self, row: usize, col: usize) -> &CellValue {
        if row == 0 || col == 0 {
            return &EMPTY;
        }
        self.rows
            .get(row - 1)
            .and_then(|cells| cells.get(col - 1))
            .unwrap_or(&EMPTY)
    }

    fn is_blank_row(&self, row: usize) -> bool {
        match row.checked_sub(1).and_then(|i| self.rows.get(i)) {
            Some(cells) => cells.iter().all(CellValue::is_empty),
            None => true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryWorkbook {
    source_name: String,
    sheets: Vec<MemorySheet>,
}

impl MemoryWorkbook {
    pub fn new(source_name: &str) -> Self {
        MemoryWorkbook {
            source_name: source_name.to_string(),
            sheets: Vec::new(),
        }
    }

    pub fn with_sheet(mut self, sheet: MemorySheet) -> Self {
        self.sheets.push(sheet);
        self
    }

    pub fn add_sheet(&mut self, sheet: MemorySheet) {
        self.sheets.push(sheet);
    }
}

impl Workbook for MemoryWorkbook {
    fn source_name(&self) -> &str {
        &self.source_name
    }

    fn sheets(&self) -> Vec<&dyn Worksheet> {
        self.sheets.iter().map(|s| s as &dyn Worksheet).collect()
    }
}

// ============================================================================
// EXCEL BACKEND (calamine)
// ============================================================================

fn data_to_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(v) => CellValue::Number(*v),
        Data::Int(v) => CellValue::Number(*v as f64),
        Data::Bool(v) => CellValue::Bool(*v),
        Data::Error(_) => CellValue::Empty,
        other => CellValue::Text(format!("{other:?}")),
    }
}

/// Open an `.xlsx`/`.xls` file and read every sheet into memory.
pub fn open_xlsx(path: &Path) -> Result<MemoryWorkbook> {
    let source_name = path.display().to_string();
    let mut excel = open_workbook_auto(path).map_err(|e| {
        TaxonomyError::format(&source_name, format!("not an Excel file (.xlsx): {e}"))
    })?;

    let mut workbook = MemoryWorkbook::new(&source_name);
    for title in excel.sheet_names() {
        let range = excel
            .worksheet_range(&title)
            .map_err(|e| TaxonomyError::format(&source_name, format!("sheet '{title}': {e}")))?;

        // Ranges start at the first used cell; pad so addressing stays absolute.
        let (row_offset, col_offset) = range
            .start()
            .map(|(r, c)| (r as usize, c as usize))
            .unwrap_or((0, 0));
        let mut rows: Vec<Vec<CellValue>> = vec![Vec::new(); row_offset];
        for row in range.rows() {
            let mut cells = vec![CellValue::Empty; col_offset];
            cells.extend(row.iter().map(data_to_cell));
            rows.push(cells);
        }
        debug!(sheet = %title, rows = rows.len(), "read worksheet");
        workbook.add_sheet(MemorySheet::from_rows(&title, rows));
    }
    Ok(workbook)
}

// ============================================================================
// CSV BACKEND
// ============================================================================

/// Sheet title from a CSV file stem; a leading `NN_` ordering prefix is dropped.
fn csv_sheet_title(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Sheet1");
    match stem.split_once('_') {
        Some((prefix, rest)) if !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_digit()) => {
            rest.to_string()
        }
        _ => stem.to_string(),
    }
}

fn read_csv_sheet(path: &Path) -> Result<MemorySheet> {
    let file = File::open(path).map_err(|e| TaxonomyError::io(path, e))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut rows = Vec::new();
    for (line_num, result) in reader.records().enumerate() {
        let record = result.map_err(|e| {
            TaxonomyError::format(
                path.display().to_string(),
                format!("failed to parse CSV line {}: {e}", line_num + 1),
            )
        })?;
        rows.push(record.iter().map(CellValue::from).collect());
    }
    Ok(MemorySheet::from_rows(&csv_sheet_title(path), rows))
}

/// A CSV file is a one-sheet workbook; a directory holds one sheet per `*.csv`
/// file, in file name order.
pub fn open_csv(path: &Path) -> Result<MemoryWorkbook> {
    let mut workbook = MemoryWorkbook::new(&path.display().to_string());
    if path.is_dir() {
        let mut files: Vec<_> = std::fs::read_dir(path)
            .map_err(|e| TaxonomyError::io(path, e))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("csv"))
            .collect();
        files.sort();
        for file in files {
            workbook.add_sheet(read_csv_sheet(&file)?);
        }
    } else {
        workbook.add_sheet(read_csv_sheet(path)?);
    }
    Ok(workbook)
}

/// Open any supported workbook: CSV files or directories, otherwise Excel.
pub fn open_workbook(path: &Path) -> Result<MemoryWorkbook> {
    if !path.exists() {
        return Err(TaxonomyError::io(
            path,
            std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        ));
    }
    let is_csv = path.extension().and_then(|e| e.to_str()) == Some("csv");
    if path.is_dir() || is_csv {
        open_csv(path)
    } else {
        open_xlsx(path)
    }
}

// ============================================================================
// TESTS
// ============================================================================

// 🏷️ Row Classifier - which rank does a spreadsheet row introduce?
// IOC master rows are classified by the first non-empty rank column; SOF rows
// by the value of their level column.

use crate::error::{Result, TaxonomyError};
use crate::taxon::Rank;
use crate::workbook::Worksheet;

// ============================================================================
// CLASSIFIED ROW
// ============================================================================

/// Payload cells of a row, read at the layout's offsets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowFields {
    pub authority: Option<String>,
    pub english_name: Option<String>,
    pub family_english_name: Option<String>,
    pub breeding_range: Option<String>,
    pub breeding_subranges: Option<String>,
    pub nonbreeding_range: Option<String>,
    pub code: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedRow {
    /// 1-based row number in the sheet.
    pub row: usize,
    pub rank: Rank,
    /// Raw cell text of the rank column, before any name transform.
    pub name: String,
    pub fields: RowFields,
}

// ============================================================================
// IOC MASTER LAYOUT
// ============================================================================

/// First data row of an IOC master sheet.
pub const MASTER_FIRST_ROW: usize = 5;

/// Column positions of the IOC master sheet for one column shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MasterLayout {
    shift: usize,
}

impl MasterLayout {
    pub fn new(shift: usize) -> Self {
        MasterLayout { shift }
    }

    /// Rank columns in priority order. The infraclass column never moves.
    pub fn rank_columns(&self) -> [(Rank, usize); 6] {
        let s = self.shift;
        [
            (Rank::Infraclass, 1),
            (Rank::Order, 2 + s),
            (Rank::Family, 3 + s),
            (Rank::Genus, 5 + s),
            (Rank::Species, 6 + s),
            (Rank::Subspecies, 7 + s),
        ]
    }

    fn fields(&self, sheet: &dyn Worksheet, row: usize) -> RowFields {
        let s = self.shift;
        RowFields {
            family_english_name: sheet.text(row, 4 + s),
            authority: sheet.text(row, 8 + s),
            english_name: sheet.text(row, 9 + s),
            breeding_range: sheet.text(row, 10 + s),
            breeding_subranges: sheet.text(row, 11 + s),
            nonbreeding_range: sheet.text(row, 12 + s),
            code: sheet.text(row, 13 + s),
            comment: sheet.text(row, 14 + s),
        }
    }
}

/// Classify one master row. `None` when no rank column is filled.
pub fn classify(sheet: &dyn Worksheet, row: usize, column_shift: usize) -> Option<ClassifiedRow> {
    let layout = MasterLayout::new(column_shift);
    let (rank, name) = layout
        .rank_columns()
        .iter()
        .find_map(|(rank, col)| sheet.text(row, *col).map(|name| (*rank, name)))?;

    Some(ClassifiedRow {
        row,
        rank,
        name,
        fields: layout.fields(sheet, row),
    })
}

/// Every classifiable row of a master sheet, in sheet order.
pub fn classify_master_rows(
    sheet: &dyn Worksheet,
    column_shift: usize,
) -> impl Iterator<Item = ClassifiedRow> + '_ {
    (MASTER_FIRST_ROW..=sheet.row_count()).filter_map(move |row| classify(sheet, row, column_shift))
}

// ============================================================================
// SOF LAYOUT
// ============================================================================

/// What a SOF names-list row is.
#[derive(Debug, Clone, PartialEq)]
pub enum SofRow {
    Taxon {
        row: usize,
        rank: Rank,
        name: String,
        english_name: Option<String>,
        swedish_name: Option<String>,
        note_ids: Vec<String>,
    },
    /// Empty level cell: the notes section begins here.
    NotesStart,
}

pub fn classify_sof(sheet: &dyn Worksheet, row: usize) -> Result<SofRow> {
    let level = match sheet.text(row, 2) {
        Some(level) => level,
        None => return Ok(SofRow::NotesStart),
    };
    let rank = match level.trim() {
        "ordning" => Rank::Order,
        "familj" => Rank::Family,
        "art" => Rank::Species,
        other => {
            return Err(TaxonomyError::format(
                sheet.title(),
                format!("unrecognized taxon level '{other}' on row {row}"),
            ))
        }
    };
    let name = sheet.text(row, 3).ok_or_else(|| {
        TaxonomyError::format(sheet.title(), format!("row {row} has no scientific name"))
    })?;
    let note_ids = sheet
        .text(row, 6)
        .map(|ids| ids.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();

    Ok(SofRow::Taxon {
        row,
        rank,
        name: name.trim().to_string(),
        english_name: if rank == Rank::Order { None } else { sheet.text(row, 4) },
        swedish_name: sheet.text(row, 5),
        note_ids,
    })
}

// ============================================================================
// TESTS
// ============================================================================

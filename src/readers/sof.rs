// 🇸🇪 SOF names list reader
// BirdLife Sweden's list of Swedish bird names: Order → Family → Species
// with English and Swedish names, followed by a section of numbered notes.

use std::collections::HashMap;

use tracing::info;

use crate::builder::TaxonomyBuilder;
use crate::classifier::{classify_sof, SofRow};
use crate::error::{Result, TaxonomyError};
use crate::taxon::{Checklist, Rank, Taxon};
use crate::taxonomy::{TaxonId, Taxonomy};
use crate::workbook::{Workbook, Worksheet};

const FIRST_ROW: usize = 2;
const COL_NOTE: usize = 3;
const NOTES_HEADER: &str = "Noter";

/// Version of a SOF names workbook: its first sheet is titled `NL<version>`.
pub fn sof_version(workbook: &dyn Workbook) -> Option<String> {
    let title = workbook.sheet(0)?.title();
    let version = title.strip_prefix("NL")?.trim();
    (!version.is_empty()).then(|| version.to_string())
}

pub fn read_sof(workbook: &dyn Workbook) -> Result<Taxonomy> {
    let source = workbook.source_name();
    let version = sof_version(workbook).ok_or_else(|| {
        TaxonomyError::format(
            source,
            "not a SOF names list: first worksheet title must start with 'NL'",
        )
    })?;
    let sheet = workbook
        .sheet(0)
        .ok_or_else(|| TaxonomyError::format(source, "workbook has no worksheet"))?;
    info!("Reading SOF {} from {}", version, source);

    let mut builder = TaxonomyBuilder::new(Checklist::Sof, &version);
    let mut with_notes: Vec<(TaxonId, Vec<String>)> = Vec::new();
    let mut notes_from = None;

    for row in FIRST_ROW..=sheet.row_count() {
        let (rank, name, english_name, swedish_name, note_ids) = match classify_sof(sheet, row)? {
            SofRow::NotesStart => {
                notes_from = Some(row + 1);
                break;
            }
            SofRow::Taxon {
                rank,
                name,
                english_name,
                swedish_name,
                note_ids,
                ..
            } => (rank, name, english_name, swedish_name, note_ids),
        };

        let mut taxon = match rank {
            Rank::Species => Taxon::species_from_binomial(&name, ""),
            _ => Taxon::higher(rank, &name, None),
        };
        if let Some(en) = english_name {
            taxon.common_names.insert("en".to_string(), en);
        }
        if let Some(sv) = swedish_name {
            taxon.common_names.insert("sv".to_string(), sv);
        }

        let id = builder.push_taxon(row, taxon)?;
        if !note_ids.is_empty() {
            with_notes.push((id, note_ids));
        }
    }

    let notes = match notes_from {
        Some(start) => read_notes(sheet, start, source)?,
        None => HashMap::new(),
    };

    let mut taxonomy = builder.finish();
    for (id, note_ids) in with_notes {
        let texts = note_ids
            .iter()
            .map(|note_id| {
                notes.get(note_id).cloned().ok_or_else(|| {
                    TaxonomyError::format(source, format!("note {note_id} is referenced but missing"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        taxonomy.get_mut(id).notes = texts;
    }

    info!("{} taxa read", taxonomy.total());
    Ok(taxonomy)
}

/// Notes are `"<id> <text>"` rows after the `Noter` header; the first blank
/// row after at least one note ends the section.
fn read_notes(sheet: &dyn Worksheet, start: usize, source: &str) -> Result<HashMap<String, String>> {
    let mut notes = HashMap::new();
    for row in start..=sheet.row_count() {
        let Some(cell) = sheet.text(row, COL_NOTE) else {
            if notes.is_empty() {
                continue;
            }
            break;
        };
        let cell = cell.trim();
        if cell == NOTES_HEADER {
            continue;
        }
        let (id, text) = cell.split_once(' ').ok_or_else(|| {
            TaxonomyError::format(source, format!("row {row}: note '{cell}' has no text"))
        })?;
        notes.insert(id.to_string(), text.trim().to_string());
    }
    Ok(notes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbook::{MemorySheet, MemoryWorkbook};

    fn names_list() -> MemoryWorkbook {
        let mut sheet = MemorySheet::new("NL 2024");
        sheet.push_row(&["", "Nivå", "Vetenskapligt namn", "Engelskt namn", "Svenskt namn", "Noter"]);
        sheet.push_row(&["", "ordning", "ANSERIFORMES", "", "Andfåglar", ""]);
        sheet.push_row(&["", "familj", "Anatidae", "Ducks, Geese and Swans", "Änder", ""]);
        sheet.push_row(&["", "art", "Cygnus olor", "Mute Swan", "Knölsvan", "1"]);
        sheet.push_row(&["", "art", "Cygnus cygnus", "Whooper Swan", "Sångsvan", "1 2"]);
        sheet.push_row(&["", "ordning", "GALLIFORMES", "", "Hönsfåglar", ""]);
        sheet.push_row(&["", "familj", "Phasianidae", "Pheasants", "Fasanfåglar", ""]);
        sheet.push_row(&["", "art", "Lagopus muta", "Rock Ptarmigan", "Fjällripa", ""]);
        sheet.push_row(&["", "", "", "", "", ""]);
        sheet.push_row(&["", "", "Noter", "", "", ""]);
        sheet.push_row(&["", "", "1 Ursprungligen införd.", "", "", ""]);
        sheet.push_row(&["", "", "2 Häckar sällsynt.", "", "", ""]);
        sheet.push_row(&["", "", "", "", "", ""]);
        sheet.push_row(&["", "", "Tabellen uppdaterad 2024", "", "", ""]);
        MemoryWorkbook::new("sof.xlsx").with_sheet(sheet)
    }

    #[test]
    fn test_sof_version() {
        assert_eq!(sof_version(&names_list()).as_deref(), Some("2024"));
        let other = MemoryWorkbook::new("x.xlsx").with_sheet(MemorySheet::new("Master"));
        assert_eq!(sof_version(&other), None);
        assert!(matches!(read_sof(&other), Err(TaxonomyError::Format { .. })));
    }

    #[test]
    fn test_read_sof() {
        let t = read_sof(&names_list()).unwrap();
        assert_eq!(t.version(), "2024");
        assert_eq!(t.counts().order_count, 2);
        assert_eq!(t.counts().family_count, 2);
        assert_eq!(t.counts().species_count, 3);
        assert_eq!(t.total(), 7);

        let swan = t.find("Cygnus cygnus").unwrap();
        assert_eq!(swan.name, "cygnus");
        assert_eq!(swan.supertaxon.as_deref(), Some("Anatidae"));
        assert_eq!(swan.common_names["sv"], "Sångsvan");
        assert_eq!(swan.notes, vec!["Ursprungligen införd.", "Häckar sällsynt."]);
        assert_eq!(swan.sort_index, Some(2));

        let order = t.find("ANSERIFORMES").unwrap();
        assert!(!order.common_names.contains_key("en"));
        assert!(order.notes.is_empty());
    }

    #[test]
    fn test_missing_note_is_format_error() {
        let mut sheet = MemorySheet::new("NL2024");
        sheet.push_row(&["", "Nivå", "", "", "", ""]);
        sheet.push_row(&["", "ordning", "ANSERIFORMES", "", "Andfåglar", "9"]);
        let wb = MemoryWorkbook::new("sof.xlsx").with_sheet(sheet);
        assert!(matches!(read_sof(&wb), Err(TaxonomyError::Format { .. })));
    }

    #[test]
    fn test_species_before_family_is_structural_error() {
        let mut sheet = MemorySheet::new("NL2024");
        sheet.push_row(&["", "Nivå", "", "", "", ""]);
        sheet.push_row(&["", "ordning", "ANSERIFORMES", "", "", ""]);
        sheet.push_row(&["", "art", "Cygnus olor", "", "", ""]);
        let wb = MemoryWorkbook::new("sof.xlsx").with_sheet(sheet);
        assert!(matches!(
            read_sof(&wb),
            Err(TaxonomyError::StructuralOrder { row: 3, rank: Rank::Species, missing: Rank::Family })
        ));
    }
}

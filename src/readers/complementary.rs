// ➕ IOC Complementary reader
// Extinction flags and codes per taxon. Only Genus, Species and Subspecies
// entries are merged.

use std::collections::HashMap;

use crate::detect::{Detected, FileKind};
use crate::error::{Result, TaxonomyError};
use crate::merge::Overlay;
use crate::taxon::{Rank, Taxon, EXTINCT_MARKER};
use crate::workbook::{Workbook, Worksheet};

const FIRST_ROW: usize = 3;
const COL_KIND: usize = 2;
const COL_EXTINCT: usize = 3;

/// Columns right of the extinct flag; they move two steps right from 14.1 on.
struct Columns {
    english_name: usize,
    name: usize,
    authority: usize,
    breeding_range: usize,
    nonbreeding_range: usize,
    code: usize,
    comment: usize,
}

impl Columns {
    fn new(shift: usize) -> Self {
        let s = 2 * shift;
        Columns {
            english_name: 4 + s,
            name: 6 + s,
            authority: 7 + s,
            breeding_range: 8 + s,
            nonbreeding_range: 9 + s,
            code: 10 + s,
            comment: 11 + s,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComplementaryEntry {
    pub rank: Rank,
    pub extinct: bool,
    pub english_name: Option<String>,
    pub authority: Option<String>,
    pub breeding_range: Option<String>,
    pub nonbreeding_range: Option<String>,
    pub code: Option<String>,
    pub comment: Option<String>,
}

pub struct Complementary {
    version: String,
    entries: HashMap<String, ComplementaryEntry>,
}

fn clean(name: &str) -> String {
    name.trim().trim_matches(EXTINCT_MARKER).trim().to_string()
}

impl Complementary {
    pub fn read(workbook: &dyn Workbook, detected: &Detected) -> Result<Self> {
        let source = workbook.source_name();
        let sheet = workbook
            .sheet(0)
            .ok_or_else(|| TaxonomyError::format(source, "workbook has no worksheet"))?;
        let cols = Columns::new(detected.column_shift());

        let mut entries = HashMap::new();
        let mut last_species: Option<String> = None;

        for row in FIRST_ROW..=sheet.row_count() {
            let Some(raw_name) = sheet.text(row, cols.name) else {
                continue;
            };
            let flag = sheet.text(row, COL_EXTINCT);
            let is_ssp = flag.as_deref().map(str::trim) == Some("ssp");

            let (rank, key) = match sheet.text(row, COL_KIND).as_deref().map(str::trim) {
                Some("Blank") => (Rank::Infraclass, clean(&raw_name)),
                Some("ORDER") => (Rank::Order, nth_word(&raw_name, 1, source, row)?),
                Some("Family") => (Rank::Family, nth_word(&raw_name, 1, source, row)?),
                Some("Genus") => (Rank::Genus, clean(&raw_name)),
                Some("Species") => {
                    let binomial = clean(&raw_name);
                    last_species = Some(binomial.clone());
                    (Rank::Species, binomial)
                }
                _ if is_ssp => {
                    let species = last_species.as_deref().ok_or_else(|| {
                        TaxonomyError::format(
                            source,
                            format!("row {row}: subspecies before any species"),
                        )
                    })?;
                    let epithet = nth_word(&raw_name, 2, source, row)?;
                    (Rank::Subspecies, format!("{species} {epithet}"))
                }
                _ => continue,
            };

            let extinct = (!is_ssp && flag.map_or(false, |f| f.contains(EXTINCT_MARKER)))
                || raw_name.contains(EXTINCT_MARKER);

            entries.insert(
                key,
                ComplementaryEntry {
                    rank,
                    extinct,
                    english_name: sheet.text(row, cols.english_name),
                    authority: sheet.text(row, cols.authority),
                    breeding_range: sheet.text(row, cols.breeding_range),
                    nonbreeding_range: sheet.text(row, cols.nonbreeding_range),
                    code: sheet.text(row, cols.code),
                    comment: sheet.text(row, cols.comment),
                },
            );
        }

        Ok(Complementary {
            version: detected.version.clone(),
            entries,
        })
    }

    pub fn get(&self, name: &str) -> Option<&ComplementaryEntry> {
        self.entries.get(name)
    }
}

/// `n`-th whitespace-separated word of a name cell, marker-stripped.
fn nth_word(name: &str, n: usize, source: &str, row: usize) -> Result<String> {
    name.split_whitespace()
        .nth(n)
        .map(clean)
        .ok_or_else(|| TaxonomyError::format(source, format!("row {row}: malformed name '{name}'")))
}

impl Overlay for Complementary {
    fn kind(&self) -> FileKind {
        FileKind::Complementary
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    fn ranks(&self) -> Option<&'static [Rank]> {
        Some(&[Rank::Genus, Rank::Species, Rank::Subspecies])
    }

    fn apply(&self, name: &str, taxon: &mut Taxon) {
        if let Some(entry) = self.entries.get(name) {
            taxon.extinct = Some(entry.extinct);
            taxon.code = entry.code.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::merge;
    use crate::taxon::Checklist;
    use crate::taxonomy::Taxonomy;
    use crate::workbook::{MemorySheet, MemoryWorkbook};

    fn workbook(shift: usize) -> MemoryWorkbook {
        let s = 2 * shift;
        let mut sheet = MemorySheet::new(if shift == 1 { "IOC 14.1" } else { "IOC 8.1" })
            .with(1, 4 + s, "English name")
            .with(1, 5 + s, "Counters");
        let rows: [(&str, &str, &str, &str); 6] = [
            ("ORDER", "", "ORDER STRUTHIONIFORMES", "AF"),
            ("Family", "", "Family Struthionidae", ""),
            ("Genus", "", "Struthio", ""),
            ("Species", "", "Struthio camelus", "AF"),
            ("", "ssp", "Struthio camelus syriacus †", "ME"),
            ("Species", "†", "Struthio anderssoni", ""),
        ];
        for (i, (kind, flag, name, code)) in rows.iter().enumerate() {
            let row = 3 + i;
            sheet.set(row, COL_KIND, *kind);
            sheet.set(row, COL_EXTINCT, *flag);
            sheet.set(row, 6 + s, *name);
            sheet.set(row, 10 + s, *code);
        }
        MemoryWorkbook::new("IOC_Names_File_Plus.xlsx").with_sheet(sheet)
    }

    fn detected(version: &str) -> Detected {
        Detected {
            kind: FileKind::Complementary,
            version: version.to_string(),
        }
    }

    #[test]
    fn test_read_keys() {
        for (shift, version) in [(0, "8.1"), (1, "14.1")] {
            let comp = Complementary::read(&workbook(shift), &detected(version)).unwrap();
            assert_eq!(comp.len(), 6);
            assert_eq!(comp.get("STRUTHIONIFORMES").unwrap().rank, Rank::Order);
            assert_eq!(comp.get("Struthionidae").unwrap().rank, Rank::Family);

            let ssp = comp.get("Struthio camelus syriacus").unwrap();
            assert_eq!(ssp.rank, Rank::Subspecies);
            assert!(ssp.extinct);
            assert_eq!(ssp.code.as_deref(), Some("ME"));

            assert!(comp.get("Struthio anderssoni").unwrap().extinct);
            assert!(!comp.get("Struthio camelus").unwrap().extinct);
        }
    }

    #[test]
    fn test_subspecies_before_species_fails() {
        let sheet = MemorySheet::new("IOC 8.1")
            .with(3, COL_EXTINCT, "ssp")
            .with(3, 6, "Struthio camelus syriacus");
        let wb = MemoryWorkbook::new("c.xlsx").with_sheet(sheet);
        assert!(matches!(
            Complementary::read(&wb, &detected("8.1")),
            Err(TaxonomyError::Format { .. })
        ));
    }

    #[test]
    fn test_merge_guards_higher_ranks() {
        let mut t = Taxonomy::new(Checklist::Ioc, "8.1");
        let ic = t.attach(None, Taxon::higher(Rank::Infraclass, "PALEOGNATHAE", None)).unwrap();
        let o = t
            .attach(Some(ic), Taxon::higher(Rank::Order, "STRUTHIONIFORMES", Some("PALEOGNATHAE")))
            .unwrap();
        let f = t
            .attach(Some(o), Taxon::higher(Rank::Family, "Struthionidae", Some("STRUTHIONIFORMES")))
            .unwrap();
        let g = t.attach(Some(f), Taxon::genus("STRUTHIO", "Struthionidae")).unwrap();
        let sp = t.attach(Some(g), Taxon::species("Struthio", "camelus")).unwrap();
        t.attach(Some(sp), Taxon::subspecies("Struthio", "camelus", "syriacus"))
            .unwrap();

        let comp = Complementary::read(&workbook(0), &detected("8.1")).unwrap();
        let report = merge(&mut t, &comp);
        assert_eq!(report.matched, 5);
        assert_eq!(report.updated, 3);

        let order = t.find("STRUTHIONIFORMES").unwrap();
        assert_eq!(order.code, None);
        assert_eq!(order.extinct, None);

        let species = t.find("Struthio camelus").unwrap();
        assert_eq!(species.code.as_deref(), Some("AF"));
        assert_eq!(species.extinct, Some(false));
        assert_eq!(t.find("Struthio camelus syriacus").unwrap().extinct, Some(true));
    }
}

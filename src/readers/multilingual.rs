// 🌍 IOC Multilingual reader
// Common names in many languages, keyed by binomial. Two layouts exist: the
// 7.3/8.1 files spread 26 languages over three rows per species; from 14.1 on
// each species is one row of 44 languages.

use std::collections::{BTreeMap, HashMap};

use crate::detect::{Detected, FileKind};
use crate::error::{Result, TaxonomyError};
use crate::merge::Overlay;
use crate::taxon::Taxon;
use crate::workbook::{Workbook, Worksheet};

pub type CommonNames = BTreeMap<String, String>;

const COL_SCIENTIFIC_NAME: usize = 4;

// ============================================================================
// THREE-ROW LAYOUT (7.3, 8.1)
// ============================================================================

const CYCLE_FIRST_ROW: usize = 4;

/// ISO 639-2 codes and their 1-based columns, for each row of the cycle.
const CYCLE_LANGUAGES: [&[(&str, usize)]; 3] = [
    &[
        ("cat", 7),
        ("cze", 10),
        ("est", 13),
        ("ger", 16),
        ("ind", 19),
        ("lav", 22),
        ("pol", 25),
        ("slo", 28),
        ("swe", 31),
    ],
    &[
        ("eng", 5),
        ("chi", 8),
        ("dan", 11),
        ("fin", 14),
        ("hun", 17),
        ("ita", 20),
        ("lit", 23),
        ("por", 26),
        ("slv", 29),
    ],
    &[
        ("lzh", 9),
        ("dut", 12),
        ("fre", 15),
        ("ice", 18),
        ("jpn", 21),
        ("nno", 24),
        ("rus", 27),
        ("spa", 30),
    ],
];

// ============================================================================
// SINGLE-ROW LAYOUT (14.1+)
// ============================================================================

const ROW_FIRST_ROW: usize = 2;
const ROW_FIRST_LANGUAGE_COL: usize = 5;

/// BCP 47 tags in column order, starting at column 5.
const ROW_LANGUAGES: [&str; 44] = [
    "en", "ca", "zh-Hans", "zh-Hant", "hr", "cs", "da", "nl", "fi", "fr", "de", "it", "ja", "lt",
    "no", "pl", "pt-br", "pt", "ru", "sr", "sk", "es", "sv", "tr", "uk", "af", "ar", "be", "bg",
    "et", "el", "he", "hu", "is", "id", "ko", "lv", "mk", "ml", "se", "fa", "ro", "sl", "th",
];

pub struct Multilingual {
    version: String,
    names: HashMap<String, CommonNames>,
}

/// Insert every non-empty cell of `languages` from `row` into `names`.
fn collect(sheet: &dyn Worksheet, row: usize, languages: &[(&str, usize)], names: &mut CommonNames) {
    for (tag, col) in languages {
        if let Some(name) = sheet.text(row, *col) {
            names.insert(tag.to_string(), name);
        }
    }
}

fn is_binomial(name: &str) -> bool {
    name.split_whitespace().count() == 2
}

impl Multilingual {
    pub fn read(workbook: &dyn Workbook, detected: &Detected) -> Result<Self> {
        let sheet = workbook
            .sheet(0)
            .ok_or_else(|| TaxonomyError::format(workbook.source_name(), "workbook has no worksheet"))?;
        let names = if detected.column_shift() == 0 {
            read_cycle_layout(sheet)
        } else {
            read_row_layout(sheet)
        };
        Ok(Multilingual {
            version: detected.version.clone(),
            names,
        })
    }

    pub fn names(&self, binomial: &str) -> Option<&CommonNames> {
        self.names.get(binomial)
    }
}

fn read_cycle_layout(sheet: &dyn Worksheet) -> HashMap<String, CommonNames> {
    let mut out = HashMap::new();
    // (binomial, names so far, next row of the cycle)
    let mut open: Option<(String, CommonNames, usize)> = None;

    for row in CYCLE_FIRST_ROW..=sheet.row_count() {
        let scientific = sheet
            .text(row, COL_SCIENTIFIC_NAME)
            .filter(|name| is_binomial(name));
        if let Some(binomial) = scientific {
            // An unfinished cycle is dropped.
            let mut names = CommonNames::new();
            collect(sheet, row, CYCLE_LANGUAGES[0], &mut names);
            open = Some((binomial.trim().to_string(), names, 1));
            continue;
        }
        if let Some((binomial, mut names, step)) = open.take() {
            collect(sheet, row, CYCLE_LANGUAGES[step], &mut names);
            if step == 2 {
                out.insert(binomial, names);
            } else {
                open = Some((binomial, names, step + 1));
            }
        }
    }
    out
}

fn read_row_layout(sheet: &dyn Worksheet) -> HashMap<String, CommonNames> {
    let languages: Vec<(&str, usize)> = ROW_LANGUAGES
        .iter()
        .enumerate()
        .map(|(i, tag)| (*tag, ROW_FIRST_LANGUAGE_COL + i))
        .collect();

    (ROW_FIRST_ROW..=sheet.row_count())
        .filter_map(|row| {
            let name = sheet.text(row, COL_SCIENTIFIC_NAME)?;
            let mut names = CommonNames::new();
            collect(sheet, row, &languages, &mut names);
            Some((name.trim().to_string(), names))
        })
        .collect()
}

impl Overlay for Multilingual {
    fn kind(&self) -> FileKind {
        FileKind::Multilingual
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn len(&self) -> usize {
        self.names.len()
    }

    fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    fn apply(&self, name: &str, taxon: &mut Taxon) {
        if let Some(names) = self.names.get(name) {
            taxon.merge_common_names(names);
        }
    }
}

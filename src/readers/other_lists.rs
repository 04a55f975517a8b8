// 📚 IOC Other Lists reader
// Cross-references every IOC taxon to its name in ten other world checklists.
// The file was dropped from the IOC releases after 8.1; the overlay is kept
// provisional until a newer layout turns up.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::detect::{Detected, FileKind};
use crate::error::{Result, TaxonomyError};
use crate::merge::Overlay;
use crate::taxon::{ListName, OtherListsEntry, Taxon};
use crate::workbook::{Workbook, Worksheet};

/// One alternate checklist: key, full citation and the 1-based columns its
/// name, group and family are read from.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ListSource {
    pub key: &'static str,
    pub citation: &'static str,
    #[serde(skip)]
    pub columns: Option<ListColumns>,
}

#[derive(Debug, Clone, Copy)]
pub struct ListColumns {
    pub name: usize,
    pub group: Option<usize>,
    pub family: usize,
}

const fn cols(name: usize, group: Option<usize>, family: usize) -> Option<ListColumns> {
    Some(ListColumns { name, group, family })
}

pub const OTHER_LISTS: &[ListSource] = &[
    ListSource {
        key: "ioc_7_3",
        citation: "Gill, F & D Donsker (Eds). 2017. IOC World Bird List (v 7.3)",
        columns: None,
    },
    ListSource {
        key: "clements_2016",
        citation: "Clements, J. F., T. S. Schulenberg, M. J. Iliff, D. Roberson, T. A. \
                   Fredericks, B. L. Sullivan, C. L. Wood, and D. F. A. Wiedenfeld. 2016. \
                   The Clements Checklist of Birds of the World: Version 6.9. Cornell Lab of \
                   Ornithology.",
        columns: cols(6, Some(5), 19),
    },
    ListSource {
        key: "hbwbl_2016",
        citation: "del Hoyo, J., N. J. Collar, D. A. Christie, A. Elliott, L. D. C. Fishpool, \
                   P. Boesman & G. M. Kirwan (Eds). 2016. Handbook of the Birds of the World \
                   and BirdLife International Illustrated Checklist of the Birds of the World. \
                   Volume 1: Non-Passerines.",
        columns: cols(8, Some(7), 20),
    },
    ListSource {
        key: "hm4_4ed",
        citation: "Dickinson, E.C., J.V. Remsen Jr. & L. Christidis (Eds). 2013-2014. The \
                   Howard & Moore Complete Checklist of the Birds of the World. 4th Edition. \
                   Aves Press.",
        columns: cols(10, Some(9), 21),
    },
    ListSource {
        key: "hbw_2013",
        citation: "del Hoyo, J., A. Elliott, J. Sargatal & D. A. Christie (Eds). 1992-2013. \
                   Handbook of the Birds of the World. Vols. 1-19. Lynx Edicions.",
        columns: cols(11, None, 22),
    },
    ListSource {
        key: "peters_1986",
        citation: "Peters, J.L. et al. Check-list of Birds of the World, 1931-1986. Harvard \
                   University Press/Museum of Comparative Zoology.",
        columns: cols(12, None, 23),
    },
    ListSource {
        key: "boyd_3_08",
        citation: "John H. Boyd III - TiF checklist, Version 3.08: May 1 2017 and updated July \
                   12 2017.",
        columns: cols(13, None, 24),
    },
    ListSource {
        key: "hbwbl_2017",
        citation: "BirdLife International (2017) Handbook of the Birds of the World and \
                   BirdLife International digital checklist. Version 1.0.",
        columns: cols(14, None, 25),
    },
    ListSource {
        key: "sibley_1993",
        citation: "Sibley, C. G. and B. L. Monroe. 1993. A Supplement to Distribution and \
                   Taxonomy of Birds of the World.",
        columns: cols(15, None, 26),
    },
    ListSource {
        key: "ioc_7_2",
        citation: "Gill, F & D Donsker (Eds). 2017. IOC World Bird List (v 7.2)",
        columns: cols(16, None, 27),
    },
    ListSource {
        key: "ioc_7_1",
        citation: "Gill, F & D Donsker (Eds). 2017. IOC World Bird List (v 7.1)",
        columns: cols(17, None, 28),
    },
];

const FIRST_ROW: usize = 2;
const COL_SEQ: usize = 1;
const COL_NAME: usize = 2;
const COL_RANK: usize = 3;
const COL_NOTES: usize = 4;
const COL_IUCN: usize = 33;

pub struct OtherLists {
    version: String,
    entries: HashMap<String, OtherListsEntry>,
    /// Rows with no name of their own.
    pub continuation_count: usize,
}

impl OtherLists {
    pub fn read(workbook: &dyn Workbook, detected: &Detected) -> Result<Self> {
        let source = workbook.source_name();
        let sheet = workbook
            .sheet(0)
            .ok_or_else(|| TaxonomyError::format(source, "workbook has no worksheet"))?;

        let mut entries: HashMap<String, OtherListsEntry> = HashMap::new();
        let mut latest: Option<String> = None;
        let mut continuation_count = 0;

        for row in FIRST_ROW..=sheet.row_count() {
            if sheet.is_blank_row(row) {
                continue;
            }
            let entry = read_entry(sheet, row);
            match entry.name.clone() {
                Some(name) => {
                    entries.insert(name.clone(), entry);
                    latest = Some(name);
                }
                None => {
                    let parent = latest
                        .as_ref()
                        .and_then(|name| entries.get_mut(name))
                        .ok_or_else(|| {
                            TaxonomyError::format(
                                source,
                                format!("row {row} continues an entry but no named row precedes it"),
                            )
                        })?;
                    parent.following_entries.push(entry);
                    continuation_count += 1;
                }
            }
        }

        Ok(OtherLists {
            version: detected.version.clone(),
            entries,
            continuation_count,
        })
    }

    pub fn get(&self, name: &str) -> Option<&OtherListsEntry> {
        self.entries.get(name)
    }
}

fn read_entry(sheet: &dyn Worksheet, row: usize) -> OtherListsEntry {
    let lists: BTreeMap<String, ListName> = OTHER_LISTS
        .iter()
        .filter_map(|src| src.columns.map(|c| (src.key, c)))
        .map(|(key, c)| {
            let name = ListName {
                name: sheet.text(row, c.name),
                group: c.group.and_then(|g| sheet.text(row, g)),
                family: sheet.text(row, c.family),
            };
            (key.to_string(), name)
        })
        .collect();

    OtherListsEntry {
        seq_no: sheet.text(row, COL_SEQ),
        name: sheet.text(row, COL_NAME).map(|n| n.trim().to_string()),
        rank: sheet.text(row, COL_RANK),
        notes: sheet.text(row, COL_NOTES),
        iucn_red_list_category: sheet.text(row, COL_IUCN),
        lists,
        following_entries: Vec::new(),
    }
}

impl Overlay for OtherLists {
    fn kind(&self) -> FileKind {
        FileKind::OtherLists
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

    fn apply(&self, name: &str, taxon: &mut Taxon) {
        if let Some(entry) = self.entries.get(name) {
            taxon.following_entries = Some(entry.following_entries.clone());
            taxon.lists = Some(entry.lists.clone());
        }
    }
}

// 🐦 Taxon Model - ranks, checklists and rank-discriminated taxon records
// Name transforms for genus, binomial and trinomial names live here.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Marker glyph the checklists append to extinct taxa.
pub const EXTINCT_MARKER: char = '\u{2020}';

// ============================================================================
// RANK
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rank {
    Infraclass,
    Order,
    Family,
    Genus,
    Species,
    Subspecies,
}

impl Rank {
    /// All ranks, top to bottom.
    pub const ALL: [Rank; 6] = [
        Rank::Infraclass,
        Rank::Order,
        Rank::Family,
        Rank::Genus,
        Rank::Species,
        Rank::Subspecies,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Rank::Infraclass => "Infraclass",
            Rank::Order => "Order",
            Rank::Family => "Family",
            Rank::Genus => "Genus",
            Rank::Species => "Species",
            Rank::Subspecies => "Subspecies",
        }
    }

    /// Position in the containment order (Infraclass = 0).
    pub fn depth(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// CHECKLIST
// ============================================================================

/// Which published list a taxonomy comes from. Decides the rank hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Checklist {
    /// IOC World Bird List: Infraclass → Order → Family → Genus → Species → Subspecies
    Ioc,
    /// BirdLife Sweden names list: Order → Family → Species
    Sof,
}

impl Checklist {
    pub fn label(&self) -> &'static str {
        match self {
            Checklist::Ioc => "IOC",
            Checklist::Sof => "SOF",
        }
    }

    /// Sub-directory name used under the data directory.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Checklist::Ioc => "ioc",
            Checklist::Sof => "sof",
        }
    }

    pub fn root_rank(&self) -> Rank {
        match self {
            Checklist::Ioc => Rank::Infraclass,
            Checklist::Sof => Rank::Order,
        }
    }

    /// Ranks this checklist uses, top to bottom.
    pub fn ranks(&self) -> &'static [Rank] {
        match self {
            Checklist::Ioc => &Rank::ALL,
            Checklist::Sof => &[Rank::Order, Rank::Family, Rank::Species],
        }
    }

    /// Rank a node of `rank` must hang under. `None` for the root rank.
    pub fn parent_rank(&self, rank: Rank) -> Option<Rank> {
        let ranks = self.ranks();
        let pos = ranks.iter().position(|r| *r == rank)?;
        if pos == 0 {
            None
        } else {
            Some(ranks[pos - 1])
        }
    }
}

// ============================================================================
// AUXILIARY PAYLOADS
// ============================================================================

/// Name of a taxon in an alternate checklist (Clements, HBW, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListName {
    pub name: Option<String>,
    pub group: Option<String>,
    pub family: Option<String>,
}

/// One row of the IOC Other Lists cross-reference file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OtherListsEntry {
    pub seq_no: Option<String>,
    pub name: Option<String>,
    pub rank: Option<String>,
    pub notes: Option<String>,
    pub iucn_red_list_category: Option<String>,
    pub lists: BTreeMap<String, ListName>,
    /// Rows with no name that continue this one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub following_entries: Vec<OtherListsEntry>,
}

// ============================================================================
// TAXON
// ============================================================================

/// One node of the taxonomy. Children are owned by the `Taxonomy` arena and
/// are not part of this record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Taxon {
    pub rank: Rank,
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supertaxon: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    binomial_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    trinomial_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_index: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authority: Option<String>,

    #[serde(default)]
    pub common_names: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breeding_range: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breeding_subranges: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonbreeding_range: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,

    // Set by the complementary merge
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extinct: Option<bool>,

    // Set by the Other Lists merge
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub following_entries: Option<Vec<OtherListsEntry>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lists: Option<BTreeMap<String, ListName>>,
}

impl Taxon {
    fn bare(rank: Rank, name: String, supertaxon: Option<String>) -> Self {
        Taxon {
            rank,
            name,
            supertaxon,
            binomial_name: None,
            trinomial_name: None,
            sort_index: None,
            authority: None,
            common_names: BTreeMap::new(),
            breeding_range: None,
            breeding_subranges: None,
            nonbreeding_range: None,
            code: None,
            comment: None,
            notes: Vec::new(),
            extinct: None,
            following_entries: None,
            lists: None,
        }
    }

    /// Infraclass, Order or Family. Names are kept as given.
    pub fn higher(rank: Rank, name: &str, supertaxon: Option<&str>) -> Self {
        debug_assert!(rank < Rank::Genus);
        Taxon::bare(rank, name.to_string(), supertaxon.map(str::to_string))
    }

    pub fn genus(raw_name: &str, family: &str) -> Self {
        Taxon::bare(Rank::Genus, genus_name(raw_name), Some(family.to_string()))
    }

    /// Species under `genus`; `epithet` is kept raw as the node name.
    pub fn species(genus: &str, epithet: &str) -> Self {
        let mut taxon = Taxon::bare(Rank::Species, epithet.to_string(), Some(genus.to_string()));
        taxon.binomial_name = Some(binomial_name(genus, epithet));
        taxon
    }

    /// Species from an already-formed binomial (the SOF list gives full names).
    pub fn species_from_binomial(binomial: &str, family: &str) -> Self {
        let epithet = binomial.split_whitespace().nth(1).unwrap_or(binomial);
        let mut taxon = Taxon::bare(Rank::Species, epithet.to_string(), Some(family.to_string()));
        taxon.binomial_name = Some(binomial.trim().to_string());
        taxon
    }

    /// Subspecies; `species` is the raw epithet of the parent species.
    pub fn subspecies(genus: &str, species: &str, epithet: &str) -> Self {
        let mut taxon =
            Taxon::bare(Rank::Subspecies, epithet.to_string(), Some(species.to_string()));
        taxon.trinomial_name = Some(trinomial_name(genus, species, epithet));
        taxon
    }

    pub fn binomial_name(&self) -> Option<&str> {
        self.binomial_name.as_deref()
    }

    pub fn trinomial_name(&self) -> Option<&str> {
        self.trinomial_name.as_deref()
    }

    /// Key of this taxon in the flat index.
    pub fn index_name(&self) -> &str {
        match self.rank {
            Rank::Species => self.binomial_name.as_deref().unwrap_or(&self.name),
            Rank::Subspecies => self.trinomial_name.as_deref().unwrap_or(&self.name),
            _ => &self.name,
        }
    }

    /// File the store writes this taxon to.
    pub fn file_name(&self) -> String {
        format!("{}.json", self.index_name().replace(' ', "_"))
    }

    /// Merge language-tagged names; existing tags are overwritten, others kept.
    pub fn merge_common_names<'a, I>(&mut self, names: I)
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        for (tag, name) in names {
            self.common_names.insert(tag.clone(), name.clone());
        }
    }
}

// ============================================================================
// NAME TRANSFORMS
// ============================================================================

fn strip_edges(s: &str) -> &str {
    s.trim_matches(EXTINCT_MARKER).trim()
}

/// Title-case the way the checklists expect: first letter of each run of
/// letters upper-cased, the rest lower-cased.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_is_letter = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }
    out
}

pub fn genus_name(raw: &str) -> String {
    strip_edges(&title_case(raw)).to_string()
}

/// Only the ends are stripped; an interior marker survives.
pub fn binomial_name(genus: &str, species: &str) -> String {
    strip_edges(&format!("{} {}", genus, species)).to_string()
}

/// Ends are stripped and every `" †"` inside the name is removed.
pub fn trinomial_name(genus: &str, species: &str, subspecies: &str) -> String {
    let full = format!("{} {} {}", genus, species, subspecies);
    strip_edges(&full).replace(&format!(" {}", EXTINCT_MARKER), "")
}

// ============================================================================
// TESTS
// ============================================================================

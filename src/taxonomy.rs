// 🌳 Taxonomy - the whole-list aggregate
// Owns every taxon in an arena; the tree and the flat name index both refer
// to nodes by `TaxonId`.

use serde::{Serialize, Serializer};
use std::collections::HashMap;

use crate::error::{Result, TaxonomyError};
use crate::taxon::{Checklist, Rank, Taxon};

/// Handle to a taxon inside one `Taxonomy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaxonId(usize);

// ============================================================================
// RANK COUNTS
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RankCounts {
    pub infraclass_count: usize,
    pub order_count: usize,
    pub family_count: usize,
    pub genus_count: usize,
    pub species_count: usize,
    pub subspecies_count: usize,
}

impl RankCounts {
    pub fn increment(&mut self, rank: Rank) {
        *self.slot(rank) += 1;
    }

    pub fn get(&self, rank: Rank) -> usize {
        match rank {
            Rank::Infraclass => self.infraclass_count,
            Rank::Order => self.order_count,
            Rank::Family => self.family_count,
            Rank::Genus => self.genus_count,
            Rank::Species => self.species_count,
            Rank::Subspecies => self.subspecies_count,
        }
    }

    fn slot(&mut self, rank: Rank) -> &mut usize {
        match rank {
            Rank::Infraclass => &mut self.infraclass_count,
            Rank::Order => &mut self.order_count,
            Rank::Family => &mut self.family_count,
            Rank::Genus => &mut self.genus_count,
            Rank::Species => &mut self.species_count,
            Rank::Subspecies => &mut self.subspecies_count,
        }
    }

    pub fn total(&self) -> usize {
        Rank::ALL.iter().map(|r| self.get(*r)).sum()
    }
}

// ============================================================================
// TAXONOMY
// ============================================================================

struct Node {
    taxon: Taxon,
    subtaxa: Vec<TaxonId>,
}

pub struct Taxonomy {
    checklist: Checklist,
    version: String,
    nodes: Vec<Node>,
    roots: Vec<TaxonId>,
    index: HashMap<String, TaxonId>,
    counts: RankCounts,
}

impl Taxonomy {
    pub fn new(checklist: Checklist, version: &str) -> Self {
        Taxonomy {
            checklist,
            version: version.to_string(),
            nodes: Vec::new(),
            roots: Vec::new(),
            index: HashMap::new(),
            counts: RankCounts::default(),
        }
    }

    pub fn checklist(&self) -> Checklist {
        self.checklist
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn counts(&self) -> &RankCounts {
        &self.counts
    }

    pub fn total(&self) -> usize {
        self.counts.total()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> &[TaxonId] {
        &self.roots
    }

    pub fn get(&self, id: TaxonId) -> &Taxon {
        &self.nodes[id.0].taxon
    }

    pub fn get_mut(&mut self, id: TaxonId) -> &mut Taxon {
        &mut self.nodes[id.0].taxon
    }

    pub fn subtaxa(&self, id: TaxonId) -> &[TaxonId] {
        &self.nodes[id.0].subtaxa
    }

    /// Look a taxon up by its index name (binomial/trinomial for species and
    /// subspecies).
    pub fn lookup(&self, name: &str) -> Option<TaxonId> {
        self.index.get(name).copied()
    }

    pub fn find(&self, name: &str) -> Option<&Taxon> {
        self.lookup(name).map(|id| self.get(id))
    }

    /// Index names with their taxa, in no particular order.
    pub fn index(&self) -> impl Iterator<Item = (&str, TaxonId)> {
        self.index.iter().map(|(name, id)| (name.as_str(), *id))
    }

    /// Attach `taxon` as the last child of `parent` (or as a new root), register
    /// it in the index and count it. The parent's rank must be above the
    /// child's.
    pub fn attach(&mut self, parent: Option<TaxonId>, mut taxon: Taxon) -> Result<TaxonId> {
        let id = TaxonId(self.nodes.len());
        let siblings = match parent {
            Some(p) => {
                let parent_rank = self.get(p).rank;
                if parent_rank >= taxon.rank {
                    return Err(TaxonomyError::StructuralOrder {
                        row: 0,
                        rank: taxon.rank,
                        missing: parent_rank,
                    });
                }
                self.nodes[p.0].subtaxa.len()
            }
            None => self.roots.len(),
        };
        taxon.sort_index = Some(siblings + 1);

        self.index.insert(taxon.index_name().to_string(), id);
        self.counts.increment(taxon.rank);
        self.nodes.push(Node {
            taxon,
            subtaxa: Vec::new(),
        });
        match parent {
            Some(p) => self.nodes[p.0].subtaxa.push(id),
            None => self.roots.push(id),
        }
        Ok(id)
    }

    /// Depth-first walk in tree order, parents before children.
    pub fn walk(&self) -> Vec<TaxonId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<TaxonId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.subtaxa(id).iter().rev().copied());
        }
        order
    }

    // ========================================================================
    // OUTPUT
    // ========================================================================

    /// Nested view of the whole tree: an array of top-level taxa.
    pub fn nested(&self) -> NestedTree<'_> {
        NestedTree { taxonomy: self }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.nested())
            .map_err(|e| TaxonomyError::json(self.checklist.dir_name(), e))
    }

    /// Fixed-format statistics block consumed by downstream tooling.
    pub fn info(&self) -> String {
        let c = &self.counts;
        let mut out = String::from("Taxonomy statistics:\n");
        out.push_str(&format!("  Taxonomy: {} {}\n", self.checklist.label(), self.version));
        match self.checklist {
            Checklist::Ioc => {
                out.push_str(&format!("  Infraclasses: {}\n", c.infraclass_count));
                out.push_str(&format!("  Orders: {}\n", c.order_count));
                out.push_str(&format!("  Families: {}\n", c.family_count));
                out.push_str(&format!("  Genus: {}\n", c.genus_count));
                out.push_str(&format!("  Species: {}\n", c.species_count));
                out.push_str(&format!("  Subspecies: {}\n", c.subspecies_count));
            }
            Checklist::Sof => {
                out.push_str(&format!("  Orders: {}\n", c.order_count));
                out.push_str(&format!("  Families: {}\n", c.family_count));
                out.push_str(&format!("  Species: {}\n", c.species_count));
            }
        }
        out.push_str(&format!("  Total number of taxa: {}\n", c.total()));
        out
    }
}

// ============================================================================
// NESTED SERIALIZATION
// ============================================================================

pub struct NestedTree<'a> {
    taxonomy: &'a Taxonomy,
}

impl Serialize for NestedTree<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.taxonomy.roots.iter().map(|id| NestedTaxon {
            taxonomy: self.taxonomy,
            id: *id,
        }))
    }
}

/// A taxon with its subtree inlined under `subtaxa`.
pub struct NestedTaxon<'a> {
    taxonomy: &'a Taxonomy,
    id: TaxonId,
}

impl<'a> NestedTaxon<'a> {
    pub fn new(taxonomy: &'a Taxonomy, id: TaxonId) -> Self {
        NestedTaxon { taxonomy, id }
    }
}

#[derive(Serialize)]
struct NestedRecord<'a> {
    #[serde(flatten)]
    taxon: &'a Taxon,
    subtaxa: Vec<NestedTaxon<'a>>,
}

impl Serialize for NestedTaxon<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        NestedRecord {
            taxon: self.taxonomy.get(self.id),
            subtaxa: self
                .taxonomy
                .subtaxa(self.id)
                .iter()
                .map(|child| NestedTaxon::new(self.taxonomy, *child))
                .collect(),
        }
        .serialize(serializer)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> Taxonomy {
        let mut t = Taxonomy::new(Checklist::Ioc, "14.1");
        let ic = t.attach(None, Taxon::higher(Rank::Infraclass, "NEOAVES", None)).unwrap();
        let order = t
            .attach(Some(ic), Taxon::higher(Rank::Order, "PASSERIFORMES", Some("NEOAVES")))
            .unwrap();
        let fam = t
            .attach(Some(order), Taxon::higher(Rank::Family, "Corvidae", Some("PASSERIFORMES")))
            .unwrap();
        let genus = t.attach(Some(fam), Taxon::genus("Corvus", "Corvidae")).unwrap();
        t.attach(Some(genus), Taxon::species("Corvus", "corax")).unwrap();
        t.attach(Some(genus), Taxon::species("Corvus", "corone")).unwrap();
        t
    }

    #[test]
    fn test_counts_and_index() {
        let t = small();
        assert_eq!(t.counts().species_count, 2);
        assert_eq!(t.total(), 6);
        assert_eq!(t.len(), 6);
        assert!(t.find("Corvus corax").is_some());
        assert!(t.find("corax").is_none());
        assert_eq!(t.find("Corvus corone").unwrap().sort_index, Some(2));
    }

    #[test]
    fn test_attach_rejects_upward_link() {
        let mut t = small();
        let species = t.lookup("Corvus corax").unwrap();
        let err = t
            .attach(Some(species), Taxon::genus("Pica", "Corvidae"))
            .unwrap_err();
        assert!(matches!(err, TaxonomyError::StructuralOrder { .. }));
    }

    #[test]
    fn test_walk_is_preorder() {
        let t = small();
        let names: Vec<&str> = t.walk().iter().map(|id| t.get(*id).index_name()).collect();
        assert_eq!(
            names,
            vec!["NEOAVES", "PASSERIFORMES", "Corvidae", "Corvus", "Corvus corax", "Corvus corone"]
        );
    }

    #[test]
    fn test_nested_json() {
        let t = small();
        let json = serde_json::to_value(t.nested()).unwrap();
        let roots = json.as_array().unwrap();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0]["name"], "NEOAVES");
        let genus = &roots[0]["subtaxa"][0]["subtaxa"][0]["subtaxa"][0];
        assert_eq!(genus["name"], "Corvus");
        assert_eq!(genus["subtaxa"][1]["binomial_name"], "Corvus corone");
        assert_eq!(genus["subtaxa"][1]["subtaxa"], serde_json::json!([]));
    }

    #[test]
    fn test_info_ioc() {
        let t = small();
        let expected = "Taxonomy statistics:\n  Taxonomy: IOC 14.1\n  Infraclasses: 1\n  Orders: 1\n  Families: 1\n  Genus: 1\n  Species: 2\n  Subspecies: 0\n  Total number of taxa: 6\n";
        assert_eq!(t.info(), expected);
    }

    #[test]
    fn test_info_sof() {
        let mut t = Taxonomy::new(Checklist::Sof, "17");
        let o = t.attach(None, Taxon::higher(Rank::Order, "ANSERIFORMES", None)).unwrap();
        t.attach(Some(o), Taxon::higher(Rank::Family, "Anatidae", Some("ANSERIFORMES")))
            .unwrap();
        let expected = "Taxonomy statistics:\n  Taxonomy: SOF 17\n  Orders: 1\n  Families: 1\n  Species: 0\n  Total number of taxa: 2\n";
        assert_eq!(t.info(), expected);
    }
}

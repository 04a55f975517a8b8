// 🏗️ Taxonomy Builder - folds classified rows into a tree
// Keeps one "current path" slot per rank; a row hangs under the slot of its
// parent rank and resets every slot below its own.

use tracing::debug;

use crate::classifier::{classify_master_rows, ClassifiedRow};
use crate::error::{Result, TaxonomyError};
use crate::taxon::{Checklist, Rank, Taxon};
use crate::taxonomy::{TaxonId, Taxonomy};
use crate::workbook::Worksheet;

pub struct TaxonomyBuilder {
    taxonomy: Taxonomy,
    path: [Option<TaxonId>; 6],
}

impl TaxonomyBuilder {
    pub fn new(checklist: Checklist, version: &str) -> Self {
        TaxonomyBuilder {
            taxonomy: Taxonomy::new(checklist, version),
            path: [None; 6],
        }
    }

    /// Node currently open at `rank`, if any.
    pub fn current(&self, rank: Rank) -> Option<TaxonId> {
        self.path[rank.depth()]
    }

    fn parent_for(&self, row: usize, rank: Rank) -> Result<Option<TaxonId>> {
        let checklist = self.taxonomy.checklist();
        if !checklist.ranks().contains(&rank) {
            return Err(TaxonomyError::format(
                checklist.label(),
                format!("row {row}: rank {rank} is not used by this checklist"),
            ));
        }
        match checklist.parent_rank(rank) {
            None => Ok(None),
            Some(parent_rank) => match self.current(parent_rank) {
                Some(parent) => Ok(Some(parent)),
                None => Err(TaxonomyError::StructuralOrder {
                    row,
                    rank,
                    missing: parent_rank,
                }),
            },
        }
    }

    /// Attach a ready-made taxon under the current node of its parent rank.
    /// `supertaxon` is filled in from that parent.
    pub fn push_taxon(&mut self, row: usize, mut taxon: Taxon) -> Result<TaxonId> {
        let rank = taxon.rank;
        let parent = self.parent_for(row, rank)?;
        if let Some(p) = parent {
            taxon.supertaxon = Some(self.taxonomy.get(p).name.clone());
        }
        let id = self.taxonomy.attach(parent, taxon)?;

        self.path[rank.depth()] = Some(id);
        for slot in self.path.iter_mut().skip(rank.depth() + 1) {
            *slot = None;
        }
        Ok(id)
    }

    /// Build the taxon an IOC master row describes and attach it.
    pub fn push_row(&mut self, row: &ClassifiedRow) -> Result<TaxonId> {
        let parent = self.parent_for(row.row, row.rank)?;
        let parent_name = parent.map(|p| self.taxonomy.get(p).name.clone());
        let mut taxon = match row.rank {
            Rank::Infraclass | Rank::Order | Rank::Family => {
                Taxon::higher(row.rank, &row.name, parent_name.as_deref())
            }
            Rank::Genus => Taxon::genus(&row.name, parent_name.as_deref().unwrap_or_default()),
            Rank::Species => Taxon::species(parent_name.as_deref().unwrap_or_default(), &row.name),
            Rank::Subspecies => {
                let genus = self
                    .current(Rank::Genus)
                    .map(|g| self.taxonomy.get(g).name.clone())
                    .unwrap_or_default();
                Taxon::subspecies(&genus, parent_name.as_deref().unwrap_or_default(), &row.name)
            }
        };

        let f = &row.fields;
        taxon.authority = f.authority.clone();
        let english = if row.rank == Rank::Family {
            &f.family_english_name
        } else {
            &f.english_name
        };
        if let Some(en) = english {
            taxon.common_names.insert("en".to_string(), en.clone());
        }
        taxon.breeding_range = f.breeding_range.clone();
        taxon.breeding_subranges = f.breeding_subranges.clone();
        taxon.nonbreeding_range = f.nonbreeding_range.clone();
        taxon.code = f.code.clone();
        taxon.comment = f.comment.clone();

        self.push_taxon(row.row, taxon)
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    pub fn taxonomy_mut(&mut self) -> &mut Taxonomy {
        &mut self.taxonomy
    }

    pub fn finish(self) -> Taxonomy {
        let t = self.taxonomy;
        debug!(
            "Built {} {} taxonomy with {} taxa",
            t.checklist().label(),
            t.version(),
            t.total()
        );
        t
    }
}

/// Fold already classified IOC rows into a taxonomy.
pub fn build_from_rows<I>(rows: I, version: &str) -> Result<Taxonomy>
where
    I: IntoIterator<Item = ClassifiedRow>,
{
    let mut builder = TaxonomyBuilder::new(Checklist::Ioc, version);
    for row in rows {
        builder.push_row(&row)?;
    }
    Ok(builder.finish())
}

/// Classify and fold every row of an IOC master sheet.
pub fn build(sheet: &dyn Worksheet, version: &str, column_shift: usize) -> Result<Taxonomy> {
    build_from_rows(classify_master_rows(sheet, column_shift), version)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::RowFields;
    use crate::workbook::MemorySheet;

    fn row(n: usize, rank: Rank, name: &str) -> ClassifiedRow {
        ClassifiedRow {
            row: n,
            rank,
            name: name.to_string(),
            fields: RowFields::default(),
        }
    }

    fn raven_sheet(shift: usize) -> MemorySheet {
        MemorySheet::new("Master")
            .with(1, 2 + shift, "IOC WORLD BIRD LIST (14.1)")
            .with(5, 1, "NEOAVES")
            .with(6, 2 + shift, "PASSERIFORMES")
            .with(7, 3 + shift, "Corvidae")
            .with(7, 4 + shift, "Crows, Jays")
            .with(8, 5 + shift, "CORVUS")
            .with(9, 6 + shift, "corax")
            .with(9, 8 + shift, "Linnaeus, 1758")
            .with(9, 9 + shift, "Northern Raven")
            .with(9, 10 + shift, "NA, EU")
    }

    #[test]
    fn test_build_raven() {
        let t = build(&raven_sheet(1), "14.1", 1).unwrap();
        let c = t.counts();
        assert_eq!(
            (
                c.infraclass_count,
                c.order_count,
                c.family_count,
                c.genus_count,
                c.species_count,
                c.subspecies_count
            ),
            (1, 1, 1, 1, 1, 0)
        );
        assert_eq!(t.total(), 5);

        let raven = t.find("Corvus corax").unwrap();
        assert_eq!(raven.name, "corax");
        assert_eq!(raven.supertaxon.as_deref(), Some("Corvus"));
        assert_eq!(raven.authority.as_deref(), Some("Linnaeus, 1758"));
        assert_eq!(raven.common_names["en"], "Northern Raven");
        assert_eq!(raven.breeding_range.as_deref(), Some("NA, EU"));

        let family = t.find("Corvidae").unwrap();
        assert_eq!(family.common_names["en"], "Crows, Jays");
        assert_eq!(t.find("Corvus").unwrap().supertaxon.as_deref(), Some("Corvidae"));
    }

    #[test]
    fn test_build_unshifted_sheet() {
        let t = build(&raven_sheet(0), "8.1", 0).unwrap();
        assert_eq!(t.total(), 5);
        assert!(t.find("Corvus corax").is_some());
    }

    #[test]
    fn test_raw_names_kept_above_genus() {
        let rows = vec![
            row(5, Rank::Infraclass, "NEOAVES"),
            row(6, Rank::Order, "PASSERIFORMES "),
            row(7, Rank::Family, "Corvidae"),
            row(8, Rank::Genus, "CORVUS "),
            row(9, Rank::Species, "corax"),
        ];
        let t = build_from_rows(rows, "14.1").unwrap();
        assert!(t.find("PASSERIFORMES ").is_some());
        assert_eq!(
            t.find("Corvidae").unwrap().supertaxon.as_deref(),
            Some("PASSERIFORMES ")
        );
        // Composed names only lose their ends.
        assert_eq!(t.find("Corvus").unwrap().name, "Corvus");
        assert!(t.find("Corvus corax").is_some());
    }

    #[test]
    fn test_species_before_genus_is_structural_error() {
        let rows = vec![
            row(5, Rank::Infraclass, "NEOAVES"),
            row(6, Rank::Order, "PASSERIFORMES"),
            row(7, Rank::Family, "Corvidae"),
            row(8, Rank::Species, "corax"),
        ];
        match build_from_rows(rows, "14.1") {
            Err(TaxonomyError::StructuralOrder { row, rank, missing }) => {
                assert_eq!(row, 8);
                assert_eq!(rank, Rank::Species);
                assert_eq!(missing, Rank::Genus);
            }
            other => panic!("expected StructuralOrder, got {:?}", other.map(|t| t.total())),
        }
    }

    #[test]
    fn test_new_family_clears_genus_slot() {
        let rows = vec![
            row(5, Rank::Infraclass, "NEOAVES"),
            row(6, Rank::Order, "PASSERIFORMES"),
            row(7, Rank::Family, "Corvidae"),
            row(8, Rank::Genus, "CORVUS"),
            row(9, Rank::Family, "Laniidae"),
            row(10, Rank::Species, "excubitor"),
        ];
        assert!(matches!(
            build_from_rows(rows, "14.1"),
            Err(TaxonomyError::StructuralOrder { row: 10, .. })
        ));
    }

    #[test]
    fn test_subspecies_names() {
        let rows = vec![
            row(5, Rank::Infraclass, "NEOAVES"),
            row(6, Rank::Order, "PASSERIFORMES"),
            row(7, Rank::Family, "Corvidae"),
            row(8, Rank::Genus, "CORVUS"),
            row(9, Rank::Species, "corax †"),
            row(10, Rank::Subspecies, "varius"),
            row(11, Rank::Species, "corone"),
        ];
        let t = build_from_rows(rows, "14.1").unwrap();
        let ssp = t.find("Corvus corax varius").unwrap();
        assert_eq!(ssp.supertaxon.as_deref(), Some("corax †"));
        assert!(t.find("Corvus corax").is_some());

        // Siblings numbered in row order
        let genus = t.lookup("Corvus").unwrap();
        let species: Vec<_> = t
            .subtaxa(genus)
            .iter()
            .map(|id| t.get(*id).sort_index)
            .collect();
        assert_eq!(species, vec![Some(1), Some(2)]);
    }

    #[test]
    fn test_counts_match_tree() {
        let t = build(&raven_sheet(1), "14.1", 1).unwrap();
        assert_eq!(t.walk().len(), t.total());
        for id in t.walk() {
            for child in t.subtaxa(id) {
                assert_eq!(t.get(*child).supertaxon.as_deref(), Some(t.get(id).name.as_str()));
                assert!(t.get(*child).rank > t.get(id).rank);
            }
        }
    }

    #[test]
    fn test_sof_hierarchy_skips_genus() {
        let mut b = TaxonomyBuilder::new(Checklist::Sof, "2024");
        b.push_taxon(2, Taxon::higher(Rank::Order, "ANSERIFORMES", None)).unwrap();
        b.push_taxon(3, Taxon::higher(Rank::Family, "Anatidae", None)).unwrap();
        b.push_taxon(4, Taxon::species_from_binomial("Cygnus olor", "")).unwrap();
        let t = b.finish();
        assert_eq!(t.find("Cygnus olor").unwrap().supertaxon.as_deref(), Some("Anatidae"));
        assert!(matches!(
            TaxonomyBuilder::new(Checklist::Sof, "2024")
                .push_taxon(2, Taxon::genus("Cygnus", "Anatidae")),
            Err(TaxonomyError::Format { .. })
        ));
    }
}

// 🔀 Merge Engine - overlays auxiliary tables onto a built taxonomy
// Matching is by index name only; merges never add, remove or rename taxa.

use serde::Serialize;
use tracing::{debug, info};

use crate::detect::FileKind;
use crate::taxon::{Rank, Taxon};
use crate::taxonomy::Taxonomy;

/// A keyed table read from one auxiliary file.
pub trait Overlay {
    fn kind(&self) -> FileKind;

    fn version(&self) -> &str;

    /// Number of keyed entries in the table.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains(&self, name: &str) -> bool;

    /// Ranks this overlay may touch. `None` means every rank.
    fn ranks(&self) -> Option<&'static [Rank]> {
        None
    }

    /// Copy the entry for `name` onto `taxon`.
    fn apply(&self, name: &str, taxon: &mut Taxon);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Taxa whose name is in the overlay.
    pub matched: usize,
    /// Matched taxa actually updated (after the rank guard).
    pub updated: usize,
    /// Overlay entries that name no taxon.
    pub unmatched: usize,
}

pub fn merge(taxonomy: &mut Taxonomy, overlay: &dyn Overlay) -> MergeReport {
    let hits: Vec<_> = taxonomy
        .index()
        .filter(|(name, _)| overlay.contains(name))
        .map(|(name, id)| (name.to_string(), id))
        .collect();

    let mut report = MergeReport {
        matched: hits.len(),
        unmatched: overlay.len().saturating_sub(hits.len()),
        ..Default::default()
    };

    for (name, id) in hits {
        let taxon = taxonomy.get_mut(id);
        if let Some(ranks) = overlay.ranks() {
            if !ranks.contains(&taxon.rank) {
                continue;
            }
        }
        overlay.apply(&name, taxon);
        report.updated += 1;
    }

    info!(
        "{} {}: {} taxa updated",
        overlay.kind(),
        overlay.version(),
        report.updated
    );
    if report.unmatched > 0 {
        debug!(
            "{} {}: {} entries matched no taxon",
            overlay.kind(),
            overlay.version(),
            report.unmatched
        );
    }
    report
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxon::Checklist;
    use std::collections::HashMap;

    struct CodeOverlay {
        codes: HashMap<String, String>,
        guarded: bool,
    }

    impl Overlay for CodeOverlay {
        fn kind(&self) -> FileKind {
            FileKind::Complementary
        }
        fn version(&self) -> &str {
            "14.1"
        }
        fn len(&self) -> usize {
            self.codes.len()
        }
        fn contains(&self, name: &str) -> bool {
            self.codes.contains_key(name)
        }
        fn ranks(&self) -> Option<&'static [Rank]> {
            if self.guarded {
                Some(&[Rank::Genus, Rank::Species, Rank::Subspecies])
            } else {
                None
            }
        }
        fn apply(&self, name: &str, taxon: &mut Taxon) {
            taxon.code = self.codes.get(name).cloned();
        }
    }

    fn taxonomy() -> Taxonomy {
        let mut t = Taxonomy::new(Checklist::Ioc, "14.1");
        let ic = t.attach(None, Taxon::higher(Rank::Infraclass, "NEOAVES", None)).unwrap();
        let o = t
            .attach(Some(ic), Taxon::higher(Rank::Order, "PASSERIFORMES", Some("NEOAVES")))
            .unwrap();
        let f = t
            .attach(Some(o), Taxon::higher(Rank::Family, "Corvidae", Some("PASSERIFORMES")))
            .unwrap();
        let g = t.attach(Some(f), Taxon::genus("Corvus", "Corvidae")).unwrap();
        t.attach(Some(g), Taxon::species("Corvus", "corax")).unwrap();
        t
    }

    fn overlay(guarded: bool) -> CodeOverlay {
        let codes = [("PASSERIFORMES", "X"), ("Corvus corax", "AF"), ("Pica pica", "EU")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CodeOverlay { codes, guarded }
    }

    #[test]
    fn test_rank_guard_skips_order() {
        let mut t = taxonomy();
        let report = merge(&mut t, &overlay(true));
        assert_eq!(report.matched, 2);
        assert_eq!(report.updated, 1);
        assert_eq!(report.unmatched, 1);
        assert_eq!(t.find("PASSERIFORMES").unwrap().code, None);
        assert_eq!(t.find("Corvus corax").unwrap().code.as_deref(), Some("AF"));
    }

    #[test]
    fn test_unguarded_overlay_touches_any_rank() {
        let mut t = taxonomy();
        let report = merge(&mut t, &overlay(false));
        assert_eq!(report.updated, 2);
        assert_eq!(t.find("PASSERIFORMES").unwrap().code.as_deref(), Some("X"));
    }

    #[test]
    fn test_merge_keeps_shape() {
        let mut t = taxonomy();
        let before = t.total();
        merge(&mut t, &overlay(false));
        assert_eq!(t.total(), before);
        assert!(t.find("Pica pica").is_none());
    }
}

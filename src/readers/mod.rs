// 📖 Readers - one per checklist file kind
// The master reader builds a taxonomy; the auxiliary readers produce keyed
// overlays for the merge engine.

pub mod complementary;
pub mod master;
pub mod multilingual;
pub mod other_lists;
pub mod sof;

pub use complementary::{Complementary, ComplementaryEntry};
pub use master::read_master;
pub use multilingual::Multilingual;
pub use other_lists::{ListSource, OtherLists, OTHER_LISTS};
pub use sof::{read_sof, sof_version};

use crate::detect::{Detected, FileKind};
use crate::error::{Result, TaxonomyError};
use crate::merge::Overlay;
use crate::workbook::Workbook;

/// Factory: read the overlay an auxiliary file provides.
pub fn read_overlay(workbook: &dyn Workbook, detected: &Detected) -> Result<Box<dyn Overlay>> {
    match detected.kind {
        FileKind::OtherLists => Ok(Box::new(OtherLists::read(workbook, detected)?)),
        FileKind::Multilingual => Ok(Box::new(Multilingual::read(workbook, detected)?)),
        FileKind::Complementary => Ok(Box::new(Complementary::read(workbook, detected)?)),
        FileKind::Master => Err(TaxonomyError::format(
            workbook.source_name(),
            "a master file is not an overlay",
        )),
    }
}

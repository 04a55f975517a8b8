// IOC Master reader: the first sheet of a master workbook becomes the taxonomy.

use tracing::info;

use crate::builder;
use crate::detect::Detected;
use crate::error::{Result, TaxonomyError};
use crate::taxonomy::Taxonomy;
use crate::workbook::Workbook;

pub fn read_master(workbook: &dyn Workbook, detected: &Detected) -> Result<Taxonomy> {
    let sheet = workbook
        .sheet(0)
        .ok_or_else(|| TaxonomyError::format(workbook.source_name(), "workbook has no worksheet"))?;

    info!(
        "Reading IOC Master {} from {}",
        detected.version,
        workbook.source_name()
    );
    let taxonomy = builder::build(sheet, &detected.version, detected.column_shift())?;
    info!("{} taxa read", taxonomy.total());
    Ok(taxonomy)
}

// 🔁 Batch Pipeline - detect, order, build and merge a set of IOC files
// All files are opened and classified before anything is read, so a bad
// batch fails before any output is produced.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::detect::{sorted_files, FileKind, SourceFile};
use crate::error::{Result, TaxonomyError};
use crate::merge::{merge, MergeReport};
use crate::readers::{read_master, read_overlay};
use crate::store::load_from_dir;
use crate::taxon::Checklist;
use crate::taxonomy::Taxonomy;
use crate::workbook::{open_workbook, MemoryWorkbook, Workbook};

/// Open and classify every path, then order the batch.
pub fn open_sources(paths: &[PathBuf]) -> Result<Vec<SourceFile<MemoryWorkbook>>> {
    if let Some(missing) = paths.iter().find(|p| !p.exists()) {
        return Err(TaxonomyError::io(
            missing,
            std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        ));
    }
    let files = paths
        .iter()
        .map(|path| -> Result<SourceFile<MemoryWorkbook>> {
            let file = SourceFile::detect(open_workbook(path)?)?;
            info!("{}: {} {}", path.display(), file.kind(), file.version());
            Ok(file)
        })
        .collect::<Result<Vec<_>>>()?;
    sorted_files(files)
}

/// Result of one batch: the taxonomy and a report per merged file.
pub struct BatchOutcome {
    pub taxonomy: Taxonomy,
    pub merges: Vec<(FileKind, MergeReport)>,
}

/// Process an ordered batch. Without a master file the taxonomy stored in
/// `taxonomy_dir` is loaded and the auxiliary files are merged into it.
pub fn process_ioc_batch<W: Workbook>(
    files: Vec<SourceFile<W>>,
    taxonomy_dir: &Path,
) -> Result<BatchOutcome> {
    let mut files = files.into_iter().peekable();

    let mut taxonomy = match files.peek() {
        Some(first) if first.kind() == FileKind::Master => {
            read_master(&first.workbook, &first.detected)?
        }
        _ => {
            if !taxonomy_dir.exists() {
                return Err(TaxonomyError::MissingMasterData(taxonomy_dir.to_path_buf()));
            }
            info!("Loading existing master data from {}", taxonomy_dir.display());
            load_from_dir(taxonomy_dir, Checklist::Ioc)?
        }
    };
    if files.peek().map(|f| f.kind()) == Some(FileKind::Master) {
        files.next();
    }

    let mut merges = Vec::new();
    for file in files {
        if file.version() != taxonomy.version() {
            return Err(TaxonomyError::VersionMismatch {
                versions: vec![taxonomy.version().to_string(), file.version().to_string()],
            });
        }
        info!("Reading {} {}", file.kind(), file.workbook.source_name());
        let overlay = read_overlay(&file.workbook, &file.detected)?;
        let report = merge(&mut taxonomy, overlay.as_ref());
        merges.push((file.kind(), report));
    }

    Ok(BatchOutcome { taxonomy, merges })
}

// Bird Taxonomy - Core Library
// Reads IOC World Bird List and SOF names list workbooks into a taxonomy tree,
// merges auxiliary files onto it and stores it as per-taxon JSON files.

pub mod builder;
pub mod classifier;
pub mod config;
pub mod detect;
pub mod error;
pub mod merge;
pub mod pipeline;
pub mod readers;
pub mod store;
pub mod taxon;
pub mod taxonomy;
pub mod workbook;

// Re-export commonly used types
pub use builder::{build, TaxonomyBuilder};
pub use classifier::{classify, classify_sof, ClassifiedRow, RowFields, SofRow};
pub use config::{ReaderConfig, ServerConfig};
pub use detect::{column_shift, detect, sorted_files, Detected, FileKind, SourceFile};
pub use error::{Result, TaxonomyError};
pub use merge::{merge, MergeReport, Overlay};
pub use pipeline::{open_sources, process_ioc_batch, BatchOutcome};
pub use readers::{read_master, read_overlay, read_sof, OTHER_LISTS};
pub use store::{load_from_dir, write_to_dir};
pub use taxon::{Checklist, Rank, Taxon};
pub use taxonomy::{RankCounts, TaxonId, Taxonomy};
pub use workbook::{open_workbook, CellValue, MemorySheet, MemoryWorkbook, Workbook, Worksheet};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 💾 Tree Store - one JSON file per taxon
// Children are written before their parent and referenced by file name; the
// loader follows those references breadth-first from the root-rank files.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, TaxonomyError};
use crate::taxon::{Checklist, Rank, Taxon};
use crate::taxonomy::{TaxonId, Taxonomy};

pub const VERSION_FILE: &str = "version.json";

#[derive(Debug, Serialize, Deserialize)]
struct VersionRecord {
    version: String,
}

/// On-disk form of a taxon: its own fields plus child file names.
#[derive(Serialize)]
struct FileRecord<'a> {
    #[serde(flatten)]
    taxon: &'a Taxon,
    subtaxa: Vec<String>,
}

#[derive(Deserialize)]
struct StoredTaxon {
    #[serde(flatten)]
    taxon: Taxon,
    #[serde(default)]
    subtaxa: Vec<String>,
}

#[derive(Deserialize)]
struct RankProbe {
    rank: Rank,
    #[serde(default)]
    sort_index: Option<usize>,
}

// ============================================================================
// WRITE
// ============================================================================

/// Write `taxonomy` under `dir`, which must not exist yet. Returns the number
/// of taxon files written.
pub fn write_to_dir(taxonomy: &Taxonomy, dir: &Path) -> Result<usize> {
    if dir.exists() {
        return Err(TaxonomyError::DirectoryAlreadyExists(dir.to_path_buf()));
    }
    fs::create_dir_all(dir).map_err(|e| TaxonomyError::io(dir, e))?;

    let version = VersionRecord {
        version: taxonomy.version().to_string(),
    };
    write_json(&dir.join(VERSION_FILE), &version)?;

    let mut written = 0;
    for root in taxonomy.roots() {
        written += write_subtree(taxonomy, *root, dir)?;
    }
    info!("{} taxon files written to {}", written, dir.display());
    Ok(written)
}

fn write_subtree(taxonomy: &Taxonomy, id: TaxonId, dir: &Path) -> Result<usize> {
    let mut written = 0;
    for child in taxonomy.subtaxa(id) {
        written += write_subtree(taxonomy, *child, dir)?;
    }
    let taxon = taxonomy.get(id);
    let record = FileRecord {
        taxon,
        subtaxa: taxonomy
            .subtaxa(id)
            .iter()
            .map(|child| taxonomy.get(*child).file_name())
            .collect(),
    };
    write_json(&dir.join(taxon.file_name()), &record)?;
    Ok(written + 1)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| TaxonomyError::json(path, e))?;
    fs::write(path, json).map_err(|e| TaxonomyError::io(path, e))
}

// ============================================================================
// LOAD
// ============================================================================

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).map_err(|e| TaxonomyError::io(path, e))?;
    serde_json::from_str(&text).map_err(|e| TaxonomyError::json(path, e))
}

/// Files holding taxa of the checklist's root rank, in sibling order.
fn root_files(dir: &Path, checklist: Checklist) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| TaxonomyError::io(dir, e))?;
    let mut roots: Vec<(Option<usize>, PathBuf)> = Vec::new();

    for entry in entries {
        let path = entry.map_err(|e| TaxonomyError::io(dir, e))?.path();
        let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");
        let is_version = path.file_name().and_then(|n| n.to_str()) == Some(VERSION_FILE);
        if !is_json || is_version {
            continue;
        }
        let probe: RankProbe = read_json(&path)?;
        if probe.rank == checklist.root_rank() {
            roots.push((probe.sort_index, path));
        }
    }

    // Entries without a sort index go last.
    roots.sort_by(|(a, pa), (b, pb)| {
        let a = a.unwrap_or(usize::MAX);
        let b = b.unwrap_or(usize::MAX);
        a.cmp(&b).then_with(|| pa.cmp(pb))
    });
    Ok(roots.into_iter().map(|(_, p)| p).collect())
}

/// Rehydrate a taxonomy written by `write_to_dir`.
pub fn load_from_dir(dir: &Path, checklist: Checklist) -> Result<Taxonomy> {
    let version: VersionRecord = read_json(&dir.join(VERSION_FILE))?;
    let mut taxonomy = Taxonomy::new(checklist, &version.version);

    let mut queue: VecDeque<(Option<TaxonId>, PathBuf)> = root_files(dir, checklist)?
        .into_iter()
        .map(|path| (None, path))
        .collect();

    while let Some((parent, path)) = queue.pop_front() {
        let stored: StoredTaxon = read_json(&path)?;
        let id = taxonomy.attach(parent, stored.taxon)?;
        queue.extend(stored.subtaxa.into_iter().map(|name| (Some(id), dir.join(name))));
    }

    debug!("{} taxa loaded from {}", taxonomy.total(), dir.display());
    Ok(taxonomy)
}

// ============================================================================
// TESTS
// ============================================================================

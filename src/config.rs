// ⚙️ Configuration - reader and server settings
// The reader is configured from command-line flags; the server from the
// environment.

use std::env;
use std::path::{Path, PathBuf};

use crate::taxon::Checklist;

/// Directory generated taxonomies are written under when none is given.
pub const DEFAULT_DATA_DIR: &str = "gendata";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    pub checklist: Checklist,
    pub data_dir: PathBuf,
    pub write: bool,
    pub info: bool,
    pub verbose: bool,
    pub dry_run: bool,
}

impl ReaderConfig {
    pub fn new(checklist: Checklist) -> Self {
        ReaderConfig {
            checklist,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            write: false,
            info: false,
            verbose: false,
            dry_run: false,
        }
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_write(mut self, write: bool) -> Self {
        self.write = write;
        self
    }

    pub fn with_info(mut self, info: bool) -> Self {
        self.info = info;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// `<data dir>/ioc` or `<data dir>/sof`.
    pub fn taxonomy_dir(&self) -> PathBuf {
        self.data_dir.join(self.checklist.dir_name())
    }

    /// Whether the tree should go to files.
    pub fn writes_files(&self) -> bool {
        self.write && !self.dry_run
    }

    /// Whether the tree should go to stdout as JSON.
    pub fn prints_json(&self) -> bool {
        !self.write && !self.dry_run
    }
}

// ============================================================================
// SERVER
// ============================================================================

pub const DEFAULT_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub taxonomy_dir: PathBuf,
    pub checklist: Checklist,
    pub addr: String,
}

pub fn parse_checklist(value: &str) -> Option<Checklist> {
    match value.trim().to_ascii_lowercase().as_str() {
        "ioc" => Some(Checklist::Ioc),
        "sof" => Some(Checklist::Sof),
        _ => None,
    }
}

impl ServerConfig {
    /// Read `TAXONOMY_DIR`, `TAXONOMY_CHECKLIST` and `TAXONOMY_ADDR`.
    pub fn from_env() -> Self {
        let checklist = env::var("TAXONOMY_CHECKLIST")
            .ok()
            .and_then(|v| parse_checklist(&v))
            .unwrap_or(Checklist::Ioc);
        let taxonomy_dir = env::var("TAXONOMY_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Path::new(DEFAULT_DATA_DIR).join(checklist.dir_name()));
        let addr = env::var("TAXONOMY_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
        ServerConfig {
            taxonomy_dir,
            checklist,
            addr,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taxonomy_dir() {
        let config = ReaderConfig::new(Checklist::Sof).with_data_dir("/tmp/data");
        assert_eq!(config.taxonomy_dir(), PathBuf::from("/tmp/data/sof"));
        assert_eq!(
            ReaderConfig::new(Checklist::Ioc).taxonomy_dir(),
            PathBuf::from("gendata/ioc")
        );
    }

    #[test]
    fn test_output_modes() {
        let base = ReaderConfig::new(Checklist::Ioc);
        assert!(base.prints_json());
        assert!(base.clone().with_info(true).prints_json());
        assert!(base.clone().with_write(true).writes_files());
        assert!(!base.clone().with_write(true).with_dry_run(true).writes_files());
        assert!(!base.with_dry_run(true).prints_json());
    }

    #[test]
    fn test_parse_checklist() {
        assert_eq!(parse_checklist("IOC"), Some(Checklist::Ioc));
        assert_eq!(parse_checklist(" sof "), Some(Checklist::Sof));
        assert_eq!(parse_checklist("ebird"), None);
    }
}

// 🔎 File Kind / Version Detector
// Classifies a workbook into one of the four IOC file kinds and pulls its
// version out of the sheet titles and header cells.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TaxonomyError};
use crate::workbook::{Workbook, Worksheet};

// ============================================================================
// FILE KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileKind {
    Master,
    OtherLists,
    Multilingual,
    Complementary,
}

impl FileKind {
    /// Human-readable name for display
    pub fn name(&self) -> &'static str {
        match self {
            FileKind::Master => "IOC Master",
            FileKind::OtherLists => "IOC Other Lists",
            FileKind::Multilingual => "IOC Multilingual",
            FileKind::Complementary => "IOC Complementary",
        }
    }

    /// Fixed processing rank: master first, complementary last.
    pub fn order(&self) -> u8 {
        match self {
            FileKind::Master => 1,
            FileKind::OtherLists => 2,
            FileKind::Multilingual => 3,
            FileKind::Complementary => 4,
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detected {
    pub kind: FileKind,
    pub version: String,
}

impl Detected {
    pub fn column_shift(&self) -> usize {
        column_shift(&self.version)
    }
}

// ============================================================================
// VERSION PATTERN TABLE
// ============================================================================

/// Where a version string is read from and how it is extracted.
pub struct VersionPattern {
    pub kind: FileKind,
    /// (sheet index, row, col); `None` means the sheet title itself.
    pub cell: Option<(usize, usize, usize)>,
    pub rule: VersionRule,
}

pub enum VersionRule {
    /// First capture group of the regex.
    Capture(&'static str),
    /// Text after a fixed prefix.
    Prefix(&'static str),
    /// Exact cell text maps to a version.
    Literal(&'static str, &'static str),
    /// The text itself is the version.
    Whole,
}

/// Tried in order; the first rule of the detected kind that matches wins.
/// New checklist releases with different header phrasing extend this table.
pub const VERSION_PATTERNS: &[VersionPattern] = &[
    VersionPattern {
        kind: FileKind::Master,
        cell: Some((0, 1, 2)),
        rule: VersionRule::Capture(r"IOC WORLD BIRD LIST \((.*)\)"),
    },
    VersionPattern {
        kind: FileKind::Master,
        cell: Some((0, 1, 3)),
        rule: VersionRule::Capture(r"IOC WORLD BIRD LIST \((.*)\)"),
    },
    VersionPattern {
        kind: FileKind::Master,
        cell: Some((0, 1, 2)),
        rule: VersionRule::Capture(r"^.*\((.*)\).*$"),
    },
    VersionPattern {
        kind: FileKind::Master,
        cell: Some((0, 1, 3)),
        rule: VersionRule::Capture(r"^.*\((.*)\).*$"),
    },
    VersionPattern {
        kind: FileKind::OtherLists,
        cell: Some((0, 1, 2)),
        rule: VersionRule::Capture(r"^.*\(v (.*)\).*$"),
    },
    VersionPattern {
        kind: FileKind::Multilingual,
        cell: Some((0, 1, 4)),
        rule: VersionRule::Prefix("IOC_"),
    },
    VersionPattern {
        kind: FileKind::Multilingual,
        cell: Some((0, 1, 4)),
        rule: VersionRule::Literal("Scientific Name 8.1", "8.1"),
    },
    VersionPattern {
        kind: FileKind::Multilingual,
        cell: Some((0, 1, 1)),
        rule: VersionRule::Literal("7.3", "7.3"),
    },
    VersionPattern {
        kind: FileKind::Complementary,
        cell: None,
        rule: VersionRule::Capture(r"^IOC (\d+\.\d+)$"),
    },
    VersionPattern {
        kind: FileKind::Complementary,
        cell: None,
        rule: VersionRule::Whole,
    },
];

fn compiled(pattern: &'static str) -> Option<&'static Regex> {
    static CACHE: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    let cache = CACHE.get_or_init(|| {
        VERSION_PATTERNS
            .iter()
            .filter_map(|p| match p.rule {
                VersionRule::Capture(re) => Regex::new(re).ok().map(|r| (re, r)),
                _ => None,
            })
            .collect()
    });
    cache.iter().find(|(p, _)| *p == pattern).map(|(_, r)| r)
}

impl VersionRule {
    fn extract(&self, text: &str) -> Option<String> {
        let text = text.trim();
        let version = match self {
            VersionRule::Capture(pattern) => compiled(*pattern)?
                .captures(text)?
                .get(1)
                .map(|m| m.as_str().trim().to_string()),
            VersionRule::Prefix(prefix) => text.strip_prefix(*prefix).map(|v| v.trim().to_string()),
            VersionRule::Literal(expected, version) => {
                (text == *expected).then(|| version.to_string())
            }
            VersionRule::Whole => Some(text.to_string()),
        };
        version.filter(|v| !v.is_empty())
    }
}

fn version_for(kind: FileKind, workbook: &dyn Workbook) -> Option<String> {
    VERSION_PATTERNS
        .iter()
        .filter(|p| p.kind == kind)
        .find_map(|p| {
            let text = match p.cell {
                Some((sheet, row, col)) => workbook.sheet(sheet)?.text(row, col)?,
                None => workbook.sheet(0)?.title().to_string(),
            };
            p.rule.extract(&text)
        })
}

// ============================================================================
// COLUMN SHIFT
// ============================================================================

fn parse_version(version: &str) -> Option<(u32, u32)> {
    let (major, minor) = version.trim().split_once('.')?;
    Some((major.parse().ok()?, minor.parse().ok()?))
}

/// Schema drift: from 14.1 on the rank columns moved one step right.
pub fn column_shift(version: &str) -> usize {
    match parse_version(version) {
        Some(v) if v >= (14, 1) => 1,
        _ => 0,
    }
}

/// Header cells a complementary file must carry, by column shift.
fn complementary_header_ok(sheet: &dyn Worksheet, shift: usize) -> bool {
    let english_col = 4 + 2 * shift;
    sheet.cell(1, english_col).text_eq("English name")
        && sheet.cell(1, english_col + 1).text_eq("Counters")
}

// ============================================================================
// DETECTION
// ============================================================================

fn first_title(workbook: &dyn Workbook) -> Option<&str> {
    workbook.sheet(0).map(|s| s.title())
}

/// Detect the kind and version of `workbook`. Pure: depends only on titles and
/// header cells.
pub fn detect(workbook: &dyn Workbook) -> Result<Detected> {
    let source = workbook.source_name();
    let first = first_title(workbook)
        .ok_or_else(|| TaxonomyError::format(source, "workbook has no worksheet"))?;
    let second = workbook.sheet(1).map(|s| s.title());

    let kind = if first == "Master" {
        FileKind::Master
    } else if first.contains("vs_other_lists") {
        FileKind::OtherLists
    } else if first == "List" && second == Some("Sources") {
        FileKind::Multilingual
    } else if first.contains("IOC") {
        FileKind::Complementary
    } else {
        return Err(TaxonomyError::UnrecognizedFileKind(source.to_string()));
    };

    let version = version_for(kind, workbook).ok_or_else(|| {
        TaxonomyError::format(source, format!("cannot determine {} file version", kind))
    })?;

    if kind == FileKind::Complementary {
        let sheet = workbook
            .sheet(0)
            .ok_or_else(|| TaxonomyError::format(source, "workbook has no worksheet"))?;
        if !complementary_header_ok(sheet, column_shift(&version)) {
            return Err(TaxonomyError::format(
                source,
                "not a valid IOC Complementary file: missing 'English name'/'Counters' headers",
            ));
        }
    }

    Ok(Detected { kind, version })
}

// ============================================================================
// BATCH ORDERING
// ============================================================================

/// A detected input file, ready to be read.
#[derive(Debug)]
pub struct SourceFile<W> {
    pub workbook: W,
    pub detected: Detected,
}

impl<W: Workbook> SourceFile<W> {
    pub fn detect(workbook: W) -> Result<Self> {
        let detected = detect(&workbook)?;
        Ok(SourceFile { workbook, detected })
    }

    pub fn kind(&self) -> FileKind {
        self.detected.kind
    }

    pub fn version(&self) -> &str {
        &self.detected.version
    }
}

/// Order files master → other lists → multilingual → complementary. Rejects
/// batches with two files of one kind or with differing versions.
pub fn sorted_files<W: Workbook>(mut files: Vec<SourceFile<W>>) -> Result<Vec<SourceFile<W>>> {
    files.sort_by_key(|f| f.kind().order());

    if let Some(pair) = files.windows(2).find(|w| w[0].kind() == w[1].kind()) {
        return Err(TaxonomyError::DuplicateKind { kind: pair[0].kind() });
    }

    let mut versions: Vec<String> = files.iter().map(|f| f.version().to_string()).collect();
    versions.sort();
    versions.dedup();
    if versions.len() > 1 {
        return Err(TaxonomyError::VersionMismatch { versions });
    }

    Ok(files)
}

// ============================================================================
// TESTS
// ============================================================================

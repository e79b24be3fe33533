//! Archive discovery and numeric ordering

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Suffix identifying compressed line-delimited JSON archives
pub const ARCHIVE_SUFFIX: &str = ".json.xz";

/// One archive found in the source directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub path: PathBuf,
    /// First integer embedded in the file name, used for ordering
    pub index: Option<u64>,
}

impl ArchiveEntry {
    pub fn new(dir: &Path, name: &str) -> Self {
        Self {
            name: name.to_string(),
            path: dir.join(name),
            index: embedded_index(name),
        }
    }
}

impl Ord for ArchiveEntry {
    /// Numbered archives ascending, then unnumbered ones; ties by name
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.index, other.index) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
        .then_with(|| self.name.cmp(&other.name))
    }
}

impl PartialOrd for ArchiveEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// First run of ASCII digits in `name`, if it fits in a u64
/// (e.g. "core_2018-03-01_17.json.xz" -> 2018, "17.json.xz" -> 17)
pub fn embedded_index(name: &str) -> Option<u64> {
    let start = name.find(|c: char| c.is_ascii_digit())?;
    let digits = &name[start..];
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse().ok()
}

/// List `*.json.xz` entries of `dir`, sorted by embedded index.
///
/// Only names are inspected here; an entry that vanishes before it is
/// opened is reported later as a missing archive.
pub fn list_archives(dir: &Path) -> Result<Vec<ArchiveEntry>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read source directory {}", dir.display()))?;

    let mut archives = Vec::new();
    for entry in entries {
        let entry =
            entry.with_context(|| format!("Failed to list source directory {}", dir.display()))?;
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            log::warn!("Skipping non-UTF-8 file name: {:?}", file_name);
            continue;
        };
        if name.ends_with(ARCHIVE_SUFFIX) {
            archives.push(ArchiveEntry::new(dir, name));
        }
    }
    archives.sort();
    Ok(archives)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn embedded_index_variants() {
        assert_eq!(embedded_index("0.json.xz"), Some(0));
        assert_eq!(embedded_index("17.json.xz"), Some(17));
        assert_eq!(embedded_index("part_0042.json.xz"), Some(42));
        assert_eq!(embedded_index("core_2018-03-01_9.json.xz"), Some(2018));
        assert_eq!(embedded_index("abc.json.xz"), None);
        assert_eq!(embedded_index("99999999999999999999999.json.xz"), None);
    }

    #[test]
    fn list_sorts_numerically_not_lexically() {
        let dir = TempDir::new().unwrap();
        for name in ["10.json.xz", "2.json.xz", "1.json.xz", "100.json.xz"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        let names: Vec<String> = list_archives(dir.path())
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(
            names,
            vec!["1.json.xz", "2.json.xz", "10.json.xz", "100.json.xz"]
        );
    }

    #[test]
    fn list_ignores_other_suffixes() {
        let dir = TempDir::new().unwrap();
        for name in ["1.json.xz", "2.json", "3.json.gz", "notes.txt", "4.json.xz.tmp"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        let archives = list_archives(dir.path()).unwrap();
        assert_eq!(archives.len(), 1);
        assert_eq!(archives[0].name, "1.json.xz");
        assert_eq!(archives[0].path, dir.path().join("1.json.xz"));
        assert_eq!(archives[0].index, Some(1));
    }

    #[test]
    fn unnumbered_archives_sort_last_by_name() {
        let dir = TempDir::new().unwrap();
        for name in ["b.json.xz", "3.json.xz", "a.json.xz"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        let names: Vec<String> = list_archives(dir.path())
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, vec!["3.json.xz", "a.json.xz", "b.json.xz"]);
    }

    #[test]
    fn equal_index_tie_broken_by_name() {
        let dir = Path::new("/src");
        let mut entries = vec![
            ArchiveEntry::new(dir, "7b.json.xz"),
            ArchiveEntry::new(dir, "7a.json.xz"),
        ];
        entries.sort();
        assert_eq!(entries[0].name, "7a.json.xz");
    }

    #[test]
    fn missing_directory_is_error() {
        let dir = TempDir::new().unwrap();
        let err = list_archives(&dir.path().join("absent")).unwrap_err();
        assert!(err.to_string().contains("Failed to read source directory"));
    }
}

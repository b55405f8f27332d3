//! Repository file listing shared by the platform detectors.

use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{InitError, Result};

/// Directories never descended into.
const SKIPPED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "Pods",
    "Carthage",
    "build",
    "platforms",
];

/// Directory bundles listed as entries but not descended into.
const BUNDLE_EXTENSIONS: &[&str] = &["xcodeproj", "xcworkspace"];

/// One listed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Path relative to the scan root.
    pub relative: PathBuf,
    /// True for directory bundles.
    pub is_dir: bool,
}

impl FileEntry {
    /// Final path component.
    pub fn file_name(&self) -> &str {
        self.relative
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    /// Extension of the final component.
    pub fn extension(&self) -> Option<&str> {
        self.relative.extension().and_then(|e| e.to_str())
    }

    /// Number of components below the root.
    pub fn depth(&self) -> usize {
        self.relative.components().count()
    }

    /// Relative directory holding this entry.
    pub fn relative_dir(&self) -> &Path {
        self.relative.parent().unwrap_or_else(|| Path::new(""))
    }

    /// `./`-prefixed display path.
    pub fn display(&self) -> String {
        display_path(&self.relative)
    }

    /// `./`-prefixed display path of the containing directory.
    pub fn display_dir(&self) -> String {
        display_path(self.relative_dir())
    }
}

/// Render a root-relative path as `./a/b`, or `./` for the root itself.
pub fn display_path(relative: &Path) -> String {
    let parts: Vec<_> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        "./".to_string()
    } else {
        format!("./{}", parts.join("/"))
    }
}

/// Every file below a root, shallowest first.
#[derive(Debug, Clone, Default)]
pub struct FileList {
    root: PathBuf,
    entries: Vec<FileEntry>,
}

impl FileList {
    /// Walk `root`.
    pub fn walk(root: &Path) -> Result<Self> {
        let mut entries = Vec::new();
        let mut walker = WalkDir::new(root).sort_by_file_name().into_iter();

        while let Some(entry) = walker.next() {
            let entry = entry.map_err(|e| InitError::Walk {
                path: e.path().unwrap_or(root).to_path_buf(),
                message: e.to_string(),
            })?;

            if entry.depth() == 0 {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            let relative = entry
                .path()
                .strip_prefix(root)
                .unwrap_or(entry.path())
                .to_path_buf();

            if entry.file_type().is_dir() {
                if SKIPPED_DIRS.contains(&name.as_str()) {
                    walker.skip_current_dir();
                    continue;
                }

                let is_bundle = Path::new(&name)
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|ext| BUNDLE_EXTENSIONS.contains(&ext));
                if is_bundle {
                    entries.push(FileEntry {
                        path: entry.path().to_path_buf(),
                        relative,
                        is_dir: true,
                    });
                    walker.skip_current_dir();
                }
                continue;
            }

            entries.push(FileEntry {
                path: entry.path().to_path_buf(),
                relative,
                is_dir: false,
            });
        }

        entries.sort_by(|a, b| {
            a.depth()
                .cmp(&b.depth())
                .then_with(|| a.relative.cmp(&b.relative))
        });

        tracing::trace!(root = %root.display(), entries = entries.len(), "Listed files");

        Ok(Self {
            root: root.to_path_buf(),
            entries,
        })
    }

    /// The scanned root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All entries, shallowest first.
    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    /// Entries whose final component is `name`.
    pub fn named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FileEntry> + 'a {
        self.entries.iter().filter(move |e| e.file_name() == name)
    }

    /// Entries with extension `ext`.
    pub fn with_extension<'a>(&'a self, ext: &'a str) -> impl Iterator<Item = &'a FileEntry> + 'a {
        self.entries.iter().filter(move |e| e.extension() == Some(ext))
    }

    /// True when `relative` was listed.
    pub fn contains(&self, relative: &Path) -> bool {
        self.entries.iter().any(|e| e.relative == relative)
    }

    /// Read a listed file.
    pub fn read(&self, entry: &FileEntry) -> Result<String> {
        read_text(&entry.path)
    }
}

/// Read a file as text whatever its encoding.
///
/// UTF-16 files with a byte order mark are decoded; anything else is read
/// as UTF-8 with invalid sequences replaced. Only I/O failures are errors.
pub fn read_text(path: &Path) -> Result<String> {
    Ok(decode_text(&std::fs::read(path)?))
}

fn decode_text(bytes: &[u8]) -> String {
    let utf16 = |units: Vec<u16>| -> String {
        char::decode_utf16(units)
            .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect()
    };

    match bytes {
        [0xFF, 0xFE, rest @ ..] => utf16(
            rest.chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect(),
        ),
        [0xFE, 0xFF, rest @ ..] => utf16(
            rest.chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect(),
        ),
        [0xEF, 0xBB, 0xBF, rest @ ..] => String::from_utf8_lossy(rest).into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

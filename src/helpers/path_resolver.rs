//! Resolution of user supplied path fragments to real files and directories.
//!
//! A fragment names one path segment. It matches a directory entry either literally or,
//! failing that, as a case-insensitive substring of exactly one entry name. Precedence:
//!
//! 1. an entry whose name equals the fragment exactly wins without scanning,
//! 2. during the scan, an entry whose name equals the fragment ignoring case discards every
//!    substring candidate found so far and ends the scan,
//! 3. otherwise the substring match must be unique; several matches are an error, never a
//!    guess.
//!
//! Resolution either yields a complete path or fails as a whole.

use std::io;
use std::path::{Path, PathBuf};
use log::{debug, trace};
use thiserror::Error;
use walkdir::WalkDir;

/// Reasons a fragment sequence cannot be resolved
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The input tries to leave the music directory
    #[error("path must not contain \"..\": {0}")]
    Forbidden(String),

    /// No entry matches the fragment
    #[error("no entry matches '{0}'")]
    NotFound(String),

    /// More than one entry contains the fragment
    #[error("'{fragment}' matches {} entries", .candidates.len())]
    Ambiguous {
        fragment: String,
        candidates: Vec<String>,
    },

    /// The fragment names an existing entry that is not a directory
    #[error("'{0}' exists but is not a directory")]
    NotADirectory(String),

    /// The directory could not be listed
    #[error("failed to read directory {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Directory,
    File,
}

impl EntryKind {
    fn matches(&self, file_type: std::fs::FileType) -> bool {
        match self {
            EntryKind::Directory => file_type.is_dir(),
            EntryKind::File => file_type.is_file(),
        }
    }
}

/// Check if a string could be interpreted as a directory-up (`..`, `../` or `..\`)
pub fn contains_dir_up(value: &str) -> bool {
    value == ".." || value.contains("../") || value.contains("..\\")
}

/// Remove one leading and one trailing quote (`"` or `'`) after trimming whitespace
pub fn unquote(value: &str) -> &str {
    let value = value.trim();
    let value = value
        .strip_prefix('"')
        .or_else(|| value.strip_prefix('\''))
        .unwrap_or(value);
    value
        .strip_suffix('"')
        .or_else(|| value.strip_suffix('\''))
        .unwrap_or(value)
}

/// Split a client supplied path on `/` and `\`
pub fn split_fragments(value: &str) -> Vec<&str> {
    value.split(['/', '\\']).collect()
}

/// Resolve a sequence of directory fragments below `root`.
///
/// Empty fragments are skipped, so an empty sequence resolves to `root` itself. The input is
/// never modified; the real names of the matched directories are part of the returned path.
pub fn resolve_directory<S: AsRef<str>>(root: &Path, fragments: &[S]) -> Result<PathBuf, ResolveError> {
    if let Some(fragment) = fragments.iter().map(|f| f.as_ref()).find(|f| contains_dir_up(f)) {
        return Err(ResolveError::Forbidden(fragment.to_string()));
    }

    fragments
        .iter()
        .map(|f| f.as_ref())
        .filter(|fragment| !fragment.is_empty())
        .try_fold(root.to_path_buf(), |current, fragment| descend(&current, fragment))
}

/// Resolve a file fragment inside an already resolved directory
pub fn resolve_file(directory: &Path, fragment: &str) -> Result<PathBuf, ResolveError> {
    if contains_dir_up(fragment) {
        return Err(ResolveError::Forbidden(fragment.to_string()));
    }

    let literal = directory.join(fragment);
    if !fragment.is_empty() && literal.is_file() {
        trace!("Exact file match for '{}' in {:?}", fragment, directory);
        return Ok(literal);
    }

    let name = find_unique(directory, fragment, EntryKind::File)?;
    Ok(directory.join(name))
}

/// Resolve a song token such as `rock/queen/bohemian` to a file below `root`.
///
/// All but the last fragment name directories, the last one names the file.
pub fn resolve_track(root: &Path, token: &str) -> Result<PathBuf, ResolveError> {
    if contains_dir_up(token) {
        return Err(ResolveError::Forbidden(token.to_string()));
    }

    let mut fragments = split_fragments(token);
    while fragments.last().is_some_and(|f| f.is_empty()) {
        fragments.pop();
    }

    let (file, directories) = fragments
        .split_last()
        .ok_or_else(|| ResolveError::NotFound(token.to_string()))?;

    let directory = resolve_directory(root, directories)?;
    let path = resolve_file(&directory, file)?;
    debug!("Resolved '{}' to {:?}", token, path);
    Ok(path)
}

/// Express `path` relative to `root` with `/` separators
pub fn relative_to_root(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .filter_map(|component| match component {
            std::path::Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
        .replace('\\', "/")
}

fn descend(current: &Path, fragment: &str) -> Result<PathBuf, ResolveError> {
    let literal = current.join(fragment);
    if literal.is_dir() {
        trace!("Exact directory match for '{}' in {:?}", fragment, current);
        return Ok(literal);
    }
    if literal.exists() {
        return Err(ResolveError::NotADirectory(fragment.to_string()));
    }

    let name = find_unique(current, fragment, EntryKind::Directory)?;
    Ok(current.join(name))
}

/// Scan `directory` for the single entry of `kind` identified by `fragment`
fn find_unique(directory: &Path, fragment: &str, kind: EntryKind) -> Result<String, ResolveError> {
    let needle = fragment.to_lowercase();
    let mut candidates: Vec<String> = Vec::new();

    let walker = WalkDir::new(directory)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true);

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(ResolveError::Io {
                    path: directory.to_path_buf(),
                    source: e.into(),
                });
            }
            Err(e) => {
                debug!("Skipping unreadable entry in {:?}: {}", directory, e);
                continue;
            }
        };

        if !kind.matches(entry.file_type()) {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        let lower = name.to_lowercase();
        if lower == needle {
            candidates.clear();
            candidates.push(name);
            break;
        }
        if lower.contains(&needle) {
            candidates.push(name);
        }
    }

    match candidates.len() {
        0 => Err(ResolveError::NotFound(fragment.to_string())),
        1 => Ok(candidates.remove(0)),
        _ => {
            debug!("'{}' is ambiguous in {:?}: {:?}", fragment, directory, candidates);
            Err(ResolveError::Ambiguous {
                fragment: fragment.to_string(),
                candidates,
            })
        }
    }
}

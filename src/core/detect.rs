//! Marker-based ecosystem detection.
//!
//! Pure and filesystem-read-only: inspects a directory tree and returns the
//! full set of ecosystems present. A repository may contain several (a Python
//! tool next to a Rust crate), so the result is a set, never a best guess.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::ecosystem::{EcosystemKind, Marker};
use crate::error::{Error, Result};

// Vendor/build output directories that never hold a project of their own.
const SKIPPED_DIRS: &[&str] = &["node_modules", "target", "dist", "build", "vendor", "venv"];

/// Detect the set of ecosystems under `root`.
///
/// `max_depth` bounds recursion into subdirectories; `0` checks the root
/// only. An unreadable root is a fatal detection error, reported before any
/// provider runs.
pub fn detect(root: &Path, max_depth: usize) -> Result<BTreeSet<EcosystemKind>> {
    fs::read_dir(root)
        .map_err(|e| Error::Detection(format!("Cannot read {}: {}", root.display(), e)))?;

    let mut detected = BTreeSet::new();
    collect(root, max_depth, &mut detected);
    Ok(detected)
}

/// The marker files of `kind` that match under `root`, as paths relative
/// to the root, walking with the same depth bound and skip rules as
/// [`detect`]. Used by the `detect` CLI command to explain a detection.
pub fn matched_markers(root: &Path, kind: EcosystemKind, max_depth: usize) -> Vec<PathBuf> {
    let mut matched = Vec::new();
    collect_markers(root, root, max_depth, kind, &mut matched);
    matched
}

fn collect_markers(
    root: &Path,
    dir: &Path,
    depth_left: usize,
    kind: EcosystemKind,
    matched: &mut Vec<PathBuf>,
) {
    for marker in kind.markers() {
        if marker_matches(dir, marker) {
            let path = dir.join(marker.file);
            matched.push(path.strip_prefix(root).unwrap_or(&path).to_path_buf());
        }
    }

    if depth_left == 0 {
        return;
    }
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref()) {
            continue;
        }
        collect_markers(root, &path, depth_left - 1, kind, matched);
    }
}

fn collect(dir: &Path, depth_left: usize, detected: &mut BTreeSet<EcosystemKind>) {
    for kind in EcosystemKind::all() {
        if detected.contains(kind) {
            continue;
        }
        if kind.markers().iter().any(|m| marker_matches(dir, m)) {
            detected.insert(*kind);
        }
    }

    if depth_left == 0 {
        return;
    }

    let Ok(entries) = fs::read_dir(dir) else {
        return; // Unreadable subdirectory is not fatal; only the root is.
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref()) {
            continue;
        }
        collect(&path, depth_left - 1, detected);
    }
}

fn marker_matches(dir: &Path, marker: &Marker) -> bool {
    let path = dir.join(marker.file);
    if !path.is_file() {
        return false;
    }
    match marker.signature {
        None => true,
        Some(pattern) => {
            let Ok(content) = fs::read_to_string(&path) else {
                return false;
            };
            // Marker tables are static; an invalid pattern is a programming
            // error caught by the marker table tests.
            Regex::new(pattern)
                .map(|re| re.is_match(&content))
                .unwrap_or(false)
        }
    }
}

//! Ecosystem identification.
//!
//! Each supported ecosystem owns a static, versioned marker table. Adding an
//! ecosystem means adding a variant, its marker table, and a provider
//! implementation; the orchestrator is never touched.

use serde::{Deserialize, Serialize};

/// A single detection marker: a file name, optionally constrained by a
/// content signature (regex matched against the file's contents).
#[derive(Debug, Clone, Copy)]
pub struct Marker {
    pub file: &'static str,
    pub signature: Option<&'static str>,
}

impl Marker {
    const fn file(name: &'static str) -> Self {
        Self {
            file: name,
            signature: None,
        }
    }

    const fn with_signature(name: &'static str, pattern: &'static str) -> Self {
        Self {
            file: name,
            signature: Some(pattern),
        }
    }
}

const PYTHON_MARKERS: &[Marker] = &[
    Marker::file("pyproject.toml"),
    Marker::file("requirements.txt"),
    Marker::file("setup.py"),
    Marker::file("setup.cfg"),
    Marker::file("Pipfile"),
    Marker::file("poetry.lock"),
];

const RUST_MARKERS: &[Marker] = &[Marker::file("Cargo.toml")];

// A bare manifest.json is too common; require the manifest_version key that
// Chrome mandates.
const CHROME_MARKERS: &[Marker] =
    &[Marker::with_signature("manifest.json", r#""manifest_version""#)];

/// Supported source ecosystems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EcosystemKind {
    Python,
    Rust,
    ChromeExtension,
}

impl EcosystemKind {
    /// All kinds in the fixed enumeration order. Registry construction and
    /// every other place ordering matters iterates this, never a detection
    /// set, so multi-ecosystem runs are reproducible.
    pub fn all() -> &'static [EcosystemKind] {
        &[
            EcosystemKind::Python,
            EcosystemKind::Rust,
            EcosystemKind::ChromeExtension,
        ]
    }

    /// Ordered marker table for this kind.
    pub fn markers(&self) -> &'static [Marker] {
        match self {
            EcosystemKind::Python => PYTHON_MARKERS,
            EcosystemKind::Rust => RUST_MARKERS,
            EcosystemKind::ChromeExtension => CHROME_MARKERS,
        }
    }

    /// Key used in `shipshape.toml` under `[providers.<key>]`.
    pub fn config_key(&self) -> &'static str {
        match self {
            EcosystemKind::Python => "python",
            EcosystemKind::Rust => "rust",
            EcosystemKind::ChromeExtension => "chrome-extension",
        }
    }

    /// Uppercase tag used in commit message prefixes.
    pub fn tag(&self) -> &'static str {
        match self {
            EcosystemKind::Python => "PYTHON",
            EcosystemKind::Rust => "RUST",
            EcosystemKind::ChromeExtension => "CHROME",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            EcosystemKind::Python => "Python",
            EcosystemKind::Rust => "Rust",
            EcosystemKind::ChromeExtension => "Chrome Extension",
        }
    }
}

impl std::fmt::Display for EcosystemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enumeration_order_is_fixed() {
        assert_eq!(
            EcosystemKind::all(),
            &[
                EcosystemKind::Python,
                EcosystemKind::Rust,
                EcosystemKind::ChromeExtension,
            ]
        );
    }

    #[test]
    fn every_kind_has_markers() {
        for kind in EcosystemKind::all() {
            assert!(!kind.markers().is_empty(), "{} has no markers", kind);
        }
    }

    #[test]
    fn chrome_marker_requires_signature() {
        let markers = EcosystemKind::ChromeExtension.markers();
        assert_eq!(markers[0].file, "manifest.json");
        assert!(markers[0].signature.is_some());
    }

    #[test]
    fn config_keys_are_kebab_case() {
        assert_eq!(EcosystemKind::ChromeExtension.config_key(), "chrome-extension");
        assert_eq!(
            serde_json::to_string(&EcosystemKind::ChromeExtension).unwrap(),
            "\"chrome-extension\""
        );
    }
}

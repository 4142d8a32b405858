//! Built-in providers, one per ecosystem.

pub mod chrome;
pub mod python;
pub mod rust;

use crate::ecosystem::EcosystemKind;
use crate::provider::Provider;

/// Construct the built-in provider for a kind.
pub fn make(kind: EcosystemKind) -> Box<dyn Provider> {
    match kind {
        EcosystemKind::Python => Box::new(python::PythonProvider),
        EcosystemKind::Rust => Box::new(rust::RustProvider),
        EcosystemKind::ChromeExtension => Box::new(chrome::ChromeProvider),
    }
}

/// Shared option: any provider can be told to skip its test steps through
/// `[providers.<kind>.options] skip_tests = "true"`.
pub(crate) fn tests_disabled(options: &std::collections::BTreeMap<String, String>) -> bool {
    options
        .get("skip_tests")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false)
}

//! Install prefix layout

use crate::formula::FormulaRef;
use std::path::{Path, PathBuf};

/// Detect the Homebrew prefix on this system
pub fn detect_prefix() -> PathBuf {
    if let Ok(prefix) = std::env::var("HOMEBREW_PREFIX") {
        return PathBuf::from(prefix);
    }

    #[cfg(target_arch = "aarch64")]
    {
        PathBuf::from("/opt/homebrew")
    }
    #[cfg(not(target_arch = "aarch64"))]
    {
        PathBuf::from("/usr/local")
    }
}

/// Keg directory a formula is poured into: `{prefix}/Cellar/{name}/{version}`
pub fn keg_path(prefix: &Path, formula: &FormulaRef) -> PathBuf {
    prefix
        .join("Cellar")
        .join(&formula.name)
        .join(&formula.version)
}

use crate::formula::FormulaRef;
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Get the cache directory (~/.cache/ghbottle/ or equivalent)
pub fn cache_dir() -> PathBuf {
    if let Some(cache_home) = std::env::var_os("XDG_CACHE_HOME") {
        PathBuf::from(cache_home).join("ghbottle")
    } else if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".cache/ghbottle")
    } else {
        PathBuf::from(".cache/ghbottle")
    }
}

/// Where the bottle for `formula` lands: `{cache_root}/{name}/{bottle filename}`
pub fn bottle_cache_path(cache_root: &Path, formula: &FormulaRef, platform_tag: &str) -> PathBuf {
    cache_root
        .join(&formula.name)
        .join(formula.bottle_filename(platform_tag))
}

/// SHA256 of a cached file, hex encoded
pub fn file_sha256(path: &Path) -> std::io::Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0; 8192];

    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

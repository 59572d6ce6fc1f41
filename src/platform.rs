//! Default platform tag for bottle filenames.
//!
//! Tags follow Homebrew's `<arch>_<os>` convention, e.g. `arm64_sequoia` or
//! `x86_64_linux`. The library never calls this on its own; the tag is always
//! passed to [`GithubBottles::new`](crate::GithubBottles::new). The CLI uses it
//! when `--platform` is not given.

#[cfg(target_os = "macos")]
use anyhow::Context;
use anyhow::Result;
#[cfg(target_os = "macos")]
use std::process::Command;

/// Bottle tag of the running system.
///
/// # Errors
///
/// Fails when `sw_vers` cannot be run on macOS, or on platforms Homebrew
/// does not build bottles for.
pub fn detect_bottle_tag() -> Result<String> {
    // Homebrew says arm64, Rust says aarch64
    let arch = match std::env::consts::ARCH {
        "aarch64" => "arm64",
        other => other,
    };

    #[cfg(target_os = "macos")]
    {
        let output = Command::new("sw_vers")
            .arg("-productVersion")
            .output()
            .context("Failed to run sw_vers")?;
        let version = String::from_utf8(output.stdout).context("Invalid UTF-8 in sw_vers output")?;

        Ok(format!("{}_{}", arch, macos_name(version.trim())))
    }

    #[cfg(target_os = "linux")]
    {
        Ok(format!("{}_linux", arch))
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    {
        anyhow::bail!("No bottles are published for {}", std::env::consts::OS)
    }
}

#[cfg(any(target_os = "macos", test))]
fn macos_name(version: &str) -> &'static str {
    let major: u32 = version
        .split('.')
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);

    match major {
        16 | 26 => "tahoe",
        15 => "sequoia",
        14 => "sonoma",
        13 => "ventura",
        12 => "monterey",
        11 => "big_sur",
        _ => "sonoma",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(any(target_os = "macos", target_os = "linux"))]
    #[test]
    fn test_detect_bottle_tag() {
        let tag = detect_bottle_tag().unwrap();
        #[cfg(target_arch = "aarch64")]
        assert!(tag.starts_with("arm64_"));
        #[cfg(target_arch = "x86_64")]
        assert!(tag.starts_with("x86_64_"));
        #[cfg(target_os = "linux")]
        assert!(tag.ends_with("_linux"));
    }

    #[test]
    fn test_macos_names() {
        assert_eq!(macos_name("26.0"), "tahoe");
        assert_eq!(macos_name("15.1"), "sequoia");
        assert_eq!(macos_name("14.0"), "sonoma");
        assert_eq!(macos_name("11.7.10"), "big_sur");
        assert_eq!(macos_name("garbage"), "sonoma");
    }
}

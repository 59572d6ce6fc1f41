/// The two facts about a formula needed to name its bottle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormulaRef {
    pub name: String,
    pub version: String,
}

impl FormulaRef {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Asset filename published for this formula on `platform_tag`.
    ///
    /// `{name}-{version}.{platform_tag}.bottle.tar.gz`
    pub fn bottle_filename(&self, platform_tag: &str) -> String {
        format!(
            "{}-{}.{}.bottle.tar.gz",
            self.name, self.version, platform_tag
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bottle_filename() {
        let formula = FormulaRef::new("test-bottle", "1.0.0");
        assert_eq!(
            formula.bottle_filename("osx"),
            "test-bottle-1.0.0.osx.bottle.tar.gz"
        );
        assert_eq!(
            formula.bottle_filename("x86_64_linux"),
            "test-bottle-1.0.0.x86_64_linux.bottle.tar.gz"
        );
    }

    #[test]
    fn test_bottle_filename_keeps_revision_suffix() {
        let formula = FormulaRef::new("mosh", "1.4.0_32");
        assert_eq!(
            formula.bottle_filename("arm64_sonoma"),
            "mosh-1.4.0_32.arm64_sonoma.bottle.tar.gz"
        );
    }
}

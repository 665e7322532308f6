//! Normalization configuration.

/// Options controlling how records are flattened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeConfig {
    /// Copy input keys the shape does not declare into the flat record.
    /// Off by default: undeclared keys are dropped.
    pub keep_undeclared: bool,

    /// Maximum relation nesting below the root. None means unbounded, which
    /// relies on the input being acyclic.
    pub max_depth: Option<usize>,
}

impl NormalizeConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether undeclared keys are kept.
    pub fn keep_undeclared(mut self, keep: bool) -> Self {
        self.keep_undeclared = keep;
        self
    }

    /// Limit relation nesting depth.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NormalizeConfig::default();

        assert!(!config.keep_undeclared);
        assert!(config.max_depth.is_none());
    }

    #[test]
    fn test_builder() {
        let config = NormalizeConfig::new().keep_undeclared(true).max_depth(4);

        assert!(config.keep_undeclared);
        assert_eq!(config.max_depth, Some(4));
    }
}

//! Record of the handlers that processed a turn.

use std::fmt;

/// Ordered handler names, outermost first.
///
/// A chain is passed down by value: each level appends with [`HandlerChain::with`]
/// and hands the extended copy to the next level, so concurrent turns never
/// share one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerChain(Vec<String>);

impl HandlerChain {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Copy of this chain with `name` appended
    pub fn with(&self, name: impl Into<String>) -> Self {
        let mut names = self.0.clone();
        names.push(name.into());
        Self(names)
    }

    /// Adopt a chain returned by a nested dispatch if it extends this one.
    ///
    /// Anything else (empty, unrelated or shorter) leaves this chain as is.
    pub fn splice(self, returned: &[String]) -> Self {
        if returned.len() > self.0.len() && returned.starts_with(&self.0) {
            Self(returned.to_vec())
        } else {
            self
        }
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl From<Vec<String>> for HandlerChain {
    fn from(names: Vec<String>) -> Self {
        Self(names)
    }
}

impl fmt::Display for HandlerChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(" > "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(strs: &[&str]) -> Vec<String> {
        strs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_with_leaves_original_untouched() {
        let root = HandlerChain::new().with("azure");
        let nested = root.with("functions");
        assert_eq!(root.len(), 1);
        assert_eq!(nested.names(), names(&["azure", "functions"]).as_slice());
        assert_eq!(nested.to_string(), "azure > functions");
    }

    #[test]
    fn test_splice_adopts_extension() {
        let chain = HandlerChain::new().with("azure");
        let spliced = chain.splice(&names(&["azure", "functions", "create"]));
        assert_eq!(spliced.len(), 3);
        assert_eq!(spliced.last(), Some("create"));
    }

    #[test]
    fn test_splice_ignores_unrelated_chain() {
        let chain = HandlerChain::new().with("azure");
        assert_eq!(chain.clone().splice(&names(&["other", "x"])), chain);
        assert_eq!(chain.clone().splice(&[]), chain);
        assert_eq!(chain.clone().splice(&names(&["azure"])), chain);
    }
}

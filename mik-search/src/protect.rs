//! Mass-assignment protection for untrusted bulk input.
//!
//! A policy only filters; it never validates. Names it rejects are dropped
//! from [`ConditionTree::apply`](crate::ConditionTree::apply) without error,
//! while unknown names still fail. Raw scopes are refused by the tree's
//! `protected` flag, independently of any policy.

use std::collections::HashSet;

/// Per-entity allow-list / deny-list over canonical condition names and
/// relationship names.
///
/// | accessible | protected | passes                                   |
/// |------------|-----------|------------------------------------------|
/// | none       | none      | everything                               |
/// | set        | none      | listed names only                        |
/// | none       | set       | everything except listed names           |
/// | set        | set       | accessible names, plus unlisted remainder |
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtectionPolicy {
    accessible: Option<HashSet<String>>,
    protected: Option<HashSet<String>>,
}

impl ProtectionPolicy {
    /// A policy that passes everything.
    #[must_use]
    pub fn open() -> Self {
        Self::default()
    }

    /// Only these names pass.
    #[must_use]
    pub fn accessible<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.accessible = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// These names are dropped.
    #[must_use]
    pub fn protected<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.protected = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Whether neither list is configured.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.accessible.is_none() && self.protected.is_none()
    }

    /// Whether a canonical name passes bulk assignment.
    ///
    /// With both lists configured the allow-list wins for the names it
    /// lists and the deny-list decides the rest.
    #[must_use]
    pub fn permits(&self, name: &str) -> bool {
        match (&self.accessible, &self.protected) {
            (None, None) => true,
            (Some(accessible), None) => accessible.contains(name),
            (None, Some(protected)) => !protected.contains(name),
            (Some(accessible), Some(protected)) => {
                accessible.contains(name) || !protected.contains(name)
            },
        }
    }
}

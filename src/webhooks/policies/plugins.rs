//! Job plugin reference validation.
//!
//! Plugin names are checked against a registry built once at startup and
//! shared read-only by every request.

use std::collections::BTreeSet;

use super::ValidationContext;

/// Plugins shipped with the job controller
pub const BUILTIN_PLUGINS: [&str; 3] = ["env", "ssh", "svc"];

/// Immutable set of known job plugin names
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PluginRegistry {
    names: BTreeSet<String>,
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::from_names(BUILTIN_PLUGINS)
    }
}

impl PluginRegistry {
    /// Build a registry from plugin names. Blank names are ignored.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names
                .into_iter()
                .map(|n| n.as_ref().trim().to_string())
                .filter(|n| !n.is_empty())
                .collect(),
        }
    }

    /// Check if a plugin is known
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Known plugin names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Validate that every requested plugin is known
pub fn validate(ctx: &ValidationContext<'_>) -> Vec<String> {
    ctx.job
        .spec
        .plugins
        .keys()
        .filter(|name| !ctx.plugins.contains(name))
        .map(|name| format!("unable to find job plugin: {}", name))
        .collect()
}

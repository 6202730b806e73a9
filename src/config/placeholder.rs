//! `${name}` placeholder substitution.
//!
//! Literal strings and pointcut patterns pass through a [`PlaceholderResolver`]
//! before they are used. The default, [`PropertyPlaceholders`], looks names up
//! in the configured properties first and in the process environment second.
//! Names found in neither are left in the text as written.

use std::borrow::Cow;
use std::collections::BTreeMap;

/// Replaces placeholders in configuration text.
pub trait PlaceholderResolver: Send + Sync {
    /// Return `text` with every known placeholder replaced.
    fn substitute(&self, text: &str) -> String;
}

/// Properties, then environment variables.
#[derive(Debug, Clone, Default)]
pub struct PropertyPlaceholders {
    properties: BTreeMap<String, String>,
    use_env: bool,
}

impl PropertyPlaceholders {
    /// Resolve from `properties`, falling back to the environment.
    pub fn new<I, K, V>(properties: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            properties: properties.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            use_env: true,
        }
    }

    /// Do not consult environment variables.
    pub fn without_env(mut self) -> Self {
        self.use_env = false;
        self
    }

    /// The configured properties.
    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    fn lookup(&self, name: &str) -> Option<String> {
        if let Some(value) = self.properties.get(name) {
            return Some(value.clone());
        }
        if self.use_env {
            return std::env::var(name).ok();
        }
        None
    }
}

impl PlaceholderResolver for PropertyPlaceholders {
    fn substitute(&self, text: &str) -> String {
        if !text.contains('$') {
            return text.to_string();
        }
        match shellexpand::env_with_context_no_errors(text, |name| self.lookup(name)) {
            Cow::Borrowed(unchanged) => unchanged.to_string(),
            Cow::Owned(expanded) => expanded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_properties_are_substituted() {
        let placeholders = PropertyPlaceholders::new([("host", "example.org"), ("port", "8080")]);
        assert_eq!(placeholders.substitute("http://${host}:${port}/"), "http://example.org:8080/");
        assert_eq!(placeholders.substitute("no placeholders"), "no placeholders");
    }

    #[test]
    fn test_unknown_names_are_left_untouched() {
        let placeholders = PropertyPlaceholders::new([("a", "1")]).without_env();
        let text = "${a}-${WIREBOX_UNSET_NAME}";
        assert_eq!(placeholders.substitute(text), "1-${WIREBOX_UNSET_NAME}");
    }

    #[test]
    fn test_environment_fallback() {
        let Ok(path) = std::env::var("PATH") else {
            return;
        };
        let placeholders = PropertyPlaceholders::new(Vec::<(String, String)>::new());
        assert_eq!(placeholders.substitute("${PATH}"), path);

        let shadowed = PropertyPlaceholders::new([("PATH", "from-properties")]);
        assert_eq!(shadowed.substitute("${PATH}"), "from-properties");
    }
}

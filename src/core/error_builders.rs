//! Error builders for consistent error reporting
//!
//! Helpers that assemble [`WireError`] values with the same context everywhere
//! they are raised, so callers do not repeat suggestion lookups or signature
//! formatting.

use crate::core::error::WireError;
use strsim::levenshtein;

/// Maximum allowed Levenshtein distance as a percentage of the requested name length.
const SIMILARITY_THRESHOLD_PERCENT: usize = 50;

/// Maximum number of suggestions attached to a lookup failure.
const MAX_SUGGESTIONS: usize = 3;

/// Build a [`WireError::BuilderNotFound`] with "did you mean" suggestions.
///
/// # Arguments
///
/// * `name` - The name that was requested
/// * `known` - Every registered builder name and alias
///
/// # Example
///
/// ```rust,no_run
/// use wirebox::core::error_builders::builder_not_found;
///
/// let error = builder_not_found("greter", ["greeter", "printer"]);
/// assert_eq!(error.to_string(), "No builder named 'greter' (did you mean greeter?)");
/// ```
pub fn builder_not_found<I, S>(name: &str, known: I) -> WireError
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    WireError::BuilderNotFound {
        name: name.to_string(),
        suggestions: similar_names(name, known),
    }
}

/// Return up to three known names close to `target`, closest first.
pub fn similar_names<I, S>(target: &str, known: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let threshold = (target.len() * SIMILARITY_THRESHOLD_PERCENT / 100).max(1);
    let mut scored: Vec<(String, usize)> = known
        .into_iter()
        .map(|candidate| {
            let candidate = candidate.as_ref().to_string();
            let distance = levenshtein(target, &candidate);
            (candidate, distance)
        })
        .filter(|(candidate, distance)| *distance <= threshold && candidate != target)
        .collect();

    scored.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    scored.into_iter().take(MAX_SUGGESTIONS).map(|(candidate, _)| candidate).collect()
}

/// Wrap an invoker failure raised while constructing `builder`.
pub fn construction_failed(
    builder: &str,
    executable: impl Into<String>,
    source: anyhow::Error,
) -> WireError {
    WireError::ConstructionFailed {
        builder: builder.to_string(),
        executable: executable.into(),
        source,
    }
}

/// Join a cycle path for [`WireError::CircularDependency`] and [`WireError::AliasCycle`].
pub fn cycle_path<I, S>(path: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    path.into_iter().map(|s| s.as_ref().to_string()).collect::<Vec<_>>().join(" → ")
}

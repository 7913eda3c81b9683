//! Slug normalization and collision-free slug allocation.

use crate::error::{UndanganError, UndanganResult};

/// Substituted when the caller's base candidate normalizes to nothing.
pub const FALLBACK_SLUG: &str = "undangan";

/// Upper bound on existence probes per allocation.
pub const MAX_SLUG_PROBES: usize = 1000;

/// Normalize arbitrary text into a URL-safe identifier.
///
/// Lower-cases, turns whitespace runs into single hyphens, drops anything
/// outside `[a-z0-9-]`, collapses repeated hyphens and trims hyphens from
/// both ends. Input with no usable characters yields an empty string.
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for c in text.trim().chars().flat_map(char::to_lowercase) {
        if c.is_whitespace() || c == '-' {
            pending_hyphen = true;
        } else if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(c);
        }
    }

    out
}

/// The `attempt`-th candidate (zero based) in the probe sequence
/// `base`, `base-2`, `base-3`, ...
pub fn slug_candidate(base: &str, attempt: usize) -> String {
    if attempt == 0 {
        base.to_string()
    } else {
        format!("{base}-{}", attempt + 1)
    }
}

/// Find the first variant of `base` for which `exists` answers `false`.
///
/// `exists` decides what "taken" means (per-customer slugs, global
/// domains, ...). Storage errors from `exists` abort the search. Running
/// out of probes is [`UndanganError::SlugExhausted`].
pub async fn ensure_unique_slug<F, Fut>(base: &str, exists: F) -> UndanganResult<String>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = UndanganResult<bool>>,
{
    next_free_slug(base, 0, exists).await.map(|(_, slug)| slug)
}

/// Resume the probe sequence at position `start`, returning the position
/// and text of the first free candidate.
///
/// Callers that can lose a candidate after allocation (a concurrent commit
/// took it) continue from `position + 1`, so every retry draws on the same
/// [`MAX_SLUG_PROBES`] budget.
pub async fn next_free_slug<F, Fut>(
    base: &str,
    start: usize,
    mut exists: F,
) -> UndanganResult<(usize, String)>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = UndanganResult<bool>>,
{
    let base = if base.is_empty() { FALLBACK_SLUG } else { base };

    for attempt in start..MAX_SLUG_PROBES {
        let candidate = slug_candidate(base, attempt);
        if !exists(candidate.clone()).await? {
            return Ok((attempt, candidate));
        }
    }

    Err(UndanganError::SlugExhausted {
        base: base.to_string(),
    })
}

/// First non-empty slug among the given sources, in order.
pub fn first_slug<'a>(sources: impl IntoIterator<Item = &'a str>) -> String {
    sources
        .into_iter()
        .map(slugify)
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}

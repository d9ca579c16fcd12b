//! Input validation and normalization.
//!
//! Provides O(1) validation sets and synonym maps so callers can use
//! natural words for tiers. Three-tier resolution: exact match → synonym
//! lookup → error with suggestion. Colors and names are normalized here
//! before they reach storage.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use crate::error::{Error, Result};
use crate::model::CategoryTier;

/// Longest accepted category name, in characters.
pub const MAX_NAME_LEN: usize = 80;

// ── Valid value sets (O(1) lookups) ──────────────────────────

pub static VALID_TIERS: LazyLock<HashSet<&str>> =
    LazyLock::new(|| ["tier1", "tier2"].into_iter().collect());

// ── Synonym maps ─────────────────────────────────────────────

pub static TIER_SYNONYMS: LazyLock<HashMap<&str, &str>> = LazyLock::new(|| {
    [
        ("1", "tier1"),
        ("t1", "tier1"),
        ("main", "tier1"),
        ("top", "tier1"),
        ("parent", "tier1"),
        ("category", "tier1"),
        ("2", "tier2"),
        ("t2", "tier2"),
        ("sub", "tier2"),
        ("subcategory", "tier2"),
        ("child", "tier2"),
    ]
    .into_iter()
    .collect()
});

/// Normalize a tier string via exact match or synonym lookup.
///
/// Returns the tier, or an error with the original input and an optional
/// suggestion.
pub fn normalize_tier(input: &str) -> std::result::Result<CategoryTier, (String, Option<String>)> {
    let lower = input.trim().to_lowercase();

    // Tier 1: exact match
    if VALID_TIERS.contains(lower.as_str()) {
        return Ok(CategoryTier::from_stored(&lower));
    }

    // Tier 2: synonym lookup
    if let Some(&canonical) = TIER_SYNONYMS.get(lower.as_str()) {
        return Ok(CategoryTier::from_stored(canonical));
    }

    // Tier 3: find closest suggestion
    let suggestion = find_closest_match(&lower, &VALID_TIERS, &TIER_SYNONYMS);
    Err((input.to_string(), suggestion))
}

/// Parse a tier, mapping failure to [`Error::InvalidTier`].
///
/// # Errors
///
/// Returns `InvalidTier` if the input is neither a tier nor a synonym.
pub fn parse_tier(input: &str) -> Result<CategoryTier> {
    normalize_tier(input).map_err(|(value, suggestion)| Error::InvalidTier { value, suggestion })
}

/// Normalize a hex color to lowercase `#rrggbb`.
///
/// Accepts `#rgb` and `#rrggbb`, with or without the leading `#`.
///
/// # Errors
///
/// Returns `InvalidColor` for anything else.
pub fn normalize_color(input: &str) -> Result<String> {
    let trimmed = input.trim();
    let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);

    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::InvalidColor {
            value: input.to_string(),
        });
    }

    let hex = hex.to_ascii_lowercase();
    match hex.len() {
        6 => Ok(format!("#{hex}")),
        3 => {
            let expanded: String = hex.chars().flat_map(|c| [c, c]).collect();
            Ok(format!("#{expanded}"))
        }
        _ => Err(Error::InvalidColor {
            value: input.to_string(),
        }),
    }
}

/// Normalize an optional color, treating blank input as "no color".
///
/// # Errors
///
/// Returns `InvalidColor` for a non-blank malformed color.
pub fn normalize_optional_color(input: Option<&str>) -> Result<Option<String>> {
    match input.map(str::trim) {
        None | Some("") => Ok(None),
        Some(c) => normalize_color(c).map(Some),
    }
}

/// Trim and check a category name.
///
/// # Errors
///
/// Returns `InvalidArgument` for blank or overlong names.
pub fn normalize_name(input: &str) -> Result<String> {
    let name = input.trim();
    if name.is_empty() {
        return Err(Error::InvalidArgument("category name must not be empty".to_string()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(Error::InvalidArgument(format!(
            "category name exceeds {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

/// Find the closest matching value across valid set and synonyms.
fn find_closest_match(
    input: &str,
    valid: &HashSet<&str>,
    synonyms: &HashMap<&str, &str>,
) -> Option<String> {
    let mut best: Option<(&str, usize)> = None;

    for &v in valid.iter().chain(synonyms.keys()) {
        let dist = levenshtein_distance(input, v);
        if dist <= 3 && best.is_none_or(|(_, d)| dist < d) {
            // For synonyms, show what it maps to
            let shown = synonyms.get(v).copied().unwrap_or(v);
            best = Some((shown, dist));
        }
    }

    best.map(|(v, _)| v.to_string())
}

// ── Levenshtein distance ─────────────────────────────────────

/// Compute the Levenshtein edit distance between two strings.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let a_len = a.len();
    let b_len = b.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    // Use single-row optimization (O(min(m,n)) space)
    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for i in 1..=a_len {
        curr[0] = i;
        for j in 1..=b_len {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1) // deletion
                .min(curr[j - 1] + 1) // insertion
                .min(prev[j - 1] + cost); // substitution
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_len]
}

/// Find existing names similar to the searched one.
///
/// Returns up to `max` suggestions with edit distance ≤ 3,
/// sorted by distance then alphabetically.
pub fn find_similar(searched: &str, existing: &[&str], max: usize) -> Vec<String> {
    let searched = searched.to_lowercase();
    let mut candidates: Vec<(usize, &str)> = existing
        .iter()
        .map(|name| (levenshtein_distance(&searched, &name.to_lowercase()), *name))
        .filter(|(dist, _)| *dist <= 3)
        .collect();

    candidates.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));

    candidates
        .into_iter()
        .take(max)
        .map(|(_, name)| name.to_string())
        .collect()
}

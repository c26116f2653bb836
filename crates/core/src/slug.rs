//! URL-safe slugs derived from display names.
//!
//! A slug is lower-case ASCII alphanumerics separated by single hyphens.
//! There is no collision handling: two names that normalize to the same slug
//! share it, and lookups return the first record in list order.

/// Derive a slug from a display name.
///
/// Lower-cases the input, collapses every run of characters outside
/// `[a-z0-9]` into a single `-`, and strips leading/trailing hyphens. The
/// result is empty when the name has no ASCII alphanumerics.
///
/// ```
/// use bazaar_core::slugify;
///
/// assert_eq!(slugify("Retro Icons — Vol. 2!"), "retro-icons-vol-2");
/// assert_eq!(slugify("***"), "");
/// ```
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use regex::Regex;

    const SAMPLES: &[&str] = &[
        "Hello World",
        "  Leading and trailing  ",
        "Already-a-slug",
        "UPPER_case__mixed--Runs",
        "Ünïcödé Fonts Pack",
        "Café №5 — Brushes",
        "v2.0 (beta)",
        "---",
        "",
        "日本語",
        "a",
        "123 456",
    ];

    #[test]
    fn test_basic_names() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("  Leading and trailing  "), "leading-and-trailing");
        assert_eq!(slugify("UPPER_case__mixed--Runs"), "upper-case-mixed-runs");
        assert_eq!(slugify("v2.0 (beta)"), "v2-0-beta");
    }

    #[test]
    fn test_non_ascii_is_separator() {
        assert_eq!(slugify("Café №5 — Brushes"), "caf-5-brushes");
        assert_eq!(slugify("日本語"), "");
    }

    #[test]
    fn test_idempotent() {
        for sample in SAMPLES {
            let once = slugify(sample);
            assert_eq!(slugify(&once), once, "not idempotent for {sample:?}");
        }
    }

    #[test]
    fn test_output_shape() {
        let shape = Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").unwrap();
        for sample in SAMPLES {
            let slug = slugify(sample);
            assert!(
                slug.is_empty() || shape.is_match(&slug),
                "bad slug {slug:?} for {sample:?}"
            );
        }
    }

    #[test]
    fn test_collisions_are_not_resolved() {
        assert_eq!(slugify("Neon Pack"), slugify("neon   PACK!"));
    }
}

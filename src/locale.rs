//! Locale canonicalization and bounded search-locale selection.
//!
//! Selection is pure: identical input always yields the identical ordered
//! list, which downstream merge/dedup rely on for determinism.

/// Sentinel meaning "follow the user's preferred locale".
pub const AUTO: &str = "auto";

/// Public (display) form -> canonical form. Folds regional variants so that
/// `zh-Hans` and `zh-CN` count as the same search locale.
const CANONICAL: &[(&str, &str)] = &[
    ("zh-Hans", "zh-CN"),
    ("zh-Hant", "zh-TW"),
    ("zh", "zh-CN"),
    ("en-US", "en"),
    ("en-GB", "en"),
    ("ja-JP", "ja"),
    ("ko-KR", "ko"),
    ("pt-BR", "pt"),
    ("fr-FR", "fr"),
    ("de-DE", "de"),
    ("es-ES", "es"),
];

/// Canonical form -> preferred public form, where the two differ.
const PUBLIC: &[(&str, &str)] = &[("zh-CN", "zh-Hans"), ("zh-TW", "zh-Hant")];

/// Locales tried, in order, when the display locale leaves breadth unused.
const PRIORITY: &[&str] = &["en", "zh-CN", "ja", "es", "fr", "de", "ru", "ko", "pt"];

pub fn normalize(locale: &str) -> String {
    for (public, canonical) in CANONICAL {
        if locale.eq_ignore_ascii_case(public) {
            return (*canonical).to_string();
        }
    }
    locale.to_string()
}

pub fn to_public(canonical: &str) -> String {
    for (canon, public) in PUBLIC {
        if canonical.eq_ignore_ascii_case(canon) {
            return (*public).to_string();
        }
    }
    canonical.to_string()
}

/// Computes the ordered set of locales a run fans out across.
///
/// Starts with `en`, adds the normalized display locale when different, then
/// fills remaining slots from the static priority list. Results are mapped
/// back to their public display form. Returns at most `breadth` locales.
pub fn select_search_locales(display_locale: &str, breadth: usize) -> Vec<String> {
    let mut selected: Vec<String> = Vec::with_capacity(breadth);
    if breadth == 0 {
        return Vec::new();
    }
    selected.push("en".to_string());
    if display_locale != AUTO {
        let display = normalize(display_locale);
        if selected.len() < breadth && !selected.contains(&display) {
            selected.push(display);
        }
    }
    for candidate in PRIORITY {
        if selected.len() >= breadth {
            break;
        }
        let normalized = normalize(candidate);
        if !selected.contains(&normalized) {
            selected.push(normalized);
        }
    }
    selected.into_iter().map(|l| to_public(&l)).collect()
}

/// Normalizes a caller-supplied locale list: folds variants, drops duplicates
/// on normalized form, and maps back to public display forms.
pub fn sanitize_list(locales: &[String]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    let mut out = Vec::new();
    for locale in locales {
        let normalized = normalize(locale);
        if !seen.contains(&normalized) {
            out.push(to_public(&normalized));
            seen.push(normalized);
        }
    }
    out
}

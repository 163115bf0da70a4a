use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Folds a card name into its comparison form.
///
/// Lower-cases, decomposes, drops combining marks and recomposes, so
/// "Courtesan Thaïs" and "courtesan thais" compare equal. Surrounding
/// whitespace is trimmed. The result is only meant for equality checks,
/// never for display.
pub fn normalize_name(name: &str) -> String {
    // Lower-case before stripping: some lowercase mappings emit combining marks
    name.trim()
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .nfc()
        .collect()
}

/// Returns true if both names fold to the same comparison form
pub fn names_match(a: &str, b: &str) -> bool {
    normalize_name(a) == normalize_name(b)
}

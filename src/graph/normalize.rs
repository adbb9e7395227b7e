//! Entity name forms: storage form, comparison key and display form.
//!
//! The dataset stores names underscore-joined ("Ada_Lovelace"). Users type
//! them with spaces and in any case, sometimes without diacritics, so every
//! lookup goes through [`entity_key`].

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Convert user input into the storage form: trimmed, words joined with `_`.
pub fn denormalize(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Convert a stored name into the form shown to users.
pub fn display_name(stored: &str) -> String {
    stored.replace('_', " ")
}

/// Canonical comparison key. Empty when the name is blank.
pub fn entity_key(name: &str) -> String {
    let folded: String = name
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect();

    folded
        .split(|c: char| c.is_whitespace() || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denormalize_joins_words() {
        assert_eq!(denormalize("  Ada   Lovelace "), "Ada_Lovelace");
        assert_eq!(denormalize("Ada"), "Ada");
        assert_eq!(denormalize("   "), "");
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("Charles_Babbage"), "Charles Babbage");
    }

    #[test]
    fn test_key_folds_case_and_separators() {
        assert_eq!(entity_key("Ada_Lovelace"), "ada_lovelace");
        assert_eq!(entity_key(" ada  lovelace"), "ada_lovelace");
        assert_eq!(entity_key("ADA__LOVELACE_"), "ada_lovelace");
    }

    #[test]
    fn test_key_strips_diacritics() {
        assert_eq!(entity_key("Erdős_Pál"), "erdos_pal");
        assert_eq!(entity_key("Nikola_Tesla"), entity_key("nikola tesla"));
        assert_eq!(entity_key("Ćiro"), entity_key("Ciro"));
    }

    #[test]
    fn test_key_blank() {
        assert!(entity_key("").is_empty());
        assert!(entity_key(" _ ").is_empty());
    }
}

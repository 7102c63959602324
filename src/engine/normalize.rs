use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Canonical form used for both registry keys and checklist tips:
/// NFKD with combining marks dropped, lower-cased, whitespace collapsed.
/// Composed and decomposed spellings of a tip normalize identically.
pub fn normalize_key(input: &str) -> String {
    let mut folded = String::with_capacity(input.len());
    for c in input.nfkd().filter(|c| !is_combining_mark(*c)) {
        for lower in c.to_lowercase() {
            match fold_letter(lower) {
                Some(replacement) => folded.push_str(replacement),
                None => folded.push(lower),
            }
        }
    }
    folded.split_whitespace().collect::<Vec<&str>>().join(" ")
}

/// True when `key` occurs in `text` aligned on word boundaries.
/// Both arguments must already be normalized.
pub fn contains_on_word_boundary(text: &str, key: &str) -> bool {
    if key.is_empty() {
        return false;
    }

    text.match_indices(key).any(|(start, matched)| {
        let end = start + matched.len();
        let before_ok = text[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric());
        let after_ok = text[end..]
            .chars()
            .next()
            .is_none_or(|c| !c.is_alphanumeric());
        before_ok && after_ok
    })
}

/// Letters that have no decomposition under NFKD.
fn fold_letter(c: char) -> Option<&'static str> {
    match c {
        'ß' => Some("ss"),
        'æ' => Some("ae"),
        'œ' => Some("oe"),
        'ø' => Some("o"),
        'ł' => Some("l"),
        'đ' => Some("d"),
        'ı' => Some("i"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{contains_on_word_boundary, normalize_key};

    #[test]
    fn normalize_key_folds_case_accents_and_whitespace() {
        assert_eq!(normalize_key("  Logische   URL "), "logische url");
        assert_eq!(normalize_key("Inhoud bóven de\tvouw"), "inhoud boven de vouw");
        assert_eq!(normalize_key("Ëénduidige CTA"), "eenduidige cta");
        assert_eq!(normalize_key(""), "");
    }

    #[test]
    fn normalize_key_treats_composed_and_decomposed_text_alike() {
        assert_eq!(normalize_key("Favic\u{f3}n"), normalize_key("Favico\u{301}n"));
        assert_eq!(normalize_key("Favico\u{301}n"), "favicon");
        assert_eq!(normalize_key("Stra\u{df}e \u{153}uvre \u{133}s"), "strasse oeuvre ijs");
        assert_eq!(normalize_key("caf\u{e9}\u{a0}bar"), "cafe bar");
    }

    #[test]
    fn containment_requires_word_boundaries() {
        assert!(contains_on_word_boundary("controleer de favicon", "favicon"));
        assert!(contains_on_word_boundary("favicon", "favicon"));
        assert!(contains_on_word_boundary("alt-tekst bij beelden", "alt-tekst"));
        assert!(!contains_on_word_boundary("favicons", "favicon"));
        assert!(!contains_on_word_boundary("sssl", "ssl"));
        assert!(!contains_on_word_boundary("anything", ""));
    }
}

use std::borrow::Cow;

use unicode_normalization::UnicodeNormalization;

/// Key under which a token is stored
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenKey<'a> {
    pub key: Cow<'a, str>,
    /// True when the token was not valid UTF-8 and went through ASCII folding
    pub folded: bool,
}

/// Resolve the storage key of a raw token.
///
/// Valid UTF-8 is used as-is. Anything else is decoded lossily, NFKD
/// normalized, and stripped of every non-ASCII character, so the same bytes
/// always map to the same key.
pub fn normalize_token(raw: &[u8]) -> TokenKey<'_> {
    match std::str::from_utf8(raw) {
        Ok(text) => TokenKey {
            key: Cow::Borrowed(text),
            folded: false,
        },
        Err(_) => TokenKey {
            key: Cow::Owned(fold_to_ascii(&String::from_utf8_lossy(raw))),
            folded: true,
        },
    }
}

/// NFKD decomposition followed by dropping non-ASCII characters
pub fn fold_to_ascii(text: &str) -> String {
    text.nfkd().filter(char::is_ascii).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_utf8_is_kept() {
        let token = normalize_token("café".as_bytes());
        assert_eq!(token.key, "café");
        assert!(!token.folded);
    }

    #[test]
    fn test_fold_strips_diacritics() {
        assert_eq!(fold_to_ascii("Crédit Andòrra"), "Credit Andorra");
        assert_eq!(fold_to_ascii("ﬁle"), "file");
    }

    #[test]
    fn test_invalid_utf8_is_folded_deterministically() {
        // "caf" followed by a latin-1 encoded "é"
        let raw = b"caf\xe9 cr\xc3\xa8me";
        let first = normalize_token(raw);
        let second = normalize_token(raw);
        assert!(first.folded);
        assert_eq!(first.key, "caf creme");
        assert_eq!(first, second);
    }
}

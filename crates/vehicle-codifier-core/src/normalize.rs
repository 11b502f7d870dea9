//! Text normalizer (C1).
//!
//! Deterministic, idempotent, locale-independent text cleaning: lowercasing,
//! diacritic folding, VIN stripping, and duplicate-word collapse.

use once_cell::sync::Lazy;
use regex::Regex;

/// VIN pattern: 17 characters drawn from the VIN alphabet (no I, O, Q),
/// bounded by word boundaries.
static VIN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-HJ-NPR-Z0-9]{17}\b").expect("static VIN pattern is valid"));

/// Normalize a free-text vehicle description. Never panics.
pub fn normalize(s: &str) -> String {
    let folded = fold_diacritics(s);
    let stripped = VIN_PATTERN.replace_all(&folded, "").to_string();
    let lowered = stripped.to_lowercase();
    let collapsed_whitespace = collapse_whitespace(&lowered);
    collapse_duplicate_words(collapsed_whitespace.trim())
}

/// Fold common Latin diacritics to their ASCII base letter.
fn fold_diacritics(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'á' | 'à' | 'ä' | 'â' | 'Á' | 'À' | 'Ä' | 'Â' => 'a',
            'é' | 'è' | 'ë' | 'ê' | 'É' | 'È' | 'Ë' | 'Ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' | 'Í' | 'Ì' | 'Ï' | 'Î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' | 'Ó' | 'Ò' | 'Ö' | 'Ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' | 'Ú' | 'Ù' | 'Ü' | 'Û' => 'u',
            'ñ' | 'Ñ' => 'n',
            other => other,
        })
        .collect()
}

fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_was_space = false;
    for c in s.chars() {
        if c.is_whitespace() {
            if !prev_was_space {
                out.push(' ');
            }
            prev_was_space = true;
        } else {
            out.push(c);
            prev_was_space = false;
        }
    }
    out
}

/// Collapse immediately-repeated words: `"tanque tanque" -> "tanque"`.
fn collapse_duplicate_words(s: &str) -> String {
    let mut words: Vec<&str> = Vec::new();
    for word in s.split(' ') {
        if words.last().copied() != Some(word) {
            words.push(word);
        }
    }
    words.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_trims() {
        assert_eq!(normalize("  TOYOTA Yaris  "), "toyota yaris");
    }

    #[test]
    fn folds_diacritics() {
        assert_eq!(normalize("camión"), "camion");
    }

    #[test]
    fn collapses_internal_whitespace() {
        assert_eq!(normalize("tanque    de   agua"), "tanque de agua");
    }

    #[test]
    fn strips_vin() {
        let s = normalize("INTERNATIONAL TRACTO CAMION 4X2 DIESEL VIN 3HSDZAPT7NN354987");
        assert!(!s.contains("3hsdzapt7nn354987"));
        assert!(s.contains("tracto camion"));
    }

    #[test]
    fn collapses_duplicate_words() {
        assert_eq!(normalize("tanque tanque"), "tanque");
    }

    #[test]
    fn is_idempotent() {
        let inputs = [
            "  TOYOTA Yaris  ",
            "camión camión",
            "INTERNATIONAL TRACTO CAMION VIN 3HSDZAPT7NN354987",
            "",
        ];
        for input in inputs {
            let once = normalize(input);
            let twice = normalize(&once);
            assert_eq!(once, twice, "normalize not idempotent for {input:?}");
        }
    }

    #[test]
    fn never_panics_on_empty_or_symbols() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("!!!###"), "!!!###");
    }
}

//! Fuzzy text similarity ratios used by Stage B of the field-match procedure.
//!
//! Both ratios are built on `strsim`'s normalized Levenshtein similarity
//! (∈ [0, 1]), the same metric rapidfuzz's `ratio` uses internally.

/// Best Levenshtein similarity between `needle` and any substring of
/// `haystack` the same length as `needle` — the shorter string is always
/// treated as the needle. Mirrors rapidfuzz's `partial_ratio` for the
/// common case where one string is much longer than the other.
pub fn partial_ratio(a: &str, b: &str) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let (shorter, longer): (&str, &str) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };
    let shorter_len = shorter.chars().count();
    let longer_chars: Vec<char> = longer.chars().collect();

    if longer_chars.len() <= shorter_len {
        return strsim::normalized_levenshtein(shorter, longer) as f32;
    }

    let mut best = 0.0f32;
    for start in 0..=(longer_chars.len() - shorter_len) {
        let window: String = longer_chars[start..start + shorter_len].iter().collect();
        let score = strsim::normalized_levenshtein(shorter, &window) as f32;
        if score > best {
            best = score;
        }
    }
    best
}

/// Levenshtein similarity after sorting each string's whitespace-delimited
/// tokens alphabetically, so word order doesn't affect the score.
pub fn token_sort_ratio(a: &str, b: &str) -> f32 {
    strsim::normalized_levenshtein(&sort_tokens(a), &sort_tokens(b)) as f32
}

/// Plain normalized Levenshtein similarity, used by the C6 fuzzy-recovery
/// step to map an LLM-returned value back to the nearest catalog candidate.
pub fn ratio(a: &str, b: &str) -> f32 {
    strsim::normalized_levenshtein(a, b) as f32
}

fn sort_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

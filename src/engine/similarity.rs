use std::collections::HashSet;

use icu_normalizer::ComposingNormalizerBorrowed;

/// NFC-normalized, lowercased whitespace tokens with duplicates collapsed.
pub fn tokenize(text: &str) -> HashSet<String> {
    let normalized = ComposingNormalizerBorrowed::new_nfc().normalize(text);
    normalized
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Jaccard similarity of the two token sets, in `[0, 1]`.
/// Two texts with no tokens at all score 0.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = tokenize(a);
    let b = tokenize(b);
    let union = a.union(&b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(&b).count() as f64 / union as f64
}

use std::sync::LazyLock;

use rand::Rng;
use rand::seq::SliceRandom;
use regex::{Captures, Regex};

/// Word swaps that turn an ability into a plausible wrong one.
/// Each pair appears in both directions.
const SWAPS: &[(&str, &str)] = &[
    (r"(?i)each night", "each day"),
    (r"(?i)each day", "each night"),
    (r"(?i)\byou\b", "a player"),
    (r"(?i)\ba player\b", "you"),
    (r"(?i)\bmay\b", "must"),
    (r"(?i)\bmust\b", "may"),
    (r"(?i)\balive\b", "dead"),
    (r"(?i)\bdead\b", "alive"),
    (r"(?i)\bgood\b", "evil"),
    (r"(?i)\bevil\b", "good"),
];

static COMPILED: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    SWAPS
        .iter()
        .filter_map(|(pattern, replacement)| {
            Regex::new(pattern).ok().map(|re| (re, *replacement))
        })
        .collect()
});

pub fn mutation_count() -> usize {
    COMPILED.len()
}

/// `replacement` with the first letter capitalized when `matched` starts with
/// a capital, so a swap at the start of a sentence stays a sentence start.
fn match_case(matched: &str, replacement: &str) -> String {
    let starts_upper = matched.chars().next().is_some_and(char::is_uppercase);
    let mut chars = replacement.chars();
    match chars.next() {
        Some(first) if starts_upper => first.to_uppercase().chain(chars).collect(),
        _ => replacement.to_string(),
    }
}

/// Applies swap `index`. Returns `None` when the swap does not change the text.
pub fn apply_mutation(ability: &str, index: usize) -> Option<String> {
    let (re, replacement) = COMPILED.get(index)?;
    let mutated = re.replace_all(ability, |caps: &Captures| match_case(&caps[0], replacement));
    if mutated == ability {
        None
    } else {
        Some(mutated.into_owned())
    }
}

/// One randomly chosen swap. Falls back to the unchanged text when the chosen
/// swap has nothing to replace.
pub fn mutate_ability<R: Rng + ?Sized>(ability: &str, rng: &mut R) -> String {
    let index = rng.gen_range(0..mutation_count().max(1));
    apply_mutation(ability, index).unwrap_or_else(|| ability.to_string())
}

/// Every distinct mutation of `ability`, in random swap order. Swaps that
/// leave the text unchanged are skipped, so the result may be empty.
pub fn distinct_mutations<R: Rng + ?Sized>(ability: &str, rng: &mut R) -> Vec<String> {
    let mut order: Vec<usize> = (0..mutation_count()).collect();
    order.shuffle(rng);

    let mut out: Vec<String> = Vec::new();
    for index in order {
        if let Some(mutated) = apply_mutation(ability, index) {
            if !out.contains(&mutated) {
                out.push(mutated);
            }
        }
    }
    out
}

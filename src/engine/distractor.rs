use crate::catalog::Character;
use crate::engine::similarity::similarity;

/// Up to `count` candidates ranked by ability similarity to `target`, most
/// similar first. The target itself (by name) is never returned. Equal scores
/// keep their input order.
pub fn find_similar<'a, I>(target: &Character, candidates: I, count: usize) -> Vec<&'a Character>
where
    I: IntoIterator<Item = &'a Character>,
{
    let mut scored: Vec<(f64, &Character)> = candidates
        .into_iter()
        .filter(|c| c.name != target.name)
        .map(|c| (similarity(&target.ability, &c.ability), c))
        .collect();
    // sort_by is stable, which keeps ties in input order
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.into_iter().take(count).map(|(_, c)| c).collect()
}

use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::catalog::Character;
use crate::engine::distractor::find_similar;
use crate::engine::mutate;
use crate::engine::sanitize;

pub const OPTION_COUNT: usize = 4;

const PRIMARY_DISTRACTORS: usize = 3;
const WIDENED_DISTRACTORS: usize = 10;
const RANDOM_SAMPLE: usize = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    AbilityFromName,
    NameFromAbility,
}

impl QuestionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionKind::AbilityFromName => "ability-from-name",
            QuestionKind::NameFromAbility => "name-from-ability",
        }
    }
}

/// How the kind of each question is picked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum KindPolicy {
    #[default]
    Random,
    AbilityFromName,
    NameFromAbility,
}

impl KindPolicy {
    pub const ALL: [KindPolicy; 3] = [
        KindPolicy::Random,
        KindPolicy::AbilityFromName,
        KindPolicy::NameFromAbility,
    ];

    pub fn choose<R: Rng + ?Sized>(self, rng: &mut R) -> QuestionKind {
        match self {
            KindPolicy::Random => {
                if rng.gen_bool(0.5) {
                    QuestionKind::AbilityFromName
                } else {
                    QuestionKind::NameFromAbility
                }
            }
            KindPolicy::AbilityFromName => QuestionKind::AbilityFromName,
            KindPolicy::NameFromAbility => QuestionKind::NameFromAbility,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            KindPolicy::Random => "Mixed",
            KindPolicy::AbilityFromName => "Name -> ability",
            KindPolicy::NameFromAbility => "Ability -> name",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Question {
    /// For name-from-ability questions the ability has the name hidden.
    pub character: Character,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub kind: QuestionKind,
}

impl Question {
    pub fn is_correct(&self, answer: &str) -> bool {
        answer == self.correct_answer
    }

    pub fn correct_index(&self) -> Option<usize> {
        self.options.iter().position(|o| *o == self.correct_answer)
    }

    /// The text the player is asked about.
    pub fn prompt(&self) -> &str {
        match self.kind {
            QuestionKind::AbilityFromName => &self.character.name,
            QuestionKind::NameFromAbility => &self.character.ability,
        }
    }
}

/// Ordered, duplicate-free option list capped at [`OPTION_COUNT`].
struct OptionSet {
    options: Vec<String>,
    seen: HashSet<String>,
}

impl OptionSet {
    fn new(correct: &str) -> Self {
        Self {
            options: vec![correct.to_string()],
            seen: HashSet::from([correct.to_string()]),
        }
    }

    fn push(&mut self, option: String) -> bool {
        if self.is_full() || !self.seen.insert(option.clone()) {
            return false;
        }
        self.options.push(option);
        true
    }

    fn contains(&self, option: &str) -> bool {
        self.seen.contains(option)
    }

    fn is_full(&self) -> bool {
        self.options.len() >= OPTION_COUNT
    }

    fn into_shuffled<R: Rng + ?Sized>(mut self, rng: &mut R) -> Vec<String> {
        self.options.shuffle(rng);
        self.options
    }
}

fn same_category<'a>(target: &Character, pool: &'a [Character]) -> Vec<&'a Character> {
    pool.iter()
        .filter(|c| c.category == target.category && c.name != target.name)
        .collect()
}

fn merged_pool(pool: &[Character], broader: &[Character]) -> Vec<Character> {
    let mut seen: HashSet<&str> = pool.iter().map(|c| c.name.as_str()).collect();
    let mut merged = pool.to_vec();
    for c in broader {
        if seen.insert(c.name.as_str()) {
            merged.push(c.clone());
        }
    }
    merged
}

/// Builds one question about `target`.
///
/// Wrong answers come from `pool` and are restricted to the target's category.
/// Ability-from-name questions also draw on `broader` when `pool` holds fewer
/// than three other characters of the same category. `pool` entries keep
/// precedence over same-named `broader` entries.
pub fn generate_question<R: Rng + ?Sized>(
    target: &Character,
    pool: &[Character],
    broader: Option<&[Character]>,
    policy: KindPolicy,
    rng: &mut R,
) -> Question {
    match policy.choose(rng) {
        QuestionKind::AbilityFromName => {
            match broader {
                Some(b) if same_category(target, pool).len() < PRIMARY_DISTRACTORS => {
                    ability_from_name(target, &merged_pool(pool, b), rng)
                }
                _ => ability_from_name(target, pool, rng),
            }
        }
        QuestionKind::NameFromAbility => name_from_ability(target, pool, rng),
    }
}

/// "What is this character's ability?"
///
/// Fallback order when similar characters run out: mutations of the target's
/// own ability, the ten most similar characters, then a random sample of the
/// category. Every stage is a single bounded pass.
pub fn ability_from_name<R: Rng + ?Sized>(
    target: &Character,
    pool: &[Character],
    rng: &mut R,
) -> Question {
    let candidates = same_category(target, pool);
    let mut options = OptionSet::new(&target.ability);

    for c in find_similar(target, candidates.iter().copied(), PRIMARY_DISTRACTORS) {
        options.push(sanitize::attribute_to(c, &target.name));
    }

    if !options.is_full() {
        for mutated in mutate::distinct_mutations(&target.ability, rng) {
            if options.is_full() {
                break;
            }
            options.push(mutated);
        }
    }

    if !options.is_full() {
        for c in find_similar(target, candidates.iter().copied(), WIDENED_DISTRACTORS) {
            if options.is_full() {
                break;
            }
            options.push(sanitize::attribute_to(c, &target.name));
        }
    }

    if !options.is_full() {
        let mut sample = candidates.clone();
        sample.shuffle(rng);
        for c in sample.into_iter().take(RANDOM_SAMPLE) {
            if options.is_full() {
                break;
            }
            options.push(sanitize::attribute_to(c, &target.name));
        }
    }

    if !options.is_full() {
        log::debug!(
            "only {} options for {} ({} same-category candidates)",
            options.options.len(),
            target.name,
            candidates.len()
        );
    }

    Question {
        character: target.clone(),
        options: options.into_shuffled(rng),
        correct_answer: target.ability.clone(),
        kind: QuestionKind::AbilityFromName,
    }
}

/// "Which character has this ability?"
pub fn name_from_ability<R: Rng + ?Sized>(
    target: &Character,
    pool: &[Character],
    rng: &mut R,
) -> Question {
    let candidates = same_category(target, pool);
    let mut options = OptionSet::new(&target.name);

    for c in find_similar(target, candidates.iter().copied(), PRIMARY_DISTRACTORS) {
        options.push(c.name.clone());
    }

    if !options.is_full() {
        let mut remaining: Vec<&Character> = candidates
            .iter()
            .copied()
            .filter(|c| !options.contains(&c.name))
            .collect();
        remaining.shuffle(rng);
        for c in remaining {
            if options.is_full() {
                break;
            }
            options.push(c.name.clone());
        }
    }

    let mut character = target.clone();
    character.ability = sanitize::hide_own_name(target);

    Question {
        character,
        options: options.into_shuffled(rng),
        correct_answer: target.name.clone(),
        kind: QuestionKind::NameFromAbility,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ALL, Category, CategoryFilter, bundled};
    use crate::engine::sanitize::PLACEHOLDER;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn ch(name: &str, ability: &str, category: Category) -> Character {
        Character::new(name, ability, category, "Test")
    }

    fn assert_valid(q: &Question) {
        assert!(!q.options.is_empty());
        assert!(q.options.len() <= OPTION_COUNT);
        let hits = q.options.iter().filter(|o| **o == q.correct_answer).count();
        assert_eq!(hits, 1, "correct answer must appear once: {q:?}");
        let unique: HashSet<&String> = q.options.iter().collect();
        assert_eq!(unique.len(), q.options.len(), "duplicate options: {q:?}");
    }

    #[test]
    fn every_bundled_character_yields_valid_questions() {
        let catalog = bundled::bundled_catalog().unwrap();
        let filter = CategoryFilter {
            include_travellers: true,
            include_fabled: true,
            include_unreleased: true,
        };
        let pool = catalog.characters_for_script(ALL, filter);
        for seed in 0..3 {
            let mut rng = SmallRng::seed_from_u64(seed);
            for target in &pool {
                let a = ability_from_name(target, &pool, &mut rng);
                assert_valid(&a);
                assert_eq!(a.options.len(), OPTION_COUNT);
                let n = name_from_ability(target, &pool, &mut rng);
                assert_valid(&n);
                assert_eq!(n.options.len(), OPTION_COUNT);
            }
        }
    }

    #[test]
    fn two_similar_characters_scenario() {
        let pool = vec![
            ch("A", "Ability A", Category::Townsfolk),
            ch("B", "Ability A variant", Category::Townsfolk),
        ];
        let mut rng = SmallRng::seed_from_u64(1);
        let q = ability_from_name(&pool[0], &pool, &mut rng);
        assert_valid(&q);
        assert_eq!(q.kind, QuestionKind::AbilityFromName);
        assert!(q.options.contains(&"Ability A variant".to_string()));
        assert_eq!(q.options.iter().filter(|o| *o == "Ability A").count(), 1);
    }

    #[test]
    fn distractor_names_are_rewritten_to_target() {
        let pool = vec![
            ch("Imp", "Each night*, choose a player: they die.", Category::Demon),
            ch(
                "Fang Gu",
                "Each night*, choose a player: they die. The 1st Outsider this kills becomes an evil Fang Gu.",
                Category::Demon,
            ),
        ];
        let mut rng = SmallRng::seed_from_u64(2);
        let q = ability_from_name(&pool[0], &pool, &mut rng);
        assert!(
            q.options
                .iter()
                .any(|o| o.ends_with("becomes an evil Imp."))
        );
        assert!(q.options.iter().all(|o| !o.contains("Fang Gu")));
    }

    #[test]
    fn lone_character_gets_single_option() {
        let pool = vec![ch("Solo", "Each night, you may act.", Category::Demon)];
        let mut rng = SmallRng::seed_from_u64(4);
        let n = name_from_ability(&pool[0], &pool, &mut rng);
        assert_eq!(n.options, vec!["Solo".to_string()]);

        let a = ability_from_name(&pool[0], &pool, &mut rng);
        assert_valid(&a);
        // Mutations of the ability are the only possible distractors here.
        assert!(a.options.len() > 1);

        let plain = vec![ch("Plain", "Nothing swappable.", Category::Demon)];
        let a = ability_from_name(&plain[0], &plain, &mut rng);
        assert_eq!(a.options, vec!["Nothing swappable.".to_string()]);
    }

    #[test]
    fn mutations_fill_shortfall() {
        let pool = vec![
            ch("A", "Each night, you may choose an alive good player.", Category::Minion),
            ch("B", "Something else entirely.", Category::Minion),
        ];
        let mut rng = SmallRng::seed_from_u64(5);
        let q = ability_from_name(&pool[0], &pool, &mut rng);
        assert_valid(&q);
        assert_eq!(q.options.len(), OPTION_COUNT);
    }

    #[test]
    fn distractors_stay_in_category() {
        let pool = vec![
            ch("T1", "Learn a thing.", Category::Townsfolk),
            ch("T2", "Learn another thing.", Category::Townsfolk),
            ch("D1", "Learn a thing tonight.", Category::Demon),
            ch("D2", "Learn a thing today.", Category::Demon),
        ];
        let mut rng = SmallRng::seed_from_u64(6);
        let q = name_from_ability(&pool[0], &pool, &mut rng);
        let mut names = q.options.clone();
        names.sort();
        assert_eq!(names, vec!["T1".to_string(), "T2".to_string()]);
    }

    #[test]
    fn name_from_ability_hides_own_name() {
        let imp = ch(
            "Imp",
            "If you kill yourself this way, a Minion becomes the Imp.",
            Category::Demon,
        );
        let mut rng = SmallRng::seed_from_u64(7);
        let q = name_from_ability(&imp, std::slice::from_ref(&imp), &mut rng);
        assert_eq!(q.correct_answer, "Imp");
        assert_eq!(q.prompt(), format!("If you kill yourself this way, a Minion becomes the {PLACEHOLDER}."));
    }

    #[test]
    fn broader_pool_used_when_script_pool_is_thin() {
        let pool = vec![ch("Imp", "Choose a player: they die.", Category::Demon)];
        let broader = vec![
            ch("Imp", "Choose a player: they die.", Category::Demon),
            ch("Po", "Choose 3 players: they die.", Category::Demon),
            ch("Pukka", "Choose a player: they are poisoned.", Category::Demon),
            ch("Vortox", "Choose a player: they die. False info.", Category::Demon),
        ];
        let mut rng = SmallRng::seed_from_u64(8);
        let q = generate_question(
            &pool[0],
            &pool,
            Some(&broader),
            KindPolicy::AbilityFromName,
            &mut rng,
        );
        assert_valid(&q);
        assert_eq!(q.options.len(), OPTION_COUNT);
    }

    #[test]
    fn broader_pool_without_category_keeps_script_siblings() {
        let pool = vec![
            ch("Alpha", "Each night, choose a player.", Category::Traveller),
            ch("Beta", "Each night, choose two players.", Category::Traveller),
            ch("Gamma", "Once per game, choose a player.", Category::Traveller),
        ];
        let broader = vec![ch("Chef", "You start knowing a number.", Category::Townsfolk)];
        for seed in 0..5 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let q = generate_question(
                &pool[0],
                &pool,
                Some(&broader),
                KindPolicy::AbilityFromName,
                &mut rng,
            );
            assert_valid(&q);
            assert_eq!(q.options.len(), OPTION_COUNT, "seed {seed}");
            assert!(q.options.iter().all(|o| !o.contains("number")));
        }
    }

    #[test]
    fn broader_pool_never_yields_fewer_options() {
        let abilities = [
            "Plain words only.",
            "Another plain line.",
            "Something unrelated.",
            "Each night, you may choose an alive good player.",
        ];
        let categories = [Category::Traveller, Category::Fabled, Category::Demon];
        for (i, category) in categories.into_iter().enumerate() {
            for size in 1..=3 {
                let pool: Vec<Character> = (0..size)
                    .map(|n| ch(&format!("P{n}"), abilities[(n + i) % abilities.len()], category))
                    .collect();
                let broader = vec![
                    ch("P0", "Shadowed duplicate.", category),
                    ch("Chef", "You start knowing a number.", Category::Townsfolk),
                ];
                for seed in 0..5 {
                    let mut rng = SmallRng::seed_from_u64(seed);
                    let alone = ability_from_name(&pool[0], &pool, &mut rng).options.len();
                    let mut rng = SmallRng::seed_from_u64(seed);
                    let q = generate_question(
                        &pool[0],
                        &pool,
                        Some(&broader),
                        KindPolicy::AbilityFromName,
                        &mut rng,
                    );
                    assert_valid(&q);
                    assert!(q.options.len() >= alone, "{category:?} size {size} seed {seed}");
                    assert_eq!(q.character.ability, pool[0].ability);
                }
            }
        }
    }

    #[test]
    fn fixed_policy_always_picks_its_kind() {
        let mut rng = SmallRng::seed_from_u64(9);
        for _ in 0..20 {
            assert_eq!(
                KindPolicy::NameFromAbility.choose(&mut rng),
                QuestionKind::NameFromAbility
            );
        }
    }

    #[test]
    fn random_policy_produces_both_kinds() {
        let mut rng = SmallRng::seed_from_u64(10);
        let kinds: HashSet<QuestionKind> =
            (0..64).map(|_| KindPolicy::Random.choose(&mut rng)).collect();
        assert_eq!(kinds.len(), 2);
    }

    #[test]
    fn correct_answer_position_varies() {
        let pool: Vec<Character> = (0..6)
            .map(|i| ch(&format!("C{i}"), &format!("ability number {i}"), Category::Townsfolk))
            .collect();
        let mut rng = SmallRng::seed_from_u64(11);
        let positions: HashSet<usize> = (0..40)
            .filter_map(|_| name_from_ability(&pool[0], &pool, &mut rng).correct_index())
            .collect();
        assert!(positions.len() > 1);
    }
}

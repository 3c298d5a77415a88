pub mod bundled;

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const TROUBLE_BREWING: &str = "Trouble Brewing";
pub const BAD_MOON_RISING: &str = "Bad Moon Rising";
pub const SECTS_AND_VIOLETS: &str = "Sects and Violets";
pub const THE_CAROUSEL: &str = "The Carousel";
pub const BASE_3: &str = "Base 3";
pub const TRAVELLERS: &str = "Travellers";
pub const FABLED: &str = "Fabled";
pub const ALL: &str = "All";

/// Editions combined by the "Base 3" pseudo-script.
pub const BASE_EDITIONS: [&str; 3] = [TROUBLE_BREWING, BAD_MOON_RISING, SECTS_AND_VIOLETS];

/// Scripts listed first in the selection menu, in this order.
const PRIORITY_SCRIPTS: [&str; 5] = [
    TROUBLE_BREWING,
    BAD_MOON_RISING,
    SECTS_AND_VIOLETS,
    THE_CAROUSEL,
    BASE_3,
];

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read character pack {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("character pack {name} is not valid JSON: {source}")]
    Parse {
        name: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("bundled character pack {0} is missing")]
    MissingAsset(String),
    #[error("no characters available")]
    Empty,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Townsfolk,
    Outsider,
    Minion,
    Demon,
    #[serde(alias = "travellers")]
    Traveller,
    Fabled,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Townsfolk => "townsfolk",
            Category::Outsider => "outsider",
            Category::Minion => "minion",
            Category::Demon => "demon",
            Category::Traveller => "traveller",
            Category::Fabled => "fabled",
        }
    }

    pub fn is_evil(self) -> bool {
        matches!(self, Category::Minion | Category::Demon)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    pub ability: String,
    #[serde(rename = "type")]
    pub category: Category,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub first_night: bool,
    #[serde(default)]
    pub other_nights: bool,
    #[serde(default)]
    pub reminders: Vec<String>,
    #[serde(default)]
    pub affects_setup: bool,
    pub home_script: String,
    #[serde(default)]
    pub unreleased: bool,
}

impl Character {
    pub fn new(name: &str, ability: &str, category: Category, home_script: &str) -> Self {
        Self {
            name: name.to_string(),
            ability: ability.to_string(),
            category,
            icon: String::new(),
            first_night: false,
            other_nights: false,
            reminders: Vec::new(),
            affects_setup: false,
            home_script: home_script.to_string(),
            unreleased: false,
        }
    }
}

/// Category inclusion flags applied on top of a script selection.
///
/// Travellers and fabled are independent toggles; unreleased characters are
/// hidden unless explicitly unlocked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CategoryFilter {
    pub include_travellers: bool,
    pub include_fabled: bool,
    pub include_unreleased: bool,
}

impl CategoryFilter {
    pub fn allows(&self, character: &Character) -> bool {
        if character.unreleased && !self.include_unreleased {
            return false;
        }
        match character.category {
            Category::Traveller => self.include_travellers,
            Category::Fabled => self.include_fabled,
            _ => true,
        }
    }

    /// Pseudo-scripts made of a single category force that category on.
    pub fn for_script(mut self, script: &str) -> Self {
        match script {
            TRAVELLERS => self.include_travellers = true,
            FABLED => self.include_fabled = true,
            _ => {}
        }
        self
    }
}

/// The character data source. Built once at startup and handed to whatever
/// needs it; there is no global cache.
#[derive(Clone, Debug)]
pub struct Catalog {
    characters: Vec<Character>,
}

impl Catalog {
    /// Later entries replace earlier ones with the same name, so user packs
    /// appended after the bundled data override it.
    pub fn new(characters: Vec<Character>) -> Result<Self, CatalogError> {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut merged: Vec<Character> = Vec::with_capacity(characters.len());
        for character in characters {
            match index.get(&character.name) {
                Some(&i) => merged[i] = character,
                None => {
                    index.insert(character.name.clone(), merged.len());
                    merged.push(character);
                }
            }
        }
        if merged.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(Self { characters: merged })
    }

    /// Bundled packs plus any user packs from the config directory.
    pub fn load() -> Result<Self, CatalogError> {
        let mut characters = bundled::bundled_characters()?;
        if let Some(dir) = bundled::user_pack_dir() {
            characters.extend(bundled::load_user_packs(&dir));
        }
        let catalog = Self::new(characters)?;
        log::info!("loaded {} characters", catalog.len());
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    pub fn characters(&self) -> &[Character] {
        &self.characters
    }

    /// Script names in menu order: priority scripts, the remaining named
    /// scripts alphabetically, then "Travellers" and finally "All".
    pub fn list_scripts(&self, include_unreleased: bool) -> Vec<String> {
        let visible: Vec<&Character> = self
            .characters
            .iter()
            .filter(|c| include_unreleased || !c.unreleased)
            .collect();
        let named: BTreeSet<&str> = visible.iter().map(|c| c.home_script.as_str()).collect();
        let has_base_3 = BASE_EDITIONS.iter().all(|s| named.contains(s));
        let has_travellers = visible.iter().any(|c| c.category == Category::Traveller);

        let mut scripts: Vec<String> = PRIORITY_SCRIPTS
            .iter()
            .filter(|&&s| (s == BASE_3 && has_base_3) || named.contains(s))
            .map(|s| s.to_string())
            .collect();
        scripts.extend(
            named
                .iter()
                .filter(|&&s| !PRIORITY_SCRIPTS.contains(&s) && s != TRAVELLERS && s != ALL)
                .map(|s| s.to_string()),
        );
        if has_travellers {
            scripts.push(TRAVELLERS.to_string());
        }
        if !visible.is_empty() {
            scripts.push(ALL.to_string());
        }
        scripts
    }

    /// The working pool for a script, filtered and sorted by name.
    pub fn characters_for_script(&self, script: &str, filter: CategoryFilter) -> Vec<Character> {
        let filter = filter.for_script(script);
        let mut pool: Vec<Character> = self
            .characters
            .iter()
            .filter(|c| match script {
                BASE_3 => BASE_EDITIONS.contains(&c.home_script.as_str()),
                TRAVELLERS => c.category == Category::Traveller,
                FABLED => c.category == Category::Fabled,
                ALL => true,
                name => c.home_script == name,
            })
            .filter(|c| filter.allows(c))
            .cloned()
            .collect();
        pool.sort_by(|a, b| a.name.cmp(&b.name));
        pool
    }
}

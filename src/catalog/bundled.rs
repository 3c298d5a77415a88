use std::fs;
use std::path::{Path, PathBuf};

use rust_embed::Embed;

use crate::catalog::{Catalog, CatalogError, Character};

#[derive(Embed)]
#[folder = "assets/characters/"]
struct CharacterAssets;

/// Every bundled pack, read in file-name order.
pub fn bundled_characters() -> Result<Vec<Character>, CatalogError> {
    let mut names: Vec<String> = CharacterAssets::iter()
        .filter(|f| f.ends_with(".json"))
        .map(|f| f.to_string())
        .collect();
    names.sort();

    let mut characters = Vec::new();
    for name in names {
        let file =
            CharacterAssets::get(&name).ok_or_else(|| CatalogError::MissingAsset(name.clone()))?;
        characters.extend(parse_pack(&name, &file.data)?);
    }
    Ok(characters)
}

pub fn parse_pack(name: &str, bytes: &[u8]) -> Result<Vec<Character>, CatalogError> {
    serde_json::from_slice(bytes).map_err(|source| CatalogError::Parse {
        name: name.to_string(),
        source,
    })
}

pub fn user_pack_dir() -> Option<PathBuf> {
    Some(dirs::config_dir()?.join("rolecall").join("characters"))
}

/// Reads `*.json` packs from `dir`. A broken user pack is logged and skipped
/// so it never hides the bundled data.
pub fn load_user_packs(dir: &Path) -> Vec<Character> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().and_then(|x| x.to_str()) == Some("json"))
        .collect();
    paths.sort();

    let mut characters = Vec::new();
    for path in paths {
        match read_pack(&path) {
            Ok(pack) => {
                log::info!("loaded {} characters from {}", pack.len(), path.display());
                characters.extend(pack);
            }
            Err(e) => log::warn!("skipping character pack: {e}"),
        }
    }
    characters
}

fn read_pack(path: &Path) -> Result<Vec<Character>, CatalogError> {
    let bytes = fs::read(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_pack(&path.display().to_string(), &bytes)
}

/// Bundled data only, ignoring user packs.
pub fn bundled_catalog() -> Result<Catalog, CatalogError> {
    Catalog::new(bundled_characters()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ALL, BASE_3, Category, CategoryFilter, TRAVELLERS, TROUBLE_BREWING};
    use tempfile::TempDir;

    #[test]
    fn bundled_data_parses_and_names_are_unique() {
        let characters = bundled_characters().unwrap();
        let catalog = Catalog::new(characters.clone()).unwrap();
        assert_eq!(catalog.len(), characters.len(), "duplicate bundled names");
    }

    #[test]
    fn trouble_brewing_has_every_category() {
        let catalog = bundled_catalog().unwrap();
        let filter = CategoryFilter {
            include_travellers: true,
            ..CategoryFilter::default()
        };
        let pool = catalog.characters_for_script(TROUBLE_BREWING, filter);
        for category in [
            Category::Townsfolk,
            Category::Outsider,
            Category::Minion,
            Category::Demon,
            Category::Traveller,
        ] {
            assert!(pool.iter().any(|c| c.category == category), "{category} missing");
        }
    }

    #[test]
    fn bundled_script_list_has_pseudo_scripts() {
        let scripts = bundled_catalog().unwrap().list_scripts(false);
        assert_eq!(scripts.first().map(String::as_str), Some(TROUBLE_BREWING));
        assert!(scripts.contains(&BASE_3.to_string()));
        assert_eq!(scripts[scripts.len() - 2], TRAVELLERS);
        assert_eq!(scripts.last().map(String::as_str), Some(ALL));
    }

    #[test]
    fn user_packs_skip_broken_files() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("custom.json"),
            r#"[{"name":"Hermit","ability":"You have all Outsider abilities.","type":"outsider","home_script":"Homebrew"}]"#,
        )
        .unwrap();
        fs::write(dir.path().join("broken.json"), "{not json").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let characters = load_user_packs(dir.path());
        assert_eq!(characters.len(), 1);
        assert_eq!(characters[0].name, "Hermit");
    }

    #[test]
    fn missing_user_dir_yields_nothing() {
        let dir = TempDir::new().unwrap();
        assert!(load_user_packs(&dir.path().join("absent")).is_empty());
    }
}

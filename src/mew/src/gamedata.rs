//! Named game entities and cat-name pools, read out of the archive.
//!
//! The game keeps display names in localization CSVs (one column per
//! language) and its random cat names in plain text pools. Rows are
//! classified into entity categories by the key rules in
//! [`crate::registry::TEXT_SOURCES`].

use std::collections::BTreeMap;

use serde::Serialize;

use crate::archive::{Archive, ArchiveError};
use crate::registry::{self, TextSource};

/// Language columns in the localization CSVs
pub const LANGUAGES: &[&str] = &["en", "sp", "fr", "de", "it", "pt-br"];

/// Human-readable label for a language code
pub fn language_label(code: &str) -> Option<&'static str> {
    match code {
        "en" => Some("English"),
        "sp" => Some("Español"),
        "fr" => Some("Français"),
        "de" => Some("Deutsch"),
        "it" => Some("Italiano"),
        "pt-br" => Some("Português (BR)"),
        _ => None,
    }
}

/// One named entity parsed from the localization CSVs
#[derive(Debug, Clone, Serialize)]
pub struct GameEntity {
    pub key: String,
    pub category: &'static str,
    pub csv_path: &'static str,
    /// Language code to display name. Empty values and `{}` format
    /// templates are dropped at parse time.
    pub names: BTreeMap<String, String>,
}

impl GameEntity {
    /// Display name in one language
    pub fn name(&self, lang: &str) -> Option<&str> {
        self.names.get(lang).map(String::as_str)
    }

    /// English name, falling back to the raw key
    pub fn english_or_key(&self) -> &str {
        self.name("en").unwrap_or(&self.key)
    }
}

/// A loaded cat-name pool
#[derive(Debug, Clone, Serialize)]
pub struct CatNamePool {
    pub label: &'static str,
    pub archive_path: &'static str,
    pub names: Vec<String>,
}

/// Parse every registered localization CSV and classify its rows, grouped
/// by category id. Groups come back sorted by English name. CSVs missing
/// from the archive are skipped.
pub fn load_entities(
    archive: &mut Archive,
) -> Result<BTreeMap<&'static str, Vec<GameEntity>>, ArchiveError> {
    let mut groups: BTreeMap<&'static str, Vec<GameEntity>> = BTreeMap::new();
    for source in registry::TEXT_SOURCES {
        let raw = match archive.read(source.csv_path) {
            Ok(raw) => raw,
            Err(ArchiveError::NotFound(_)) => continue,
            Err(e) => return Err(e),
        };
        for entity in parse_source(source, &raw) {
            groups.entry(entity.category).or_default().push(entity);
        }
    }
    for group in groups.values_mut() {
        group.sort_by_key(|e| e.english_or_key().to_lowercase());
    }
    Ok(groups)
}

/// Category ids with display names, in the order the sources declare them
pub fn category_display_order() -> Vec<(&'static str, &'static str)> {
    registry::TEXT_SOURCES
        .iter()
        .flat_map(|source| {
            source
                .categories
                .iter()
                .map(|category| (category.id, category.display_name))
        })
        .collect()
}

/// Load the cat-name pools: comments and blank lines stripped, exact
/// duplicates removed, sorted case-insensitively. Pools missing from the
/// archive are skipped.
pub fn load_name_pools(archive: &mut Archive) -> Result<Vec<CatNamePool>, ArchiveError> {
    let mut pools = Vec::new();
    for pool in registry::NAME_POOLS {
        let raw = match archive.read(pool.archive_path) {
            Ok(raw) => raw,
            Err(ArchiveError::NotFound(_)) => continue,
            Err(e) => return Err(e),
        };
        let text = decode_text(&raw);
        let mut names: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with("//"))
            .map(str::to_string)
            .collect();
        names.sort();
        names.dedup();
        names.sort_by_key(|name| name.to_lowercase());
        pools.push(CatNamePool {
            label: pool.label,
            archive_path: pool.archive_path,
            names,
        });
    }
    Ok(pools)
}

fn parse_source(source: &'static TextSource, raw: &[u8]) -> Vec<GameEntity> {
    let text = decode_text(raw);
    let mut lines = text.lines();
    let Some(header_line) = lines.next() else {
        return Vec::new();
    };

    // map language codes to their column indexes
    let header = split_csv_row(header_line);
    let mut lang_columns: Vec<(usize, &'static str)> = Vec::new();
    for (index, column) in header.iter().enumerate() {
        let column = column.trim().to_lowercase();
        if let Some(lang) = LANGUAGES.iter().copied().find(|l| *l == column) {
            lang_columns.push((index, lang));
        }
    }

    let mut out = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let row = split_csv_row(line);
        let Some(first) = row.first() else { continue };
        let key = first.trim();
        if key.is_empty() || key.starts_with("//") {
            continue;
        }
        let Some(category) = source.categories.iter().find(|c| c.matches(key)) else {
            continue;
        };

        let mut names = BTreeMap::new();
        for &(index, lang) in &lang_columns {
            if let Some(value) = row.get(index) {
                let value = value.trim();
                // values containing {} are format templates, not names
                if !value.is_empty() && !value.contains('{') {
                    names.insert(lang.to_string(), value.to_string());
                }
            }
        }
        if names.is_empty() {
            continue;
        }
        out.push(GameEntity {
            key: key.to_string(),
            category: category.id,
            csv_path: source.csv_path,
            names,
        });
    }
    out
}

/// The CSVs ship with a UTF-8 BOM; strip it before parsing
fn decode_text(raw: &[u8]) -> String {
    let raw = raw.strip_prefix(&[0xEF, 0xBB, 0xBF][..]).unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

/// Split one CSV row into fields, honoring double-quoted values with
/// doubled-quote escapes
fn split_csv_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    /// Pack files into an archive laid out back to back after the directory
    fn archive_with(dir: &tempfile::TempDir, files: &[(&str, &str)]) -> PathBuf {
        let dir_len: usize =
            8 + files.iter().map(|(name, _)| 2 + name.len() + 13).sum::<usize>();
        let mut out = Vec::new();
        out.extend_from_slice(b"ARC1");
        out.extend_from_slice(&(files.len() as u32).to_le_bytes());
        let mut offset = dir_len as u64;
        for (name, content) in files {
            out.extend_from_slice(&(name.len() as u16).to_le_bytes());
            out.extend_from_slice(name.as_bytes());
            out.extend_from_slice(&offset.to_le_bytes());
            out.extend_from_slice(&(content.len() as u32).to_le_bytes());
            out.push(0);
            offset += content.len() as u64;
        }
        for (_, content) in files {
            out.extend_from_slice(content.as_bytes());
        }
        let path = dir.path().join("resources.pak");
        fs::write(&path, &out).unwrap();
        path
    }

    const UNITS_CSV: &str = "\u{FEFF}key,en,sp,fr,de,it,pt-br\n\
        // comment rows are ignored\n\
        ENEMY_RAT_NAME,Rat,Rata,Rat,Ratte,Ratto,Rato\n\
        ENEMY_ANT_NAME,ant,,,,,\n\
        ENEMY_SNAKE_NAME,{0} Snake,,,,,\n\
        FAMILIAR_TOAD_NAME,Toad,,,,,\n\
        PLAYER_CAT_NAME,\"Whiskers, Esq.\",,,,,\n\
        ENEMY_RAT_DESC,A very large rat,,,,,\n\
        ,,,,,,\n";

    #[test]
    fn entities_parse_classify_and_sort() {
        let dir = tempfile::tempdir().unwrap();
        let path = archive_with(&dir, &[("data/text/units.csv", UNITS_CSV)]);
        let mut archive = Archive::open(&path).unwrap();

        let groups = load_entities(&mut archive).unwrap();

        let enemies = &groups["enemies"];
        let keys: Vec<_> = enemies.iter().map(|e| e.key.as_str()).collect();
        // sorted case-insensitively by English name; the all-template
        // snake row carries no usable name and is dropped
        assert_eq!(keys, vec!["ENEMY_ANT_NAME", "ENEMY_RAT_NAME"]);

        let rat = &enemies[1];
        assert_eq!(rat.name("en"), Some("Rat"));
        assert_eq!(rat.name("sp"), Some("Rata"));
        assert_eq!(rat.name("pt-br"), Some("Rato"));
        assert_eq!(rat.csv_path, "data/text/units.csv");

        assert_eq!(groups["familiars"].len(), 1);
        assert_eq!(
            groups["player_units"][0].name("en"),
            Some("Whiskers, Esq.")
        );

        // DESC keys are not names, and absent CSVs contribute nothing
        assert!(!groups.contains_key("items"));
        assert!(!groups.contains_key("furniture"));
        assert!(enemies.iter().all(|e| !e.key.ends_with("_DESC")));
    }

    #[test]
    fn furniture_keys_match_on_prefix_alone() {
        let csv = "key,en\nFURNITURE_NAME_COUCH,Couch\nFURNITURE_DESC_COUCH,Comfy\n";
        let dir = tempfile::tempdir().unwrap();
        let path = archive_with(&dir, &[("data/text/furniture.csv", csv)]);
        let mut archive = Archive::open(&path).unwrap();

        let groups = load_entities(&mut archive).unwrap();
        let furniture = &groups["furniture"];
        assert_eq!(furniture.len(), 1);
        assert_eq!(furniture[0].key, "FURNITURE_NAME_COUCH");
    }

    #[test]
    fn display_order_follows_source_order() {
        let order: Vec<_> = category_display_order()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(
            order,
            vec!["enemies", "familiars", "player_units", "items", "furniture"]
        );
    }

    #[test]
    fn name_pools_are_cleaned_and_sorted() {
        let pool = "Luna\n// stud book names\nBella\nLuna\n\n  amber  \nZiggy\n";
        let dir = tempfile::tempdir().unwrap();
        let path = archive_with(&dir, &[("data/catnames_female_en.txt", pool)]);
        let mut archive = Archive::open(&path).unwrap();

        let pools = load_name_pools(&mut archive).unwrap();
        assert_eq!(pools.len(), 1);
        assert_eq!(pools[0].label, "Female");
        assert_eq!(pools[0].names, vec!["amber", "Bella", "Luna", "Ziggy"]);
    }

    #[test]
    fn quoted_fields_keep_commas_and_escaped_quotes() {
        let row = split_csv_row("A,\"B, with comma\",\"say \"\"hi\"\"\",D");
        assert_eq!(row, vec!["A", "B, with comma", "say \"hi\"", "D"]);
    }

    #[test]
    fn empty_archive_yields_empty_groups() {
        let dir = tempfile::tempdir().unwrap();
        let path = archive_with(&dir, &[]);
        let mut archive = Archive::open(&path).unwrap();
        assert!(load_entities(&mut archive).unwrap().is_empty());
        assert!(load_name_pools(&mut archive).unwrap().is_empty());
    }

    #[test]
    fn language_labels_cover_all_columns() {
        for lang in LANGUAGES {
            assert!(language_label(lang).is_some(), "missing label for {lang}");
        }
        assert!(language_label("tlh").is_none());
    }
}

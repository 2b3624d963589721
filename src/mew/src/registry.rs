//! Static Mewgenics reference data: record layouts, save categories,
//! localization key rules, and name pools.
//!
//! Everything here is embedded in the binary and handed out as `&'static`
//! references; nothing is loaded or mutated at runtime.

use phf::phf_map;

use crate::blob::{Encoding, FieldKind, FieldSpec, RecordLayout};

/// Game-enforced rename limits, in characters
pub const MIN_NAME_CHARS: usize = 1;
pub const MAX_NAME_CHARS: usize = 24;

/// Process name checked before writing to a save
pub const GAME_PROCESS_NAME: &str = "Mewgenics.exe";

/// Extension given to save backups
pub const BACKUP_EXTENSION: &str = "savbackup";

// ---------------------------------------------------------------------------
// Record layouts
// ---------------------------------------------------------------------------

/// Cats stored in save databases
pub static CAT_RECORD: RecordLayout = RecordLayout {
    id: "cat_record",
    fields: &[
        FieldSpec {
            id: "magic",
            kind: FieldKind::Magic(0x13),
        },
        FieldSpec {
            id: "seed",
            kind: FieldKind::Bytes { len: 8 },
        },
        FieldSpec {
            id: "name",
            kind: FieldKind::PrefixedName {
                encoding: Encoding::Utf16Le,
                reserved: 4,
            },
        },
        FieldSpec {
            id: "stats",
            kind: FieldKind::Tail,
        },
    ],
};

/// Default-cat templates shipped in the game archive
pub static CAT_TEMPLATE: RecordLayout = RecordLayout {
    id: "cat_template",
    fields: &[
        FieldSpec {
            id: "magic",
            kind: FieldKind::Magic(0x13),
        },
        FieldSpec {
            id: "name",
            kind: FieldKind::FixedName {
                capacity: 16,
                encoding: Encoding::Ascii,
                pad: 0x00,
            },
        },
        FieldSpec {
            id: "defaults",
            kind: FieldKind::Tail,
        },
    ],
};

static LAYOUTS: phf::Map<&'static str, &'static RecordLayout> = phf_map! {
    "cat_record" => &CAT_RECORD,
    "cat_template" => &CAT_TEMPLATE,
};

/// Look up a record layout by id
pub fn record_layout(id: &str) -> Option<&'static RecordLayout> {
    LAYOUTS.get(id).copied()
}

// ---------------------------------------------------------------------------
// Save categories
// ---------------------------------------------------------------------------

/// Where one kind of cat row lives inside a save database
#[derive(Debug)]
pub struct SaveCategory {
    pub id: &'static str,
    pub display_name: &'static str,
    /// Table holding the rows
    pub table: &'static str,
    /// Exact key to match, for tables that mix row kinds
    pub key_filter: Option<&'static str>,
    pub layout: &'static RecordLayout,
    /// Listed but never written
    pub read_only: bool,
    pub description: &'static str,
    pub sort_order: u32,
}

pub static TEAM_CATS: SaveCategory = SaveCategory {
    id: "team_cats",
    display_name: "Team Cats",
    table: "cats",
    key_filter: None,
    layout: &CAT_RECORD,
    read_only: false,
    description: "Cats on your current team",
    sort_order: 10,
};

pub static PROFILE_CAT: SaveCategory = SaveCategory {
    id: "profile_cat",
    display_name: "Profile Cat",
    table: "files",
    key_filter: Some("save_file_cat"),
    layout: &CAT_RECORD,
    read_only: false,
    description: "The cat shown on the save file slot",
    sort_order: 20,
};

pub static WINNING_TEAMS: SaveCategory = SaveCategory {
    id: "winning_teams",
    display_name: "Winning Teams",
    table: "winning_teams",
    key_filter: None,
    layout: &CAT_RECORD,
    read_only: true,
    description: "Snapshots of past winning teams",
    sort_order: 30,
};

/// All save categories, in display order
pub static SAVE_CATEGORIES: &[&SaveCategory] = &[&TEAM_CATS, &PROFILE_CAT, &WINNING_TEAMS];

static CATEGORY_IDS: phf::Map<&'static str, &'static SaveCategory> = phf_map! {
    "team_cats" => &TEAM_CATS,
    "profile_cat" => &PROFILE_CAT,
    "winning_teams" => &WINNING_TEAMS,
};

/// Look up a save category by id
pub fn save_category(id: &str) -> Option<&'static SaveCategory> {
    CATEGORY_IDS.get(id).copied()
}

// ---------------------------------------------------------------------------
// Localization text categories
// ---------------------------------------------------------------------------

/// Key classification rule for one entity family in the localization CSVs.
/// An empty suffix matches on prefix alone.
#[derive(Debug)]
pub struct TextCategory {
    pub id: &'static str,
    pub display_name: &'static str,
    pub prefix: &'static str,
    pub suffix: &'static str,
}

impl TextCategory {
    /// Whether a localization key belongs to this category
    pub fn matches(&self, key: &str) -> bool {
        key.starts_with(self.prefix) && (self.suffix.is_empty() || key.ends_with(self.suffix))
    }
}

/// One localization CSV inside the archive and the categories that classify
/// its keys
#[derive(Debug)]
pub struct TextSource {
    pub csv_path: &'static str,
    pub categories: &'static [TextCategory],
}

pub static TEXT_SOURCES: &[TextSource] = &[
    TextSource {
        csv_path: "data/text/units.csv",
        categories: &[
            TextCategory {
                id: "enemies",
                display_name: "Enemies",
                prefix: "ENEMY_",
                suffix: "_NAME",
            },
            TextCategory {
                id: "familiars",
                display_name: "Familiars",
                prefix: "FAMILIAR_",
                suffix: "_NAME",
            },
            TextCategory {
                id: "player_units",
                display_name: "Player Units",
                prefix: "PLAYER_",
                suffix: "_NAME",
            },
        ],
    },
    TextSource {
        csv_path: "data/text/items.csv",
        categories: &[TextCategory {
            id: "items",
            display_name: "Items",
            prefix: "ITEM_",
            suffix: "_NAME",
        }],
    },
    TextSource {
        csv_path: "data/text/furniture.csv",
        categories: &[TextCategory {
            id: "furniture",
            display_name: "Furniture",
            prefix: "FURNITURE_NAME_",
            suffix: "",
        }],
    },
];

/// Classify a localization key. First matching rule wins, in source order.
pub fn category_of(key: &str) -> Option<&'static TextCategory> {
    TEXT_SOURCES
        .iter()
        .flat_map(|source| source.categories)
        .find(|category| category.matches(key))
}

// ---------------------------------------------------------------------------
// Cat name pools
// ---------------------------------------------------------------------------

/// A cat-name pool text file inside the archive
#[derive(Debug)]
pub struct NamePool {
    pub archive_path: &'static str,
    pub label: &'static str,
}

pub static NAME_POOLS: &[NamePool] = &[
    NamePool {
        archive_path: "data/catnames_female_en.txt",
        label: "Female",
    },
    NamePool {
        archive_path: "data/catnames_male_en.txt",
        label: "Male",
    },
    NamePool {
        archive_path: "data/catnames_neutral_en.txt",
        label: "Neutral",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_lookup() {
        let cat = save_category("team_cats").unwrap();
        assert_eq!(cat.table, "cats");
        assert!(!cat.read_only);
        assert!(save_category("dogs").is_none());
    }

    #[test]
    fn profile_cat_filters_on_key() {
        let cat = save_category("profile_cat").unwrap();
        assert_eq!(cat.key_filter, Some("save_file_cat"));
        assert_eq!(cat.table, "files");
    }

    #[test]
    fn winning_teams_is_read_only() {
        assert!(save_category("winning_teams").unwrap().read_only);
    }

    #[test]
    fn categories_listed_in_sort_order() {
        let orders: Vec<u32> = SAVE_CATEGORIES.iter().map(|c| c.sort_order).collect();
        let mut sorted = orders.clone();
        sorted.sort_unstable();
        assert_eq!(orders, sorted);
    }

    #[test]
    fn layout_lookup() {
        assert_eq!(record_layout("cat_record").unwrap().id, "cat_record");
        assert_eq!(record_layout("cat_template").unwrap().id, "cat_template");
        assert!(record_layout("cat_hat").is_none());
    }

    #[test]
    fn key_classification_rules() {
        assert_eq!(category_of("ENEMY_RAT_NAME").unwrap().id, "enemies");
        assert_eq!(category_of("FAMILIAR_TOAD_NAME").unwrap().id, "familiars");
        assert_eq!(category_of("PLAYER_CAT_NAME").unwrap().id, "player_units");
        assert_eq!(category_of("ITEM_SWORD_NAME").unwrap().id, "items");
        assert_eq!(category_of("FURNITURE_NAME_COUCH").unwrap().id, "furniture");

        // prefix without the required suffix is not a name key
        assert!(category_of("ENEMY_RAT_DESC").is_none());
        assert!(category_of("ITEM_SWORD_FLAVOR").is_none());
        assert!(category_of("SOMETHING_ELSE").is_none());
    }
}

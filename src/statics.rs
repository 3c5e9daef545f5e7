// UI strings and tuning constants shared across the browser.

// English UI strings (EN_ prefix to make future localization easier)
pub const EN_APP_TITLE: &str = "ODF Browser";

pub const EN_BTN_OPEN: &str = "Open...";
pub const EN_BTN_OPEN_FLAT: &str = "Open flat dump...";
pub const EN_BTN_CLEAR: &str = "Clear";
pub const EN_BTN_RESET: &str = "Reset";
pub const EN_BTN_ABOUT: &str = "About";
pub const EN_BTN_TOGGLE_THEME: &str = "Theme";
pub const EN_BTN_LOCATE: &str = "Locate";

pub const EN_WINDOW_ABOUT: &str = "About";
pub const EN_ABOUT_VERSION: &str = "Version:";
pub const EN_ABOUT_SHORTCUTS: &str = "Shortcuts:";
pub const EN_ABOUT_SHORTCUT_ESC: &str = "- Esc: clear filter (twice quickly: reset view)";
pub const EN_ABOUT_SHORTCUT_ITEM: &str = "- Up / Down: previous / next ODF";
pub const EN_ABOUT_SHORTCUT_CATEGORY: &str = "- Alt+Left / Alt+Right: previous / next category";
pub const EN_ABOUT_SHORTCUT_TAB: &str = "- Ctrl+Left / Ctrl+Right: previous / next property tab";

pub const EN_HOME_HEADING: &str = "ODF Browser";
pub const EN_HOME_INSTRUCTIONS: &str = "Open an ODF dataset (.json/.gz) to begin.";
pub const EN_PLACEHOLDER_SELECT: &str = "Select an ODF from the list.";

pub const EN_HINT_SEARCH: &str = "Type here to filter...";
pub const EN_HINT_FILTER_PROPERTIES: &str = "Filter properties...";
pub const EN_SEARCH_NO_MATCHES: &str = "No matches.";

pub const EN_COL_PROPERTY: &str = "Property";
pub const EN_COL_VALUE: &str = "Value";

pub const EN_PREFIX_INHERITS: &str = "Inherits:";
pub const EN_INHERIT_SEPARATOR: &str = " → ";

pub const EN_TAB_ALL: &str = "All";

pub const EN_AUDIO_FOUND: &str = "Found at";
pub const EN_ERR_AUDIO_MISSING: &str = "Audio file not found:";

// Time windows (milliseconds).
pub const DEBOUNCE_MS: u64 = 300;
pub const ESCAPE_WINDOW_MS: u64 = 750;

// Card height estimate used for two-column balancing.
pub const CARD_HEADER_HEIGHT: f32 = 60.0;
pub const CARD_TABLE_HEADER_HEIGHT: f32 = 42.0;
pub const CARD_ROW_HEIGHT: f32 = 42.0;
pub const BALANCE_FORCE_RATIO: f32 = 0.7;
pub const BALANCE_SPILL_RATIO: f32 = 1.2;

// Property grouping.
pub const GROUP_OTHER: &str = "Other";
pub const GROUP_CLASS_SUFFIX: &str = "Class";
pub const GROUP_SEPARATOR: char = '.';
pub const GROUP_MIN_PATTERN_LEN: usize = 4;

// Defaults for the config file.
pub const DEFAULT_DATASET_PATH: &str = "data/odf/odf.json";
pub const DEFAULT_AUDIO_PREFIX: &str = "data/audio/";

// Deep-link query parameters.
pub const QUERY_ODF: &str = "odf";
pub const QUERY_CAT: &str = "cat";

// ODF dataset structure keys (ODF_ prefix)
pub const ODF_EXTENSION: &str = ".odf";
pub const ODF_INHERITANCE_CHAIN: &str = "inheritanceChain";
pub const ODF_GROUP_GAME_OBJECT: &str = "GameObjectClass";
pub const ODF_GROUP_WEAPON: &str = "WeaponClass";
pub const ODF_PROP_UNIT_NAME: &str = "unitName";
pub const ODF_PROP_WEAPON_NAME: &str = "wpnName";
pub const ODF_PROP_CLASS_LABEL: &str = "classLabel";

// Category name -> property group that identifies it. Checked in order.
pub const ODF_CATEGORIES: &[(&str, &str)] = &[
    ("Vehicle", "CraftClass"),
    ("Weapon", "WeaponClass"),
    ("Pilot", "PersonClass"),
    ("Building", "BuildingClass"),
    ("Ordnance", "OrdnanceClass"),
    ("Powerup", "WeaponPowerupClass"),
];

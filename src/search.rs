//! Free-text search over every ODF in the dataset.
//!
//! A search pass produces a [`SearchOutcome`]: which items stay visible, the
//! per-category match counts shown as tab badges, which item gets
//! highlighted, and which category tab should become active. Applying the
//! outcome is the caller's job; switching tabs afterwards only reads it.

use crate::Dataset;
use crate::fuzzy::fuzzy_lowered;
use indexmap::IndexMap;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemRef {
    pub category: String,
    pub filename: String,
}

impl ItemRef {
    pub fn new(category: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            filename: filename.into(),
        }
    }
}

/// The item a search pass wants highlighted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoSelect {
    pub item: ItemRef,
    /// Only exact matches are also opened; fuzzy hits are highlighted only.
    pub display: bool,
}

#[derive(Debug, Clone)]
struct SearchEntry {
    item: ItemRef,
    names: Vec<Vec<char>>,
}

/// Searchable names for every item, in category order then display order.
/// Built once per dataset.
#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    categories: Vec<String>,
    entries: Vec<SearchEntry>,
}

impl SearchIndex {
    pub fn new(dataset: &Dataset) -> Self {
        let categories: Vec<String> = dataset.list_categories().map(str::to_string).collect();
        let mut entries = Vec::with_capacity(dataset.record_count());
        for category in &categories {
            for (filename, record) in dataset.list_records(category) {
                entries.push(SearchEntry {
                    item: ItemRef::new(category.as_str(), filename),
                    names: record
                        .searchable_names(filename)
                        .iter()
                        .map(|n| n.chars().collect())
                        .collect(),
                });
            }
        }
        Self {
            categories,
            entries,
        }
    }

    /// Everything visible, no badges, nothing selected.
    pub fn show_all(&self) -> SearchOutcome {
        let mut visible: IndexMap<String, Vec<String>> = self
            .categories
            .iter()
            .map(|c| (c.clone(), Vec::new()))
            .collect();
        for entry in &self.entries {
            if let Some(list) = visible.get_mut(&entry.item.category) {
                list.push(entry.item.filename.clone());
            }
        }
        SearchOutcome {
            term: String::new(),
            visible,
            counts: None,
            exact: false,
            auto_select: None,
            activate_category: None,
            empty_categories: Vec::new(),
        }
    }

    /// Run one search pass. `active_category` is the tab active before the
    /// search; it only matters for deciding whether to switch tabs.
    pub fn search(&self, term: &str, active_category: Option<&str>) -> SearchOutcome {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return self.show_all();
        }
        let needle: Vec<char> = term.chars().collect();

        let mut exact_hits: Vec<&ItemRef> = Vec::new();
        let mut fuzzy_hits: Vec<&ItemRef> = Vec::new();
        for entry in &self.entries {
            if entry.names.iter().any(|n| *n == needle) {
                exact_hits.push(&entry.item);
            }
            if entry.names.iter().any(|n| fuzzy_lowered(&needle, n)) {
                fuzzy_hits.push(&entry.item);
            }
        }

        let exact = !exact_hits.is_empty();
        let hits = if exact { exact_hits } else { fuzzy_hits };

        let mut visible: IndexMap<String, Vec<String>> = self
            .categories
            .iter()
            .map(|c| (c.clone(), Vec::new()))
            .collect();
        for item in &hits {
            if let Some(list) = visible.get_mut(&item.category) {
                list.push(item.filename.clone());
            }
        }
        let counts: IndexMap<String, usize> = visible
            .iter()
            .map(|(c, list)| (c.clone(), list.len()))
            .collect();

        let auto_select = hits.first().map(|item| AutoSelect {
            item: (*item).clone(),
            display: exact,
        });

        let activate_category = if exact {
            auto_select.as_ref().map(|a| a.item.category.clone())
        } else {
            busiest_category(&counts, active_category)
        };

        let empty_categories = counts
            .iter()
            .filter(|(_, n)| **n == 0)
            .map(|(c, _)| c.clone())
            .collect();

        debug!(
            term = %term,
            exact,
            matches = hits.len(),
            activate = ?activate_category,
            "search pass"
        );

        SearchOutcome {
            term,
            visible,
            counts: Some(counts),
            exact,
            auto_select,
            activate_category,
            empty_categories,
        }
    }
}

/// When the active tab has no matches but another has more, move to the
/// category with the most matches (first in order on ties).
fn busiest_category(
    counts: &IndexMap<String, usize>,
    active_category: Option<&str>,
) -> Option<String> {
    let active_count = active_category
        .and_then(|c| counts.get(c))
        .copied()
        .unwrap_or(0);
    if active_count != 0 {
        return None;
    }

    let mut best: Option<(&String, usize)> = None;
    for (category, &count) in counts {
        if count > best.map_or(active_count, |(_, n)| n) {
            best = Some((category, count));
        }
    }
    best.map(|(c, _)| c.clone())
}

/// Result of one search pass.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchOutcome {
    /// Normalized (trimmed, lowercased) term; empty when showing everything.
    pub term: String,
    /// Visible filenames per category, in display order.
    pub visible: IndexMap<String, Vec<String>>,
    /// Per-category match counts; `None` resets tab labels to plain names.
    pub counts: Option<IndexMap<String, usize>>,
    /// True when at least one searchable name equals the term.
    pub exact: bool,
    pub auto_select: Option<AutoSelect>,
    /// Tab to switch to, if any.
    pub activate_category: Option<String>,
    /// Categories that show a "no matches" notice.
    pub empty_categories: Vec<String>,
}

impl SearchOutcome {
    pub fn visible_in(&self, category: &str) -> &[String] {
        self.visible
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn is_visible(&self, category: &str, filename: &str) -> bool {
        self.visible_in(category).iter().any(|f| f == filename)
    }

    pub fn count(&self, category: &str) -> Option<usize> {
        self.counts.as_ref().and_then(|c| c.get(category)).copied()
    }

    pub fn shows_no_matches(&self, category: &str) -> bool {
        self.empty_categories.iter().any(|c| c == category)
    }

    /// Tab label: the category name, with a count badge while searching.
    pub fn tab_label(&self, category: &str) -> String {
        match self.count(category) {
            Some(n) if n > 0 => format!("{category} ({n})"),
            _ => category.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ItemRef, SearchIndex};
    use crate::{Dataset, OdfValue};

    fn index(text: &str) -> SearchIndex {
        let ds = Dataset::from_value(&OdfValue::parse_json5(text).unwrap()).unwrap();
        SearchIndex::new(&ds)
    }

    const SAMPLE: &str = r#"{
        "Vehicle": {
            "foo.odf": {},
            "foobar.odf": {},
            "avtank.odf": { "GameObjectClass": { "unitName": "Tank" } }
        },
        "Weapon": {
            "gminigun.odf": { "WeaponClass": { "wpnName": "Minigun" } },
            "gmortar.odf": {}
        }
    }"#;

    #[test]
    fn empty_term_shows_everything_without_badges() {
        let idx = index(SAMPLE);
        let out = idx.search("   ", Some("Vehicle"));
        assert_eq!(out.visible_in("Vehicle").len(), 3);
        assert_eq!(out.visible_in("Weapon").len(), 2);
        assert_eq!(out.counts, None);
        assert_eq!(out.auto_select, None);
        assert!(out.empty_categories.is_empty());
        assert_eq!(out.tab_label("Vehicle"), "Vehicle");
    }

    #[test]
    fn exact_match_hides_fuzzy_matches_and_opens_the_hit() {
        let idx = index(SAMPLE);
        let out = idx.search("FOO", Some("Weapon"));
        assert!(out.exact);
        assert_eq!(out.visible_in("Vehicle"), ["foo.odf"]);
        assert!(!out.is_visible("Vehicle", "foobar.odf"));
        let auto = out.auto_select.unwrap();
        assert_eq!(auto.item, ItemRef::new("Vehicle", "foo.odf"));
        assert!(auto.display);
        assert_eq!(out.activate_category.as_deref(), Some("Vehicle"));
        assert_eq!(out.empty_categories, ["Weapon"]);
    }

    #[test]
    fn display_name_counts_as_exact() {
        let idx = index(SAMPLE);
        let out = idx.search("minigun", None);
        assert!(out.exact);
        assert_eq!(out.visible_in("Weapon"), ["gminigun.odf"]);
    }

    #[test]
    fn fuzzy_hit_is_highlighted_but_not_opened() {
        // Fuzzy auto-selection highlights but never displays.
        let idx = index(SAMPLE);
        let out = idx.search("gmr", Some("Weapon"));
        assert!(!out.exact);
        assert_eq!(out.visible_in("Weapon"), ["gmortar.odf"]);
        let auto = out.auto_select.as_ref().unwrap();
        assert_eq!(auto.item, ItemRef::new("Weapon", "gmortar.odf"));
        assert!(!auto.display);
        assert_eq!(out.count("Weapon"), Some(1));
        assert_eq!(out.count("Vehicle"), Some(0));
        assert_eq!(out.tab_label("Weapon"), "Weapon (1)");
        assert!(out.shows_no_matches("Vehicle"));
    }

    #[test]
    fn switches_to_busiest_tab_when_active_has_none() {
        let idx = index(SAMPLE);
        let out = idx.search("g", Some("Vehicle"));
        // "g" hits both weapons only.
        assert_eq!(out.count("Vehicle"), Some(0));
        assert_eq!(out.count("Weapon"), Some(2));
        assert_eq!(out.activate_category.as_deref(), Some("Weapon"));

        // Active category with matches stays put.
        let out = idx.search("o", Some("Vehicle"));
        assert_eq!(out.activate_category, None);
    }

    #[test]
    fn tied_categories_resolve_to_first_in_order() {
        let idx = index(
            r#"{
                "Pilot": { "aspilo.odf": {} },
                "Vehicle": { "zvx.odf": {}, "zvy.odf": {} },
                "Weapon": { "zwx.odf": {}, "zwy.odf": {} }
            }"#,
        );
        let out = idx.search("z", Some("Pilot"));
        assert_eq!(out.count("Vehicle"), Some(2));
        assert_eq!(out.count("Weapon"), Some(2));
        assert_eq!(out.activate_category.as_deref(), Some("Vehicle"));

        // Order of categories in the document decides, not their names.
        let idx = index(
            r#"{
                "Pilot": { "aspilo.odf": {} },
                "Weapon": { "zwx.odf": {}, "zwy.odf": {} },
                "Vehicle": { "zvx.odf": {}, "zvy.odf": {} }
            }"#,
        );
        let out = idx.search("z", Some("Pilot"));
        assert_eq!(out.activate_category.as_deref(), Some("Weapon"));
    }

    #[test]
    fn no_matches_anywhere_keeps_active_tab() {
        let idx = index(SAMPLE);
        let out = idx.search("zzzz", Some("Weapon"));
        assert_eq!(out.activate_category, None);
        assert_eq!(out.auto_select, None);
        assert_eq!(out.empty_categories, ["Vehicle", "Weapon"]);
    }
}

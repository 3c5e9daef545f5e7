//! Splits a record's property groups into semantic clusters by name:
//! dotted prefixes (`Ordnance.Render` -> `Ordnance`), `*Class` suffixes
//! (`GameObjectClass` -> `GameObject`), and numbered series
//! (`ArmoryGroup1`, `ArmoryGroup2` -> `ArmoryGroup`). Whatever fits none of
//! these lands in `Other`.

use crate::dataset::{PropertyGroup, Record};
use crate::value::classify_value;
use crate::{OdfValue, statics};
use indexmap::IndexMap;
use regex::Regex;
use std::sync::OnceLock;

/// One property group as it appears in a cluster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupEntry<'a> {
    pub name: &'a str,
    pub bag: &'a PropertyGroup,
}

/// A tab above the record cards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyTab {
    All,
    Group(String),
}

impl PropertyTab {
    pub fn label(&self) -> &str {
        match self {
            PropertyTab::All => statics::EN_TAB_ALL,
            PropertyTab::Group(name) => name,
        }
    }

    /// Tab for a requested group name; `All` when the request is empty.
    pub fn named(name: &str) -> Self {
        if name.trim().is_empty() || name.eq_ignore_ascii_case(statics::EN_TAB_ALL) {
            PropertyTab::All
        } else {
            PropertyTab::Group(name.to_string())
        }
    }
}

/// Output of [`group_record`]: cluster name -> member groups, in record
/// order within each cluster. `Other`, when present, is always last.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyGroups<'a> {
    groups: IndexMap<String, Vec<GroupEntry<'a>>>,
}

impl<'a> PropertyGroups<'a> {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// A single cluster is rendered without tabs.
    pub fn is_single(&self) -> bool {
        self.groups.len() == 1
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Option<&[GroupEntry<'a>]> {
        self.groups.get(name).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[GroupEntry<'a>])> {
        self.groups.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// `All`, every real cluster, then `Other` if it has members. Empty when
    /// the record has a single cluster.
    pub fn tabs(&self) -> Vec<PropertyTab> {
        if self.is_single() {
            return Vec::new();
        }
        let mut tabs = vec![PropertyTab::All];
        tabs.extend(
            self.groups
                .iter()
                .filter(|(name, _)| name.as_str() != statics::GROUP_OTHER)
                .map(|(name, _)| PropertyTab::Group(name.clone())),
        );
        if self
            .groups
            .get(statics::GROUP_OTHER)
            .is_some_and(|entries| !entries.is_empty())
        {
            tabs.push(PropertyTab::Group(statics::GROUP_OTHER.to_string()));
        }
        tabs
    }

    pub fn has_tab(&self, tab: &PropertyTab) -> bool {
        match tab {
            PropertyTab::All => true,
            PropertyTab::Group(name) => self.groups.contains_key(name),
        }
    }

    /// Entries shown under a tab. `All` concatenates every cluster in order.
    pub fn entries_for(&self, tab: &PropertyTab) -> Vec<GroupEntry<'a>> {
        match tab {
            PropertyTab::All => self.groups.values().flatten().copied().collect(),
            PropertyTab::Group(name) => self.groups.get(name).cloned().unwrap_or_default(),
        }
    }
}

fn numbered_series_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(.+?)(\d+)?$").expect("series pattern is valid"))
}

/// Name with any trailing run of digits removed (never empty for a
/// non-empty name).
fn series_base(name: &str) -> Option<&str> {
    numbered_series_re()
        .captures(name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Cluster a record's property groups (its inheritance chain is not a group
/// and never takes part).
pub fn group_record(record: &Record) -> PropertyGroups<'_> {
    type Indexed<'a> = (usize, GroupEntry<'a>);

    let mut direct: IndexMap<String, Vec<Indexed<'_>>> = IndexMap::new();
    let mut series: IndexMap<&str, Vec<Indexed<'_>>> = IndexMap::new();
    let mut other: Vec<Indexed<'_>> = Vec::new();

    for (idx, (name, bag)) in record.groups.iter().enumerate() {
        let entry = (
            idx,
            GroupEntry {
                name: name.as_str(),
                bag,
            },
        );

        if let Some((prefix, _)) = name.split_once(statics::GROUP_SEPARATOR) {
            direct.entry(prefix.to_string()).or_default().push(entry);
            continue;
        }

        if let Some(stripped) = name.strip_suffix(statics::GROUP_CLASS_SUFFIX)
            && !stripped.is_empty()
        {
            if bag.is_empty() {
                other.push(entry);
            } else {
                direct.entry(stripped.to_string()).or_default().push(entry);
            }
            continue;
        }

        match series_base(name) {
            Some(base) if base.chars().count() >= statics::GROUP_MIN_PATTERN_LEN => {
                series.entry(base).or_default().push(entry);
            }
            _ => other.push(entry),
        }
    }

    for (base, members) in series {
        if members.len() > 1 {
            direct.entry(base.to_string()).or_default().extend(members);
        } else {
            other.extend(members);
        }
    }

    // A literal `Other.*` prefix joins the reserved bucket instead of
    // shadowing it.
    if let Some(members) = direct.shift_remove(statics::GROUP_OTHER) {
        other.extend(members);
    }

    let mut groups: IndexMap<String, Vec<GroupEntry<'_>>> = direct
        .into_iter()
        .map(|(name, members)| (name, in_record_order(members)))
        .collect();

    if !other.is_empty() || groups.is_empty() {
        groups.insert(statics::GROUP_OTHER.to_string(), in_record_order(other));
    }

    PropertyGroups { groups }
}

fn in_record_order<'a>(mut members: Vec<(usize, GroupEntry<'a>)>) -> Vec<GroupEntry<'a>> {
    members.sort_by_key(|(idx, _)| *idx);
    members.into_iter().map(|(_, entry)| entry).collect()
}

/// Rows of a property bag matching a filter term (key or shown value,
/// case-insensitive substring). An empty term keeps every row.
pub fn filter_rows<'a>(bag: &'a PropertyGroup, term: &str) -> Vec<(&'a str, &'a OdfValue)> {
    let term = term.trim().to_lowercase();
    bag.iter()
        .filter(|(key, value)| {
            term.is_empty()
                || key.to_lowercase().contains(&term)
                || classify_value(value).text().to_lowercase().contains(&term)
        })
        .map(|(key, value)| (key.as_str(), value))
        .collect()
}

pub fn visible_row_count(bag: &PropertyGroup, term: &str) -> usize {
    if term.trim().is_empty() {
        return bag.len();
    }
    filter_rows(bag, term).len()
}

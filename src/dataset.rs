use crate::error::{DatasetError, LookupError};
use crate::value::unquote;
use crate::{OdfValue, statics};
use flate2::read::GzDecoder;
use indexmap::IndexMap;
use std::{
    cmp::Ordering,
    fs,
    io::Read,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

/// One property group of a record: property key -> raw value.
pub type PropertyGroup = IndexMap<String, OdfValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    Json,
    GzipJson,
}

/// Everything known about one ODF file within one category.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    pub groups: IndexMap<String, PropertyGroup>,
    pub inheritance_chain: Vec<String>,
    /// `GameObjectClass.unitName` or `WeaponClass.wpnName`, computed once at load.
    pub display_name: Option<String>,
}

impl Record {
    pub fn from_value(filename: &str, value: &OdfValue) -> Self {
        let mut record = Record::default();
        let Some(obj) = value.as_object() else {
            warn!(filename, kind = value.type_name(), "record is not an object");
            return record;
        };

        for (key, v) in obj {
            if key == statics::ODF_INHERITANCE_CHAIN {
                record.inheritance_chain = v
                    .as_array()
                    .unwrap_or_default()
                    .iter()
                    .filter_map(|s| s.as_str().map(str::to_string))
                    .collect();
                continue;
            }
            match v.as_object() {
                Some(group) => {
                    record.groups.insert(key.clone(), group.clone());
                }
                None => debug!(filename, key = %key, "skipping non-object property group"),
            }
        }

        record.display_name = derive_display_name(&record.groups);
        record
    }

    pub fn from_groups(groups: IndexMap<String, PropertyGroup>) -> Self {
        let display_name = derive_display_name(&groups);
        Self {
            groups,
            inheritance_chain: Vec::new(),
            display_name,
        }
    }

    /// Lowercased names a search term is compared against: the filename, the
    /// filename without extension, and the display name when there is one.
    pub fn searchable_names(&self, filename: &str) -> Vec<String> {
        let lower = filename.to_lowercase();
        let mut names = Vec::with_capacity(3);
        names.push(lower.clone());
        if let Some((stem, _)) = lower.rsplit_once('.')
            && !stem.is_empty()
        {
            names.push(stem.to_string());
        }
        if let Some(name) = &self.display_name {
            names.push(name.to_lowercase());
        }
        names
    }

    pub fn title<'a>(&'a self, filename: &'a str) -> &'a str {
        self.display_name.as_deref().unwrap_or(filename)
    }
}

fn derive_display_name(groups: &IndexMap<String, PropertyGroup>) -> Option<String> {
    [
        (statics::ODF_GROUP_GAME_OBJECT, statics::ODF_PROP_UNIT_NAME),
        (statics::ODF_GROUP_WEAPON, statics::ODF_PROP_WEAPON_NAME),
    ]
    .into_iter()
    .find_map(|(group, prop)| {
        groups
            .get(group)
            .and_then(|g| g.get(prop))
            .and_then(|v| v.as_str())
            .map(|s| unquote(s.trim()).trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

/// Case-insensitive ordering in the spirit of a browser's `localeCompare`:
/// letters compare without case first, then lowercase sorts before uppercase.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
        .then_with(|| {
            a.chars()
                .map(char::is_uppercase)
                .cmp(b.chars().map(char::is_uppercase))
        })
        .then_with(|| a.cmp(b))
}

/// Append the conventional `.odf` suffix unless the name already carries it.
pub fn normalize_odf_name(name: &str) -> String {
    let name = name.trim();
    if name.to_ascii_lowercase().ends_with(statics::ODF_EXTENSION) {
        name.to_string()
    } else {
        format!("{name}{}", statics::ODF_EXTENSION)
    }
}

/// Where an audio property value is expected to live: the configured prefix
/// followed by the literal file name from the value.
pub fn audio_resource_path(prefix: &str, value: &str) -> String {
    let file = unquote(value.trim());
    if prefix.is_empty() || prefix.ends_with('/') {
        format!("{prefix}{file}")
    } else {
        format!("{prefix}/{file}")
    }
}

/// Result of checking an audio property against the audio directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioLocation {
    pub path: String,
    pub exists: bool,
}

/// Resolve an audio property value to a path and check that a file is there.
pub fn locate_audio(prefix: &str, value: &str) -> AudioLocation {
    let path = audio_resource_path(prefix, value);
    let exists = Path::new(&path).is_file();
    if exists {
        debug!(path = %path, "audio located");
    } else {
        warn!(path = %path, "audio file not found");
    }
    AudioLocation { path, exists }
}

/// The categorized record collection with its display order precomputed.
///
/// Categories keep the order of the source document. When the same filename
/// appears in several categories, lookups by filename return the first
/// category in that order; the format itself does not define one.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    categories: IndexMap<String, IndexMap<String, Record>>,
    display_order: IndexMap<String, Vec<String>>,
}

impl Dataset {
    pub fn from_value(root: &OdfValue) -> Result<Self, DatasetError> {
        let Some(root) = root.as_object() else {
            return Err(DatasetError::Shape(root.type_name()));
        };

        let mut categories = IndexMap::new();
        for (category, records) in root {
            let Some(records) = records.as_object() else {
                warn!(category = %category, "skipping category that is not an object");
                continue;
            };
            let records: IndexMap<String, Record> = records
                .iter()
                .map(|(filename, v)| (filename.clone(), Record::from_value(filename, v)))
                .collect();
            categories.insert(category.clone(), records);
        }

        Ok(Self::from_categories(categories))
    }

    pub fn from_categories(categories: IndexMap<String, IndexMap<String, Record>>) -> Self {
        let display_order = categories
            .iter()
            .map(|(category, records)| (category.clone(), display_order(records)))
            .collect();
        Self {
            categories,
            display_order,
        }
    }

    pub fn lookup(&self, category: &str, filename: &str) -> Result<&Record, LookupError> {
        let records = self
            .categories
            .get(category)
            .ok_or_else(|| LookupError::UnknownCategory(category.to_string()))?;
        records
            .get(filename)
            .ok_or_else(|| LookupError::NotInCategory {
                category: category.to_string(),
                filename: filename.to_string(),
            })
    }

    /// First category (in source order) holding exactly this filename.
    pub fn find_category_containing(&self, filename: &str) -> Option<&str> {
        self.categories
            .iter()
            .find(|(_, records)| records.contains_key(filename))
            .map(|(category, _)| category.as_str())
    }

    /// Like [`Self::find_category_containing`] but ignores case; returns the
    /// stored spelling of the filename as well.
    pub fn find_ignore_case(&self, filename: &str) -> Option<(&str, &str)> {
        let wanted = filename.to_lowercase();
        self.categories.iter().find_map(|(category, records)| {
            records
                .keys()
                .find(|k| k.to_lowercase() == wanted)
                .map(|k| (category.as_str(), k.as_str()))
        })
    }

    /// Find a record by filename or bare name, ignoring case.
    pub fn locate(&self, name: &str) -> Result<(&str, &str), LookupError> {
        self.find_ignore_case(&normalize_odf_name(name))
            .ok_or_else(|| LookupError::UnknownName(name.trim().to_string()))
    }

    pub fn list_categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.contains_key(category)
    }

    /// Case-insensitive category lookup returning the stored spelling.
    pub fn category_named(&self, name: &str) -> Option<&str> {
        let wanted = name.trim().to_lowercase();
        self.categories
            .keys()
            .find(|k| k.to_lowercase() == wanted)
            .map(String::as_str)
    }

    pub fn record_count(&self) -> usize {
        self.categories.values().map(IndexMap::len).sum()
    }

    /// Filenames of a category in display order.
    pub fn ordered_filenames(&self, category: &str) -> &[String] {
        self.display_order
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Records of a category in display order: named records by display
    /// name, then unnamed records by filename.
    pub fn list_records(&self, category: &str) -> Vec<(&str, &Record)> {
        let Some(records) = self.categories.get(category) else {
            return Vec::new();
        };
        self.ordered_filenames(category)
            .iter()
            .filter_map(|f| records.get(f).map(|r| (f.as_str(), r)))
            .collect()
    }

    /// Resolve a property value that names another record, either by its
    /// full filename or by the bare name without `.odf`.
    pub fn resolve_reference(&self, value: &str) -> Option<(&str, &str)> {
        let name = unquote(value.trim());
        if name.is_empty() || name.contains(char::is_whitespace) {
            return None;
        }
        [name.to_string(), normalize_odf_name(name)]
            .iter()
            .find_map(|candidate| {
                self.categories.iter().find_map(|(category, records)| {
                    records
                        .get_key_value(candidate)
                        .map(|(k, _)| (category.as_str(), k.as_str()))
                })
            })
    }
}

fn display_order(records: &IndexMap<String, Record>) -> Vec<String> {
    let (mut named, mut unnamed): (Vec<_>, Vec<_>) = records
        .iter()
        .partition(|(_, record)| record.display_name.is_some());

    named.sort_by(|(_, a), (_, b)| {
        locale_cmp(
            a.display_name.as_deref().unwrap_or_default(),
            b.display_name.as_deref().unwrap_or_default(),
        )
    });
    unnamed.sort_by(|(a, _), (b, _)| locale_cmp(a, b));

    named
        .into_iter()
        .chain(unnamed)
        .map(|(filename, _)| filename.clone())
        .collect()
}

/// A dataset loaded from disk, remembering where it came from.
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub source_path: Option<PathBuf>,
    pub format: DatasetFormat,
    pub dataset: Dataset,
}

impl LoadedDataset {
    /// Load an already categorized document (`category -> filename -> record`).
    pub fn load_path(path: &Path) -> Result<Self, DatasetError> {
        let (format, root) = read_document(path)?;
        let dataset = Dataset::from_value(&root)?;
        info!(
            path = %path.display(),
            categories = dataset.category_count(),
            records = dataset.record_count(),
            "loaded dataset"
        );
        Ok(Self {
            source_path: Some(path.to_path_buf()),
            format,
            dataset,
        })
    }

    /// Load a flat `filename -> record` dump, normalizing its keys, resolving
    /// inheritance and sorting records into categories first.
    pub fn load_flat_path(path: &Path) -> Result<Self, DatasetError> {
        let (format, root) = read_document(path)?;
        let Some(flat) = root.as_object() else {
            return Err(DatasetError::Shape(root.type_name()));
        };
        let categorized = categorize(&resolve_inheritance(&normalize_flat(flat)));
        let dataset = Dataset::from_value(&categorized)?;
        info!(
            path = %path.display(),
            categories = dataset.category_count(),
            records = dataset.record_count(),
            "loaded and categorized flat dump"
        );
        Ok(Self {
            source_path: Some(path.to_path_buf()),
            format,
            dataset,
        })
    }
}

fn read_document(path: &Path) -> Result<(DatasetFormat, OdfValue), DatasetError> {
    let bytes = fs::read(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let format = detect_format(path, &bytes);
    let text_bytes = match format {
        DatasetFormat::Json => bytes,
        DatasetFormat::GzipJson => {
            let mut decoder = GzDecoder::new(&bytes[..]);
            let mut out = Vec::new();
            decoder.read_to_end(&mut out).map_err(DatasetError::Gzip)?;
            out
        }
    };

    let text = std::str::from_utf8(&text_bytes)?;
    let root = OdfValue::parse_json5(text).map_err(|e| DatasetError::Parse(format!("{e:#}")))?;
    Ok((format, root))
}

fn detect_format(path: &Path, bytes: &[u8]) -> DatasetFormat {
    if path.extension().and_then(|e| e.to_str()) == Some("gz") {
        return DatasetFormat::GzipJson;
    }
    // Gzip magic: 1F 8B
    if bytes.len() >= 2 && bytes[0] == 0x1F && bytes[1] == 0x8B {
        return DatasetFormat::GzipJson;
    }
    DatasetFormat::Json
}

/// Bring a raw flat dump into canonical form: keys lowercased with a `.odf`
/// suffix, string values inside records stripped of surrounding quotes.
/// Keys that collide after lowercasing keep the last record.
pub fn normalize_flat(flat: &IndexMap<String, OdfValue>) -> IndexMap<String, OdfValue> {
    flat.iter()
        .map(|(key, record)| (normalize_flat_key(key), strip_string_quotes(record)))
        .collect()
}

fn normalize_flat_key(key: &str) -> String {
    let mut key = key.to_lowercase();
    if !key.ends_with(statics::ODF_EXTENSION) {
        key.push_str(statics::ODF_EXTENSION);
    }
    key
}

fn strip_string_quotes(value: &OdfValue) -> OdfValue {
    match value {
        OdfValue::String(s) => OdfValue::String(unquote(s).to_string()),
        OdfValue::Object(map) => OdfValue::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), strip_string_quotes(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Sort a flat `filename -> record` map into categories by the property
/// group that identifies each kind of object. Every category is present in
/// the output, even when empty.
pub fn categorize(flat: &IndexMap<String, OdfValue>) -> OdfValue {
    let mut categorized: IndexMap<String, OdfValue> = statics::ODF_CATEGORIES
        .iter()
        .map(|(category, _)| (category.to_string(), OdfValue::Object(IndexMap::new())))
        .collect();

    let mut dropped = 0usize;
    for (filename, record) in flat {
        let category = statics::ODF_CATEGORIES
            .iter()
            .find(|(_, class_key)| record.get(class_key).is_some())
            .map(|(category, _)| *category);
        let Some(category) = category else {
            dropped += 1;
            continue;
        };
        if let Some(bucket) = categorized
            .get_mut(category)
            .and_then(OdfValue::as_object_mut)
        {
            bucket.insert(filename.clone(), record.clone());
        }
    }

    if dropped > 0 {
        debug!(dropped, "records without an identifying class were not categorized");
    }
    OdfValue::Object(categorized)
}

/// Merge every record with its `classLabel` parent chain. Child values win
/// over inherited ones; nested objects merge key by key.
pub fn resolve_inheritance(flat: &IndexMap<String, OdfValue>) -> IndexMap<String, OdfValue> {
    flat.keys()
        .map(|name| {
            let mut visiting = Vec::new();
            let merged = resolve_one(name, flat, &mut visiting);
            (name.clone(), OdfValue::Object(merged))
        })
        .collect()
}

fn resolve_one(
    name: &str,
    flat: &IndexMap<String, OdfValue>,
    visiting: &mut Vec<String>,
) -> IndexMap<String, OdfValue> {
    let mut own = flat
        .get(name)
        .and_then(OdfValue::as_object)
        .cloned()
        .unwrap_or_default();

    if visiting.iter().any(|v| v == name) {
        warn!(name, "inheritance cycle; stopping here");
        return own;
    }
    visiting.push(name.to_string());

    let Some(label) = find_class_label(&own) else {
        own.entry(statics::ODF_INHERITANCE_CHAIN.to_string())
            .or_insert_with(|| OdfValue::Array(Vec::new()));
        return own;
    };

    let parent_name = [label.clone(), label.to_lowercase()]
        .into_iter()
        .map(|l| format!("{l}{}", statics::ODF_EXTENSION))
        .find(|candidate| flat.contains_key(candidate))
        .unwrap_or_default();
    if parent_name.is_empty() {
        let mut chain = chain_of(&own);
        if !chain.contains(&label) {
            chain.push(label);
        }
        own.insert(statics::ODF_INHERITANCE_CHAIN.to_string(), chain_value(chain));
        return own;
    }

    let parent = resolve_one(&parent_name, flat, visiting);
    let parent_chain = chain_of(&parent);
    let mut merged = merge_objects(own, parent);

    let mut chain = vec![label];
    for ancestor in parent_chain {
        if !chain.contains(&ancestor) {
            chain.push(ancestor);
        }
    }
    merged.insert(statics::ODF_INHERITANCE_CHAIN.to_string(), chain_value(chain));
    merged
}

fn find_class_label(obj: &IndexMap<String, OdfValue>) -> Option<String> {
    obj.values().find_map(|group| {
        group
            .get(statics::ODF_PROP_CLASS_LABEL)
            .and_then(OdfValue::as_str)
            .map(|s| unquote(s.trim()).to_string())
            .filter(|s| !s.is_empty())
    })
}

fn chain_of(obj: &IndexMap<String, OdfValue>) -> Vec<String> {
    obj.get(statics::ODF_INHERITANCE_CHAIN)
        .and_then(OdfValue::as_array)
        .unwrap_or_default()
        .iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect()
}

fn chain_value(chain: Vec<String>) -> OdfValue {
    OdfValue::Array(chain.into_iter().map(OdfValue::String).collect())
}

fn merge_objects(
    child: IndexMap<String, OdfValue>,
    parent: IndexMap<String, OdfValue>,
) -> IndexMap<String, OdfValue> {
    let mut result = parent;
    for (key, value) in child {
        match (result.get_mut(&key), value) {
            (Some(OdfValue::Object(inherited)), OdfValue::Object(own)) => {
                let inherited_taken = std::mem::take(inherited);
                *inherited = merge_objects(own, inherited_taken);
            }
            (Some(slot), value) => *slot = value,
            (None, value) => {
                result.insert(key, value);
            }
        }
    }
    result
}

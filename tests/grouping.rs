use indexmap::IndexMap;
use odf_browser::{OdfValue, PropertyGroup, PropertyTab, Record, balance_columns, group_record};
use pretty_assertions::assert_eq;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

fn record(text: &str) -> Result<Record> {
    Ok(Record::from_value("x.odf", &OdfValue::parse_json5(text)?))
}

fn cluster_names(record: &Record) -> Vec<(String, Vec<String>)> {
    group_record(record)
        .iter()
        .map(|(name, entries)| {
            (
                name.to_string(),
                entries.iter().map(|e| e.name.to_string()).collect(),
            )
        })
        .collect()
}

#[test]
fn mixed_record_clusters_by_prefix_suffix_and_series() -> Result<()> {
    let r = record(
        r#"{
          "Ordnance.Render": { "a": 1 },
          "Ordnance.Audio": { "b": 2 },
          "GameObjectClass": { "a": 1 },
          "ArmoryGroup1": { "c": 3 },
          "ArmoryGroup2": { "d": 4 },
          "Lod": {}
        }"#,
    )?;

    assert_eq!(
        cluster_names(&r),
        vec![
            (
                "Ordnance".to_string(),
                vec!["Ordnance.Render".to_string(), "Ordnance.Audio".to_string()]
            ),
            ("GameObject".to_string(), vec!["GameObjectClass".to_string()]),
            (
                "ArmoryGroup".to_string(),
                vec!["ArmoryGroup1".to_string(), "ArmoryGroup2".to_string()]
            ),
            ("Other".to_string(), vec!["Lod".to_string()]),
        ]
    );
    Ok(())
}

#[test]
fn every_group_lands_in_exactly_one_cluster() -> Result<()> {
    let r = record(
        r#"{
          "A.x": {}, "A.y": { "k": 1 }, "CraftClass": { "k": 1 }, "WeaponClass": {},
          "Hardpoint1": {}, "Hardpoint2": {}, "Single7": {}, "Lod": {}, "Class": { "k": 1 }
        }"#,
    )?;
    let grouped = group_record(&r);
    let mut seen: Vec<&str> = grouped
        .iter()
        .flat_map(|(_, entries)| entries.iter().map(|e| e.name))
        .collect();
    seen.sort_unstable();
    let mut expected: Vec<&str> = r.groups.keys().map(String::as_str).collect();
    expected.sort_unstable();
    assert_eq!(seen, expected);
    assert_eq!(grouped.names().last(), Some("Other"));
    Ok(())
}

#[test]
fn regrouping_flattened_clusters_is_stable() -> Result<()> {
    let r = record(
        r#"{
          "Lod": {},
          "Ordnance.Render": { "a": 1 },
          "GameObjectClass": { "a": 1 },
          "Tread1": {},
          "Ordnance.Audio": { "b": 2 },
          "Tread2": {}
        }"#,
    )?;
    let first = cluster_names(&r);

    let flattened: IndexMap<String, PropertyGroup> = group_record(&r)
        .iter()
        .flat_map(|(_, entries)| entries.iter().map(|e| (e.name.to_string(), e.bag.clone())))
        .collect();
    let again = Record::from_groups(flattened);
    assert_eq!(cluster_names(&again), first);
    Ok(())
}

#[test]
fn single_cluster_has_no_tabs() -> Result<()> {
    let r = record(r#"{ "Ordnance.Render": { "a": 1 }, "Ordnance.Audio": {} }"#)?;
    let grouped = group_record(&r);
    assert!(grouped.is_single());
    assert_eq!(grouped.tabs(), Vec::<PropertyTab>::new());
    assert_eq!(grouped.entries_for(&PropertyTab::All).len(), 2);
    Ok(())
}

#[test]
fn balanced_columns_keep_order_and_stay_close() {
    let heights = [228.0, 102.0, 144.0, 480.0, 186.0, 102.0, 144.0, 144.0];
    let cols = balance_columns(heights);

    let mut all: Vec<usize> = cols.left.iter().chain(&cols.right).copied().collect();
    all.sort_unstable();
    assert_eq!(all, (0..heights.len()).collect::<Vec<_>>());
    assert!(cols.left.windows(2).all(|w| w[0] < w[1]));
    assert!(cols.right.windows(2).all(|w| w[0] < w[1]));

    let left: f32 = cols.left.iter().map(|&i| heights[i]).sum();
    let right: f32 = cols.right.iter().map(|&i| heights[i]).sum();
    assert_eq!(left, cols.left_height);
    assert_eq!(right, cols.right_height);
    let tallest = heights.iter().copied().fold(0.0_f32, f32::max);
    assert!(cols.imbalance() <= 1.2 * tallest);
}

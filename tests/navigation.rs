use odf_browser::{
    Browser, BrowserConfig, Dataset, DeepLink, Direction, InterruptAction, ItemRef, OdfValue,
    PropertyTab,
};
use pretty_assertions::assert_eq;
use std::time::{Duration, Instant};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

const SAMPLE: &str = r#"{
  "Vehicle": {
    "avtank.odf": {
      "GameObjectClass": { "unitName": "Tank" },
      "CraftClass": { "rangeScan": "200" },
      "Lod": {},
      "inheritanceChain": ["tank"]
    },
    "svtank.odf": { "GameObjectClass": { "unitName": "Scav Tank" } },
    "foo.odf": {}
  },
  "Weapon": {
    "gminigun.odf": { "WeaponClass": { "wpnName": "Minigun", "ordName": "\"apminigun\"" } }
  }
}"#;

fn browser() -> Result<Browser> {
    let dataset = Dataset::from_value(&OdfValue::parse_json5(SAMPLE)?)?;
    Ok(Browser::new(dataset, &BrowserConfig::default()))
}

fn displayed(b: &Browser) -> Option<ItemRef> {
    b.session().displayed.clone()
}

#[test]
fn starts_on_first_category_with_nothing_selected() -> Result<()> {
    let b = browser()?;
    assert_eq!(b.active_category(), Some("Vehicle"));
    assert_eq!(b.session().selected, None);
    assert!(b.displayed_record().is_none());
    assert!(b.card_layout().is_none());
    Ok(())
}

#[test]
fn default_category_comes_from_config() -> Result<()> {
    let dataset = Dataset::from_value(&OdfValue::parse_json5(SAMPLE)?)?;
    let config = BrowserConfig {
        default_category: Some("weapon".to_string()),
        ..BrowserConfig::default()
    };
    let b = Browser::new(dataset, &config);
    assert_eq!(b.active_category(), Some("Weapon"));
    Ok(())
}

#[test]
fn item_cycling_wraps_in_display_order() -> Result<()> {
    let mut b = browser()?;
    // Named first ("Scav Tank" < "Tank"), then unnamed.
    assert_eq!(
        b.cycle_item(Direction::Next),
        Some(ItemRef::new("Vehicle", "svtank.odf"))
    );
    assert_eq!(displayed(&b), Some(ItemRef::new("Vehicle", "svtank.odf")));
    assert_eq!(
        b.cycle_item(Direction::Previous),
        Some(ItemRef::new("Vehicle", "foo.odf"))
    );
    assert_eq!(
        b.cycle_item(Direction::Next),
        Some(ItemRef::new("Vehicle", "svtank.odf"))
    );
    Ok(())
}

#[test]
fn category_cycling_wraps() -> Result<()> {
    let mut b = browser()?;
    assert_eq!(b.cycle_category(Direction::Previous), Some("Weapon"));
    assert_eq!(b.cycle_category(Direction::Next), Some("Vehicle"));
    assert_eq!(b.cycle_category(Direction::Next), Some("Weapon"));
    Ok(())
}

#[test]
fn exact_search_opens_the_hit_and_switches_tab() -> Result<()> {
    let mut b = browser()?;
    let outcome = b.set_search_term("Minigun");
    assert!(outcome.exact);
    assert_eq!(b.active_category(), Some("Weapon"));
    assert_eq!(displayed(&b), Some(ItemRef::new("Weapon", "gminigun.odf")));
    assert_eq!(b.outcome().visible_in("Vehicle").len(), 0);
    Ok(())
}

#[test]
fn fuzzy_search_highlights_without_opening() -> Result<()> {
    let mut b = browser()?;
    b.set_search_term("svt");
    assert_eq!(
        b.session().selected,
        Some(ItemRef::new("Vehicle", "svtank.odf"))
    );
    assert_eq!(displayed(&b), None);
    Ok(())
}

#[test]
fn cycling_only_walks_visible_items() -> Result<()> {
    let mut b = browser()?;
    b.set_search_term("tank");
    // "tank" is an exact stem/display match for avtank only.
    assert_eq!(b.outcome().visible_in("Vehicle"), ["avtank.odf"]);
    assert_eq!(
        b.cycle_item(Direction::Next),
        Some(ItemRef::new("Vehicle", "avtank.odf"))
    );
    assert_eq!(
        b.cycle_item(Direction::Next),
        Some(ItemRef::new("Vehicle", "avtank.odf"))
    );
    Ok(())
}

#[test]
fn double_interrupt_resets_the_view() -> Result<()> {
    let mut b = browser()?;
    b.cycle_category(Direction::Next);
    b.set_search_term("tank");
    assert_eq!(displayed(&b), Some(ItemRef::new("Vehicle", "avtank.odf")));
    b.set_property_filter("range");

    let t0 = Instant::now();
    assert_eq!(b.interrupt(t0), InterruptAction::ClearFilter);
    assert_eq!(b.session().search_term, "");
    assert_eq!(b.outcome().visible_in("Vehicle").len(), 3);
    assert_eq!(displayed(&b), Some(ItemRef::new("Vehicle", "avtank.odf")));

    assert_eq!(
        b.interrupt(t0 + Duration::from_millis(300)),
        InterruptAction::ResetView
    );
    assert_eq!(displayed(&b), None);
    assert_eq!(b.session().selected, None);
    assert_eq!(b.session().property_filter, "");
    assert_eq!(b.active_category(), Some("Vehicle"));
    Ok(())
}

#[test]
fn slow_interrupts_only_clear_the_filter() -> Result<()> {
    let mut b = browser()?;
    b.select("Vehicle", "foo.odf");
    let t0 = Instant::now();
    assert_eq!(b.interrupt(t0), InterruptAction::ClearFilter);
    assert_eq!(
        b.interrupt(t0 + Duration::from_millis(900)),
        InterruptAction::ClearFilter
    );
    assert_eq!(displayed(&b), Some(ItemRef::new("Vehicle", "foo.odf")));
    Ok(())
}

#[test]
fn deep_link_selects_record_and_group_tab() -> Result<()> {
    let mut b = browser()?;
    assert!(b.apply_deep_link(&DeepLink::parse("?odf=AVTANK&cat=gameobject")));
    assert_eq!(displayed(&b), Some(ItemRef::new("Vehicle", "avtank.odf")));
    assert_eq!(
        b.session().property_tab,
        PropertyTab::Group("GameObject".to_string())
    );

    // Unknown tab falls back to All.
    assert!(b.apply_deep_link(&DeepLink::parse("odf=avtank.odf&cat=Nope")));
    assert_eq!(b.session().property_tab, PropertyTab::All);

    // Unknown record leaves the state alone.
    assert!(!b.apply_deep_link(&DeepLink::parse("odf=missing")));
    assert_eq!(displayed(&b), Some(ItemRef::new("Vehicle", "avtank.odf")));
    Ok(())
}

#[test]
fn property_tabs_cycle_and_cards_balance() -> Result<()> {
    let mut b = browser()?;
    assert!(b.select_by_name("avtank", None));

    let layout = b.card_layout().ok_or("no layout")?;
    let names: Vec<_> = layout.cards.iter().map(|c| c.name).collect();
    assert_eq!(names, ["GameObjectClass", "CraftClass", "Lod"]);
    assert_eq!(layout.columns.left, [0, 2]);
    assert_eq!(layout.columns.right, [1]);

    assert_eq!(
        b.cycle_property_tab(Direction::Next),
        Some(PropertyTab::Group("GameObject".to_string()))
    );
    assert_eq!(
        b.cycle_property_tab(Direction::Previous),
        Some(PropertyTab::All)
    );
    assert_eq!(
        b.cycle_property_tab(Direction::Previous),
        Some(PropertyTab::Group("Other".to_string()))
    );
    let layout = b.card_layout().ok_or("no layout")?;
    assert_eq!(layout.cards.len(), 1);
    Ok(())
}

#[test]
fn references_resolve_to_other_records() -> Result<()> {
    let b = browser()?;
    assert_eq!(
        b.dataset().resolve_reference("\"avtank\""),
        Some(("Vehicle", "avtank.odf"))
    );
    // A value that names no record is plain text.
    assert_eq!(b.dataset().resolve_reference("\"apminigun\""), None);
    Ok(())
}

//! Selection state and keyboard-driven navigation.
//!
//! [`Browser`] owns the dataset, the last search outcome and the session
//! (active category, highlighted and displayed record, property tab, filter
//! terms). Every transition runs to completion; lookup misses are logged and
//! leave the state untouched.

use crate::config::{BrowserConfig, DeepLink};
use crate::dataset::{Dataset, Record};
use crate::grouping::{GroupEntry, PropertyGroups, PropertyTab, group_record, visible_row_count};
use crate::layout::{Columns, balance_rows};
use crate::search::{ItemRef, SearchIndex, SearchOutcome};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

/// Step `len` positions cyclically from `current`. With no current position,
/// `Next` lands on the first slot and `Previous` on the last.
fn wrap_step(current: Option<usize>, len: usize, direction: Direction) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(match (current, direction) {
        (None, Direction::Next) => 0,
        (None, Direction::Previous) => len - 1,
        (Some(i), Direction::Next) => (i + 1) % len,
        (Some(i), Direction::Previous) => (i + len - 1) % len,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptAction {
    /// Empty the search term and show every item again.
    ClearFilter,
    /// Clear the term, drop the selection and return to the default category.
    ResetView,
}

/// Escape handling: a second press inside the window escalates to a reset.
/// After escalating the window starts over.
#[derive(Debug, Clone)]
pub struct Interrupts {
    window: Duration,
    last: Option<Instant>,
}

impl Interrupts {
    pub fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    pub fn press(&mut self, now: Instant) -> InterruptAction {
        let escalate = self
            .last
            .is_some_and(|prev| now.saturating_duration_since(prev) <= self.window);
        if escalate {
            self.last = None;
            InterruptAction::ResetView
        } else {
            self.last = Some(now);
            InterruptAction::ClearFilter
        }
    }
}

/// Holds back a value until no newer one has arrived for `delay`.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Replace any pending value and restart the delay. A delay too large to
    /// represent fires on the next poll.
    pub fn push(&mut self, value: T, now: Instant) {
        let deadline = now.checked_add(self.delay).unwrap_or(now);
        self.pending = Some((value, deadline));
    }

    /// The pending value, once its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let ready = self
            .pending
            .as_ref()
            .is_some_and(|(_, deadline)| now >= *deadline);
        if ready {
            self.pending.take().map(|(value, _)| value)
        } else {
            None
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

/// Transient UI state, reset by [`Browser::reset_view`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub active_category: Option<String>,
    /// Highlighted list item.
    pub selected: Option<ItemRef>,
    /// Record shown in the content pane.
    pub displayed: Option<ItemRef>,
    pub property_tab: PropertyTab,
    pub search_term: String,
    pub property_filter: String,
}

impl Session {
    fn new(active_category: Option<String>) -> Self {
        Self {
            active_category,
            selected: None,
            displayed: None,
            property_tab: PropertyTab::All,
            search_term: String::new(),
            property_filter: String::new(),
        }
    }
}

/// Cards for the displayed record under the current tab and filter, split
/// into two columns.
#[derive(Debug, Clone)]
pub struct CardLayout<'a> {
    pub cards: Vec<GroupEntry<'a>>,
    pub columns: Columns,
}

#[derive(Debug, Clone)]
pub struct Browser {
    dataset: Dataset,
    search_index: SearchIndex,
    outcome: SearchOutcome,
    session: Session,
    interrupts: Interrupts,
    default_category: Option<String>,
}

impl Browser {
    pub fn new(dataset: Dataset, config: &BrowserConfig) -> Self {
        let default_category = config
            .default_category
            .as_deref()
            .and_then(|c| dataset.category_named(c))
            .or_else(|| dataset.list_categories().next())
            .map(str::to_string);
        let search_index = SearchIndex::new(&dataset);
        let outcome = search_index.show_all();
        Self {
            dataset,
            search_index,
            outcome,
            session: Session::new(default_category.clone()),
            interrupts: Interrupts::new(config.escape_window()),
            default_category,
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn outcome(&self) -> &SearchOutcome {
        &self.outcome
    }

    pub fn active_category(&self) -> Option<&str> {
        self.session.active_category.as_deref()
    }

    /// Run a search for `term` and apply its outcome: switch tabs, highlight
    /// the first hit, and open it when the hit was exact.
    pub fn set_search_term(&mut self, term: &str) -> &SearchOutcome {
        self.session.search_term = term.to_string();
        self.outcome = self
            .search_index
            .search(term, self.session.active_category.as_deref());

        if let Some(category) = &self.outcome.activate_category {
            self.session.active_category = Some(category.clone());
        }
        if let Some(auto) = &self.outcome.auto_select {
            self.session.selected = Some(auto.item.clone());
            if auto.display {
                self.session.displayed = Some(auto.item.clone());
                self.session.property_tab = PropertyTab::All;
                info!(
                    category = %auto.item.category,
                    filename = %auto.item.filename,
                    "exact match opened"
                );
            }
        }
        &self.outcome
    }

    /// Select and display a record (a click on a list item).
    pub fn select(&mut self, category: &str, filename: &str) -> bool {
        if let Err(e) = self.dataset.lookup(category, filename) {
            warn!("select: {e}");
            return false;
        }
        let item = ItemRef::new(category, filename);
        self.session.active_category = Some(item.category.clone());
        self.session.selected = Some(item.clone());
        self.session.displayed = Some(item);
        self.session.property_tab = PropertyTab::All;
        info!(category, filename, "selected");
        true
    }

    /// Select a record by filename or bare name in any category, then try to
    /// open the requested property tab (falling back to `All`).
    pub fn select_by_name(&mut self, name: &str, target_group: Option<&str>) -> bool {
        let (category, filename) = match self.dataset.locate(name) {
            Ok((c, f)) => (c.to_string(), f.to_string()),
            Err(e) => {
                warn!("select_by_name: {e}");
                return false;
            }
        };

        if !self.select(&category, &filename) {
            return false;
        }

        if let Some(wanted) = target_group.map(str::trim) {
            let tab = self
                .property_groups()
                .and_then(|groups| {
                    let name = groups
                        .names()
                        .find(|g| g.eq_ignore_ascii_case(wanted))?
                        .to_string();
                    (!groups.is_single()).then_some(PropertyTab::Group(name))
                })
                .unwrap_or(PropertyTab::All);
            if tab == PropertyTab::All && !wanted.is_empty() {
                debug!(wanted, "property tab not present; showing All");
            }
            self.session.property_tab = tab;
        }
        true
    }

    pub fn apply_deep_link(&mut self, link: &DeepLink) -> bool {
        match &link.odf {
            Some(odf) => self.select_by_name(odf, link.cat.as_deref()),
            None => false,
        }
    }

    /// Move to the neighbouring category tab, wrapping. Search results are
    /// reused as they are.
    pub fn cycle_category(&mut self, direction: Direction) -> Option<&str> {
        let categories: Vec<&str> = self.dataset.list_categories().collect();
        let current = self
            .session
            .active_category
            .as_deref()
            .and_then(|active| categories.iter().position(|c| *c == active));
        let next = wrap_step(current, categories.len(), direction)?;
        self.session.active_category = Some(categories[next].to_string());
        self.session.active_category.as_deref()
    }

    /// Move the selection to the neighbouring visible item in the active
    /// category, wrapping, and display it.
    pub fn cycle_item(&mut self, direction: Direction) -> Option<ItemRef> {
        let category = self.session.active_category.clone()?;
        let visible = self.outcome.visible_in(&category);
        let current = self
            .session
            .selected
            .as_ref()
            .filter(|s| s.category == category)
            .and_then(|s| visible.iter().position(|f| *f == s.filename));
        let next = wrap_step(current, visible.len(), direction)?;
        let filename = visible[next].clone();
        self.select(&category, &filename);
        self.session.selected.clone()
    }

    /// Move across `All`, each cluster and `Other`, wrapping. No-op when the
    /// displayed record has a single cluster.
    pub fn cycle_property_tab(&mut self, direction: Direction) -> Option<PropertyTab> {
        let tabs = self.property_groups()?.tabs();
        let current = tabs.iter().position(|t| *t == self.session.property_tab);
        let next = wrap_step(current, tabs.len(), direction)?;
        let tab = tabs[next].clone();
        self.session.property_tab = tab.clone();
        Some(tab)
    }

    pub fn set_property_tab(&mut self, tab: PropertyTab) {
        let exists = self
            .property_groups()
            .is_some_and(|groups| groups.has_tab(&tab));
        self.session.property_tab = if exists { tab } else { PropertyTab::All };
    }

    pub fn set_property_filter(&mut self, term: &str) {
        self.session.property_filter = term.to_string();
    }

    pub fn set_active_category(&mut self, category: &str) -> bool {
        if !self.dataset.has_category(category) {
            warn!(category, "no such category");
            return false;
        }
        self.session.active_category = Some(category.to_string());
        true
    }

    /// Escape key. Returns which action ran.
    pub fn interrupt(&mut self, now: Instant) -> InterruptAction {
        let action = self.interrupts.press(now);
        match action {
            InterruptAction::ClearFilter => self.clear_filter(),
            InterruptAction::ResetView => self.reset_view(),
        }
        action
    }

    pub fn clear_filter(&mut self) {
        self.session.search_term.clear();
        self.outcome = self.search_index.show_all();
    }

    pub fn reset_view(&mut self) {
        self.clear_filter();
        self.session = Session::new(self.default_category.clone());
        info!("view reset");
    }

    pub fn displayed_record(&self) -> Option<(&ItemRef, &Record)> {
        let item = self.session.displayed.as_ref()?;
        let record = self.dataset.lookup(&item.category, &item.filename).ok()?;
        Some((item, record))
    }

    pub fn property_groups(&self) -> Option<PropertyGroups<'_>> {
        self.displayed_record()
            .map(|(_, record)| group_record(record))
    }

    /// Cards of the current tab, balanced by their visible row counts.
    pub fn card_layout(&self) -> Option<CardLayout<'_>> {
        let groups = self.property_groups()?;
        let cards = groups.entries_for(&self.session.property_tab);
        let filter = self.session.property_filter.as_str();
        let columns = balance_rows(cards.iter().map(|c| visible_row_count(c.bag, filter)));
        Some(CardLayout { cards, columns })
    }
}

#[cfg(test)]
mod tests {
    use super::{Debouncer, Direction, InterruptAction, Interrupts, wrap_step};
    use std::time::{Duration, Instant};

    #[test]
    fn wrap_step_cycles_both_ways() {
        assert_eq!(wrap_step(Some(2), 3, Direction::Next), Some(0));
        assert_eq!(wrap_step(Some(0), 3, Direction::Previous), Some(2));
        assert_eq!(wrap_step(None, 3, Direction::Next), Some(0));
        assert_eq!(wrap_step(None, 3, Direction::Previous), Some(2));
        assert_eq!(wrap_step(None, 0, Direction::Next), None);
    }

    #[test]
    fn interrupts_escalate_inside_window() {
        let t0 = Instant::now();
        let mut esc = Interrupts::new(Duration::from_millis(750));
        assert_eq!(esc.press(t0), InterruptAction::ClearFilter);
        assert_eq!(
            esc.press(t0 + Duration::from_millis(400)),
            InterruptAction::ResetView
        );
        // The window restarts after a reset.
        assert_eq!(
            esc.press(t0 + Duration::from_millis(500)),
            InterruptAction::ClearFilter
        );
    }

    #[test]
    fn interrupts_outside_window_stay_weak() {
        let t0 = Instant::now();
        let mut esc = Interrupts::new(Duration::from_millis(750));
        assert_eq!(esc.press(t0), InterruptAction::ClearFilter);
        assert_eq!(
            esc.press(t0 + Duration::from_millis(751)),
            InterruptAction::ClearFilter
        );
    }

    #[test]
    fn debouncer_only_yields_latest_after_delay() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(Duration::from_millis(300));
        d.push("a", t0);
        d.push("ab", t0 + Duration::from_millis(100));
        assert_eq!(d.poll(t0 + Duration::from_millis(350)), None);
        assert_eq!(d.deadline(), Some(t0 + Duration::from_millis(400)));
        assert_eq!(d.poll(t0 + Duration::from_millis(400)), Some("ab"));
        assert_eq!(d.poll(t0 + Duration::from_millis(900)), None);

        d.push("x", t0);
        d.cancel();
        assert_eq!(d.poll(t0 + Duration::from_secs(5)), None);
    }

    #[test]
    fn debouncer_with_unrepresentable_delay_fires_at_once() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(Duration::MAX);
        d.push("late", t0);
        assert_eq!(d.deadline(), Some(t0));
        assert_eq!(d.poll(t0), Some("late"));
    }
}

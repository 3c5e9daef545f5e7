use crate::dataset::{AudioLocation, locate_audio};
use crate::grouping::{GroupEntry, PropertyTab, filter_rows};
use crate::nav::{Debouncer, Direction, InterruptAction};
use crate::search::ItemRef;
use crate::{
    Browser, BrowserConfig, Dataset, DatasetFormat, DeepLink, LoadedDataset, PropertyDisplay,
    classify_value, statics,
};
use eframe::egui;
use egui_extras::{Column, TableBuilder};
use std::{
    path::{Path, PathBuf},
    time::Instant,
};
use tracing::warn;

/// What the binary hands to the window on startup.
#[derive(Debug, Default)]
pub struct Startup {
    pub dataset: Option<LoadedDataset>,
    pub load_error: Option<String>,
    pub config: BrowserConfig,
    pub link: DeepLink,
}

pub fn run_gui(startup: Startup) -> eframe::Result {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1280.0, 900.0]),
        ..Default::default()
    };
    let title = format!("{} {}", statics::EN_APP_TITLE, env!("CARGO_PKG_VERSION"));
    eframe::run_native(
        &title,
        options,
        Box::new(|_cc| Ok(Box::new(OdfApp::new(startup)))),
    )
}

/// Clicks collected while panels borrow the browser, applied after drawing.
#[derive(Debug, Clone)]
enum UiAction {
    SelectItem(ItemRef),
    ActivateCategory(String),
    FollowReference(String),
    PropertyTab(PropertyTab),
    LocateAudio(AudioRow),
}

/// Identifies the card row an audio lookup was started from.
#[derive(Debug, Clone, PartialEq, Eq)]
struct AudioRow {
    group: String,
    key: String,
    value: String,
}

/// Window state around a [`Browser`]: text inputs, their debouncers and
/// transient notices.
struct OdfApp {
    browser: Option<Browser>,
    source_path: Option<PathBuf>,
    format: Option<DatasetFormat>,
    config: BrowserConfig,
    pending_link: DeepLink,
    dialog_dir: Option<PathBuf>,

    search_input: String,
    search_debounce: Debouncer<String>,
    search_request_focus: bool,
    filter_input: String,
    filter_debounce: Debouncer<String>,
    scroll_items_to_selected: bool,

    audio_notice: Option<(AudioRow, AudioLocation)>,
    status: String,
    last_error: Option<String>,
    about_open: bool,
    theme_dark: bool,
}

impl OdfApp {
    fn new(startup: Startup) -> Self {
        let mut app = Self {
            browser: None,
            source_path: None,
            format: None,
            search_debounce: Debouncer::new(startup.config.search_debounce()),
            filter_debounce: Debouncer::new(startup.config.filter_debounce()),
            config: startup.config,
            pending_link: startup.link,
            dialog_dir: None,
            search_input: String::new(),
            search_request_focus: true,
            filter_input: String::new(),
            scroll_items_to_selected: false,
            audio_notice: None,
            status: String::new(),
            last_error: startup.load_error,
            about_open: false,
            theme_dark: true,
        };
        if let Some(loaded) = startup.dataset {
            app.install(loaded);
        }
        app
    }

    /// Replace the current dataset and start over from the default view.
    fn install(&mut self, loaded: LoadedDataset) {
        let mut browser = Browser::new(loaded.dataset, &self.config);
        if !self.pending_link.is_empty() {
            if browser.apply_deep_link(&self.pending_link) {
                self.scroll_items_to_selected = true;
            }
            self.pending_link = DeepLink::default();
        }
        self.status = match &loaded.source_path {
            Some(p) => format!("Loaded {}", p.display()),
            None => String::new(),
        };
        self.dialog_dir = loaded
            .source_path
            .as_deref()
            .and_then(Path::parent)
            .map(PathBuf::from);
        self.source_path = loaded.source_path;
        self.format = Some(loaded.format);
        self.browser = Some(browser);
        self.clear_inputs();
        self.last_error = None;
    }

    fn clear_inputs(&mut self) {
        self.search_input.clear();
        self.search_debounce.cancel();
        self.filter_input.clear();
        self.filter_debounce.cancel();
        self.audio_notice = None;
    }

    fn file_dialog(&self) -> rfd::FileDialog {
        let mut dlg = rfd::FileDialog::new().add_filter("ODF dataset", &["json", "json5", "gz"]);
        if let Some(dir) = self.dialog_dir.clone() {
            dlg = dlg.set_directory(dir);
        }
        dlg
    }

    fn open_file(&mut self, flat: bool) {
        let Some(path) = self.file_dialog().pick_file() else {
            return;
        };
        let loaded = if flat {
            LoadedDataset::load_flat_path(&path)
        } else {
            LoadedDataset::load_path(&path)
        };
        match loaded {
            Ok(loaded) => self.install(loaded),
            Err(e) => {
                let e = anyhow::Error::new(e);
                warn!("Failed to load {}: {e:#}", path.display());
                self.last_error = Some(format!("Failed to load: {e:#}"));
            }
        }
    }

    fn locate_audio(&mut self, row: AudioRow) {
        let location = locate_audio(&self.config.audio_prefix, &row.value);
        self.audio_notice = Some((row, location));
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context, browser: &mut Browser) {
        let now = Instant::now();

        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            match browser.interrupt(now) {
                InterruptAction::ClearFilter => {
                    self.search_input.clear();
                    self.search_debounce.cancel();
                }
                InterruptAction::ResetView => {
                    self.clear_inputs();
                    self.search_request_focus = true;
                }
            }
        }

        // Ctrl+arrows would otherwise move the cursor by words in the text boxes.
        let mut tab_step = None;
        ctx.input_mut(|i| {
            if i.consume_key(egui::Modifiers::CTRL, egui::Key::ArrowLeft) {
                tab_step = Some(Direction::Previous);
            }
            if i.consume_key(egui::Modifiers::CTRL, egui::Key::ArrowRight) {
                tab_step = Some(Direction::Next);
            }
        });
        if let Some(dir) = tab_step {
            browser.cycle_property_tab(dir);
        }

        if ctx.input(|i| i.modifiers.alt && i.key_pressed(egui::Key::ArrowLeft)) {
            browser.cycle_category(Direction::Previous);
        }
        if ctx.input(|i| i.modifiers.alt && i.key_pressed(egui::Key::ArrowRight)) {
            browser.cycle_category(Direction::Next);
        }

        if ctx.input(|i| i.modifiers.is_none() && i.key_pressed(egui::Key::ArrowUp))
            && browser.cycle_item(Direction::Previous).is_some()
        {
            self.scroll_items_to_selected = true;
        }
        if ctx.input(|i| i.modifiers.is_none() && i.key_pressed(egui::Key::ArrowDown))
            && browser.cycle_item(Direction::Next).is_some()
        {
            self.scroll_items_to_selected = true;
        }
    }

    fn apply_debounced(&mut self, ctx: &egui::Context, browser: &mut Browser) {
        let now = Instant::now();
        if let Some(term) = self.search_debounce.poll(now) {
            let outcome = browser.set_search_term(&term);
            if outcome.auto_select.is_some() {
                self.scroll_items_to_selected = true;
            }
        }
        if let Some(term) = self.filter_debounce.poll(now) {
            browser.set_property_filter(&term);
        }

        let next_deadline = [self.search_debounce.deadline(), self.filter_debounce.deadline()]
            .into_iter()
            .flatten()
            .min();
        if let Some(deadline) = next_deadline {
            ctx.request_repaint_after(deadline.saturating_duration_since(now));
        }
    }

    fn apply_action(&mut self, browser: &mut Browser, action: UiAction) {
        match action {
            UiAction::SelectItem(item) => {
                browser.select(&item.category, &item.filename);
                self.audio_notice = None;
            }
            UiAction::ActivateCategory(category) => {
                browser.set_active_category(&category);
            }
            UiAction::FollowReference(name) => {
                if browser.select_by_name(&name, None) {
                    self.scroll_items_to_selected = true;
                    self.audio_notice = None;
                } else {
                    self.last_error = Some(format!("No ODF named {name:?}"));
                }
            }
            UiAction::PropertyTab(tab) => browser.set_property_tab(tab),
            UiAction::LocateAudio(row) => self.locate_audio(row),
        }
    }

    fn selectable_row_left(
        ui: &mut egui::Ui,
        selected: bool,
        text: &str,
        row_h: f32,
    ) -> egui::Response {
        let w = ui.available_width();
        let (rect, response) = ui.allocate_exact_size(egui::vec2(w, row_h), egui::Sense::click());
        let response = response.on_hover_cursor(egui::CursorIcon::PointingHand);

        let visuals = ui.style().interact_selectable(&response, selected);
        if ui.is_rect_visible(rect) {
            ui.painter()
                .rect_filled(rect, visuals.corner_radius, visuals.bg_fill);
            let font_id = egui::TextStyle::Button.resolve(ui.style());
            ui.painter().text(
                rect.left_center() + egui::vec2(6.0, 0.0),
                egui::Align2::LEFT_CENTER,
                text,
                font_id,
                visuals.text_color(),
            );
        }
        response
    }

    fn render_items_panel(
        &mut self,
        ui: &mut egui::Ui,
        browser: &Browser,
        actions: &mut Vec<UiAction>,
    ) {
        let resp = ui.add(
            egui::TextEdit::singleline(&mut self.search_input)
                .hint_text(statics::EN_HINT_SEARCH)
                .desired_width(f32::INFINITY),
        );
        if self.search_request_focus {
            resp.request_focus();
            self.search_request_focus = false;
        }
        if resp.changed() {
            self.search_debounce
                .push(self.search_input.clone(), Instant::now());
        }
        ui.separator();

        let outcome = browser.outcome();
        let dataset = browser.dataset();
        let active = browser.active_category();

        ui.horizontal_wrapped(|ui| {
            for category in dataset.list_categories() {
                let selected = active == Some(category);
                if ui
                    .selectable_label(selected, outcome.tab_label(category))
                    .clicked()
                    && !selected
                {
                    actions.push(UiAction::ActivateCategory(category.to_string()));
                }
            }
        });
        ui.separator();

        let Some(category) = active else {
            return;
        };
        if outcome.shows_no_matches(category) {
            ui.label(statics::EN_SEARCH_NO_MATCHES);
            return;
        }

        let selected = browser.session().selected.as_ref();
        let row_h = ui.text_style_height(&egui::TextStyle::Body) + 4.0;
        ui.push_id("items_scroll", |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    for filename in outcome.visible_in(category) {
                        let Ok(record) = dataset.lookup(category, filename) else {
                            continue;
                        };
                        let is_selected = selected
                            .is_some_and(|s| s.category == category && s.filename == *filename);
                        let resp = Self::selectable_row_left(
                            ui,
                            is_selected,
                            record.title(filename),
                            row_h,
                        )
                        .on_hover_text(filename.as_str());
                        if is_selected && self.scroll_items_to_selected {
                            resp.scroll_to_me(Some(egui::Align::Center));
                            self.scroll_items_to_selected = false;
                        }
                        if resp.clicked() {
                            actions.push(UiAction::SelectItem(ItemRef::new(category, filename)));
                        }
                    }
                });
        });
    }

    fn render_record(&mut self, ui: &mut egui::Ui, browser: &Browser, actions: &mut Vec<UiAction>) {
        let Some((item, record)) = browser.displayed_record() else {
            ui.label(statics::EN_PLACEHOLDER_SELECT);
            return;
        };
        let dataset = browser.dataset();

        ui.horizontal(|ui| {
            ui.heading(record.title(&item.filename));
            ui.separator();
            ui.monospace(&item.filename);
            ui.separator();
            ui.label(&item.category);
        });
        if !record.inheritance_chain.is_empty() {
            ui.horizontal_wrapped(|ui| {
                ui.label(statics::EN_PREFIX_INHERITS);
                for (i, parent) in record.inheritance_chain.iter().enumerate() {
                    if i > 0 {
                        ui.label(statics::EN_INHERIT_SEPARATOR);
                    }
                    if dataset.resolve_reference(parent).is_some() {
                        if ui.link(parent).clicked() {
                            actions.push(UiAction::FollowReference(parent.clone()));
                        }
                    } else {
                        ui.label(parent);
                    }
                }
            });
        }
        ui.separator();

        if let Some(groups) = browser.property_groups() {
            let tabs = groups.tabs();
            if !tabs.is_empty() {
                let current = &browser.session().property_tab;
                ui.horizontal_wrapped(|ui| {
                    for tab in tabs {
                        if ui.selectable_label(*current == tab, tab.label()).clicked() {
                            actions.push(UiAction::PropertyTab(tab.clone()));
                        }
                    }
                });
            }
        }

        let resp = ui.add(
            egui::TextEdit::singleline(&mut self.filter_input)
                .hint_text(statics::EN_HINT_FILTER_PROPERTIES),
        );
        if resp.changed() {
            self.filter_debounce
                .push(self.filter_input.clone(), Instant::now());
        }

        ui.separator();

        let Some(layout) = browser.card_layout() else {
            return;
        };
        let filter = browser.session().property_filter.as_str();
        let notice = self.audio_notice.as_ref();
        ui.push_id("cards_scroll", |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    ui.columns(2, |cols| {
                        let sides = [&layout.columns.left, &layout.columns.right];
                        for (col, indices) in cols.iter_mut().zip(sides) {
                            for &idx in indices {
                                if let Some(card) = layout.cards.get(idx) {
                                    render_card(col, idx, *card, filter, notice, dataset, actions);
                                }
                            }
                        }
                    });
                });
        });
    }
}

fn render_card(
    ui: &mut egui::Ui,
    idx: usize,
    card: GroupEntry<'_>,
    filter: &str,
    notice: Option<&(AudioRow, AudioLocation)>,
    dataset: &Dataset,
    actions: &mut Vec<UiAction>,
) {
    let rows = filter_rows(card.bag, filter);
    ui.push_id(("card", idx), |ui| {
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.strong(card.name);
            if rows.is_empty() {
                return;
            }
            let row_h = ui.text_style_height(&egui::TextStyle::Body) + 6.0;
            TableBuilder::new(ui)
                .striped(true)
                .vscroll(false)
                .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
                .column(Column::initial(180.0).resizable(true))
                .column(Column::remainder())
                .header(row_h, |mut header| {
                    header.col(|ui| {
                        ui.strong(statics::EN_COL_PROPERTY);
                    });
                    header.col(|ui| {
                        ui.strong(statics::EN_COL_VALUE);
                    });
                })
                .body(|mut body| {
                    for (key, value) in rows {
                        let shown = classify_value(value);
                        let lines = match &shown {
                            PropertyDisplay::Structured(text) => text.lines().count().max(1),
                            _ => 1,
                        };
                        body.row(row_h * lines as f32, |mut row| {
                            row.col(|ui| {
                                ui.monospace(key);
                            });
                            row.col(|ui| match shown {
                                PropertyDisplay::Audio(file) => {
                                    let here = AudioRow {
                                        group: card.name.to_string(),
                                        key: key.to_string(),
                                        value: file,
                                    };
                                    let location = notice
                                        .filter(|(origin, _)| *origin == here)
                                        .map(|(_, location)| location);
                                    render_audio(ui, here, location, actions);
                                }
                                shown => render_value(ui, shown, dataset, actions),
                            });
                        });
                    }
                });
        });
    });
    ui.add_space(6.0);
}

fn render_value(
    ui: &mut egui::Ui,
    shown: PropertyDisplay,
    dataset: &Dataset,
    actions: &mut Vec<UiAction>,
) {
    match shown {
        PropertyDisplay::Text(text) => {
            if dataset.resolve_reference(&text).is_some() {
                if ui.link(&text).clicked() {
                    actions.push(UiAction::FollowReference(text));
                }
            } else {
                ui.label(text);
            }
        }
        PropertyDisplay::Number { value, unit } => {
            ui.monospace(value);
            if let Some(unit) = unit {
                ui.weak(unit);
            }
        }
        PropertyDisplay::Audio(file) => {
            ui.label(file);
        }
        PropertyDisplay::Structured(text) => {
            ui.monospace(text);
        }
    }
}

/// Audio cell: the file name, a button that checks the audio directory and
/// the outcome of the last check when it came from this row.
fn render_audio(
    ui: &mut egui::Ui,
    row: AudioRow,
    location: Option<&AudioLocation>,
    actions: &mut Vec<UiAction>,
) {
    ui.label(&row.value);
    match location {
        Some(found) if found.exists => {
            ui.weak(format!("{} {}", statics::EN_AUDIO_FOUND, found.path));
        }
        Some(missing) => {
            ui.colored_label(
                egui::Color32::RED,
                format!("{} {}", statics::EN_ERR_AUDIO_MISSING, missing.path),
            );
        }
        None => {
            if ui.small_button(statics::EN_BTN_LOCATE).clicked() {
                actions.push(UiAction::LocateAudio(row));
            }
        }
    }
}

impl eframe::App for OdfApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            egui::MenuBar::new().ui(ui, |ui| {
                if ui.button(statics::EN_BTN_OPEN).clicked() {
                    self.open_file(false);
                }
                if ui.button(statics::EN_BTN_OPEN_FLAT).clicked() {
                    self.open_file(true);
                }

                let has_data = self.browser.is_some();
                if ui
                    .add_enabled(has_data, egui::Button::new(statics::EN_BTN_CLEAR))
                    .clicked()
                    && let Some(browser) = self.browser.as_mut()
                {
                    browser.clear_filter();
                    self.search_input.clear();
                    self.search_debounce.cancel();
                }
                if ui
                    .add_enabled(has_data, egui::Button::new(statics::EN_BTN_RESET))
                    .clicked()
                    && let Some(browser) = self.browser.as_mut()
                {
                    browser.reset_view();
                    self.clear_inputs();
                }

                if ui.button(statics::EN_BTN_ABOUT).clicked() {
                    self.about_open = true;
                }
                if ui.button(statics::EN_BTN_TOGGLE_THEME).clicked() {
                    self.theme_dark = !self.theme_dark;
                    if self.theme_dark {
                        ctx.set_visuals(egui::Visuals::dark());
                    } else {
                        ctx.set_visuals(egui::Visuals::light());
                    }
                }

                if !self.status.is_empty() {
                    ui.separator();
                    ui.label(&self.status);
                }
            });
        });

        if self.about_open {
            let mut open = self.about_open;
            egui::Window::new(statics::EN_WINDOW_ABOUT)
                .collapsible(false)
                .open(&mut open)
                .show(ctx, |ui| {
                    ui.heading(statics::EN_APP_TITLE);
                    ui.label(format!(
                        "{} {}",
                        statics::EN_ABOUT_VERSION,
                        env!("CARGO_PKG_VERSION")
                    ));
                    ui.separator();
                    ui.label(statics::EN_ABOUT_SHORTCUTS);
                    ui.label(statics::EN_ABOUT_SHORTCUT_ESC);
                    ui.label(statics::EN_ABOUT_SHORTCUT_ITEM);
                    ui.label(statics::EN_ABOUT_SHORTCUT_CATEGORY);
                    ui.label(statics::EN_ABOUT_SHORTCUT_TAB);
                });
            self.about_open = open;
        }

        if let Some(err) = self.last_error.clone() {
            egui::TopBottomPanel::top("error_bar").show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.colored_label(egui::Color32::RED, err);
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.small_button(statics::EN_BTN_CLEAR).clicked() {
                            self.last_error = None;
                        }
                    });
                });
            });
        }

        let Some(mut browser) = self.browser.take() else {
            egui::CentralPanel::default().show(ctx, |ui| {
                ui.heading(statics::EN_HOME_HEADING);
                ui.label(statics::EN_HOME_INSTRUCTIONS);
            });
            return;
        };

        self.handle_shortcuts(ctx, &mut browser);
        self.apply_debounced(ctx, &mut browser);

        egui::TopBottomPanel::bottom("bottom_status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let file_label = self
                    .source_path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                ui.label(file_label);
                if let Some(format) = self.format {
                    ui.separator();
                    ui.label(format!("format: {format:?}"));
                }
                ui.separator();
                ui.label(format!(
                    "categories: {}",
                    browser.dataset().category_count()
                ));
                ui.separator();
                ui.label(format!("records: {}", browser.dataset().record_count()));
            });
        });

        let mut actions = Vec::new();

        egui::SidePanel::left("items_panel")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                self.render_items_panel(ui, &browser, &mut actions);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_record(ui, &browser, &mut actions);
        });

        for action in actions {
            self.apply_action(&mut browser, action);
        }
        self.browser = Some(browser);
    }
}

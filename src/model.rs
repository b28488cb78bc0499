use ratatui::crossterm::event::KeyEvent;
use std::time::Instant;
use tracing::{debug, info, trace};

use crate::domain::{CMDMode, HELP_TEXT, JVConfig, Message};
use crate::filter::{FilterMode, FilterState};
use crate::inputter::{InputResult, Inputter};
use crate::pager::Pager;
use crate::sort::{SortDirection, SortState};
use crate::source::LoadState;
use crate::table::Record;
use crate::ui::{BORDER_WIDTH, COLUMN_WIDTH_MARGIN};
use crate::view::{DerivedView, derive_view};

#[derive(Debug, PartialEq)]
pub enum Status {
    Loading,
    Ready,
    Failed,
    Quitting,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modus {
    Table,
    Popup,
    CmdInput,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HeaderView {
    pub name: String,
    pub width: usize,
    pub operator: String,
    pub filter: String,
    pub sort_arrow: Option<&'static str>,
}

pub struct UIData {
    pub name: String,
    pub error: Option<String>,
    pub loading: bool,
    pub headers: Vec<HeaderView>,
    pub rows: Vec<Vec<String>>,
    pub selected_column: usize,
    pub filter_mode: FilterMode,
    pub query: String,
    pub page: usize,
    pub total_pages: usize,
    pub nrows: usize,
    pub nrecords: usize,
    pub page_out_of_range: bool,
    pub show_popup: bool,
    pub popup_message: String,
    pub cmdinput: InputResult,
    pub cmd_mode: Option<CMDMode>,
    pub active_cmdinput: bool,
    pub status_message: String,
}

impl UIData {
    pub fn empty() -> Self {
        UIData {
            name: String::new(),
            error: None,
            loading: true,
            headers: Vec::new(),
            rows: Vec::new(),
            selected_column: 0,
            filter_mode: FilterMode::Columns,
            query: String::new(),
            page: 1,
            total_pages: 0,
            nrows: 0,
            nrecords: 0,
            page_out_of_range: false,
            show_popup: false,
            popup_message: String::new(),
            cmdinput: InputResult::default(),
            cmd_mode: None,
            active_cmdinput: false,
            status_message: String::new(),
        }
    }
}

pub struct Model {
    config: JVConfig,
    pub status: Status,
    modus: Modus,
    previous_modus: Modus,
    load: LoadState,
    filters: FilterState,
    filter_mode: FilterMode,
    sort: SortState,
    pager: Pager,
    view: DerivedView,
    curser_column: usize,
    offset_column: usize,
    ui_width: usize,
    uidata: UIData,
    input: Inputter,
    input_backup: String,
    cmd_mode: Option<CMDMode>,
    last_input: InputResult,
    active_cmdinput: bool,
    status_message: String,
}

impl Model {
    pub fn init(config: &JVConfig, ui_width: usize) -> Self {
        let mut model = Self {
            config: config.clone(),
            status: Status::Loading,
            modus: Modus::Table,
            previous_modus: Modus::Table,
            load: LoadState::Loading,
            filters: FilterState::default(),
            filter_mode: config.filter_mode,
            sort: SortState::default(),
            pager: Pager::new(config.page_size),
            view: derive_view(
                &[],
                &FilterState::default(),
                config.filter_mode,
                &SortState::default(),
                &Pager::new(config.page_size),
            ),
            curser_column: 0,
            offset_column: 0,
            ui_width,
            uidata: UIData::empty(),
            input: Inputter::default(),
            input_backup: String::new(),
            cmd_mode: None,
            last_input: InputResult::default(),
            active_cmdinput: false,
            status_message: format!("Loading {} ...", config.endpoint),
        };
        model.refresh();
        model
    }

    pub fn get_uidata(&self) -> &UIData {
        &self.uidata
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load
    }

    pub fn view(&self) -> &DerivedView {
        &self.view
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn filter_mode(&self) -> FilterMode {
        self.filter_mode
    }

    pub fn sort(&self) -> &SortState {
        &self.sort
    }

    pub fn raw_keyevents(&self) -> bool {
        self.active_cmdinput
    }

    pub fn quit(&mut self) {
        self.status = Status::Quitting;
    }

    fn records(&self) -> &[Record] {
        match &self.load {
            LoadState::Ready(records) => records,
            _ => &[],
        }
    }

    fn selected_column_name(&self) -> Option<String> {
        self.view.columns.get(self.curser_column).cloned()
    }

    pub fn update(&mut self, message: Option<Message>) {
        let Some(msg) = message else {
            return;
        };
        match self.modus {
            Modus::Table => match msg {
                Message::Quit => self.quit(),
                Message::Loaded(state) => self.loaded(state),
                Message::Resize(width, _) => self.ui_resize(width),
                Message::Help => self.show_help(),
                Message::SelectLeft => self.move_column_selection(-1),
                Message::SelectRight => self.move_column_selection(1),
                Message::Sort => self.sort_selected_column(),
                Message::EditFilter => match self.filter_mode {
                    FilterMode::Global => self.enter_cmd_mode(CMDMode::GlobalQuery),
                    FilterMode::Columns => self.enter_cmd_mode(CMDMode::ColumnFilter),
                },
                Message::EditQuery => self.edit_query(),
                Message::CycleOperator => self.cycle_operator(),
                Message::ToggleFilterMode => self.toggle_filter_mode(),
                Message::ClearFilters => self.clear_filters(),
                Message::NextPage => self.next_page(),
                Message::PreviousPage => self.previous_page(),
                Message::Exit | Message::RawKey(_) => (),
            },
            Modus::Popup => match msg {
                Message::Quit => self.quit(),
                Message::Loaded(state) => self.loaded(state),
                Message::Resize(width, _) => self.ui_resize(width),
                Message::Exit | Message::Help => self.close_popup(),
                _ => (),
            },
            Modus::CmdInput => match msg {
                Message::RawKey(key) => self.raw_input(key),
                Message::Loaded(state) => self.loaded(state),
                Message::Resize(width, _) => self.ui_resize(width),
                _ => (),
            },
        }
    }

    fn loaded(&mut self, state: LoadState) {
        match &state {
            LoadState::Ready(records) => {
                info!(
                    "Loaded {} records, {} per page",
                    records.len(),
                    self.pager.page_size()
                );
                self.status = Status::Ready;
                self.status_message = format!("Loaded {} records", records.len());
            }
            LoadState::Failed(msg) => {
                self.status = Status::Failed;
                self.status_message = format!("Error: {msg}");
            }
            LoadState::Loading => {}
        }
        self.load = state;
        self.refresh();
    }

    /// Re-derives the view from the raw records and rebuilds the ui data.
    fn refresh(&mut self) {
        let start_time = Instant::now();
        let view = derive_view(
            self.records(),
            &self.filters,
            self.filter_mode,
            &self.sort,
            &self.pager,
        );
        self.view = view;
        if self.curser_column >= self.view.columns.len() {
            self.curser_column = self.view.columns.len().saturating_sub(1);
        }
        debug!("Derived view in {}us", start_time.elapsed().as_micros());
        self.update_uidata();
    }

    fn update_uidata(&mut self) {
        let widths = self.column_widths();
        self.fit_offset(&widths);

        let headers: Vec<HeaderView> = self
            .view
            .columns
            .iter()
            .zip(widths)
            .skip(self.offset_column)
            .map(|(name, width)| HeaderView {
                name: name.clone(),
                width,
                operator: self
                    .filters
                    .operator(name)
                    .map(|op| op.label().to_string())
                    .unwrap_or_else(|| self.filters.operator_tag(name).to_string()),
                filter: self.filters.value(name).to_string(),
                sort_arrow: self
                    .sort
                    .is_active(name)
                    .then(|| self.sort.direction.arrow()),
            })
            .collect();
        let rows: Vec<Vec<String>> = self
            .view
            .page_rows
            .iter()
            .map(|r| r.iter().skip(self.offset_column).cloned().collect::<Vec<String>>())
            .collect();

        self.uidata = UIData {
            name: self.config.endpoint.clone(),
            error: match &self.load {
                LoadState::Failed(msg) => Some(msg.clone()),
                _ => None,
            },
            loading: self.load == LoadState::Loading,
            headers,
            rows,
            selected_column: self.curser_column - self.offset_column,
            filter_mode: self.filter_mode,
            query: self.filters.query().to_string(),
            page: self.view.page,
            total_pages: self.view.total_pages,
            nrows: self.view.nrows(),
            nrecords: self.records().len(),
            page_out_of_range: self.view.is_page_out_of_range(),
            show_popup: self.modus == Modus::Popup,
            popup_message: self.uidata.popup_message.clone(),
            cmdinput: self.last_input.clone(),
            cmd_mode: self.cmd_mode,
            active_cmdinput: self.active_cmdinput,
            status_message: self.status_message.clone(),
        };
    }

    /// Render width of every column, based on its name, filter controls and the current page.
    fn column_widths(&self) -> Vec<usize> {
        self.view
            .columns
            .iter()
            .enumerate()
            .map(|(cidx, name)| {
                let content = self
                    .view
                    .page_rows
                    .iter()
                    .map(|r| r[cidx].chars().count())
                    .max()
                    .unwrap_or(0);
                let header = name.chars().count() + 2;
                let width = content
                    .max(header)
                    .max(self.filters.value(name).chars().count());
                std::cmp::min(width, self.config.max_column_width) + COLUMN_WIDTH_MARGIN
            })
            .collect()
    }

    /// Moves the first rendered column so the selected one stays on screen.
    fn fit_offset(&mut self, widths: &[usize]) {
        if self.curser_column < self.offset_column {
            self.offset_column = self.curser_column;
        }
        let budget = self.ui_width.saturating_sub(BORDER_WIDTH);
        while self.offset_column < self.curser_column
            && widths[self.offset_column..=self.curser_column].iter().sum::<usize>() > budget
        {
            self.offset_column += 1;
        }
    }

    fn ui_resize(&mut self, width: usize) {
        trace!("UI was resized! w:{}->{}", self.ui_width, width);
        self.ui_width = width;
        self.update_uidata();
    }

    fn move_column_selection(&mut self, step: i32) {
        let ncolumns = self.view.columns.len();
        if ncolumns == 0 {
            return;
        }
        self.curser_column = if step < 0 {
            self.curser_column.saturating_sub(1)
        } else {
            std::cmp::min(self.curser_column + 1, ncolumns - 1)
        };
        self.update_uidata();
    }

    fn sort_selected_column(&mut self) {
        if let Some(column) = self.selected_column_name() {
            self.sort.toggle(&column);
            trace!("Sort {:?}", self.sort);
            self.set_status_message(format!(
                "Sorted by {column} {}",
                match self.sort.direction {
                    SortDirection::Ascending => "ascending",
                    SortDirection::Descending => "descending",
                }
            ));
            self.refresh();
        }
    }

    fn cycle_operator(&mut self) {
        if self.filter_mode != FilterMode::Columns {
            self.set_status_message("Operators only apply to column filters (press m)");
            self.update_uidata();
            return;
        }
        if let Some(column) = self.selected_column_name() {
            let op = self.filters.cycle_operator(&column);
            self.set_status_message(format!("{column}: {}", op.label()));
            self.filters_changed();
        }
    }

    /// The query only filters in global mode, so editing it switches there.
    fn edit_query(&mut self) {
        if self.filter_mode != FilterMode::Global {
            self.filter_mode = FilterMode::Global;
            self.set_status_message("Filter mode: Global");
            self.filters_changed();
        }
        self.enter_cmd_mode(CMDMode::GlobalQuery);
    }

    fn toggle_filter_mode(&mut self) {
        self.filter_mode = self.filter_mode.toggled();
        self.set_status_message(format!("Filter mode: {:?}", self.filter_mode));
        self.filters_changed();
    }

    fn clear_filters(&mut self) {
        if !self.filters.is_active(self.filter_mode) {
            self.set_status_message("No filters set");
        } else {
            self.set_status_message("Cleared filters");
        }
        self.filters.clear();
        self.filters_changed();
    }

    fn filters_changed(&mut self) {
        if self.config.reset_page_on_filter {
            self.pager.reset();
        }
        self.refresh();
    }

    fn next_page(&mut self) {
        if self.pager.next(self.view.nrows()) {
            self.refresh();
        }
    }

    fn previous_page(&mut self) {
        if self.pager.previous() {
            self.refresh();
        }
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
    }

    fn show_help(&mut self) {
        self.previous_modus = self.modus;
        self.modus = Modus::Popup;
        self.uidata.popup_message = HELP_TEXT.to_string();
        self.update_uidata();
    }

    fn close_popup(&mut self) {
        trace!("Close popup ...");
        self.modus = self.previous_modus;
        self.previous_modus = Modus::Popup;
        self.update_uidata();
    }

    fn enter_cmd_mode(&mut self, mode: CMDMode) {
        let current = match mode {
            CMDMode::GlobalQuery => self.filters.query().to_string(),
            CMDMode::ColumnFilter => match self.selected_column_name() {
                Some(column) => self.filters.value(&column).to_string(),
                None => return,
            },
        };
        trace!("Entering command mode {:?} ...", mode);
        self.previous_modus = self.modus;
        self.modus = Modus::CmdInput;
        self.cmd_mode = Some(mode);
        self.active_cmdinput = true;

        self.input.set(&current);
        self.input_backup = current;
        self.last_input = self.input.get();
        self.update_uidata();
    }

    fn raw_input(&mut self, key: KeyEvent) {
        if !self.active_cmdinput {
            return;
        }
        self.last_input = self.input.read(key);
        if self.last_input.canceled {
            let backup = self.input_backup.clone();
            self.apply_input(&backup);
        } else if self.last_input.changed {
            let input = self.last_input.input.clone();
            self.apply_input(&input);
        }
        if self.last_input.finished {
            self.leave_cmd_mode();
        }
        self.update_uidata();
    }

    /// Every edit re-filters the whole dataset.
    fn apply_input(&mut self, text: &str) {
        match self.cmd_mode {
            Some(CMDMode::GlobalQuery) => self.filters.set_query(text),
            Some(CMDMode::ColumnFilter) => {
                if let Some(column) = self.selected_column_name() {
                    self.filters.set_value(&column, text);
                }
            }
            None => return,
        }
        self.filters_changed();
    }

    fn leave_cmd_mode(&mut self) {
        trace!("Handle cmd input {}", self.last_input.input);
        self.active_cmdinput = false;
        self.modus = self.previous_modus;
        self.previous_modus = Modus::CmdInput;
        self.cmd_mode = None;
        self.set_status_message(format!(
            "{} of {} records",
            self.view.nrows(),
            self.records().len()
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::{KeyCode, KeyModifiers};
    use serde_json::{Value, json};

    fn users(n: usize) -> Vec<Record> {
        (0..n)
            .map(|i| match json!({"id": i + 1, "name": format!("User {}", i + 1), "active": i % 2 == 0}) {
                Value::Object(m) => m,
                _ => unreachable!(),
            })
            .collect()
    }

    fn loaded_model(config: JVConfig, n: usize) -> Model {
        let mut model = Model::init(&config, 200);
        model.update(Some(Message::Loaded(LoadState::Ready(users(n)))));
        model
    }

    fn type_keys(model: &mut Model, s: &str) {
        for c in s.chars() {
            model.update(Some(Message::RawKey(KeyEvent::new(
                KeyCode::Char(c),
                KeyModifiers::NONE,
            ))));
        }
    }

    fn press(model: &mut Model, code: KeyCode) {
        model.update(Some(Message::RawKey(KeyEvent::new(code, KeyModifiers::NONE))));
    }

    #[test]
    fn starts_loading_then_shows_first_page() {
        let mut model = Model::init(&JVConfig::default(), 120);
        assert_eq!(model.status, Status::Loading);
        assert!(model.get_uidata().loading);

        model.update(Some(Message::Loaded(LoadState::Ready(users(12)))));
        let ui = model.get_uidata();
        assert_eq!(model.status, Status::Ready);
        assert_eq!(ui.headers.len(), 3);
        assert_eq!(ui.rows.len(), 5);
        assert_eq!(ui.total_pages, 3);
        assert_eq!(ui.headers[0].operator, "Contains");
    }

    #[test]
    fn failed_load_carries_the_error() {
        let mut model = Model::init(&JVConfig::default(), 120);
        model.update(Some(Message::Loaded(LoadState::Failed("boom".into()))));
        assert_eq!(model.status, Status::Failed);
        assert_eq!(model.get_uidata().error.as_deref(), Some("boom"));
        assert!(model.get_uidata().headers.is_empty());
    }

    #[test]
    fn paging_stops_at_the_boundaries() {
        let mut model = loaded_model(JVConfig::default(), 12);
        model.update(Some(Message::PreviousPage));
        assert_eq!(model.get_uidata().page, 1);
        for _ in 0..5 {
            model.update(Some(Message::NextPage));
        }
        assert_eq!(model.get_uidata().page, 3);
        assert_eq!(model.get_uidata().rows.len(), 2);
    }

    #[test]
    fn sorting_toggles_on_the_selected_column() {
        let mut model = loaded_model(JVConfig::default(), 12);
        model.update(Some(Message::Sort));
        assert_eq!(model.get_uidata().rows[0][0], "1");
        assert_eq!(model.get_uidata().headers[0].sort_arrow, Some("▲"));
        model.update(Some(Message::Sort));
        assert_eq!(model.get_uidata().rows[0][0], "12");
        assert_eq!(model.get_uidata().headers[0].sort_arrow, Some("▼"));
    }

    #[test]
    fn column_filter_applies_on_every_keystroke() {
        let mut model = loaded_model(JVConfig::default(), 12);
        model.update(Some(Message::SelectRight));
        model.update(Some(Message::EditFilter));
        assert!(model.raw_keyevents());

        type_keys(&mut model, "user 1");
        // User 1, 10, 11, 12
        assert_eq!(model.get_uidata().nrows, 4);
        type_keys(&mut model, "1");
        assert_eq!(model.get_uidata().nrows, 1);

        press(&mut model, KeyCode::Enter);
        assert!(!model.raw_keyevents());
        assert_eq!(model.filters().value("name"), "user 11");
    }

    #[test]
    fn escape_restores_the_previous_filter() {
        let mut model = loaded_model(JVConfig::default(), 12);
        model.update(Some(Message::EditFilter));
        type_keys(&mut model, "3");
        assert_eq!(model.get_uidata().nrows, 1);
        press(&mut model, KeyCode::Esc);
        assert_eq!(model.get_uidata().nrows, 12);
        assert_eq!(model.filters().value("id"), "");
    }

    #[test]
    fn operator_cycle_changes_the_result() {
        let mut model = loaded_model(JVConfig::default(), 12);
        model.update(Some(Message::EditFilter));
        type_keys(&mut model, "1");
        press(&mut model, KeyCode::Enter);
        // 1, 10, 11, 12
        assert_eq!(model.get_uidata().nrows, 4);

        model.update(Some(Message::CycleOperator)); // start with
        assert_eq!(model.get_uidata().nrows, 4);
        model.update(Some(Message::CycleOperator)); // end with
        assert_eq!(model.get_uidata().nrows, 2);
        model.update(Some(Message::CycleOperator)); // does not contain
        assert_eq!(model.get_uidata().nrows, 8);
        assert_eq!(model.get_uidata().headers[0].operator, "Does Not Contain");
    }

    #[test]
    fn global_query_searches_all_fields() {
        let config = JVConfig::default().with_filter_mode(FilterMode::Global);
        let mut model = loaded_model(config, 12);
        model.update(Some(Message::EditFilter));
        type_keys(&mut model, "TRUE");
        press(&mut model, KeyCode::Enter);
        assert_eq!(model.get_uidata().nrows, 6);
        assert_eq!(model.filters().query(), "TRUE");

        model.update(Some(Message::ToggleFilterMode));
        assert_eq!(model.get_uidata().nrows, 12);
    }

    #[test]
    fn query_from_column_mode_switches_to_global() {
        let mut model = loaded_model(JVConfig::default(), 12);
        model.update(Some(Message::EditQuery));
        assert_eq!(model.filter_mode(), FilterMode::Global);
        type_keys(&mut model, "user 11");
        press(&mut model, KeyCode::Enter);

        let ui = model.get_uidata();
        assert_eq!(ui.filter_mode, FilterMode::Global);
        assert_eq!(ui.query, "user 11");
        assert_eq!(ui.nrows, 1);
    }

    #[test]
    fn page_is_kept_when_filters_change() {
        let mut model = loaded_model(JVConfig::default(), 12);
        model.update(Some(Message::NextPage));
        model.update(Some(Message::NextPage));
        model.update(Some(Message::EditFilter));
        type_keys(&mut model, "2");
        press(&mut model, KeyCode::Enter);

        let ui = model.get_uidata();
        assert_eq!(ui.nrows, 2);
        assert_eq!(ui.page, 3);
        assert!(ui.rows.is_empty());
        assert!(ui.page_out_of_range);
    }

    #[test]
    fn page_can_be_reset_when_filters_change() {
        let config = JVConfig::default().with_reset_page_on_filter(true);
        let mut model = loaded_model(config, 12);
        model.update(Some(Message::NextPage));
        model.update(Some(Message::EditFilter));
        type_keys(&mut model, "2");
        assert_eq!(model.get_uidata().page, 1);
        assert_eq!(model.get_uidata().rows.len(), 2);
    }

    #[test]
    fn clear_filters_shows_everything_again() {
        let mut model = loaded_model(JVConfig::default(), 12);
        model.update(Some(Message::EditFilter));
        type_keys(&mut model, "7");
        press(&mut model, KeyCode::Enter);
        assert_eq!(model.get_uidata().nrows, 1);
        model.update(Some(Message::ClearFilters));
        assert_eq!(model.get_uidata().nrows, 12);
    }

    #[test]
    fn help_popup_swallows_table_messages() {
        let mut model = loaded_model(JVConfig::default(), 12);
        model.update(Some(Message::Help));
        assert!(model.get_uidata().show_popup);
        model.update(Some(Message::NextPage));
        assert_eq!(model.get_uidata().page, 1);
        model.update(Some(Message::Exit));
        assert!(!model.get_uidata().show_popup);
    }

    #[test]
    fn selection_scrolls_narrow_tables() {
        let mut model = Model::init(&JVConfig::default(), 20);
        model.update(Some(Message::Loaded(LoadState::Ready(users(3)))));
        model.update(Some(Message::SelectRight));
        model.update(Some(Message::SelectRight));
        let ui = model.get_uidata();
        assert_eq!(ui.headers[ui.selected_column].name, "active");
        model.update(Some(Message::SelectRight));
        let ui = model.get_uidata();
        assert_eq!(ui.headers[ui.selected_column].name, "active");
    }
}

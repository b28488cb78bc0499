use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Position, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols::border,
    text::{Line, Span, Text},
    widgets::{Block, Cell, Clear, Paragraph, Row, Table, Wrap},
};

use crate::domain::{CMDMode, JVConfig};
use crate::filter::FilterMode;
use crate::model::{Model, UIData};

pub const COLUMN_WIDTH_MARGIN: usize = 1;
pub const BORDER_WIDTH: usize = 2;
pub const TABLE_HEADER_HEIGHT: u16 = 3;
pub const CMDLINE_HEIGH: u16 = 1;
pub const PAGER_HEIGHT: u16 = 1;

#[derive(Debug)]
pub struct TableUI {
    column_spacing: u16,
}

impl TableUI {
    pub fn new(config: &JVConfig) -> Self {
        Self {
            column_spacing: config.column_spacing,
        }
    }

    pub fn draw(&self, model: &Model, frame: &mut Frame) {
        let uidata = model.get_uidata();
        let [table_area, pager_area, cmdline_area] = Layout::vertical([
            Constraint::Min(0),
            Constraint::Length(PAGER_HEIGHT),
            Constraint::Length(CMDLINE_HEIGH),
        ])
        .areas(frame.area());

        let block = Block::bordered()
            .title(Self::title(uidata).centered())
            .title_bottom(Line::from(" ? help ").right_aligned())
            .border_set(border::PLAIN);

        if let Some(error) = &uidata.error {
            let message = Paragraph::new(format!("Error: {error}"))
                .style(Style::default().fg(Color::Red))
                .centered()
                .wrap(Wrap { trim: true })
                .block(block);
            frame.render_widget(message, table_area);
        } else if uidata.loading {
            let message = Paragraph::new("Loading ...").centered().block(block);
            frame.render_widget(message, table_area);
        } else {
            frame.render_widget(self.table(uidata).block(block), table_area);
            frame.render_widget(Self::pager(uidata), pager_area);
        }

        self.draw_cmdline(uidata, frame, cmdline_area);

        if uidata.show_popup {
            Self::draw_popup(&uidata.popup_message, frame);
        }
    }

    fn title(uidata: &UIData) -> Line<'_> {
        let mut spans = vec![" ".into(), uidata.name.as_str().bold(), " ".into()];
        if uidata.filter_mode == FilterMode::Global {
            spans.push(format!("[query: \"{}\"] ", uidata.query).yellow());
        }
        Line::from(spans)
    }

    fn table<'a>(&self, uidata: &'a UIData) -> Table<'a> {
        let selected = Style::default().add_modifier(Modifier::REVERSED);
        let show_filters = uidata.filter_mode == FilterMode::Columns;

        let header = Row::new(uidata.headers.iter().enumerate().map(|(cidx, h)| {
            let name = match h.sort_arrow {
                Some(arrow) => format!("{} {arrow}", h.name),
                None => h.name.clone(),
            };
            let mut lines = vec![Line::from(name.bold())];
            if show_filters {
                lines.push(Line::from(h.operator.as_str().dim()));
                lines.push(Line::from(h.filter.as_str().yellow()));
            }
            let cell = Cell::from(Text::from(lines));
            if cidx == uidata.selected_column {
                cell.style(selected)
            } else {
                cell
            }
        }))
        .height(if show_filters { TABLE_HEADER_HEIGHT } else { 1 })
        .bottom_margin(1);

        let rows = uidata
            .rows
            .iter()
            .map(|r| Row::new(r.iter().map(|c| Cell::from(c.as_str()))));
        let widths = uidata
            .headers
            .iter()
            .map(|h| Constraint::Length(h.width as u16));

        Table::new(rows, widths)
            .header(header)
            .column_spacing(self.column_spacing)
    }

    fn pager(uidata: &UIData) -> Line<'_> {
        let enabled = Style::default().fg(Color::Blue).bold();
        let disabled = Style::default().fg(Color::DarkGray);
        let mut spans = vec![
            Span::styled(
                " ◀ Previous (p) ",
                if uidata.page > 1 { enabled } else { disabled },
            ),
            format!(" Page {} of {} ", uidata.page, uidata.total_pages).into(),
            Span::styled(
                " Next (n) ▶ ",
                if uidata.page < uidata.total_pages {
                    enabled
                } else {
                    disabled
                },
            ),
            format!("  {} of {} records", uidata.nrows, uidata.nrecords).dim(),
        ];
        if uidata.page_out_of_range {
            spans.push("  no rows on this page".red());
        }
        Line::from(spans)
    }

    fn draw_cmdline(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        if uidata.active_cmdinput {
            let prompt = match uidata.cmd_mode {
                Some(CMDMode::GlobalQuery) => "Query: ".to_string(),
                Some(CMDMode::ColumnFilter) => {
                    match uidata.headers.get(uidata.selected_column) {
                        Some(h) => format!("Filter {} ({}): ", h.name, h.operator),
                        None => "Filter: ".to_string(),
                    }
                }
                None => String::new(),
            };
            let prompt_width = prompt.chars().count();
            let line = Line::from(vec![prompt.bold(), uidata.cmdinput.input.as_str().into()]);
            frame.render_widget(Paragraph::new(line), area);
            frame.set_cursor_position(Position::new(
                area.x + (prompt_width + uidata.cmdinput.curser_pos) as u16,
                area.y,
            ));
        } else {
            frame.render_widget(Paragraph::new(uidata.status_message.as_str()), area);
        }
    }

    fn draw_popup(message: &str, frame: &mut Frame) {
        let height = message.lines().count() as u16 + 2;
        let width = message.lines().map(|l| l.chars().count()).max().unwrap_or(0) as u16 + 4;
        let [area] = Layout::vertical([Constraint::Length(height)])
            .flex(Flex::Center)
            .areas(frame.area());
        let [area] = Layout::horizontal([Constraint::Length(width)])
            .flex(Flex::Center)
            .areas(area);

        let block = Block::bordered()
            .title(Line::from(" Help ".bold()).centered())
            .border_set(border::THICK);
        frame.render_widget(Clear, area);
        frame.render_widget(Paragraph::new(message).block(block), area);
    }
}

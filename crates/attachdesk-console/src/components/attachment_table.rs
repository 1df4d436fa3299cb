use attachdesk_core::icon;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Row, Table, TableState};

use crate::surface::{AttachmentRow, RowOrder, SortKey};

pub struct AttachmentTable {
    rows: Vec<AttachmentRow>,
    order: RowOrder,
    state: TableState,
}

impl AttachmentTable {
    pub fn new(rows: Vec<AttachmentRow>, order: RowOrder) -> Self {
        let mut state = TableState::default();
        if !rows.is_empty() {
            state.select(Some(0));
        }
        Self { rows, order, state }
    }

    pub fn rows(&self) -> &[AttachmentRow] {
        &self.rows
    }

    pub fn order(&self) -> RowOrder {
        self.order
    }

    /// Returns the highlighted row, if any.
    pub fn selected_row(&self) -> Option<&AttachmentRow> {
        self.rows.get(self.state.selected()?)
    }

    /// Snapshot index behind the highlighted row.
    pub fn selected_index(&self) -> Option<usize> {
        self.selected_row().map(|r| r.index)
    }

    /// Highlight the row for snapshot `index`. Returns `false` and leaves the
    /// cursor alone when no row has it.
    pub fn select_index(&mut self, index: usize) -> bool {
        match self.rows.iter().position(|r| r.index == index) {
            Some(pos) => {
                self.state.select(Some(pos));
                true
            }
            None => false,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                let current = self.state.selected().unwrap_or(0);
                if current + 1 < self.rows.len() {
                    self.state.select(Some(current + 1));
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                let current = self.state.selected().unwrap_or(0);
                if current > 0 {
                    self.state.select(Some(current - 1));
                }
            }
            KeyCode::Char('g') => {
                if !self.rows.is_empty() {
                    self.state.select(Some(0));
                }
            }
            KeyCode::Char('G') => {
                if !self.rows.is_empty() {
                    self.state.select(Some(self.rows.len() - 1));
                }
            }
            _ => {}
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(format!(" Tracked Attachments ({}) ", self.rows.len()))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));

        let header = Row::new(vec![
            Cell::from(""),
            Cell::from(self.header_label("Name", SortKey::Name)),
            Cell::from(self.header_label("Last Modified", SortKey::Modified)),
        ])
        .style(Style::default().fg(Color::Yellow).bold());

        let rows: Vec<Row> = self
            .rows
            .iter()
            .map(|row| {
                Row::new(vec![
                    Cell::from(Span::styled(
                        format!("[{}]", icon::label(row.icon)),
                        Style::default().fg(Color::DarkGray),
                    )),
                    Cell::from(row.name.as_str()),
                    Cell::from(row.modified.as_str()),
                ])
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(6),
                Constraint::Percentage(50),
                Constraint::Min(20),
            ],
        )
        .header(header)
        .block(block)
        .row_highlight_style(Style::default().fg(Color::Black).bg(Color::Cyan).bold())
        .highlight_symbol("> ");

        let mut state = self.state.clone();
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn header_label(&self, title: &str, key: SortKey) -> String {
        if self.order.key != key {
            return title.to_string();
        }
        let arrow = if self.order.ascending { "^" } else { "v" };
        format!("{title} {arrow}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn row(index: usize, name: &str) -> AttachmentRow {
        AttachmentRow {
            index,
            name: name.into(),
            icon: icon::DEFAULT_ICON,
            modified: String::new(),
            modified_at: None,
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn make_table() -> AttachmentTable {
        // Already sorted by name; snapshot indexes are scrambled.
        AttachmentTable::new(
            vec![row(2, "alpha"), row(0, "bravo"), row(1, "charlie")],
            RowOrder::default(),
        )
    }

    #[test]
    fn first_row_selected() {
        let table = make_table();
        assert_eq!(table.selected_index(), Some(2));
    }

    #[test]
    fn empty_table_has_no_selection() {
        let table = AttachmentTable::new(vec![], RowOrder::default());
        assert!(table.selected_row().is_none());
    }

    #[test]
    fn navigation_stays_in_bounds() {
        let mut table = make_table();
        table.handle_key(key(KeyCode::Char('k')));
        assert_eq!(table.selected_index(), Some(2));
        table.handle_key(key(KeyCode::Char('G')));
        assert_eq!(table.selected_index(), Some(1));
        table.handle_key(key(KeyCode::Down));
        assert_eq!(table.selected_index(), Some(1));
        table.handle_key(key(KeyCode::Char('g')));
        table.handle_key(key(KeyCode::Char('j')));
        assert_eq!(table.selected_row().unwrap().name, "bravo");
    }

    #[test]
    fn select_by_snapshot_index() {
        let mut table = make_table();
        assert!(table.select_index(1));
        assert_eq!(table.selected_row().unwrap().name, "charlie");

        assert!(!table.select_index(9));
        assert_eq!(table.selected_index(), Some(1));
    }

    #[test]
    fn header_marks_sort_column() {
        let table = AttachmentTable::new(vec![], RowOrder::default().toggle(SortKey::Name));
        assert_eq!(table.header_label("Name", SortKey::Name), "Name v");
        assert_eq!(
            table.header_label("Last Modified", SortKey::Modified),
            "Last Modified"
        );
    }
}

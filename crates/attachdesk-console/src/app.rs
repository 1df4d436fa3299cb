use std::sync::Arc;

use anyhow::Result;
use attachdesk_core::icon;
use attachdesk_service::AttachmentService;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use tokio::runtime::Runtime;
use tracing::debug;

use crate::components::attachment_table::AttachmentTable;
use crate::editor::{
    AttachmentEditor, EditorMode, PendingDelete, SubmitOutcome, FETCH_FAILED_MESSAGE,
};
use crate::encoder::{FileEncoder, SelectedFile};
use crate::modal::{DialogId, FocusDecision, FocusTarget, ModalStack};
use crate::store::{AttachmentStore, LoadStatus};
use crate::surface::{NoticeBoard, NoticeLevel, Notifier, RowOrder, SortKey};

pub const EDITOR_DIALOG: DialogId = DialogId(1);
pub const CONFIRM_DIALOG: DialogId = DialogId(2);

const PREVIEW_WIDTH: usize = 48;

/// Input field inside the editor dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    /// Path of the file to attach
    File,
}

impl Field {
    fn next(self) -> Self {
        match self {
            Field::Name => Field::File,
            Field::File => Field::Name,
        }
    }
}

/// What currently receives keys, derived from the dialog stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Editor(Field),
    ConfirmDelete,
}

pub struct App {
    rt: Runtime,
    store: AttachmentStore,
    editor: AttachmentEditor,
    encoder: FileEncoder,
    modal: ModalStack,
    notices: NoticeBoard,
    table: AttachmentTable,
    focus: FocusTarget,
    field: Field,
    path_input: String,
    pending_delete: Option<PendingDelete>,
}

impl App {
    pub fn new(service: Arc<dyn AttachmentService>) -> Result<Self> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self::with_runtime(rt, service))
    }

    /// Build on an existing runtime. Must not be called from inside it.
    pub fn with_runtime(rt: Runtime, service: Arc<dyn AttachmentService>) -> Self {
        let mut app = Self {
            rt,
            store: AttachmentStore::new(service),
            editor: AttachmentEditor::new(),
            encoder: FileEncoder::new(),
            modal: ModalStack::new(),
            notices: NoticeBoard::new(),
            table: AttachmentTable::new(Vec::new(), RowOrder::default()),
            focus: FocusTarget::Page,
            field: Field::Name,
            path_input: String::new(),
            pending_delete: None,
        };
        app.refresh();
        app
    }

    pub fn mode(&self) -> Mode {
        match self.modal.focused() {
            Some(CONFIRM_DIALOG) => Mode::ConfirmDelete,
            Some(EDITOR_DIALOG) if self.editor.is_open() => Mode::Editor(self.field),
            _ => Mode::Normal,
        }
    }

    /// Typing goes into a field, so single-letter shortcuts are off.
    pub fn is_input_mode(&self) -> bool {
        matches!(self.mode(), Mode::Editor(_))
    }

    pub fn store(&self) -> &AttachmentStore {
        &self.store
    }

    pub fn editor(&self) -> &AttachmentEditor {
        &self.editor
    }

    pub fn modal(&self) -> &ModalStack {
        &self.modal
    }

    pub fn notices(&self) -> &NoticeBoard {
        &self.notices
    }

    pub fn table(&self) -> &AttachmentTable {
        &self.table
    }

    pub fn focus(&self) -> FocusTarget {
        self.focus
    }

    pub fn path_input(&self) -> &str {
        &self.path_input
    }

    pub fn pending_delete(&self) -> Option<&PendingDelete> {
        self.pending_delete.as_ref()
    }

    //  Data

    fn refresh(&mut self) {
        let keep = self.selected_id();
        if self.rt.block_on(self.store.reload()).is_err() {
            self.notices.error(FETCH_FAILED_MESSAGE);
        }
        self.rebuild_table(self.table.order(), keep);
    }

    fn selected_id(&self) -> Option<i64> {
        self.table
            .selected_index()
            .and_then(|i| self.store.get(i))
            .and_then(|a| a.id)
    }

    /// Re-derive rows from the snapshot, keeping the cursor on `keep` if it
    /// is still there.
    fn rebuild_table(&mut self, order: RowOrder, keep: Option<i64>) {
        self.table = AttachmentTable::new(self.store.rows(order), order);
        if let Some(id) = keep {
            if let Some(index) = self.store.items().iter().position(|a| a.id == Some(id)) {
                self.table.select_index(index);
            }
        }
    }

    fn show(&mut self, dialog: DialogId) {
        self.modal.on_shown(dialog);
        self.focus = FocusTarget::DialogRoot(dialog);
    }

    fn hide(&mut self, dialog: DialogId) {
        let outcome = self.modal.on_hidden(dialog);
        self.focus = outcome
            .focus
            .map(FocusTarget::DialogRoot)
            .unwrap_or(FocusTarget::Page);
    }

    //  Keys

    pub fn handle_key(&mut self, key: KeyEvent) {
        self.notices.clear();

        if let FocusDecision::Redirect(dialog) = self.modal.route_focus(self.focus) {
            self.focus = FocusTarget::DialogRoot(dialog);
        }
        match self.focus {
            FocusTarget::Page => self.handle_normal(key),
            FocusTarget::DialogRoot(CONFIRM_DIALOG) | FocusTarget::DialogChild(CONFIRM_DIALOG) => {
                self.handle_confirm_delete(key)
            }
            FocusTarget::DialogRoot(_) | FocusTarget::DialogChild(_) => self.handle_editor(key),
        }
    }

    fn handle_normal(&mut self, key: KeyEvent) {
        let selected = self.table.selected_index();
        match key.code {
            KeyCode::Char('n') => self.open_editor(EditorMode::Create),
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(index) = selected {
                    self.open_editor(EditorMode::Edit(index));
                }
            }
            KeyCode::Char('c') => {
                if let Some(index) = selected {
                    self.open_editor(EditorMode::Copy(index));
                }
            }
            KeyCode::Char('d') => {
                if let Some(index) = selected {
                    self.request_delete(index);
                }
            }
            KeyCode::Char('r') => self.refresh(),
            KeyCode::Char('s') => self.sort_by(SortKey::Name),
            KeyCode::Char('S') => self.sort_by(SortKey::Modified),
            _ => self.table.handle_key(key),
        }
    }

    fn sort_by(&mut self, key: SortKey) {
        let keep = self.selected_id();
        let order = self.table.order().toggle(key);
        self.rebuild_table(order, keep);
    }

    fn open_editor(&mut self, mode: EditorMode) {
        match self.editor.open(mode, &self.store) {
            Ok(()) => {
                self.field = Field::Name;
                self.path_input.clear();
                self.show(EDITOR_DIALOG);
                self.focus = FocusTarget::DialogChild(EDITOR_DIALOG);
            }
            Err(e) => debug!(error = %e, "editor not opened"),
        }
    }

    fn handle_editor(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => {
                self.editor.close();
                self.path_input.clear();
                self.hide(EDITOR_DIALOG);
            }
            KeyCode::Tab | KeyCode::BackTab => {
                self.field = self.field.next();
                self.focus = FocusTarget::DialogChild(EDITOR_DIALOG);
            }
            KeyCode::Char('s') if ctrl => self.submit_editor(),
            KeyCode::Char('d') if ctrl => {
                if let Some(EditorMode::Edit(index)) = self.editor.mode() {
                    self.request_delete(index);
                }
            }
            KeyCode::Enter => match self.field {
                Field::Name => self.submit_editor(),
                Field::File => self.attach_file(),
            },
            KeyCode::Backspace => match self.field {
                Field::Name => self.editor.pop_char(),
                Field::File => {
                    self.path_input.pop();
                }
            },
            KeyCode::Char(c) if !ctrl => match self.field {
                Field::Name => self.editor.push_char(c),
                Field::File => self.path_input.push(c),
            },
            _ => {}
        }
    }

    fn attach_file(&mut self) {
        let path = self.path_input.trim();
        if path.is_empty() {
            return;
        }
        let file = SelectedFile::from_path(path);
        if self
            .rt
            .block_on(self.editor.attach(&file, &self.encoder))
            .is_ok()
        {
            self.path_input.clear();
        }
    }

    fn submit_editor(&mut self) {
        let keep = self.selected_id();
        match self
            .rt
            .block_on(self.editor.submit(&mut self.store, &self.notices))
        {
            Ok(SubmitOutcome::Saved(saved)) => {
                self.path_input.clear();
                self.hide(EDITOR_DIALOG);
                self.rebuild_table(self.table.order(), saved.id.or(keep));
            }
            Ok(SubmitOutcome::Rejected(_)) => {}
            Err(e) => debug!(error = %e, "submit ignored"),
        }
    }

    fn request_delete(&mut self, index: usize) {
        match self.editor.request_delete(index, &self.store) {
            Ok(pending) => {
                self.pending_delete = Some(pending);
                self.show(CONFIRM_DIALOG);
            }
            Err(e) => debug!(error = %e, "delete not offered"),
        }
    }

    fn handle_confirm_delete(&mut self, key: KeyEvent) {
        if key.code != KeyCode::Char('y') {
            if let Some(pending) = self.pending_delete.take() {
                pending.cancel();
            }
            self.hide(CONFIRM_DIALOG);
            return;
        }

        let keep = self.selected_id();
        let Some(pending) = self.pending_delete.as_mut() else {
            self.hide(CONFIRM_DIALOG);
            return;
        };
        if self
            .rt
            .block_on(pending.confirm(&mut self.store, &self.notices))
            .is_err()
        {
            // Stays open with the reason shown.
            return;
        }
        self.pending_delete = None;
        self.hide(CONFIRM_DIALOG);
        if self.modal.is_stacked(EDITOR_DIALOG) {
            self.editor.close();
            self.path_input.clear();
            self.hide(EDITOR_DIALOG);
        }
        self.rebuild_table(self.table.order(), keep);
    }

    //  Rendering

    pub fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(area);

        self.render_title_bar(frame, layout[0]);
        self.table.render(frame, layout[1]);
        self.render_status_bar(frame, layout[2]);

        // Bottom to top so later dialogs cover earlier ones.
        for (dialog, _) in self.modal.ordered() {
            match dialog {
                EDITOR_DIALOG => self.render_editor(frame, area),
                CONFIRM_DIALOG => self.render_confirm_delete(frame, area),
                _ => {}
            }
        }
    }

    fn render_title_bar(&self, frame: &mut Frame, area: Rect) {
        let status = match self.store.status() {
            LoadStatus::NotLoaded => Span::styled("loading", Style::default().fg(Color::DarkGray)),
            LoadStatus::Ready => Span::styled(
                format!("{} attachments", self.store.len()),
                Style::default().fg(Color::Yellow),
            ),
            LoadStatus::Failed(msg) => {
                Span::styled(format!("offline: {msg}"), Style::default().fg(Color::Red))
            }
        };
        let title = Line::from(vec![
            Span::styled(" attachdesk ", Style::default().bold().fg(Color::Cyan)),
            Span::raw("| "),
            status,
        ]);
        frame.render_widget(title, area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        if let Some(notice) = self.notices.latest() {
            let color = match notice.level {
                NoticeLevel::Success => Color::Green,
                NoticeLevel::Error => Color::Red,
            };
            let line = Line::from(Span::styled(
                format!(" {}", notice.message),
                Style::default().fg(color),
            ));
            frame.render_widget(line, area);
            return;
        }

        let hints = match self.mode() {
            Mode::Normal => vec![
                ("q", "quit"),
                ("j/k", "nav"),
                ("n", "new"),
                ("e", "edit"),
                ("c", "copy"),
                ("d", "del"),
                ("s/S", "sort"),
                ("r", "reload"),
            ],
            Mode::Editor(Field::Name) => vec![
                ("Tab", "file"),
                ("Enter", "save"),
                ("Ctrl+D", "del"),
                ("Esc", "cancel"),
            ],
            Mode::Editor(Field::File) => vec![
                ("Tab", "name"),
                ("Enter", "attach"),
                ("Ctrl+S", "save"),
                ("Esc", "cancel"),
            ],
            Mode::ConfirmDelete => vec![("y", "confirm"), ("any", "cancel")],
        };

        let spans: Vec<Span> = hints
            .into_iter()
            .flat_map(|(key, desc)| {
                vec![
                    Span::styled(format!(" {key}"), Style::default().fg(Color::Yellow).bold()),
                    Span::raw(format!(" {desc} ")),
                ]
            })
            .collect();

        frame.render_widget(Line::from(spans), area);
    }

    fn render_editor(&self, frame: &mut Frame, area: Rect) {
        let popup = centered_rect(60, 50, area);
        frame.render_widget(Clear, popup);

        let title = self
            .editor
            .mode()
            .map(|m| m.title())
            .unwrap_or("Tracked Attachment");
        let block = Block::default()
            .title(format!(" {title} "))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));

        let active = Style::default().fg(Color::Yellow).bold();
        let label = |field: Field, text: &'static str| {
            if self.field == field {
                Span::styled(text, active)
            } else {
                Span::raw(text)
            }
        };

        let draft = self.editor.draft();
        let file = match &draft.file {
            Some(f) => format!("{} ({})", f.filename, f.mime_type),
            None => "(none)".into(),
        };
        let preview = self
            .editor
            .preview_uri()
            .map(|uri| {
                let mut shown: String = uri.chars().take(PREVIEW_WIDTH).collect();
                if uri.len() > PREVIEW_WIDTH {
                    shown.push_str("...");
                }
                shown
            })
            .unwrap_or_default();

        let mut lines = vec![
            Line::from(vec![label(Field::Name, "Name: "), Span::raw(draft.name.as_str())]),
            Line::from(""),
            Line::from(vec![Span::raw("File: "), Span::raw(file)]),
            Line::from(vec![label(Field::File, "Path: "), Span::raw(self.path_input.as_str())]),
            Line::from(""),
            Line::from(vec![
                Span::styled(
                    format!("[{}] ", icon::label(self.editor.preview_icon())),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(preview, Style::default().fg(Color::DarkGray)),
            ]),
        ];
        if let Some(err) = self.editor.error() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(err, Style::default().fg(Color::Red))));
        }

        let paragraph = Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, popup);
    }

    fn render_confirm_delete(&self, frame: &mut Frame, area: Rect) {
        let Some(pending) = &self.pending_delete else {
            return;
        };
        let prompt = pending.prompt();
        let popup = centered_rect(50, 30, area);
        frame.render_widget(Clear, popup);

        let block = Block::default()
            .title(format!(" {} ", prompt.title))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red));

        let mut lines = vec![Line::from(prompt.body.as_str()), Line::from("")];
        if let Some(err) = pending.error() {
            lines.push(Line::from(Span::styled(err, Style::default().fg(Color::Red))));
            lines.push(Line::from(""));
        }
        lines.push(Line::from(format!(
            "(y) {} / (any key) cancel",
            prompt.confirm_label
        )));

        let paragraph = Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .alignment(Alignment::Center);
        frame.render_widget(paragraph, popup);
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

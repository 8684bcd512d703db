use super::ui;
use admin_console::core::{Notice, NoticeLevel, Record, Result as ConsoleResult};
use admin_console::form::{FormEvent, FormPhase, OptionsResult, SubmissionResult};
use admin_console::list::DeleteResult;
use admin_console::resource::{AssetSlot, FieldKind, FieldSpec};
use admin_console::{AdminConsole, ResourceList};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::{Backend, CrosstermBackend},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, TableState},
};
use serde_json::Value;
use std::{io, sync::Arc, time::Duration};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{debug, error, info};
use tui_textarea::TextArea;

const TICK: Duration = Duration::from_millis(100);
const MAX_NOTICES: usize = 50;

/// Outcome of a spawned request, tagged with the tab that issued it.
pub enum TaskResult {
    Snapshot {
        tab: usize,
        result: ConsoleResult<Vec<Record>>,
    },
    Submitted {
        tab: usize,
        result: SubmissionResult,
    },
    Deleted {
        tab: usize,
        result: DeleteResult,
    },
    Options {
        tab: usize,
        result: OptionsResult,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputTarget {
    Field(String),
    AssetPath,
}

/// One text input of the open form.
pub struct FormInput {
    pub target: InputTarget,
    pub label: String,
    pub required: bool,
    pub multiline: bool,
    pub option_source: Option<String>,
    pub textarea: TextArea<'static>,
}

impl FormInput {
    fn field(spec: &FieldSpec, value: Option<&Value>) -> Self {
        let mut textarea = TextArea::new(lines_of(&spec.display_value(value)));
        if matches!(spec.kind, FieldKind::Password) {
            textarea.set_mask_char('\u{2022}');
        }
        textarea.set_cursor_line_style(Style::default());

        Self {
            target: InputTarget::Field(spec.name.clone()),
            label: spec.label.clone(),
            required: spec.required.is_some(),
            multiline: matches!(spec.kind, FieldKind::TextArea),
            option_source: spec.kind.option_source().map(str::to_string),
            textarea,
        }
    }

    fn asset_path(slot: &AssetSlot) -> Self {
        let mut textarea = TextArea::default();
        textarea.set_placeholder_text("Path to a local file, then Ctrl+O");
        textarea.set_cursor_line_style(Style::default());

        Self {
            target: InputTarget::AssetPath,
            label: format!("{} file", slot.field),
            required: false,
            multiline: false,
            option_source: None,
            textarea,
        }
    }

    pub fn text(&self) -> String {
        self.textarea.lines().join("\n")
    }

    fn set_focus(&mut self, focused: bool) {
        let marker = if self.required { " *" } else { "" };
        let border = if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let cursor = if focused {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        };

        self.textarea.set_block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title(format!(" {}{} ", self.label, marker)),
        );
        self.textarea.set_cursor_style(cursor);
    }
}

fn lines_of(text: &str) -> Vec<String> {
    let lines: Vec<String> = text.lines().map(str::to_string).collect();
    if lines.is_empty() {
        vec![String::new()]
    } else {
        lines
    }
}

pub struct App {
    pub lists: Vec<ResourceList>,
    pub tab: usize,
    pub table_state: TableState,
    pub inputs: Vec<FormInput>,
    pub focus: usize,
    pub notices: Vec<Notice>,
    pub exit: bool,
    tx: UnboundedSender<TaskResult>,
    rx: UnboundedReceiver<TaskResult>,
}

impl App {
    pub fn new(console: &AdminConsole, initial: &str) -> Self {
        let lists = console.lists();
        let tab = lists
            .iter()
            .position(|l| l.descriptor().collection.eq_ignore_ascii_case(initial))
            .unwrap_or(0);
        let (tx, rx) = unbounded_channel();

        Self {
            lists,
            tab,
            table_state: TableState::default(),
            inputs: Vec::new(),
            focus: 0,
            notices: vec![Notice::info(
                "Tab switches collection, n adds, Enter edits, d deletes, r reloads, q quits",
            )],
            exit: false,
            tx,
            rx,
        }
    }

    pub fn current(&self) -> &ResourceList {
        &self.lists[self.tab]
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let res = self.run_loop(&mut terminal).await;

        // Restore terminal
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        res.map_err(Into::into)
    }

    async fn run_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        for tab in 0..self.lists.len() {
            self.spawn_snapshot(tab);
        }

        loop {
            self.drain_results();
            terminal.draw(|f| ui::draw(f, self))?;

            if event::poll(TICK)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key).await;
                        self.collect_notices();
                    }
                }
            }

            if self.exit {
                return Ok(());
            }
        }
    }

    fn drain_results(&mut self) {
        let mut applied = false;
        while let Ok(message) = self.rx.try_recv() {
            self.apply(message);
            applied = true;
        }
        if applied {
            self.clamp_selection();
            self.collect_notices();
        }
    }

    fn apply(&mut self, message: TaskResult) {
        match message {
            TaskResult::Snapshot { tab, result } => {
                let _ = self.lists[tab].apply_snapshot(result);
            }
            TaskResult::Submitted { tab, result } => {
                match self.lists[tab].form_mut().finish(result) {
                    Ok(FormEvent::Succeeded { .. }) => {
                        if tab == self.tab {
                            self.inputs.clear();
                        }
                        self.spawn_snapshot(tab);
                    }
                    Ok(FormEvent::Discarded) => {}
                    Err(err) => debug!(error = %err, "submission failed"),
                }
            }
            TaskResult::Deleted { tab, result } => {
                if self.lists[tab].finish_delete(result).is_ok() {
                    self.spawn_snapshot(tab);
                }
            }
            TaskResult::Options { tab, result } => {
                self.lists[tab].form_mut().apply_options(result);
            }
        }
    }

    fn collect_notices(&mut self) {
        for list in &mut self.lists {
            for notice in list.take_notices() {
                match notice.level {
                    NoticeLevel::Error => error!(message = %notice.message, "notice"),
                    _ => info!(message = %notice.message, "notice"),
                }
                self.notices.push(notice);
            }
        }

        if self.notices.len() > MAX_NOTICES {
            let excess = self.notices.len() - MAX_NOTICES;
            self.notices.drain(..excess);
        }
    }

    // ------------------------------------------------------------------
    // Spawned requests
    // ------------------------------------------------------------------

    fn spawn_snapshot(&mut self, tab: usize) {
        let request = self.lists[tab].snapshot_request();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = request.run().await;
            let _ = tx.send(TaskResult::Snapshot { tab, result });
        });
    }

    fn spawn_options(&mut self, tab: usize) {
        let list = &self.lists[tab];
        let request = list.form().options_request();
        if request.is_empty() {
            return;
        }

        let transport = Arc::clone(list.transport());
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = request.run(transport).await;
            let _ = tx.send(TaskResult::Options { tab, result });
        });
    }

    fn spawn_delete(&mut self) {
        let tab = self.tab;
        let Some(request) = self.lists[tab].begin_delete() else {
            return;
        };

        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = request.run().await;
            let _ = tx.send(TaskResult::Deleted { tab, result });
        });
    }

    fn submit_form(&mut self) {
        let tab = self.tab;
        let list = &mut self.lists[tab];
        for input in &self.inputs {
            if let InputTarget::Field(name) = &input.target {
                list.form_mut().set_input(name, &input.text());
            }
        }

        match list.form_mut().begin_submit() {
            Ok(submission) => {
                let transport = Arc::clone(list.transport());
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let result = submission.run(transport).await;
                    let _ = tx.send(TaskResult::Submitted { tab, result });
                });
            }
            Err(err) => debug!(error = %err, "submission refused"),
        }
    }

    // ------------------------------------------------------------------
    // Key handling
    // ------------------------------------------------------------------

    async fn handle_key(&mut self, key: KeyEvent) {
        if self.current().pending_delete().is_some() {
            self.handle_confirm_key(key);
        } else if self.current().form().is_open() {
            self.handle_form_key(key).await;
        } else {
            self.handle_browse_key(key);
        }
    }

    fn handle_browse_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.exit = true,
            KeyCode::Tab | KeyCode::Right => self.switch_tab(1),
            KeyCode::BackTab | KeyCode::Left => self.switch_tab(self.lists.len() - 1),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
            KeyCode::Char('r') => self.spawn_snapshot(self.tab),
            KeyCode::Char('n') => {
                if self.lists[self.tab].open_create() {
                    self.open_inputs();
                }
            }
            KeyCode::Enter | KeyCode::Char('e') => {
                if let Some(index) = self.table_state.selected() {
                    if let Ok(true) = self.lists[self.tab].open_edit_at(index) {
                        self.open_inputs();
                    }
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(index) = self.table_state.selected() {
                    let _ = self.lists[self.tab].request_delete_at(index);
                }
            }
            _ => {}
        }
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => self.spawn_delete(),
            KeyCode::Char('n') | KeyCode::Esc => self.lists[self.tab].cancel_delete(),
            _ => {}
        }
    }

    async fn handle_form_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Esc {
            self.lists[self.tab].cancel_form();
            self.inputs.clear();
            return;
        }

        if self.current().form().phase() == FormPhase::Submitting {
            return;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let multiline = self.inputs.get(self.focus).is_some_and(|i| i.multiline);

        match key.code {
            KeyCode::Char('s') if ctrl => self.submit_form(),
            KeyCode::Char('o') if ctrl => self.stage_asset().await,
            KeyCode::Tab => self.move_focus(1),
            KeyCode::BackTab => self.move_focus(-1),
            KeyCode::Down | KeyCode::Enter if !multiline => self.move_focus(1),
            KeyCode::Up if !multiline => self.move_focus(-1),
            _ => {
                if let Some(input) = self.inputs.get_mut(self.focus) {
                    input.textarea.input(key);
                }
            }
        }
    }

    async fn stage_asset(&mut self) {
        let Some(path) = self
            .inputs
            .iter()
            .find(|i| i.target == InputTarget::AssetPath)
            .map(|i| i.text().trim().to_string())
        else {
            return;
        };

        if path.is_empty() {
            self.notices.push(Notice::info("Type a file path before staging"));
            return;
        }

        let staged = self.lists[self.tab].form_mut().stage_file(&path).await;
        match staged {
            Ok(()) => {
                info!(path = %path, "asset staged");
                self.notices.push(Notice::info(format!("Staged {}", path)));
            }
            Err(err) => {
                error!(path = %path, error = %err, "cannot stage asset");
                self.notices
                    .push(Notice::error(format!("Cannot read {}: {}", path, err)));
            }
        }
    }

    // ------------------------------------------------------------------
    // View state
    // ------------------------------------------------------------------

    fn open_inputs(&mut self) {
        let form = self.lists[self.tab].form();
        let descriptor = form.descriptor();

        let mut inputs: Vec<FormInput> = descriptor
            .visible_fields(form.is_editing())
            .map(|spec| FormInput::field(spec, form.draft().get(&spec.name)))
            .collect();
        if let Some(slot) = &descriptor.asset {
            inputs.push(FormInput::asset_path(slot));
        }

        self.inputs = inputs;
        self.focus = 0;
        self.refresh_focus();
        self.spawn_options(self.tab);
    }

    fn move_focus(&mut self, step: isize) {
        if self.inputs.is_empty() {
            return;
        }
        let len = self.inputs.len() as isize;
        self.focus = (self.focus as isize + step).rem_euclid(len) as usize;
        self.refresh_focus();
    }

    fn refresh_focus(&mut self) {
        let focus = self.focus;
        for (index, input) in self.inputs.iter_mut().enumerate() {
            input.set_focus(index == focus);
        }
    }

    fn switch_tab(&mut self, step: usize) {
        if self.lists.is_empty() {
            return;
        }
        self.tab = (self.tab + step) % self.lists.len();
        self.table_state = TableState::default();
        self.clamp_selection();
    }

    fn move_selection(&mut self, step: isize) {
        let len = self.current().rows().len();
        if len == 0 {
            self.table_state.select(None);
            return;
        }
        let current = self.table_state.selected().unwrap_or(0) as isize;
        let next = (current + step).clamp(0, len as isize - 1) as usize;
        self.table_state.select(Some(next));
    }

    fn clamp_selection(&mut self) {
        let len = self.current().rows().len();
        let selected = match (len, self.table_state.selected()) {
            (0, _) => None,
            (_, None) => Some(0),
            (_, Some(index)) => Some(index.min(len - 1)),
        };
        self.table_state.select(selected);
    }
}

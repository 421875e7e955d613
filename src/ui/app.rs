// src/ui/app.rs

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::catalog::ScriptRecord;
use crate::monitor::OutputEvent;
use crate::types::ScriptId;

/// Append-only text pane, bounded to `max_lines`.
#[derive(Debug, Clone)]
pub struct OutputLog {
    lines: VecDeque<String>,
    max_lines: usize,
}

impl OutputLog {
    pub fn new(max_lines: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            max_lines: max_lines.max(1),
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push_back(line.into());
        while self.lines.len() > self.max_lines {
            self.lines.pop_front();
        }
    }

    pub fn extend<I: IntoIterator<Item = String>>(&mut self, lines: I) {
        for line in lines {
            self.push(line);
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }
}

/// Which field the add-script prompt is collecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptStep {
    Path,
    Title,
    Description,
}

impl PromptStep {
    pub fn label(self) -> &'static str {
        match self {
            PromptStep::Path => "Script file path",
            PromptStep::Title => "Enter a title for the script",
            PromptStep::Description => "Enter a description for the script",
        }
    }
}

/// Three-step "add script" dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddPrompt {
    pub step: PromptStep,
    pub input: String,
    path: String,
    title: String,
}

impl AddPrompt {
    fn new() -> Self {
        Self {
            step: PromptStep::Path,
            input: String::new(),
            path: String::new(),
            title: String::new(),
        }
    }
}

/// What the runner should do after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    None,
    Quit,
    /// Selection changed; re-render details for these ids.
    ShowSelection(Vec<ScriptId>),
    AddScript {
        path: PathBuf,
        title: String,
        description: String,
    },
    Start(Vec<ScriptId>),
    Stop(Vec<ScriptId>),
}

/// Explicit application state, independent of any terminal.
#[derive(Debug)]
pub struct App {
    scripts: Vec<ScriptRecord>,
    cursor: usize,
    selected: BTreeSet<ScriptId>,
    running: HashSet<PathBuf>,
    pub log: OutputLog,
    controls_enabled: bool,
    notice: Option<String>,
    prompt: Option<AddPrompt>,
    should_quit: bool,
}

impl App {
    pub fn new(max_log_lines: usize) -> Self {
        Self {
            scripts: Vec::new(),
            cursor: 0,
            selected: BTreeSet::new(),
            running: HashSet::new(),
            log: OutputLog::new(max_log_lines),
            controls_enabled: false,
            notice: None,
            prompt: None,
            should_quit: false,
        }
    }

    pub fn scripts(&self) -> &[ScriptRecord] {
        &self.scripts
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_selected(&self, id: ScriptId) -> bool {
        self.selected.contains(&id)
    }

    pub fn is_running(&self, record: &ScriptRecord) -> bool {
        self.running.contains(&record.path)
    }

    pub fn controls_enabled(&self) -> bool {
        self.controls_enabled
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn prompt(&self) -> Option<&AddPrompt> {
        self.prompt.as_ref()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Replace the list (after load or insert). Selections of ids that no
    /// longer exist are dropped.
    pub fn set_scripts(&mut self, scripts: Vec<ScriptRecord>) {
        let ids: BTreeSet<ScriptId> = scripts.iter().map(|s| s.id).collect();
        self.selected.retain(|id| ids.contains(id));
        self.scripts = scripts;
        if self.cursor >= self.scripts.len() {
            self.cursor = self.scripts.len().saturating_sub(1);
        }
    }

    /// Selected ids, in list order.
    pub fn selected_ids(&self) -> Vec<ScriptId> {
        self.scripts
            .iter()
            .map(|s| s.id)
            .filter(|id| self.selected.contains(id))
            .collect()
    }

    /// Clear the log and write the details of each selected record.
    pub fn render_selection(&mut self, records: &[ScriptRecord]) {
        self.log.clear();
        for record in records {
            self.log.extend(record.details());
        }
        self.controls_enabled = true;
    }

    pub fn show_notice(&mut self, text: impl Into<String>) {
        self.notice = Some(text.into());
    }

    /// No more key events will arrive, so nothing could ever quit the UI.
    pub fn input_closed(&mut self) {
        self.should_quit = true;
    }

    /// Fold a supervisor event into the log, notice and running set.
    pub fn apply_event(&mut self, event: &OutputEvent) {
        match event {
            OutputEvent::Started { path, .. } => {
                self.running.insert(path.clone());
            }
            OutputEvent::Stopped { path, .. } | OutputEvent::Finished { path, .. } => {
                self.running.remove(path);
            }
            _ => {}
        }
        self.log.extend(event.log_lines());
        if let Some(text) = event.notice() {
            self.notice = Some(text);
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> AppAction {
        if key.kind == KeyEventKind::Release {
            return AppAction::None;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return AppAction::Quit;
        }
        if self.notice.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                self.notice = None;
            }
            return AppAction::None;
        }
        if self.prompt.is_some() {
            return self.handle_prompt_key(key);
        }

        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                AppAction::Quit
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.cursor = self.cursor.saturating_sub(1);
                AppAction::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.cursor + 1 < self.scripts.len() {
                    self.cursor += 1;
                }
                AppAction::None
            }
            KeyCode::Char(' ') => self.toggle_at_cursor(),
            KeyCode::Char('a') => {
                self.prompt = Some(AddPrompt::new());
                AppAction::None
            }
            KeyCode::Char('s') if self.controls_enabled => {
                AppAction::Start(self.selected_ids())
            }
            KeyCode::Char('x') if self.controls_enabled => AppAction::Stop(self.selected_ids()),
            _ => AppAction::None,
        }
    }

    fn toggle_at_cursor(&mut self) -> AppAction {
        let Some(id) = self.scripts.get(self.cursor).map(|s| s.id) else {
            return AppAction::None;
        };
        if !self.selected.remove(&id) {
            self.selected.insert(id);
        }
        let ids = self.selected_ids();
        if ids.is_empty() {
            // Nothing left to show; keep the log and controls as they are.
            AppAction::None
        } else {
            AppAction::ShowSelection(ids)
        }
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) -> AppAction {
        let Some(prompt) = self.prompt.as_mut() else {
            return AppAction::None;
        };

        match key.code {
            KeyCode::Esc => {
                self.prompt = None;
                AppAction::None
            }
            KeyCode::Backspace => {
                prompt.input.pop();
                AppAction::None
            }
            KeyCode::Char(c) => {
                prompt.input.push(c);
                AppAction::None
            }
            KeyCode::Enter => {
                let value = std::mem::take(&mut prompt.input);
                match prompt.step {
                    PromptStep::Path => {
                        if value.trim().is_empty() {
                            self.prompt = None;
                        } else {
                            prompt.path = value.trim().to_string();
                            prompt.step = PromptStep::Title;
                        }
                        AppAction::None
                    }
                    PromptStep::Title => {
                        prompt.title = value;
                        prompt.step = PromptStep::Description;
                        AppAction::None
                    }
                    PromptStep::Description => {
                        let prompt = self.prompt.take().unwrap_or_else(AddPrompt::new);
                        AppAction::AddScript {
                            path: PathBuf::from(prompt.path),
                            title: prompt.title,
                            description: value,
                        }
                    }
                }
            }
            _ => AppAction::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::tracker::{CapturedOutput, ExitSummary};
    use crate::types::Timestamp;

    fn record(id: i64, title: &str) -> ScriptRecord {
        ScriptRecord {
            id: ScriptId(id),
            title: title.to_string(),
            description: format!("{title} description"),
            path: PathBuf::from(format!("/tmp/{title}.py")),
            date_added: Timestamp::parse("2024-05-06 07:08:09").unwrap(),
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn controls_stay_disabled_until_a_selection_is_rendered() {
        let mut app = App::new(100);
        app.set_scripts(vec![record(1, "Ping")]);

        assert_eq!(app.handle_key(key(KeyCode::Char('s'))), AppAction::None);
        assert_eq!(
            app.handle_key(key(KeyCode::Char(' '))),
            AppAction::ShowSelection(vec![ScriptId(1)])
        );

        app.render_selection(&[record(1, "Ping")]);
        assert!(app.controls_enabled());
        assert_eq!(
            app.handle_key(key(KeyCode::Char('s'))),
            AppAction::Start(vec![ScriptId(1)])
        );
        assert_eq!(
            app.handle_key(key(KeyCode::Char('x'))),
            AppAction::Stop(vec![ScriptId(1)])
        );
    }

    #[test]
    fn multi_select_reports_ids_in_list_order() {
        let mut app = App::new(100);
        app.set_scripts(vec![record(1, "a"), record(2, "b"), record(3, "c")]);

        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Char(' ')));
        app.handle_key(key(KeyCode::Up));
        app.handle_key(key(KeyCode::Up));
        let action = app.handle_key(key(KeyCode::Char(' ')));

        assert_eq!(action, AppAction::ShowSelection(vec![ScriptId(1), ScriptId(3)]));
    }

    #[test]
    fn selection_render_clears_then_rewrites_the_log() {
        let mut app = App::new(100);
        app.log.push("old line");
        app.render_selection(&[record(1, "Ping"), record(2, "Pong")]);

        let lines: Vec<_> = app.log.lines().collect();
        assert_eq!(lines[0], "Selected script: Ping");
        assert_eq!(lines[1], "Description: Ping description");
        assert_eq!(lines[2], "Path: /tmp/Ping.py");
        assert_eq!(lines[3], "Date Added: 2024-05-06 07:08:09");
        assert_eq!(lines[5], "Selected script: Pong");
        assert!(!lines.contains(&"old line"));
    }

    #[test]
    fn add_prompt_collects_three_fields() {
        let mut app = App::new(100);
        app.handle_key(key(KeyCode::Char('a')));
        type_text(&mut app, "/tmp/sleep.py");
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.prompt().unwrap().step, PromptStep::Title);
        type_text(&mut app, "Pingg");
        app.handle_key(key(KeyCode::Backspace));
        app.handle_key(key(KeyCode::Enter));
        type_text(&mut app, "sleeps");

        let action = app.handle_key(key(KeyCode::Enter));
        assert_eq!(
            action,
            AppAction::AddScript {
                path: PathBuf::from("/tmp/sleep.py"),
                title: "Ping".into(),
                description: "sleeps".into(),
            }
        );
        assert!(app.prompt().is_none());
    }

    #[test]
    fn empty_path_cancels_the_prompt() {
        let mut app = App::new(100);
        app.handle_key(key(KeyCode::Char('a')));
        assert_eq!(app.handle_key(key(KeyCode::Enter)), AppAction::None);
        assert!(app.prompt().is_none());
    }

    #[test]
    fn quit_key_is_text_while_prompting() {
        let mut app = App::new(100);
        app.handle_key(key(KeyCode::Char('a')));
        assert_eq!(app.handle_key(key(KeyCode::Char('q'))), AppAction::None);
        assert_eq!(app.prompt().unwrap().input, "q");
        assert!(!app.should_quit());
    }

    #[test]
    fn closed_input_quits_even_with_a_notice_open() {
        let mut app = App::new(100);
        app.show_notice("Script 7 no longer exists.");
        app.input_closed();
        assert!(app.should_quit());
    }

    #[test]
    fn notice_blocks_keys_until_dismissed() {
        let mut app = App::new(100);
        app.set_scripts(vec![record(1, "Ping")]);
        app.apply_event(&OutputEvent::NotRunning {
            title: "Ping".into(),
            path: PathBuf::from("/tmp/Ping.py"),
        });
        assert_eq!(app.notice(), Some("Script 'Ping' is not running."));
        assert!(app.log.is_empty());

        assert_eq!(app.handle_key(key(KeyCode::Char('q'))), AppAction::None);
        app.handle_key(key(KeyCode::Enter));
        assert!(app.notice().is_none());
        assert_eq!(app.handle_key(key(KeyCode::Char('q'))), AppAction::Quit);
    }

    #[test]
    fn running_set_follows_lifecycle_events() {
        let mut app = App::new(100);
        let ping = record(1, "Ping");
        app.apply_event(&OutputEvent::Started {
            title: "Ping".into(),
            path: ping.path.clone(),
            pid: Some(7),
        });
        assert!(app.is_running(&ping));

        app.apply_event(&OutputEvent::Finished {
            title: Some("Ping".into()),
            path: ping.path.clone(),
            elapsed: Duration::from_secs(2),
            exit: ExitSummary::from_code(0),
            output: CapturedOutput::default(),
        });
        assert!(!app.is_running(&ping));
        let lines: Vec<_> = app.log.lines().collect();
        assert_eq!(lines[0], "Started script: Ping");
        assert_eq!(lines[1], "Script finished: Ping");
    }

    #[test]
    fn output_log_drops_oldest_lines_past_capacity() {
        let mut log = OutputLog::new(2);
        log.push("1");
        log.push("2");
        log.push("3");
        assert_eq!(log.lines().collect::<Vec<_>>(), vec!["2", "3"]);
    }

    #[test]
    fn shrinking_list_clamps_cursor_and_selection() {
        let mut app = App::new(10);
        app.set_scripts(vec![record(1, "a"), record(2, "b")]);
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Char(' ')));

        app.set_scripts(vec![record(1, "a")]);
        assert_eq!(app.cursor(), 0);
        assert!(app.selected_ids().is_empty());
    }
}

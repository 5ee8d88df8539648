use std::io;
use std::path::Path;
use std::time::{Duration, Instant};

use crossterm::ExecutableCommand;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs, Wrap};
use ratatui::{Frame, Terminal};

use crate::commands::list::Filter;
use crate::error::{PrioError, Result};
use crate::model::{Priority, Sequence, Task};
use crate::session::Session;
use crate::store::slot::{SlotStore, Theme};
use crate::task_id::TaskId;

const TICK_RATE: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputMode {
    Normal,
    Adding,
    EditingText,
    EditingDue,
    ConfirmClear,
}

struct ThemeStyles {
    accent: Color,
    border: Color,
    done: Style,
}

fn theme_styles(theme: Theme) -> ThemeStyles {
    match theme {
        Theme::Dark => ThemeStyles {
            accent: Color::Cyan,
            border: Color::DarkGray,
            done: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::CROSSED_OUT),
        },
        Theme::Light => ThemeStyles {
            accent: Color::Blue,
            border: Color::Gray,
            done: Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::CROSSED_OUT),
        },
    }
}

fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::High => Color::Red,
        Priority::Medium => Color::Yellow,
        Priority::Low => Color::Green,
    }
}

struct PrioTuiApp {
    session: Session,
    theme: Theme,
    filter: Filter,
    pane: Sequence,
    selected: [usize; 2],
    mode: InputMode,
    input: String,
    add_priority: Priority,
    notice: Option<String>,
}

impl PrioTuiApp {
    fn new(session: Session, theme: Theme) -> Self {
        Self {
            session,
            theme,
            filter: Filter::All,
            pane: Sequence::Pending,
            selected: [0, 0],
            mode: InputMode::Normal,
            input: String::new(),
            add_priority: Priority::default(),
            notice: None,
        }
    }

    fn pane_index(pane: Sequence) -> usize {
        match pane {
            Sequence::Pending => 0,
            Sequence::Completed => 1,
        }
    }

    /// Keep the focused pane visible and the selection in range after any
    /// mutation or filter change.
    fn normalize_selection(&mut self) {
        match self.filter {
            Filter::Pending => self.pane = Sequence::Pending,
            Filter::Completed => self.pane = Sequence::Completed,
            Filter::All => {}
        }
        for pane in [Sequence::Pending, Sequence::Completed] {
            let len = self.session.sequence(pane).len();
            let slot = &mut self.selected[Self::pane_index(pane)];
            *slot = (*slot).min(len.saturating_sub(1));
        }
    }

    fn selected_id(&self) -> Option<TaskId> {
        self.session
            .sequence(self.pane)
            .get(self.selected[Self::pane_index(self.pane)])
            .map(|task| task.id.clone())
    }

    /// Follow a record after a mutation moved it around.
    fn reselect(&mut self, id: &TaskId) {
        if let Some((seq, idx)) = self.session.locate(id) {
            self.pane = seq;
            self.selected[Self::pane_index(seq)] = idx;
        }
        self.normalize_selection();
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.session.sequence(self.pane).len();
        if len == 0 {
            return;
        }
        let slot = &mut self.selected[Self::pane_index(self.pane)];
        *slot = slot
            .saturating_add_signed(delta)
            .min(len - 1);
    }

    fn switch_pane(&mut self) {
        if self.filter != Filter::All {
            return;
        }
        self.pane = match self.pane {
            Sequence::Pending => Sequence::Completed,
            Sequence::Completed => Sequence::Pending,
        };
    }

    /// Returns true when the app should quit.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.kind == KeyEventKind::Release {
            return false;
        }
        match self.mode {
            InputMode::Normal => self.handle_normal_key(key),
            InputMode::ConfirmClear => {
                if let KeyCode::Char('y') = key.code {
                    self.session.clear_completed();
                }
                self.mode = InputMode::Normal;
                self.normalize_selection();
                false
            }
            _ => self.handle_input_key(key),
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> bool {
        self.notice = None;
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Tab | KeyCode::Left | KeyCode::Right | KeyCode::Char('h' | 'l') => {
                self.switch_pane();
            }
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
            KeyCode::Char('1') => self.filter = Filter::All,
            KeyCode::Char('2') => self.filter = Filter::Pending,
            KeyCode::Char('3') => self.filter = Filter::Completed,
            KeyCode::Char('a') => {
                self.mode = InputMode::Adding;
                self.input.clear();
                self.add_priority = Priority::default();
            }
            KeyCode::Char('e') => {
                if let Some(id) = self.selected_id() {
                    self.input = self.session.find(&id).map(|t| t.text.clone()).unwrap_or_default();
                    self.mode = InputMode::EditingText;
                }
            }
            KeyCode::Char('d') => {
                if let Some(id) = self.selected_id() {
                    self.input = self
                        .session
                        .find(&id)
                        .and_then(|t| t.due_date)
                        .map(|d| d.to_string())
                        .unwrap_or_default();
                    self.mode = InputMode::EditingDue;
                }
            }
            KeyCode::Char(' ') | KeyCode::Enter => self.toggle_selected(),
            KeyCode::Char('x') | KeyCode::Delete => {
                if let Some(id) = self.selected_id() {
                    self.session.remove(&id);
                    self.normalize_selection();
                }
            }
            KeyCode::Char('J') => self.drag_selected(1),
            KeyCode::Char('K') => self.drag_selected(-1),
            KeyCode::Char('c') => {
                if !self.session.completed().is_empty() {
                    self.mode = InputMode::ConfirmClear;
                }
            }
            KeyCode::Char('t') => {
                self.theme = match self.theme {
                    Theme::Dark => Theme::Light,
                    Theme::Light => Theme::Dark,
                };
            }
            _ => {}
        }
        false
    }

    /// Complete/restore the selected record; the drag-across-lists gesture
    /// and the buttons of the original UI collapse to the same transition.
    fn toggle_selected(&mut self) {
        let Some(id) = self.selected_id() else { return };
        match self.pane {
            Sequence::Pending => self.session.complete(&id),
            Sequence::Completed => self.session.restore(&id),
        };
        self.reselect(&id);
    }

    /// The in-list drag gesture. The store re-sorts on drop, so the move
    /// only sticks against records with equal sort keys; anything else
    /// visibly snaps back, as in the original UI.
    fn drag_selected(&mut self, delta: isize) {
        let Some(id) = self.selected_id() else { return };
        let tasks = self.session.sequence(self.pane);
        let idx = self.selected[Self::pane_index(self.pane)];
        let anchor = match delta {
            d if d < 0 => idx.checked_sub(1).and_then(|i| tasks.get(i)),
            _ => tasks.get(idx + 2),
        }
        .map(|t| t.id.clone());
        self.session.reorder(&id, anchor.as_ref(), self.pane);
        self.reselect(&id);
    }

    fn handle_input_key(&mut self, key: KeyEvent) -> bool {
        self.notice = None;
        match key.code {
            KeyCode::Esc => {
                self.mode = InputMode::Normal;
                self.input.clear();
            }
            KeyCode::Enter => self.commit_input(),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Tab if self.mode == InputMode::Adding => {
                self.add_priority = match self.add_priority {
                    Priority::High => Priority::Medium,
                    Priority::Medium => Priority::Low,
                    Priority::Low => Priority::High,
                };
            }
            KeyCode::Char(ch) => {
                if !key.modifiers.contains(KeyModifiers::CONTROL)
                    && !key.modifiers.contains(KeyModifiers::ALT)
                {
                    self.input.push(ch);
                }
            }
            _ => {}
        }
        false
    }

    fn commit_input(&mut self) {
        let outcome = match self.mode {
            InputMode::Adding => self
                .session
                .add(&self.input.clone(), self.add_priority, None)
                .map(|id| self.reselect(&id)),
            InputMode::EditingText => match self.selected_id() {
                Some(id) => self.session.edit_text(&id, &self.input.clone()).map(|_| ()),
                None => Ok(()),
            },
            InputMode::EditingDue => self.commit_due_input(),
            _ => Ok(()),
        };
        match outcome {
            Ok(()) => {
                self.mode = InputMode::Normal;
                self.input.clear();
            }
            // Keep the input open so the user can fix it; the notice is the
            // "immediate rejection" surface for input errors.
            Err(err) => self.notice = Some(err.to_string()),
        }
    }

    fn commit_due_input(&mut self) -> Result<()> {
        let Some(id) = self.selected_id() else {
            return Ok(());
        };
        let raw = self.input.trim();
        let due = if raw.is_empty() {
            None
        } else {
            Some(
                raw.parse()
                    .map_err(|_| PrioError::InvalidDueDate(raw.to_string()))?,
            )
        };
        self.session.edit_due_date(&id, due);
        self.reselect(&id);
        Ok(())
    }

    fn render(&self, frame: &mut Frame) {
        let styles = theme_styles(self.theme);
        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(4),
                Constraint::Length(3),
            ])
            .split(frame.area());

        let filter_idx = match self.filter {
            Filter::All => 0,
            Filter::Pending => 1,
            Filter::Completed => 2,
        };
        frame.render_widget(
            Tabs::new(vec!["All [1]", "Pending [2]", "Completed [3]"])
                .select(filter_idx)
                .highlight_style(
                    Style::default()
                        .fg(styles.accent)
                        .add_modifier(Modifier::BOLD),
                )
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(styles.border))
                        .title("prio"),
                ),
            outer[0],
        );

        match self.filter {
            Filter::All => {
                let halves = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                    .split(outer[1]);
                self.render_pane(frame, halves[0], Sequence::Pending, &styles);
                self.render_pane(frame, halves[1], Sequence::Completed, &styles);
            }
            Filter::Pending => self.render_pane(frame, outer[1], Sequence::Pending, &styles),
            Filter::Completed => self.render_pane(frame, outer[1], Sequence::Completed, &styles),
        }

        frame.render_widget(
            Paragraph::new(self.status_line())
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(styles.border))
                        .title(self.session.counter().to_string()),
                )
                .wrap(Wrap { trim: true }),
            outer[2],
        );
    }

    fn render_pane(&self, frame: &mut Frame, area: Rect, pane: Sequence, styles: &ThemeStyles) {
        let tasks = self.session.sequence(pane);
        let title = format!("{} ({})", capitalize(pane), tasks.len());
        let active = self.pane == pane;
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(if active {
                styles.accent
            } else {
                styles.border
            }))
            .title(title);

        if tasks.is_empty() {
            frame.render_widget(Paragraph::new("(empty)").block(block), area);
            return;
        }

        let done = pane == Sequence::Completed;
        let items: Vec<ListItem> = tasks.iter().map(|task| task_item(task, done, styles)).collect();

        let mut state = ListState::default();
        if self.pane == pane {
            state.select(Some(self.selected[Self::pane_index(pane)]));
        }

        frame.render_stateful_widget(
            List::new(items)
                .block(block)
                .highlight_style(
                    Style::default()
                        .fg(styles.accent)
                        .add_modifier(Modifier::BOLD),
                )
                .highlight_symbol("> "),
            area,
            &mut state,
        );
    }

    fn status_line(&self) -> String {
        if let Some(notice) = &self.notice {
            return format!("! {notice}");
        }
        match self.mode {
            InputMode::Adding => format!(
                "add [{}]: {}_  (Tab cycles priority, Enter saves, Esc cancels)",
                self.add_priority, self.input
            ),
            InputMode::EditingText => format!("edit: {}_  (Enter saves, Esc cancels)", self.input),
            InputMode::EditingDue => format!(
                "due YYYY-MM-DD, empty clears: {}_  (Enter saves, Esc cancels)",
                self.input
            ),
            InputMode::ConfirmClear => format!(
                "clear {} completed task(s)? (y/n)",
                self.session.completed().len()
            ),
            InputMode::Normal => {
                "a add | e edit | d due | space done/restore | x remove | J/K drag | \
                 c clear | t theme | q quit"
                    .to_string()
            }
        }
    }
}

fn capitalize(seq: Sequence) -> &'static str {
    match seq {
        Sequence::Pending => "Pending",
        Sequence::Completed => "Completed",
    }
}

fn task_item<'a>(task: &'a Task, done: bool, styles: &ThemeStyles) -> ListItem<'a> {
    let mut spans = vec![
        if done {
            Span::styled(task.text.as_str(), styles.done)
        } else {
            Span::raw(task.text.as_str())
        },
        Span::styled(
            format!(" [{}]", task.priority),
            Style::default().fg(priority_color(task.priority)),
        ),
    ];
    if let Some(due) = task.due_date {
        spans.push(Span::raw(format!(" due {due}")));
    }
    ListItem::new(Line::from(spans))
}

pub fn run(dir_root: &Path) -> Result<()> {
    let slot = SlotStore::open(dir_root)?;
    let session = Session::open(dir_root)?;
    let mut app = PrioTuiApp::new(session, slot.theme());

    let mut stdout = io::stdout();
    enable_raw_mode()?;
    stdout.execute(EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result = run_loop(&mut terminal, &mut app);

    disable_raw_mode()?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // Theme belongs to the view; persist it on the way out, best-effort.
    let _ = slot.set_theme(app.theme);
    app.session.flush();

    run_result
}

fn run_loop<B: Backend>(terminal: &mut Terminal<B>, app: &mut PrioTuiApp) -> Result<()> {
    let mut last_tick = Instant::now();
    loop {
        app.normalize_selection();
        terminal
            .draw(|frame| app.render(frame))
            .map_err(|err| std::io::Error::other(err.to_string()))?;

        let timeout = TICK_RATE.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && app.handle_key(key)
        {
            break;
        }

        if last_tick.elapsed() >= TICK_RATE {
            last_tick = Instant::now();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app_with(texts: &[(&str, Priority)]) -> PrioTuiApp {
        let mut session = Session::ephemeral();
        for (text, priority) in texts {
            session.add(text, *priority, None).unwrap();
        }
        PrioTuiApp::new(session, Theme::Light)
    }

    fn press(app: &mut PrioTuiApp, code: KeyCode) -> bool {
        app.handle_key(KeyEvent::from(code))
    }

    fn type_text(app: &mut PrioTuiApp, text: &str) {
        for ch in text.chars() {
            press(app, KeyCode::Char(ch));
        }
    }

    #[test]
    fn q_quits_from_normal_mode() {
        let mut app = app_with(&[]);
        assert!(press(&mut app, KeyCode::Char('q')));
    }

    #[test]
    fn typing_through_add_mode_creates_a_task() {
        let mut app = app_with(&[]);
        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "new thing");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.session.pending().len(), 1);
        assert_eq!(app.session.pending()[0].text, "new thing");
        assert_eq!(app.mode, InputMode::Normal);
    }

    #[test]
    fn empty_add_is_rejected_with_a_notice() {
        let mut app = app_with(&[]);
        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "   ");
        press(&mut app, KeyCode::Enter);

        assert!(app.session.pending().is_empty());
        assert!(app.notice.is_some());
        // Still in add mode so the user can fix the input.
        assert_eq!(app.mode, InputMode::Adding);
    }

    #[test]
    fn tab_cycles_add_priority() {
        let mut app = app_with(&[]);
        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.add_priority, Priority::Medium);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.add_priority, Priority::Low);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.add_priority, Priority::High);
    }

    #[test]
    fn space_toggles_completion_and_follows_the_task() {
        let mut app = app_with(&[("only", Priority::Medium)]);
        press(&mut app, KeyCode::Char(' '));
        assert!(app.session.pending().is_empty());
        assert_eq!(app.session.completed().len(), 1);
        assert_eq!(app.pane, Sequence::Completed);

        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.session.pending().len(), 1);
        assert_eq!(app.pane, Sequence::Pending);
    }

    #[test]
    fn x_removes_the_selected_task() {
        let mut app = app_with(&[("a", Priority::High), ("b", Priority::Low)]);
        press(&mut app, KeyCode::Char('x'));
        assert_eq!(app.session.pending().len(), 1);
        assert_eq!(app.session.pending()[0].text, "b");
    }

    #[test]
    fn drag_between_equal_priorities_sticks() {
        let mut app = app_with(&[("a", Priority::Medium), ("b", Priority::Medium)]);
        // Select "b", drag it up past "a".
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Char('K'));
        let texts: Vec<&str> = app.session.pending().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["b", "a"]);
        // Selection follows the dragged record.
        assert_eq!(app.selected[0], 0);
    }

    #[test]
    fn drag_against_the_sort_snaps_back() {
        let mut app = app_with(&[("h", Priority::High), ("l", Priority::Low)]);
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Char('K'));
        let texts: Vec<&str> = app.session.pending().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["h", "l"]);
    }

    #[test]
    fn clear_requires_confirmation() {
        let mut app = app_with(&[("a", Priority::Medium)]);
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.mode, InputMode::ConfirmClear);

        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.session.completed().len(), 1);

        press(&mut app, KeyCode::Char('c'));
        press(&mut app, KeyCode::Char('y'));
        assert!(app.session.completed().is_empty());
    }

    #[test]
    fn filter_keys_force_the_focused_pane() {
        let mut app = app_with(&[("a", Priority::Medium)]);
        press(&mut app, KeyCode::Char('3'));
        app.normalize_selection();
        assert_eq!(app.filter, Filter::Completed);
        assert_eq!(app.pane, Sequence::Completed);
    }

    #[test]
    fn theme_toggle_flips() {
        let mut app = app_with(&[]);
        press(&mut app, KeyCode::Char('t'));
        assert_eq!(app.theme, Theme::Dark);
        press(&mut app, KeyCode::Char('t'));
        assert_eq!(app.theme, Theme::Light);
    }

    #[test]
    fn due_date_input_rejects_garbage() {
        let mut app = app_with(&[("a", Priority::Medium)]);
        press(&mut app, KeyCode::Char('d'));
        type_text(&mut app, "tomorrow");
        press(&mut app, KeyCode::Enter);
        assert!(app.notice.as_deref().is_some_and(|n| n.contains("due date")));
        assert_eq!(app.session.pending()[0].due_date, None);
    }

    #[test]
    fn due_date_input_sets_and_clears() {
        let mut app = app_with(&[("a", Priority::Medium)]);
        press(&mut app, KeyCode::Char('d'));
        type_text(&mut app, "2024-04-05");
        press(&mut app, KeyCode::Enter);
        assert_eq!(
            app.session.pending()[0].due_date,
            Some("2024-04-05".parse().unwrap())
        );

        press(&mut app, KeyCode::Char('d'));
        for _ in 0.."2024-04-05".len() {
            press(&mut app, KeyCode::Backspace);
        }
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.session.pending()[0].due_date, None);
    }

    #[test]
    fn render_smoke_test() {
        use ratatui::backend::TestBackend;
        let mut app = app_with(&[("a", Priority::High), ("b", Priority::Low)]);
        press(&mut app, KeyCode::Char(' '));
        app.normalize_selection();

        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| app.render(frame)).unwrap();
    }
}

//! Terminal host for the search dialog.

use async_trait::async_trait;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::{Frame, Terminal};
use std::io::{self, Stdout};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

use crate::dialog::{DialogEvent, DialogView, Focus, Key, Notice, NoticeLevel};
use crate::error::Result;
use crate::shell::DialogHost;

const POLL_INTERVAL: Duration = Duration::from_millis(100);
/// Rows taken by one result entry (title line plus "year | type" line)
const ROWS_PER_RESULT: u16 = 2;

struct Reader {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Draws the dialog with ratatui and reads input through crossterm.
///
/// Notices posted while the dialog is up are printed once the terminal has
/// been restored.
#[derive(Default)]
pub struct TerminalHost {
    terminal: Option<Terminal<CrosstermBackend<Stdout>>>,
    reader: Option<Reader>,
    events: Option<mpsc::UnboundedReceiver<Event>>,
    list_state: ListState,
    list_area: Rect,
    pending: Vec<Notice>,
}

impl TerminalHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn restore(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.stop.store(true, Ordering::SeqCst);
            let _ = reader.handle.join();
        }
        self.events = None;

        if let Some(mut terminal) = self.terminal.take() {
            let _ = disable_raw_mode();
            let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture);
            let _ = terminal.show_cursor();
        }
    }

    fn translate(&self, event: Event) -> Option<DialogEvent> {
        match event {
            Event::Key(key) => map_key(key).map(DialogEvent::Key),
            Event::Mouse(mouse) => self.map_click(mouse),
            _ => None,
        }
    }

    fn map_click(&self, mouse: MouseEvent) -> Option<DialogEvent> {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return None;
        }
        let index = row_to_index(self.list_area, self.list_state.offset(), mouse.column, mouse.row)?;
        Some(DialogEvent::Click(index))
    }
}

fn map_key(key: KeyEvent) -> Option<Key> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    let mapped = match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Key::Esc,
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Enter => Key::Enter,
        KeyCode::Tab if key.modifiers.contains(KeyModifiers::SHIFT) => Key::BackTab,
        KeyCode::Tab => Key::Tab,
        KeyCode::BackTab => Key::BackTab,
        KeyCode::Esc => Key::Esc,
        _ => return None,
    };
    Some(mapped)
}

/// Index of the result drawn at `(column, row)` inside the bordered list area.
fn row_to_index(area: Rect, offset: usize, column: u16, row: u16) -> Option<usize> {
    let inner_x = area.x.saturating_add(1);
    let inner_y = area.y.saturating_add(1);
    let inner_right = area.right().saturating_sub(1);
    let inner_bottom = area.bottom().saturating_sub(1);

    if column < inner_x || column >= inner_right || row < inner_y || row >= inner_bottom {
        return None;
    }
    Some(offset + usize::from((row - inner_y) / ROWS_PER_RESULT))
}

fn spawn_reader(tx: mpsc::UnboundedSender<Event>) -> Reader {
    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);

    let handle = std::thread::spawn(move || {
        while !flag.load(Ordering::SeqCst) {
            match event::poll(POLL_INTERVAL) {
                Ok(true) => match event::read() {
                    Ok(event) => {
                        if tx.send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        debug!("Terminal read failed: {e}");
                        break;
                    }
                },
                Ok(false) => {}
                Err(e) => {
                    debug!("Terminal poll failed: {e}");
                    break;
                }
            }
        }
    });

    Reader { stop, handle }
}

fn draw(frame: &mut Frame, view: &DialogView<'_>, list_state: &mut ListState) -> Rect {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Query
            Constraint::Min(0),    // Results
            Constraint::Length(1), // Status
        ])
        .split(frame.area());

    let accent = Style::default().fg(Color::Yellow);
    let border = |focused: bool| {
        if focused {
            accent
        } else {
            Style::default().fg(Color::DarkGray)
        }
    };

    let query = Paragraph::new(view.query).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border(view.focus == Focus::Query))
            .title("Search movies and TV shows"),
    );
    frame.render_widget(query, chunks[0]);

    if view.focus == Focus::Query {
        let width = u16::try_from(view.query.chars().count()).unwrap_or(u16::MAX);
        let x = chunks[0]
            .x
            .saturating_add(1)
            .saturating_add(width)
            .min(chunks[0].right().saturating_sub(2));
        frame.set_cursor_position((x, chunks[0].y + 1));
    }

    let items: Vec<ListItem> = view
        .results
        .iter()
        .map(|result| {
            ListItem::new(vec![
                Line::from(Span::styled(
                    result.title.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    format!("{} | {}", result.year, result.kind),
                    Style::default().fg(Color::Gray),
                )),
            ])
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border(view.focus == Focus::Results))
                .title(format!("Results ({})", view.results.len())),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    if view.results.is_empty() {
        list_state.select(None);
    } else {
        list_state.select(Some(view.cursor));
    }
    frame.render_stateful_widget(list, chunks[1], list_state);

    let status = match view.status {
        Some(status) => Line::from(Span::styled(status.to_string(), accent)),
        None => Line::from(Span::styled(
            "Tab results · Shift-Tab query · ↑↓/jk move · Enter create · Esc cancel",
            Style::default().fg(Color::DarkGray),
        )),
    };
    frame.render_widget(Paragraph::new(status), chunks[2]);

    chunks[1]
}

fn print_notice(notice: &Notice) {
    match notice.level {
        NoticeLevel::Info => println!("{}", notice.message),
        NoticeLevel::Error => eprintln!("Error: {}", notice.message),
    }
}

#[async_trait]
impl DialogHost for TerminalHost {
    fn open(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen, EnableMouseCapture) {
            let _ = disable_raw_mode();
            return Err(e.into());
        }

        let terminal = match Terminal::new(CrosstermBackend::new(stdout)) {
            Ok(terminal) => terminal,
            Err(e) => {
                let _ = disable_raw_mode();
                let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
                return Err(e.into());
            }
        };
        self.terminal = Some(terminal);

        let (tx, rx) = mpsc::unbounded_channel();
        self.reader = Some(spawn_reader(tx));
        self.events = Some(rx);
        self.list_state = ListState::default();
        Ok(())
    }

    async fn next_event(&mut self) -> Option<DialogEvent> {
        loop {
            let event = self.events.as_mut()?.recv().await?;
            if let Some(mapped) = self.translate(event) {
                return Some(mapped);
            }
        }
    }

    fn render(&mut self, view: DialogView<'_>) -> Result<()> {
        let Some(terminal) = self.terminal.as_mut() else {
            return Ok(());
        };
        let list_state = &mut self.list_state;
        let mut list_area = Rect::default();
        terminal.draw(|frame| list_area = draw(frame, &view, list_state))?;
        self.list_area = list_area;
        Ok(())
    }

    fn notice(&mut self, notice: Notice) {
        if self.terminal.is_some() {
            self.pending.push(notice);
        } else {
            print_notice(&notice);
        }
    }

    fn close(&mut self) {
        self.restore();
        for notice in self.pending.drain(..) {
            print_notice(&notice);
        }
    }
}

impl Drop for TerminalHost {
    fn drop(&mut self) {
        self.restore();
    }
}

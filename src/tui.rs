use std::collections::VecDeque;
use std::io;
use std::sync::Mutex;
use std::time::Duration;

use crossterm::ExecutableCommand;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap};

use crate::app::{App, AssemblyEvent, AssemblySink, DisplayRecord};
use crate::domain::{AssetRole, StudyId};
use crate::error::ExplorerError;
use crate::navigation::Navigator;
use crate::raster::NormalizedImage;
use crate::staging::StagedRecord;

const LOGS_MAX: usize = 200;
const HALF_BLOCK: &str = "\u{2580}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Record,
    Logs,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputMode {
    Navigate,
    GoTo,
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Forward,
    Backward,
    First,
    Last,
}

/// Receives assembly diagnostics and keeps the newest entries for the log view.
#[derive(Debug, Default)]
struct EventLog {
    entries: Mutex<VecDeque<String>>,
}

impl EventLog {
    fn push(&self, message: String) {
        if let Ok(mut entries) = self.entries.lock() {
            push_log(&mut entries, format!("[{}] {message}", timestamp()));
        }
    }

    fn snapshot(&self) -> Vec<String> {
        self.entries
            .lock()
            .map(|entries| entries.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }
}

impl AssemblySink for EventLog {
    fn event(&self, event: AssemblyEvent) {
        self.push(event.to_string());
    }
}

struct Preview {
    key: (usize, u16, u16),
    lines: Vec<Line<'static>>,
}

pub struct Tui<'a> {
    navigator: Navigator<'a>,
    record: DisplayRecord,
    log: EventLog,
    view: View,
    input_mode: InputMode,
    input: String,
    status: String,
    report_scroll: u16,
    log_scroll: u16,
    staged: Option<StagedRecord>,
    previews: [Option<Preview>; 3],
}

impl<'a> Tui<'a> {
    pub fn new(app: &'a App, start: usize) -> Result<Self, ExplorerError> {
        let log = EventLog::default();
        let mut navigator = Navigator::new(app);
        let record = navigator.go_to(start, &log)?;
        Ok(Self {
            navigator,
            record,
            log,
            view: View::Record,
            input_mode: InputMode::Navigate,
            input: String::new(),
            status: "ready".to_string(),
            report_scroll: 0,
            log_scroll: 0,
            staged: None,
            previews: [None, None, None],
        })
    }

    pub fn record(&self) -> &DisplayRecord {
        &self.record
    }

    /// Runs until the user quits; the terminal is restored even on error.
    pub fn run(&mut self) -> Result<(), ExplorerError> {
        let mut stdout = io::stdout();
        enable_raw_mode().map_err(terminal_error)?;
        stdout
            .execute(EnterAlternateScreen)
            .map_err(terminal_error)?;

        let result = self.event_loop();

        disable_raw_mode().map_err(terminal_error)?;
        let mut stdout = io::stdout();
        stdout
            .execute(LeaveAlternateScreen)
            .map_err(terminal_error)?;
        self.staged = None;
        result
    }

    fn event_loop(&mut self) -> Result<(), ExplorerError> {
        let backend = CrosstermBackend::new(io::stdout());
        let mut terminal = Terminal::new(backend).map_err(terminal_error)?;
        terminal.clear().map_err(terminal_error)?;

        loop {
            terminal
                .draw(|frame| draw_ui(frame, self))
                .map_err(terminal_error)?;

            if event::poll(Duration::from_millis(200)).map_err(terminal_error)? {
                if let Event::Key(key) = event::read().map_err(terminal_error)? {
                    if self.handle_key(key) {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Returns true when the user asked to quit.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.kind != KeyEventKind::Press {
            return false;
        }
        if self.input_mode == InputMode::GoTo {
            self.handle_goto_key(key);
            return false;
        }

        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Esc => {
                if self.view == View::Record {
                    return true;
                }
                self.view = View::Record;
            }
            KeyCode::F(1) | KeyCode::Char('?') => self.view = View::Help,
            KeyCode::F(4) => {
                self.view = if self.view == View::Logs {
                    View::Record
                } else {
                    View::Logs
                };
            }
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('n') => self.step(Step::Forward),
            KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('p') => self.step(Step::Backward),
            KeyCode::Home | KeyCode::Char('g') => self.step(Step::First),
            KeyCode::End | KeyCode::Char('G') => self.step(Step::Last),
            KeyCode::Char(':') => {
                self.input_mode = InputMode::GoTo;
                self.input.clear();
            }
            KeyCode::Char('s') => self.stage(),
            KeyCode::PageUp => self.scroll(-5),
            KeyCode::PageDown => self.scroll(5),
            KeyCode::Up => self.scroll(-1),
            KeyCode::Down => self.scroll(1),
            _ => {}
        }
        false
    }

    fn handle_goto_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.input.clear();
                self.input_mode = InputMode::Navigate;
            }
            KeyCode::Enter => {
                let target = self.input.trim().to_string();
                self.input.clear();
                self.input_mode = InputMode::Navigate;
                if !target.is_empty() {
                    self.go_to(&target);
                }
            }
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(ch) => self.input.push(ch),
            _ => {}
        }
    }

    fn step(&mut self, step: Step) {
        let result = match step {
            Step::Forward => self.navigator.step_forward(&self.log),
            Step::Backward => self.navigator.step_backward(&self.log),
            Step::First => self.navigator.first(&self.log),
            Step::Last => self.navigator.last(&self.log),
        };
        self.show(result);
    }

    /// Plain numbers are navigation indices; `IMG`-prefixed input names a study.
    fn go_to(&mut self, target: &str) {
        let result = if target.chars().all(|ch| ch.is_ascii_digit()) {
            match target.parse::<usize>() {
                Ok(index) => self.navigator.go_to(index, &self.log),
                Err(_) => Err(ExplorerError::InvalidStudyId(target.to_string())),
            }
        } else {
            target
                .parse::<StudyId>()
                .and_then(|study| self.navigator.go_to_study(study, &self.log))
        };
        self.show(result);
    }

    fn show(&mut self, result: Result<DisplayRecord, ExplorerError>) {
        match result {
            Ok(record) => {
                self.record = record;
                self.staged = None;
                self.report_scroll = 0;
                self.status = format!(
                    "{} ({}/{})",
                    self.record.study,
                    self.record.index + 1,
                    self.navigator.len()
                );
            }
            Err(err) => {
                tracing::error!(error = %err, "navigation failed");
                self.log.push(err.to_string());
                self.status = err.to_string();
            }
        }
    }

    fn stage(&mut self) {
        self.staged = None;
        match StagedRecord::write(&self.record) {
            Ok(staged) => {
                for (role, path) in staged.paths() {
                    self.log.push(format!("staged {role}: {}", path.display()));
                }
                self.status = format!("staged to {}", staged.dir().display());
                self.staged = Some(staged);
            }
            Err(err) => {
                self.log.push(err.to_string());
                self.status = err.to_string();
            }
        }
    }

    fn scroll(&mut self, delta: i16) {
        match self.view {
            View::Logs => {
                self.log_scroll = scroll_offset(self.log_scroll, delta, self.log.len());
            }
            _ => {
                let lines = self.record.report.as_str().lines().count();
                self.report_scroll = scroll_offset(self.report_scroll, delta, lines);
            }
        }
    }

    fn preview(&mut self, role: AssetRole, area: Rect) -> Vec<Line<'static>> {
        let slot = role_slot(role);
        let key = (self.record.index, area.width, area.height);
        let stale = self.previews[slot]
            .as_ref()
            .map(|preview| preview.key != key)
            .unwrap_or(true);
        if stale {
            let lines = render_half_blocks(self.record.image(role), area.width, area.height);
            self.previews[slot] = Some(Preview { key, lines });
        }
        self.previews[slot]
            .as_ref()
            .map(|preview| preview.lines.clone())
            .unwrap_or_default()
    }
}

/// New top line after scrolling by `delta`, kept within `0..lines`.
fn scroll_offset(current: u16, delta: i16, lines: usize) -> u16 {
    let max = u16::try_from(lines.saturating_sub(1)).unwrap_or(u16::MAX);
    let next = if delta < 0 {
        current.saturating_sub(delta.unsigned_abs())
    } else {
        current.saturating_add(delta.unsigned_abs())
    };
    next.min(max)
}

fn role_slot(role: AssetRole) -> usize {
    match role {
        AssetRole::Raw => 0,
        AssetRole::Annotation => 1,
        AssetRole::Roi => 2,
    }
}

fn draw_ui(frame: &mut ratatui::Frame, tui: &mut Tui) {
    match tui.view {
        View::Record => draw_record(frame, tui),
        View::Logs => draw_logs(frame, tui),
        View::Help => draw_help(frame),
    }
}

fn draw_record(frame: &mut ratatui::Frame, tui: &mut Tui) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Percentage(55),
            Constraint::Length(4),
            Constraint::Min(4),
            Constraint::Length(2),
        ])
        .split(frame.area());

    frame.render_widget(draw_header(tui), chunks[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(chunks[1]);
    for (role, area) in AssetRole::ALL.into_iter().zip(columns.iter()) {
        let block = Block::default().borders(Borders::ALL).title(role.label());
        let inner = block.inner(*area);
        frame.render_widget(block, *area);
        let lines = tui.preview(role, inner);
        frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
    }

    frame.render_widget(draw_metadata(&tui.record), chunks[2]);

    let report = Paragraph::new(tui.record.report.as_str().to_string())
        .block(Block::default().borders(Borders::ALL).title("Report"))
        .wrap(Wrap { trim: false })
        .scroll((tui.report_scroll, 0));
    frame.render_widget(report, chunks[3]);

    frame.render_widget(draw_command_line(tui), chunks[4]);
}

fn draw_header(tui: &Tui) -> Paragraph<'static> {
    let line = Line::from(vec![
        Span::styled(
            "DMID EXPLORER",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            tui.record.study.to_string(),
            Style::default().fg(Color::Yellow),
        ),
        Span::styled(
            format!(
                "  index {}/{}",
                tui.record.index + 1,
                tui.navigator.len()
            ),
            Style::default().fg(Color::Gray),
        ),
    ]);
    Paragraph::new(line).block(Block::default().borders(Borders::BOTTOM))
}

fn draw_metadata(record: &DisplayRecord) -> Table<'static> {
    let columns = record.metadata.columns();
    let header = Row::new(
        columns
            .iter()
            .map(|name| Cell::from(name.clone()))
            .collect::<Vec<_>>(),
    )
    .style(Style::default().fg(Color::Cyan));
    let values = Row::new(
        record
            .metadata
            .values()
            .iter()
            .map(|value| Cell::from(value.clone()))
            .collect::<Vec<_>>(),
    );
    let count = columns.len().max(1) as u32;
    let widths = (0..count).map(|_| Constraint::Ratio(1, count));
    Table::new(vec![values], widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title("Metadata"))
}

fn draw_command_line(tui: &Tui) -> Paragraph<'static> {
    let line = match tui.input_mode {
        InputMode::GoTo => Line::from(vec![
            Span::styled("go to (index or IMG<NNN>): ", Style::default().fg(Color::Yellow)),
            Span::raw(tui.input.clone()),
        ]),
        InputMode::Navigate => Line::from(vec![
            Span::styled(tui.status.clone(), Style::default().fg(Color::Green)),
            Span::styled(
                "   \u{2190}/\u{2192} navigate  : go to  s stage  F4 log  ? help  q quit",
                Style::default().fg(Color::DarkGray),
            ),
        ]),
    };
    Paragraph::new(line).block(Block::default().borders(Borders::TOP))
}

fn draw_logs(frame: &mut ratatui::Frame, tui: &Tui) {
    let lines = tui
        .log
        .snapshot()
        .into_iter()
        .map(Line::from)
        .collect::<Vec<_>>();
    let view = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Event log (F4 to close)"))
        .wrap(Wrap { trim: false })
        .scroll((tui.log_scroll, 0));
    frame.render_widget(view, frame.area());
}

fn draw_help(frame: &mut ratatui::Frame) {
    let block = Block::default().borders(Borders::ALL).title("Help");
    let lines = vec![
        Line::from("\u{2192} / l / n    next study"),
        Line::from("\u{2190} / h / p    previous study"),
        Line::from("Home / g     first study"),
        Line::from("End / G      last study"),
        Line::from(":            go to an index or IMG<NNN>"),
        Line::from("s            stage images as PNG files until the next move"),
        Line::from("PgUp / PgDn  scroll report (or log)"),
        Line::from("F4           event log"),
        Line::from("Esc          back / quit"),
        Line::from("q            quit"),
    ];
    let view = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    frame.render_widget(view, frame.area());
}

/// Two vertical pixels per terminal cell using the upper half block.
fn render_half_blocks(image: &NormalizedImage, cols: u16, rows: u16) -> Vec<Line<'static>> {
    let (width, height) = image.dimensions();
    if cols == 0 || rows == 0 || width == 0 || height == 0 {
        return Vec::new();
    }
    let max_w = u32::from(cols).min(width);
    let max_h = (u32::from(rows) * 2).min(height);
    let scale = (max_w as f64 / width as f64).min(max_h as f64 / height as f64);
    let target_w = ((width as f64 * scale).round() as u32).clamp(1, max_w);
    let target_h = ((height as f64 * scale).round() as u32).clamp(1, max_h);
    let small = image.thumbnail(target_w, target_h);

    (0..target_h)
        .step_by(2)
        .map(|y| {
            let spans = (0..target_w)
                .map(|x| {
                    let [tr, tg, tb] = small.pixel_rgb(x, y);
                    let mut style = Style::default().fg(Color::Rgb(tr, tg, tb));
                    if y + 1 < target_h {
                        let [br, bg, bb] = small.pixel_rgb(x, y + 1);
                        style = style.bg(Color::Rgb(br, bg, bb));
                    }
                    Span::styled(HALF_BLOCK, style)
                })
                .collect::<Vec<_>>();
            Line::from(spans)
        })
        .collect()
}

fn terminal_error(err: io::Error) -> ExplorerError {
    ExplorerError::Terminal(err.to_string())
}

fn push_log(buffer: &mut VecDeque<String>, item: String) {
    buffer.push_back(item);
    while buffer.len() > LOGS_MAX {
        buffer.pop_front();
    }
}

fn timestamp() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

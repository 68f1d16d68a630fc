//! Ratatui-based terminal UI.
//!
//! One tab per model. The left panel is the model's checklist (its equations)
//! and the range/count controls of the focused variable; the right panel
//! stacks one chart per figure row. Every edit is sent through the session's
//! control dispatch, exactly as a web front-end would send it.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs},
    Terminal,
};
use tracing::debug;

use crate::app::{ModelView, ParamControls, Session};
use crate::controls::{ControlId, UiEvent};
use crate::domain::Update;
use crate::error::AppError;

mod plotters_chart;

pub use plotters_chart::ChartData;

/// Count change per key press.
const COUNT_STEP: usize = 5;

/// Start the TUI.
pub fn run(session: Session) -> Result<(), AppError> {
    if session.is_empty() {
        let reasons: Vec<String> = session.report().failures.iter().map(ToString::to_string).collect();
        return Err(AppError::new(2, format!("No plottable models.\n{}", reasons.join("\n"))));
    }

    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(session);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// Keyboard-driven host for a `Session`.
pub struct App {
    session: Session,
    views: Vec<ModelView>,
    tab: usize,
    /// Focused equation of the current tab.
    cursor: usize,
    /// Focused parameter of the focused equation.
    param: usize,
    status: String,
}

impl App {
    pub fn new(session: Session) -> Self {
        let views = session.build_initial_ui();
        let status = match session.report().failures.len() {
            0 => "ready".to_string(),
            n => format!("{n} model(s) excluded; see `kview list`"),
        };
        Self {
            session,
            views,
            tab: 0,
            cursor: 0,
            param: 0,
            status,
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))? {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Apply one key press; `true` means quit.
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Tab => self.switch_tab(1),
            KeyCode::BackTab => self.switch_tab(self.views.len().saturating_sub(1)),
            KeyCode::Up => {
                self.cursor = self.cursor.saturating_sub(1);
                self.param = 0;
            }
            KeyCode::Down => {
                let n = self.view().equations.len();
                if self.cursor + 1 < n {
                    self.cursor += 1;
                }
                self.param = 0;
            }
            KeyCode::Char(' ') => self.toggle_focused(),
            KeyCode::Char('p') => {
                let n = self.focused_controls().len();
                if n > 0 {
                    self.param = (self.param + 1) % n;
                }
            }
            KeyCode::Left => self.shift_range(-0.1),
            KeyCode::Right => self.shift_range(0.1),
            KeyCode::Char('[') => self.scale_range(0.5),
            KeyCode::Char(']') => self.scale_range(2.0),
            KeyCode::Char('-') => self.step_count(false),
            KeyCode::Char('+') | KeyCode::Char('=') => self.step_count(true),
            _ => {}
        }
        false
    }

    fn switch_tab(&mut self, offset: usize) {
        if self.views.is_empty() {
            return;
        }
        self.tab = (self.tab + offset) % self.views.len();
        self.cursor = 0;
        self.param = 0;
        self.status = format!("model: {}", self.view().model);
    }

    fn view(&self) -> &ModelView {
        &self.views[self.tab]
    }

    fn focused_variable(&self) -> Option<&str> {
        self.view().equations.get(self.cursor).map(|e| e.variable.as_str())
    }

    fn focused_controls(&self) -> Vec<&ParamControls> {
        match self.focused_variable() {
            Some(variable) => self.view().controls(variable).collect(),
            None => Vec::new(),
        }
    }

    fn focused_param(&self) -> Option<ParamControls> {
        self.focused_controls().get(self.param).map(|c| (*c).clone())
    }

    fn toggle_focused(&mut self) {
        let Some(variable) = self.focused_variable().map(str::to_string) else {
            return;
        };
        let model = self.view().model.clone();
        let names = match self.session.state(&model) {
            Some(state) => state.selection().toggled(&variable),
            None => return,
        };
        self.send(ControlId::checklist(model), UiEvent::Checklist(names));
    }

    fn shift_range(&mut self, frac: f64) {
        let Some(controls) = self.focused_param() else {
            self.status = "no parameter controls for this variable".to_string();
            return;
        };
        let (lo, hi) = controls.slider.value;
        let d = (hi - lo) * frac;
        self.send(controls.slider.control, UiEvent::RangeSlider { min: lo + d, max: hi + d });
    }

    fn scale_range(&mut self, factor: f64) {
        let Some(controls) = self.focused_param() else {
            self.status = "no parameter controls for this variable".to_string();
            return;
        };
        let (lo, hi) = controls.slider.value;
        let mid = 0.5 * (lo + hi);
        let half = 0.5 * (hi - lo) * factor;
        self.send(controls.slider.control, UiEvent::RangeSlider { min: mid - half, max: mid + half });
    }

    fn step_count(&mut self, up: bool) {
        let Some(controls) = self.focused_param() else {
            self.status = "no parameter controls for this variable".to_string();
            return;
        };
        let current = controls.count.value;
        let next = if up {
            current.saturating_add(COUNT_STEP).min(controls.count.max)
        } else {
            current.saturating_sub(COUNT_STEP).max(controls.count.min)
        };
        self.send(controls.count.control, UiEvent::PointCount(next));
    }

    fn send(&mut self, control: ControlId, event: UiEvent) {
        let Some((graph, update)) = self.session.dispatch(&control, &event) else {
            self.status = format!("no subscription for {control}");
            return;
        };
        debug!(%control, %graph, "dispatched");
        self.status = match update {
            Update::Updated(figure) => format!("{graph}: {} row(s)", figure.len()),
            Update::NoChange => format!("{graph}: unchanged"),
            Update::Failed(reason) => format!("{graph}: {reason}"),
        };
        self.refresh(graph.model());
    }

    /// Rebuild the view of `model` from its state.
    fn refresh(&mut self, model: &str) {
        let Some(view) = self.session.state(model).map(|s| ModelView::from_state(&s)) else {
            return;
        };
        if let Some(slot) = self.views.iter_mut().find(|v| v.model == model) {
            *slot = view;
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_tabs(frame, chunks[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
            .split(chunks[1]);
        self.draw_panel(frame, body[0]);
        self.draw_charts(frame, body[1]);

        self.draw_footer(frame, chunks[2]);
    }

    fn draw_tabs(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let titles: Vec<Line> = self.views.iter().map(|v| Line::from(v.model.clone())).collect();
        let tabs = Tabs::new(titles)
            .select(self.tab)
            .block(Block::default().title("kview").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
        frame.render_widget(tabs, area);
    }

    fn draw_panel(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let view = self.view();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(7), Constraint::Length(5)])
            .split(area);

        let items: Vec<ListItem> = view
            .equations
            .iter()
            .map(|e| {
                let mark = if e.checked { "[x]" } else { "[ ]" };
                ListItem::new(format!("{mark} {}", e.expression))
            })
            .collect();
        let list = List::new(items)
            .block(Block::default().title(view.checklist.to_string()).borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");
        let mut state = ListState::default();
        state.select(Some(self.cursor));
        frame.render_stateful_widget(list, chunks[0], &mut state);

        let mut lines: Vec<Line> = Vec::new();
        for (k, c) in self.focused_controls().iter().enumerate() {
            let style = if k == self.param {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default().fg(Color::Gray)
            };
            lines.push(Line::from(Span::styled(
                format!(
                    "{}: [{:.3}, {:.3}] step {:.3}  n={} ({}..{})",
                    c.param, c.slider.value.0, c.slider.value.1, c.slider.step, c.count.value, c.count.min, c.count.max
                ),
                style,
            )));
        }
        if lines.is_empty() {
            lines.push(Line::from(Span::styled("no adjustable parameters", Style::default().fg(Color::Gray))));
        }
        let params = Paragraph::new(Text::from(lines))
            .block(Block::default().title("parameters").borders(Borders::ALL));
        frame.render_widget(params, chunks[1]);

        let issues: Vec<Line> = view
            .issues
            .iter()
            .map(|i| Line::from(Span::styled(i.clone(), Style::default().fg(Color::Red))))
            .collect();
        let issues = Paragraph::new(Text::from(issues))
            .block(Block::default().title("issues").borders(Borders::ALL));
        frame.render_widget(issues, chunks[2]);
    }

    fn draw_charts(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let view = self.view();
        let block = Block::default().title(view.graph.to_string()).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        if view.figure.is_empty() {
            let msg = Paragraph::new("Nothing selected (space toggles a variable).")
                .style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        }

        let n = view.figure.len() as u32;
        let rects = Layout::default()
            .direction(Direction::Vertical)
            .constraints((0..n).map(|_| Constraint::Ratio(1, n)).collect::<Vec<_>>())
            .split(inner);

        for (row, rect) in view.figure.rows.iter().zip(rects.iter()) {
            let data = ChartData::from_row(row);
            frame.render_widget(data.widget(), *rect);
        }
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "Tab model  ↑/↓ variable  space toggle  p param  ←/→ shift  [ ] zoom  -/+ points  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

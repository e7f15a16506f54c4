//! Interactive terminal dashboard over the enriched dataset
//!
//! # Architecture
//!
//! - `ExploreState`: pure state (active filter, focused control, current view)
//! - `handle_key`: maps a key press to a state change and an [`ExploreAction`]
//! - `render_dashboard`: draws the state, never mutates it
//!
//! Every control change asks the [`AggregationCache`] for the view of the new
//! filter, so returning to a filter that was already shown costs a lookup.

use std::io::{stdout, Stdout};
use std::sync::Arc;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    prelude::*,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Terminal,
};

use crate::pipeline::{
    AggregationCache, Categorical, EnrichedRecord, FilteredView, GroupStats, RecordFilter, Region,
    Sex, Smoker,
};
use crate::utils::format_money;

/// Age slider step in years.
pub const AGE_STEP: u32 = 1;
/// BMI slider step.
pub const BMI_STEP: f64 = 0.5;

// ============================================================================
// State
// ============================================================================

/// A dashboard control, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Smoker,
    Region,
    Sex,
    AgeMin,
    AgeMax,
    BmiMin,
    BmiMax,
}

impl Control {
    pub const ALL: [Control; 7] = [
        Control::Smoker,
        Control::Region,
        Control::Sex,
        Control::AgeMin,
        Control::AgeMax,
        Control::BmiMin,
        Control::BmiMax,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Control::Smoker => "Smoker",
            Control::Region => "Region",
            Control::Sex => "Sex",
            Control::AgeMin => "Age from",
            Control::AgeMax => "Age to",
            Control::BmiMin => "BMI from",
            Control::BmiMax => "BMI to",
        }
    }

    /// Number of options of a multi-select; `None` for sliders.
    fn option_count(&self) -> Option<usize> {
        match self {
            Control::Smoker => Some(Smoker::ALL.len()),
            Control::Region => Some(Region::ALL.len()),
            Control::Sex => Some(Sex::ALL.len()),
            _ => None,
        }
    }
}

/// Outcome of a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExploreAction {
    /// Nothing the view depends on changed
    Stay,
    /// The filter changed and the view was recomputed
    Refresh,
    Quit,
}

/// Dashboard state.
#[derive(Debug)]
pub struct ExploreState {
    cache: AggregationCache,
    pub filter: RecordFilter,
    pub focus: usize,
    /// Highlighted option of each multi-select (by control index)
    pub option_cursor: [usize; 3],
    pub view: Arc<FilteredView>,
}

impl ExploreState {
    pub fn new(table: Arc<[EnrichedRecord]>) -> Self {
        let mut cache = AggregationCache::new(table);
        let filter = cache.full_filter().clone();
        let view = cache.view(&filter);
        Self {
            cache,
            filter,
            focus: 0,
            option_cursor: [0; 3],
            view,
        }
    }

    pub fn focused(&self) -> Control {
        Control::ALL[self.focus]
    }

    pub fn cache(&self) -> &AggregationCache {
        &self.cache
    }

    /// Whether the filter narrows the data at all.
    pub fn is_filtered(&self) -> bool {
        &self.filter != self.cache.full_filter()
    }

    /// Recompute the view for the current filter (through the cache).
    pub fn refresh(&mut self) {
        self.view = self.cache.view(&self.filter);
    }

    pub fn reset(&mut self) {
        self.filter = self.cache.full_filter().clone();
        self.refresh();
    }

    fn move_focus(&mut self, down: bool) {
        let n = Control::ALL.len();
        self.focus = if down {
            (self.focus + 1) % n
        } else {
            (self.focus + n - 1) % n
        };
    }

    fn move_option(&mut self, right: bool) {
        if let Some(count) = self.focused().option_count() {
            let cursor = &mut self.option_cursor[self.focus];
            *cursor = if right {
                (*cursor + 1) % count
            } else {
                (*cursor + count - 1) % count
            };
        }
    }

    /// Toggle the highlighted option of the focused multi-select.
    pub fn toggle_option(&mut self) -> bool {
        let cursor = match self.focused().option_count() {
            Some(_) => self.option_cursor[self.focus],
            None => return false,
        };
        match self.focused() {
            Control::Smoker => toggle(&mut self.filter.smokers, Smoker::ALL[cursor]),
            Control::Region => toggle(&mut self.filter.regions, Region::ALL[cursor]),
            Control::Sex => toggle(&mut self.filter.sexes, Sex::ALL[cursor]),
            _ => return false,
        }
        true
    }

    /// Move the focused slider one step; ranges stay within the data bounds
    /// and the lower end never passes the upper end.
    pub fn nudge_slider(&mut self, up: bool) -> bool {
        let bounds = self.cache.full_filter();
        let (age_lo, age_hi) = bounds.age;
        let (bmi_lo, bmi_hi) = bounds.bmi;
        let control = self.focused();
        let before = (self.filter.age, self.filter.bmi);
        let age = &mut self.filter.age;
        let bmi = &mut self.filter.bmi;

        match control {
            Control::AgeMin => {
                age.0 = if up {
                    (age.0 + AGE_STEP).min(age.1)
                } else {
                    age.0.saturating_sub(AGE_STEP).max(age_lo)
                };
            }
            Control::AgeMax => {
                age.1 = if up {
                    (age.1 + AGE_STEP).min(age_hi)
                } else {
                    age.1.saturating_sub(AGE_STEP).max(age.0)
                };
            }
            Control::BmiMin => {
                let delta = if up { 1 } else { -1 };
                bmi.0 = grid_step(bmi.0, bmi_lo, BMI_STEP, delta).min(bmi.1).max(bmi_lo);
            }
            Control::BmiMax => {
                let delta = if up { -1 } else { 1 };
                bmi.1 = grid_step(bmi.1, bmi_hi, -BMI_STEP, delta).max(bmi.0).min(bmi_hi);
            }
            _ => return false,
        }
        before != (self.filter.age, self.filter.bmi)
    }
}

/// Move `delta` points along the grid `origin + k * step` from the point
/// nearest `value`. Step zero is `origin` itself, so a slider moved out and
/// back lands on the data bound exactly.
fn grid_step(value: f64, origin: f64, step: f64, delta: i64) -> f64 {
    let k = ((value - origin) / step).round() as i64 + delta;
    origin + k as f64 * step
}

fn toggle<T: Ord>(set: &mut std::collections::BTreeSet<T>, value: T) {
    if !set.remove(&value) {
        set.insert(value);
    }
}

// ============================================================================
// Key Handling
// ============================================================================

/// Apply one key press to the state.
pub fn handle_key(state: &mut ExploreState, key: KeyEvent) -> ExploreAction {
    let changed = match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return ExploreAction::Quit,
        KeyCode::Up | KeyCode::Char('k') => {
            state.move_focus(false);
            false
        }
        KeyCode::Down | KeyCode::Tab | KeyCode::Char('j') => {
            state.move_focus(true);
            false
        }
        KeyCode::Left | KeyCode::Char('h') => {
            if state.focused().option_count().is_some() {
                state.move_option(false);
                false
            } else {
                state.nudge_slider(false)
            }
        }
        KeyCode::Right | KeyCode::Char('l') => {
            if state.focused().option_count().is_some() {
                state.move_option(true);
                false
            } else {
                state.nudge_slider(true)
            }
        }
        KeyCode::Char(' ') | KeyCode::Enter => state.toggle_option(),
        KeyCode::Char('r') | KeyCode::Char('R') => {
            state.reset();
            return ExploreAction::Refresh;
        }
        _ => false,
    };

    if changed {
        state.refresh();
        ExploreAction::Refresh
    } else {
        ExploreAction::Stay
    }
}

// ============================================================================
// Terminal Setup/Teardown
// ============================================================================

/// Setup terminal for TUI rendering with panic-safe cleanup
pub fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;

    // Install panic hook for clean terminal restoration
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        teardown_terminal();
        original_hook(panic_info);
    }));

    let backend = CrosstermBackend::new(stdout());
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore terminal to normal state
pub fn teardown_terminal() {
    let _ = disable_raw_mode();
    let _ = stdout().execute(LeaveAlternateScreen);
}

// ============================================================================
// Entry Point
// ============================================================================

/// Run the dashboard until the user quits.
pub fn run_explore(table: Arc<[EnrichedRecord]>) -> Result<()> {
    let mut state = ExploreState::new(table);
    let mut terminal = setup_terminal()?;
    let result = run_explore_loop(&mut terminal, &mut state);
    teardown_terminal();
    result
}

fn run_explore_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    state: &mut ExploreState,
) -> Result<()> {
    loop {
        terminal.draw(|f| render_dashboard(f, state))?;

        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                // Only handle key press events, not release
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key(state, key) == ExploreAction::Quit {
                    return Ok(());
                }
            }
        }
    }
}

// ============================================================================
// Rendering
// ============================================================================

fn render_dashboard(f: &mut Frame, state: &ExploreState) {
    let area = f.area();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(10),
            Constraint::Length(1),
        ])
        .split(area);

    let title = Line::from(vec![
        Span::styled("$ ", Style::default().fg(Color::Magenta).bold()),
        Span::styled(
            "medcost explorer",
            Style::default().fg(Color::Cyan).bold(),
        ),
    ]);
    f.render_widget(Paragraph::new(title).alignment(Alignment::Center), rows[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(34), Constraint::Min(40)])
        .split(rows[1]);

    render_controls(f, columns[0], state);
    render_view(f, columns[1], state);
    render_help_bar(f, rows[2], state);
}

fn render_controls(f: &mut Frame, area: Rect, state: &ExploreState) {
    let mut lines = Vec::new();

    for (i, control) in Control::ALL.iter().enumerate() {
        let focused = i == state.focus;
        let marker = if focused { "▸ " } else { "  " };
        let label_style = if focused {
            Style::default().fg(Color::Cyan).bold()
        } else {
            Style::default().fg(Color::White)
        };

        let mut spans = vec![
            Span::styled(marker, label_style),
            Span::styled(format!("{:<9}", control.label()), label_style),
        ];

        let options: Option<Vec<(&str, bool)>> = match control {
            Control::Smoker => Some(options_of(&state.filter.smokers)),
            Control::Region => Some(options_of(&state.filter.regions)),
            Control::Sex => Some(options_of(&state.filter.sexes)),
            _ => None,
        };

        match options {
            Some(options) => {
                lines.push(Line::from(spans));
                for (j, (name, on)) in options.into_iter().enumerate() {
                    let highlighted = focused && j == state.option_cursor[i];
                    let check = if on { "[x]" } else { "[ ]" };
                    let style = if highlighted {
                        Style::default().fg(Color::Black).bg(Color::Cyan)
                    } else if on {
                        Style::default().fg(Color::Green)
                    } else {
                        Style::default().fg(Color::DarkGray)
                    };
                    lines.push(Line::from(Span::styled(
                        format!("    {} {}", check, name),
                        style,
                    )));
                }
            }
            None => {
                let value = match control {
                    Control::AgeMin => state.filter.age.0.to_string(),
                    Control::AgeMax => state.filter.age.1.to_string(),
                    Control::BmiMin => format!("{:.1}", state.filter.bmi.0),
                    _ => format!("{:.1}", state.filter.bmi.1),
                };
                spans.push(Span::styled(
                    format!("◂ {} ▸", value),
                    Style::default().fg(Color::Yellow),
                ));
                lines.push(Line::from(spans));
            }
        }
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Filters ")
        .title_style(Style::default().fg(Color::Cyan).bold());
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn options_of<C: Categorical>(selected: &std::collections::BTreeSet<C>) -> Vec<(&'static str, bool)> {
    C::ALL
        .iter()
        .map(|c| (c.as_str(), selected.contains(c)))
        .collect()
}

fn render_view(f: &mut Frame, area: Rect, state: &ExploreState) {
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7),
            Constraint::Length(8),
            Constraint::Length(5),
            Constraint::Min(7),
        ])
        .split(area);

    render_kpis(f, parts[0], state);
    render_group_table(f, parts[1], " By region ", &state.view.by_region);
    render_group_table(f, parts[2], " By smoker ", &state.view.by_smoker);
    render_pivot(f, parts[3], state);
}

fn render_kpis(f: &mut Frame, area: Rect, state: &ExploreState) {
    let view = &state.view;
    let kpis = &view.kpis;
    let delta = view.delta.as_ref();

    let delta_span = |d: Option<f64>, money: bool| -> Span<'static> {
        match d {
            Some(d) => {
                let text = if money {
                    format!("  ({}{})", if d >= 0.0 { "+" } else { "" }, format_money(d))
                } else {
                    format!("  ({:+.1} pp)", d)
                };
                let color = if d > 0.0 { Color::Red } else { Color::Green };
                Span::styled(text, Style::default().fg(color))
            }
            None => Span::raw(""),
        }
    };
    let money = |v: Option<f64>| v.map(format_money).unwrap_or_else(|| "-".to_string());

    let lines = vec![
        Line::from(vec![
            Span::styled("Observations:   ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                format!("{} / {}", kpis.observations, view.total),
                Style::default().fg(Color::White).bold(),
            ),
        ]),
        Line::from(vec![
            Span::styled("Mean charges:   ", Style::default().fg(Color::DarkGray)),
            Span::styled(money(kpis.mean_charges), Style::default().bold()),
            delta_span(delta.and_then(|d| d.mean_charges), true),
        ]),
        Line::from(vec![
            Span::styled("Median charges: ", Style::default().fg(Color::DarkGray)),
            Span::styled(money(kpis.median_charges), Style::default().bold()),
            delta_span(delta.and_then(|d| d.median_charges), true),
        ]),
        Line::from(vec![
            Span::styled("Smokers:        ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                kpis.smoker_pct
                    .map(|p| format!("{:.1}%", p))
                    .unwrap_or_else(|| "-".to_string()),
                Style::default().bold(),
            ),
            delta_span(delta.and_then(|d| d.smoker_pct), false),
        ]),
    ];

    let title = if state.is_filtered() {
        " Key figures (filtered) "
    } else {
        " Key figures "
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_style(Style::default().fg(Color::Cyan).bold());
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_group_table<K: std::fmt::Display>(
    f: &mut Frame,
    area: Rect,
    title: &str,
    groups: &[GroupStats<K>],
) {
    let header = Row::new(["Group", "Count", "Mean", "Median", "Std"])
        .style(Style::default().fg(Color::Cyan).bold());
    let rows: Vec<Row> = groups
        .iter()
        .map(|g| {
            Row::new(vec![
                Cell::from(g.key.to_string()),
                Cell::from(g.count.to_string()),
                Cell::from(format_money(g.mean)),
                Cell::from(format_money(g.median)),
                Cell::from(g.std.map(format_money).unwrap_or_else(|| "-".to_string())),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(10),
            Constraint::Length(6),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(12),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(title.to_string()));
    f.render_widget(table, area);
}

fn render_pivot(f: &mut Frame, area: Rect, state: &ExploreState) {
    let pivot = &state.view.region_smoker;
    let mut header = vec![Cell::from("Region")];
    header.extend(pivot.columns.iter().map(|c| Cell::from(format!("smoker={}", c))));

    let rows: Vec<Row> = pivot
        .rows
        .iter()
        .zip(&pivot.cells)
        .map(|(region, cells)| {
            let mut line = vec![Cell::from(region.to_string())];
            line.extend(cells.iter().map(|v| {
                Cell::from(v.map(format_money).unwrap_or_else(|| "-".to_string()))
            }));
            Row::new(line)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(10),
            Constraint::Length(14),
            Constraint::Length(14),
        ],
    )
    .header(Row::new(header).style(Style::default().fg(Color::Cyan).bold()))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Mean charges: region × smoker "),
    );
    f.render_widget(table, area);
}

fn render_help_bar(f: &mut Frame, area: Rect, state: &ExploreState) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Cyan));
    let text = |t: &'static str| Span::styled(t, Style::default().fg(Color::DarkGray));
    let spans = vec![
        key("↑↓"),
        text(" control  "),
        key("←→"),
        text(" option/value  "),
        key("Space"),
        text(" toggle  "),
        key("R"),
        text(" reset  "),
        key("Q/Esc"),
        text(" quit  "),
        Span::styled(
            format!(
                "cache {} hit / {} miss",
                state.cache.hits(),
                state.cache.misses()
            ),
            Style::default().fg(Color::DarkGray),
        ),
    ];
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

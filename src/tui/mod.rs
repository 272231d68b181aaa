mod state;

use crate::bench::{self, CellState, CellUpdate};
use crate::cli::Cli;
use crate::model::{Algorithm, SessionEvent, SessionState, MAX_SIZE, MIN_SIZE, VALUE_RANGE};
use crate::orchestrator::{self, UiCommand};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Cell, Paragraph, Row, Table, Tabs},
    Frame, Terminal,
};
use state::UiState;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

pub async fn run(args: Cli) -> Result<()> {
    // Unbounded channels avoid backpressure in the frame hot path.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<SessionEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    // Kick off benchmarks before the UI so the grid shows the synchronous
    // results at first draw; slow cells stream in through bench_rx.
    let (bench_table, bench_rx, bench_worker) = bench::start();

    let cfg = crate::cli::build_config(&args);

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_cfg = cfg.clone();
    let ui_handle =
        std::thread::spawn(move || run_threaded(ui_cfg, bench_table, bench_rx, event_rx, cmd_tx));

    let res = orchestrator::run_controller(&cfg, event_tx, cmd_rx).await;

    // Quit must not wait out a long trial; the worker thread is detached.
    drop(bench_worker);

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

/// Run the TUI loop on a dedicated thread.
fn run_threaded(
    cfg: crate::model::SessionConfig,
    bench_table: bench::BenchTable,
    mut bench_rx: UnboundedReceiver<CellUpdate>,
    mut event_rx: UnboundedReceiver<SessionEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    let mut state = UiState::new(&cfg, bench_table);

    let tick_rate = Duration::from_millis(33);
    let mut last_tick = Instant::now();

    let res = loop {
        // Drain session events without blocking to keep the UI responsive.
        while let Ok(ev) = event_rx.try_recv() {
            state.apply_event(ev);
        }
        // The UI thread is the grid's only writer; worker results land here.
        while let Ok(update) = bench_rx.try_recv() {
            state.bench.apply(update);
        }

        if last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                match (k.modifiers, k.code) {
                    (_, KeyCode::Char('q')) | (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
                        let _ = cmd_tx.send(UiCommand::Quit);
                        break Ok(());
                    }
                    (_, KeyCode::Tab) => {
                        state.tab = (state.tab + 1) % 3;
                    }
                    (_, KeyCode::Char('s')) => {
                        if state.tab == 0 && !state.is_running() {
                            let _ = cmd_tx.send(UiCommand::Start);
                        }
                    }
                    (_, KeyCode::Char('p')) | (_, KeyCode::Char(' ')) => {
                        if state.tab == 0 && state.is_running() {
                            state.paused = !state.paused;
                            state.session = if state.paused {
                                SessionState::Paused
                            } else {
                                SessionState::Running
                            };
                            let _ = cmd_tx.send(UiCommand::Pause(state.paused));
                        }
                    }
                    (_, KeyCode::Char('r')) => {
                        if state.tab == 0 {
                            state.info = "Reset requested…".into();
                            let _ = cmd_tx.send(UiCommand::Reset);
                        }
                    }
                    (_, KeyCode::Left) | (_, KeyCode::Right) => {
                        if state.tab == 2 {
                            // Size selector for the graph, mirroring the
                            // benchmark rows.
                            let n = state.bench.sizes().len();
                            if n > 0 {
                                state.graph_size = if k.code == KeyCode::Left {
                                    (state.graph_size + n - 1) % n
                                } else {
                                    (state.graph_size + 1) % n
                                };
                            }
                        } else if state.tab == 0 && !state.is_running() {
                            state.algorithm = if k.code == KeyCode::Left {
                                state.algorithm.prev()
                            } else {
                                state.algorithm.next()
                            };
                            let _ = cmd_tx.send(UiCommand::SetAlgorithm(state.algorithm));
                        }
                    }
                    (_, KeyCode::Up) | (_, KeyCode::Down) => {
                        if state.tab == 0 && !state.is_running() {
                            let size = if k.code == KeyCode::Up {
                                (state.size + 10).min(MAX_SIZE)
                            } else {
                                state.size.saturating_sub(10).max(MIN_SIZE)
                            };
                            // Local size follows the ArrayReset event.
                            let _ = cmd_tx.send(UiCommand::SetSize(size));
                        }
                    }
                    (_, KeyCode::Char('+')) | (_, KeyCode::Char('=')) => {
                        state.speed = (state.speed + 5).min(100);
                        let _ = cmd_tx.send(UiCommand::SetSpeed(state.speed));
                    }
                    (_, KeyCode::Char('-')) => {
                        state.speed = state.speed.saturating_sub(5).max(1);
                        let _ = cmd_tx.send(UiCommand::SetSpeed(state.speed));
                    }
                    _ => {}
                }
            }
        }
    };

    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
    terminal.show_cursor().ok();
    res
}

fn draw(area: Rect, f: &mut Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(area);

    let tabs = Tabs::new(vec!["Animation", "Benchmarks", "Graph"])
        .select(state.tab)
        .highlight_style(Style::default().add_modifier(Modifier::BOLD).fg(Color::Cyan));
    f.render_widget(tabs, chunks[0]);

    match state.tab {
        0 => draw_animation(chunks[1], f, state),
        1 => draw_benchmarks(chunks[1], f, state),
        _ => draw_graph(chunks[1], f, state),
    }

    let footer = Paragraph::new(
        "q quit  tab switch  s start  p/space pause  r reset  ←/→ algorithm (graph: size)  ↑/↓ size  +/- speed",
    )
    .style(Style::default().fg(Color::DarkGray));
    f.render_widget(footer, chunks[2]);
}

fn draw_animation(area: Rect, f: &mut Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(3)])
        .split(area);

    let mut header = vec![state.status_line(), state.settings_line()];
    if let (Some(start), true) = (state.run_start, state.is_running()) {
        header.push(format!("Elapsed: {:.1} s", start.elapsed().as_secs_f64()));
    }
    if !state.info.is_empty() {
        header.push(state.info.clone());
    }
    let header = Paragraph::new(header.join("\n"))
        .block(Block::default().borders(Borders::BOTTOM));
    f.render_widget(header, chunks[0]);

    let bars: Vec<Bar> = state
        .values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let color = if Some(i) == state.primary {
                Color::Red
            } else if Some(i) == state.secondary {
                Color::Green
            } else {
                Color::Blue
            };
            Bar::default()
                .value(*v as u64)
                .style(Style::default().fg(color))
                .text_value(String::new())
        })
        .collect();

    let chart = BarChart::default()
        .data(BarGroup::default().bars(&bars))
        .bar_width(1)
        .bar_gap(0)
        .max(VALUE_RANGE.end as u64);
    f.render_widget(chart, chunks[1]);
}

fn draw_benchmarks(area: Rect, f: &mut Frame, state: &UiState) {
    let mut header_cells = vec![Cell::from("Array Size")];
    header_cells.extend(
        Algorithm::ALL
            .iter()
            .map(|a| Cell::from(format!("{} (ms)", a.label()))),
    );
    let header = Row::new(header_cells).style(Style::default().add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = state
        .bench
        .sizes()
        .iter()
        .enumerate()
        .map(|(row, &size)| {
            let mut cells = vec![Cell::from(crate::text_summary::group_thousands(size))];
            for col in 0..Algorithm::ALL.len() {
                let cell = state
                    .bench
                    .cell(row, col)
                    .map(|c| c.text())
                    .unwrap_or_else(|_| "-".into());
                cells.push(Cell::from(cell));
            }
            Row::new(cells)
        })
        .collect();

    let widths = [Constraint::Length(12); 6];
    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Benchmark results (fresh random array per trial)"),
    );
    f.render_widget(table, area);
}

/// Internal resolution of the log-scaled graph bars.
const GRAPH_STEPS: u64 = 1000;

/// Per-algorithm bar colors, in benchmark-column order.
const GRAPH_COLORS: [Color; 5] = [
    Color::Blue,
    Color::Red,
    Color::LightBlue,
    Color::Green,
    Color::Yellow,
];

fn draw_graph(area: Rect, f: &mut Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(area);

    let size = state
        .bench
        .sizes()
        .get(state.graph_size)
        .copied()
        .unwrap_or(0);
    let header = Paragraph::new(format!(
        "Sorting performance with {} elements (ms, log scale)\n←/→ selects the array size",
        crate::text_summary::group_thousands(size)
    ))
    .block(Block::default().borders(Borders::BOTTOM));
    f.render_widget(header, chunks[0]);

    let times: Vec<Option<f64>> = (0..Algorithm::ALL.len())
        .map(|col| match state.bench.cell(state.graph_size, col) {
            Ok(CellState::Time(ms)) => Some(ms),
            _ => None,
        })
        .collect();
    let settled: Vec<f64> = times.iter().flatten().copied().collect();
    let (min_p, max_p) = graph_scale(&settled);

    let bars: Vec<Bar> = Algorithm::ALL
        .iter()
        .enumerate()
        .map(|(col, algo)| {
            let short = algo.label().trim_end_matches(" Sort");
            match times[col] {
                Some(ms) => Bar::default()
                    .value(log_bar_value(ms, min_p, max_p, GRAPH_STEPS))
                    .label(short.into())
                    .style(Style::default().fg(GRAPH_COLORS[col]))
                    .text_value(format_graph_ms(ms)),
                // Pending/error cells show their table text over an empty bar.
                None => Bar::default()
                    .value(0)
                    .label(short.into())
                    .style(Style::default().fg(Color::DarkGray))
                    .text_value(
                        state
                            .bench
                            .cell(state.graph_size, col)
                            .map(|c| c.text())
                            .unwrap_or_else(|_| "-".into()),
                    ),
            }
        })
        .collect();

    let chart = BarChart::default()
        .data(BarGroup::default().bars(&bars))
        .bar_width(9)
        .bar_gap(3)
        .max(GRAPH_STEPS);
    f.render_widget(chart, chunks[1]);
}

/// Log-scale bounds for the graph as powers of ten.
///
/// The floor starts four decades down so sub-millisecond sorts register; the
/// ceiling covers the slowest settled time; the span never drops below three
/// decades.
fn graph_scale(times: &[f64]) -> (f64, f64) {
    let mut min_p = -4.0f64;
    let mut max_p = 0.0f64;
    for &t in times {
        if t > 0.0 {
            max_p = max_p.max(t.log10().ceil());
        }
    }
    if max_p - min_p < 3.0 {
        min_p = max_p - 3.0;
    }
    (min_p, max_p)
}

/// Map a time to a bar value in `0..=steps` on the log scale. Positive times
/// always draw at least one step so fast sorts stay visible.
fn log_bar_value(ms: f64, min_p: f64, max_p: f64, steps: u64) -> u64 {
    if ms <= 0.0 {
        return 0;
    }
    let ratio = (ms.log10() - min_p) / (max_p - min_p);
    let value = (ratio.clamp(0.0, 1.0) * steps as f64) as u64;
    value.max(1)
}

/// Time label with precision that falls off as the magnitude grows.
fn format_graph_ms(ms: f64) -> String {
    if ms < 0.001 {
        format!("{ms:.4}")
    } else if ms < 0.01 {
        format!("{ms:.3}")
    } else if ms < 0.1 {
        format!("{ms:.2}")
    } else if ms < 10.0 {
        format!("{ms:.1}")
    } else if ms < 100.0 {
        format!("{ms:.0}")
    } else {
        let rounded = (ms * 10.0).round() / 10.0;
        let tenths = (rounded * 10.0).round() as u64 % 10;
        format!(
            "{}.{}",
            crate::text_summary::group_thousands(rounded.trunc() as usize),
            tenths
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_scale_spans_at_least_three_decades() {
        let (min_p, max_p) = graph_scale(&[]);
        assert!(max_p - min_p >= 3.0);

        let (min_p, max_p) = graph_scale(&[0.5, 12_000.0]);
        assert_eq!(max_p, 5.0);
        assert_eq!(min_p, -4.0);
    }

    #[test]
    fn log_bars_keep_fast_sorts_visible() {
        let (min_p, max_p) = graph_scale(&[0.01, 1_000.0]);
        let fast = log_bar_value(0.01, min_p, max_p, 1000);
        let slow = log_bar_value(1_000.0, min_p, max_p, 1000);
        assert!(fast >= 1, "fast sort collapsed to an invisible bar");
        assert!(slow > fast);
        assert!(slow <= 1000);
        assert_eq!(log_bar_value(0.0, min_p, max_p, 1000), 0);
    }

    #[test]
    fn graph_time_labels_scale_their_precision() {
        assert_eq!(format_graph_ms(0.0004), "0.0004");
        assert_eq!(format_graph_ms(0.004), "0.004");
        assert_eq!(format_graph_ms(0.04), "0.04");
        assert_eq!(format_graph_ms(2.5), "2.5");
        assert_eq!(format_graph_ms(42.0), "42");
        assert_eq!(format_graph_ms(12_345.6), "12,345.6");
    }
}

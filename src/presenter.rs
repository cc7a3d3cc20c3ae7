//! The live terminal presenter (C5): a `ratatui` dashboard that redraws
//! roughly every 100ms while a run is in flight, plus the final report that
//! both TUI and headless modes print on completion.

use std::io;
use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyCode, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use futures_util::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph};
use ratatui::Terminal;
use tokio_util::sync::CancellationToken;

use crate::engine::RunReport;
use crate::errors::EngineError;
use crate::stats::StatsSnapshot;

const REDRAW_INTERVAL: Duration = Duration::from_millis(100);

/// Drives the live dashboard until `cancel` fires (duration elapsed, Ctrl-C,
/// or the presenter's own quit key), redrawing from `snapshot` each tick.
///
/// A quit key (`q`, Esc, or Ctrl-C) cancels `cancel` too, so a TUI-initiated
/// quit stops the workers, not just the display (§5 generalization).
pub async fn run_live<F>(
    total_duration: Duration,
    cancel: CancellationToken,
    mut snapshot: F,
) -> Result<(), EngineError>
where
    F: FnMut() -> StatsSnapshot,
{
    enable_raw_mode().map_err(EngineError::TerminalInit)?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).map_err(EngineError::TerminalInit)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).map_err(EngineError::TerminalInit)?;

    let started = tokio::time::Instant::now();
    let mut ticker = tokio::time::interval(REDRAW_INTERVAL);
    let mut events = EventStream::new();

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let snap = snapshot();
                let elapsed = started.elapsed();
                let _ = terminal.draw(|frame| draw(frame, &snap, elapsed, total_duration));
            }
            maybe_event = events.next() => {
                if let Some(Ok(Event::Key(key))) = maybe_event {
                    if is_quit_key(key) {
                        cancel.cancel();
                    }
                }
            }
        }
    }

    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();

    Ok(())
}

/// §4.4's quit keys: 'q', Esc, or Ctrl-C. Ctrl-C is checked as a key event,
/// not the OS signal — raw mode clears ISIG, so a terminal-generated Ctrl-C
/// never reaches `tokio::signal::ctrl_c()` while the TUI is active.
fn is_quit_key(key: crossterm::event::KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('q') | KeyCode::Esc)
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}

fn draw(
    frame: &mut ratatui::Frame<'_>,
    snap: &StatsSnapshot,
    elapsed: Duration,
    total: Duration,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(frame.size());

    let ratio = if total.is_zero() {
        1.0
    } else {
        (elapsed.as_secs_f64() / total.as_secs_f64()).min(1.0)
    };

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("progress"))
        .gauge_style(Style::default().fg(Color::Cyan))
        .ratio(ratio);
    frame.render_widget(gauge, chunks[0]);

    let body = format_live(snap, elapsed);
    let paragraph = Paragraph::new(body).block(Block::default().borders(Borders::ALL).title("galick"));
    frame.render_widget(paragraph, chunks[1]);
}

/// In-progress stats shown in the live dashboard. Not the final report —
/// it shares the same figures but the run isn't over, so "Duration" here is
/// elapsed-so-far and there is no attacker name column.
fn format_live(snap: &StatsSnapshot, elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    let qps = if secs == 0.0 { 0.0 } else { snap.total as f64 / secs };
    format!(
        "Elapsed: {:?}\nRequests: {}\nMean QPS: {:.1}\nSuccess: {:.1}%\nP50: {:?}\nP95: {:?}\nP99: {:?}\nMax: {:?}",
        elapsed,
        snap.total,
        qps,
        snap.success_percent(),
        snap.quantile(0.50),
        snap.quantile(0.95),
        snap.quantile(0.99),
        snap.max(),
    )
}

/// The final report block, per §6: Duration, Requests, Mean QPS, Success %,
/// and P50/P95/P99/Max latency (the labels are normative, the layout isn't).
/// Latency lines are omitted entirely when no requests were recorded (§4.4).
/// Printed once after a TUI run exits, and the sole output of a headless run.
pub fn format_report(report: &RunReport) -> String {
    let snap = &report.stats;
    let mut out = format!(
        "Duration: {:?}\nRequests: {} ({})\nMean QPS: {:.1}\nSuccess: {:.1}%",
        report.elapsed,
        snap.total,
        report.attacker_name,
        report.mean_qps(),
        snap.success_percent(),
    );
    if snap.total > 0 {
        out.push_str(&format!(
            "\nP50: {:?}\nP95: {:?}\nP99: {:?}\nMax: {:?}",
            snap.quantile(0.50),
            snap.quantile(0.95),
            snap.quantile(0.99),
            snap.max(),
        ));
    }
    out
}

/// Headless mode: no terminal is touched; only the final report is printed.
pub fn print_headless_report(report: &RunReport) {
    println!("{}", format_report(report));
}

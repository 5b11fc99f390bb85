use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use periodsweep_core::error::RenderError;
use periodsweep_core::{
    CoordinatorExit, OscillatorEvaluator, PlotBuffer, PoolProfile, RenderSink, SweepConfig,
    SweepReport, WorkerPool, run_live_sweep,
};
use ratatui::{
    DefaultTerminal, Frame, Terminal,
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::heatmap::render_heatmap;
use crate::logging::route_worker_panics;

/// Render sink drawing the heatmap and a status bar on a ratatui terminal
pub struct TerminalSink<'a, B: Backend> {
    terminal: &'a mut Terminal<B>,
    workers: usize,
    started: Instant,
    finished: Option<Duration>,
}

impl<'a, B: Backend> TerminalSink<'a, B> {
    pub fn new(terminal: &'a mut Terminal<B>, workers: usize) -> Self {
        Self {
            terminal,
            workers,
            started: Instant::now(),
            finished: None,
        }
    }

    /// Freeze the elapsed time shown in the status bar
    pub fn mark_finished(&mut self) {
        self.finished = Some(self.started.elapsed());
    }

    fn status_line(&self, buffer: &PlotBuffer) -> Line<'static> {
        let elapsed = self.finished.unwrap_or_else(|| self.started.elapsed());
        let state = if self.finished.is_some() {
            Span::styled("done", Style::default().fg(Color::Green))
        } else {
            Span::styled("running", Style::default().fg(Color::Yellow))
        };

        Line::from(vec![
            state,
            Span::raw(format!(
                " | {}/{} reported | {} pending | {} undefined | ",
                buffer.reported(),
                buffer.total(),
                buffer.pending(),
                buffer.undefined(),
            )),
            Span::styled(
                format!("{} failed", buffer.failed()),
                if buffer.failed() > 0 {
                    Style::default().fg(Color::Red)
                } else {
                    Style::default()
                },
            ),
            Span::styled(
                format!(
                    " | {:.1}s | {} workers | q: quit",
                    elapsed.as_secs_f64(),
                    self.workers
                ),
                Style::default().fg(Color::DarkGray),
            ),
        ])
    }
}

impl<B: Backend> RenderSink for TerminalSink<'_, B> {
    fn initialize(&mut self, shape: (usize, usize)) -> Result<(), RenderError> {
        tracing::debug!(rows = shape.0, cols = shape.1, "Terminal plot initialized");
        self.started = Instant::now();
        self.terminal
            .clear()
            .map_err(|e| RenderError::Backend(e.to_string()))
    }

    fn redraw(&mut self, buffer: &PlotBuffer) -> Result<(), RenderError> {
        let status = self.status_line(buffer);
        self.terminal
            .draw(|frame| draw(frame, buffer, &status))
            .map_err(|e| RenderError::Backend(e.to_string()))?;
        Ok(())
    }
}

fn draw(frame: &mut Frame, buffer: &PlotBuffer, status: &Line<'static>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Heatmap
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Oscillator period sweep ");
    render_heatmap(frame, chunks[0], buffer, block);
    render_status(frame, chunks[1], status);
}

fn render_status(frame: &mut Frame, area: Rect, status: &Line<'static>) {
    let paragraph = Paragraph::new(status.clone()).block(Block::default().borders(Borders::TOP));
    frame.render_widget(paragraph, area);
}

fn is_quit_key(key: &KeyEvent) -> bool {
    key.kind == KeyEventKind::Press && matches!(key.code, KeyCode::Char('q') | KeyCode::Esc)
}

/// Non-blocking check for a quit key press
fn quit_requested() -> io::Result<bool> {
    while event::poll(Duration::ZERO)? {
        if let Event::Key(key) = event::read()?
            && is_quit_key(&key)
        {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Full-screen sweep with a live heatmap
pub struct App {
    sweep: SweepConfig,
    profile: PoolProfile,
    exit_on_complete: bool,
}

impl App {
    pub fn new(sweep: SweepConfig, profile: PoolProfile, exit_on_complete: bool) -> Self {
        Self {
            sweep,
            profile,
            exit_on_complete,
        }
    }

    /// Run the sweep, then keep the final plot on screen until the user quits
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> color_eyre::Result<SweepReport> {
        let _panics = route_worker_panics();
        let pool = WorkerPool::from_profile(&self.profile)?;
        let evaluator = OscillatorEvaluator::from_config(&self.sweep);
        let mut sink = TerminalSink::new(terminal, pool.workers());

        let report = run_live_sweep(&self.sweep, pool, evaluator, &mut sink, |_| {
            quit_requested().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to read terminal events");
                false
            })
        })?;

        sink.mark_finished();
        sink.redraw(&report.buffer)?;

        if report.exit == CoordinatorExit::Completed && !self.exit_on_complete {
            self.wait_for_quit(&mut sink, &report.buffer)?;
        }

        Ok(report)
    }

    fn wait_for_quit<B: Backend>(
        &self,
        sink: &mut TerminalSink<'_, B>,
        buffer: &PlotBuffer,
    ) -> color_eyre::Result<()> {
        loop {
            match event::read()? {
                Event::Key(key) if is_quit_key(&key) => return Ok(()),
                Event::Resize(_, _) => sink.redraw(buffer)?,
                _ => {}
            }
        }
    }
}

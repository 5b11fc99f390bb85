//! Character heatmap of the period surface.

use periodsweep_core::{CellStatus, PlotBuffer};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
};

/// Glyphs for reported periods, shortest to longest
pub const HEAT_CHARS: [char; 6] = ['.', ':', '+', '*', '#', '@'];
pub const PENDING_CHAR: char = '?';
pub const UNDEFINED_CHAR: char = '~';
pub const FAILED_CHAR: char = 'x';

/// Glyph and colour for one cell, scaled into `range`
pub fn cell_glyph(status: CellStatus, value: f64, range: (f64, f64)) -> (char, Color) {
    match status {
        CellStatus::Pending => (PENDING_CHAR, Color::DarkGray),
        CellStatus::Undefined => (UNDEFINED_CHAR, Color::Blue),
        CellStatus::Failed => (FAILED_CHAR, Color::Magenta),
        CellStatus::Period => {
            let (min_val, max_val) = range;
            let span = (max_val - min_val).max(0.0001);
            let normalized = ((value - min_val) / span).clamp(0.0, 1.0);
            let char_idx = (normalized * (HEAT_CHARS.len() - 1) as f64).round() as usize;
            let ch = HEAT_CHARS[char_idx.min(HEAT_CHARS.len() - 1)];

            let color = if normalized < 0.33 {
                Color::Red
            } else if normalized < 0.66 {
                Color::Yellow
            } else {
                Color::Green
            };
            (ch, color)
        }
    }
}

/// Heatmap as styled lines: mu down the side, nu across.
///
/// At most `max_rows` grid rows and `max_cols` grid columns are drawn.
pub fn heatmap_lines(buffer: &PlotBuffer, max_rows: usize, max_cols: usize) -> Vec<Line<'static>> {
    let (rows, cols) = buffer.shape();
    let range = buffer.value_range();
    let mut lines = Vec::with_capacity(rows.min(max_rows) + 6);

    let range_text = match range {
        Some((lo, hi)) => format!("  [{lo:.4} .. {hi:.4}]"),
        None => "  [no data]".to_string(),
    };
    lines.push(Line::from(vec![
        Span::raw("  "),
        Span::styled(
            "Period",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(": "),
        Span::styled("mu", Style::default().fg(Color::Magenta)),
        Span::raw(" x "),
        Span::styled("nu", Style::default().fg(Color::Magenta)),
        Span::styled(range_text, Style::default().fg(Color::DarkGray)),
    ]));
    lines.push(Line::from(""));

    let range = range.unwrap_or((0.0, 1.0));
    let shown_cols = cols.min(max_cols);
    for (i, &mu) in buffer.mu_values().iter().enumerate().take(max_rows) {
        let mut spans = vec![
            Span::styled(format!("{mu:>8.3}"), Style::default().fg(Color::DarkGray)),
            Span::raw(" |"),
        ];
        for j in 0..shown_cols {
            let status = buffer.status(i, j).unwrap_or_default();
            let value = buffer.value(i, j).unwrap_or(f64::NAN);
            let (ch, color) = cell_glyph(status, value, range);
            spans.push(Span::styled(format!(" {ch}"), Style::default().fg(color)));
        }
        lines.push(Line::from(spans));
    }

    // X axis
    lines.push(Line::from(format!("{:>9}+{}", "", "--".repeat(shown_cols))));
    if let (Some(first), Some(last)) = (buffer.nu_values().first(), buffer.nu_values().last()) {
        lines.push(Line::from(vec![
            Span::raw(format!("{:>10}", "")),
            Span::styled(
                format!("nu {first:.1} -> {last:.1}"),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
    }

    lines.push(Line::from(vec![
        Span::raw("  Legend: "),
        Span::styled("Short", Style::default().fg(Color::Red)),
        Span::raw(" -> "),
        Span::styled("Mid", Style::default().fg(Color::Yellow)),
        Span::raw(" -> "),
        Span::styled("Long", Style::default().fg(Color::Green)),
        Span::raw("  "),
        Span::styled(
            format!("{PENDING_CHAR} pending"),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw("  "),
        Span::styled(
            format!("{UNDEFINED_CHAR} undefined"),
            Style::default().fg(Color::Blue),
        ),
        Span::raw("  "),
        Span::styled(
            format!("{FAILED_CHAR} failed"),
            Style::default().fg(Color::Magenta),
        ),
    ]));

    lines
}

/// Draw the heatmap inside `block`
pub fn render_heatmap(frame: &mut Frame, area: Rect, buffer: &PlotBuffer, block: Block) {
    let inner = block.inner(area);
    let max_rows = inner.height.saturating_sub(6) as usize;
    let max_cols = (inner.width.saturating_sub(10) / 2) as usize;

    let paragraph = Paragraph::new(heatmap_lines(buffer, max_rows, max_cols)).block(block);
    frame.render_widget(paragraph, area);
}

/// Unstyled heatmap for plain-text output
pub fn heatmap_text(buffer: &PlotBuffer) -> String {
    heatmap_lines(buffer, usize::MAX, usize::MAX)
        .iter()
        .map(|line| {
            line.spans
                .iter()
                .map(|span| span.content.as_ref())
                .collect::<String>()
                .trim_end()
                .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use periodsweep_core::analysis::{LinearRange, ParameterGrid, PointId, SweepResult};
    use periodsweep_core::period::PeriodEstimate;
    use periodsweep_core::IntegrationError;
    use ratatui::{Terminal, backend::TestBackend};

    fn buffer_with_every_status() -> PlotBuffer {
        let grid = ParameterGrid::build(
            &LinearRange::new(0.5, 1.0, 2),
            &LinearRange::new(100.0, 150.0, 3),
        )
        .unwrap();
        let mut buffer = PlotBuffer::new(&grid);
        let outcomes = [
            (1, Ok(PeriodEstimate::Mean(0.6))),
            (2, Ok(PeriodEstimate::Mean(0.9))),
            (3, Ok(PeriodEstimate::Undefined)),
            (4, Err(IntegrationError::TooManySteps { t: 1.0, steps: 10 })),
        ];
        for (id, outcome) in outcomes {
            buffer.apply(&SweepResult {
                id: PointId(id),
                mu: 0.0,
                nu: 0.0,
                outcome,
            });
        }
        buffer
    }

    #[test]
    fn test_status_glyphs_are_distinct() {
        let range = (0.0, 1.0);
        let glyphs = [
            cell_glyph(CellStatus::Pending, f64::NAN, range).0,
            cell_glyph(CellStatus::Undefined, f64::NAN, range).0,
            cell_glyph(CellStatus::Failed, f64::NAN, range).0,
        ];
        assert_eq!(glyphs, [PENDING_CHAR, UNDEFINED_CHAR, FAILED_CHAR]);
        for glyph in glyphs {
            assert!(!HEAT_CHARS.contains(&glyph));
        }
    }

    #[test]
    fn test_period_scale_endpoints() {
        let range = (2.0, 4.0);
        assert_eq!(cell_glyph(CellStatus::Period, 2.0, range), ('.', Color::Red));
        assert_eq!(cell_glyph(CellStatus::Period, 4.0, range), ('@', Color::Green));
        // Flat surface maps to the lowest glyph
        assert_eq!(cell_glyph(CellStatus::Period, 3.0, (3.0, 3.0)).0, '.');
    }

    #[test]
    fn test_text_rows() {
        let text = heatmap_text(&buffer_with_every_status());
        let rows: Vec<&str> = text.lines().filter(|l| l.contains(" |")).collect();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].ends_with("| . @ ~"));
        assert!(rows[1].ends_with("| x ? ?"));
        assert!(text.contains("nu 100.0 -> 150.0"));
    }

    #[test]
    fn test_render_to_test_backend() {
        let buffer = buffer_with_every_status();
        let mut terminal = Terminal::new(TestBackend::new(60, 14)).unwrap();
        terminal
            .draw(|frame| {
                let area = frame.area();
                render_heatmap(frame, area, &buffer, Block::bordered().title(" Sweep "));
            })
            .unwrap();

        let screen: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        assert!(screen.contains("Period"));
        assert!(screen.contains("Sweep"));
        assert!(screen.contains(". @ ~"));
    }
}

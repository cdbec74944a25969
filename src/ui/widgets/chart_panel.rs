use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::Line;
use ratatui::widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph};
use ratatui::Frame;

use crate::data::series::Series;
use crate::ui::theme;
use crate::util::{format_value, with_unit};

/// Line chart of one sensor's recent readings.
///
/// `cursor` marks a point; its value and full timestamp replace the latest
/// reading in the bottom title.
pub fn render(
    frame: &mut Frame,
    area: Rect,
    series: &Series,
    unit: &str,
    color: Color,
    selected: bool,
    cursor: Option<usize>,
) {
    let border = if selected {
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    } else {
        theme::border_style()
    };

    let annotation = cursor
        .and_then(|i| series.points.get(i))
        .or_else(|| series.latest())
        .map(|p| {
            format!(
                "{} @ {}",
                with_unit(&format_value(&p.value), unit),
                p.timestamp_full
            )
        })
        .unwrap_or_default();

    let mut block = Block::default()
        .title(Line::styled(
            format!(" {} ", series.sensor_name),
            theme::title_style(),
        ))
        .borders(Borders::ALL)
        .border_style(border);
    if !annotation.is_empty() {
        block = block.title_bottom(Line::styled(
            format!(" {annotation} "),
            Style::default().fg(color),
        ));
    }

    let points = series.chart_points();
    let Some((lo, hi)) = series.bounds() else {
        let empty = Paragraph::new("No data")
            .alignment(Alignment::Center)
            .style(theme::label_style())
            .block(block);
        frame.render_widget(empty, area);
        return;
    };

    // Keep a flat line off the frame edge.
    let pad = if hi > lo { (hi - lo) * 0.1 } else { lo.abs().max(1.0) * 0.05 };
    let y_bounds = [lo - pad, hi + pad];
    let x_max = series.len().saturating_sub(1).max(1) as f64;

    let marked: Vec<(f64, f64)> = cursor
        .and_then(|i| points.iter().find(|(x, _)| *x as usize == i).copied())
        .into_iter()
        .collect();

    let mut datasets = vec![Dataset::default()
        .marker(Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(&points)];
    if !marked.is_empty() {
        datasets.push(
            Dataset::default()
                .marker(Marker::Block)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(theme::YELLOW))
                .data(&marked),
        );
    }

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .style(theme::label_style())
                .bounds([0.0, x_max])
                .labels(axis_labels(series)),
        )
        .y_axis(
            Axis::default()
                .style(theme::label_style())
                .bounds(y_bounds)
                .labels([format!("{lo:.1}"), format!("{hi:.1}")]),
        );

    frame.render_widget(chart, area);
}

/// First and last non-blank point labels; the axis spreads them evenly.
fn axis_labels(series: &Series) -> Vec<String> {
    let mut labels = series.labels.iter().filter(|l| !l.is_empty());
    let first = labels.next().cloned();
    let last = labels.last().cloned();
    match (first, last) {
        (Some(a), Some(b)) => vec![a, b],
        (Some(a), None) => vec![a],
        _ => Vec::new(),
    }
}

//! Monitor layout and widget rendering.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Axis, Block, Borders, Cell, Chart, Dataset, Paragraph, Row, Table};

use super::runtime::App;
use super::style;
use crate::sim::snapshot::Snapshot;

/// Renders the full monitor frame.
pub fn render(frame: &mut Frame, app: &App) {
    let buildings = app.last().map_or(0, |s| s.buying.len());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),                    // header
            Constraint::Min(8),                       // chart
            Constraint::Length(buildings as u16 + 3), // buildings + matrix
            Constraint::Length(1),                    // footer
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    render_chart(frame, app, chunks[1]);

    let lower = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(28), Constraint::Min(20)])
        .split(chunks[2]);
    render_buildings(frame, app, lower[0]);
    render_transfers(frame, app, lower[1]);

    render_footer(frame, chunks[3]);
}

/// Header bar: hour, weather year, running cost, redraw speed, run state.
fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let (state_icon, state_label) = if app.finished {
        ("■", "DONE")
    } else if app.paused {
        ("‖", "PAUSED")
    } else {
        ("▶", "RUNNING")
    };

    let position = app.last().map_or_else(
        || "waiting".to_string(),
        |s| format!("h={} │ year {} (-{})", s.hour, s.year, s.year_offset),
    );

    let header = Line::from(vec![
        Span::styled(
            " MICROGRID ",
            Style::default()
                .fg(style::HEADER_FG)
                .bg(style::HEADER_BG)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            " {} │ cost {:.2} EUR │ {}ms │ {} {} ",
            position,
            app.total_cost,
            app.tick_interval_ms(),
            state_icon,
            state_label,
        )),
    ]);
    frame.render_widget(Paragraph::new(header), area);
}

/// Hourly grid cost over the rolling history.
fn render_chart(frame: &mut Frame, app: &App, area: Rect) {
    let points = app.cost_points();
    let y_bounds = style::auto_bounds_y(&points);

    let x_lo = points.first().map_or(0.0, |p| p.0);
    let x_hi = points.last().map_or(1.0, |p| p.0).max(x_lo + 1.0);

    let datasets = vec![
        Dataset::default()
            .name("Grid cost")
            .marker(symbols::Marker::Braille)
            .style(Style::default().fg(style::COST_COLOR))
            .data(&points),
    ];

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .title(" Hourly Grid Purchase ")
                .borders(Borders::ALL),
        )
        .x_axis(
            Axis::default()
                .title("hour")
                .bounds([x_lo, x_hi])
                .labels(vec![format!("{}", x_lo as u64), format!("{}", x_hi as u64)]),
        )
        .y_axis(
            Axis::default()
                .title("EUR")
                .bounds(y_bounds)
                .labels(vec![
                    format!("{:.2}", y_bounds[0]),
                    format!("{:.2}", y_bounds[1]),
                ]),
        );

    frame.render_widget(chart, area);
}

/// One line per building, red when it bought from the grid.
fn render_buildings(frame: &mut Frame, app: &App, area: Rect) {
    let lines = match app.last() {
        Some(s) => building_lines(s),
        None => vec![Line::from("  Waiting for first step...")],
    };
    let block = Block::default().title(" Buildings ").borders(Borders::ALL);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn building_lines(snapshot: &Snapshot) -> Vec<Line<'static>> {
    snapshot
        .buying
        .iter()
        .enumerate()
        .map(|(i, &buying)| {
            let inhabitants = snapshot.inhabitants.get(i).copied().unwrap_or(0);
            let label = if buying { "BUYING" } else { "LOCAL" };
            Line::from(vec![
                Span::raw(format!(" B{:<2} {:>2} inh  ", i + 1, inhabitants)),
                Span::styled("●", Style::default().fg(style::purchase_color(buying))),
                Span::raw(format!(" {label}")),
            ])
        })
        .collect()
}

/// Energy moved between buildings during the last hour (kWh).
fn render_transfers(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Transfers (kWh, row → column) ")
        .borders(Borders::ALL);

    let Some(snapshot) = app.last() else {
        frame.render_widget(block, area);
        return;
    };

    let n = snapshot.transfers.size();
    let header = Row::new(
        std::iter::once(Cell::from(""))
            .chain((0..n).map(|d| Cell::from(format!("B{}", d + 1)))),
    )
    .style(Style::default().add_modifier(Modifier::BOLD));

    let rows = (0..n).map(|s| {
        let cells = std::iter::once(Cell::from(format!("B{}", s + 1))).chain(
            snapshot.transfers.row(s).iter().enumerate().map(|(d, &kwh)| {
                let color = if s != d && kwh > 0.0 {
                    style::TRANSFER_ACTIVE
                } else {
                    style::FOOTER_FG
                };
                Cell::from(format!("{kwh:.2}")).style(Style::default().fg(color))
            }),
        );
        Row::new(cells)
    });

    let widths = std::iter::repeat_n(Constraint::Length(7), n + 1);
    let table = Table::new(rows, widths).header(header).block(block);
    frame.render_widget(table, area);
}

/// Footer with keybinding hints.
fn render_footer(frame: &mut Frame, area: Rect) {
    let footer = Paragraph::new(Line::from(Span::styled(
        " q:Quit  Space:Pause  +/-:Redraw speed",
        Style::default().fg(style::FOOTER_FG),
    )));
    frame.render_widget(footer, area);
}

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Margin, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Gauge, Padding, Paragraph, Row, Table},
};

use crate::app::App;
use crate::core::{AppState, Device};
use crate::utils::is_root;

// Design tokens for consistent styling
const COLOR_PRIMARY: Color = Color::Rgb(99, 179, 237); // Soft blue
const COLOR_SUCCESS: Color = Color::Rgb(104, 211, 145); // Soft green
const COLOR_WARNING: Color = Color::Rgb(246, 173, 85); // Soft orange
const COLOR_DANGER: Color = Color::Rgb(252, 129, 129); // Soft red
const COLOR_MUTED: Color = Color::Rgb(113, 128, 150); // Gray
const COLOR_BORDER: Color = Color::Rgb(74, 85, 104); // Dark gray

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Draw the main dashboard: header, device table, output pane, gauge, help
pub fn draw_dashboard(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Outer margin for breathing room
    let inner_area = area.inner(Margin::new(2, 1));

    let chunks = Layout::vertical([
        Constraint::Length(5),  // Header
        Constraint::Min(6),     // Device table
        Constraint::Length(10), // Install output
        Constraint::Length(3),  // Progress gauge
        Constraint::Length(3),  // Help bar
    ])
    .split(inner_area);

    draw_header(frame, chunks[0], app);
    draw_device_table(frame, chunks[1], app);
    draw_output_pane(frame, chunks[2], app);
    draw_progress_gauge(frame, chunks[3], app);
    draw_help_bar(frame, chunks[4], app);
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    // Privilege badge
    let (badge_text, badge_style) = if is_root() {
        (
            " ● ROOT ",
            Style::default()
                .fg(Color::Black)
                .bg(COLOR_SUCCESS)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        (
            " ○ USER ",
            Style::default()
                .fg(Color::Black)
                .bg(COLOR_WARNING)
                .add_modifier(Modifier::BOLD),
        )
    };

    let title_line = Line::from(vec![
        Span::styled(
            app.config.ui.title.clone(),
            Style::default()
                .fg(COLOR_PRIMARY)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(badge_text, badge_style),
    ]);

    // A failed scan must read differently from "0 devices detected"
    let subtitle = match &app.scan_error {
        Some(err) => Line::from(vec![Span::styled(
            format!("device scan failed: {err}"),
            Style::default().fg(COLOR_DANGER),
        )]),
        None => Line::from(vec![Span::styled(
            format!("{} devices detected", app.devices.len()),
            Style::default().fg(COLOR_MUTED),
        )]),
    };

    let header = Paragraph::new(vec![Line::default(), title_line, Line::default(), subtitle])
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_set(border::ROUNDED)
                .border_style(Style::default().fg(COLOR_BORDER))
                .padding(Padding::horizontal(2)),
        );

    frame.render_widget(header, area);
}

fn draw_device_table(frame: &mut Frame, area: Rect, app: &App) {
    let header_cells = ["PATH", "SIZE", "TRANSPORT", "MODEL", "TABLE"].iter().map(|h| {
        Cell::from(format!(" {} ", h)).style(
            Style::default()
                .fg(COLOR_MUTED)
                .add_modifier(Modifier::BOLD),
        )
    });
    let header = Row::new(header_cells).height(1).bottom_margin(1);

    // With nothing to select, show the informational entry instead
    let placeholder = Device::placeholder(&app.config.ui.placeholder);
    let (devices, selectable): (&[Device], bool) = if app.devices.is_empty() {
        (std::slice::from_ref(&placeholder), false)
    } else {
        (&app.devices, true)
    };

    let rows: Vec<Row> = devices
        .iter()
        .enumerate()
        .map(|(i, device)| {
            let is_selected = selectable && i == app.selected_index;

            let base_color = if device.is_placeholder() {
                COLOR_MUTED
            } else {
                Color::White
            };
            let style = if is_selected {
                Style::default()
                    .fg(Color::Black)
                    .bg(COLOR_PRIMARY)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(base_color)
            };

            let path = if device.path.is_empty() {
                "—"
            } else {
                device.path.as_str()
            };
            let size = if device.size.is_empty() {
                "—"
            } else {
                device.size.as_str()
            };
            let transport = device.transport_type.as_deref().unwrap_or("—");
            let table = device.partition_table_type.as_deref().unwrap_or("—");

            Row::new(vec![
                Cell::from(format!(" {} ", path)),
                Cell::from(format!(" {} ", size)),
                Cell::from(format!(" {} ", transport)),
                Cell::from(format!(" {} ", device.model_name)),
                Cell::from(format!(" {} ", table)),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(16),
        Constraint::Length(12),
        Constraint::Length(11),
        Constraint::Min(20),
        Constraint::Length(10),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_set(border::ROUNDED)
                .border_style(Style::default().fg(COLOR_BORDER))
                .title(" Devices ")
                .title_style(Style::default().fg(Color::White).bold())
                .padding(Padding::horizontal(1)),
        )
        .column_spacing(1);

    frame.render_widget(table, area);
}

fn draw_output_pane(frame: &mut Frame, area: Rect, app: &App) {
    let title = if app.state == AppState::Installing {
        let spinner = SPINNER_FRAMES[app.tick as usize % SPINNER_FRAMES.len()];
        format!(" {} Installing ", spinner)
    } else {
        " Install Output ".to_string()
    };

    let visible = area.height.saturating_sub(2) as usize;
    let skip = app.output_lines.len().saturating_sub(visible);
    let lines: Vec<Line> = app
        .output_lines
        .iter()
        .skip(skip)
        .map(|l| {
            let style = if l.starts_with("[error]") {
                Style::default().fg(COLOR_DANGER)
            } else if l.starts_with("[cancelled]") {
                Style::default().fg(COLOR_WARNING)
            } else {
                Style::default().fg(Color::White)
            };
            Line::from(Span::styled(l.clone(), style))
        })
        .collect();

    let pane = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_set(border::ROUNDED)
            .border_style(Style::default().fg(COLOR_BORDER))
            .title(title)
            .title_style(Style::default().fg(Color::White).bold())
            .padding(Padding::horizontal(1)),
    );

    frame.render_widget(pane, area);
}

fn draw_progress_gauge(frame: &mut Frame, area: Rect, app: &App) {
    let max = app.config.progress.max;
    let ratio = if max == 0 {
        0.0
    } else {
        (app.progress.min(max)) as f64 / max as f64
    };

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_set(border::ROUNDED)
                .border_style(Style::default().fg(COLOR_BORDER)),
        )
        .gauge_style(Style::default().fg(COLOR_SUCCESS))
        .ratio(ratio)
        .label(format!("{}/{}", app.progress.min(max), max));

    frame.render_widget(gauge, area);
}

fn draw_help_bar(frame: &mut Frame, area: Rect, app: &App) {
    let bindings = match &app.state {
        AppState::Idle => vec![
            ("↑↓", "Navigate"),
            ("Enter", "Install"),
            ("r", "Refresh"),
            ("q", "Quit"),
        ],
        AppState::ConfirmInstall(_) => vec![
            ("type path", "Confirm target"),
            ("Enter", "Start"),
            ("Esc", "Back"),
        ],
        AppState::Installing => vec![("Esc", "Cancel install")],
        _ => vec![("Esc", "Back"), ("q", "Quit")],
    };

    let mut spans = Vec::new();
    for (i, (key, action)) in bindings.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled("  │  ", Style::default().fg(COLOR_BORDER)));
        }
        spans.push(Span::styled(
            format!(" {} ", key),
            Style::default()
                .fg(Color::White)
                .bg(COLOR_BORDER)
                .add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::styled(
            format!(" {}", action),
            Style::default().fg(COLOR_MUTED),
        ));
    }

    let help = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_set(border::ROUNDED)
                .border_style(Style::default().fg(COLOR_BORDER)),
        );

    frame.render_widget(help, area);
}

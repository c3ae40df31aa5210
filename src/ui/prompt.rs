use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::app::App;

pub enum MessageType {
    Success,
    Error,
}

/// Draw the typed confirmation dialog for starting an install
pub fn draw_confirm_dialog(frame: &mut Frame, app: &App, device_path: &str) {
    let area = centered_rect(60, 40, frame.area());

    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(" ⚠️  CONFIRM INSTALL ")
        .borders(Borders::ALL)
        .style(Style::default().fg(Color::Red));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::vertical([
        Constraint::Length(2),
        Constraint::Length(2),
        Constraint::Length(2),
        Constraint::Length(3),
        Constraint::Min(1),
    ])
    .split(inner);

    let warning = Paragraph::new(Line::from(vec![
        Span::styled(
            "WARNING: ",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
        Span::raw(app.config.install.confirm_message.clone()),
    ]))
    .wrap(Wrap { trim: true });
    frame.render_widget(warning, chunks[0]);

    let target_label = app
        .selected_device()
        .map(|d| {
            // parted fields, when the configured pattern captured them
            match (&d.logical_sector_size, &d.physical_sector_size) {
                (Some(logical), Some(physical)) => {
                    format!("{} [{}/{} sectors]", d.display_label(), logical, physical)
                }
                _ => d.display_label(),
            }
        })
        .unwrap_or_else(|| device_path.to_string());
    let target = Paragraph::new(Line::from(vec![
        Span::styled("Target: ", Style::default().fg(Color::White)),
        Span::styled(
            target_label,
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
    ]));
    frame.render_widget(target, chunks[1]);

    let instruction = Paragraph::new(format!("Type '{}' to confirm:", device_path))
        .style(Style::default().fg(Color::Yellow));
    frame.render_widget(instruction, chunks[2]);

    let input_display = Paragraph::new(app.input_buffer.as_str()).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Input ")
            .style(Style::default().fg(Color::White)),
    );
    frame.render_widget(input_display, chunks[3]);
}

/// Draw final status messages
pub fn draw_status_message(frame: &mut Frame, message: &str, msg_type: MessageType) {
    let area = centered_rect(60, 40, frame.area());

    frame.render_widget(Clear, area);

    let (title, color) = match msg_type {
        MessageType::Success => (" Success ", Color::Green),
        MessageType::Error => (" Error ", Color::Red),
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .style(Style::default().fg(color));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).split(inner);

    let text = Paragraph::new(message)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .style(Style::default().fg(color));
    frame.render_widget(text, chunks[0]);

    let footer = Paragraph::new("Press Esc/Enter to dismiss")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[1]);
}

/// Helper to create a centered rectangle
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let [area] = Layout::horizontal([Constraint::Percentage(percent_x)])
        .flex(Flex::Center)
        .areas(r);
    let [area] = Layout::vertical([Constraint::Percentage(percent_y)])
        .flex(Flex::Center)
        .areas(area);
    area
}

use super::app::{App, InputTarget};
use admin_console::core::{Notice, NoticeLevel};
use admin_console::form::FormPhase;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Tabs, Wrap},
};
use serde_json::Value;

pub fn draw(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3), // Collection tabs
                Constraint::Min(1),    // Snapshot table grows
                Constraint::Length(4), // Last notice + key help
            ]
            .as_ref(),
        )
        .split(f.area());

    draw_tabs(f, app, chunks[0]);
    draw_table(f, app, chunks[1]);
    draw_status(f, app, chunks[2]);

    if app.current().form().is_open() {
        draw_form(f, app);
    } else if app.current().pending_delete().is_some() {
        draw_confirm(f, app);
    }
}

fn draw_tabs(f: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<String> = app
        .lists
        .iter()
        .map(|l| format!("{}s", l.descriptor().label))
        .collect();

    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title(" Admin Console "))
        .select(app.tab)
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );
    f.render_widget(tabs, area);
}

fn draw_table(f: &mut Frame, app: &mut App, area: Rect) {
    let list = &app.lists[app.tab];
    let descriptor = list.descriptor();

    let header = Row::new(
        descriptor
            .columns
            .iter()
            .map(|c| Cell::from(c.title.clone())),
    )
    .style(Style::default().add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = list
        .rows()
        .iter()
        .map(|row| {
            Row::new(
                descriptor
                    .columns
                    .iter()
                    .map(|c| Cell::from(cell_text(row.get(&c.field)))),
            )
        })
        .collect();

    let count = descriptor.columns.len().max(1) as u32;
    let widths = vec![Constraint::Ratio(1, count); count as usize];

    let title = if list.is_loading() {
        format!(" {}s (loading...) ", descriptor.label)
    } else {
        format!(" {}s ({}) ", descriptor.label, list.rows().len())
    };

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title))
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol(">> ");

    f.render_stateful_widget(table, area, &mut app.table_state);
}

fn draw_status(f: &mut Frame, app: &App, area: Rect) {
    let notice = app
        .notices
        .last()
        .map(notice_line)
        .unwrap_or_else(|| Line::from(""));

    let help = if app.current().form().is_open() {
        "Tab/Enter next field | Ctrl+S save | Ctrl+O stage file | Esc cancel"
    } else if app.current().pending_delete().is_some() {
        "y confirm | n cancel"
    } else {
        "Tab collection | n new | Enter edit | d delete | r reload | q quit"
    };

    let status = Paragraph::new(vec![
        notice,
        Line::from(Span::styled(help, Style::default().fg(Color::DarkGray))),
    ])
    .block(Block::default().borders(Borders::ALL).title(" Status "));
    f.render_widget(status, area);
}

fn draw_form(f: &mut Frame, app: &App) {
    let area = centered_rect(70, 85, f.area());
    f.render_widget(Clear, area);

    let form = app.current().form();
    let title = match form.phase() {
        FormPhase::Submitting => format!(" {} (saving...) ", form.title()),
        _ => format!(" {} ", form.title()),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(4)].as_ref())
        .split(inner);

    // Only the inputs around the focused one fit on small terminals
    let visible = ((chunks[0].height / 3) as usize).max(1);
    let start = (app.focus + 1).saturating_sub(visible);
    let end = (start + visible).min(app.inputs.len());

    let constraints: Vec<Constraint> = (start..end).map(|_| Constraint::Length(3)).collect();
    let slots = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(chunks[0]);

    for (slot, input) in slots.iter().zip(&app.inputs[start..end]) {
        f.render_widget(&input.textarea, *slot);
    }

    let mut footer: Vec<Line> = Vec::new();
    if let Some(message) = form.error_message() {
        footer.push(Line::from(Span::styled(
            message.to_string(),
            Style::default().fg(Color::Red),
        )));
    }

    if let Some(input) = app.inputs.get(app.focus) {
        if let InputTarget::Field(name) = &input.target {
            for message in form.field_errors().for_field(name) {
                footer.push(Line::from(Span::styled(
                    message.to_string(),
                    Style::default().fg(Color::Red),
                )));
            }
        }

        if let Some(source) = &input.option_source {
            let options: Vec<String> = form
                .options_for(source)
                .iter()
                .map(|o| format!("{}={}", o.label, o.id))
                .collect();
            let hint = if options.is_empty() {
                format!("No {} loaded", source)
            } else {
                options.join(", ")
            };
            footer.push(Line::from(Span::styled(
                hint,
                Style::default().fg(Color::DarkGray),
            )));
        }
    }

    if let Some(asset) = form.staging().pending() {
        footer.push(Line::from(Span::styled(
            format!("Staged: {} ({} bytes)", asset.file_name, asset.bytes.len()),
            Style::default().fg(Color::Green),
        )));
    }

    f.render_widget(
        Paragraph::new(footer).wrap(Wrap { trim: true }),
        chunks[1],
    );
}

fn draw_confirm(f: &mut Frame, app: &App) {
    let Some(pending) = app.current().pending_delete() else {
        return;
    };
    let area = centered_rect(50, 25, f.area());
    f.render_widget(Clear, area);

    let prompt = app.current().descriptor().delete_prompt();
    let text = vec![
        Line::from(prompt),
        Line::from(Span::styled(
            format!("id: {}", pending.id),
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("[y] ", Style::default().fg(Color::Red)),
            Span::raw("Delete   "),
            Span::styled("[n] ", Style::default().fg(Color::Yellow)),
            Span::raw("Cancel"),
        ]),
    ];

    let popup = Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Confirm ")
                .border_style(Style::default().fg(Color::Red)),
        );
    f.render_widget(popup, area);
}

fn notice_line(notice: &Notice) -> Line<'static> {
    let color = match notice.level {
        NoticeLevel::Info => Color::Cyan,
        NoticeLevel::Success => Color::Green,
        NoticeLevel::Error => Color::Red,
    };
    Line::from(Span::styled(
        notice.message.clone(),
        Style::default().fg(color),
    ))
}

/// Table cell for a raw record value; populated references show their name.
fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => if *b { "yes" } else { "no" }.to_string(),
        Some(Value::Object(map)) => map
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| Value::Object(map.clone()).to_string()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| cell_text(Some(item)))
            .collect::<Vec<_>>()
            .join(", "),
        Some(other) => other.to_string(),
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ]
            .as_ref(),
        )
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ]
            .as_ref(),
        )
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cell_text_shows_reference_names() {
        let category = json!({"_id": "c1", "name": "Soup"});
        assert_eq!(cell_text(Some(&category)), "Soup");
        assert_eq!(cell_text(Some(&json!(["a", {"name": "b"}]))), "a, b");
        assert_eq!(cell_text(Some(&json!(true))), "yes");
        assert_eq!(cell_text(None), "");
    }
}

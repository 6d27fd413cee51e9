use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::report::{Severity, CRITICAL_SCORE};

pub fn draw(frame: &mut Frame, app: &App) {
    // Main horizontal split: 1/3 left, 2/3 right
    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3), // Left pane: article list
            Constraint::Ratio(2, 3), // Right pane: details
        ])
        .split(frame.area());

    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Headline figures
            Constraint::Min(0),    // Article list
            Constraint::Length(1), // Key hints
        ])
        .split(main_chunks[0]);

    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Article title
            Constraint::Min(0),    // Details and preview
            Constraint::Length(1), // Status
        ])
        .split(main_chunks[1]);

    render_header(frame, app, left_chunks[0]);
    render_article_list(frame, app, left_chunks[1]);
    render_left_status(frame, left_chunks[2]);

    render_article_title(frame, app, right_chunks[0]);
    render_details(frame, app, right_chunks[1]);
    render_right_status(frame, app, right_chunks[2]);

    if app.show_help {
        render_help(frame);
    }
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Critical => Color::Red,
        Severity::Warning => Color::Yellow,
        Severity::Info => Color::Green,
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let stats = app.stats();
    let highest = stats
        .highest_score
        .map(|s| s.to_string())
        .unwrap_or_else(|| "-".to_string());

    let block = Block::default()
        .title(format!(" Sentinel [min {}] ", app.min_score))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = vec![
        Line::from(format!(" Active threats: {}", stats.active_threats)),
        Line::from(Span::styled(
            format!(" Critical risks ({CRITICAL_SCORE}+): {}", stats.critical_risks),
            Style::default().fg(Color::Red),
        )),
        Line::from(format!(" Highest risk score: {highest}")),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_article_list(frame: &mut Frame, app: &App, area: Rect) {
    let articles = app.visible_articles();

    let items: Vec<ListItem> = articles
        .iter()
        .map(|article| {
            let score = article.score_value().unwrap_or_default();
            let color = severity_color(Severity::from_score(score));

            let line = Line::from(vec![
                Span::styled(format!("[{score:>3}] "), Style::default().fg(color)),
                Span::styled(article.title.as_str(), Style::default().fg(Color::White)),
            ]);

            ListItem::new(line)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    if !articles.is_empty() {
        state.select(Some(app.selected_index));
    }

    frame.render_stateful_widget(list, area, &mut state);
}

fn render_left_status(frame: &mut Frame, area: Rect) {
    let status = "j/k:nav  +/-:threshold  r:reload  o:open  ?:help  q:quit";
    let paragraph = Paragraph::new(status).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}

fn render_article_title(frame: &mut Frame, app: &App, area: Rect) {
    let title = app
        .selected_article()
        .map(|a| a.title.as_str())
        .unwrap_or("No article at or above this score");

    let block = Block::default()
        .title(" Article ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    let paragraph = Paragraph::new(title)
        .block(block)
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}

fn render_details(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Summary ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta));

    let Some(article) = app.selected_article() else {
        let hint = Paragraph::new("Lower the threshold with '-' or run `sentinel run` to ingest news.")
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(hint, area);
        return;
    };

    let score = article.score_value().unwrap_or_default();
    let severity = Severity::from_score(score);
    let label = article.relevance.map(|r| r.label()).unwrap_or("unscored");

    let lines = vec![
        Line::from(vec![
            Span::raw("Relevance: "),
            Span::styled(
                format!(" {score}/100 {label} "),
                Style::default()
                    .fg(Color::White)
                    .bg(severity_color(severity))
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(format!("Date: {}", article.published)),
        Line::from(Span::styled(
            format!("Link: {}", article.link),
            Style::default().fg(Color::Blue),
        )),
        Line::from(""),
        Line::from(article.preview(app.preview_chars)),
    ];

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}

fn render_right_status(frame: &mut Frame, app: &App, area: Rect) {
    let text = app.status.clone().unwrap_or_else(|| {
        format!(
            "{} of {} articles shown",
            app.visible_articles().len(),
            app.articles.len()
        )
    });
    let paragraph = Paragraph::new(text).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}

fn render_help(frame: &mut Frame) {
    let area = centered_rect(50, 60, frame.area());

    let help_text = vec![
        "",
        " Navigation:",
        "   j / ↓    Move down",
        "   k / ↑    Move up",
        "   g / G    First / last article",
        "",
        " Filter:",
        "   +        Raise minimum score",
        "   -        Lower minimum score",
        "",
        " Actions:",
        "   r        Reload from database",
        "   o        Open link in browser",
        "",
        " General:",
        "   ?        Toggle this help",
        "   q        Quit",
        "",
        " Press any key to close",
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(help_text.join("\n"))
        .block(block)
        .style(Style::default().fg(Color::White));

    frame.render_widget(ratatui::widgets::Clear, area);
    frame.render_widget(paragraph, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

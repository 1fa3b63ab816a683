use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Padding, Paragraph},
};

use super::app::{App, ViewMode};
use crate::internal::models::{Article, ArticleStatus};
use crate::internal::notification::ToastKind;
use crate::internal::polling::PollSnapshot;
use crate::utils::datetime::format_age;
use crate::utils::text::{truncate, wrap_content};

/// Banner text for the new posts indicator, or `None` when nothing needs
/// showing. A paused poller takes precedence over a stale count.
pub fn new_posts_label(snapshot: &PollSnapshot) -> Option<String> {
    if snapshot.is_paused() {
        return Some("Paused checking for new posts · press r to retry".to_string());
    }
    match snapshot.pending_count {
        0 => None,
        1 => Some("1 new post · press n to load".to_string()),
        n => Some(format!("{} new posts · press n to load", n)),
    }
}

#[tracing::instrument(skip(app, f))]
pub fn draw(app: &mut App, f: &mut Frame) {
    let banner = match app.view_mode {
        ViewMode::List => new_posts_label(&app.poll_snapshot),
        ViewMode::Detail => None,
    };
    let banner_height = if banner.is_some() { 1 } else { 0 };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(banner_height),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    render_top_bar(app, f, chunks[0]);
    if let Some(label) = banner {
        render_banner(app, f, chunks[1], &label);
    }

    match app.view_mode {
        ViewMode::List => render_list(app, f, chunks[2]),
        ViewMode::Detail => render_detail(app, f, chunks[2]),
    }

    render_status_bar(app, f, chunks[3]);

    if app.toast.is_some() {
        render_toast(app, f);
    }
}

fn status_color(status: ArticleStatus) -> Color {
    match status {
        ArticleStatus::Public => Color::Green,
        ArticleStatus::Pending => Color::Yellow,
        ArticleStatus::Private => Color::Blue,
        ArticleStatus::Rejected => Color::Red,
        ArticleStatus::Unknown => Color::DarkGray,
    }
}

fn render_top_bar(app: &App, f: &mut Frame, area: Rect) {
    let polling = match (app.config.polling.enabled, app.poll_snapshot.phase) {
        (false, _) => "Polling:Off".to_string(),
        (true, phase) => format!("Polling:{}", phase),
    };
    let focus = match app.poll_snapshot.is_tab_visible {
        true => "",
        false => " (hidden)",
    };
    let text = format!(
        "travel-feed v{}  {} | Filter: {}  {}{}",
        app.app_version,
        app.scope.label(),
        app.filter,
        polling,
        focus
    );

    let p = Paragraph::new(text)
        .block(Block::default().padding(Padding::horizontal(1)))
        .style(Style::default().fg(Color::White).bg(Color::Black));
    f.render_widget(p, area);
}

fn render_banner(app: &App, f: &mut Frame, area: Rect, label: &str) {
    let bg = match app.poll_snapshot.is_paused() {
        true => Color::Yellow,
        false => Color::Cyan,
    };
    let p = Paragraph::new(label)
        .alignment(Alignment::Center)
        .style(
            Style::default()
                .fg(Color::Black)
                .bg(bg)
                .add_modifier(Modifier::BOLD),
        );
    f.render_widget(p, area);
}

fn list_row(idx: usize, article: &Article, width: usize) -> ListItem<'static> {
    let status = article.status.to_string();
    let meta = format!(
        "{} · {} · {}",
        article.username.as_deref().unwrap_or("unknown"),
        article.location_name.as_deref().unwrap_or("somewhere"),
        format_age(article.created_at)
    );

    let title_width = width.saturating_sub(status.len() + 8);
    let title_line = Line::from(vec![
        Span::styled(format!("{:<4}", idx + 1), Style::default().fg(Color::DarkGray)),
        Span::styled(
            truncate(article.display_title(), title_width),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(
            format!("[{}]", status),
            Style::default().fg(status_color(article.status)),
        ),
    ]);
    let meta_line = Line::from(vec![
        Span::raw("    "),
        Span::styled(truncate(&meta, width.saturating_sub(4)), Style::default().fg(Color::Gray)),
    ]);

    ListItem::new(vec![title_line, meta_line])
}

fn render_list(app: &mut App, f: &mut Frame, area: Rect) {
    let width = area.width.saturating_sub(2) as usize;
    let items: Vec<ListItem> = app
        .visible_articles()
        .into_iter()
        .enumerate()
        .map(|(idx, article)| list_row(idx, article, width))
        .collect();

    let title = format!(" {} ({}) ", app.scope.label(), items.len());
    let empty = items.is_empty();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        );

    if empty && !app.loading {
        let p = Paragraph::new("No posts yet")
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" {} ", app.scope.label())),
            );
        f.render_widget(p, area);
        return;
    }

    f.render_stateful_widget(list, area, &mut app.list_state);
}

fn render_detail(app: &App, f: &mut Frame, area: Rect) {
    let Some(article) = &app.selected_article else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(0)])
        .split(area);

    let tags = match article.tags.is_empty() {
        true => "-".to_string(),
        false => article
            .tags
            .iter()
            .map(|t| format!("#{}", t))
            .collect::<Vec<_>>()
            .join(" "),
    };
    let header = vec![
        Line::from(Span::styled(
            article.display_title().to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(format!(
            "By {} in {} · {}",
            article.username.as_deref().unwrap_or("unknown"),
            article.location_name.as_deref().unwrap_or("somewhere"),
            format_age(article.created_at)
        )),
        Line::from(vec![
            Span::raw("Status: "),
            Span::styled(
                article.status.to_string(),
                Style::default().fg(status_color(article.status)),
            ),
            Span::raw(format!(
                " · {} likes · {} comments · {} photos",
                article.likes.unwrap_or(0),
                article.comments.unwrap_or(0),
                article.image_keys.len()
            )),
        ]),
        Line::from(format!("Tags: {}", tags)),
    ];
    let p = Paragraph::new(header).block(Block::default().borders(Borders::ALL).title(" Post "));
    f.render_widget(p, chunks[0]);

    let body_width = chunks[1].width.saturating_sub(2) as usize;
    let body = wrap_content(article.content.as_deref().unwrap_or(""), body_width);
    let lines: Vec<Line> = body
        .into_iter()
        .skip(app.detail_scroll)
        .map(Line::from)
        .collect();
    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL));
    f.render_widget(p, chunks[1]);
}

fn render_status_bar(app: &App, f: &mut Frame, area: Rect) {
    let status = match (app.loading, app.view_mode) {
        (true, _) => format!("{} Loading posts...", app.get_spinner_char()),
        (false, ViewMode::List) => {
            let more = match app.next_token {
                Some(_) => " | more below",
                None => "",
            };
            format!(
                "1/2: Feed/Mine | j/k: Nav | Enter: View | f: Filter | n: New | p: Polling | o: Browser | q: Quit{}",
                more
            )
        }
        (false, ViewMode::Detail) => "Esc: Back | j/k: Scroll | o: Browser | q: Quit".to_string(),
    };

    let p = Paragraph::new(status)
        .block(Block::default().padding(Padding::horizontal(1)))
        .style(Style::default().fg(Color::Black).bg(Color::Gray));
    f.render_widget(p, area);
}

fn render_toast(app: &App, f: &mut Frame) {
    let Some(toast) = &app.toast else {
        return;
    };
    let area = f.area();

    let popup_width = (toast.message.chars().count() as u16 + 4)
        .min(area.width.saturating_sub(4))
        .max(10);
    let popup_height = 3;
    let popup_x = area.width.saturating_sub(popup_width) / 2;
    let popup_y = area.height.saturating_sub(popup_height + 2);
    let popup_area = Rect::new(
        popup_x,
        popup_y,
        popup_width.min(area.width),
        popup_height.min(area.height),
    );

    let bg_color = match toast.kind {
        ToastKind::Info => Color::Blue,
        ToastKind::Success => Color::Green,
        ToastKind::Warning => Color::Yellow,
        ToastKind::Error => Color::Red,
    };

    let popup = Paragraph::new(toast.message.as_str())
        .style(
            Style::default()
                .bg(bg_color)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(toast.kind.title()),
        )
        .alignment(Alignment::Center);

    f.render_widget(Clear, popup_area);
    f.render_widget(popup, popup_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::polling::PollPhase;

    #[test]
    fn test_new_posts_label() {
        let mut snapshot = PollSnapshot::default();
        assert_eq!(new_posts_label(&snapshot), None);

        snapshot.pending_count = 1;
        insta::assert_snapshot!(new_posts_label(&snapshot).unwrap(), @"1 new post · press n to load");

        snapshot.pending_count = 7;
        insta::assert_snapshot!(new_posts_label(&snapshot).unwrap(), @"7 new posts · press n to load");

        snapshot.phase = PollPhase::Paused;
        insta::assert_snapshot!(new_posts_label(&snapshot).unwrap(), @"Paused checking for new posts · press r to retry");
    }
}

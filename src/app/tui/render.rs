use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, BorderType, Borders, Cell, Gauge, Paragraph, Row, Table, TableState, Wrap,
};

use super::super::news::{NewsItem, format_clock, format_published_display, truncate};
use super::super::playback::PlaybackState;
use super::super::readmarks::ReadMarks;
use super::FeedState;

const ACCENT: Color = Color::Rgb(235, 180, 85);
const DIM: Color = Color::Rgb(185, 195, 210);
const TEXT: Color = Color::Rgb(230, 230, 230);

#[allow(clippy::too_many_arguments)]
pub(super) fn draw_tui(
    frame: &mut Frame,
    items: &[NewsItem],
    marks: &ReadMarks,
    table_state: &mut TableState,
    feed_state: &FeedState,
    detail: Option<(&NewsItem, &PlaybackState)>,
    status: &str,
) {
    let bg = Block::default().style(Style::default().bg(Color::Black));
    frame.render_widget(bg, frame.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(frame.area());

    draw_header(frame, chunks[0], items, marks, detail.is_some());

    match detail {
        Some((item, playback)) => draw_detail(frame, chunks[1], item, playback),
        None => draw_list(frame, chunks[1], items, marks, table_state, feed_state),
    }

    let controls = if detail.is_some() {
        "Space play/pause  ←/→ seek  0-9 jump  v video  o source  Esc back  q quit"
    } else {
        "↑/↓ move  Enter open  r refresh  q quit"
    };
    let command_bar = Paragraph::new(Line::from(Span::styled(
        controls,
        Style::default().fg(DIM),
    )))
    .alignment(Alignment::Center)
    .block(panel_block("Controls"));
    frame.render_widget(command_bar, chunks[2]);

    let status_widget = Paragraph::new(status.to_string())
        .style(status_style(status))
        .block(panel_block("Status"));
    frame.render_widget(status_widget, chunks[3]);
}

fn draw_header(
    frame: &mut Frame,
    area: Rect,
    items: &[NewsItem],
    marks: &ReadMarks,
    in_detail: bool,
) {
    let unread = marks.count_unread(items.iter().map(|item| item.id));
    let mode_text = if in_detail { "READING" } else { "LIST" };
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            "NOTICAST",
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ),
        Span::styled("   ", Style::default()),
        Span::styled(format!("{} items", items.len()), Style::default().fg(DIM)),
        Span::styled("   ", Style::default()),
        Span::styled(format!("{unread} unread"), Style::default().fg(DIM)),
        Span::styled("   ", Style::default()),
        Span::styled(mode_text, Style::default().fg(Color::Yellow)),
    ]))
    .alignment(Alignment::Center)
    .block(panel_block("Newsstand"));
    frame.render_widget(header, area);
}

fn draw_list(
    frame: &mut Frame,
    area: Rect,
    items: &[NewsItem],
    marks: &ReadMarks,
    table_state: &mut TableState,
    feed_state: &FeedState,
) {
    if matches!(feed_state, FeedState::Loading) {
        let loading = Paragraph::new("Loading news feed...")
            .style(Style::default().fg(DIM))
            .alignment(Alignment::Center)
            .block(panel_block("Headlines"));
        frame.render_widget(loading, area);
        return;
    }

    let body_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(64), Constraint::Percentage(36)])
        .split(area);

    let rows: Vec<Row> = items
        .iter()
        .map(|item| {
            Row::new(vec![
                Cell::from(item.title.clone()),
                Cell::from(item.publisher.clone().unwrap_or_else(|| "-".to_string())),
                Cell::from(
                    item.published_at
                        .as_deref()
                        .map(format_published_display)
                        .unwrap_or_else(|| "-".to_string()),
                ),
                Cell::from(media_badge(item)),
                Cell::from(if marks.is_read(item.id) { "✓" } else { "" }),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(52),
            Constraint::Length(16),
            Constraint::Length(12),
            Constraint::Length(13),
            Constraint::Length(5),
        ],
    )
    .header(
        Row::new(vec!["Title", "Publisher", "Date", "Media", "Read"])
            .style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
    )
    .block(panel_block("Headlines"))
    .row_highlight_style(
        Style::default()
            .bg(ACCENT)
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("▸ ");
    frame.render_stateful_widget(table, body_chunks[0], table_state);

    let selection_text = match table_state.selected().and_then(|idx| items.get(idx)) {
        Some(item) => {
            let mut text = format!("Title\n{}\n", truncate(&item.title, 48));
            if let Some(publisher) = &item.publisher {
                text.push_str(&format!("\nPublisher\n{publisher}\n"));
            }
            if let Some(published_at) = &item.published_at {
                text.push_str(&format!(
                    "\nDate\n{}\n",
                    format_published_display(published_at)
                ));
            }
            if !item.summary.is_empty() {
                text.push_str(&format!("\nSummary\n{}", truncate(&item.summary, 180)));
            }
            text
        }
        None => "Nothing to read yet.\n\nPress r to refresh the feed.".to_string(),
    };
    let selection = Paragraph::new(selection_text)
        .style(Style::default().fg(TEXT))
        .wrap(Wrap { trim: true })
        .block(panel_block("Selected"))
        .alignment(Alignment::Left);
    frame.render_widget(selection, body_chunks[1]);
}

fn draw_detail(frame: &mut Frame, area: Rect, item: &NewsItem, playback: &PlaybackState) {
    let has_audio = item.has_audio();
    let has_video = item.has_video();

    let media_lines = usize::from(has_audio) + usize::from(has_video);
    let mut constraints = vec![Constraint::Length(6), Constraint::Min(5)];
    if media_lines > 0 {
        constraints.push(Constraint::Length(media_lines as u16 + 2));
    }
    if has_audio {
        constraints.push(Constraint::Length(3));
    }
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let mut meta = format!("{}\n", item.title);
    match (&item.publisher, &item.published_at) {
        (Some(publisher), Some(published_at)) => {
            meta.push_str(&format!(
                "{publisher}   {}\n",
                format_published_display(published_at)
            ));
        }
        (Some(publisher), None) => meta.push_str(&format!("{publisher}\n")),
        (None, Some(published_at)) => {
            meta.push_str(&format!("{}\n", format_published_display(published_at)));
        }
        (None, None) => {}
    }
    if let Some(source) = &item.source {
        meta.push_str(&format!("Source: {}", truncate(source, 70)));
    }
    let meta_widget = Paragraph::new(meta)
        .style(Style::default().fg(TEXT))
        .wrap(Wrap { trim: true })
        .block(panel_block("Story"));
    frame.render_widget(meta_widget, chunks[0]);

    let summary = if item.summary.is_empty() {
        "No summary available.".to_string()
    } else {
        item.summary.clone()
    };
    let summary_widget = Paragraph::new(summary)
        .style(Style::default().fg(TEXT))
        .wrap(Wrap { trim: true })
        .block(panel_block("Summary"));
    frame.render_widget(summary_widget, chunks[1]);

    if media_lines == 0 {
        return;
    }

    let mut lines: Vec<Line> = Vec::new();
    if has_video {
        let video_text = if playback.video_visible {
            "Video playing in the player window..."
        } else if playback.video_ended {
            "Video watched ✓ (press v to watch again)"
        } else {
            "Video cover: press v to watch"
        };
        lines.push(Line::from(Span::styled(
            video_text,
            Style::default().fg(TEXT),
        )));
    }
    if has_audio {
        let transport = if playback.audio_playing {
            "▶ Playing"
        } else if playback.audio_loaded {
            "⏸ Paused"
        } else {
            "Audio narration (loading on play)"
        };
        let auto_note = if playback.audio_auto_started {
            "  · continued after video"
        } else {
            ""
        };
        lines.push(Line::from(Span::styled(
            format!(
                "{transport}   {} / {}{auto_note}",
                format_clock(playback.audio_position),
                format_clock(playback.audio_duration)
            ),
            Style::default().fg(TEXT),
        )));
    }
    let media_widget = Paragraph::new(lines).block(panel_block("Playback"));
    frame.render_widget(media_widget, chunks[2]);

    if has_audio {
        let ratio = if playback.audio_duration.is_zero() {
            0.0
        } else {
            (playback.audio_position.as_secs_f64() / playback.audio_duration.as_secs_f64())
                .clamp(0.0, 1.0)
        };
        let progress = Gauge::default()
            .block(panel_block("Progress"))
            .gauge_style(
                Style::default()
                    .fg(ACCENT)
                    .bg(Color::Black)
                    .add_modifier(Modifier::BOLD),
            )
            .label(format!(
                "{} / {}",
                format_clock(playback.audio_position),
                format_clock(playback.audio_duration)
            ))
            .ratio(ratio);
        frame.render_widget(progress, chunks[3]);
    }
}

fn media_badge(item: &NewsItem) -> &'static str {
    match (item.has_audio(), item.has_video()) {
        (true, true) => "audio+video",
        (true, false) => "audio",
        (false, true) => "video",
        (false, false) => "-",
    }
}

fn panel_block(title: &'static str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Rgb(125, 135, 150)))
        .title(title)
}

fn status_style(status: &str) -> Style {
    if status.starts_with("ERROR:") {
        Style::default()
            .fg(Color::Rgb(255, 145, 120))
            .add_modifier(Modifier::BOLD)
    } else if status.starts_with("INFO:") {
        Style::default().fg(Color::Rgb(205, 185, 140))
    } else {
        Style::default().fg(Color::Rgb(230, 235, 242))
    }
}

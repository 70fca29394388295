mod actions;
mod render;
mod session;

use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::widgets::TableState;

use crate::db::Database;

use super::news::{NewsItem, truncate};
use super::playback::{PlaybackCoordinator, PlaybackEvent};
use super::player::{MediaEvent, PlayerHandle};
use super::readmarks::load_read_marks;

use self::actions::{
    FeedFetchResult, drain_feed_results, open_source_link, spawn_feed_fetch, status_error,
    status_info,
};
use self::render::draw_tui;
use self::session::TuiSession;

#[derive(Debug, Clone, Copy)]
pub(super) enum FeedState {
    Loading,
    Ready,
}

enum Screen {
    List,
    /// The open item, cloned out of the list so a feed refresh cannot pull
    /// it out from under the reader.
    Detail(NewsItem),
}

pub(crate) fn run_tui(db: &Database) -> Result<()> {
    let mut session = TuiSession::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))
        .context("failed to initialize terminal backend")?;
    terminal.clear()?;

    let marks_read = load_read_marks(db);
    let mut marks = marks_read.marks;
    let mut status = match marks_read.warnings.first() {
        Some(warning) => status_error(warning),
        None => status_info("Loading news feed..."),
    };

    let mut items: Vec<NewsItem> = Vec::new();
    let mut feed_state = FeedState::Loading;
    let (feed_tx, feed_rx) = mpsc::channel::<FeedFetchResult>();
    spawn_feed_fetch(&feed_tx);

    let mut table_state = TableState::default();
    let mut screen = Screen::List;

    let (mut player, media_rx) = PlayerHandle::new();
    let mut coordinator: Option<PlaybackCoordinator> = None;
    let mut auto_start_deadline: Option<Instant> = None;

    loop {
        drain_feed_results(
            &feed_rx,
            &mut items,
            &mut feed_state,
            &mut table_state,
            &mut status,
        );

        while let Ok(media_event) = media_rx.try_recv() {
            // Reports arriving after the reader left the detail view belong
            // to already-stopped playback.
            let Screen::Detail(item) = &screen else {
                continue;
            };
            if let MediaEvent::AudioFailed(detail) = &media_event {
                status = status_error(&format!("audio playback failed: {detail}"));
            }
            if let MediaEvent::VideoFailed { generation, detail } = &media_event
                && player.is_current_video(*generation)
            {
                status = status_error(&format!("video playback failed: {detail}"));
            }
            let Some(playback_event) = translate_media_event(&media_event, &player) else {
                continue;
            };
            let Some(active) = coordinator.as_mut() else {
                continue;
            };
            let effects = active.handle(playback_event);
            let warnings = player.apply(&effects, item, &mut auto_start_deadline);
            if let Some(warning) = warnings.first() {
                status = status_error(warning);
            }
        }

        if let Some(deadline) = auto_start_deadline
            && Instant::now() >= deadline
        {
            auto_start_deadline = None;
            if let Screen::Detail(item) = &screen {
                dispatch_playback_event(
                    &mut coordinator,
                    &mut player,
                    item,
                    PlaybackEvent::AutoStartDue,
                    &mut auto_start_deadline,
                    &mut status,
                );
            }
        }

        let detail = match (&screen, coordinator.as_ref()) {
            (Screen::Detail(item), Some(active)) => Some((item, active.state())),
            _ => None,
        };
        terminal.draw(|frame| {
            draw_tui(
                frame,
                &items,
                &marks,
                &mut table_state,
                &feed_state,
                detail,
                &status,
            )
        })?;

        if !event::poll(Duration::from_millis(200))? {
            continue;
        }

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match &screen {
            Screen::List => match key.code {
                KeyCode::Char('q') => break,
                KeyCode::Char('r') => {
                    feed_state = FeedState::Loading;
                    spawn_feed_fetch(&feed_tx);
                    status = status_info("Refreshing feed...");
                }
                KeyCode::Up => {
                    if let Some(selected) = table_state.selected() {
                        table_state.select(Some(selected.saturating_sub(1)));
                    }
                }
                KeyCode::Down => {
                    if let Some(selected) = table_state.selected()
                        && !items.is_empty()
                    {
                        let next = (selected + 1).min(items.len().saturating_sub(1));
                        table_state.select(Some(next));
                    }
                }
                KeyCode::Enter => {
                    let Some(selected) = table_state.selected() else {
                        continue;
                    };
                    let Some(item) = items.get(selected) else {
                        continue;
                    };
                    let item = item.clone();
                    if let Err(err) = marks.mark_as_read(db, item.id) {
                        status = status_error(&format!("failed to persist read mark: {err}"));
                    } else {
                        status = status_info(&truncate(&item.title, 60));
                    }
                    // No cross-item leakage: tear down whatever the previous
                    // item left playing before mounting the new view.
                    dispatch_playback_event(
                        &mut coordinator,
                        &mut player,
                        &item,
                        PlaybackEvent::Reset,
                        &mut auto_start_deadline,
                        &mut status,
                    );
                    coordinator =
                        Some(PlaybackCoordinator::new(item.has_audio(), item.has_video()));
                    screen = Screen::Detail(item);
                }
                _ => {}
            },
            Screen::Detail(item) => {
                let item = item.clone();
                match key.code {
                    KeyCode::Char('q') => {
                        dispatch_playback_event(
                            &mut coordinator,
                            &mut player,
                            &item,
                            PlaybackEvent::Reset,
                            &mut auto_start_deadline,
                            &mut status,
                        );
                        break;
                    }
                    KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('b') => {
                        dispatch_playback_event(
                            &mut coordinator,
                            &mut player,
                            &item,
                            PlaybackEvent::Reset,
                            &mut auto_start_deadline,
                            &mut status,
                        );
                        coordinator = None;
                        screen = Screen::List;
                        status = status_info("Ready.");
                    }
                    KeyCode::Char(' ') | KeyCode::Char('p') => {
                        dispatch_playback_event(
                            &mut coordinator,
                            &mut player,
                            &item,
                            PlaybackEvent::PlayToggled,
                            &mut auto_start_deadline,
                            &mut status,
                        );
                    }
                    KeyCode::Char('v') | KeyCode::Enter => {
                        dispatch_playback_event(
                            &mut coordinator,
                            &mut player,
                            &item,
                            PlaybackEvent::CoverActivated,
                            &mut auto_start_deadline,
                            &mut status,
                        );
                    }
                    KeyCode::Char('o') => match open_source_link(&item) {
                        Ok(message) => status = status_info(&message),
                        Err(err) => status = status_error(&format!("open source failed: {err}")),
                    },
                    KeyCode::Left | KeyCode::Right => {
                        if let Some(fraction) =
                            relative_seek_fraction(coordinator.as_ref(), key.code)
                        {
                            dispatch_playback_event(
                                &mut coordinator,
                                &mut player,
                                &item,
                                PlaybackEvent::SeekRequested(fraction),
                                &mut auto_start_deadline,
                                &mut status,
                            );
                        }
                    }
                    KeyCode::Char(digit @ '0'..='9') => {
                        let fraction = f64::from(digit as u8 - b'0') / 10.0;
                        dispatch_playback_event(
                            &mut coordinator,
                            &mut player,
                            &item,
                            PlaybackEvent::SeekRequested(fraction),
                            &mut auto_start_deadline,
                            &mut status,
                        );
                    }
                    _ => {}
                }
            }
        }
    }

    player.shutdown();
    terminal.show_cursor()?;
    session.leave()?;
    Ok(())
}

fn dispatch_playback_event(
    coordinator: &mut Option<PlaybackCoordinator>,
    player: &mut PlayerHandle,
    item: &NewsItem,
    event: PlaybackEvent,
    auto_start_deadline: &mut Option<Instant>,
    status: &mut String,
) {
    let Some(active) = coordinator.as_mut() else {
        return;
    };
    let effects = active.handle(event);
    let warnings = player.apply(&effects, item, auto_start_deadline);
    if let Some(warning) = warnings.first() {
        *status = status_error(warning);
    }
}

/// Maps a media report onto a coordinator event, dropping reports from a
/// destroyed video widget by generation.
fn translate_media_event(event: &MediaEvent, player: &PlayerHandle) -> Option<PlaybackEvent> {
    match event {
        MediaEvent::AudioLoaded(duration) => Some(PlaybackEvent::AudioLoaded(*duration)),
        MediaEvent::AudioProgress(position) => Some(PlaybackEvent::AudioProgress(*position)),
        MediaEvent::AudioStarted => Some(PlaybackEvent::AudioStarted),
        MediaEvent::AudioPaused => Some(PlaybackEvent::AudioPaused),
        MediaEvent::AudioFinished => Some(PlaybackEvent::AudioFinished),
        MediaEvent::AudioFailed(_) => Some(PlaybackEvent::AudioFailed),
        MediaEvent::VideoStarted { generation } => player
            .is_current_video(*generation)
            .then_some(PlaybackEvent::VideoStarted),
        MediaEvent::VideoEnded { generation } => player
            .is_current_video(*generation)
            .then_some(PlaybackEvent::VideoEnded),
        MediaEvent::VideoFailed { generation, .. } => player
            .is_current_video(*generation)
            .then_some(PlaybackEvent::VideoFailed),
    }
}

fn relative_seek_fraction(
    coordinator: Option<&PlaybackCoordinator>,
    key: KeyCode,
) -> Option<f64> {
    let state = coordinator?.state();
    if !state.audio_loaded || state.audio_duration.is_zero() {
        return None;
    }
    let step = 10.0;
    let duration = state.audio_duration.as_secs_f64();
    let position = state.audio_position.as_secs_f64();
    let target = match key {
        KeyCode::Left => position - step,
        KeyCode::Right => position + step,
        _ => return None,
    };
    Some((target / duration).clamp(0.0, 1.0))
}

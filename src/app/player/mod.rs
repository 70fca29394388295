mod audio;
mod video;

use std::path::PathBuf;
use std::sync::OnceLock;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};

use super::news::NewsItem;
use super::playback::Effect;

use self::audio::AudioDeck;
use self::video::VideoWidget;

pub(crate) const PLAYER_BIN_ENV: &str = "NOTICAST_PLAYER_BIN";

/// What the media backends report back to the event loop. Video events carry
/// the generation of the widget that produced them so reports from a
/// destroyed instance can be dropped.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum MediaEvent {
    AudioLoaded(Duration),
    AudioProgress(Duration),
    AudioStarted,
    AudioPaused,
    AudioFinished,
    AudioFailed(String),
    VideoStarted { generation: u64 },
    VideoEnded { generation: u64 },
    VideoFailed { generation: u64, detail: String },
}

static PLAYER_BIN: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Resolve the media player binary once; every widget and deck observes the
/// same result. Env override first, then `mpv` on PATH.
pub(super) fn resolve_player_bin() -> Result<PathBuf> {
    let resolved = PLAYER_BIN.get_or_init(probe_player_bin);
    resolved
        .clone()
        .ok_or_else(|| anyhow!("no media player found; install mpv or set {PLAYER_BIN_ENV}"))
}

fn probe_player_bin() -> Option<PathBuf> {
    if let Some(custom) = std::env::var_os(PLAYER_BIN_ENV)
        && !custom.is_empty()
    {
        return Some(PathBuf::from(custom));
    }
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join("mpv"))
        .find(|candidate| candidate.is_file())
}

/// Boundary between the pure coordinator and the real backends: runs effect
/// lists in order and reports failures as warnings for the status line.
pub(crate) struct PlayerHandle {
    events_tx: Sender<MediaEvent>,
    audio: Option<AudioDeck>,
    video: Option<VideoWidget>,
    video_generation: u64,
}

impl PlayerHandle {
    pub(crate) fn new() -> (Self, Receiver<MediaEvent>) {
        let (events_tx, events_rx) = channel();
        (
            Self {
                events_tx,
                audio: None,
                video: None,
                video_generation: 0,
            },
            events_rx,
        )
    }

    pub(crate) fn is_current_video(&self, generation: u64) -> bool {
        generation == self.video_generation
    }

    pub(crate) fn apply(
        &mut self,
        effects: &[Effect],
        item: &NewsItem,
        auto_start_deadline: &mut Option<Instant>,
    ) -> Vec<String> {
        let mut warnings = Vec::new();
        for effect in effects {
            match effect {
                Effect::LoadAudio => {
                    let Some(url) = item.audio.clone() else { continue };
                    if let Err(err) = self.load_audio(&url) {
                        self.report_audio_failure(&mut warnings, &err.to_string());
                    }
                }
                Effect::PlayAudio => {
                    if let Err(err) = self.play_audio() {
                        self.report_audio_failure(&mut warnings, &err.to_string());
                    }
                }
                Effect::PauseAudio => {
                    if let Some(deck) = self.audio.as_mut()
                        && let Err(err) = deck.pause()
                    {
                        warnings.push(format!("audio pause failed: {err}"));
                    }
                }
                Effect::StopAudio => {
                    if let Some(deck) = self.audio.as_mut()
                        && let Err(err) = deck.stop()
                    {
                        warnings.push(format!("audio stop failed: {err}"));
                    }
                }
                Effect::SeekAudio(position) => {
                    if let Some(deck) = self.audio.as_mut()
                        && let Err(err) = deck.seek(*position)
                    {
                        warnings.push(format!("audio seek failed: {err}"));
                    }
                }
                Effect::ShowVideo => {
                    let Some(url) = item.video_url().map(str::to_string) else {
                        continue;
                    };
                    // A new widget always destroys the previous instance
                    // first; its in-flight reports become stale.
                    self.destroy_video();
                    self.video_generation += 1;
                    match VideoWidget::launch(
                        &url,
                        self.video_generation,
                        self.events_tx.clone(),
                    ) {
                        Ok(widget) => self.video = Some(widget),
                        Err(err) => {
                            warnings.push(format!("video player failed to start: {err}"));
                            let _ = self.events_tx.send(MediaEvent::VideoFailed {
                                generation: self.video_generation,
                                detail: err.to_string(),
                            });
                        }
                    }
                }
                Effect::HideVideo => self.destroy_video(),
                Effect::ScheduleAutoStart(delay) => {
                    *auto_start_deadline = Some(Instant::now() + *delay);
                }
                Effect::CancelAutoStart => {
                    *auto_start_deadline = None;
                }
            }
        }
        warnings
    }

    pub(crate) fn shutdown(&mut self) {
        self.destroy_video();
        self.audio = None;
    }

    fn ensure_audio(&mut self) -> Result<&mut AudioDeck> {
        if self.audio.is_none() {
            self.audio = Some(AudioDeck::spawn(self.events_tx.clone())?);
        }
        self.audio.as_mut().context("audio deck unavailable")
    }

    fn load_audio(&mut self, url: &str) -> Result<()> {
        self.ensure_audio()?.load(url)
    }

    fn play_audio(&mut self) -> Result<()> {
        self.ensure_audio()?.play()
    }

    fn destroy_video(&mut self) {
        if let Some(mut widget) = self.video.take() {
            widget.destroy();
            self.video_generation += 1;
        }
    }

    /// Command-level audio failures feed back through the same channel as
    /// asynchronous ones so the coordinator sees a single failure path.
    fn report_audio_failure(&mut self, warnings: &mut Vec<String>, detail: &str) {
        warnings.push(format!("audio playback failed: {detail}"));
        let _ = self
            .events_tx
            .send(MediaEvent::AudioFailed(detail.to_string()));
    }
}

impl Drop for PlayerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

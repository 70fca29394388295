use std::time::Duration;

/// Delay between the video finishing and the narration auto-starting, so the
/// widget's teardown never races the audio start.
pub(crate) const AUTO_START_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Idle,
    VideoPlaying,
    AudioPlaying,
    /// Video finished; the narration auto-start is pending its delay.
    VideoToAudio,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PlaybackState {
    pub(crate) phase: Phase,
    pub(crate) audio_playing: bool,
    pub(crate) audio_position: Duration,
    pub(crate) audio_duration: Duration,
    pub(crate) audio_loaded: bool,
    pub(crate) video_visible: bool,
    pub(crate) video_ended: bool,
    pub(crate) audio_auto_started: bool,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            audio_playing: false,
            audio_position: Duration::ZERO,
            audio_duration: Duration::ZERO,
            audio_loaded: false,
            video_visible: false,
            video_ended: false,
            audio_auto_started: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PlaybackEvent {
    /// The user activated a video-capable cover.
    CoverActivated,
    /// The user toggled the narration transport.
    PlayToggled,
    /// The user asked to jump to a fraction of the track (0.0..=1.0).
    SeekRequested(f64),
    VideoStarted,
    VideoEnded,
    VideoFailed,
    /// The auto-start delay elapsed.
    AutoStartDue,
    AudioLoaded(Duration),
    AudioProgress(Duration),
    AudioStarted,
    AudioPaused,
    AudioFinished,
    AudioFailed,
    /// The displayed item changed or the detail view is closing.
    Reset,
}

/// Side effects the caller must run, in order. The coordinator itself never
/// touches a backend; keeping it pure keeps every transition testable.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Effect {
    LoadAudio,
    PlayAudio,
    PauseAudio,
    /// Pause and rewind to zero. The full reset is unconditional so
    /// out-of-order widget callbacks cannot leave a half-stopped track.
    StopAudio,
    SeekAudio(Duration),
    ShowVideo,
    HideVideo,
    ScheduleAutoStart(Duration),
    CancelAutoStart,
}

#[derive(Debug)]
pub(crate) struct PlaybackCoordinator {
    state: PlaybackState,
    has_audio: bool,
    has_video: bool,
}

impl PlaybackCoordinator {
    pub(crate) fn new(has_audio: bool, has_video: bool) -> Self {
        Self {
            state: PlaybackState::default(),
            has_audio,
            has_video,
        }
    }

    pub(crate) fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub(crate) fn handle(&mut self, event: PlaybackEvent) -> Vec<Effect> {
        let mut effects = Vec::new();
        match event {
            PlaybackEvent::CoverActivated => {
                if !self.has_video {
                    return effects;
                }
                self.reset_audio_side(&mut effects);
                effects.push(Effect::CancelAutoStart);
                self.state.video_visible = true;
                self.state.video_ended = false;
                self.state.phase = Phase::VideoPlaying;
                effects.push(Effect::ShowVideo);
            }
            PlaybackEvent::VideoStarted => {
                // The widget's own start report is a second forcing function
                // for the same reset; it may arrive more than once.
                self.reset_audio_side(&mut effects);
                effects.push(Effect::CancelAutoStart);
                self.state.video_visible = true;
                self.state.phase = Phase::VideoPlaying;
            }
            PlaybackEvent::VideoEnded => {
                self.state.video_visible = false;
                self.state.video_ended = true;
                effects.push(Effect::HideVideo);
                if self.has_audio {
                    self.state.phase = Phase::VideoToAudio;
                    effects.push(Effect::ScheduleAutoStart(AUTO_START_DELAY));
                } else {
                    self.state.phase = Phase::Idle;
                }
            }
            PlaybackEvent::VideoFailed => {
                self.state.video_visible = false;
                self.state.phase = Phase::Idle;
                effects.push(Effect::HideVideo);
            }
            PlaybackEvent::AutoStartDue => {
                if self.state.phase != Phase::VideoToAudio {
                    return effects;
                }
                self.state.audio_auto_started = true;
                effects.push(Effect::LoadAudio);
                effects.push(Effect::PlayAudio);
            }
            PlaybackEvent::PlayToggled => {
                if !self.has_audio {
                    return effects;
                }
                if self.state.audio_playing {
                    self.state.audio_playing = false;
                    self.state.phase = Phase::Idle;
                    effects.push(Effect::PauseAudio);
                } else {
                    if self.state.video_visible {
                        self.state.video_visible = false;
                        effects.push(Effect::HideVideo);
                    }
                    // Idle until the element confirms the asynchronous play;
                    // this also supersedes any pending auto-start.
                    self.state.phase = Phase::Idle;
                    effects.push(Effect::CancelAutoStart);
                    if !self.state.audio_loaded {
                        effects.push(Effect::LoadAudio);
                    }
                    effects.push(Effect::PlayAudio);
                }
            }
            PlaybackEvent::SeekRequested(fraction) => {
                if !self.state.audio_loaded {
                    return effects;
                }
                let fraction = fraction.clamp(0.0, 1.0);
                let target = self.state.audio_duration.mul_f64(fraction);
                self.state.audio_position = target;
                effects.push(Effect::SeekAudio(target));
            }
            PlaybackEvent::AudioLoaded(duration) => {
                self.state.audio_loaded = true;
                self.state.audio_duration = duration;
            }
            PlaybackEvent::AudioProgress(position) => {
                if self.state.audio_playing {
                    self.state.audio_position = position;
                }
            }
            PlaybackEvent::AudioStarted => {
                if self.state.video_visible {
                    self.state.video_visible = false;
                    effects.push(Effect::HideVideo);
                }
                self.state.audio_playing = true;
                self.state.phase = Phase::AudioPlaying;
            }
            PlaybackEvent::AudioPaused => {
                self.state.audio_playing = false;
                if self.state.phase == Phase::AudioPlaying {
                    self.state.phase = Phase::Idle;
                }
            }
            PlaybackEvent::AudioFinished => {
                self.state.audio_playing = false;
                self.state.audio_auto_started = false;
                if self.state.phase == Phase::AudioPlaying {
                    self.state.phase = Phase::Idle;
                }
            }
            PlaybackEvent::AudioFailed => {
                let was_loaded = self.state.audio_loaded;
                self.state.audio_playing = false;
                self.state.audio_loaded = false;
                self.state.audio_auto_started = false;
                self.state.phase = Phase::Idle;
                if was_loaded {
                    // Reload the element once so a later manual play can
                    // succeed; a failed fresh load is not retried.
                    effects.push(Effect::LoadAudio);
                }
            }
            PlaybackEvent::Reset => {
                self.state = PlaybackState::default();
                effects.push(Effect::StopAudio);
                effects.push(Effect::HideVideo);
                effects.push(Effect::CancelAutoStart);
            }
        }
        effects
    }

    fn reset_audio_side(&mut self, effects: &mut Vec<Effect>) {
        effects.push(Effect::StopAudio);
        self.state.audio_playing = false;
        self.state.audio_position = Duration::ZERO;
        self.state.audio_auto_started = false;
    }
}

use std::sync::mpsc::Sender;
use std::time::Duration;

use anyhow::Result;

#[cfg(unix)]
use std::io::{BufRead, BufReader, Write};
#[cfg(unix)]
use std::os::unix::net::UnixStream;
#[cfg(unix)]
use std::path::{Path, PathBuf};
#[cfg(unix)]
use std::process::{Child, Command as ProcessCommand, Stdio};
#[cfg(unix)]
use std::thread;
#[cfg(unix)]
use std::time::Instant;

#[cfg(unix)]
use anyhow::{Context, anyhow};
#[cfg(unix)]
use serde_json::{Value, json};

#[cfg(unix)]
use super::super::process::{spawn_detached, terminate_group};
use super::MediaEvent;
#[cfg(unix)]
use super::resolve_player_bin;

/// The audio element, backed by a player process kept idle and driven over
/// its JSON IPC socket: load/play/pause/seek in, loaded/progress/ended/error
/// events out.
#[cfg(unix)]
pub(super) struct AudioDeck {
    child: Child,
    conn: UnixStream,
    socket_path: PathBuf,
}

#[cfg(unix)]
impl AudioDeck {
    pub(super) fn spawn(events: Sender<MediaEvent>) -> Result<Self> {
        let player_bin = resolve_player_bin()?;
        let socket_path = ipc_socket_path();
        let _ = std::fs::remove_file(&socket_path);

        let mut cmd = ProcessCommand::new(&player_bin);
        cmd.arg("--idle=yes")
            .arg("--pause")
            .arg("--no-video")
            .arg("--no-terminal")
            .arg(format!("--input-ipc-server={}", socket_path.display()))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        let mut child = spawn_detached(cmd)
            .with_context(|| format!("failed to launch {}", player_bin.display()))?;

        let conn = match wait_for_socket(&socket_path, Duration::from_secs(3)) {
            Ok(conn) => conn,
            Err(err) => {
                terminate_group(&mut child);
                let _ = child.wait();
                return Err(err);
            }
        };

        let mut deck = Self {
            child,
            conn,
            socket_path,
        };
        deck.send(json!({ "command": ["observe_property", 1, "time-pos"] }))?;
        deck.send(json!({ "command": ["observe_property", 2, "duration"] }))?;
        deck.send(json!({ "command": ["observe_property", 3, "pause"] }))?;

        let reader = BufReader::new(
            deck.conn
                .try_clone()
                .context("failed to clone player IPC connection")?,
        );
        thread::spawn(move || run_event_pump(reader, events));

        Ok(deck)
    }

    fn send(&mut self, payload: Value) -> Result<()> {
        let mut line = payload.to_string();
        line.push('\n');
        self.conn
            .write_all(line.as_bytes())
            .context("failed to write to player IPC socket")
    }

    pub(super) fn load(&mut self, url: &str) -> Result<()> {
        // Pause before replacing the track so nothing plays until asked.
        self.send(json!({ "command": ["set_property", "pause", true] }))?;
        self.send(json!({ "command": ["loadfile", url, "replace"] }))
    }

    pub(super) fn play(&mut self) -> Result<()> {
        self.send(json!({ "command": ["set_property", "pause", false] }))
    }

    pub(super) fn pause(&mut self) -> Result<()> {
        self.send(json!({ "command": ["set_property", "pause", true] }))
    }

    /// Full reset: paused at position zero, track kept loaded.
    pub(super) fn stop(&mut self) -> Result<()> {
        self.send(json!({ "command": ["set_property", "pause", true] }))?;
        self.send(json!({ "command": ["seek", 0, "absolute"] }))
    }

    pub(super) fn seek(&mut self, position: Duration) -> Result<()> {
        self.send(json!({ "command": ["seek", position.as_secs_f64(), "absolute"] }))
    }
}

#[cfg(unix)]
impl Drop for AudioDeck {
    fn drop(&mut self) {
        let _ = self.send(json!({ "command": ["quit"] }));
        terminate_group(&mut self.child);
        let _ = self.child.wait();
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

#[cfg(unix)]
fn ipc_socket_path() -> PathBuf {
    std::env::temp_dir().join(format!("noticast-ipc-{}", std::process::id()))
}

#[cfg(unix)]
fn wait_for_socket(path: &Path, timeout: Duration) -> Result<UnixStream> {
    let deadline = Instant::now() + timeout;
    loop {
        match UnixStream::connect(path) {
            Ok(conn) => return Ok(conn),
            Err(err) => {
                if Instant::now() >= deadline {
                    return Err(anyhow!(
                        "player IPC socket never appeared at {}: {err}",
                        path.display()
                    ));
                }
                thread::sleep(Duration::from_millis(50));
            }
        }
    }
}

/// Translates the player's IPC event stream into `MediaEvent`s. Pause flips
/// are forwarded as-is: the unpause that precedes a slow load and the load
/// itself converge on the same final state.
#[cfg(unix)]
fn run_event_pump(reader: BufReader<UnixStream>, events: Sender<MediaEvent>) {
    let mut track_loaded = false;
    for line in reader.lines() {
        let Ok(line) = line else { break };
        let Ok(payload) = serde_json::from_str::<Value>(&line) else {
            continue;
        };
        let Some(event) = payload.get("event").and_then(Value::as_str) else {
            continue;
        };

        let forwarded = match event {
            "file-loaded" => {
                track_loaded = true;
                Ok(())
            }
            "end-file" => {
                let was_loaded = track_loaded;
                track_loaded = false;
                let reason = payload.get("reason").and_then(Value::as_str).unwrap_or("");
                if reason == "error" {
                    events.send(MediaEvent::AudioFailed(
                        "the player could not play the track".to_string(),
                    ))
                } else if was_loaded && reason == "eof" {
                    events.send(MediaEvent::AudioFinished)
                } else {
                    // A replaced or stopped track is not a finish.
                    Ok(())
                }
            }
            "property-change" => {
                let name = payload.get("name").and_then(Value::as_str).unwrap_or("");
                match name {
                    "time-pos" => match payload.get("data").and_then(Value::as_f64) {
                        Some(seconds) if seconds >= 0.0 => {
                            events.send(MediaEvent::AudioProgress(Duration::from_secs_f64(seconds)))
                        }
                        _ => Ok(()),
                    },
                    "duration" => match payload.get("data").and_then(Value::as_f64) {
                        Some(seconds) if seconds > 0.0 => {
                            events.send(MediaEvent::AudioLoaded(Duration::from_secs_f64(seconds)))
                        }
                        _ => Ok(()),
                    },
                    "pause" => match payload.get("data").and_then(Value::as_bool) {
                        Some(false) => events.send(MediaEvent::AudioStarted),
                        Some(true) => events.send(MediaEvent::AudioPaused),
                        None => Ok(()),
                    },
                    _ => Ok(()),
                }
            }
            _ => Ok(()),
        };

        if forwarded.is_err() {
            // Receiver gone; the event loop has shut down.
            break;
        }
    }
}

#[cfg(not(unix))]
pub(super) struct AudioDeck;

#[cfg(not(unix))]
impl AudioDeck {
    pub(super) fn spawn(_events: Sender<MediaEvent>) -> Result<Self> {
        anyhow::bail!("audio narration needs the player's IPC socket, which is unix-only")
    }

    pub(super) fn load(&mut self, _url: &str) -> Result<()> {
        Ok(())
    }

    pub(super) fn play(&mut self) -> Result<()> {
        Ok(())
    }

    pub(super) fn pause(&mut self) -> Result<()> {
        Ok(())
    }

    pub(super) fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    pub(super) fn seek(&mut self, _position: Duration) -> Result<()> {
        Ok(())
    }
}

use std::process::{Command as ProcessCommand, Stdio};
use std::sync::mpsc::Sender;
use std::thread;

use anyhow::{Context, Result};

use super::super::process::{spawn_detached, terminate_group_by_pid};
use super::{MediaEvent, resolve_player_bin};

/// One playing video: the player spawned on the video URL in its own window
/// and process group. A watcher thread reports start and end; `destroy`
/// tears the group down, after which the watcher's reports are stale (the
/// owner bumps the generation).
pub(super) struct VideoWidget {
    pid: u32,
}

impl VideoWidget {
    pub(super) fn launch(url: &str, generation: u64, events: Sender<MediaEvent>) -> Result<Self> {
        let player_bin = resolve_player_bin()?;
        let mut cmd = ProcessCommand::new(&player_bin);
        cmd.arg("--force-window=yes")
            .arg("--keep-open=no")
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        let mut child = spawn_detached(cmd)
            .with_context(|| format!("failed to launch {}", player_bin.display()))?;
        let pid = child.id();

        let _ = events.send(MediaEvent::VideoStarted { generation });
        thread::spawn(move || {
            match child.wait() {
                // A user quitting the player is indistinguishable from the
                // track running out; both count as the video ending.
                Ok(status) if status.success() => {
                    let _ = events.send(MediaEvent::VideoEnded { generation });
                }
                Ok(status) => {
                    let _ = events.send(MediaEvent::VideoFailed {
                        generation,
                        detail: format!("player exited with {status}"),
                    });
                }
                Err(err) => {
                    let _ = events.send(MediaEvent::VideoFailed {
                        generation,
                        detail: err.to_string(),
                    });
                }
            }
        });

        Ok(Self { pid })
    }

    pub(super) fn destroy(&mut self) {
        terminate_group_by_pid(self.pid);
    }
}

use std::process::{Child, Command as ProcessCommand};

use anyhow::{Context, Result};

#[cfg(unix)]
use std::os::unix::process::CommandExt;

/// Spawn `cmd` in its own process group so the whole tree (the player plus
/// any download helper it forks) can be torn down together.
#[cfg(unix)]
pub(crate) fn spawn_detached(mut cmd: ProcessCommand) -> Result<Child> {
    unsafe {
        cmd.pre_exec(|| {
            if libc::setpgid(0, 0) != 0 {
                return Err(std::io::Error::last_os_error());
            }
            Ok(())
        });
    }
    cmd.spawn().context("failed to spawn media player")
}

#[cfg(not(unix))]
pub(crate) fn spawn_detached(mut cmd: ProcessCommand) -> Result<Child> {
    cmd.spawn().context("failed to spawn media player")
}

#[cfg(unix)]
pub(crate) fn terminate_group(child: &mut Child) {
    let pgid = child.id() as libc::pid_t;
    let signaled = unsafe { libc::kill(-pgid, libc::SIGTERM) == 0 };
    if !signaled {
        let _ = child.kill();
    }
}

#[cfg(not(unix))]
pub(crate) fn terminate_group(child: &mut Child) {
    let _ = child.kill();
}

#[cfg(unix)]
pub(crate) fn terminate_group_by_pid(pid: u32) {
    let pgid = pid as libc::pid_t;
    unsafe {
        if libc::kill(-pgid, libc::SIGTERM) != 0 {
            libc::kill(pgid, libc::SIGTERM);
        }
    }
}

#[cfg(not(unix))]
pub(crate) fn terminate_group_by_pid(_pid: u32) {}

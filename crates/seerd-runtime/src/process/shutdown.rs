//! Forced termination of a supervised process tree.

use std::io;
use std::process::ExitStatus;

use tokio::process::Child;
use tracing::debug;

#[cfg(unix)]
use nix::errno::Errno;
#[cfg(unix)]
use nix::sys::signal::{Signal, killpg};
#[cfg(unix)]
use nix::unistd::Pid;

/// Kill a child and every descendant in its tree, then reap it.
///
/// # Strategy
/// - Unix: the child leads its own process group, so one `SIGKILL` to the
///   group takes the whole tree down. Falls back to killing the child alone
///   if the group signal is refused.
/// - Windows: `taskkill /T /F` on the child's PID, falling back to
///   `TerminateProcess` via `Child::start_kill`.
///
/// Waits for the OS to confirm the exit with no timeout of its own.
///
/// # Returns
/// - `Ok(ExitStatus)` once the process has been reaped
/// - `Err` if the kill or the wait failed
pub async fn terminate_tree(mut child: Child) -> io::Result<ExitStatus> {
    #[cfg(unix)]
    {
        terminate_unix(&mut child).await
    }

    #[cfg(not(unix))]
    {
        terminate_windows(&mut child).await
    }
}

#[cfg(unix)]
async fn terminate_unix(child: &mut Child) -> io::Result<ExitStatus> {
    // No PID means the child was already reaped
    let Some(pid) = child.id() else {
        return child.wait().await;
    };
    let pgid = Pid::from_raw(i32::try_from(pid).map_err(io::Error::other)?);

    match killpg(pgid, Signal::SIGKILL) {
        // ESRCH: the group is already gone, only reaping is left
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => {
            debug!(pid = %pid, error = %e, "killpg failed, killing child directly");
            child.start_kill()?;
        }
    }

    child.wait().await
}

/// Kill whatever is left of a process group whose leader is already reaped.
///
/// Descendants of a child that exited on its own keep its group id and its
/// stdio pipes. A group that no longer exists counts as success.
///
/// On Windows the tree cannot be found once its root is gone; this is a
/// no-op there.
#[cfg(unix)]
pub fn kill_process_group(pgid: u32) -> io::Result<()> {
    let pgid = Pid::from_raw(i32::try_from(pgid).map_err(io::Error::other)?);
    match killpg(pgid, Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(e) => Err(io::Error::from(e)),
    }
}

#[cfg(not(unix))]
pub fn kill_process_group(_pgid: u32) -> io::Result<()> {
    Ok(())
}

#[cfg(not(unix))]
async fn terminate_windows(child: &mut Child) -> io::Result<ExitStatus> {
    let Some(pid) = child.id() else {
        return child.wait().await;
    };

    let status = tokio::process::Command::new("taskkill")
        .args(["/PID", &pid.to_string(), "/T", "/F"])
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .await;

    if !matches!(status, Ok(s) if s.success()) {
        debug!(pid = %pid, "taskkill failed, terminating child directly");
        child.start_kill()?;
    }

    child.wait().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::process::Command;
    use tokio::time::sleep;

    #[tokio::test]
    #[cfg(unix)]
    async fn terminate_kills_process_group() {
        // The shell spawns a grandchild; both live in the shell's group
        let child = Command::new("sh")
            .args(["-c", "sleep 30 & wait"])
            .process_group(0)
            .spawn()
            .expect("failed to spawn sh");

        let status = terminate_tree(child).await.expect("terminate failed");
        assert!(!status.success());
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn kill_group_reaches_orphaned_descendants() {
        // The shell exits at once, leaving `sleep` behind in its group
        let mut child = Command::new("sh")
            .args(["-c", "sleep 30 & echo $!"])
            .stdout(std::process::Stdio::piped())
            .process_group(0)
            .spawn()
            .expect("failed to spawn sh");
        let pgid = child.id().expect("no pid");
        let mut stdout = child.stdout.take().expect("no stdout");
        child.wait().await.expect("wait failed");

        kill_process_group(pgid).expect("killpg failed");

        // The pipe closes once the last group member holding it is gone
        let mut rest = String::new();
        let read = tokio::time::timeout(
            Duration::from_secs(5),
            tokio::io::AsyncReadExt::read_to_string(&mut stdout, &mut rest),
        )
        .await;
        assert!(read.is_ok(), "descendant still holds the pipe");

        // A second kill finds nothing and still succeeds
        assert!(kill_process_group(pgid).is_ok());
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn terminate_handles_already_exited() {
        let child = Command::new("true")
            .process_group(0)
            .spawn()
            .expect("failed to spawn true");

        // Give it time to exit
        sleep(Duration::from_millis(100)).await;

        let result = terminate_tree(child).await;
        assert!(result.is_ok());
    }
}

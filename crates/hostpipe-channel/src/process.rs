use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// How long a host gets to exit on its own after its pipes close.
pub const DEFAULT_TERMINATION_GRACE: Duration = Duration::from_secs(2);

/// Handle to a launched native host process.
///
/// Dropping this does not kill the child. Whoever owns it is expected to call
/// [`HostProcess::ensure_terminated`] (or [`HostProcess::terminate_in_background`])
/// once the channel is torn down, so no zombies are left behind.
#[derive(Debug)]
pub struct HostProcess {
    child: Child,
}

impl HostProcess {
    pub fn new(child: Child) -> Self {
        Self { child }
    }

    /// OS process id, or `None` once the child has been reaped.
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Exit status if the child has already exited. Never blocks.
    pub fn try_exited(&mut self) -> io::Result<Option<ExitStatus>> {
        self.child.try_wait()
    }

    /// Wait for the child to exit on its own.
    pub async fn wait(&mut self) -> io::Result<ExitStatus> {
        self.child.wait().await
    }

    /// Make sure the process is gone and reaped.
    ///
    /// The host first gets `grace` to exit by itself (it normally does once it
    /// sees EOF on stdin). After that it is sent `SIGTERM` and given another
    /// `grace`, then killed outright. On non-Unix platforms the second step is
    /// skipped.
    pub async fn ensure_terminated(mut self, grace: Duration) -> io::Result<ExitStatus> {
        if let Some(status) = self.try_exited()? {
            debug!(?status, "native host already exited");
            return Ok(status);
        }

        if let Ok(status) = tokio::time::timeout(grace, self.wait()).await {
            let status = status?;
            debug!(?status, "native host exited within grace period");
            return Ok(status);
        }

        #[cfg(unix)]
        {
            self.signal_terminate();
            if let Ok(status) = tokio::time::timeout(grace, self.wait()).await {
                let status = status?;
                debug!(?status, "native host exited after SIGTERM");
                return Ok(status);
            }
        }

        warn!(pid = ?self.child.id(), "native host did not exit; killing");
        self.child.kill().await?;
        self.wait().await
    }

    /// Run [`HostProcess::ensure_terminated`] on its own task.
    ///
    /// Termination can take up to twice the grace period, which must not stall
    /// whatever task is tearing the channel down.
    pub fn terminate_in_background(self, grace: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            match self.ensure_terminated(grace).await {
                Ok(status) => debug!(?status, "native host reaped"),
                Err(err) => warn!(error = %err, "failed to reap native host"),
            }
        })
    }

    #[cfg(unix)]
    fn signal_terminate(&self) {
        let Some(pid) = self.child.id() else {
            return;
        };
        let Ok(pid) = libc::pid_t::try_from(pid) else {
            return;
        };

        // SAFETY: `kill` has no memory-safety preconditions. `pid` belongs to a
        // child we have not reaped yet, so it cannot have been recycled.
        let rc = unsafe { libc::kill(pid, libc::SIGTERM) };
        if rc != 0 {
            debug!(pid, error = %io::Error::last_os_error(), "SIGTERM failed");
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::process::Stdio;
    use std::time::Instant;

    use tokio::process::Command;

    use super::*;

    fn spawn_sh(script: &str) -> HostProcess {
        let child = Command::new("sh")
            .arg("-c")
            .arg(script)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .spawn()
            .expect("sh should spawn");
        HostProcess::new(child)
    }

    #[tokio::test]
    async fn already_exited_process_is_reaped() {
        let mut process = spawn_sh("exit 3");
        let status = process.wait().await.unwrap();
        assert_eq!(status.code(), Some(3));

        let status = process
            .ensure_terminated(Duration::from_millis(10))
            .await
            .unwrap();
        assert_eq!(status.code(), Some(3));
    }

    #[tokio::test]
    async fn try_exited_reports_without_blocking() {
        let mut process = spawn_sh("sleep 30");
        assert!(process.try_exited().unwrap().is_none());

        let status = process
            .ensure_terminated(Duration::from_millis(10))
            .await
            .unwrap();
        assert!(!status.success());
    }

    #[tokio::test]
    async fn lingering_process_is_terminated() {
        let process = spawn_sh("sleep 30");
        assert!(process.id().is_some());

        let start = Instant::now();
        let status = process
            .ensure_terminated(Duration::from_millis(50))
            .await
            .unwrap();

        assert!(!status.success());
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn sigterm_ignoring_process_is_killed() {
        let process = spawn_sh("trap '' TERM; sleep 30");

        let status = process
            .ensure_terminated(Duration::from_millis(50))
            .await
            .unwrap();

        use std::os::unix::process::ExitStatusExt;
        assert_eq!(status.signal(), Some(libc::SIGKILL));
    }

    #[tokio::test]
    async fn background_termination_completes() {
        let process = spawn_sh("sleep 30");
        process
            .terminate_in_background(Duration::from_millis(20))
            .await
            .unwrap();
    }
}

//! Outbound notification to the DNS authority process.
//!
//! Record mutation requests are signaled by running a configured notify
//! program (`<program> notify dns.local/write fqdn='…' rdata='…'`) with a
//! bounded wait. Success and failure are judged by exit status alone; the
//! program's stdout is logged for operators but never interpreted. The
//! three failure kinds are kept distinguishable because their retry
//! policies differ: a timeout is safe to retry (resubmission is idempotent),
//! a missing program is an operator error that retrying won't fix.

use crate::relay::{REMOVE_NOTICE, WRITE_NOTICE};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// NotifyError enumerates the distinguishable delivery failures.
#[derive(thiserror::Error, Debug)]
pub enum NotifyError {
    /// The notify program did not finish within the configured bound. The
    /// process is killed and no partial state is committed.
    #[error("notify program timed out after {0:?}")]
    TimedOut(Duration),

    /// The notify program ran and reported failure through its exit status.
    #[error("notify program exited with status {code:?}: {stderr}")]
    Unsuccessful { code: Option<i32>, stderr: String },

    /// The configured notify program does not exist.
    #[error("notify program not found: \"{0}\"")]
    ProgramNotFound(String),

    /// Any other I/O failure while running the program.
    #[error("failed to run notify program")]
    IO(#[source] std::io::Error),
}

/// Runs the notify program to signal the DNS authority.
#[derive(Debug, Clone)]
pub struct Notifier {
    program: String,
    timeout: Duration,
}

impl Notifier {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Notifier {
            program: program.into(),
            timeout,
        }
    }

    /// Request creation of a challenge record for `fqdn`.
    pub async fn write(&self, fqdn: &str, rdata: &str) -> Result<(), NotifyError> {
        self.notify(WRITE_NOTICE, &[format!("fqdn='{fqdn}'"), format!("rdata='{rdata}'")])
            .await
    }

    /// Request removal of the records for `fqdn`.
    pub async fn remove(&self, fqdn: &str) -> Result<(), NotifyError> {
        self.notify(REMOVE_NOTICE, &[format!("fqdn='{fqdn}'")]).await
    }

    async fn notify(&self, key: &str, fields: &[String]) -> Result<(), NotifyError> {
        let child = Command::new(&self.program)
            .arg("notify")
            .arg(key)
            .args(fields)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| match err.kind() {
                std::io::ErrorKind::NotFound => NotifyError::ProgramNotFound(self.program.clone()),
                _ => NotifyError::IO(err),
            })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| NotifyError::TimedOut(self.timeout))?
            .map_err(NotifyError::IO)?;

        if !output.status.success() {
            return Err(NotifyError::Unsuccessful {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        tracing::debug!(
            "notify {key} succeeded: {}",
            String::from_utf8_lossy(&output.stdout).trim()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;

    fn script(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("notify.sh");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "#!/bin/sh\n{body}").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[tokio::test]
    async fn success_is_judged_by_exit_status() {
        let dir = tempfile::tempdir().unwrap();
        // Output containing "error" must not be treated as a failure.
        let path = script(&dir, "echo 'no errors encountered'; exit 0");
        let notifier = Notifier::new(path.to_str().unwrap(), Duration::from_secs(10));
        notifier.write("_acme-challenge.example.com", "tok").await.unwrap();
    }

    #[tokio::test]
    async fn nonzero_exit_is_unsuccessful() {
        let dir = tempfile::tempdir().unwrap();
        let path = script(&dir, "echo 'boom' >&2; exit 3");
        let notifier = Notifier::new(path.to_str().unwrap(), Duration::from_secs(10));
        let err = notifier.remove("foo.example.com").await.unwrap_err();
        match err {
            NotifyError::Unsuccessful { code, stderr } => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "boom");
            }
            other => panic!("expected Unsuccessful, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_program_is_its_own_error() {
        let notifier = Notifier::new("/nonexistent/notify-program", Duration::from_secs(10));
        assert!(matches!(
            notifier.write("foo.example.com", "tok").await,
            Err(NotifyError::ProgramNotFound(_))
        ));
    }

    #[tokio::test]
    async fn slow_program_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = script(&dir, "sleep 5");
        let notifier = Notifier::new(path.to_str().unwrap(), Duration::from_millis(100));
        assert!(matches!(
            notifier.write("foo.example.com", "tok").await,
            Err(NotifyError::TimedOut(_))
        ));
    }
}

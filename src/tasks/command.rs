//! External long-lived command as a supervised task.
//!
//! [`CommandTask`] runs a command line resolved from a template (placeholders
//! like `{remoteStreamUrl}` substituted per device) with stdout/stderr
//! redirected to a fresh log file per run. The command is expected to run
//! until cancelled: any self-exit, explicitly including status 0, is a
//! failure so the perseverance loop restarts it with escalating cooldowns.
//!
//! Inability to create the log file or start the process is a fatal setup
//! failure: the environment is broken and retrying will not help.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{error, info, warn};

use crate::error::TaskError;
use crate::retry::Attempt;
use crate::tasks::task::Task;

/// Supervised external command with per-run log files.
///
/// ## Example
/// ```rust,no_run
/// use camvisor::CommandTask;
///
/// let task = CommandTask::new(
///     "stream-processor",
///     "ffmpeg -i {remoteStreamUrl} -c copy -f flv {localStreamUrl}",
///     vec![
///         ("remoteStreamUrl".into(), "rtmps://media.example.com/app/key".into()),
///         ("localStreamUrl".into(), "rtmp://127.0.0.1/local/cam-1".into()),
///     ],
///     "/var/log/camvisor".into(),
/// );
/// # let _ = task;
/// ```
pub struct CommandTask {
    name: String,
    template: String,
    vars: Vec<(String, String)>,
    log_dir: PathBuf,
    work_dir: Option<PathBuf>,
}

impl CommandTask {
    /// Creates a new command task.
    ///
    /// `vars` maps placeholder names (without braces) to their values; every
    /// `{name}` occurrence in `template` is replaced before splitting the
    /// command line on whitespace.
    pub fn new(
        name: impl Into<String>,
        template: impl Into<String>,
        vars: Vec<(String, String)>,
        log_dir: PathBuf,
    ) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
            vars,
            log_dir,
            work_dir: None,
        }
    }

    /// Sets the working directory for the spawned command.
    pub fn with_work_dir(mut self, dir: PathBuf) -> Self {
        self.work_dir = Some(dir);
        self
    }

    /// Resolves the command template into argv tokens.
    pub fn resolve(&self) -> Vec<String> {
        let mut resolved = self.template.clone();
        for (key, value) in &self.vars {
            resolved = resolved.replace(&format!("{{{key}}}"), value);
        }
        resolved.split_whitespace().map(str::to_string).collect()
    }

    fn log_path(&self) -> PathBuf {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.log_dir.join(format!("{}-{stamp}.log", self.name))
    }
}

#[async_trait]
impl Task for CommandTask {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, attempt: Attempt) -> Result<(), TaskError> {
        let tokens = self.resolve();
        if tokens.is_empty() {
            return Err(TaskError::fatal("empty command template"));
        }

        let log_path = self.log_path();
        let log_file = std::fs::File::create(&log_path).map_err(|e| {
            TaskError::fatal(format!("unable to create log file {}: {e}", log_path.display()))
        })?;
        let log_file_err = log_file
            .try_clone()
            .map_err(|e| TaskError::fatal(format!("unable to clone log handle: {e}")))?;

        info!(
            processor = %self.name,
            cmd = %tokens.join(" "),
            logfile = %log_path.display(),
            "starting stream processor"
        );

        let mut cmd = Command::new(&tokens[0]);
        cmd.args(&tokens[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::from(log_file))
            .stderr(Stdio::from(log_file_err));
        if let Some(dir) = &self.work_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|e| {
            TaskError::fatal(format!("unable to start stream processor: {e}"))
        })?;

        tokio::select! {
            status = child.wait() => match status {
                Ok(status) if status.code() == Some(0) => {
                    warn!(processor = %self.name, "stream processor exited with status 0");
                    Err(TaskError::fail("stream processor exited with status 0"))
                }
                Ok(status) => {
                    error!(processor = %self.name, %status, "stream processor exited");
                    Err(TaskError::fail(format!("stream processor exited: {status}")))
                }
                Err(e) => Err(TaskError::fail(format!("wait failed: {e}"))),
            },
            _ = attempt.cancelled() => {
                info!(processor = %self.name, "terminating stream processor");
                if let Err(e) = child.start_kill() {
                    error!(processor = %self.name, error = %e, "unable to kill process");
                }
                let _ = child.wait().await;
                Err(TaskError::Canceled)
            }
        }
    }
}

// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Measurement program invocation and retry policy.
//!
//! A [`MeasurementRunner`] executes the measurement program once for a given
//! size and reports what it printed and how it exited. It never decides
//! whether a run was good enough; [`run_until_success`] does that, driven by
//! a [`RetryPolicy`].

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::RunnerError;
use crate::types::Size;

/// Maximum number of stderr bytes included in retry warnings.
const STDERR_EXCERPT_LEN: usize = 256;

/// Captured result of one measurement run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code, or `None` if the program was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl RunOutput {
    /// A run succeeded only if the program exited with status 0.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Something that can execute one measurement for a given size.
pub trait MeasurementRunner {
    /// Run the measurement once and block until it finishes.
    fn run(&mut self, size: Size) -> Result<RunOutput, RunnerError>;
}

impl<R: MeasurementRunner + ?Sized> MeasurementRunner for Box<R> {
    fn run(&mut self, size: Size) -> Result<RunOutput, RunnerError> {
        (**self).run(size)
    }
}

/// Runs an external executable as `<executable> <size>`.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    executable: PathBuf,
    working_dir: Option<PathBuf>,
}

impl ProcessRunner {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            working_dir: None,
        }
    }

    /// Run the executable from the given directory instead of the current one.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }
}

impl MeasurementRunner for ProcessRunner {
    fn run(&mut self, size: Size) -> Result<RunOutput, RunnerError> {
        let mut command = Command::new(&self.executable);
        command
            .arg(size.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        let child = command.spawn().map_err(|source| RunnerError::Launch {
            executable: self.executable.clone(),
            source,
        })?;

        tracing::debug!(
            executable = %self.executable.display(),
            pid = child.id(),
            size = %size,
            "Spawned measurement process"
        );

        // Dropping the piped stdin inside wait_with_output closes it, so a
        // program that reads stdin sees EOF instead of blocking.
        let output = child
            .wait_with_output()
            .map_err(|source| RunnerError::Io {
                executable: self.executable.clone(),
                source,
            })?;

        Ok(RunOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        })
    }
}

/// Delay between failed attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Backoff {
    /// Retry immediately.
    #[default]
    None,
    /// Wait the same amount after every failure.
    Fixed { delay_ms: u64 },
    /// Double the wait after every failure, capped at `max_ms`.
    Exponential { initial_ms: u64, max_ms: u64 },
}

impl Backoff {
    /// Delay to apply after the given failed attempt (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match *self {
            Backoff::None => Duration::ZERO,
            Backoff::Fixed { delay_ms } => Duration::from_millis(delay_ms),
            Backoff::Exponential { initial_ms, max_ms } => {
                let shift = attempt.saturating_sub(1).min(63);
                let delay = initial_ms.saturating_mul(1u64 << shift).min(max_ms);
                Duration::from_millis(delay)
            }
        }
    }
}

/// How failed measurement runs are retried.
///
/// The default retries forever with no delay: a measurement program that
/// never succeeds for some size stalls the sweep indefinitely. Set
/// `max_attempts` to turn that into a [`RunnerError::RetriesExhausted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetryPolicy {
    /// Total attempts allowed per sweep point, `None` for no limit.
    pub max_attempts: Option<u32>,
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// Retry until success, immediately, without limit.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Give up after `max_attempts` runs.
    pub fn bounded(max_attempts: u32) -> Self {
        Self {
            max_attempts: Some(max_attempts),
            backoff: Backoff::None,
        }
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }
}

/// Run the measurement for `size` until it exits successfully.
///
/// Output of failed runs is discarded. Launch failures are returned
/// immediately; only nonzero exits are retried.
pub fn run_until_success<R>(
    runner: &mut R,
    size: Size,
    policy: &RetryPolicy,
) -> Result<RunOutput, RunnerError>
where
    R: MeasurementRunner + ?Sized,
{
    let mut attempt: u32 = 0;
    loop {
        attempt = attempt.saturating_add(1);
        let output = runner.run(size)?;
        if output.success() {
            if attempt > 1 {
                tracing::info!(size = %size, attempts = attempt, "Measurement succeeded after retry");
            }
            return Ok(output);
        }

        tracing::warn!(
            size = %size,
            attempt = attempt,
            exit_code = ?output.exit_code,
            stderr = %stderr_excerpt(&output.stderr),
            "Measurement run failed"
        );

        if policy.max_attempts.is_some_and(|max| attempt >= max) {
            return Err(RunnerError::RetriesExhausted {
                size,
                attempts: attempt,
                last_exit_code: output.exit_code,
            });
        }

        let delay = policy.backoff.delay_after(attempt);
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }
}

fn stderr_excerpt(stderr: &str) -> &str {
    let trimmed = stderr.trim();
    if trimmed.len() <= STDERR_EXCERPT_LEN {
        return trimmed;
    }
    let mut end = STDERR_EXCERPT_LEN;
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    &trimmed[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Replays a fixed sequence of exit codes.
    struct ScriptedRunner {
        exits: VecDeque<i32>,
        calls: u32,
    }

    impl ScriptedRunner {
        fn new(exits: &[i32]) -> Self {
            Self {
                exits: exits.iter().copied().collect(),
                calls: 0,
            }
        }
    }

    impl MeasurementRunner for ScriptedRunner {
        fn run(&mut self, _size: Size) -> Result<RunOutput, RunnerError> {
            self.calls += 1;
            let code = self.exits.pop_front().unwrap_or(0);
            Ok(RunOutput {
                stdout: format!("attempt {}", self.calls),
                stderr: String::new(),
                exit_code: Some(code),
            })
        }
    }

    fn size() -> Size {
        Size::new(32).unwrap()
    }

    #[test]
    fn test_retries_until_success() {
        let mut runner = ScriptedRunner::new(&[1, 1, 0]);
        let output = run_until_success(&mut runner, size(), &RetryPolicy::unbounded()).unwrap();

        assert_eq!(runner.calls, 3);
        assert_eq!(output.stdout, "attempt 3");
        assert!(output.success());
    }

    #[test]
    fn test_first_success_is_not_retried() {
        let mut runner = ScriptedRunner::new(&[0]);
        run_until_success(&mut runner, size(), &RetryPolicy::unbounded()).unwrap();
        assert_eq!(runner.calls, 1);
    }

    #[test]
    fn test_bounded_policy_gives_up() {
        let mut runner = ScriptedRunner::new(&[2, 2, 2, 0]);
        let err = run_until_success(&mut runner, size(), &RetryPolicy::bounded(3)).unwrap_err();

        assert_eq!(runner.calls, 3);
        match err {
            RunnerError::RetriesExhausted {
                attempts,
                last_exit_code,
                ..
            } => {
                assert_eq!(attempts, 3);
                assert_eq!(last_exit_code, Some(2));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_signal_termination_is_failure() {
        let output = RunOutput {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: None,
        };
        assert!(!output.success());
    }

    #[test]
    fn test_backoff_delays() {
        assert_eq!(Backoff::None.delay_after(5), Duration::ZERO);
        assert_eq!(
            Backoff::Fixed { delay_ms: 20 }.delay_after(3),
            Duration::from_millis(20)
        );

        let exp = Backoff::Exponential {
            initial_ms: 10,
            max_ms: 50,
        };
        assert_eq!(exp.delay_after(1), Duration::from_millis(10));
        assert_eq!(exp.delay_after(2), Duration::from_millis(20));
        assert_eq!(exp.delay_after(3), Duration::from_millis(40));
        assert_eq!(exp.delay_after(4), Duration::from_millis(50));
        assert_eq!(exp.delay_after(200), Duration::from_millis(50));
    }

    #[test]
    fn test_missing_executable_is_launch_error() {
        let mut runner = ProcessRunner::new("/nonexistent/sweepbench-measure");
        let err = runner.run(size()).unwrap_err();
        assert!(matches!(err, RunnerError::Launch { .. }));
    }

    #[test]
    fn test_stderr_excerpt_truncates() {
        let long = "é".repeat(400);
        let excerpt = stderr_excerpt(&long);
        assert!(excerpt.len() <= STDERR_EXCERPT_LEN);
        assert!(excerpt.chars().all(|c| c == 'é'));
    }
}

//! Subprocess execution with timeouts and captured output.
//!
//! Every external program decruft touches (git, removal commands,
//! validation commands, linked tools) goes through [`CommandRunner`], so
//! tests can substitute a scripted runner.

use std::borrow::Cow;
use std::io::{self, Read};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Result of one subprocess invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandOutput {
    /// `None` when the process was killed or ended by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
    pub duration: Duration,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }

    /// Human-readable failure description.
    pub fn failure_message(&self) -> String {
        if self.timed_out {
            return format!("timed out after {:.1}s", self.duration.as_secs_f64());
        }
        let stderr = self.stderr.trim();
        let detail = if stderr.is_empty() {
            self.stdout.trim()
        } else {
            stderr
        };
        match self.exit_code {
            Some(code) if detail.is_empty() => format!("exit code {code}"),
            Some(code) => format!("exit code {code}: {detail}"),
            None if detail.is_empty() => "terminated by signal".to_string(),
            None => format!("terminated by signal: {detail}"),
        }
    }
}

/// Runs external programs on behalf of the pipeline.
pub trait CommandRunner {
    /// Run `program` with `args` in `cwd`, killing it after `timeout`.
    ///
    /// An `Err` means the program could not be started at all.
    fn run(
        &self,
        program: &str,
        args: &[&str],
        cwd: &Path,
        timeout: Option<Duration>,
    ) -> io::Result<CommandOutput>;

    /// Run a command line through `sh -c`.
    fn run_shell(
        &self,
        command: &str,
        cwd: &Path,
        timeout: Option<Duration>,
    ) -> io::Result<CommandOutput> {
        self.run("sh", &["-c", command], cwd, timeout)
    }
}

/// [`CommandRunner`] backed by real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(
        &self,
        program: &str,
        args: &[&str],
        cwd: &Path,
        timeout: Option<Duration>,
    ) -> io::Result<CommandOutput> {
        let started = Instant::now();
        tracing::debug!(program, ?args, cwd = %cwd.display(), "spawning");

        let mut child = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = wait_with_timeout(&mut child, timeout)?;
        let duration = started.elapsed();

        match status {
            Some(status) => Ok(CommandOutput {
                exit_code: status.code(),
                stdout: join_reader(stdout),
                stderr: join_reader(stderr),
                timed_out: false,
                duration,
            }),
            None => {
                // Grandchildren may still hold the pipes open, so the
                // readers are abandoned rather than joined.
                tracing::warn!(program, "command timed out after {:?}", duration);
                Ok(CommandOutput {
                    exit_code: None,
                    stdout: String::new(),
                    stderr: String::new(),
                    timed_out: true,
                    duration,
                })
            }
        }
    }
}

/// Quote `arg` for `sh` when it contains anything beyond a safe set.
pub fn shell_quote(arg: &str) -> Cow<'_, str> {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:@%+=,".contains(c));
    if safe {
        Cow::Borrowed(arg)
    } else {
        Cow::Owned(format!("'{}'", arg.replace('\'', "'\\''")))
    }
}

/// Poll the child until it exits or the deadline passes; kill it on timeout.
fn wait_with_timeout(
    child: &mut Child,
    timeout: Option<Duration>,
) -> io::Result<Option<std::process::ExitStatus>> {
    let Some(timeout) = timeout else {
        return child.wait().map(Some);
    };
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<String>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })
    })
}

fn join_reader(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_captures_stdout_and_exit_code() {
        let temp = TempDir::new().unwrap();
        let out = SystemRunner
            .run_shell("echo hello; echo oops >&2; exit 3", temp.path(), None)
            .unwrap();
        assert_eq!(out.exit_code, Some(3));
        assert_eq!(out.stdout.trim(), "hello");
        assert_eq!(out.stderr.trim(), "oops");
        assert!(!out.success());
        assert_eq!(out.failure_message(), "exit code 3: oops");
    }

    #[test]
    fn test_runs_in_working_directory() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("marker.txt"), "x").unwrap();
        let out = SystemRunner.run_shell("ls", temp.path(), None).unwrap();
        assert!(out.success());
        assert!(out.stdout.contains("marker.txt"));
    }

    #[test]
    fn test_timeout_kills_child() {
        let temp = TempDir::new().unwrap();
        let out = SystemRunner
            .run("sleep", &["5"], temp.path(), Some(Duration::from_millis(100)))
            .unwrap();
        assert!(out.timed_out);
        assert!(!out.success());
        assert!(out.duration < Duration::from_secs(5));
        assert!(out.failure_message().starts_with("timed out"));
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let temp = TempDir::new().unwrap();
        let result = SystemRunner.run("definitely-not-a-real-binary-xyz", &[], temp.path(), None);
        assert!(result.is_err());
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("src/legacy/a.js"), "src/legacy/a.js");
        assert_eq!(shell_quote("my dir"), "'my dir'");
        assert_eq!(shell_quote("it's"), "'it'\\''s'");
        assert_eq!(shell_quote(""), "''");
    }
}

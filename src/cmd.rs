use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::{InstallError, InstallResult};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A single external command: program, arguments, and how to run it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub cwd: Option<PathBuf>,
    pub stdin: Option<String>,
    pub timeout: Duration,
}

impl CommandSpec {
    #[must_use]
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
            env: Vec::new(),
            cwd: None,
            stdin: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Run a shell pipeline (via `sh -c`).
    #[must_use]
    pub fn shell(script: &str) -> Self {
        Self::new("sh").arg("-c").arg(script)
    }

    #[must_use]
    pub fn arg(mut self, arg: &str) -> Self {
        self.args.push(arg.to_string());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_string()));
        self
    }

    #[must_use]
    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.env.push((key.to_string(), value.to_string()));
        self
    }

    #[must_use]
    pub fn cwd(mut self, dir: &Path) -> Self {
        self.cwd = Some(dir.to_path_buf());
        self
    }

    #[must_use]
    pub fn stdin(mut self, data: &str) -> Self {
        self.stdin = Some(data.to_string());
        self
    }

    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Human-readable command line, used in logs and errors.
    #[must_use]
    pub fn display(&self) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// What happened when a command ran.
///
/// `output` is stdout followed by stderr, trimmed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutcome {
    pub succeeded: bool,
    pub output: String,
    pub exit_code: Option<i32>,
    pub timed_out: bool,
}

impl CommandOutcome {
    #[must_use]
    pub fn success(output: &str) -> Self {
        Self {
            succeeded: true,
            output: output.to_string(),
            exit_code: Some(0),
            timed_out: false,
        }
    }

    #[must_use]
    pub fn failure(exit_code: Option<i32>, output: &str) -> Self {
        Self {
            succeeded: false,
            output: output.to_string(),
            exit_code,
            timed_out: false,
        }
    }

    #[must_use]
    pub fn timeout(after: Duration) -> Self {
        Self {
            succeeded: false,
            output: format!("command timed out after {} seconds", after.as_secs()),
            exit_code: None,
            timed_out: true,
        }
    }

    /// Convert into a `Result`, returning the captured output on
    /// success.
    pub fn into_result(self, spec: &CommandSpec) -> InstallResult<String> {
        if self.succeeded {
            Ok(self.output)
        } else if self.timed_out {
            Err(InstallError::CommandTimedOut {
                command: spec.display(),
                timeout: spec.timeout,
            })
        } else {
            Err(InstallError::CommandFailed {
                command: spec.display(),
                output: self.output,
            })
        }
    }
}

/// Executes external commands. The installer never touches the
/// host through anything else, so tests swap in a recording fake.
pub trait Runner {
    fn run(&mut self, spec: &CommandSpec) -> CommandOutcome;
}

/// Run a command and fail if it does not succeed.
pub fn run_checked(runner: &mut dyn Runner, spec: &CommandSpec) -> InstallResult<String> {
    let outcome = runner.run(spec);
    if !outcome.succeeded {
        warn!(command = %spec.display(), "{}", outcome.output);
    }
    outcome.into_result(spec)
}

/// Check if a command exists on PATH.
pub fn command_exists(runner: &mut dyn Runner, program: &str) -> bool {
    runner
        .run(&CommandSpec::new("which").arg(program).timeout(Duration::from_secs(10)))
        .succeeded
}

/// Runs commands on the local machine via `std::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl Runner for SystemRunner {
    fn run(&mut self, spec: &CommandSpec) -> CommandOutcome {
        debug!(
            command = %spec.display(),
            timeout = spec.timeout.as_secs(),
            "running command"
        );
        match execute(spec) {
            Ok(outcome) => {
                if outcome.timed_out {
                    warn!(command = %spec.display(), "{}", outcome.output);
                } else if !outcome.succeeded {
                    debug!(exit_code = ?outcome.exit_code, "command failed");
                }
                outcome
            }
            Err(e) => {
                let message = if e.kind() == std::io::ErrorKind::NotFound {
                    format!("command not found: {}", spec.program)
                } else {
                    format!("failed to run command: {e}")
                };
                CommandOutcome::failure(None, &message)
            }
        }
    }
}

/// Logs commands instead of running them; every command fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunner;

impl Runner for DryRunner {
    fn run(&mut self, spec: &CommandSpec) -> CommandOutcome {
        debug!(command = %spec.display(), "dry run, not executed");
        CommandOutcome::failure(None, "dry run")
    }
}

fn execute(spec: &CommandSpec) -> std::io::Result<CommandOutcome> {
    let mut command = Command::new(&spec.program);
    command
        .args(&spec.args)
        .stdin(if spec.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    for (key, value) in &spec.env {
        command.env(key, value);
    }
    if let Some(dir) = &spec.cwd {
        command.current_dir(dir);
    }

    let mut child = command.spawn()?;

    // Start draining before feeding stdin so a chatty child cannot
    // fill its pipes while we block on the write.
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    if let (Some(data), Some(mut pipe)) = (&spec.stdin, child.stdin.take()) {
        if let Err(e) = pipe.write_all(data.as_bytes()) {
            debug!("stdin closed early: {e}");
        }
    }

    let Some(status) = wait_with_deadline(&mut child, spec.timeout)? else {
        // Grandchildren may still hold the pipes open; leave the
        // reader threads detached instead of joining them.
        return Ok(CommandOutcome::timeout(spec.timeout));
    };

    let output = combine(&collect(stdout), &collect(stderr));
    Ok(CommandOutcome {
        succeeded: status.success(),
        output,
        exit_code: status.code(),
        timed_out: false,
    })
}

fn wait_with_deadline(child: &mut Child, timeout: Duration) -> std::io::Result<Option<ExitStatus>> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            // The child may exit between try_wait and kill.
            let _ = child.kill();
            child.wait()?;
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

fn collect(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

fn combine(stdout: &str, stderr: &str) -> String {
    let stdout = stdout.trim();
    let stderr = stderr.trim();
    match (stdout.is_empty(), stderr.is_empty()) {
        (_, true) => stdout.to_string(),
        (true, false) => stderr.to_string(),
        (false, false) => format!("{stdout}\n{stderr}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_joins_program_and_args() {
        let spec = CommandSpec::new("apt-get").args(["install", "-y", "git"]);

        assert_eq!(spec.display(), "apt-get install -y git");
    }

    #[test]
    fn shell_wraps_in_sh() {
        let spec = CommandSpec::shell("echo hi | wc -c");

        assert_eq!(spec.program, "sh");
        assert_eq!(spec.args, vec!["-c", "echo hi | wc -c"]);
    }

    #[test]
    fn combine_orders_stdout_first() {
        assert_eq!(combine("out\n", "err\n"), "out\nerr");
        assert_eq!(combine("", "err"), "err");
        assert_eq!(combine("out", "  "), "out");
    }

    #[test]
    fn into_result_maps_timeout() {
        let spec = CommandSpec::new("sleep").timeout(Duration::from_secs(2));
        let err = CommandOutcome::timeout(spec.timeout)
            .into_result(&spec)
            .unwrap_err();

        assert!(matches!(err, InstallError::CommandTimedOut { .. }));
    }

    #[test]
    fn system_runner_kills_on_timeout() {
        let started = Instant::now();
        let spec = CommandSpec::new("sleep").arg("30").timeout(Duration::from_secs(1));

        let outcome = SystemRunner.run(&spec);

        assert!(outcome.timed_out);
        assert!(!outcome.succeeded);
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn system_runner_reports_missing_program() {
        let outcome = SystemRunner.run(&CommandSpec::new("definitely-not-installed-xyz"));

        assert!(!outcome.succeeded);
        assert!(outcome.output.contains("command not found"));
        assert!(!command_exists(&mut SystemRunner, "definitely-not-installed-xyz"));
    }
}

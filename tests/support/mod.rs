#![allow(dead_code)]

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use horilla_installer::cmd::{CommandOutcome, CommandSpec, Runner};
use horilla_installer::error::{InstallError, InstallResult};
use horilla_installer::params::{HostPaths, Params, RawParams, RunOptions};
use horilla_installer::prompt::Prompt;
use horilla_installer::LockRetry;

pub const UBUNTU: &str = "NAME=\"Ubuntu\"\nID=ubuntu\nID_LIKE=debian\nPRETTY_NAME=\"Ubuntu 24.04 LTS\"\n";

/// Records every command and answers from scripted responses.
///
/// A rule matches when the command line contains its pattern. Each
/// rule replays its responses in order and repeats the last one.
/// Unmatched commands succeed with empty output.
#[derive(Default)]
pub struct FakeRunner {
    pub calls: Vec<CommandSpec>,
    rules: Vec<(String, VecDeque<CommandOutcome>)>,
}

impl FakeRunner {
    /// A host where Docker and the compose plugin already work and
    /// the web container reports running.
    pub fn host() -> Self {
        Self::default()
            .on("docker inspect", CommandOutcome::success("true"))
            .on("crontab -l", CommandOutcome::failure(Some(1), "no crontab for root"))
    }

    pub fn on(mut self, pattern: &str, outcome: CommandOutcome) -> Self {
        self.rules
            .push((pattern.to_string(), VecDeque::from([outcome])));
        self
    }

    pub fn on_seq(mut self, pattern: &str, outcomes: Vec<CommandOutcome>) -> Self {
        self.rules.push((pattern.to_string(), outcomes.into()));
        self
    }

    pub fn lines(&self) -> Vec<String> {
        self.calls.iter().map(CommandSpec::display).collect()
    }

    pub fn count(&self, pattern: &str) -> usize {
        self.lines().iter().filter(|l| l.contains(pattern)).count()
    }

    pub fn ran(&self, pattern: &str) -> bool {
        self.count(pattern) > 0
    }

    pub fn find(&self, pattern: &str) -> Option<&CommandSpec> {
        self.calls.iter().find(|c| c.display().contains(pattern))
    }
}

impl Runner for FakeRunner {
    fn run(&mut self, spec: &CommandSpec) -> CommandOutcome {
        self.calls.push(spec.clone());
        let line = spec.display();
        for (pattern, responses) in &mut self.rules {
            if line.contains(pattern.as_str()) {
                return if responses.len() > 1 {
                    responses.pop_front().unwrap_or_default()
                } else {
                    responses.front().cloned().unwrap_or_default()
                };
            }
        }
        CommandOutcome::success("")
    }
}

/// Answers prompts from a fixed list. An empty answer takes the
/// default; running out of answers aborts.
#[derive(Default)]
pub struct Scripted {
    answers: VecDeque<String>,
    pub questions: Vec<String>,
}

impl Scripted {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|a| (*a).to_string()).collect(),
            questions: Vec::new(),
        }
    }
}

impl Prompt for Scripted {
    fn ask(&mut self, question: &str, default: Option<&str>) -> InstallResult<String> {
        self.questions.push(question.to_string());
        let answer = self.answers.pop_front().ok_or(InstallError::Aborted)?;
        if answer.is_empty() {
            Ok(default.unwrap_or_default().to_string())
        } else {
            Ok(answer)
        }
    }
}

/// A sandboxed host: host paths and the install directory live under
/// a temporary directory.
pub struct Sandbox {
    pub dir: tempfile::TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let sandbox = Self { dir };
        let paths = sandbox.paths();
        fs::create_dir_all(paths.os_release.parent().unwrap()).unwrap();
        fs::write(&paths.os_release, UBUNTU).unwrap();
        sandbox
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn paths(&self) -> HostPaths {
        HostPaths::under(self.root())
    }

    pub fn install_dir(&self) -> PathBuf {
        self.root().join("opt/horilla")
    }

    pub fn raw(&self, domain: &str) -> RawParams {
        RawParams {
            domain: Some(domain.to_string()),
            install_dir: Some(self.install_dir().display().to_string()),
            ..RawParams::default()
        }
    }

    pub fn params(&self, raw: &RawParams, options: RunOptions) -> Params {
        Params::resolve(raw, options, instant_retry(3), self.paths()).unwrap()
    }
}

pub fn unattended() -> RunOptions {
    RunOptions {
        non_interactive: true,
        ..RunOptions::default()
    }
}

pub fn instant_retry(attempts: u32) -> LockRetry {
    LockRetry::new(attempts, Duration::ZERO)
}

pub const fn no_pause(_: Duration) {}

pub fn lock_error() -> CommandOutcome {
    CommandOutcome::failure(
        Some(100),
        "E: Could not get lock /var/lib/dpkg/lock-frontend. It is held by process 812 (unattended-upgr)",
    )
}

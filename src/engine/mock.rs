//! Scripted command runner for testing.
//!
//! [`MockRunner`] answers engine commands from a script instead of spawning
//! processes and records every invocation, so tests can assert both on the
//! verdict and on which commands were (or were not) run.

use crate::core::{ScanError, ScanResult};
use crate::engine::runner::{CommandOutput, CommandRunner};

use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Scripted reaction to one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockResponse {
    /// The process ran to completion.
    Output(CommandOutput),
    /// The process exceeded its time bound.
    Timeout,
    /// The program is not installed.
    Missing,
}

impl MockResponse {
    /// A process that exited with `code`.
    pub fn exit(code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::Output(CommandOutput::new(code, stdout, stderr))
    }

    /// A process that exited 0 and printed `stdout`.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self::exit(0, stdout, "")
    }
}

/// One recorded invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// Program that was invoked.
    pub program: String,
    /// Arguments it was invoked with.
    pub args: Vec<String>,
    /// Time bound requested by the caller.
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
struct Rule {
    program: String,
    arg: Option<String>,
    response: MockResponse,
}

/// A [`CommandRunner`] that replays scripted responses.
///
/// Rules that name an argument take precedence over rules that only name a
/// program. Unscripted programs behave as if they were not installed.
///
/// # Examples
///
/// ```rust
/// use scangate::engine::{MockResponse, MockRunner};
///
/// let runner = MockRunner::new()
///     .with_response_for("clamscan", "--version", MockResponse::ok("ClamAV 1.0.3"))
///     .with_response("clamscan", MockResponse::exit(1, "/tmp/x: Eicar FOUND", ""));
/// assert_eq!(runner.call_count(), 0);
/// ```
#[derive(Debug, Default)]
pub struct MockRunner {
    rules: Mutex<Vec<Rule>>,
    latency: Option<Duration>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockRunner {
    /// Creates a runner on which every program is missing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers any invocation of `program` with `response`.
    pub fn with_response(self, program: impl Into<String>, response: MockResponse) -> Self {
        self.set_response(program, response);
        self
    }

    /// Rescripts `program` on a runner that is already in use.
    ///
    /// Earlier program-wide rules for `program` are replaced; argument
    /// specific rules are kept.
    pub fn set_response(&self, program: impl Into<String>, response: MockResponse) {
        let program = program.into();
        let mut rules = self.rules.lock().unwrap_or_else(PoisonError::into_inner);
        rules.retain(|r| r.program != program || r.arg.is_some());
        rules.push(Rule {
            program,
            arg: None,
            response,
        });
    }

    /// Answers invocations of `program` that include `arg` with `response`.
    pub fn with_response_for(
        self,
        program: impl Into<String>,
        arg: impl Into<String>,
        response: MockResponse,
    ) -> Self {
        self.rules
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Rule {
                program: program.into(),
                arg: Some(arg.into()),
                response,
            });
        self
    }

    /// Delays every response by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Returns all recorded invocations.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of invocations.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns the number of invocations of `program`.
    pub fn calls_to(&self, program: &str) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|c| c.program == program)
            .count()
    }

    fn lookup(&self, program: &str, args: &[String]) -> MockResponse {
        let rules = self.rules.lock().unwrap_or_else(PoisonError::into_inner);
        let specific = rules.iter().find(|r| {
            r.program == program
                && r.arg
                    .as_ref()
                    .is_some_and(|arg| args.iter().any(|a| a == arg))
        });
        let generic = || {
            rules
                .iter()
                .find(|r| r.program == program && r.arg.is_none())
        };

        specific
            .or_else(generic)
            .map(|r| r.response.clone())
            .unwrap_or(MockResponse::Missing)
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> ScanResult<CommandOutput> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedCall {
                program: program.to_string(),
                args: args.to_vec(),
                timeout,
            });

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        match self.lookup(program, args) {
            MockResponse::Output(output) => Ok(output),
            MockResponse::Timeout => Err(ScanError::timeout(program, timeout)),
            MockResponse::Missing => Err(ScanError::spawn_failed(
                program,
                std::io::Error::new(std::io::ErrorKind::NotFound, "program not found"),
            )),
        }
    }
}

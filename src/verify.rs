use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::MutateError;
use crate::mutant::MutantOutcome;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How the verification process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitKind {
    /// Exit status 0.
    Success,

    /// The process ran and returned a non-zero exit code.
    Failure(i32),

    /// Terminated without an exit code (for example by a signal).
    Abnormal(String),

    /// Killed after exceeding the configured timeout.
    TimedOut,
}

/// Result of one verification run.
#[derive(Debug, Clone)]
pub struct Verification {
    pub exit: ExitKind,

    /// Standard output and standard error, interleaved in arrival order.
    pub output: Vec<u8>,

    /// How long the command ran.
    pub duration: Duration,
}

impl Verification {
    pub fn succeeded(&self) -> bool {
        self.exit == ExitKind::Success
    }

    /// Last non-empty line of the combined output.
    pub fn last_line(&self) -> Option<String> {
        String::from_utf8_lossy(&self.output)
            .lines()
            .rev()
            .map(str::trim_end)
            .find(|line| !line.trim().is_empty())
            .map(str::to_string)
    }

    /// One-line description for diagnostics.
    pub fn describe(&self) -> String {
        let status = match &self.exit {
            ExitKind::Success => "exit code 0".to_string(),
            ExitKind::Failure(code) => format!("exit code {code}"),
            ExitKind::Abnormal(desc) => desc.clone(),
            ExitKind::TimedOut => "timed out".to_string(),
        };

        match self.last_line() {
            Some(line) => format!("{status}: {line}"),
            None => status,
        }
    }
}

/// Capability to run the verification step against a working directory.
pub trait Verifier {
    fn run(&self, working_dir: &Path, args: &[String]) -> Result<Verification, MutateError>;
}

/// Runs an external program (by default `cargo`).
#[derive(Debug, Clone)]
pub struct CommandVerifier {
    program: String,
    timeout: Option<Duration>,
}

impl CommandVerifier {
    pub fn new(program: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Verifier for CommandVerifier {
    fn run(&self, working_dir: &Path, args: &[String]) -> Result<Verification, MutateError> {
        let spawn_err = |source| MutateError::Spawn {
            program: self.program.clone(),
            source,
        };

        let start = Instant::now();

        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Own process group, so a timeout can take down the test binaries too.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let mut child = cmd.spawn().map_err(spawn_err)?;

        let output = Arc::new(Mutex::new(Vec::new()));
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_reader(stdout, Arc::clone(&output)));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_reader(stderr, Arc::clone(&output)));
        }

        let exit = match wait_with_timeout(&mut child, self.timeout).map_err(spawn_err)? {
            Some(status) => {
                for reader in readers {
                    let _ = reader.join();
                }
                exit_kind(status)
            }
            // Orphaned grandchildren may still hold the pipes; keep what arrived so far.
            None => ExitKind::TimedOut,
        };

        let output = output.lock().unwrap_or_else(|e| e.into_inner()).clone();

        Ok(Verification {
            exit,
            output,
            duration: start.elapsed(),
        })
    }
}

/// Classify a finished verification run.
///
/// A non-zero exit only counts as a kill when the last non-empty output line
/// starts with `failure_marker`; anything else (build errors, harness
/// crashes, no output at all) is reported as `Errored`.
pub fn classify(verification: &Verification, failure_marker: &str) -> MutantOutcome {
    match &verification.exit {
        ExitKind::Success => MutantOutcome::Survived,
        ExitKind::Failure(_) => match verification.last_line() {
            Some(line) if line.starts_with(failure_marker) => MutantOutcome::Killed,
            Some(line) => MutantOutcome::Errored { detail: line },
            None => MutantOutcome::Errored {
                detail: "no output".to_string(),
            },
        },
        ExitKind::TimedOut => MutantOutcome::TimedOut,
        ExitKind::Abnormal(desc) => MutantOutcome::Fatal {
            reason: desc.clone(),
        },
    }
}

fn exit_kind(status: ExitStatus) -> ExitKind {
    if status.success() {
        return ExitKind::Success;
    }
    match status.code() {
        Some(code) => ExitKind::Failure(code),
        None => ExitKind::Abnormal(status.to_string()),
    }
}

fn spawn_reader<R>(mut stream: R, sink: Arc<Mutex<Vec<u8>>>) -> JoinHandle<()>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut buf = [0u8; 8192];
        loop {
            match stream.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => sink
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .extend_from_slice(&buf[..n]),
            }
        }
    })
}

/// `Ok(None)` means the child was killed after `timeout`.
fn wait_with_timeout(
    child: &mut Child,
    timeout: Option<Duration>,
) -> std::io::Result<Option<ExitStatus>> {
    let Some(timeout) = timeout else {
        return child.wait().map(Some);
    };

    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }

        if start.elapsed() >= timeout {
            kill_process_tree(child);
            let _ = child.wait();
            return Ok(None);
        }

        thread::sleep(POLL_INTERVAL);
    }
}

fn kill_process_tree(child: &mut Child) {
    #[cfg(unix)]
    {
        let group = format!("-{}", child.id());
        let _ = Command::new("kill")
            .args(["-KILL", "--", group.as_str()])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
    }

    let _ = child.kill();
}

//! External process invocation
//!
//! One blocking call per process: spawn, optionally feed stdin, drain stdout
//! and stderr on reader threads, and poll for exit until the deadline. A
//! process that outlives its deadline is killed and reaped before
//! [`HarnessError::Timeout`] is returned.
//!
//! The deadline also covers draining the pipes: a background process left
//! behind by the child keeps them open after the child exits, and waiting on
//! it past the deadline is reported as a timeout too.

use std::io::{Read, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::HarnessError;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Exit status and captured output of a finished process.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

impl Stream {
    const fn name(self) -> &'static str {
        match self {
            Stream::Stdout => "stdout",
            Stream::Stderr => "stderr",
        }
    }
}

type Drained = (Stream, std::io::Result<Vec<u8>>);

fn spawn_reader<R: Read + Send + 'static>(stream: Stream, pipe: Option<R>, tx: Sender<Drained>) {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let result = match pipe {
            Some(mut pipe) => pipe.read_to_end(&mut buf).map(|_| buf),
            None => Ok(buf),
        };
        // The receiver is gone once the caller has given up on this process.
        let _ = tx.send((stream, result));
    });
}

/// Collects both streams, giving up at `deadline`.
fn drain_streams(
    program: &str,
    rx: &Receiver<Drained>,
    deadline: Instant,
    timeout: Duration,
) -> Result<(Vec<u8>, Vec<u8>), HarnessError> {
    let failure = |detail: String| HarnessError::ExternalProcess {
        program: program.to_string(),
        detail,
    };
    let mut stdout = None;
    let mut stderr = None;
    while stdout.is_none() || stderr.is_none() {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let (stream, result) = match rx.recv_timeout(remaining) {
            Ok(drained) => drained,
            Err(RecvTimeoutError::Timeout) => {
                return Err(HarnessError::Timeout {
                    program: program.to_string(),
                    timeout,
                });
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(failure("output reader thread exited early".into()));
            }
        };
        let buf = result.map_err(|error| failure(format!("failed reading {}: {error}", stream.name())))?;
        match stream {
            Stream::Stdout => stdout = Some(buf),
            Stream::Stderr => stderr = Some(buf),
        }
    }
    Ok((stdout.unwrap_or_default(), stderr.unwrap_or_default()))
}

/// Runs `program` with `args` to completion or until `timeout` elapses.
pub fn run_process(
    program: &Path,
    args: &[String],
    stdin: Option<&[u8]>,
    timeout: Duration,
) -> Result<ProcessOutput, HarnessError> {
    let name = program.display().to_string();
    let failure = |detail: String| HarnessError::ExternalProcess {
        program: name.clone(),
        detail,
    };

    debug!(program = %name, ?args, "spawning external process");
    let mut child = Command::new(program)
        .args(args)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|error| failure(format!("failed to spawn: {error}")))?;

    let (tx, rx) = mpsc::channel();
    spawn_reader(Stream::Stdout, child.stdout.take(), tx.clone());
    spawn_reader(Stream::Stderr, child.stderr.take(), tx);

    if let (Some(payload), Some(mut pipe)) = (stdin, child.stdin.take()) {
        if let Err(error) = pipe.write_all(payload) {
            let _ = child.kill();
            let _ = child.wait();
            return Err(failure(format!("failed to write stdin payload: {error}")));
        }
    }

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(HarnessError::Timeout {
                    program: name.clone(),
                    timeout,
                });
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(error) => {
                return Err(failure(format!("failed waiting for process exit: {error}")));
            }
        }
    };

    let (stdout, stderr) = drain_streams(&name, &rx, deadline, timeout)?;
    debug!(program = %name, exit_code = ?status.code(), "external process finished");

    Ok(ProcessOutput {
        exit_code: status.code(),
        stdout,
        stderr,
    })
}

//! Launching one compiler invocation per case.
//!
//! Output goes to two anonymous scratch files rather than pipes, so a
//! chatty compiler can never block on a full pipe while the scheduler is
//! busy elsewhere. The files are unlinked on creation and vanish when the
//! [`FinishedCase`] is built.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::Instant;

use nc_directive::CaseDescriptor;

use crate::clock::Stamp;
use crate::config::{DriverConfig, TimeoutPolicy};
use crate::error::DriverError;
use crate::sys;

/// Builds and starts compiler invocations for one source file.
#[derive(Clone, Debug)]
pub struct CaseRunner {
    compiler: PathBuf,
    flags: Vec<String>,
    source: PathBuf,
    scratch_dir: PathBuf,
    policy: TimeoutPolicy,
}

impl CaseRunner {
    pub fn new(config: &DriverConfig) -> Self {
        CaseRunner {
            compiler: config.compiler.clone(),
            flags: config.compiler_flags(),
            source: config.source.clone(),
            scratch_dir: config.scratch_dir(),
            policy: config.policy,
        }
    }

    /// Compiler arguments for `case`, without the program itself.
    pub fn arguments(&self, case: &CaseDescriptor) -> Vec<String> {
        let mut args = self.flags.clone();
        if !case.is_sanity() {
            args.push(format!("-D{}", case.name()));
        }
        args.extend(
            ["-o", "/dev/null", "-c", "-x", "c++"]
                .iter()
                .map(|s| (*s).to_string()),
        );
        args.push(self.source.to_string_lossy().into_owned());
        args
    }

    /// The command line as shown in failure reports.
    pub fn command_line(&self, case: &CaseDescriptor) -> String {
        let mut line = self.compiler.to_string_lossy().into_owned();
        for arg in self.arguments(case) {
            line.push(' ');
            line.push_str(&arg);
        }
        line
    }

    /// Start the compiler for `case` without waiting for it.
    pub fn start(&self, case: CaseDescriptor) -> Result<RunningCase, DriverError> {
        let stdout = self.scratch_file()?;
        let stderr = self.scratch_file()?;
        let command_line = self.command_line(&case);

        let child_stdout = stdout
            .try_clone()
            .map_err(|e| DriverError::io(&self.scratch_dir, e))?;
        let child_stderr = stderr
            .try_clone()
            .map_err(|e| DriverError::io(&self.scratch_dir, e))?;

        let started = Stamp::now();
        let child = Command::new(&self.compiler)
            .args(self.arguments(&case))
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .stdout(Stdio::from(child_stdout))
            .stderr(Stdio::from(child_stderr))
            .spawn()
            .map_err(|source| DriverError::Spawn {
                program: self.compiler.clone(),
                source,
            })?;

        tracing::debug!(
            case = case.name(),
            pid = child.id(),
            command = %command_line,
            "started compiler"
        );

        Ok(RunningCase {
            terminate_deadline: started.instant() + self.policy.terminate,
            kill_deadline: started.instant() + self.policy.kill,
            descriptor: case,
            command_line,
            child,
            stdout,
            stderr,
            started,
            status: None,
            finished: None,
            aborted: None,
            escalation: Escalation::default(),
        })
    }

    fn scratch_file(&self) -> Result<File, DriverError> {
        tempfile::tempfile_in(&self.scratch_dir).map_err(|e| DriverError::io(&self.scratch_dir, e))
    }
}

/// Signals sent to a case's compiler. Both may be set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Escalation {
    pub terminated: bool,
    pub killed: bool,
}

impl Escalation {
    pub fn any(self) -> bool {
        self.terminated || self.killed
    }
}

/// A case whose compiler has been started and not yet collected.
#[derive(Debug)]
pub struct RunningCase {
    descriptor: CaseDescriptor,
    command_line: String,
    child: Child,
    stdout: File,
    stderr: File,
    started: Stamp,
    terminate_deadline: Instant,
    kill_deadline: Instant,
    status: Option<ExitStatus>,
    finished: Option<Stamp>,
    aborted: Option<Stamp>,
    escalation: Escalation,
}

impl RunningCase {
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    pub fn terminate_deadline(&self) -> Instant {
        self.terminate_deadline
    }

    pub fn kill_deadline(&self) -> Instant {
        self.kill_deadline
    }

    pub fn is_finished(&self) -> bool {
        self.finished.is_some()
    }

    /// Descriptors of the two scratch files, for readiness polling.
    pub fn output_fds(&self) -> [RawFd; 2] {
        [self.stdout.as_raw_fd(), self.stderr.as_raw_fd()]
    }

    /// Check without blocking whether the compiler has exited. The first
    /// observed exit stamps the finish time.
    pub fn poll_exit(&mut self, now: Stamp) -> Result<bool, DriverError> {
        if self.status.is_some() {
            return Ok(true);
        }
        let status = self
            .child
            .try_wait()
            .map_err(|e| DriverError::process(self.descriptor.name(), e))?;
        if let Some(status) = status {
            self.status = Some(status);
            self.finished = Some(now);
        }
        Ok(self.status.is_some())
    }

    /// Send SIGTERM once. Later calls are no-ops.
    pub fn terminate(&mut self, now: Stamp) -> Result<(), DriverError> {
        if self.escalation.terminated {
            return Ok(());
        }
        tracing::warn!(
            case = self.name(),
            pid = self.child.id(),
            "compile timed out, sending SIGTERM"
        );
        sys::terminate(self.child.id())
            .map_err(|e| DriverError::process(self.descriptor.name(), e))?;
        self.escalation.terminated = true;
        self.aborted = self.aborted.or(Some(now));
        Ok(())
    }

    /// Send SIGKILL once. Later calls are no-ops.
    pub fn kill(&mut self, now: Stamp) -> Result<(), DriverError> {
        if self.escalation.killed {
            return Ok(());
        }
        tracing::warn!(
            case = self.name(),
            pid = self.child.id(),
            "compiler still running past the kill deadline, sending SIGKILL"
        );
        self.child
            .kill()
            .map_err(|e| DriverError::process(self.descriptor.name(), e))?;
        self.escalation.killed = true;
        self.aborted = self.aborted.or(Some(now));
        Ok(())
    }

    /// Kill and reap the compiler if it is still running. Used when a run is
    /// abandoned.
    pub(crate) fn abandon(&mut self) {
        if self.status.is_some() {
            return;
        }
        if let Err(e) = self.child.kill() {
            tracing::debug!(case = self.name(), error = %e, "kill on abandon failed");
        }
        match self.child.wait() {
            Ok(status) => self.status = Some(status),
            Err(e) => {
                tracing::warn!(case = self.name(), error = %e, "could not reap abandoned compiler");
            }
        }
    }

    /// Reap the process and read both scratch files. The files are closed
    /// on return, whatever the outcome.
    pub fn collect(mut self) -> Result<FinishedCase, DriverError> {
        let status = match self.status {
            Some(status) => status,
            None => self
                .child
                .wait()
                .map_err(|e| DriverError::process(self.descriptor.name(), e))?,
        };
        let finished = self.finished.unwrap_or_else(Stamp::now);
        let stdout = read_scratch(&mut self.stdout)
            .map_err(|e| DriverError::process(self.descriptor.name(), e))?;
        let stderr = read_scratch(&mut self.stderr)
            .map_err(|e| DriverError::process(self.descriptor.name(), e))?;

        Ok(FinishedCase {
            descriptor: self.descriptor,
            command_line: self.command_line,
            status,
            started: self.started,
            finished,
            aborted: self.aborted,
            escalation: self.escalation,
            stdout,
            stderr,
        })
    }
}

/// A reaped case with its captured output, ready for evaluation.
#[derive(Clone, Debug)]
pub struct FinishedCase {
    pub descriptor: CaseDescriptor,
    pub command_line: String,
    pub status: ExitStatus,
    pub started: Stamp,
    pub finished: Stamp,
    /// When the first terminate or kill signal was sent.
    pub aborted: Option<Stamp>,
    pub escalation: Escalation,
    pub stdout: String,
    pub stderr: String,
}

fn read_scratch(file: &mut File) -> io::Result<String> {
    file.seek(SeekFrom::Start(0))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

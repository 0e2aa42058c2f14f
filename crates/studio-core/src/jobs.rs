//! Background job tracking
//!
//! The `JobManager` is the single owner of every process launched in the
//! background. A job moves from `Running` to `Terminated` once, either when a
//! kill succeeds or when `reap` observes a natural exit. Terminated jobs stay
//! listable for the life of the manager.
//!
//! Liveness is not polled on a timer: status reflects the last spawn, kill or
//! reap call.

use std::io;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::errors::{Result, ShellError};
use crate::schema::{FIELD_COMMAND, FIELD_JOB_ID};
use crate::{log_op_end, log_op_start};

/// Lifecycle state of a background job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JobStatus {
    Running,
    Terminated,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Running => f.pad("Running"),
            JobStatus::Terminated => f.pad("Terminated"),
        }
    }
}

/// A tracked background process
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Job {
    pub id: u64,
    pub pid: u32,
    pub command_line: String,
    pub started_at: DateTime<Utc>,
    pub status: JobStatus,
}

/// Handle to a live OS process
pub trait ProcessHandle {
    fn pid(&self) -> u32;

    /// Request termination and wait for the process to go away
    fn terminate(&mut self) -> io::Result<()>;

    /// Non-blocking check for a natural exit
    fn has_exited(&mut self) -> io::Result<bool>;
}

/// Process creation facility used by the job manager
pub trait ProcessHost {
    /// Start `program` with `args` in `cwd` without waiting for it
    fn spawn(&self, program: &str, args: &[String], cwd: &Path)
        -> io::Result<Box<dyn ProcessHandle>>;

    /// Run `program` to completion with inherited stdio
    ///
    /// Returns the exit code, or `None` when the process was ended by a
    /// signal.
    fn run(&self, program: &str, args: &[String], cwd: &Path) -> io::Result<Option<i32>>;
}

/// Host backed by `std::process`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessHost;

impl ProcessHost for SystemProcessHost {
    fn spawn(
        &self,
        program: &str,
        args: &[String],
        cwd: &Path,
    ) -> io::Result<Box<dyn ProcessHandle>> {
        let child = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .spawn()?;
        Ok(Box::new(ChildHandle(child)))
    }

    fn run(&self, program: &str, args: &[String], cwd: &Path) -> io::Result<Option<i32>> {
        let status = Command::new(program).args(args).current_dir(cwd).status()?;
        Ok(status.code())
    }
}

struct ChildHandle(Child);

impl ProcessHandle for ChildHandle {
    fn pid(&self) -> u32 {
        self.0.id()
    }

    fn terminate(&mut self) -> io::Result<()> {
        if self.0.try_wait()?.is_some() {
            return Ok(());
        }
        self.0.kill()?;
        self.0.wait()?;
        Ok(())
    }

    fn has_exited(&mut self) -> io::Result<bool> {
        Ok(self.0.try_wait()?.is_some())
    }
}

/// Outcome of `kill_all`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KillReport {
    /// Jobs moved to Terminated by this call
    pub terminated: Vec<u64>,
    /// Jobs whose process refused to terminate, with the reason
    pub failed: Vec<(u64, String)>,
}

impl KillReport {
    pub fn count(&self) -> usize {
        self.terminated.len()
    }
}

struct JobEntry {
    job: Job,
    handle: Option<Box<dyn ProcessHandle>>,
}

pub struct JobManager {
    host: Box<dyn ProcessHost>,
    next_id: u64,
    entries: Vec<JobEntry>,
}

impl JobManager {
    pub fn new(host: Box<dyn ProcessHost>) -> Self {
        Self {
            host,
            next_id: 1,
            entries: Vec::new(),
        }
    }

    /// Manager backed by real OS processes
    pub fn system() -> Self {
        Self::new(Box::new(SystemProcessHost))
    }

    /// Launch a command line as a detached background job
    ///
    /// The first element is the program, looked up on `PATH` by the host.
    /// Returns as soon as the process exists.
    ///
    /// # Errors
    ///
    /// Returns `Spawn` if the command line is empty, the executable cannot be
    /// found, or the OS refuses to create the process. No job id is consumed
    /// on failure.
    pub fn spawn(&mut self, argv: &[String], cwd: &Path) -> Result<&Job> {
        let started = Instant::now();
        let (program, args) = argv.split_first().ok_or_else(|| ShellError::Spawn {
            program: String::new(),
            reason: "empty command line".to_string(),
        })?;
        log_op_start!("job_spawn", { FIELD_COMMAND } = program.as_str());

        let handle = match self.host.spawn(program, args, cwd) {
            Ok(handle) => handle,
            Err(e) => {
                let err = spawn_error(program, &e);
                tracing::debug!(
                    op = "job_spawn",
                    error = %err,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "spawn refused"
                );
                return Err(err);
            }
        };

        let id = self.next_id;
        self.next_id += 1;
        let job = Job {
            id,
            pid: handle.pid(),
            command_line: argv.join(" "),
            started_at: Utc::now(),
            status: JobStatus::Running,
        };
        log_op_end!(
            "job_spawn",
            duration_ms = started.elapsed().as_millis() as u64,
            { FIELD_JOB_ID } = id,
            pid = job.pid
        );
        self.entries.push(JobEntry {
            job,
            handle: Some(handle),
        });

        let entry = &self.entries[self.entries.len() - 1];
        Ok(&entry.job)
    }

    /// Run a command line in the foreground and wait for it
    ///
    /// Foreground runs are not tracked as jobs and consume no job id.
    ///
    /// # Errors
    ///
    /// Returns `Spawn` under the same conditions as [`JobManager::spawn`].
    pub fn run_foreground(&self, argv: &[String], cwd: &Path) -> Result<Option<i32>> {
        let (program, args) = argv.split_first().ok_or_else(|| ShellError::Spawn {
            program: String::new(),
            reason: "empty command line".to_string(),
        })?;
        let started = Instant::now();
        log_op_start!("run_foreground", { FIELD_COMMAND } = program.as_str());
        let code = self
            .host
            .run(program, args, cwd)
            .map_err(|e| spawn_error(program, &e))?;
        log_op_end!(
            "run_foreground",
            duration_ms = started.elapsed().as_millis() as u64,
            exit_code = ?code
        );
        Ok(code)
    }

    /// Terminate the most recently spawned job
    ///
    /// # Errors
    ///
    /// Returns `NoJobs` if nothing was ever spawned, `AlreadyTerminated` if
    /// the latest job is no longer running, or `Io` if the OS refused.
    pub fn kill_last(&mut self) -> Result<&Job> {
        let entry = self.entries.last_mut().ok_or(ShellError::NoJobs)?;
        if entry.job.status == JobStatus::Terminated {
            return Err(ShellError::AlreadyTerminated {
                job_id: entry.job.id,
            });
        }
        terminate_entry(entry).map_err(|reason| ShellError::Io {
            op: format!("terminate job {}", entry.job.id),
            message: reason,
        })?;
        Ok(&entry.job)
    }

    /// Terminate every running job, best effort
    ///
    /// A process refusing to terminate is recorded in the report and the
    /// remaining jobs are still attempted.
    pub fn kill_all(&mut self) -> KillReport {
        let mut report = KillReport::default();
        for entry in self
            .entries
            .iter_mut()
            .filter(|e| e.job.status == JobStatus::Running)
        {
            match terminate_entry(entry) {
                Ok(()) => report.terminated.push(entry.job.id),
                Err(reason) => {
                    tracing::warn!(
                        { FIELD_JOB_ID } = entry.job.id,
                        %reason,
                        "job refused to terminate"
                    );
                    report.failed.push((entry.job.id, reason));
                }
            }
        }
        report
    }

    /// Mark running jobs whose process already exited as Terminated
    ///
    /// Returns the ids that changed state.
    pub fn reap(&mut self) -> Vec<u64> {
        let mut reaped = Vec::new();
        for entry in self
            .entries
            .iter_mut()
            .filter(|e| e.job.status == JobStatus::Running)
        {
            let exited = entry
                .handle
                .as_mut()
                .map(|h| h.has_exited().unwrap_or(false))
                .unwrap_or(true);
            if exited {
                entry.job.status = JobStatus::Terminated;
                entry.handle = None;
                reaped.push(entry.job.id);
            }
        }
        if !reaped.is_empty() {
            tracing::debug!(jobs = ?reaped, "reaped exited jobs");
        }
        reaped
    }

    /// Jobs ordered by id ascending
    pub fn list(&self) -> Vec<&Job> {
        self.entries.iter().map(|e| &e.job).collect()
    }

    pub fn get(&self, id: u64) -> Option<&Job> {
        self.entries.iter().map(|e| &e.job).find(|j| j.id == id)
    }

    pub fn running_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.job.status == JobStatus::Running)
            .count()
    }
}

impl std::fmt::Debug for JobManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobManager")
            .field("next_id", &self.next_id)
            .field("jobs", &self.list())
            .finish()
    }
}

fn spawn_error(program: &str, e: &io::Error) -> ShellError {
    let reason = if e.kind() == io::ErrorKind::NotFound {
        "executable not found on PATH".to_string()
    } else {
        e.to_string()
    };
    ShellError::Spawn {
        program: program.to_string(),
        reason,
    }
}

fn terminate_entry(entry: &mut JobEntry) -> std::result::Result<(), String> {
    if let Some(handle) = entry.handle.as_mut() {
        handle.terminate().map_err(|e| e.to_string())?;
    }
    entry.job.status = JobStatus::Terminated;
    entry.handle = None;
    tracing::info!({ FIELD_JOB_ID } = entry.job.id, pid = entry.job.pid, "job terminated");
    Ok(())
}

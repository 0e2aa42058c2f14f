//! Process commands: `run`, `quit` and `jobs`

use chrono::Utc;

use super::{check_flags, text, Flags};
use crate::errors::{Result, ShellError};
use crate::registry::{CommandContext, CommandHandler, HandlerKind, Outcome};

const RUN_HELP: &str = "\
run - executes a program found on PATH

Synopsis:
    run <program> [argument...]
    run <program> [argument...] &
    run -h | --help

Without a trailing &, the program runs in the foreground and the shell waits
for it. With a trailing &, it starts as a background job and the shell stays
interactive. Background jobs are listed by `jobs` and ended by `quit`.";

const QUIT_HELP: &str = "\
quit - terminates background jobs started with `run ... &`

Synopsis:
    quit           terminate the most recent job
    quit --all     terminate every running job
    quit -h | --help";

/// Runs a program in the foreground; the dispatcher routes `run ... &` to
/// the job manager
pub struct Run;

impl CommandHandler for Run {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Spawning
    }

    fn usage(&self) -> &str {
        "run <program> [args...] [&]"
    }

    fn preflight(&self, command: &str, args: &[String]) -> Result<Option<Outcome>> {
        // only a leading help flag belongs to `run`; later flags go to the program
        match args.first().map(String::as_str) {
            None => Err(ShellError::usage(command, self.usage())),
            Some("-h" | "--help") => Ok(Some(text(RUN_HELP))),
            Some(_) => Ok(None),
        }
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> Result<Outcome> {
        if let Some(outcome) = self.preflight(ctx.command, args)? {
            return Ok(outcome);
        }

        let code = ctx.jobs.run_foreground(args, ctx.session.working_dir())?;
        Ok(match code {
            Some(0) => Outcome::Silent,
            Some(code) => Outcome::line(format!("'{}' exited with status {}", args[0], code)),
            None => Outcome::line(format!("'{}' was terminated by a signal", args[0])),
        })
    }
}

pub struct Quit;

impl CommandHandler for Quit {
    fn usage(&self) -> &str {
        "quit [--all]"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> Result<Outcome> {
        if check_flags(ctx.command, args, &["--all"], self.usage())? == Flags::Help {
            return Ok(text(QUIT_HELP));
        }

        match args {
            [] => {
                let job = ctx.jobs.kill_last()?;
                Ok(Outcome::line(format!(
                    "Job [{}] (pid {}) terminated.",
                    job.id, job.pid
                )))
            }
            [flag] if flag == "--all" => {
                if ctx.jobs.list().is_empty() {
                    return Err(ShellError::NoJobs);
                }
                let report = ctx.jobs.kill_all();
                let mut lines = vec![format!("Terminated {} job(s).", report.count())];
                for (id, reason) in &report.failed {
                    lines.push(format!("Job [{}] could not be terminated: {}", id, reason));
                }
                Ok(Outcome::Lines(lines))
            }
            _ => Err(ShellError::usage(ctx.command, self.usage())),
        }
    }
}

/// Lists jobs after reaping those that exited on their own
pub struct Jobs;

impl CommandHandler for Jobs {
    fn execute(&self, ctx: &mut CommandContext<'_>, _args: &[String]) -> Result<Outcome> {
        ctx.jobs.reap();
        let jobs = ctx.jobs.list();
        if jobs.is_empty() {
            return Ok(Outcome::line("No background jobs."));
        }

        let now = Utc::now();
        let lines = jobs
            .into_iter()
            .map(|job| {
                let elapsed = (now - job.started_at).num_seconds().max(0);
                format!(
                    "[{}] {:>7}  {:<10}  {:>5}s  {}",
                    job.id, job.pid, job.status, elapsed, job.command_line
                )
            })
            .collect();
        Ok(Outcome::Lines(lines))
    }
}

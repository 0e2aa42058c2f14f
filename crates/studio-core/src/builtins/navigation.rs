//! Working directory and shell control commands

use std::fs;

use crate::dispatch::authorize;
use crate::errors::{io_error, Result, ShellError};
use crate::registry::{CommandContext, CommandHandler, Outcome};

/// Lists the commands the active role may run
pub struct Help;

impl CommandHandler for Help {
    fn execute(&self, ctx: &mut CommandContext<'_>, _args: &[String]) -> Result<Outcome> {
        let role = ctx.session.current_role();
        let visible: Vec<_> = ctx
            .registry
            .list_for(role)
            .into_iter()
            .filter(|c| authorize(ctx.hierarchy, ctx.session, c).is_ok())
            .collect();

        let mut lines = vec![format!("Available commands for role: {}", role)];
        let width = visible.iter().map(|c| c.name.len()).max().unwrap_or(0);
        for command in visible {
            lines.push(format!(
                "  {:<width$}  {}  ({})",
                command.name,
                command.description,
                command.usage(),
                width = width
            ));
        }
        Ok(Outcome::Lines(lines))
    }
}

/// Prints the working directory (`pwd` and `ll`)
pub struct Pwd;

impl CommandHandler for Pwd {
    fn execute(&self, ctx: &mut CommandContext<'_>, _args: &[String]) -> Result<Outcome> {
        Ok(Outcome::line(ctx.session.working_dir().display().to_string()))
    }
}

pub struct Ls;

impl CommandHandler for Ls {
    fn execute(&self, ctx: &mut CommandContext<'_>, _args: &[String]) -> Result<Outcome> {
        let mut names = Vec::new();
        for entry in fs::read_dir(ctx.session.working_dir()).map_err(|e| io_error("ls", e))? {
            let entry = entry.map_err(|e| io_error("ls", e))?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(Outcome::Lines(names))
    }
}

/// Lists sub-directories only
pub struct Dir;

impl CommandHandler for Dir {
    fn execute(&self, ctx: &mut CommandContext<'_>, _args: &[String]) -> Result<Outcome> {
        let mut names = Vec::new();
        for entry in fs::read_dir(ctx.session.working_dir()).map_err(|e| io_error("dir", e))? {
            let entry = entry.map_err(|e| io_error("dir", e))?;
            if entry.path().is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        if names.is_empty() {
            return Ok(Outcome::line("No subfolders found."));
        }
        names.sort();
        Ok(Outcome::Lines(names))
    }
}

pub struct Cd;

impl CommandHandler for Cd {
    fn usage(&self) -> &str {
        "cd <directory>"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> Result<Outcome> {
        let target = args
            .first()
            .ok_or_else(|| ShellError::usage(ctx.command, self.usage()))?;
        ctx.session.change_directory(target)?;
        Ok(Outcome::Silent)
    }
}

pub struct Clear;

impl CommandHandler for Clear {
    fn execute(&self, _ctx: &mut CommandContext<'_>, _args: &[String]) -> Result<Outcome> {
        Ok(Outcome::ClearScreen)
    }
}

pub struct Exit;

impl CommandHandler for Exit {
    fn execute(&self, _ctx: &mut CommandContext<'_>, _args: &[String]) -> Result<Outcome> {
        Ok(Outcome::Exit)
    }
}

//! Built-in command set
//!
//! Every handler the shell ships with is registered here at startup. A
//! failure to register is the one fatal startup error.

mod navigation;
mod process;
mod users;

pub use navigation::{Cd, Clear, Dir, Exit, Help, Ls, Pwd};
pub use process::{Jobs, Quit, Run};
pub use users::{Assign, RoleSwitch, ShowUser, WhoAmI};

use crate::errors::{Result, ShellError};
use crate::registry::{CommandRegistry, Outcome};
use crate::role::Role;

/// Register the full built-in command set
///
/// # Errors
///
/// Returns `DuplicateCommand` if `registry` already holds one of the names.
pub fn register_all(registry: &mut CommandRegistry) -> Result<()> {
    let artist = Role::Artist.as_str();

    registry.register("help", artist, Help, "Displays all the available commands.")?;
    registry.register(
        "ll",
        artist,
        Pwd,
        "Displays the current location of the shell.",
    )?;
    registry.register("pwd", artist, Pwd, "Prints the current working directory.")?;
    registry.register("ls", artist, Ls, "Displays all the files in the current directory.")?;
    registry.register(
        "dir",
        artist,
        Dir,
        "Displays all the subfolders in the current directory.",
    )?;
    registry.register("cd", artist, Cd, "Changes into the specified directory.")?;
    registry.register("clear", artist, Clear, "Clears the terminal screen.")?;
    registry.register("exit", artist, Exit, "Exits the shell.")?;
    registry.register("jobs", artist, Jobs, "Lists background jobs of this session.")?;
    registry.register("quit", artist, Quit, "Terminates background jobs. Use -h for details.")?;
    registry.register(
        "run",
        Role::Rnd.as_str(),
        Run,
        "Runs a program; append & to run it in the background.",
    )?;
    registry.register("whoami", artist, WhoAmI, "Shows your user id and roles.")?;
    registry.register(
        "showuser",
        Role::Supe.as_str(),
        ShowUser,
        "Shows all existing users and their assigned roles.",
    )?;
    registry.register(
        "assign",
        Role::Master.as_str(),
        Assign,
        "Assigns a role to a user. Use -h for details.",
    )?;
    for role in Role::ALL {
        registry.register(
            role.as_str(),
            artist,
            RoleSwitch(role),
            &format!("Switches the active role to {}.", role),
        )?;
    }

    registry.alias("cls", "clear")?;
    Ok(())
}

/// Result of checking a handler's flags
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Flags {
    Help,
    Proceed,
}

/// Reject flags outside `valid` and detect a help request
///
/// Tokens not starting with `-` are positional and never rejected.
pub(crate) fn check_flags(
    command: &str,
    args: &[String],
    valid: &[&str],
    usage: &str,
) -> Result<Flags> {
    if args.iter().any(|a| a == "-h" || a == "--help") {
        return Ok(Flags::Help);
    }
    if let Some(unknown) = args
        .iter()
        .find(|a| a.starts_with('-') && !valid.contains(&a.as_str()))
    {
        tracing::debug!(command, flag = %unknown, "unknown flag");
        return Err(ShellError::usage(command, usage));
    }
    Ok(Flags::Proceed)
}

/// Render a block of help text line by line
pub(crate) fn text(block: &str) -> Outcome {
    Outcome::Lines(block.lines().map(str::to_string).collect())
}

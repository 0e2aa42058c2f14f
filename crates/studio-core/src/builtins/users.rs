//! Identity and role administration commands

use std::str::FromStr;

use super::{check_flags, text, Flags};
use crate::errors::{Result, ShellError};
use crate::registry::{CommandContext, CommandHandler, Outcome};
use crate::role::Role;

const ASSIGN_HELP: &str = "\
assign - sets the persisted role of a user

Synopsis:
    assign <user_id> --role <role>
    assign -h | --help

Roles, lowest first: artist, supe, pipe, rnd, master.
Example:
    assign 4d8d28d3a1b2 --role artist";

pub struct WhoAmI;

impl CommandHandler for WhoAmI {
    fn execute(&self, ctx: &mut CommandContext<'_>, _args: &[String]) -> Result<Outcome> {
        let session = &*ctx.session;
        Ok(Outcome::Lines(vec![
            format!("User ID:       {}", session.user_id()),
            format!("Assigned role: {}", session.assigned_role()),
            format!("Active role:   {}", session.current_role()),
        ]))
    }
}

/// Table of every user in the users configuration
pub struct ShowUser;

impl CommandHandler for ShowUser {
    fn usage(&self) -> &str {
        "showuser"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> Result<Outcome> {
        if check_flags(ctx.command, args, &[], self.usage())? == Flags::Help {
            return Ok(text("showuser - displays all existing users and their assigned roles"));
        }
        if ctx.users.is_empty() {
            return Ok(Outcome::line("No users found."));
        }

        let width = ctx.users.iter().map(|(u, _)| u.len()).max().unwrap_or(0).max(7);
        let mut lines = vec![format!("{:<width$}  Assigned Role", "User ID", width = width)];
        lines.extend(
            ctx.users
                .iter()
                .map(|(user, role)| format!("{:<width$}  {}", user, role, width = width)),
        );
        Ok(Outcome::Lines(lines))
    }
}

pub struct Assign;

impl CommandHandler for Assign {
    fn usage(&self) -> &str {
        "assign <user_id> --role <role>"
    }

    fn execute(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> Result<Outcome> {
        if check_flags(ctx.command, args, &["--role"], self.usage())? == Flags::Help {
            return Ok(text(ASSIGN_HELP));
        }

        let (user_id, role_name) = match args {
            [user, flag, role] if flag == "--role" && !user.starts_with('-') => (user, role),
            _ => return Err(ShellError::usage(ctx.command, self.usage())),
        };
        let role = Role::from_str(role_name)?;

        ctx.users.assign(user_id, role)?;
        if user_id == ctx.session.user_id() {
            ctx.session.reassign(role);
        }
        Ok(Outcome::line(format!(
            "Successfully assigned role '{}' to user '{}'.",
            role, user_id
        )))
    }
}

/// Switches the active role; registered once per role under the role's name
pub struct RoleSwitch(pub Role);

impl CommandHandler for RoleSwitch {
    fn execute(&self, ctx: &mut CommandContext<'_>, _args: &[String]) -> Result<Outcome> {
        ctx.session.switch_role(self.0)?;
        Ok(Outcome::line(format!("Switched to {} role.", self.0)))
    }
}

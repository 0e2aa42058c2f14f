//! Line loop around the dispatcher
//!
//! Outcomes go to `out`, errors and configuration warnings to `err`. The
//! loop ends on `exit` or end of input; no error ends it early.

use std::io::{self, BufRead, Write};

use studio_core::{Dispatcher, Outcome, Role, Session};

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

pub fn run<R, W, E>(
    dispatcher: &mut Dispatcher,
    warnings: &[String],
    mut input: R,
    mut out: W,
    mut err: E,
) -> io::Result<()>
where
    R: BufRead,
    W: Write,
    E: Write,
{
    for warning in warnings {
        writeln!(err, "Warning: {}", warning)?;
    }
    writeln!(out, "{}", role_banner(dispatcher.session()))?;

    let mut buf = Vec::new();
    loop {
        write!(out, "{}", dispatcher.session().prompt())?;
        out.flush()?;

        buf.clear();
        if input.read_until(b'\n', &mut buf)? == 0 {
            writeln!(out)?;
            break;
        }
        let line = match std::str::from_utf8(trim_newline(&buf)) {
            Ok(line) => line,
            Err(e) => {
                writeln!(err, "Error: input line is not valid UTF-8: {}", e)?;
                err.flush()?;
                continue;
            }
        };
        match dispatcher.dispatch(line) {
            Ok(Outcome::Exit) => break,
            Ok(outcome) => render(&mut out, &outcome)?,
            Err(e) => {
                writeln!(err, "Error: {}", e)?;
                err.flush()?;
            }
        }
    }

    writeln!(out, "Exiting terminal. Goodbye!")?;
    out.flush()
}

fn trim_newline(bytes: &[u8]) -> &[u8] {
    let bytes = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    bytes.strip_suffix(b"\r").unwrap_or(bytes)
}

/// Greeting shown once, telling the user whether role switching is open
pub fn role_banner(session: &Session) -> String {
    match session.assigned_role() {
        Role::Master => "You have the master role. You can switch to any role.".to_string(),
        role => format!("Your assigned role is {}. You cannot switch roles.", role),
    }
}

fn render<W: Write>(out: &mut W, outcome: &Outcome) -> io::Result<()> {
    match outcome {
        Outcome::Silent | Outcome::Exit => Ok(()),
        Outcome::Lines(lines) => {
            for line in lines {
                writeln!(out, "{}", line)?;
            }
            Ok(())
        }
        Outcome::ClearScreen => write!(out, "{}", CLEAR_SCREEN),
    }
}

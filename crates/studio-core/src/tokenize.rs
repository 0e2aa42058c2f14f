//! Input line tokenization
//!
//! Lines are split with POSIX shell quoting rules through `shlex`. The
//! background marker is a trailing `&` that stands alone after whitespace
//! and was neither quoted nor escaped.

use crate::errors::{Result, ShellError};

/// Trailing token that sends a command to the job manager
pub const BACKGROUND_MARKER: &str = "&";

/// A tokenized, non-empty input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    /// First token, lowercased
    pub command: String,
    /// Remaining tokens, passed through unmodified
    pub args: Vec<String>,
    pub background: bool,
}

/// Split a line into tokens
///
/// # Errors
///
/// Returns `Parse` on an unterminated quote or a dangling escape.
pub fn tokenize(line: &str) -> Result<Vec<String>> {
    shlex::split(line).ok_or_else(|| ShellError::Parse {
        reason: "unterminated quote or trailing escape".to_string(),
    })
}

/// The raw line ends in a bare `&` preceded by whitespace
fn ends_with_marker(line: &str) -> bool {
    let trimmed = line.trim_end();
    match trimmed.strip_suffix(BACKGROUND_MARKER) {
        Some("") => true,
        Some(rest) => rest.ends_with(char::is_whitespace),
        None => false,
    }
}

/// Tokenize a line and split off the command name and background marker
///
/// Returns `None` for blank input.
///
/// # Errors
///
/// Returns `Parse` on bad quoting or a marker with no command.
pub fn parse_line(line: &str) -> Result<Option<ParsedLine>> {
    let mut tokens = tokenize(line)?;

    // `"&"` and `\&` both leave a bare `&` token, so the raw text decides
    let background = ends_with_marker(line)
        && tokens.last().map(String::as_str) == Some(BACKGROUND_MARKER);
    if background {
        tokens.pop();
        if tokens.is_empty() {
            return Err(ShellError::Parse {
                reason: "missing command before '&'".to_string(),
            });
        }
    }

    let mut iter = tokens.into_iter();
    let Some(first) = iter.next() else {
        return Ok(None);
    };

    Ok(Some(ParsedLine {
        command: first.to_lowercase(),
        args: iter.collect(),
        background,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(line: &str) -> Vec<String> {
        tokenize(line).unwrap()
    }

    #[test]
    fn test_plain_split() {
        assert_eq!(texts("ls  -l\t/tmp"), vec!["ls", "-l", "/tmp"]);
    }

    #[test]
    fn test_quoted_whitespace_is_one_token() {
        assert_eq!(
            texts(r#"run "my program" --flag"#),
            vec!["run", "my program", "--flag"]
        );
        assert_eq!(texts("cd 'Shot 010'"), vec!["cd", "Shot 010"]);
    }

    #[test]
    fn test_adjacent_segments_join() {
        assert_eq!(texts(r#"a"b c"d"#), vec!["ab cd"]);
    }

    #[test]
    fn test_escapes() {
        assert_eq!(texts(r#"echo "say \"hi\"""#), vec!["echo", r#"say "hi""#]);
        assert_eq!(texts(r"cd Shot\ 010"), vec!["cd", "Shot 010"]);
        assert_eq!(texts(r#""C:\path""#), vec![r"C:\path"]);
    }

    #[test]
    fn test_empty_quotes_produce_empty_token() {
        assert_eq!(texts(r#"run echo """#), vec!["run", "echo", ""]);
    }

    #[test]
    fn test_unterminated_quote_is_parse_error() {
        let err = tokenize("run \"oops").unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::Parse);
        assert!(tokenize("run 'oops").is_err());
    }

    #[test]
    fn test_blank_line() {
        assert_eq!(parse_line("   ").unwrap(), None);
        assert_eq!(parse_line("").unwrap(), None);
    }

    #[test]
    fn test_background_marker_detected() {
        let parsed = parse_line("run blender -b &").unwrap().unwrap();
        assert!(parsed.background);
        assert_eq!(parsed.command, "run");
        assert_eq!(parsed.args, vec!["blender", "-b"]);

        let padded = parse_line("run blender\t&  ").unwrap().unwrap();
        assert!(padded.background);
    }

    #[test]
    fn test_quoted_marker_is_argument() {
        let parsed = parse_line("run echo \"&\"").unwrap().unwrap();
        assert!(!parsed.background);
        assert_eq!(parsed.args, vec!["echo", "&"]);

        let single = parse_line("run echo '&'").unwrap().unwrap();
        assert!(!single.background);

        let escaped = parse_line(r"run echo \&").unwrap().unwrap();
        assert!(!escaped.background);
        assert_eq!(escaped.args, vec!["echo", "&"]);
    }

    #[test]
    fn test_escaped_space_before_marker_is_not_background() {
        let parsed = parse_line(r"run touch a\ &").unwrap().unwrap();
        assert!(!parsed.background);
        assert_eq!(parsed.args, vec!["touch", "a &"]);
    }

    #[test]
    fn test_attached_marker_is_not_background() {
        let parsed = parse_line("run sleep 5&").unwrap().unwrap();
        assert!(!parsed.background);
        assert_eq!(parsed.args, vec!["sleep", "5&"]);
    }

    #[test]
    fn test_marker_alone_is_parse_error() {
        assert!(parse_line("&").is_err());
    }

    #[test]
    fn test_command_is_lowercased_args_are_not() {
        let parsed = parse_line("QUIT --ALL").unwrap().unwrap();
        assert_eq!(parsed.command, "quit");
        assert_eq!(parsed.args, vec!["--ALL"]);
    }
}

//! Interactive session commands
//!
//! Input lines starting with `:` control the session; every other line is a
//! manually entered identifier.

use strum_macros::Display;

#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum SessionCommand {
    Pause,
    Resume,
    Delete(String),
    Unvalidate(String),
    List,
    Finish,
    Help,
}

/// What one line of operator input means
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputLine {
    Blank,
    Identifier(String),
    Command(SessionCommand),
}

/// Classify a line of operator input
///
/// Unknown commands and missing arguments are reported as an error message
/// for the operator.
pub fn parse_line(line: &str) -> Result<InputLine, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(InputLine::Blank);
    }
    let Some(command) = trimmed.strip_prefix(':') else {
        return Ok(InputLine::Identifier(trimmed.to_string()));
    };

    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or_default().to_ascii_lowercase();
    let argument = parts.next().map(str::to_string);
    if parts.next().is_some() {
        return Err(format!("':{}' takes at most one argument", name));
    }

    let needs_argument = |build: fn(String) -> SessionCommand| {
        argument
            .clone()
            .map(build)
            .ok_or_else(|| format!("':{}' needs an argument", name))
    };

    let parsed = match name.as_str() {
        "pause" => SessionCommand::Pause,
        "resume" => SessionCommand::Resume,
        "delete" | "del" => needs_argument(SessionCommand::Delete)?,
        "unvalidate" => needs_argument(SessionCommand::Unvalidate)?,
        "list" | "ls" => SessionCommand::List,
        "finish" | "quit" | "q" => SessionCommand::Finish,
        "help" | "h" | "?" => SessionCommand::Help,
        other => return Err(format!("Unknown command ':{}' (try :help)", other)),
    };
    Ok(InputLine::Command(parsed))
}

pub const HELP_TEXT: &str = "\
:pause               stop taking scans
:resume              take scans again
:delete <ledger-id>  remove an accepted scan
:unvalidate <id>     revert a validated id
:list                show the session
:finish              end the session";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifiers_and_blanks() {
        assert_eq!(parse_line("   "), Ok(InputLine::Blank));
        assert_eq!(
            parse_line(" https://tier.app/AB123 \n"),
            Ok(InputLine::Identifier("https://tier.app/AB123".to_string()))
        );
    }

    #[test]
    fn test_commands() {
        assert_eq!(parse_line(":pause"), Ok(InputLine::Command(SessionCommand::Pause)));
        assert_eq!(parse_line(":RESUME"), Ok(InputLine::Command(SessionCommand::Resume)));
        assert_eq!(
            parse_line(":delete scan-4"),
            Ok(InputLine::Command(SessionCommand::Delete("scan-4".to_string())))
        );
        assert_eq!(
            parse_line(":unvalidate AB123"),
            Ok(InputLine::Command(SessionCommand::Unvalidate("AB123".to_string())))
        );
        assert_eq!(parse_line(":q"), Ok(InputLine::Command(SessionCommand::Finish)));
    }

    #[test]
    fn test_command_errors() {
        assert!(parse_line(":delete").unwrap_err().contains("needs an argument"));
        assert!(parse_line(":delete a b").unwrap_err().contains("at most one"));
        assert!(parse_line(":launch").unwrap_err().contains("Unknown command"));
    }
}

use std::fmt;

/// One line of console input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // Navigation
    Push(String),
    Replace(String),
    Open(String),
    Wizard,
    Next,
    Prev,
    Back,

    // View
    Type(String),
    Show,

    // Host
    Save,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    Empty,
    Unknown(String),
    MissingArgument(&'static str),
    UnexpectedArgument(&'static str),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Empty => write!(f, "empty command"),
            ParseError::Unknown(word) => write!(f, "unknown command: {word} (try `help`)"),
            ParseError::MissingArgument(cmd) => write!(f, "`{cmd}` needs an argument"),
            ParseError::UnexpectedArgument(cmd) => write!(f, "`{cmd}` takes no argument"),
        }
    }
}

impl std::error::Error for ParseError {}

pub const HELP: &str = "\
commands:
  push <title>     push a page onto the current page stack
  replace <title>  replace the current page
  open <title>     open a new page stack on top
  wizard           start the onboarding wizard
  next | prev      move through the wizard
  back             go back
  type <text>      set the draft of the current page
  show             print the navigation hierarchy
  save             write a snapshot
  help             print this help
  quit             save and exit";

/// Parses one input line. Leading and trailing whitespace is ignored; the
/// argument of `type` keeps its inner spacing.
pub fn parse(line: &str) -> Result<Command, ParseError> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let with_arg = |name: &'static str, make: fn(String) -> Command| {
        if rest.is_empty() {
            Err(ParseError::MissingArgument(name))
        } else {
            Ok(make(rest.to_string()))
        }
    };
    let bare = |name: &'static str, command: Command| {
        if rest.is_empty() {
            Ok(command)
        } else {
            Err(ParseError::UnexpectedArgument(name))
        }
    };

    match word {
        "" => Err(ParseError::Empty),
        "push" => with_arg("push", Command::Push),
        "replace" => with_arg("replace", Command::Replace),
        "open" => with_arg("open", Command::Open),
        "type" => Ok(Command::Type(rest.to_string())),
        "wizard" => bare("wizard", Command::Wizard),
        "next" => bare("next", Command::Next),
        "prev" => bare("prev", Command::Prev),
        "back" => bare("back", Command::Back),
        "show" => bare("show", Command::Show),
        "save" => bare("save", Command::Save),
        "help" | "?" => bare("help", Command::Help),
        "quit" | "exit" => bare("quit", Command::Quit),
        other => Err(ParseError::Unknown(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands_with_arguments() {
        assert_eq!(parse("push inbox"), Ok(Command::Push("inbox".to_string())));
        assert_eq!(
            parse("  open   my settings  "),
            Ok(Command::Open("my settings".to_string()))
        );
        assert_eq!(
            parse("type hello  world"),
            Ok(Command::Type("hello  world".to_string()))
        );
    }

    #[test]
    fn test_type_without_text_clears_draft() {
        assert_eq!(parse("type"), Ok(Command::Type(String::new())));
    }

    #[test]
    fn test_parse_bare_commands_and_aliases() {
        assert_eq!(parse("next"), Ok(Command::Next));
        assert_eq!(parse("?"), Ok(Command::Help));
        assert_eq!(parse("exit"), Ok(Command::Quit));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse("   "), Err(ParseError::Empty));
        assert_eq!(parse("push"), Err(ParseError::MissingArgument("push")));
        assert_eq!(parse("back now"), Err(ParseError::UnexpectedArgument("back")));
        assert_eq!(parse("fly"), Err(ParseError::Unknown("fly".to_string())));
    }

    #[test]
    fn test_error_messages_point_at_help() {
        let message = ParseError::Unknown("fly".to_string()).to_string();
        assert!(message.contains("help"));
    }
}

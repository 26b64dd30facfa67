//! Available commands, autocomplete and parsing

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
  Refresh,
  New,
  Login,
  Logout,
  Quit,
}

#[derive(Debug, Clone)]
pub struct Command {
  pub kind: CommandKind,
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
  /// Whether the command expects an argument after its name
  pub takes_argument: bool,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    kind: CommandKind::Refresh,
    name: "refresh",
    aliases: &["r", "reload"],
    description: "Fetch the example list again",
    takes_argument: false,
  },
  Command {
    kind: CommandKind::New,
    name: "new",
    aliases: &["n", "create", "add"],
    description: "Open the new example form",
    takes_argument: false,
  },
  Command {
    kind: CommandKind::Login,
    name: "login",
    aliases: &["token"],
    description: "Set the bearer token: login <token>",
    takes_argument: true,
  },
  Command {
    kind: CommandKind::Logout,
    name: "logout",
    aliases: &[],
    description: "Forget the bearer token",
    takes_argument: false,
  },
  Command {
    kind: CommandKind::Quit,
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit exemplar",
    takes_argument: false,
  },
];

/// A command line resolved to a command and its (possibly empty) argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
  pub kind: CommandKind,
  pub argument: String,
}

/// Split input into the command word and the rest
fn split_input(input: &str) -> (&str, &str) {
  let input = input.trim_start();
  match input.split_once(char::is_whitespace) {
    Some((word, rest)) => (word, rest.trim()),
    None => (input, ""),
  }
}

/// Get autocomplete suggestions for the command word of `input`
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let (word, _) = split_input(input);
  let word = word.to_lowercase();

  if word.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = COMMANDS
    .iter()
    .filter_map(|cmd| match_priority(cmd, &word).map(|p| (cmd, p)))
    .collect();

  // Sort by priority (stable, so table order breaks ties)
  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

/// Lower is better; `None` means no match
fn match_priority(cmd: &Command, word: &str) -> Option<u32> {
  if cmd.name == word {
    Some(0)
  } else if cmd.aliases.contains(&word) {
    Some(1)
  } else if cmd.name.starts_with(word) {
    Some(2)
  } else if cmd.aliases.iter().any(|a| a.starts_with(word)) {
    Some(3)
  } else if cmd.name.contains(word) {
    Some(4)
  } else {
    None
  }
}

/// Why a command line could not be run
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
  #[error("Unknown command: {0}")]
  Unknown(String),
  #[error("Usage: {0} <argument>")]
  MissingArgument(&'static str),
  #[error("{0} takes no argument")]
  UnexpectedArgument(&'static str),
}

/// Resolve a command line, using the suggestion at `selected` for the command
/// word, and check the argument against what the command expects.
pub fn parse(input: &str, selected: usize) -> Result<ParsedCommand, CommandError> {
  let (word, argument) = split_input(input);
  let suggestions = get_suggestions(input);
  let cmd = suggestions
    .get(selected)
    .or_else(|| suggestions.first())
    .ok_or_else(|| CommandError::Unknown(word.to_string()))?;

  match (cmd.takes_argument, argument.is_empty()) {
    (true, true) => Err(CommandError::MissingArgument(cmd.name)),
    (false, false) => Err(CommandError::UnexpectedArgument(cmd.name)),
    _ => Ok(ParsedCommand {
      kind: cmd.kind,
      argument: argument.to_string(),
    }),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_input_returns_all() {
    let suggestions = get_suggestions("");
    assert_eq!(suggestions.len(), COMMANDS.len());
  }

  #[test]
  fn test_exact_and_alias_match() {
    assert_eq!(get_suggestions("refresh")[0].name, "refresh");
    assert_eq!(get_suggestions("add")[0].name, "new");
    assert_eq!(get_suggestions("q")[0].name, "quit");
  }

  #[test]
  fn test_prefix_match_prefers_name_order() {
    let suggestions = get_suggestions("lo");
    let names: Vec<&str> = suggestions.iter().map(|c| c.name).collect();
    assert_eq!(names, vec!["login", "logout"]);
  }

  #[test]
  fn test_suggestions_ignore_arguments() {
    assert_eq!(get_suggestions("login abc123")[0].name, "login");
  }

  #[test]
  fn test_parse_keeps_argument() {
    let parsed = parse("login   abc123 ", 0).unwrap();
    assert_eq!(parsed.kind, CommandKind::Login);
    assert_eq!(parsed.argument, "abc123");
  }

  #[test]
  fn test_parse_uses_selected_suggestion() {
    let parsed = parse("lo", 1).unwrap();
    assert_eq!(parsed.kind, CommandKind::Logout);
  }

  #[test]
  fn test_parse_unknown_command() {
    assert_eq!(
      parse("frobnicate now", 0),
      Err(CommandError::Unknown("frobnicate".to_string()))
    );
  }

  #[test]
  fn test_parse_checks_argument_presence() {
    assert_eq!(parse("login", 0), Err(CommandError::MissingArgument("login")));
    assert_eq!(
      parse("refresh please", 0),
      Err(CommandError::UnexpectedArgument("refresh"))
    );
    assert_eq!(
      parse("login", 0).unwrap_err().to_string(),
      "Usage: login <argument>"
    );
  }
}

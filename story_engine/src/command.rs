//! Line-oriented commands for the interactive storyteller.
//!
//! Part and choice numbers are typed 1-based, the way they are shown, and
//! converted to 0-based indices here.

use std::path::PathBuf;

use story_graph::{ChoiceIndex, PartIndex};
use thiserror::Error;

/// Errors from reading a command line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command \"{0}\", type \"help\" for a list")]
    Unknown(String),

    #[error("\"{command}\" needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("\"{0}\" is not a number from 1 up")]
    InvalidNumber(String),
}

/// One thing the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Parts,
    AddPart,
    RemovePart(PartIndex),
    Rename(PartIndex, String),
    Text(PartIndex, String),
    AddChoice(PartIndex),
    RemoveChoice(PartIndex, ChoiceIndex),
    ChoiceText(PartIndex, ChoiceIndex, String),
    Target(PartIndex, ChoiceIndex, PartIndex),
    Validate,
    Play,
    Choose(ChoiceIndex),
    Replay,
    History,
    Export(PathBuf),
    Import(PathBuf),
    Reset,
    Dark,
    Help,
    Quit,
}

pub const HELP: &str = "\
Editing:
  parts                          list every part and its choices
  add-part                       add a new part
  remove-part <part>             remove a part
  rename <part> <name>           rename a part
  text <part> <text>             set the text of a part
  add-choice <part>              add a choice to a part
  remove-choice <part> <choice>  remove a choice
  choice-text <part> <choice> <text>
                                 set the label of a choice
  target <part> <choice> <next>  set where a choice leads
  validate                       check the story for problems
Playing:
  play                           start playing from the first part
  <choice> | choose <choice>     take a choice
  replay                         play again from the start
  history                        show the route taken so far
Story:
  export <file>                  write the story as JSON
  import <file>                  replace the story with a JSON file
  reset                          start a new empty story
  dark                           toggle dark mode
  help, quit";

impl Command {
    /// Parse one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest),
            None => (line, ""),
        };
        let mut args = Args { rest };

        let command = match name.to_lowercase().as_str() {
            "parts" | "ls" => Command::Parts,
            "add-part" => Command::AddPart,
            "remove-part" => Command::RemovePart(args.index("remove-part", "a part number")?),
            "rename" => Command::Rename(
                args.index("rename", "a part number")?,
                args.text("rename", "a new name")?,
            ),
            "text" => Command::Text(args.index("text", "a part number")?, args.rest()),
            "add-choice" => Command::AddChoice(args.index("add-choice", "a part number")?),
            "remove-choice" => Command::RemoveChoice(
                args.index("remove-choice", "a part number")?,
                args.index("remove-choice", "a choice number")?,
            ),
            "choice-text" => Command::ChoiceText(
                args.index("choice-text", "a part number")?,
                args.index("choice-text", "a choice number")?,
                args.rest(),
            ),
            "target" => Command::Target(
                args.index("target", "a part number")?,
                args.index("target", "a choice number")?,
                args.index("target", "the number of the next part")?,
            ),
            "validate" | "check" => Command::Validate,
            "play" => Command::Play,
            "choose" => Command::Choose(args.index("choose", "a choice number")?),
            "replay" => Command::Replay,
            "history" => Command::History,
            "export" | "save" => Command::Export(PathBuf::from(args.text("export", "a file path")?)),
            "import" | "load" => Command::Import(PathBuf::from(args.text("import", "a file path")?)),
            "reset" => Command::Reset,
            "dark" => Command::Dark,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => match parse_index(other) {
                Ok(choice) => Command::Choose(choice),
                Err(_) => return Err(CommandError::Unknown(other.to_string())),
            },
        };
        Ok(Some(command))
    }
}

struct Args<'a> {
    rest: &'a str,
}

impl<'a> Args<'a> {
    fn next_token(&mut self) -> Option<&'a str> {
        let trimmed = self.rest.trim_start();
        if trimmed.is_empty() {
            return None;
        }
        let (token, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((token, rest)) => (token, rest),
            None => (trimmed, ""),
        };
        self.rest = rest;
        Some(token)
    }

    fn index(
        &mut self,
        command: &'static str,
        argument: &'static str,
    ) -> Result<usize, CommandError> {
        let token = self
            .next_token()
            .ok_or(CommandError::MissingArgument { command, argument })?;
        parse_index(token)
    }

    /// The remainder of the line, which may be empty.
    fn rest(&mut self) -> String {
        std::mem::take(&mut self.rest).trim().to_string()
    }

    /// The remainder of the line, which must not be empty.
    fn text(&mut self, command: &'static str, argument: &'static str) -> Result<String, CommandError> {
        let text = self.rest();
        if text.is_empty() {
            return Err(CommandError::MissingArgument { command, argument });
        }
        Ok(text)
    }
}

/// Turn a 1-based number into a 0-based index.
fn parse_index(token: &str) -> Result<usize, CommandError> {
    match token.parse::<usize>() {
        Ok(number) if number >= 1 => Ok(number - 1),
        _ => Err(CommandError::InvalidNumber(token.to_string())),
    }
}

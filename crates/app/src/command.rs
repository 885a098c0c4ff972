use std::fmt;

use gym_core::model::{ModuleId, Phase, ScenarioId};

/// One line of learner input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Dashboard,
    Modules,
    /// Principle reference, optionally for one module.
    Reference(Option<ModuleId>),
    Open {
        module: ModuleId,
        phase: Phase,
        scenario: Option<ScenarioId>,
    },
    Pick(String),
    Submit,
    Write(String),
    Again,
    Say(String),
    Retry,
    Close,
    Quit,
}

#[derive(Debug, PartialEq, Eq)]
pub enum CommandError {
    Empty,
    Unknown(String),
    MissingArgument { command: &'static str, argument: &'static str },
    InvalidPhase(String),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Empty => write!(f, "type a command, or `help`"),
            CommandError::Unknown(word) => write!(f, "unknown command: {word}"),
            CommandError::MissingArgument { command, argument } => {
                write!(f, "{command} needs {argument}")
            }
            CommandError::InvalidPhase(raw) => write!(f, "phase must be 1, 2 or 3, got {raw}"),
        }
    }
}

impl std::error::Error for CommandError {}

impl Command {
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(w, r)| (w, r.trim()));
        match word {
            "" => Err(CommandError::Empty),
            "help" | "?" => Ok(Self::Help),
            "dash" | "dashboard" => Ok(Self::Dashboard),
            "modules" => Ok(Self::Modules),
            "ref" | "reference" => Ok(Self::Reference(
                rest.split_whitespace().next().map(ModuleId::new),
            )),
            "open" => parse_open(rest),
            "pick" => non_empty(rest, "pick", "an option id").map(Self::Pick),
            "submit" => Ok(Self::Submit),
            "write" => non_empty(rest, "write", "your response").map(Self::Write),
            "again" => Ok(Self::Again),
            "say" => non_empty(rest, "say", "what you say").map(Self::Say),
            "retry" => Ok(Self::Retry),
            "close" => Ok(Self::Close),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(CommandError::Unknown(other.to_owned())),
        }
    }
}

fn non_empty(
    rest: &str,
    command: &'static str,
    argument: &'static str,
) -> Result<String, CommandError> {
    if rest.is_empty() {
        return Err(CommandError::MissingArgument { command, argument });
    }
    Ok(rest.to_owned())
}

fn parse_open(rest: &str) -> Result<Command, CommandError> {
    let mut parts = rest.split_whitespace();
    let module = parts.next().ok_or(CommandError::MissingArgument {
        command: "open",
        argument: "a module id",
    })?;
    let raw_phase = parts.next().ok_or(CommandError::MissingArgument {
        command: "open",
        argument: "a phase number",
    })?;
    let phase = raw_phase
        .parse::<u8>()
        .ok()
        .and_then(|n| Phase::from_number(n).ok())
        .ok_or_else(|| CommandError::InvalidPhase(raw_phase.to_owned()))?;
    Ok(Command::Open {
        module: ModuleId::new(module),
        phase,
        scenario: parts.next().map(ScenarioId::new),
    })
}

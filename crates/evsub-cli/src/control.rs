//! Interactive control commands read from stdin.

use std::fmt;
use std::str::FromStr;

use crate::error::CliError;

/// One line of interactive input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    /// Switch to another locator.
    Url(String),
    /// Listen for another event type.
    Event(String),
    /// Connect if disabled.
    Enable,
    /// Disconnect, keeping the last payload.
    Disable,
    /// Reconnect with a fresh options value.
    Reload,
    /// Print the current state.
    Status,
    /// Tear down and exit.
    Quit,
}

impl FromStr for ControlCommand {
    type Err = CliError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(word, rest)| (word, rest.trim()));

        let argument = |what: &str| {
            if rest.is_empty() {
                Err(CliError::Arguments(format!("'{word}' requires {what}")))
            } else {
                Ok(rest.to_string())
            }
        };
        let bare = |command: Self| {
            if rest.is_empty() {
                Ok(command)
            } else {
                Err(CliError::Arguments(format!("'{word}' takes no argument")))
            }
        };

        match word.to_ascii_lowercase().as_str() {
            "url" => argument("a locator").map(Self::Url),
            "event" => argument("an event type").map(Self::Event),
            "enable" => bare(Self::Enable),
            "disable" => bare(Self::Disable),
            "reload" => bare(Self::Reload),
            "status" => bare(Self::Status),
            "quit" | "exit" => bare(Self::Quit),
            "" => Err(CliError::Arguments("empty command".to_string())),
            other => Err(CliError::Arguments(format!(
                "unknown command '{other}' (try: url, event, enable, disable, reload, status, quit)"
            ))),
        }
    }
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(locator) => write!(f, "url {locator}"),
            Self::Event(event_type) => write!(f, "event {event_type}"),
            Self::Enable => f.write_str("enable"),
            Self::Disable => f.write_str("disable"),
            Self::Reload => f.write_str("reload"),
            Self::Status => f.write_str("status"),
            Self::Quit => f.write_str("quit"),
        }
    }
}

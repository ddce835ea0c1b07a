use super::lexer::words;
use crate::engine::error::CommandError;

/// A parsed command line.
///
/// Parsing only checks arity; values are validated when the command is
/// executed against the state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `set <device> <value>`
    Set { target: String, value: String },

    /// `mode <target> <value>`
    Mode {
        target: Option<String>,
        value: String,
    },

    /// `thermostat <number>`
    Thermostat { value: String },

    /// `status`
    Status,

    /// `help`, and anything unrecognised.
    Help,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let mut args = words(line).into_iter();
        let Some(name) = args.next() else {
            return Ok(Command::Help);
        };

        match name.to_lowercase().as_str() {
            "set" => {
                let target = args.next().ok_or(CommandError::Usage("set <device> <value>"))?;
                let value = args.next().unwrap_or_default().to_lowercase();
                Ok(Command::Set { target, value })
            }
            "mode" => {
                let target = args.next();
                let value = args.next().unwrap_or_default().to_lowercase();
                Ok(Command::Mode { target, value })
            }
            "thermostat" => {
                let value = args.next().ok_or(CommandError::Usage("thermostat <16-30>"))?;
                Ok(Command::Thermostat { value })
            }
            "status" => Ok(Command::Status),
            _ => Ok(Command::Help),
        }
    }
}

//! Console command language.
//!
//! A command line is a whitespace-separated list of words: a command name
//! (case-insensitive) followed by its arguments.
//!
//! ```text
//! set <device> <value>
//! mode city.traffic auto|manual
//! thermostat <16-30>
//! status
//! help
//! ```

mod interpreter;
mod lexer;
mod parser;


pub use interpreter::execute;
pub(crate) use interpreter::thermostat_out_of_range;
pub(crate) use interpreter::thermostat_setpoint;
pub use interpreter::HELP;
pub use lexer::lexer;
pub use lexer::words;
pub use parser::Command;

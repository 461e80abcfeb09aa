//! Command-line argument parsing.

use clap::Parser;
use serde_json::Value;

/// Invokes one method of a provider plugin and prints the call output.
#[derive(Debug, Parser)]
#[command(name = "plugcall", version, about)]
pub(crate) struct Cli {
    /// Plugin method to invoke.
    pub(crate) method: String,
    /// Method arguments, each parsed as JSON and sent as a plain string when
    /// it does not parse. Separate flag-like arguments with `--`.
    #[arg(allow_negative_numbers = true)]
    pub(crate) arguments: Vec<String>,
}

impl Cli {
    pub(crate) fn call_arguments(&self) -> Vec<Value> {
        self.arguments.iter().map(|raw| parse_argument(raw)).collect()
    }
}

/// Reads `raw` as a JSON document, treating anything unparsable as a string.
pub(crate) fn parse_argument(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()))
}

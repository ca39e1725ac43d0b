mod error;
mod lower;
mod parser;
mod token;

pub use error::ParseError;
pub use token::Token;

use drift_ir::Program;

/// Load a textual program into its in-memory CFG form.
///
/// Any [`ParseError`] is fatal to the load; see the error type for the
/// boundary between load failures and information that merely degrades to
/// "unknown" during analysis.
pub fn parse_program(source: &str) -> Result<Program, ParseError> {
    let raw = parser::parse(source)?;
    lower::lower(raw)
}

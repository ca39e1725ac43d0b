/// Error type for program loading failures.
///
/// Every variant is fatal to the load: the analysis never starts on a
/// malformed program. Missing *runtime* information (a variable that is
/// never written, an opcode the value model does not cover) is not a load
/// error — those degrade to "unknown" during analysis instead.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The lexer rejected a character sequence.
    #[error("line {line}: unrecognized token")]
    Lex { line: usize },
    /// A token appeared where the grammar does not allow it.
    #[error("line {line}: expected {expected}, found '{found}'")]
    Unexpected {
        line: usize,
        expected: String,
        found: String,
    },
    /// The input ended mid-production.
    #[error("unexpected end of input, expected {expected}")]
    Eof { expected: String },
    /// A numeric literal survived the lexer but not `f64` conversion.
    #[error("line {line}: malformed number literal '{text}'")]
    BadNumber { line: usize, text: String },
    /// Binary instructions fold two or more operands.
    #[error("line {line}: binary instruction '{mnemonic}' needs at least two operands")]
    TooFewOperands { line: usize, mnemonic: String },
    /// Every block must end in `br` or `ret`.
    #[error("line {line}: block '^{label}' has no terminator")]
    MissingTerminator { line: usize, label: String },
    #[error("line {line}: duplicate block label '^{label}'")]
    DuplicateBlock { line: usize, label: String },
    #[error("line {line}: branch to undefined block '^{label}'")]
    UndefinedBlock { line: usize, label: String },
    /// A temporary destination reuses an existing `%name`.
    #[error("line {line}: redefinition of '%{name}'")]
    Redefinition { line: usize, name: String },
    #[error("procedure '@{name}' has no blocks")]
    EmptyProcedure { name: String },
    #[error("program contains no procedures")]
    Empty,
}

pub use logos::Logos;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r\f]+")]
#[logos(skip(r"//[^\n\r]*", allow_greedy = true))]
#[logos(skip r"/\*([^*]|\*+[^*/])*\*+/")]
pub enum Token<'src> {
    Error,
    /// ```ignore
    /// %<identifier>
    /// ```
    #[regex(r"%[\p{XID_Continue}_$.]+", |lex| &lex.slice()[1..])]
    Value(&'src str),
    /// ```ignore
    /// ^<identifier>
    /// ```
    #[regex(r"\^[\p{XID_Continue}_$.]+", |lex| &lex.slice()[1..])]
    Block(&'src str),
    /// ```ignore
    /// <identifier>
    /// ```
    #[regex(r"[\p{XID_Start}_][\p{XID_Continue}_$.]*")]
    Identifier(&'src str),
    /// ```ignore
    /// @<symbol>
    /// ```
    #[regex(r"@[\p{XID_Continue}_$.]+", |lex| &lex.slice()[1..])]
    Symbol(&'src str),

    #[regex(r"-?[0-9]+(\.[0-9]+)?([eE]-?[0-9]+)?", |lex| lex.slice())]
    Number(&'src str),

    // --- Delimiters & Punctuation ---
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token("=")]
    Equal,
    #[token("->")]
    Arrow,
}

impl std::fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Error => write!(f, "error"),
            Token::Value(name) => write!(f, "%{}", name),
            Token::Block(name) => write!(f, "^{}", name),
            Token::Identifier(name) => write!(f, "{}", name),
            Token::Symbol(name) => write!(f, "@{}", name),
            Token::Number(value) => write!(f, "{}", value),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::Colon => write!(f, ":"),
            Token::Comma => write!(f, ","),
            Token::Equal => write!(f, "="),
            Token::Arrow => write!(f, "->"),
        }
    }
}

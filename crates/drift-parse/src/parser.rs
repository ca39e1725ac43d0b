use logos::Logos;

use crate::error::ParseError;
use crate::token::Token;

#[derive(Debug)]
pub(crate) struct RawProgram<'s> {
    pub procs: Vec<RawProc<'s>>,
}

#[derive(Debug)]
pub(crate) struct RawProc<'s> {
    pub name: &'s str,
    pub blocks: Vec<RawBlock<'s>>,
}

#[derive(Debug)]
pub(crate) struct RawBlock<'s> {
    pub label: &'s str,
    pub line: usize,
    pub instrs: Vec<RawInst<'s>>,
    pub term: RawTerm<'s>,
    pub term_line: usize,
}

#[derive(Debug)]
pub(crate) struct RawInst<'s> {
    pub kind: RawInstKind<'s>,
    pub line: usize,
}

#[derive(Debug)]
pub(crate) enum RawInstKind<'s> {
    Alloc {
        var: &'s str,
    },
    Store {
        src: RawOperand<'s>,
        dest: &'s str,
    },
    Load {
        dest: &'s str,
        src: &'s str,
    },
    Binary {
        dest: &'s str,
        mnemonic: &'s str,
        operands: Vec<RawOperand<'s>>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum RawOperand<'s> {
    Number(f64),
    Name(&'s str),
}

#[derive(Debug)]
pub(crate) enum RawTerm<'s> {
    Branch(Vec<&'s str>),
    Return,
}

/// Tokenize and parse `source` into the raw (unresolved) program form.
pub(crate) fn parse(source: &str) -> Result<RawProgram<'_>, ParseError> {
    let mut tokens = Vec::new();
    for (result, span) in Token::lexer(source).spanned() {
        let line = line_of(source, span.start);
        match result {
            Ok(token) => tokens.push((token, line)),
            Err(()) => return Err(ParseError::Lex { line }),
        }
    }
    Parser { tokens, pos: 0 }.program()
}

fn line_of(source: &str, offset: usize) -> usize {
    source[..offset].bytes().filter(|b| *b == b'\n').count() + 1
}

struct Parser<'s> {
    tokens: Vec<(Token<'s>, usize)>,
    pos: usize,
}

impl<'s> Parser<'s> {
    fn program(mut self) -> Result<RawProgram<'s>, ParseError> {
        let mut procs = Vec::new();
        while self.peek().is_some() {
            procs.push(self.procedure()?);
        }
        if procs.is_empty() {
            return Err(ParseError::Empty);
        }
        Ok(RawProgram { procs })
    }

    fn procedure(&mut self) -> Result<RawProc<'s>, ParseError> {
        self.expect_keyword("proc")?;
        let name = match self.bump() {
            Some((Token::Symbol(name), _)) => name,
            _ => return Err(self.unexpected_prev("a procedure name like '@main'")),
        };
        self.expect_token(&Token::LBrace, "'{'")?;

        let mut blocks = Vec::new();
        while matches!(self.peek(), Some(Token::Block(_))) {
            blocks.push(self.block()?);
        }
        if blocks.is_empty() {
            return Err(ParseError::EmptyProcedure {
                name: name.to_owned(),
            });
        }
        self.expect_token(&Token::RBrace, "'}' or a block label")?;
        Ok(RawProc { name, blocks })
    }

    fn block(&mut self) -> Result<RawBlock<'s>, ParseError> {
        let (label, line) = match self.bump() {
            Some((Token::Block(label), line)) => (label, line),
            _ => return Err(self.unexpected_prev("a block label like '^entry'")),
        };
        self.expect_token(&Token::Colon, "':'")?;

        let mut instrs = Vec::new();
        loop {
            match self.peek() {
                Some(Token::Identifier("br")) => {
                    let (_, term_line) = self.bump().unwrap();
                    let mut targets = vec![self.branch_target()?];
                    while matches!(self.peek(), Some(Token::Comma)) {
                        self.bump();
                        targets.push(self.branch_target()?);
                    }
                    return Ok(RawBlock {
                        label,
                        line,
                        instrs,
                        term: RawTerm::Branch(targets),
                        term_line,
                    });
                }
                Some(Token::Identifier("ret")) => {
                    let (_, term_line) = self.bump().unwrap();
                    return Ok(RawBlock {
                        label,
                        line,
                        instrs,
                        term: RawTerm::Return,
                        term_line,
                    });
                }
                Some(Token::Identifier("alloc")) => {
                    let (_, inst_line) = self.bump().unwrap();
                    let var = self.value_name("a variable like '%i'")?;
                    instrs.push(RawInst {
                        kind: RawInstKind::Alloc { var },
                        line: inst_line,
                    });
                }
                Some(Token::Identifier("store")) => {
                    let (_, inst_line) = self.bump().unwrap();
                    let src = self.operand()?;
                    self.expect_token(&Token::Arrow, "'->'")?;
                    let dest = self.value_name("a destination like '%i'")?;
                    instrs.push(RawInst {
                        kind: RawInstKind::Store { src, dest },
                        line: inst_line,
                    });
                }
                Some(Token::Value(_)) => {
                    let (dest, inst_line) = match self.bump() {
                        Some((Token::Value(dest), line)) => (dest, line),
                        _ => return Err(self.unexpected_prev("a destination like '%t0'")),
                    };
                    self.expect_token(&Token::Equal, "'='")?;
                    let mnemonic = match self.bump() {
                        Some((Token::Identifier(m), _)) => m,
                        _ => return Err(self.unexpected_prev("an opcode mnemonic")),
                    };
                    let kind = if mnemonic == "load" {
                        let src = self.value_name("a source like '%i'")?;
                        RawInstKind::Load { dest, src }
                    } else {
                        let mut operands = vec![self.operand()?];
                        while matches!(self.peek(), Some(Token::Comma)) {
                            self.bump();
                            operands.push(self.operand()?);
                        }
                        if operands.len() < 2 {
                            return Err(ParseError::TooFewOperands {
                                line: inst_line,
                                mnemonic: mnemonic.to_owned(),
                            });
                        }
                        RawInstKind::Binary {
                            dest,
                            mnemonic,
                            operands,
                        }
                    };
                    instrs.push(RawInst {
                        kind,
                        line: inst_line,
                    });
                }
                Some(Token::Block(_)) | Some(Token::RBrace) | None => {
                    return Err(ParseError::MissingTerminator {
                        line,
                        label: label.to_owned(),
                    });
                }
                Some(_) => return Err(self.unexpected("an instruction or terminator")),
            }
        }
    }

    fn branch_target(&mut self) -> Result<&'s str, ParseError> {
        match self.bump() {
            Some((Token::Block(label), _)) => Ok(label),
            _ => Err(self.unexpected_prev("a block label like '^exit'")),
        }
    }

    fn value_name(&mut self, expected: &str) -> Result<&'s str, ParseError> {
        match self.bump() {
            Some((Token::Value(name), _)) => Ok(name),
            _ => Err(self.unexpected_prev(expected)),
        }
    }

    fn operand(&mut self) -> Result<RawOperand<'s>, ParseError> {
        match self.bump() {
            Some((Token::Number(text), line)) => match text.parse::<f64>() {
                Ok(value) => Ok(RawOperand::Number(value)),
                Err(_) => Err(ParseError::BadNumber {
                    line,
                    text: text.to_owned(),
                }),
            },
            Some((Token::Value(name), _)) => Ok(RawOperand::Name(name)),
            _ => Err(self.unexpected_prev("an operand (number or '%name')")),
        }
    }

    fn peek(&self) -> Option<&Token<'s>> {
        self.tokens.get(self.pos).map(|(token, _)| token)
    }

    fn bump(&mut self) -> Option<(Token<'s>, usize)> {
        let entry = self.tokens.get(self.pos).cloned();
        if entry.is_some() {
            self.pos += 1;
        }
        entry
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), ParseError> {
        match self.bump() {
            Some((Token::Identifier(ident), _)) if ident == keyword => Ok(()),
            _ => Err(self.unexpected_prev(&format!("'{keyword}'"))),
        }
    }

    fn expect_token(&mut self, token: &Token<'s>, expected: &str) -> Result<(), ParseError> {
        match self.bump() {
            Some((found, _)) if &found == token => Ok(()),
            _ => Err(self.unexpected_prev(expected)),
        }
    }

    /// Error at the current (not yet consumed) token.
    fn unexpected(&self, expected: &str) -> ParseError {
        self.unexpected_at(self.pos, expected)
    }

    /// Error at the token just consumed by a failed `bump`.
    fn unexpected_prev(&self, expected: &str) -> ParseError {
        self.unexpected_at(self.pos.saturating_sub(1), expected)
    }

    fn unexpected_at(&self, pos: usize, expected: &str) -> ParseError {
        match self.tokens.get(pos) {
            Some((token, line)) => ParseError::Unexpected {
                line: *line,
                expected: expected.to_owned(),
                found: token.to_string(),
            },
            None => ParseError::Eof {
                expected: expected.to_owned(),
            },
        }
    }
}

use std::fmt::Display;
use std::iter::{Enumerate, Peekable};
use std::str::Chars;

use itertools::{Itertools, PeekingNext};

use super::{Result, SyntaxError};

#[derive(PartialEq, Debug, Clone)]
pub enum Token {
    Arrow,
    Or,
    Semicolon,
    OpenAngle,
    CloseAngle,
    OpenBracket,
    CloseBracket,
    OpenParen,
    CloseParen,
    Comma,
    Equals,
    Dot,
    DoubleColon,
    Name(String),
    Number(u32),
    // "double quoted", used for attribute values
    Str(String),
    // 'single quoted', a word matched literally
    Literal(String),
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Arrow => write!(f, "->"),
            Token::Or => write!(f, "|"),
            Token::Semicolon => write!(f, ";"),
            Token::OpenAngle => write!(f, "<"),
            Token::CloseAngle => write!(f, ">"),
            Token::OpenBracket => write!(f, "["),
            Token::CloseBracket => write!(f, "]"),
            Token::OpenParen => write!(f, "("),
            Token::CloseParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
            Token::Equals => write!(f, "="),
            Token::Dot => write!(f, "."),
            Token::DoubleColon => write!(f, "::"),
            Token::Name(name) => write!(f, "{}", name),
            Token::Number(number) => write!(f, "{}", number),
            Token::Str(text) => write!(f, "\"{}\"", text),
            Token::Literal(text) => write!(f, "'{}'", text),
        }
    }
}

// 1-based line and column of a character in the source
#[derive(PartialEq, Debug, Clone, Copy, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

#[derive(PartialEq, Debug, Clone)]
pub struct Lexeme {
    pub token: Token,
    pub position: Position,
    // Width in characters, so the end of a token can be reported
    pub width: usize,
}

impl Lexeme {
    pub fn end(&self) -> Position {
        Position {
            line: self.position.line,
            column: self.position.column + self.width,
        }
    }
}

pub type LexErrors = Vec<(Position, SyntaxError)>;

type Cursor<'a> = Peekable<Enumerate<Chars<'a>>>;

fn second(chars: &Cursor) -> Option<char> {
    chars.clone().nth(1).map(|(_, c)| c)
}

fn take(chars: &mut Cursor, count: usize, token: Token) -> Result<Token> {
    for _ in 0..count {
        chars.next();
    }
    Ok(token)
}

pub fn lex_quoted(line: &mut impl PeekingNext<Item = (usize, char)>, quote: char) -> Result<String> {
    line.next(); // Consume open quote
    let text = line.peeking_take_while(|&(_, c)| c != quote).map(|(_, c)| c).collect();

    // Check if there is a close quote and consume it if there is
    if line.next().map(|(_, c)| c) != Some(quote) {
        return Err(SyntaxError::UnmatchedQuote);
    }

    Ok(text)
}

// Names may contain hyphens (`gnc-agr`), as long as the hyphen does not
// start an arrow
pub fn lex_name(line: &mut Cursor) -> String {
    let mut name = String::new();

    while let Some(&(_, c)) = line.peek() {
        let continues = c.is_alphanumeric() || c == '_' || (c == '-' && second(line) != Some('>'));
        if !continues {
            break;
        }
        name.push(c);
        line.next();
    }

    name
}

pub fn lex_number(line: &mut impl PeekingNext<Item = (usize, char)>) -> Result<u32> {
    let digits: String = line.peeking_take_while(|(_, c)| c.is_ascii_digit()).map(|(_, c)| c).collect();
    digits.parse().map_err(|_| SyntaxError::NumberTooLarge(digits))
}

// Lexes one line. Lexing carries on past errors so that the rest of the
// line can still be checked.
pub fn lex_line(line: &str, number: usize) -> (Vec<Lexeme>, LexErrors) {
    let mut lexemes = Vec::new();
    let mut errors = Vec::new();
    let length = line.chars().count();

    let mut chars = line.chars().enumerate().peekable();

    while let Some(&(index, c)) = chars.peek() {
        let position = Position { line: number, column: index + 1 };

        let token = match c {
            c if c.is_whitespace() => {
                chars.next();
                continue;
            }
            '/' if second(&chars) == Some('/') => break,
            '-' if second(&chars) == Some('>') => take(&mut chars, 2, Token::Arrow),
            ':' if second(&chars) == Some(':') => take(&mut chars, 2, Token::DoubleColon),
            '|' => take(&mut chars, 1, Token::Or),
            ';' => take(&mut chars, 1, Token::Semicolon),
            '<' => take(&mut chars, 1, Token::OpenAngle),
            '>' => take(&mut chars, 1, Token::CloseAngle),
            '[' => take(&mut chars, 1, Token::OpenBracket),
            ']' => take(&mut chars, 1, Token::CloseBracket),
            '(' => take(&mut chars, 1, Token::OpenParen),
            ')' => take(&mut chars, 1, Token::CloseParen),
            ',' => take(&mut chars, 1, Token::Comma),
            '=' => take(&mut chars, 1, Token::Equals),
            '.' => take(&mut chars, 1, Token::Dot),
            '"' => lex_quoted(&mut chars, '"').map(Token::Str),
            '\'' => lex_quoted(&mut chars, '\'').map(Token::Literal),
            c if c.is_ascii_digit() => lex_number(&mut chars).map(Token::Number),
            c if c.is_alphabetic() || c == '_' => Ok(Token::Name(lex_name(&mut chars))),
            other => {
                chars.next();
                Err(SyntaxError::UnexpectedCharacter(other))
            }
        };

        let end = chars.peek().map(|&(i, _)| i).unwrap_or(length);
        match token {
            Ok(token) => lexemes.push(Lexeme { token, position, width: end - index }),
            Err(error) => errors.push((position, error)),
        }
    }

    (lexemes, errors)
}

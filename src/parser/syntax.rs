use super::lexer::{LexErrors, Lexeme, Position, Token};
use super::SyntaxError;

#[derive(PartialEq, Debug, Clone)]
pub enum SymbolName {
    Name(String),
    Literal(String),
}

#[derive(PartialEq, Debug, Clone)]
pub enum Annotation {
    // `gnc-agr[1]`
    Agreement { kind: String, group: u32 },
    // `rt`
    Flag(String),
    // `gram="nom"`
    Assign { key: String, value: String },
}

#[derive(PartialEq, Debug, Clone)]
pub struct SymbolAst {
    pub name: SymbolName,
    pub annotations: Vec<(Position, Annotation)>,
    pub position: Position,
}

// `Relation.adj_mod_of::norm="m,sg"`
#[derive(PartialEq, Debug, Clone)]
pub struct AttributeAst {
    pub path: Vec<String>,
    pub modifier: Option<String>,
    pub value: Option<String>,
    pub position: Position,
}

#[derive(PartialEq, Debug, Clone)]
pub struct AlternativeAst {
    pub symbols: Vec<SymbolAst>,
    pub attributes: Vec<AttributeAst>,
    pub position: Position,
}

#[derive(PartialEq, Debug, Clone)]
pub struct Statement {
    pub lhs: String,
    pub alternatives: Vec<AlternativeAst>,
    pub position: Position,
}

// Everything the statement parser found in one source
#[derive(PartialEq, Debug, Default)]
pub struct ParsedStatements {
    pub statements: Vec<Statement>,
    // Rule names whose statement failed to parse, so they are not also
    // reported as undefined
    pub broken: Vec<String>,
    pub errors: LexErrors,
}

type ParseResult<T> = std::result::Result<T, (Position, SyntaxError)>;

struct StatementParser<'a> {
    lexemes: &'a [Lexeme],
    pos: usize,
    end: Position,
    current_lhs: Option<String>,
}

impl<'a> StatementParser<'a> {
    fn peek(&self) -> Option<&'a Lexeme> {
        self.lexemes.get(self.pos)
    }

    fn peek_token(&self) -> Option<&'a Token> {
        self.peek().map(|lexeme| &lexeme.token)
    }

    fn peek_second(&self) -> Option<&'a Token> {
        self.lexemes.get(self.pos + 1).map(|lexeme| &lexeme.token)
    }

    fn advance(&mut self) -> Option<&'a Lexeme> {
        let lexeme = self.lexemes.get(self.pos);
        if lexeme.is_some() {
            self.pos += 1;
        }
        lexeme
    }

    // `NAME ->` begins the next statement
    fn at_statement_start(&self) -> bool {
        matches!(self.peek_token(), Some(Token::Name(_))) && self.peek_second() == Some(&Token::Arrow)
    }

    fn at_interp(&self) -> bool {
        matches!(self.peek_token(), Some(Token::Name(name)) if name == "interp")
            && self.peek_second() == Some(&Token::OpenParen)
    }

    fn unexpected(&self, expected: &'static str) -> (Position, SyntaxError) {
        match self.peek() {
            Some(lexeme) => (lexeme.position, SyntaxError::UnexpectedToken {
                found: lexeme.token.to_string(),
                expected
            }),
            None => (self.end, SyntaxError::UnexpectedEnd { expected }),
        }
    }

    // Reported just after the last token of the unterminated statement
    fn missing_semicolon(&self) -> (Position, SyntaxError) {
        let position = self.pos.checked_sub(1)
            .and_then(|last| self.lexemes.get(last))
            .map(Lexeme::end)
            .unwrap_or(self.end);
        (position, SyntaxError::MissingSemicolon)
    }

    fn expect(&mut self, token: Token, expected: &'static str) -> ParseResult<&'a Lexeme> {
        match self.peek() {
            Some(lexeme) if lexeme.token == token => {
                self.pos += 1;
                Ok(lexeme)
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    fn expect_name(&mut self, expected: &'static str) -> ParseResult<(String, Position)> {
        match self.peek() {
            Some(Lexeme { token: Token::Name(name), position, .. }) => {
                self.pos += 1;
                Ok((name.clone(), *position))
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    fn expect_string(&mut self, expected: &'static str) -> ParseResult<String> {
        match self.peek_token() {
            Some(Token::Str(text)) => {
                self.pos += 1;
                Ok(text.clone())
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    fn statement(&mut self) -> ParseResult<Statement> {
        self.current_lhs = None;
        let (lhs, position) = self.expect_name("a rule name")?;
        self.expect(Token::Arrow, "`->`")?;
        self.current_lhs = Some(lhs.clone());

        let mut alternatives = vec![self.alternative()?];
        loop {
            match self.peek_token() {
                Some(Token::Or) => {
                    self.advance();
                    alternatives.push(self.alternative()?);
                }
                Some(Token::Semicolon) => {
                    self.advance();
                    break;
                }
                None => return Err(self.missing_semicolon()),
                Some(_) if self.at_statement_start() => return Err(self.missing_semicolon()),
                Some(_) => return Err(self.unexpected("`|` or `;`")),
            }
        }

        Ok(Statement { lhs, alternatives, position })
    }

    fn alternative(&mut self) -> ParseResult<AlternativeAst> {
        let position = self.peek().map(|lexeme| lexeme.position).unwrap_or(self.end);

        let mut symbols = Vec::new();
        while !self.at_interp() && !self.at_statement_start() {
            match self.peek_token() {
                Some(Token::Name(_)) | Some(Token::Literal(_)) => symbols.push(self.symbol()?),
                _ => break,
            }
        }

        if symbols.is_empty() {
            return match self.peek_token() {
                None | Some(Token::Or) | Some(Token::Semicolon) => Err((position, SyntaxError::EmptyAlternative)),
                Some(_) if self.at_statement_start() => Err((position, SyntaxError::EmptyAlternative)),
                Some(_) => Err(self.unexpected("a symbol")),
            };
        }

        if self.at_interp() {
            self.advance();
        }
        let attributes = if self.peek_token() == Some(&Token::OpenParen) {
            self.attributes()?
        } else {
            Vec::new()
        };

        Ok(AlternativeAst { symbols, attributes, position })
    }

    fn symbol(&mut self) -> ParseResult<SymbolAst> {
        let (name, position) = match self.advance() {
            Some(Lexeme { token: Token::Name(name), position, .. }) => (SymbolName::Name(name.clone()), *position),
            Some(Lexeme { token: Token::Literal(text), position, .. }) => (SymbolName::Literal(text.clone()), *position),
            _ => return Err(self.unexpected("a symbol")),
        };

        let mut annotations = Vec::new();
        if self.peek_token() == Some(&Token::OpenAngle) {
            self.advance();
            let mut groups = Vec::new();
            loop {
                let (annotation_position, annotation) = self.annotation()?;
                if let Annotation::Agreement { group, .. } = &annotation {
                    if groups.contains(group) {
                        return Err((annotation_position, SyntaxError::RepeatedGroup(*group)));
                    }
                    groups.push(*group);
                }
                annotations.push((annotation_position, annotation));

                match self.peek_token() {
                    Some(Token::Comma) => {
                        self.advance();
                    }
                    Some(Token::CloseAngle) => {
                        self.advance();
                        break;
                    }
                    _ => return Err(self.unexpected("`,` or `>`")),
                }
            }
        }

        Ok(SymbolAst { name, annotations, position })
    }

    fn annotation(&mut self) -> ParseResult<(Position, Annotation)> {
        let (name, position) = self.expect_name("an annotation")?;

        let annotation = match self.peek_token() {
            Some(Token::OpenBracket) => {
                self.advance();
                let group = match self.peek_token() {
                    Some(Token::Number(group)) => *group,
                    _ => return Err(self.unexpected("a group index")),
                };
                self.advance();
                self.expect(Token::CloseBracket, "`]`")?;
                Annotation::Agreement { kind: name, group }
            }
            Some(Token::Equals) => {
                self.advance();
                let value = self.expect_string("a quoted value")?;
                Annotation::Assign { key: name, value }
            }
            _ => Annotation::Flag(name),
        };

        Ok((position, annotation))
    }

    fn attributes(&mut self) -> ParseResult<Vec<AttributeAst>> {
        self.expect(Token::OpenParen, "`(`")?;

        let mut attributes = Vec::new();
        loop {
            attributes.push(self.attribute()?);
            match self.peek_token() {
                Some(Token::Comma) => {
                    self.advance();
                }
                Some(Token::CloseParen) => {
                    self.advance();
                    break;
                }
                _ => return Err(self.unexpected("`,` or `)`")),
            }
        }

        Ok(attributes)
    }

    fn attribute(&mut self) -> ParseResult<AttributeAst> {
        let (first, position) = self.expect_name("a fact name")?;

        let mut path = vec![first];
        while self.peek_token() == Some(&Token::Dot) {
            self.advance();
            path.push(self.expect_name("a field name")?.0);
        }

        let modifier = if self.peek_token() == Some(&Token::DoubleColon) {
            self.advance();
            Some(self.expect_name("an attribute modifier")?.0)
        } else {
            None
        };

        let value = if self.peek_token() == Some(&Token::Equals) {
            self.advance();
            Some(self.expect_string("a quoted value")?)
        } else {
            None
        };

        Ok(AttributeAst { path, modifier, value, position })
    }

    // Skips past the next `;`, or up to the start of the next statement,
    // always consuming at least one token
    fn recover(&mut self) {
        while let Some(lexeme) = self.advance() {
            if lexeme.token == Token::Semicolon || self.at_statement_start() {
                return;
            }
        }
    }
}

// Parses every statement in `lexemes`. A statement that fails is skipped and
// parsing carries on, so one pass reports every syntax error.
pub fn parse_statements(lexemes: &[Lexeme]) -> ParsedStatements {
    let end = lexemes.last().map(Lexeme::end).unwrap_or_default();
    let mut parser = StatementParser { lexemes, pos: 0, end, current_lhs: None };
    let mut parsed = ParsedStatements::default();

    while parser.peek().is_some() {
        match parser.statement() {
            Ok(statement) => parsed.statements.push(statement),
            Err(error) => {
                parsed.errors.push(error);
                parsed.broken.extend(parser.current_lhs.take());
                if !parser.at_statement_start() {
                    parser.recover();
                }
            }
        }
    }

    parsed
}

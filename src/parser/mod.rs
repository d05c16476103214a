/*
    This module loads grammar files into a `GrammarModel`
*/

mod agreement;
mod lexer;
mod syntax;
mod verifier;

use std::collections::HashMap;
use std::fmt::Display;
use std::path::{Path, PathBuf};

use itertools::Itertools;
use log::{debug, info};

use crate::error_handling::*;
use crate::grammar::features::{parse_grammemes, GrammemeError};
use crate::grammar::*;
use agreement::{resolve_agreements, AgreementProblem};
use lexer::{lex_line, Lexeme, Token};
use syntax::{parse_statements, AlternativeAst, Annotation, AttributeAst, ParsedStatements, SymbolAst, SymbolName};
use verifier::{get_undefined_symbols, get_unreachable_rules, RuleSources};

pub use agreement::Incompatibility;
pub use lexer::Position;

#[derive(Debug, PartialEq, Clone)]
pub enum SyntaxError {
    // A token that cannot appear where it was found
    UnexpectedToken { found: String, expected: &'static str },
    // The source ended in the middle of a statement
    UnexpectedEnd { expected: &'static str },
    // A statement runs into the next one or the end of the file
    MissingSemicolon,
    // `A -> ;` or `A -> B | ;`
    EmptyAlternative,
    // There is an unclosed quote
    UnmatchedQuote,
    UnexpectedCharacter(char),
    // A group index does not fit in 32 bits
    NumberTooLarge(String),
    // `A<x[1], y[1]>`
    RepeatedGroup(u32),
    // A known directive with the wrong argument
    BadDirectiveArgument(String),
}

impl Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyntaxError::UnexpectedToken { found, expected } => write!(f, "Expected {}, found `{}`", expected, found),
            SyntaxError::UnexpectedEnd { expected } => write!(f, "Expected {}, found the end of the file", expected),
            SyntaxError::MissingSemicolon => write!(f, "Expected `;` at the end of the statement"),
            SyntaxError::EmptyAlternative => write!(f, "Alternative has no symbols"),
            SyntaxError::UnmatchedQuote => write!(f, "Unmatched quotes"),
            SyntaxError::UnexpectedCharacter(c) => write!(f, "Unexpected character `{}`", c),
            SyntaxError::NumberTooLarge(number) => write!(f, "Number `{}` is too large", number),
            SyntaxError::RepeatedGroup(group) => write!(f, "Agreement group [{}] is referenced twice by one symbol", group),
            SyntaxError::BadDirectiveArgument(name) => write!(f, "Malformed argument to `#{}`", name),
        }
    }
}

// io errors compare by kind so diagnostics can be compared in tests
#[derive(Debug)]
pub struct IoError(pub std::io::Error);

impl PartialEq for IoError {
    fn eq(&self, other: &Self) -> bool {
        self.0.kind() == other.0.kind()
    }
}

#[derive(Debug, PartialEq)]
pub enum LoadErrorType {
    Syntax(SyntaxError),
    // A right hand side name that is neither a rule nor a known category
    UndefinedSymbol(String),
    // The grammar root is not defined by any rule
    UndefinedRoot(String),
    IncompatibleFeatureSet { group: u32, reason: Incompatibility },
    // Warning: an agreement group with a single member
    DegenerateGroup(u32),
    UnknownAnnotation(String),
    // `rt` or `gram` given twice on one symbol
    DuplicateAnnotation(String),
    InvalidGrammemes(GrammemeError),
    MalformedNormalization(String),
    DuplicateDirective(String),
    // A directive after the first rule
    LateDirective(String),
    // Warning: a directive this crate does not know
    UnknownDirective(String),
    // Warning: the source is read as UTF-8 whatever it declares
    UnsupportedEncoding(String),
    // Warning: a rule no derivation from the root uses
    UnreachableNonterminal(String),
    EmptyGrammar,
    // There was an issue with reading a file
    FileError(IoError),
}

impl ErrorType for LoadErrorType {
    fn is_fatal(&self) -> bool {
        !matches!(
            self,
            LoadErrorType::DegenerateGroup(_)
                | LoadErrorType::UnknownDirective(_)
                | LoadErrorType::UnsupportedEncoding(_)
                | LoadErrorType::UnreachableNonterminal(_)
        )
    }
}

impl Display for LoadErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadErrorType::Syntax(error) => write!(f, "Syntax error: {}", error),
            LoadErrorType::UndefinedSymbol(name) => write!(f, "Could not find definition for `{}`", name),
            LoadErrorType::UndefinedRoot(name) => write!(f, "Grammar root `{}` is not defined by any rule", name),
            LoadErrorType::IncompatibleFeatureSet { group, reason } => {
                write!(f, "Incompatible features in agreement group [{}]: {}", group, reason)
            }
            LoadErrorType::DegenerateGroup(group) => write!(f, "Agreement group [{}] has a single member and constrains nothing", group),
            LoadErrorType::UnknownAnnotation(name) => write!(f, "Unknown symbol annotation `{}`", name),
            LoadErrorType::DuplicateAnnotation(name) => write!(f, "Symbol annotation `{}` is given more than once", name),
            LoadErrorType::InvalidGrammemes(error) => write!(f, "Invalid grammeme filter: {}", error),
            LoadErrorType::MalformedNormalization(reason) => write!(f, "Malformed normalization directive: {}", reason),
            LoadErrorType::DuplicateDirective(name) => write!(f, "Directive `#{}` is given more than once", name),
            LoadErrorType::LateDirective(name) => write!(f, "Directive `#{}` must come before the first rule", name),
            LoadErrorType::UnknownDirective(name) => write!(f, "Unknown directive `#{}` is ignored", name),
            LoadErrorType::UnsupportedEncoding(encoding) => {
                write!(f, "Encoding `{}` is not supported, the source is read as UTF-8", encoding)
            }
            LoadErrorType::UnreachableNonterminal(name) => write!(f, "`{}` cannot be reached from the grammar root", name),
            LoadErrorType::EmptyGrammar => write!(f, "The grammar has no rules"),
            LoadErrorType::FileError(IoError(e)) => write!(f, "File error: {}", e),
        }
    }
}

pub type Diagnostic = Error<LoadErrorType>;
pub type Diagnostics = Errors<LoadErrorType>;

pub type Result<T> = std::result::Result<T, SyntaxError>;
// Problems found before they are given a file
pub type Findings = Vec<(Position, LoadErrorType)>;

fn io_error(error: std::io::Error, file: &Path) -> Diagnostic {
    Diagnostic {
        location: Location::file(file.to_path_buf()),
        error: LoadErrorType::FileError(IoError(error))
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoadOptions {
    // Part-of-speech categories usable as terminals
    pub terminals: TerminalCatalog,
}

impl LoadOptions {
    pub fn with_terminal(mut self, name: &str, vocabulary: Option<FeatureSet>) -> Self {
        self.terminals.insert(name, vocabulary);
        self
    }
}

// A successful load. Warnings never prevent a model from being built.
#[derive(Debug)]
pub struct Loaded {
    pub model: GrammarModel,
    pub warnings: Diagnostics,
}

// Every problem found in one load, warnings included
#[derive(Debug, PartialEq)]
pub struct LoadError {
    pub diagnostics: Diagnostics,
}

impl LoadError {
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|diagnostic| diagnostic.is_fatal())
    }
}

impl Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.diagnostics.iter().join("\n"))
    }
}

impl std::error::Error for LoadError {}

pub type LoadResult = std::result::Result<Loaded, LoadError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Unloaded,
    Parsing,
    Resolving,
    Ready,
    Failed,
}

impl LoadState {
    pub fn is_terminal(self) -> bool {
        matches!(self, LoadState::Ready | LoadState::Failed)
    }

    fn can_advance_to(self, next: LoadState) -> bool {
        matches!(
            (self, next),
            (LoadState::Unloaded, LoadState::Parsing)
                | (LoadState::Parsing, LoadState::Resolving)
                | (LoadState::Resolving, LoadState::Ready)
                | (LoadState::Resolving, LoadState::Failed)
        )
    }
}

#[derive(Debug, Default)]
struct Directives {
    encoding: Option<String>,
    root: Option<(String, Position)>,
}

// Loads one source. `load` consumes the loader, so a finished load can not be
// run again.
pub struct Loader<'o> {
    file: PathBuf,
    options: &'o LoadOptions,
    state: LoadState,
    diagnostics: Diagnostics,
}

impl<'o> Loader<'o> {
    pub fn new(file: PathBuf, options: &'o LoadOptions) -> Self {
        Loader {
            file,
            options,
            state: LoadState::Unloaded,
            diagnostics: Vec::new()
        }
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    fn advance(&mut self, next: LoadState) {
        debug_assert!(self.state.can_advance_to(next), "{:?} -> {:?}", self.state, next);
        debug!("{}: {:?} -> {:?}", self.file.display(), self.state, next);
        self.state = next;
    }

    fn report(&mut self, position: Position, error: LoadErrorType) {
        self.diagnostics.push(Diagnostic {
            location: Location::new(self.file.clone(), position.line, position.column),
            error
        });
    }

    fn report_all(&mut self, findings: Findings) {
        for (position, error) in findings {
            self.report(position, error);
        }
    }

    fn report_syntax(&mut self, errors: Vec<(Position, SyntaxError)>) {
        for (position, error) in errors {
            self.report(position, LoadErrorType::Syntax(error));
        }
    }

    pub fn load(mut self, source: &str) -> LoadResult {
        self.advance(LoadState::Parsing);
        let source = source.strip_prefix('\u{feff}').unwrap_or(source);
        let (directives, lexemes) = self.scan(source);
        let mut parsed = parse_statements(&lexemes);
        self.report_syntax(std::mem::take(&mut parsed.errors));

        self.advance(LoadState::Resolving);
        let model = self.assemble(directives, &parsed);

        // Passes report in their own order; batches read top to bottom
        self.diagnostics.sort_by_key(|diagnostic| (diagnostic.location.line, diagnostic.location.column));
        let failed = self.diagnostics.iter().any(Diagnostic::is_fatal);
        match model {
            Some(model) if !failed => {
                self.advance(LoadState::Ready);
                info!(
                    "{}: loaded {} rules with {} warnings",
                    self.file.display(),
                    model.rules().len(),
                    self.diagnostics.len()
                );
                Ok(Loaded { model, warnings: self.diagnostics })
            }
            _ => {
                self.advance(LoadState::Failed);
                info!("{}: load failed with {} diagnostics", self.file.display(), self.diagnostics.len());
                Err(LoadError { diagnostics: self.diagnostics })
            }
        }
    }

    // Splits the source into directives and the lexemes of the statements
    fn scan(&mut self, source: &str) -> (Directives, Vec<Lexeme>) {
        let mut directives = Directives::default();
        let mut lexemes = Vec::new();

        for (index, line) in source.lines().enumerate() {
            let number = index + 1;
            if line.trim_start().starts_with('#') {
                let late = !lexemes.is_empty();
                self.directive(line, number, late, &mut directives);
                continue;
            }

            let (line_lexemes, errors) = lex_line(line, number);
            lexemes.extend(line_lexemes);
            self.report_syntax(errors);
        }

        (directives, lexemes)
    }

    fn directive(&mut self, line: &str, number: usize, late: bool, directives: &mut Directives) {
        let hash = Position {
            line: number,
            column: line.chars().count() - line.trim_start().chars().count() + 1
        };

        // Blank out the `#` so the rest lexes with its columns intact
        let (lexemes, errors) = lex_line(&line.replacen('#', " ", 1), number);
        self.report_syntax(errors);

        let mut lexemes = lexemes.into_iter();
        let name = match lexemes.next() {
            Some(Lexeme { token: Token::Name(name), .. }) => name,
            Some(other) => {
                let error = SyntaxError::UnexpectedToken { found: other.token.to_string(), expected: "a directive name" };
                return self.report(other.position, LoadErrorType::Syntax(error));
            }
            None => {
                let error = SyntaxError::UnexpectedEnd { expected: "a directive name" };
                return self.report(hash, LoadErrorType::Syntax(error));
            }
        };
        let arguments = lexemes.collect_vec();
        let key = name.to_ascii_lowercase();

        if key != "encoding" && key != "grammar_root" {
            return self.report(hash, LoadErrorType::UnknownDirective(name));
        }
        if late {
            return self.report(hash, LoadErrorType::LateDirective(name));
        }

        match (key.as_str(), arguments.as_slice()) {
            ("encoding", [Lexeme { token: Token::Str(encoding), position, .. }]) => {
                if directives.encoding.is_some() {
                    return self.report(hash, LoadErrorType::DuplicateDirective(name));
                }
                if !matches!(encoding.to_ascii_lowercase().as_str(), "utf-8" | "utf8") {
                    self.report(*position, LoadErrorType::UnsupportedEncoding(encoding.clone()));
                }
                directives.encoding = Some(encoding.clone());
            }
            ("grammar_root", [Lexeme { token: Token::Name(root), position, .. }]) => {
                if directives.root.is_some() {
                    return self.report(hash, LoadErrorType::DuplicateDirective(name));
                }
                directives.root = Some((root.clone(), *position));
            }
            _ => self.report(hash, LoadErrorType::Syntax(SyntaxError::BadDirectiveArgument(name))),
        }
    }

    fn annotations(&mut self, symbol: &SymbolAst) -> Annotations {
        let mut annotations = Annotations::default();
        let mut seen_gram = false;

        for (position, annotation) in &symbol.annotations {
            match annotation {
                Annotation::Agreement { kind, group } => annotations.agreements.push(FeatureRef {
                    kind: FeatureKind::from_name(kind),
                    group: *group
                }),
                Annotation::Flag(flag) if flag == "rt" => {
                    if annotations.head {
                        self.report(*position, LoadErrorType::DuplicateAnnotation(flag.clone()));
                    }
                    annotations.head = true;
                }
                Annotation::Assign { key, .. } if key == "gram" && seen_gram => {
                    self.report(*position, LoadErrorType::DuplicateAnnotation(key.clone()))
                }
                Annotation::Assign { key, value } if key == "gram" => {
                    seen_gram = true;
                    match parse_grammemes(value) {
                        Ok(grammemes) => annotations.grammemes = grammemes,
                        Err(error) => self.report(*position, LoadErrorType::InvalidGrammemes(error)),
                    }
                }
                Annotation::Flag(name) | Annotation::Assign { key: name, .. } => {
                    self.report(*position, LoadErrorType::UnknownAnnotation(name.clone()))
                }
            }
        }

        annotations
    }

    // `Fact.field` binds the phrase to a fact field, `::norm="..."` also
    // gives the form it is rendered in
    fn normalization(&mut self, attribute: &AttributeAst) -> Option<NormalizationDirective> {
        let malformed = |reason: String| LoadErrorType::MalformedNormalization(reason);

        let (fact, field) = match attribute.path.as_slice() {
            [fact, field] => (fact.clone(), field.clone()),
            path => {
                let error = malformed(format!("expected `Fact.field`, found `{}`", path.join(".")));
                self.report(attribute.position, error);
                return None;
            }
        };

        let form = match (attribute.modifier.as_deref(), attribute.value.as_deref()) {
            (None, None) => None,
            (Some("norm"), Some(value)) => match parse_grammemes(value) {
                Ok(grammemes) => Some(grammemes),
                Err(error) => {
                    self.report(attribute.position, malformed(error.to_string()));
                    return None;
                }
            },
            (Some("norm"), None) => {
                self.report(attribute.position, malformed("`::norm` needs a value".to_string()));
                return None;
            }
            (Some(other), _) => {
                self.report(attribute.position, malformed(format!("unknown modifier `::{}`", other)));
                return None;
            }
            (None, Some(_)) => {
                self.report(attribute.position, malformed(format!("a value needs `{}.{}::norm`", fact, field)));
                return None;
            }
        };

        Some(NormalizationDirective { fact, field, form })
    }

    fn production(&mut self, alternative: &AlternativeAst, symbols: &mut SymbolTable) -> Production {
        let mut rhs = Vec::with_capacity(alternative.symbols.len());
        for symbol in &alternative.symbols {
            let id = match &symbol.name {
                SymbolName::Name(name) => symbols.intern(name),
                SymbolName::Literal(text) => symbols.intern_literal(text),
            };
            rhs.push(RhsSymbol { symbol: id, annotations: self.annotations(symbol) });
        }

        let normalizations = alternative.attributes.iter()
            .filter_map(|attribute| self.normalization(attribute))
            .collect();

        Production { rhs, agreements: Vec::new(), normalizations }
    }

    // Builds the model from the parsed statements. Returns None only after a
    // fatal problem was reported.
    fn assemble(&mut self, directives: Directives, parsed: &ParsedStatements) -> Option<GrammarModel> {
        if parsed.statements.is_empty() {
            if !self.diagnostics.iter().any(Diagnostic::is_fatal) {
                self.report(Position::default(), LoadErrorType::EmptyGrammar);
            }
            return None;
        }

        // Statements with the same left hand side are merged, in order of
        // first definition
        let mut order: Vec<(&str, Position)> = Vec::new();
        let mut alternatives: HashMap<&str, Vec<&AlternativeAst>> = HashMap::new();
        for statement in &parsed.statements {
            alternatives.entry(statement.lhs.as_str())
                .or_insert_with(|| {
                    order.push((statement.lhs.as_str(), statement.position));
                    Vec::new()
                })
                .extend(statement.alternatives.iter());
        }

        // Ids are handed out in the order the serializer writes rules back,
        // so a reloaded model gets the same ids
        let mut symbols = SymbolTable::new();
        let mut rules = Vec::with_capacity(order.len());
        let mut sources: RuleSources = Vec::with_capacity(order.len());
        for (lhs, _) in &order {
            let lhs_id = symbols.intern(lhs);
            let rule_sources = alternatives.remove(lhs).unwrap_or_default();
            let productions = rule_sources.iter().map(|alternative| self.production(alternative, &mut symbols)).collect();
            rules.push(Rule { lhs: lhs_id, productions });
            sources.push(rule_sources);
        }
        symbols.classify(rules.iter().map(|rule| rule.lhs));

        let undefined = get_undefined_symbols(&rules, &sources, &symbols, &self.options.terminals, &parsed.broken);
        self.report_all(undefined);

        let (root_name, root_position) = directives.root.clone().unwrap_or_else(|| (order[0].0.to_string(), order[0].1));
        let root = symbols.resolve_root(&root_name);
        match root {
            Some(root) => {
                for lhs in get_unreachable_rules(root, &rules, &symbols) {
                    let position = order.iter().find(|(name, _)| *name == symbols.name(lhs)).map(|(_, p)| *p).unwrap_or_default();
                    self.report(position, LoadErrorType::UnreachableNonterminal(symbols.name(lhs).to_string()));
                }
            }
            // A rule that failed to parse is already reported
            None if parsed.broken.contains(&root_name) => {}
            None => self.report(root_position, LoadErrorType::UndefinedRoot(root_name)),
        }

        for (rule, rule_sources) in rules.iter_mut().zip(&sources) {
            for (production, source) in rule.productions.iter_mut().zip(rule_sources) {
                let (groups, problems) = resolve_agreements(&production.rhs, &symbols, &self.options.terminals);
                production.agreements = groups;

                for (position, problem) in problems {
                    let error = match problem {
                        AgreementProblem::Degenerate(group) => LoadErrorType::DegenerateGroup(group),
                        AgreementProblem::Incompatible { group, reason } => LoadErrorType::IncompatibleFeatureSet { group, reason },
                    };
                    self.report(source.symbols[position].position, error);
                }
            }
        }

        let root = root?;
        Some(GrammarModel {
            encoding: directives.encoding,
            root,
            symbols,
            rules
        })
    }
}

pub fn load_str(source: &str, options: &LoadOptions) -> LoadResult {
    Loader::new(PathBuf::new(), options).load(source)
}

pub fn load_file(path: &Path, options: &LoadOptions) -> LoadResult {
    let source = std::fs::read_to_string(path).map_err(|e| LoadError { diagnostics: vec![io_error(e, path)] })?;
    Loader::new(path.to_path_buf(), options).load(&source)
}

#[cfg(test)]
mod tests {
    use std::iter::zip;

    use super::*;
    use crate::grammar::features::Grammeme;

    fn at(line: usize, column: usize) -> Location {
        Location::new(PathBuf::new(), line, column)
    }

    fn diagnostic(line: usize, column: usize, error: LoadErrorType) -> Diagnostic {
        Diagnostic { location: at(line, column), error }
    }

    fn load(text: &str) -> LoadResult {
        load_str(text, &LoadOptions::default())
    }

    fn load_errors(text: &str) -> Diagnostics {
        load(text).unwrap_err().diagnostics
    }

    #[test]
    fn state_transitions() {
        let options = LoadOptions::default();
        let loader = Loader::new(PathBuf::new(), &options);
        assert_eq!(loader.state(), LoadState::Unloaded);

        let states = vec![LoadState::Unloaded, LoadState::Parsing, LoadState::Resolving];
        let nexts = vec![LoadState::Parsing, LoadState::Resolving, LoadState::Ready];
        for (state, next) in zip(states, nexts) {
            assert!(state.can_advance_to(next));
        }
        assert!(LoadState::Resolving.can_advance_to(LoadState::Failed));
        assert!(!LoadState::Ready.can_advance_to(LoadState::Parsing));
        assert!(!LoadState::Failed.can_advance_to(LoadState::Resolving));
        assert!(!LoadState::Unloaded.can_advance_to(LoadState::Ready));
        assert!(LoadState::Ready.is_terminal() && LoadState::Failed.is_terminal());
    }

    #[test]
    fn load_normal_grammar() {
        let loaded = load("#GRAMMAR_ROOT S\nS -> NP Verb;\nNP -> Adj<gnc-agr[1]> Noun<gnc-agr[1], rt>;").unwrap();
        let model = &loaded.model;

        assert!(loaded.warnings.is_empty());
        assert_eq!(model.name(model.root()), "S");
        assert_eq!(model.rules().len(), 2);

        let np = model.rule_by_name("NP").unwrap();
        let production = &np.productions[0];
        assert_eq!(production.agreements.len(), 1);
        assert_eq!(production.agreements[0].members, vec![0, 1]);
        assert!(production.rhs[1].annotations.head);
        assert_eq!(model.symbols().kind(production.rhs[0].symbol), SymbolKind::Terminal);
        assert_eq!(model.symbols().kind(np.lhs), SymbolKind::Nonterminal);
    }

    #[test]
    fn root_defaults_to_first_rule() {
        let loaded = load("NP -> Adj Noun;\nS -> NP;").unwrap();

        assert_eq!(loaded.model.name(loaded.model.root()), "NP");
        assert_eq!(loaded.warnings, vec![
            diagnostic(2, 1, LoadErrorType::UnreachableNonterminal("S".to_string()))
        ]);
    }

    #[test]
    fn merge_statements_with_same_lhs() {
        let loaded = load("S -> Adj;\nT -> Noun;\nS -> Verb | T;").unwrap();
        let s = loaded.model.rule_by_name("S").unwrap();

        assert_eq!(loaded.model.rules().len(), 2);
        assert_eq!(s.productions.len(), 3);
        assert!(loaded.warnings.is_empty());
    }

    #[test]
    fn load_normalizations() {
        let loaded = load("S -> A interp (Relation.a::norm=\"m,sg\", Relation.b);\nA -> Adj;").unwrap();
        let production = &loaded.model.rule_by_name("S").unwrap().productions[0];

        assert_eq!(production.normalizations, vec![
            NormalizationDirective {
                fact: "Relation".to_string(),
                field: "a".to_string(),
                form: Some(vec![Grammeme::Masculine, Grammeme::Singular])
            },
            NormalizationDirective {
                fact: "Relation".to_string(),
                field: "b".to_string(),
                form: None
            }
        ]);
    }

    #[test]
    fn load_malformed_normalizations() {
        let text = "S -> Adj (Relation::norm=\"m\") | Noun (R.f::norm=\"sg,pl\") | Verb (R.f::lemma=\"x\") | Adv (R.f=\"x\");";

        let errors = load_errors(text);

        assert_eq!(errors.len(), 4);
        assert!(errors.iter().all(|e| matches!(e.error, LoadErrorType::MalformedNormalization(_))));
        assert_eq!(errors[0].location, at(1, 11));
    }

    #[test]
    fn load_malformed_annotations() {
        let errors = load_errors("S -> Noun<gram=\"nom,xx\"> Adj<h-reg1> Verb<kwtype=\"x\">;");

        assert_eq!(errors, vec![
            diagnostic(1, 11, LoadErrorType::InvalidGrammemes(GrammemeError::Unknown("xx".to_string()))),
            diagnostic(1, 30, LoadErrorType::UnknownAnnotation("h-reg1".to_string())),
            diagnostic(1, 43, LoadErrorType::UnknownAnnotation("kwtype".to_string()))
        ]);
    }

    #[test]
    fn load_duplicate_annotations() {
        let errors = load_errors("S -> Noun<rt, rt> Adj<gram=\"sg\", gram=\"pl\">;");

        assert_eq!(errors, vec![
            diagnostic(1, 15, LoadErrorType::DuplicateAnnotation("rt".to_string())),
            diagnostic(1, 34, LoadErrorType::DuplicateAnnotation("gram".to_string()))
        ]);
    }

    #[test]
    fn diagnostics_are_sorted_by_position() {
        let text = "S -> A Adv;\nA -> Adj<x[1]> Noun<y[1]>;\nB -> Nothing;\n#encoding \"utf-8\"";
        let errors = load_errors(text);
        let positions: Vec<_> = errors.iter().map(|e| (e.location.line, e.location.column)).collect();

        assert_eq!(positions, vec![(2, 16), (3, 1), (3, 6), (4, 1)]);
    }

    #[test]
    fn load_directives() {
        let loaded = load("#encoding \"utf-8\" // comment\n#grammar_root S\nS -> Noun;").unwrap();
        assert_eq!(loaded.model.encoding(), Some("utf-8"));

        let loaded = load("#encoding \"cp1251\"\n#include \"other.cxx\"\nS -> Noun;").unwrap();
        assert_eq!(loaded.warnings, vec![
            diagnostic(1, 11, LoadErrorType::UnsupportedEncoding("cp1251".to_string())),
            diagnostic(2, 1, LoadErrorType::UnknownDirective("include".to_string()))
        ]);
    }

    #[test]
    fn load_malformed_directives() {
        let text = "#GRAMMAR_ROOT S\n#GRAMMAR_ROOT T\n#encoding utf8\nS -> Noun;\n  #encoding \"utf-8\"\nT -> Verb;";

        assert_eq!(load_errors(text), vec![
            diagnostic(2, 1, LoadErrorType::DuplicateDirective("GRAMMAR_ROOT".to_string())),
            diagnostic(3, 1, LoadErrorType::Syntax(SyntaxError::BadDirectiveArgument("encoding".to_string()))),
            diagnostic(5, 3, LoadErrorType::LateDirective("encoding".to_string())),
            diagnostic(6, 1, LoadErrorType::UnreachableNonterminal("T".to_string()))
        ]);
    }

    #[test]
    fn load_undefined_symbols() {
        let errors = load_errors("S -> NP Verb;\nNP -> Adj Nuon;");

        assert_eq!(errors, vec![diagnostic(2, 11, LoadErrorType::UndefinedSymbol("Nuon".to_string()))]);
    }

    #[test]
    fn load_undefined_root() {
        let errors = load_errors("#GRAMMAR_ROOT Sentence\nS -> Noun;");

        assert_eq!(errors, vec![diagnostic(1, 15, LoadErrorType::UndefinedRoot("Sentence".to_string()))]);
    }

    #[test]
    fn load_empty_grammar() {
        assert_eq!(load_errors("// nothing here\n"), vec![
            Diagnostic { location: Location::default(), error: LoadErrorType::EmptyGrammar }
        ]);
    }

    #[test]
    fn broken_rules_are_not_undefined() {
        // `NP` fails to parse; only the syntax error is reported
        let errors = load_errors("S -> NP Verb;\nNP -> Adj<gnc-agr[1> Noun;");

        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0].error, LoadErrorType::Syntax(_)));
    }

    #[test]
    fn errors_are_collected_in_one_pass() {
        let text = "#GRAMMAR_ROOT S\nS -> A B\nA -> Adj<x[1]> Noun<y[1]>;\nB -> Adv Nothing;";
        let errors = load_errors(text);

        assert_eq!(errors, vec![
            diagnostic(2, 9, LoadErrorType::Syntax(SyntaxError::MissingSemicolon)),
            diagnostic(3, 16, LoadErrorType::IncompatibleFeatureSet {
                group: 1,
                reason: Incompatibility::Kinds(FeatureKind::from_name("x"), FeatureKind::from_name("y"))
            }),
            diagnostic(4, 10, LoadErrorType::UndefinedSymbol("Nothing".to_string()))
        ]);
    }

    #[test]
    fn failed_load_keeps_warnings() {
        let error = load("S -> Adj<gnc-agr[1]> Nothing;").unwrap_err();

        assert_eq!(error.diagnostics.len(), 2);
        assert_eq!(error.errors().count(), 1);
        assert!(error.to_string().contains("Nothing"));
    }

    #[test]
    fn load_missing_file() {
        let path = PathBuf::from("example_data/does_not_exist.cxx");
        let error = load_file(&path, &LoadOptions::default()).unwrap_err();

        assert_eq!(error.diagnostics, vec![Diagnostic {
            location: Location::file(path),
            error: LoadErrorType::FileError(IoError(std::io::Error::from(std::io::ErrorKind::NotFound)))
        }]);
    }
}

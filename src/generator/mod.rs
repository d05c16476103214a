/*
    This module samples derivations: it expands a grammar from a start symbol
    into a random sequence of terminals
*/

use rand::prelude::*;
use std::fmt::Display;
use std::path::PathBuf;

use itertools::Itertools;

use crate::grammar::*;
use crate::error_handling::*;

pub const DEFAULT_MAX_DEPTH: usize = 32;

#[derive(Debug, PartialEq)]
pub enum GenerateErrorType {
    // An undefined nonterminal was used
    UndefinedNonterminal(String),
    // Expansion nested deeper than the limit
    DepthExceeded(usize),
}

impl ErrorType for GenerateErrorType {}

impl Display for GenerateErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerateErrorType::UndefinedNonterminal(nonterminal) => write!(f, "No definition for nonterminal `{}`", nonterminal),
            GenerateErrorType::DepthExceeded(depth) => write!(f, "Derivation nested deeper than {} rules", depth),
        }
    }
}

pub type GenerateError = Error<GenerateErrorType>;
pub type GenResult = Result<Vec<SymbolId>, GenerateError>;

struct Generator<'g, R: Rng + ?Sized> {
    model: &'g GrammarModel,
    rng: &'g mut R,
    max_depth: usize,
    location: Location,
}

impl<R: Rng + ?Sized> Generator<'_, R> {
    fn error(&self, error: GenerateErrorType) -> GenerateError {
        GenerateError { location: self.location.clone(), error }
    }

    // Expands `start` depth first with an explicit stack, so deep derivations
    // end in `DepthExceeded` rather than exhausting the call stack
    fn generate(&mut self, start: SymbolId) -> GenResult {
        let model = self.model;
        let mut sentence = Vec::new();
        let mut pending = vec![(start, 0)];

        while let Some((symbol, depth)) = pending.pop() {
            if model.symbols().kind(symbol) != SymbolKind::Nonterminal && depth > 0 {
                sentence.push(symbol);
                continue;
            }
            if depth > self.max_depth {
                return Err(self.error(GenerateErrorType::DepthExceeded(self.max_depth)));
            }

            let rule = model.rule(symbol)
                .ok_or_else(|| self.error(GenerateErrorType::UndefinedNonterminal(model.name(symbol).to_string())))?;

            if let Some(production) = rule.productions.choose(&mut *self.rng) {
                pending.extend(production.rhs.iter().rev().map(|rhs| (rhs.symbol, depth + 1)));
            }
        }

        Ok(sentence)
    }
}

fn generate_from<R: Rng + ?Sized>(model: &GrammarModel, start: SymbolId, rng: &mut R, max_depth: usize, file: PathBuf) -> GenResult {
    let mut generator = Generator { model, rng, max_depth, location: Location::file(file) };
    generator.generate(start)
}

// Generates a terminal sequence starting from the grammar root
pub fn generate<R: Rng + ?Sized>(model: &GrammarModel, rng: &mut R, max_depth: usize, file: PathBuf) -> GenResult {
    generate_from(model, model.root(), rng, max_depth, file)
}

// Generates a terminal sequence starting with the given symbol
pub fn generate_with_override<R: Rng + ?Sized>(model: &GrammarModel, start: &str, rng: &mut R, max_depth: usize, file: PathBuf) -> GenResult {
    match model.symbols().lookup(start) {
        Some(id) => generate_from(model, id, rng, max_depth, file),
        None => Err(GenerateError {
            location: Location::file(file),
            error: GenerateErrorType::UndefinedNonterminal(start.to_string())
        }),
    }
}

pub fn render(model: &GrammarModel, sentence: &[SymbolId]) -> String {
    sentence.iter().map(|&id| model.symbols().entry(id)).join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{load_str, LoadOptions};

    fn model(text: &str) -> GrammarModel {
        load_str(text, &LoadOptions::default()).unwrap().model
    }

    #[test]
    fn generate_single_derivation() {
        let model = model("S -> NP Verb 'now';\nNP -> Adj Noun;");
        let mut rng = StdRng::seed_from_u64(7);

        let sentence = generate(&model, &mut rng, DEFAULT_MAX_DEPTH, PathBuf::new()).unwrap();

        assert_eq!(render(&model, &sentence), "Adj Noun Verb 'now'");
    }

    #[test]
    fn generate_only_derivable_sequences() {
        let model = model("S -> NP Verb | Adv Verb;\nNP -> Noun | Adj Noun;");
        let allowed = vec!["Noun Verb", "Adj Noun Verb", "Adv Verb"];
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..50 {
            let sentence = generate(&model, &mut rng, DEFAULT_MAX_DEPTH, PathBuf::new()).unwrap();
            assert!(allowed.contains(&render(&model, &sentence).as_str()));
        }
    }

    #[test]
    fn generate_is_reproducible() {
        let model = model("S -> NP Verb | Adv Verb | Verb;\nNP -> Noun | Adj Noun;");

        let first: Vec<_> = (0..10)
            .scan(StdRng::seed_from_u64(3), |rng, _| generate(&model, rng, DEFAULT_MAX_DEPTH, PathBuf::new()).ok())
            .collect();
        let second: Vec<_> = (0..10)
            .scan(StdRng::seed_from_u64(3), |rng, _| generate(&model, rng, DEFAULT_MAX_DEPTH, PathBuf::new()).ok())
            .collect();

        assert_eq!(first.len(), 10);
        assert_eq!(first, second);
    }

    #[test]
    fn generate_depth_limit() {
        let model = model("S -> S Noun;");
        let mut rng = StdRng::seed_from_u64(1);

        let error = generate(&model, &mut rng, 5, PathBuf::new()).unwrap_err();

        assert_eq!(error.error, GenerateErrorType::DepthExceeded(5));
    }

    #[test]
    fn generate_large_depth_limit() {
        let model = model("S -> S Noun;");
        let mut rng = StdRng::seed_from_u64(1);

        let error = generate(&model, &mut rng, 1_000_000, PathBuf::new()).unwrap_err();

        assert_eq!(error.error, GenerateErrorType::DepthExceeded(1_000_000));
    }

    #[test]
    fn generate_with_start_override() {
        let model = model("S -> NP Verb;\nNP -> Adj Noun;");
        let mut rng = StdRng::seed_from_u64(7);

        let sentence = generate_with_override(&model, "NP", &mut rng, DEFAULT_MAX_DEPTH, PathBuf::new()).unwrap();
        assert_eq!(render(&model, &sentence), "Adj Noun");

        let error = generate_with_override(&model, "VP", &mut rng, DEFAULT_MAX_DEPTH, PathBuf::new()).unwrap_err();
        assert_eq!(error.error, GenerateErrorType::UndefinedNonterminal("VP".to_string()));

        let error = generate_with_override(&model, "Noun", &mut rng, DEFAULT_MAX_DEPTH, PathBuf::new()).unwrap_err();
        assert_eq!(error.error, GenerateErrorType::UndefinedNonterminal("Noun".to_string()));
    }
}

use std::collections::{HashMap, HashSet};

use crate::grammar::{Production, Rule, SymbolId, SymbolKind, SymbolTable, TerminalCatalog};
use super::LoadErrorType::UndefinedSymbol;
use super::syntax::AlternativeAst;
use super::Findings;

// The parsed alternatives behind each rule's productions, in the same order
pub type RuleSources<'a> = Vec<Vec<&'a AlternativeAst>>;

// A name is defined when some rule has it on the left, the catalog knows it as
// a category, or its own statement failed to parse (already reported)
fn is_defined(id: SymbolId, symbols: &SymbolTable, catalog: &TerminalCatalog, broken: &[String]) -> bool {
    let name = symbols.name(id);
    match symbols.kind(id) {
        SymbolKind::Nonterminal | SymbolKind::Literal => true,
        SymbolKind::Terminal => catalog.contains(name) || broken.iter().any(|b| b == name),
    }
}

fn get_production_undefined_symbols(
    production: &Production,
    source: &AlternativeAst,
    symbols: &SymbolTable,
    catalog: &TerminalCatalog,
    broken: &[String]
) -> Findings {
    // Pair every symbol with where it was written, then keep the ones nothing
    // defines
    production.rhs.iter()
        .zip(&source.symbols)
        .filter(|(rhs, _)| !is_defined(rhs.symbol, symbols, catalog, broken))
        .map(|(rhs, ast)| (ast.position, UndefinedSymbol(symbols.name(rhs.symbol).to_owned())))
        .collect()
}

fn get_rule_undefined_symbols(
    rule: &Rule,
    sources: &[&AlternativeAst],
    symbols: &SymbolTable,
    catalog: &TerminalCatalog,
    broken: &[String]
) -> Findings {
    rule.productions.iter()
        .zip(sources)
        .flat_map(|(production, source)| get_production_undefined_symbols(production, source, symbols, catalog, broken))
        .collect()
}

pub fn get_undefined_symbols(
    rules: &[Rule],
    sources: &RuleSources,
    symbols: &SymbolTable,
    catalog: &TerminalCatalog,
    broken: &[String]
) -> Findings {
    // Get the undefined symbols of each rule, while flattening into all the
    // undefined symbols of the grammar
    rules.iter()
        .zip(sources)
        .flat_map(|(rule, sources)| get_rule_undefined_symbols(rule, sources, symbols, catalog, broken))
        .collect()
}

// The rules no derivation from `root` ever uses, in definition order
pub fn get_unreachable_rules(root: SymbolId, rules: &[Rule], symbols: &SymbolTable) -> Vec<SymbolId> {
    let by_lhs: HashMap<SymbolId, &Rule> = rules.iter().map(|rule| (rule.lhs, rule)).collect();

    let mut reached = HashSet::from([root]);
    let mut pending = vec![root];
    while let Some(id) = pending.pop() {
        let Some(rule) = by_lhs.get(&id) else {
            continue;
        };
        let children = rule.productions.iter()
            .flat_map(|production| production.rhs.iter())
            .map(|rhs| rhs.symbol)
            .filter(|&child| symbols.kind(child) == SymbolKind::Nonterminal);
        for child in children {
            if reached.insert(child) {
                pending.push(child);
            }
        }
    }

    rules.iter().map(|rule| rule.lhs).filter(|lhs| !reached.contains(lhs)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{Annotations, RhsSymbol};
    use crate::parser::lexer::Position;
    use crate::parser::syntax::{SymbolAst, SymbolName};

    fn rule(symbols: &mut SymbolTable, lhs: &str, alternatives: &[&[&str]]) -> Rule {
        Rule {
            lhs: symbols.intern(lhs),
            productions: alternatives.iter()
                .map(|names| Production {
                    rhs: names.iter()
                        .map(|name| RhsSymbol { symbol: symbols.intern(name), annotations: Annotations::default() })
                        .collect(),
                    agreements: Vec::new(),
                    normalizations: Vec::new()
                })
                .collect()
        }
    }

    fn source(names: &[&str], line: usize) -> AlternativeAst {
        AlternativeAst {
            symbols: names.iter()
                .enumerate()
                .map(|(i, name)| SymbolAst {
                    name: SymbolName::Name(name.to_string()),
                    annotations: Vec::new(),
                    position: Position { line, column: i + 1 }
                })
                .collect(),
            attributes: Vec::new(),
            position: Position { line, column: 1 }
        }
    }

    #[test]
    fn undefined_symbols() {
        let mut symbols = SymbolTable::new();
        let rules = vec![
            rule(&mut symbols, "S", &[&["NP", "Verb"], &["Mystery"]]),
            rule(&mut symbols, "NP", &[&["Adj", "Noun", "Broken"]])
        ];
        symbols.classify(rules.iter().map(|r| r.lhs));

        let s_sources = vec![source(&["NP", "Verb"], 1), source(&["Mystery"], 2)];
        let np_sources = vec![source(&["Adj", "Noun", "Broken"], 3)];
        let sources: RuleSources = vec![s_sources.iter().collect(), np_sources.iter().collect()];

        let undefined = get_undefined_symbols(&rules, &sources, &symbols, &TerminalCatalog::default(), &["Broken".to_string()]);

        assert_eq!(undefined, vec![(Position { line: 2, column: 1 }, UndefinedSymbol("Mystery".to_string()))]);
    }

    #[test]
    fn unreachable_rules() {
        let mut symbols = SymbolTable::new();
        let rules = vec![
            rule(&mut symbols, "S", &[&["A"], &["B", "Noun"]]),
            rule(&mut symbols, "A", &[&["Adj"]]),
            rule(&mut symbols, "B", &[&["B", "Adv"]]),
            rule(&mut symbols, "C", &[&["S"]])
        ];
        symbols.classify(rules.iter().map(|r| r.lhs));

        let unreachable = get_unreachable_rules(rules[0].lhs, &rules, &symbols);

        assert_eq!(unreachable, vec![rules[3].lhs]);
    }
}

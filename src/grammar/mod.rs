/*
    This module is for storing loaded grammars. A model is only built by the
    loader in `crate::parser` and never changes afterwards.
*/

pub mod features;
pub mod symbols;

use std::fmt::Display;

use itertools::Itertools;

pub use features::{Feature, FeatureKind, FeatureSet, Grammeme, TerminalCatalog};
pub use symbols::{SymbolEntry, SymbolId, SymbolKind, SymbolTable};

// `kind[group]` written inside a symbol's angle brackets
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRef {
    pub kind: FeatureKind,
    pub group: u32,
}

impl Display for FeatureRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]", self.kind, self.group)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Annotations {
    pub agreements: Vec<FeatureRef>,
    // `rt`: the symbol is the head of the phrase
    pub head: bool,
    // `gram="..."`: grammemes the matched word must carry
    pub grammemes: Vec<Grammeme>,
}

impl Annotations {
    pub fn is_empty(&self) -> bool {
        self.agreements.is_empty() && !self.head && self.grammemes.is_empty()
    }
}

impl Display for Annotations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = self.agreements.iter().map(ToString::to_string).collect_vec();
        if self.head {
            parts.push("rt".to_string());
        }
        if !self.grammemes.is_empty() {
            parts.push(format!("gram=\"{}\"", features::format_grammemes(&self.grammemes)));
        }
        write!(f, "{}", parts.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RhsSymbol {
    pub symbol: SymbolId,
    pub annotations: Annotations,
}

// Positions of a production's right hand side that must agree on `features`
#[derive(Debug, Clone, PartialEq)]
pub struct AgreementGroup {
    pub index: u32,
    pub kind: FeatureKind,
    pub members: Vec<usize>,
    // Empty for custom kinds, which are compared by name only
    pub features: FeatureSet,
}

// `Fact.field::norm="m,sg"`: how the matched phrase fills a fact field
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizationDirective {
    pub fact: String,
    pub field: String,
    pub form: Option<Vec<Grammeme>>,
}

impl Display for NormalizationDirective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.fact, self.field)?;
        if let Some(form) = &self.form {
            write!(f, "::norm=\"{}\"", features::format_grammemes(form))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Production {
    pub rhs: Vec<RhsSymbol>,
    pub agreements: Vec<AgreementGroup>,
    pub normalizations: Vec<NormalizationDirective>,
}

impl Production {
    // The agreement groups the symbol at `position` takes part in
    pub fn groups_at(&self, position: usize) -> impl Iterator<Item = &AgreementGroup> {
        self.agreements.iter().filter(move |group| group.members.contains(&position))
    }
}

// All alternatives of one nonterminal
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub lhs: SymbolId,
    pub productions: Vec<Production>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GrammarModel {
    pub(crate) encoding: Option<String>,
    pub(crate) root: SymbolId,
    pub(crate) symbols: SymbolTable,
    pub(crate) rules: Vec<Rule>,
}

impl GrammarModel {
    pub fn root(&self) -> SymbolId {
        self.root
    }

    pub fn encoding(&self) -> Option<&str> {
        self.encoding.as_deref()
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn name(&self, id: SymbolId) -> &str {
        self.symbols.name(id)
    }

    // Rules in order of their first definition
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule(&self, lhs: SymbolId) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.lhs == lhs)
    }

    pub fn rule_by_name(&self, name: &str) -> Option<&Rule> {
        self.symbols.lookup(name).and_then(|id| self.rule(id))
    }

    fn render_symbol(&self, symbol: &RhsSymbol) -> String {
        let name = self.symbols.entry(symbol.symbol).to_string();
        if symbol.annotations.is_empty() {
            name
        } else {
            format!("{}<{}>", name, symbol.annotations)
        }
    }

    fn render_production(&self, production: &Production) -> String {
        let mut text = production.rhs.iter().map(|symbol| self.render_symbol(symbol)).join(" ");
        if !production.normalizations.is_empty() {
            text.push_str(&format!(" interp ({})", production.normalizations.iter().join(", ")));
        }
        text
    }
}

// Writes the model back in the statement grammar it was loaded from
impl Display for GrammarModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(encoding) = &self.encoding {
            writeln!(f, "#encoding \"{}\"", encoding)?;
        }
        writeln!(f, "#GRAMMAR_ROOT {}", self.name(self.root))?;

        for rule in &self.rules {
            let name = self.name(rule.lhs);
            let separator = format!(" |\n{}", " ".repeat(name.chars().count() + 4));
            let alternatives = rule.productions.iter().map(|p| self.render_production(p)).join(&separator);
            writeln!(f)?;
            write!(f, "{} -> {};", name, alternatives)?;
        }
        writeln!(f)
    }
}

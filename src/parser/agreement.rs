use std::collections::HashMap;
use std::fmt::Display;

use crate::grammar::{AgreementGroup, FeatureKind, FeatureSet, RhsSymbol, SymbolKind, SymbolTable, TerminalCatalog};

#[derive(Debug, PartialEq, Clone)]
pub enum Incompatibility {
    // Two members name different kinds
    Kinds(FeatureKind, FeatureKind),
    // A category has none of the features the group agrees on
    Vocabulary { category: String, kind: FeatureKind },
}

impl Display for Incompatibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Incompatibility::Kinds(a, b) => write!(f, "`{}` cannot agree with `{}`", a, b),
            Incompatibility::Vocabulary { category, kind } => {
                write!(f, "`{}` has none of the features `{}` agrees on", category, kind)
            }
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum AgreementProblem {
    // Only one symbol uses the group index, so nothing is constrained
    Degenerate(u32),
    Incompatible { group: u32, reason: Incompatibility },
}

// Each problem comes with the right hand side position it was found at
pub type Problems = Vec<(usize, AgreementProblem)>;

type Members<'a> = Vec<(usize, &'a FeatureKind)>;

// Groups the agreement references of one production by index. Groups come out
// in order of their first member.
pub fn resolve_agreements(rhs: &[RhsSymbol], symbols: &SymbolTable, catalog: &TerminalCatalog) -> (Vec<AgreementGroup>, Problems) {
    let mut order = Vec::new();
    let mut members: HashMap<u32, Members> = HashMap::new();

    for (position, symbol) in rhs.iter().enumerate() {
        for reference in &symbol.annotations.agreements {
            members.entry(reference.group)
                .or_insert_with(|| {
                    order.push(reference.group);
                    Vec::new()
                })
                .push((position, &reference.kind));
        }
    }

    let mut groups = Vec::new();
    let mut problems = Vec::new();

    for index in order {
        let group = &members[&index];
        if group.len() < 2 {
            problems.push((group[0].0, AgreementProblem::Degenerate(index)));
            continue;
        }

        match reconcile(index, group, rhs, symbols, catalog) {
            Ok(resolved) => groups.push(resolved),
            Err((position, reason)) => problems.push((position, AgreementProblem::Incompatible { group: index, reason })),
        }
    }

    (groups, problems)
}

fn reconcile(
    index: u32,
    group: &Members,
    rhs: &[RhsSymbol],
    symbols: &SymbolTable,
    catalog: &TerminalCatalog
) -> Result<AgreementGroup, (usize, Incompatibility)> {
    let kind = group[0].1;
    for &(position, other) in &group[1..] {
        if !kind.is_compatible(other) {
            return Err((position, Incompatibility::Kinds(kind.clone(), other.clone())));
        }
    }

    // Terminal categories may expose fewer features than the kind asks for;
    // the group agrees on what every member has
    let mut features = kind.features().unwrap_or_default();
    if kind.features().is_some() {
        for &(position, _) in group {
            let id = rhs[position].symbol;
            if symbols.kind(id) != SymbolKind::Terminal {
                continue;
            }

            let category = symbols.name(id);
            if let Some(vocabulary) = catalog.vocabulary(category) {
                features = features.intersection(vocabulary).copied().collect::<FeatureSet>();
                if features.is_empty() {
                    return Err((position, Incompatibility::Vocabulary {
                        category: category.to_string(),
                        kind: kind.clone()
                    }));
                }
            }
        }
    }

    Ok(AgreementGroup {
        index,
        kind: kind.clone(),
        members: group.iter().map(|(position, _)| *position).collect(),
        features,
    })
}

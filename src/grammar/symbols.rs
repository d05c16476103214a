use std::collections::HashMap;
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolId(u32);

impl SymbolId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    // Defined by at least one rule
    Nonterminal,
    // A part-of-speech category supplied by the morphological analyzer
    Terminal,
    // A quoted word matched literally
    Literal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolEntry {
    pub name: String,
    pub kind: SymbolKind,
}

impl Display for SymbolEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            SymbolKind::Literal => write!(f, "'{}'", self.name),
            _ => write!(f, "{}", self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SymbolTable {
    entries: Vec<SymbolEntry>,
    names: HashMap<String, SymbolId>,
    literals: HashMap<String, SymbolId>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    fn push(&mut self, name: &str, kind: SymbolKind) -> SymbolId {
        let id = SymbolId(self.entries.len() as u32);
        self.entries.push(SymbolEntry { name: name.to_string(), kind });
        id
    }

    // Names start out as terminals until `classify` has seen every rule
    pub fn intern(&mut self, name: &str) -> SymbolId {
        if let Some(&id) = self.names.get(name) {
            return id;
        }
        let id = self.push(name, SymbolKind::Terminal);
        self.names.insert(name.to_string(), id);
        id
    }

    pub fn intern_literal(&mut self, text: &str) -> SymbolId {
        if let Some(&id) = self.literals.get(text) {
            return id;
        }
        let id = self.push(text, SymbolKind::Literal);
        self.literals.insert(text.to_string(), id);
        id
    }

    // Marks every rule's left hand side as a nonterminal
    pub fn classify(&mut self, lhs: impl IntoIterator<Item = SymbolId>) {
        for id in lhs {
            self.entries[id.index()].kind = SymbolKind::Nonterminal;
        }
    }

    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.names.get(name).copied()
    }

    // The root must be a name defined by some rule
    pub fn resolve_root(&self, name: &str) -> Option<SymbolId> {
        self.lookup(name).filter(|&id| self.kind(id) == SymbolKind::Nonterminal)
    }

    pub fn entry(&self, id: SymbolId) -> &SymbolEntry {
        &self.entries[id.index()]
    }

    pub fn name(&self, id: SymbolId) -> &str {
        &self.entry(id).name
    }

    pub fn kind(&self, id: SymbolId) -> SymbolKind {
        self.entry(id).kind
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &SymbolEntry)> {
        self.entries.iter().enumerate().map(|(i, entry)| (SymbolId(i as u32), entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_idempotent() {
        let mut table = SymbolTable::new();
        let s = table.intern("S");
        let adj = table.intern("Adj");

        assert_ne!(s, adj);
        assert_eq!(table.intern("S"), s);
        assert_eq!(table.intern("Adj"), adj);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn literals_do_not_clash_with_names() {
        let mut table = SymbolTable::new();
        let name = table.intern("word");
        let literal = table.intern_literal("word");

        assert_ne!(name, literal);
        assert_eq!(table.kind(literal), SymbolKind::Literal);
        assert_eq!(table.entry(literal).to_string(), "'word'");
        assert_eq!(table.lookup("word"), Some(name));
    }

    #[test]
    fn classify_marks_nonterminals() {
        let mut table = SymbolTable::new();
        let s = table.intern("S");
        let noun = table.intern("Noun");
        table.classify([s]);

        assert_eq!(table.kind(s), SymbolKind::Nonterminal);
        assert_eq!(table.kind(noun), SymbolKind::Terminal);
        assert_eq!(table.resolve_root("S"), Some(s));
        assert_eq!(table.resolve_root("Noun"), None);
        assert_eq!(table.resolve_root("T"), None);
    }
}

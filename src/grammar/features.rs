/*
    Morphological features, agreement kinds, grammemes and the catalog of
    part-of-speech categories a grammar may use as terminals
*/

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

use itertools::Itertools;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Feature {
    Gender,
    Number,
    Case,
    Person,
}

pub type FeatureSet = BTreeSet<Feature>;

impl Feature {
    pub const ALL: [Feature; 4] = [Feature::Gender, Feature::Number, Feature::Case, Feature::Person];

    pub fn name(self) -> &'static str {
        match self {
            Feature::Gender => "gender",
            Feature::Number => "number",
            Feature::Case => "case",
            Feature::Person => "person",
        }
    }

    pub fn from_name(name: &str) -> Option<Feature> {
        Feature::ALL.into_iter().find(|feature| feature.name().eq_ignore_ascii_case(name))
    }
}

impl Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn feature_set(features: &[Feature]) -> FeatureSet {
    features.iter().copied().collect()
}

// The kind of agreement named inside `Symbol<kind[index]>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    GenderNumberCase,
    GenderNumber,
    NumberCase,
    Case,
    FeminineCase,
    AfterNumber,
    SubjectPredicate,
    // A kind this crate has no vocabulary for; only agrees with itself
    Custom(String),
}

impl FeatureKind {
    pub fn from_name(name: &str) -> FeatureKind {
        match name {
            "gnc-agr" => FeatureKind::GenderNumberCase,
            "gn-agr" => FeatureKind::GenderNumber,
            "nc-agr" => FeatureKind::NumberCase,
            "c-agr" => FeatureKind::Case,
            "fem-c-agr" => FeatureKind::FeminineCase,
            "after-num-agr" => FeatureKind::AfterNumber,
            "sp-agr" => FeatureKind::SubjectPredicate,
            other => FeatureKind::Custom(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            FeatureKind::GenderNumberCase => "gnc-agr",
            FeatureKind::GenderNumber => "gn-agr",
            FeatureKind::NumberCase => "nc-agr",
            FeatureKind::Case => "c-agr",
            FeatureKind::FeminineCase => "fem-c-agr",
            FeatureKind::AfterNumber => "after-num-agr",
            FeatureKind::SubjectPredicate => "sp-agr",
            FeatureKind::Custom(name) => name,
        }
    }

    // The features the kind requires to be equal, None for custom kinds
    pub fn features(&self) -> Option<FeatureSet> {
        use Feature::*;

        let features = match self {
            FeatureKind::GenderNumberCase => feature_set(&[Gender, Number, Case]),
            FeatureKind::GenderNumber => feature_set(&[Gender, Number]),
            FeatureKind::NumberCase | FeatureKind::AfterNumber => feature_set(&[Number, Case]),
            FeatureKind::Case | FeatureKind::FeminineCase => feature_set(&[Case]),
            FeatureKind::SubjectPredicate => feature_set(&[Gender, Number, Person]),
            FeatureKind::Custom(_) => return None,
        };
        Some(features)
    }

    // Members of one group must name the same kind. Kinds that share a
    // feature set stay distinct: `fem-c-agr` also requires feminine gender.
    pub fn is_compatible(&self, other: &FeatureKind) -> bool {
        self == other
    }
}

impl Display for FeatureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Grammeme {
    Masculine,
    Feminine,
    Neuter,
    Singular,
    Plural,
    Nominative,
    Genitive,
    Dative,
    Accusative,
    Instrumental,
    Locative,
    FirstPerson,
    SecondPerson,
    ThirdPerson,
    Infinitive,
}

// Grammemes of one category exclude each other
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrammemeCategory {
    Feature(Feature),
    VerbForm,
}

const GRAMMEMES: [(&str, Grammeme); 15] = [
    ("m", Grammeme::Masculine),
    ("f", Grammeme::Feminine),
    ("n", Grammeme::Neuter),
    ("sg", Grammeme::Singular),
    ("pl", Grammeme::Plural),
    ("nom", Grammeme::Nominative),
    ("gen", Grammeme::Genitive),
    ("dat", Grammeme::Dative),
    ("acc", Grammeme::Accusative),
    ("ins", Grammeme::Instrumental),
    ("loc", Grammeme::Locative),
    ("1p", Grammeme::FirstPerson),
    ("2p", Grammeme::SecondPerson),
    ("3p", Grammeme::ThirdPerson),
    ("inf", Grammeme::Infinitive),
];

impl Grammeme {
    pub fn abbreviation(self) -> &'static str {
        GRAMMEMES.iter()
            .find(|(_, grammeme)| *grammeme == self)
            .map(|(abbreviation, _)| *abbreviation)
            .unwrap_or_default()
    }

    pub fn from_abbreviation(text: &str) -> Option<Grammeme> {
        GRAMMEMES.iter()
            .find(|(abbreviation, _)| *abbreviation == text)
            .map(|(_, grammeme)| *grammeme)
    }

    pub fn category(self) -> GrammemeCategory {
        use Grammeme::*;

        match self {
            Masculine | Feminine | Neuter => GrammemeCategory::Feature(Feature::Gender),
            Singular | Plural => GrammemeCategory::Feature(Feature::Number),
            Nominative | Genitive | Dative | Accusative | Instrumental | Locative => GrammemeCategory::Feature(Feature::Case),
            FirstPerson | SecondPerson | ThirdPerson => GrammemeCategory::Feature(Feature::Person),
            Infinitive => GrammemeCategory::VerbForm,
        }
    }
}

impl Display for Grammeme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GrammemeError {
    // The list has nothing in it
    Empty,
    // A grammeme this crate does not know
    Unknown(String),
    // Two grammemes of the same category
    Conflict(Grammeme, Grammeme),
}

impl Display for GrammemeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GrammemeError::Empty => write!(f, "Empty grammeme list"),
            GrammemeError::Unknown(text) => write!(f, "Unknown grammeme `{}`", text),
            GrammemeError::Conflict(a, b) => write!(f, "Grammemes `{}` and `{}` contradict each other", a, b),
        }
    }
}

// Parses a comma separated grammeme list such as `m,sg`
pub fn parse_grammemes(text: &str) -> Result<Vec<Grammeme>, GrammemeError> {
    let mut grammemes: Vec<Grammeme> = Vec::new();

    for part in text.split(',').map(str::trim).filter(|part| !part.is_empty()) {
        let grammeme = Grammeme::from_abbreviation(part)
            .ok_or_else(|| GrammemeError::Unknown(part.to_string()))?;

        if let Some(&earlier) = grammemes.iter().find(|g| g.category() == grammeme.category()) {
            return Err(GrammemeError::Conflict(earlier, grammeme));
        }
        grammemes.push(grammeme);
    }

    if grammemes.is_empty() {
        return Err(GrammemeError::Empty);
    }
    Ok(grammemes)
}

pub fn format_grammemes(grammemes: &[Grammeme]) -> String {
    grammemes.iter().join(",")
}

// The part-of-speech categories recognized as terminals. A category either
// exposes a fixed feature vocabulary or is unrestricted (None).
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalCatalog {
    categories: BTreeMap<String, Option<FeatureSet>>,
}

impl TerminalCatalog {
    pub fn empty() -> Self {
        TerminalCatalog { categories: BTreeMap::new() }
    }

    pub fn insert(&mut self, name: &str, vocabulary: Option<FeatureSet>) {
        self.categories.insert(name.to_string(), vocabulary);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.categories.contains_key(name)
    }

    // The features a category can agree on. None when the category is
    // unrestricted or not in the catalog.
    pub fn vocabulary(&self, name: &str) -> Option<&FeatureSet> {
        self.categories.get(name).and_then(Option::as_ref)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    // Parses `NAME` (unrestricted) or `NAME=gender,number` as given on the
    // command line
    pub fn parse_declaration(declaration: &str) -> Result<(String, Option<FeatureSet>), String> {
        let (name, features) = match declaration.split_once('=') {
            Some((name, features)) => (name.trim(), Some(features)),
            None => (declaration.trim(), None),
        };

        if name.is_empty() {
            return Err(format!("Missing category name in `{}`", declaration));
        }

        let vocabulary = features
            .map(|features| features.split(',')
                .map(str::trim)
                .filter(|feature| !feature.is_empty())
                .map(|feature| Feature::from_name(feature).ok_or_else(|| format!("Unknown feature `{}`", feature)))
                .collect::<Result<FeatureSet, String>>())
            .transpose()?;

        Ok((name.to_string(), vocabulary))
    }
}

impl Default for TerminalCatalog {
    fn default() -> Self {
        use Feature::*;

        let mut catalog = TerminalCatalog::empty();
        catalog.insert("Noun", Some(feature_set(&[Gender, Number, Case, Person])));
        catalog.insert("Adj", Some(feature_set(&[Gender, Number, Case])));
        catalog.insert("Participle", Some(feature_set(&[Gender, Number, Case])));
        catalog.insert("Verb", Some(feature_set(&[Gender, Number, Person])));
        catalog.insert("Numeral", Some(feature_set(&[Gender, Case])));
        for closed in ["Adv", "Prep", "Conj", "Part", "Interj", "Punct", "Comma", "Hyphen"] {
            catalog.insert(closed, Some(FeatureSet::new()));
        }
        catalog.insert("Word", None);
        catalog.insert("AnyWord", None);
        catalog
    }
}

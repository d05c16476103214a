/*
    Loads grammar files for a fact-extraction parser: context-free rules whose
    symbols carry morphological agreement constraints and whose alternatives
    carry output normalization directives
*/

pub mod error_handling;
pub mod generator;
pub mod grammar;
pub mod parser;

pub use grammar::GrammarModel;
pub use parser::{load_file, load_str, LoadError, LoadOptions, Loaded};

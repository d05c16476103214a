use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use concord::generator::DEFAULT_MAX_DEPTH;
use concord::grammar::TerminalCatalog;
use concord::LoadOptions;

#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    /// Extra terminal category, as NAME or NAME=feature,feature
    #[arg(short, long = "terminal", value_name = "CATEGORY", global = true)]
    pub terminals: Vec<String>,

    /// Fail when the grammar loads with warnings
    #[arg(long, global = true)]
    pub deny_warnings: bool,

    /// Log more (repeat for more detail)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command
}

#[derive(Subcommand)]
pub enum Command {
    /// Load a grammar and report every problem in it
    Check {
        /// File containing the grammar
        file: PathBuf
    },

    /// Print the grammar as it was understood
    Print {
        /// File containing the grammar
        file: PathBuf
    },

    /// Print random derivations of the grammar
    Sample {
        /// File containing the grammar
        file: PathBuf,

        /// Start symbol (default: the grammar root)
        #[arg(short, long, value_name = "SYMBOL")]
        start: Option<String>,

        /// Amount to generate (default: 1)
        #[arg(short = 'n', long, value_name = "AMOUNT")]
        amount: Option<u32>,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// How deeply rules may nest
        #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
        max_depth: usize
    }
}

impl Command {
    pub fn file(&self) -> &PathBuf {
        match self {
            Command::Check { file } | Command::Print { file } | Command::Sample { file, .. } => file,
        }
    }
}

impl Cli {
    pub fn load_options(&self) -> Result<LoadOptions, String> {
        self.terminals.iter().try_fold(LoadOptions::default(), |options, declaration| {
            let (name, vocabulary) = TerminalCatalog::parse_declaration(declaration)?;
            Ok(options.with_terminal(&name, vocabulary))
        })
    }
}

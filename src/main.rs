mod cli;

use std::path::Path;
use std::process;

use clap::Parser;
use log::{debug, warn, LevelFilter};
use rand::prelude::*;

use concord::generator::{self, render};
use concord::grammar::SymbolKind;
use concord::{load_file, GrammarModel};
use cli::{Cli, Command};

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    // RUST_LOG still overrides the flag
    env_logger::Builder::new().filter_level(level).parse_default_env().init();
}

fn sample(model: &GrammarModel, file: &Path, start: Option<&str>, amount: u32, seed: Option<u64>, max_depth: usize) {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    for _ in 0..amount {
        let generated = match start {
            Some(start) => generator::generate_with_override(model, start, &mut rng, max_depth, file.to_path_buf()),
            None => generator::generate(model, &mut rng, max_depth, file.to_path_buf()),
        };
        match generated {
            Ok(sentence) => println!("{}", render(model, &sentence)),
            Err(error) => {
                eprintln!("{}", error);
                process::exit(1);
            }
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let options = match cli.load_options() {
        Ok(options) => options,
        Err(error) => {
            eprintln!("Error: {}", error);
            process::exit(2);
        }
    };

    debug!("terminal categories: {}", options.terminals.names().collect::<Vec<_>>().join(", "));

    let file = cli.command.file();
    let loaded = match load_file(file, &options) {
        Ok(loaded) => loaded,
        Err(error) => {
            eprintln!("{}", error);
            process::exit(1);
        }
    };

    for warning in &loaded.warnings {
        eprintln!("{}", warning);
    }
    if cli.deny_warnings && !loaded.warnings.is_empty() {
        warn!("{} warnings with --deny-warnings", loaded.warnings.len());
        process::exit(1);
    }

    match &cli.command {
        Command::Check { .. } => {
            let terminals = loaded.model.symbols().iter().filter(|(_, entry)| entry.kind != SymbolKind::Nonterminal).count();
            println!(
                "{}: {} rules, {} terminals, {} warnings",
                file.display(),
                loaded.model.rules().len(),
                terminals,
                loaded.warnings.len()
            )
        }
        Command::Print { .. } => print!("{}", loaded.model),
        Command::Sample { start, amount, seed, max_depth, .. } => {
            sample(&loaded.model, file, start.as_deref(), amount.unwrap_or(1), *seed, *max_depth)
        }
    }
}

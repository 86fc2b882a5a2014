//! Command-line driver: runs the generation pipeline against a built-in
//! demo specification and prints the resulting test cases.

mod demo;

use clap::{Parser, Subcommand};
use restest_lang::pretty::{pretty_print, pretty_print_spec};
use restest_lang::ConcreteEnv;
use restest_see::Z3Solver;
use restest_tester::{AtcGenerator, Tester, TesterError};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
enum CliError {
    #[error("generation failed: {0}")]
    Generation(#[from] TesterError),

    #[error("unknown scenario name: {0}")]
    UnknownScenario(String),
}

#[derive(Parser)]
#[command(name = "restest", version)]
#[command(about = "Generate executable test cases for stateful HTTP APIs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the built-in demo specification
    Spec,

    /// Generate the abstract test case for a scenario
    Atc {
        /// API block names, in call order
        #[arg(value_name = "BLOCK", default_values_t = vec!["f1".to_string()])]
        scenario: Vec<String>,
    },

    /// Generate and print the concrete test case for a scenario
    Ctc {
        /// API block names, in call order
        #[arg(value_name = "BLOCK", default_values_t = vec!["f1".to_string()])]
        scenario: Vec<String>,

        /// Also print the intermediate abstract test case
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(e) = run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    let (spec, symbols) = demo::demo_spec();

    match cli.command {
        Commands::Spec => {
            print!("{}", pretty_print_spec(&spec));
            Ok(())
        }
        Commands::Atc { scenario } => {
            check_scenario(&scenario)?;
            let atc = AtcGenerator::new(&spec, &symbols).generate(&scenario);
            print!("{}", pretty_print(&atc));
            Ok(())
        }
        Commands::Ctc { scenario, verbose } => {
            check_scenario(&scenario)?;
            let atc = AtcGenerator::new(&spec, &symbols).generate(&scenario);
            if verbose {
                println!("--- abstract test case ---");
                print!("{}", pretty_print(&atc));
                println!("--- concrete test case ---");
            }

            let factory = demo::DemoFactory::new();
            let solver = Z3Solver::with_type_map(demo::demo_type_map());
            let mut tester = Tester::new(Box::new(factory), Box::new(solver));
            let mut env = ConcreteEnv::new();

            let ctc = tester.generate_ctc(atc, Vec::new(), &mut env)?;
            info!(statements = ctc.len(), "generation finished");
            print!("{}", pretty_print(&ctc));
            Ok(())
        }
    }
}

fn check_scenario(scenario: &[String]) -> Result<(), CliError> {
    for name in scenario {
        if !demo::BLOCK_NAMES.contains(&name.as_str()) {
            return Err(CliError::UnknownScenario(name.clone()));
        }
    }
    Ok(())
}

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

mod repl;
mod runner;

#[derive(Parser)]
#[command(name = "eidos")]
#[command(about = "Eidos scripting language interpreter", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an Eidos script
    Run {
        /// Path to the script file
        file: PathBuf,

        /// Defined constants, as name=expr
        #[arg(short = 'd', long = "define")]
        defines: Vec<String>,
    },

    /// Start the interactive REPL
    Repl {
        /// Defined constants, as name=expr
        #[arg(short = 'd', long = "define")]
        defines: Vec<String>,
    },

    /// Show version information
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    eidos_interp::warmup();

    match cli.command {
        Commands::Run { file, defines } => {
            runner::run_file(&file, &defines);
        }

        Commands::Repl { defines } => {
            println!("{}", "Eidos REPL".bright_cyan().bold());
            println!("{}", "Type :help for commands".bright_black());
            println!();
            repl::start_repl(&defines)?;
        }

        Commands::Version => {
            println!(
                "{} {}",
                "Eidos".bright_cyan().bold(),
                env!("CARGO_PKG_VERSION")
            );
        }
    }

    Ok(())
}

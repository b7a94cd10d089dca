pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use crate::commands::export::ExportArgs;

#[derive(Debug, Parser)]
#[command(
    name = "claimflow",
    about = "Claimflow operator CLI",
    long_about = "Import and export claim spreadsheets, inspect role dashboards, and seed the reference dataset.",
    after_help = "Examples:\n  claimflow demo --output-dir exports\n  claimflow export --status approved --output-dir exports\n  claimflow dashboard --email JMhr@work.com"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Import a claims CSV; rows with id 0 become new pending claims")]
    Import {
        #[arg(help = "Path to the CSV file to import")]
        file: PathBuf,
        #[arg(long, help = "Export the imported claims into this directory")]
        output_dir: Option<PathBuf>,
    },
    #[command(about = "Export demo claims as CSV, optionally filtered by status or viewer")]
    Export {
        #[arg(long, default_value = "all", help = "all|pending|underreview|approved|rejected")]
        status: String,
        #[arg(long, help = "Only export claims visible to this demo user")]
        email: Option<String>,
        #[arg(long, help = "Write the combined users and claims backup instead")]
        all_data: bool,
        #[arg(long, default_value = ".", help = "Directory the export file is written to")]
        output_dir: PathBuf,
    },
    #[command(about = "Show the dashboard a demo user sees after signing in")]
    Dashboard {
        #[arg(long, help = "Email address of the demo user")]
        email: String,
    },
    #[command(about = "Seed the demo users and claims and print a summary")]
    Demo {
        #[arg(long, help = "Also write the combined backup into this directory")]
        output_dir: Option<PathBuf>,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Import { file, output_dir } => {
            commands::import::run(&file, output_dir.as_deref())
        }
        Command::Export { status, email, all_data, output_dir } => {
            commands::export::run(&ExportArgs { status, email, all_data }, &output_dir)
        }
        Command::Dashboard { email } => commands::dashboard::run(&email),
        Command::Demo { output_dir } => commands::demo::run(output_dir.as_deref()),
        Command::Config => commands::config::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

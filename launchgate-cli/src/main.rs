use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::*;
use launchgate_core::logging::{init_tracing_to, LogOutput};
use launchgate_rules::Decision;

mod commands;

use commands::{check, lint, CliError, LintFinding};

#[derive(Parser)]
#[command(name = "launchgate")]
#[command(about = "LaunchGate - launch authorization rules", long_about = None)]
struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a start request against a rules file or directory
    Check {
        #[arg(long, env = "LAUNCHGATE_RULES_PATH")]
        rules: PathBuf,
        #[arg(long)]
        app: String,
        #[arg(long)]
        version: String,
        #[arg(long)]
        ip: String,
    },
    /// Report rules whose version or IP expressions can never match
    Lint {
        #[arg(long, env = "LAUNCHGATE_RULES_PATH")]
        rules: PathBuf,
    },
    /// Show version information
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_tracing_to(Some(&cli.log_level), LogOutput::Stderr) {
        eprintln!("failed to initialise tracing: {err}");
    }

    match run(cli.command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {err}", "error:".red().bold());
            ExitCode::from(2)
        }
    }
}

fn run(command: Commands) -> Result<ExitCode, CliError> {
    match command {
        Commands::Check {
            rules,
            app,
            version,
            ip,
        } => match check(&rules, &app, &version, &ip)? {
            Decision::Granted { detail } => {
                println!("{} {detail}", "granted:".green().bold());
                Ok(ExitCode::SUCCESS)
            }
            Decision::Denied => {
                println!("{}", "denied".red().bold());
                Ok(ExitCode::FAILURE)
            }
        },
        Commands::Lint { rules } => {
            let findings = lint(&rules)?;
            print_findings(&findings);
            if findings.iter().all(LintFinding::is_clean) {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Commands::Version => {
            println!("LaunchGate v{}", env!("CARGO_PKG_VERSION"));
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_findings(findings: &[LintFinding]) {
    for finding in findings {
        if finding.is_clean() {
            println!(
                "{} rule #{} ({})",
                "ok".green().bold(),
                finding.position,
                finding.app
            );
            continue;
        }

        println!(
            "{} rule #{} ({})",
            "invalid".red().bold(),
            finding.position,
            finding.app
        );
        for problem in &finding.problems {
            println!("  - {problem}");
        }
    }

    let invalid = findings.iter().filter(|finding| !finding.is_clean()).count();
    println!("{} rules checked, {} invalid", findings.len(), invalid);
}

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;

mod commands;
mod completion;
mod config;
mod logging;
mod render;

use commands::{
    run_flatten_command, run_latest_revision_command, run_normalize_command,
    run_report_command, NormalizeFlags,
};
use completion::write_completions_script;
use config::load_config;
use render::{OutputStyle, TerminalRenderer};

#[derive(Parser, Debug)]
#[command(name = "shedkit")]
#[command(about = "Prepare tool shed repositories for installation and testing", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to ~/.config/shedkit/config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Tool shed used for entries that do not name one
    #[arg(long, global = true, env = "SHEDKIT_TOOL_SHED_URL")]
    tool_shed_url: Option<String>,
    /// Disable colors and progress bars
    #[arg(long, global = true)]
    plain: bool,
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print one install request per repository revision
    Flatten { tool_list: PathBuf },
    /// Resolve every entry of a tool list into a complete install job
    Normalize {
        tool_list: PathBuf,
        /// Ignore pinned revisions and use the newest installable one
        #[arg(long)]
        latest: bool,
        /// Accept entries without a tool panel section
        #[arg(long)]
        no_require_section: bool,
    },
    /// Print the newest installable revision of a repository
    LatestRevision { name: String, owner: String },
    /// Summarise a job data file written by tool test runs
    Report { job_data: PathBuf },
    /// Print a shell completion script
    Completion { shell: Shell },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = logging::init(cli.verbose) {
        eprintln!("warning: {err:#}");
    }

    match run_cli(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run_cli(cli: Cli) -> Result<ExitCode> {
    let style = if cli.plain || !std::io::stdout().is_terminal() {
        OutputStyle::Plain
    } else {
        OutputStyle::Rich
    };
    let renderer = TerminalRenderer::from_style(style);

    match cli.command {
        Commands::Flatten { tool_list } => {
            println!("{}", run_flatten_command(&tool_list)?);
        }
        Commands::Normalize {
            tool_list,
            latest,
            no_require_section,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let flags = NormalizeFlags {
                tool_shed_url: cli.tool_shed_url,
                force_latest_revision: latest,
                require_tool_panel_info: !no_require_section,
            };
            println!(
                "{}",
                run_normalize_command(&tool_list, &config, &flags, renderer)?
            );
        }
        Commands::LatestRevision { name, owner } => {
            let config = load_config(cli.config.as_deref())?;
            let revision =
                run_latest_revision_command(&name, &owner, cli.tool_shed_url.as_deref(), &config)?;
            println!("{revision}");
        }
        Commands::Report { job_data } => {
            let report = run_report_command(&job_data)?;
            for entry in &report.entries {
                renderer.print_status(entry.status, &entry.message);
            }
            renderer.print_lines(&[report.summary]);
            if !report.all_passed {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Completion { shell } => {
            write_completions_script(shell, &mut std::io::stdout())?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

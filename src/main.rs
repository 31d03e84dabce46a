mod context;
mod error;
mod fs;
mod generator;
mod loader;
mod naming;
mod settings;
mod store;
mod summarizer;
mod transcript;
mod types;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use fs::DiskFs;
use generator::{Generated, Generator, Job};
use settings::Settings;
use std::io::{self, Read};
use std::process;
use summarizer::CommandSummarizer;
use tracing::{debug, warn};
use types::{GenerateMode, HookInput, LoadMode};

/// Compaction handover hooks: write a handover document before the
/// conversation is compacted and inject it again afterwards.
#[derive(Debug, Parser)]
#[command(name = "handover", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Summarize the session into a new HANDOVER file (PreCompact hook).
    PreCompact {
        /// Rebuild from recent transcripts instead of past handovers.
        #[arg(long)]
        from_transcripts: bool,
    },
    /// Print the latest HANDOVER file to stdout (SessionStart hook).
    PostCompact {
        /// Load the newest handover of any session in the directory.
        #[arg(long)]
        load: bool,
    },
}

fn read_stdin() -> Result<String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    Ok(buffer)
}

fn init_tracing() {
    // stdout is injected into the assistant's context; diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("HANDOVER_LOG")
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn pre_compact(mode: GenerateMode) -> Result<Option<Generated>> {
    let input = read_stdin().context("reading stdin")?;
    let hook_input = HookInput::parse(&input).context("parsing hook input")?;

    let Some(job) = Job::from_input(&DiskFs, &hook_input) else {
        return Ok(None);
    };
    let settings = Settings::load(&job.cwd)?;
    let template = settings.load_template(&job.cwd)?;
    let summarizer = CommandSummarizer::new(&settings.summarizer, &job.cwd)?;

    let generator = Generator {
        fs: &DiskFs,
        summarizer: &summarizer,
        settings: &settings,
        template: template.as_deref(),
    };
    Ok(Some(generator.run(&job, mode, Local::now())?))
}

fn post_compact(mode: LoadMode) {
    let input = read_stdin().unwrap_or_else(|e| {
        debug!(error = %e, "cannot read stdin");
        String::new()
    });
    let hook_input = HookInput::parse_lenient(&input);

    let Some(loaded) = loader::load(&DiskFs, &hook_input, mode) else {
        return;
    };
    if let Some(archived) = &loaded.archived {
        debug!(to = %archived.display(), "rotated live handover");
    }
    if let Err(e) = loader::emit(&loaded, mode, &mut io::stdout(), &mut io::stderr()) {
        warn!(error = %e, "failed to write handover");
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Command::PreCompact { from_transcripts } => {
            let mode = if from_transcripts {
                GenerateMode::Refresh
            } else {
                GenerateMode::Update
            };
            match pre_compact(mode) {
                Ok(Some(generated)) => {
                    println!("{}", generated.summary_line());
                    eprintln!("{}", generated.status_line());
                }
                Ok(None) => {}
                Err(err) => {
                    eprintln!("handover: {err:#}");
                    process::exit(1);
                }
            }
        }
        Command::PostCompact { load } => {
            post_compact(if load { LoadMode::Manual } else { LoadMode::Auto });
        }
    }
}

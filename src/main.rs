//! cogcore CLI: run a cognitive agent over an in-memory graph.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use miette::Result;

use cogcore::agent::{AgentCore, Lifecycle, classify_goal};
use cogcore::config::CoreConfig;
use cogcore::graph::InMemoryGraph;

#[derive(Parser)]
#[command(name = "cogcore", version, about = "Cognitive agent orchestration core")]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the cognitive cycle for a fixed wall-clock duration, then print status.
    Run {
        /// Goal to pursue, decomposed by keyword template.
        #[arg(long)]
        goal: Option<String>,

        /// How long to let the driver run.
        #[arg(long, default_value = "3000")]
        duration_ms: u64,

        /// Override the configured cycle interval.
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Also print a knowledge export in this format (json or text).
        #[arg(long)]
        export: Option<String>,
    },

    /// Show how a goal description would be decomposed.
    Decompose {
        /// Goal description.
        text: String,
    },

    /// Configuration file management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write the default configuration to a file.
    Init {
        /// Destination path.
        path: PathBuf,
    },
    /// Print the effective configuration as TOML.
    Show,
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => CoreConfig::load(path)?,
        None => CoreConfig::default(),
    };

    match cli.command {
        Commands::Run {
            goal,
            duration_ms,
            interval_ms,
            export,
        } => {
            if let Some(ms) = interval_ms {
                config.cycle.interval_ms = ms;
            }
            let graph = Arc::new(InMemoryGraph::new());
            let mut agent = AgentCore::new(graph, config);
            agent.init()?;

            if let Some(text) = goal {
                let goal = agent.set_goal(&text, true)?;
                println!("Goal {goal}: {text}");
            }

            agent.start()?;
            std::thread::sleep(Duration::from_millis(duration_ms));
            agent.stop()?;

            println!("{}", agent.status_json()?);

            if let Some(format) = export {
                let text = agent.with_knowledge(|k| k.export_knowledge(&format, None))??;
                println!("{text}");
            }
        }

        Commands::Decompose { text } => {
            let category = classify_goal(&text);
            println!("Category: {category}");
            for (i, step) in category.template().iter().enumerate() {
                println!("  {}. {step}", i + 1);
            }
        }

        Commands::Config { action } => match action {
            ConfigAction::Init { path } => {
                CoreConfig::default().save(&path)?;
                println!("Wrote default configuration to {}", path.display());
            }
            ConfigAction::Show => {
                let text = config.to_toml("effective config")?;
                print!("{text}");
            }
        },
    }

    Ok(())
}

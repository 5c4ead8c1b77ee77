//! Video generator CLI application.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use shared::{
    Config, GenerateVideoRequest, Language, LogConfig, Presenter, Style, VideoLength,
};
use std::path::PathBuf;
use tracing::{info, warn};
use video_generator::{
    example_queries, validate_query, Catalog, GenerationPhase, GenerationState, VideoGenerator,
    VideoService,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ask a question and follow the video generation until it settles
    Ask {
        query: String,

        /// Preferred presenter
        #[arg(long)]
        presenter: Option<Presenter>,

        #[arg(long)]
        language: Option<Language>,

        /// Preferred video length (short, medium, long)
        #[arg(long)]
        length: Option<VideoLength>,

        #[arg(long)]
        style: Option<Style>,

        /// Print the final state as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show which catalog video a question would match
    Match { query: String },

    /// Check a question against the length rules
    Validate { query: String },

    /// List example questions
    Examples,

    /// Print the configured catalog as JSON
    Catalog,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::from_file(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    config.apply_env_overrides();

    let mut log_config = LogConfig::from_config(&config, "video-generator");
    if args.verbose {
        log_config.default_level = tracing::Level::DEBUG;
    }
    shared::logging::init(log_config)?;

    info!(config_file = %args.config.display(), "Loaded configuration");

    match args.command {
        Command::Ask {
            query,
            presenter,
            language,
            length,
            style,
            json,
        } => {
            let request = GenerateVideoRequest {
                query,
                teacher: presenter,
                language,
                duration: length,
                style,
            };
            ask(&config, request, json).await
        }
        Command::Match { query } => match_query(&config, &query),
        Command::Validate { query } => {
            let validation = validate_query(&query);
            println!("{}", serde_json::to_string_pretty(&validation)?);
            Ok(())
        }
        Command::Examples => {
            for example in example_queries() {
                println!("{}", example);
            }
            Ok(())
        }
        Command::Catalog => {
            let catalog = Catalog::from_config(&config)?;
            println!("{}", serde_json::to_string_pretty(catalog.entries())?);
            Ok(())
        }
    }
}

async fn ask(config: &Config, request: GenerateVideoRequest, json: bool) -> Result<()> {
    let service = VideoService::from_config(config).context("Failed to create video service")?;
    let generator = VideoGenerator::new(service, &config.generation);

    let mut updates = generator.subscribe();
    let reporter = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let state = updates.borrow_and_update().clone();
            info!(
                phase = %state.phase,
                progress = state.progress,
                eta_secs = state.estimated_time,
                "Generation update"
            );
        }
    });

    let run = async {
        generator.submit(request).await;
        let settled = generator.wait_until_settled().await;
        // Let the analytics event go out before the runtime shuts down
        generator.finished().await;
        settled
    };

    let settled = tokio::select! {
        state = run => state,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, cancelling generation");
            generator.reset();
            generator.state()
        }
    };
    reporter.abort();

    if json {
        println!("{}", serde_json::to_string_pretty(&settled)?);
        return Ok(());
    }

    print_outcome(&settled)
}

fn print_outcome(state: &GenerationState) -> Result<()> {
    match state.phase {
        GenerationPhase::Ready => {
            if let Some(metadata) = &state.video_metadata {
                println!("{}", metadata.title);
                println!("  Teacher:   {}", metadata.teacher);
                println!("  Duration:  {}s", metadata.duration);
                println!("  Video:     {}", metadata.video_url);
                println!("  Thumbnail: {}", metadata.thumbnail_url);
            } else if let Some(video) = &state.video_data {
                println!("{}", video.title);
                println!("  Video: {}", video.video_url);
            }
            Ok(())
        }
        GenerationPhase::Rejected | GenerationPhase::Failed => match &state.error {
            Some(error) => bail!("{} ({})", error.message, error.code),
            None => bail!("Video generation {}", state.phase),
        },
        GenerationPhase::Idle => {
            println!("Generation cancelled");
            Ok(())
        }
        GenerationPhase::Generating | GenerationPhase::Polling => {
            bail!("Generation did not settle")
        }
    }
}

fn match_query(config: &Config, query: &str) -> Result<()> {
    let validation = validate_query(query);
    if !validation.is_valid {
        bail!(
            "{}",
            validation.error.unwrap_or_else(|| "Invalid query".to_string())
        );
    }

    let catalog = Catalog::from_config(config)?;
    match catalog.find_match(query) {
        Some(entry) => println!("{}", serde_json::to_string_pretty(entry)?),
        None => println!("No matching video for \"{}\"", query),
    }

    Ok(())
}

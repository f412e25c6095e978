use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use comment_vibes::classify::HttpClassifier;
use comment_vibes::config::load_config;
use comment_vibes::models::Comment;
use comment_vibes::pipeline::{analyze, PipelineOptions, Progress};
use comment_vibes::render::render_report;

/// Comment Vibes - batched LLM comment analysis
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to a JSON file with the comments to analyze
    /// (array of {"content", "likes", "author"})
    input: String,

    /// Output directory for generated files (default: "out")
    #[arg(short, long, default_value = "out")]
    output_dir: String,

    /// Path to config file (overrides CV_CONFIG environment variable)
    #[arg(short, long)]
    config: Option<String>,

    /// Shared background attached to the classification job
    /// (product name, campaign, release notes, ...)
    #[arg(long)]
    context: Option<String>,
}

fn resolve_config_path(cli: Option<&str>) -> PathBuf {
    // CLI arg > CV_CONFIG env > ./config.yaml
    if let Some(p) = cli {
        debug!("Using config file from --config argument: {}", p);
        return PathBuf::from(p);
    }
    if let Ok(p) = std::env::var("CV_CONFIG") {
        debug!("Using config file from CV_CONFIG: {}", p);
        return PathBuf::from(p);
    }
    PathBuf::from("config.yaml")
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();

    info!("Starting comment_vibes");

    let args = Args::parse();

    let cfg_path = resolve_config_path(args.config.as_deref());

    // Friendlier error if missing
    if !cfg_path.exists() {
        return Err(anyhow::anyhow!(
            "config not found at {}\n\
             Use --config to specify a config file, or set the CV_CONFIG environment variable.\n\
             Example config.yaml:\n\
             api_key: \"YOUR_KEY\"\napi_base: \"http://localhost:5001/v1\"\nmodel: \"qwen3_30b_a3\"\n",
            cfg_path.display()
        ));
    }

    let cfg = load_config(
        cfg_path
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("invalid config path"))?,
    )?;

    let raw = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Reading comments file {}", args.input))?;
    let comments: Vec<Comment> = serde_json::from_str(&raw)
        .with_context(|| format!("Parsing comments file {}", args.input))?;
    info!("Loaded {} comments from {}", comments.len(), args.input);

    let options = PipelineOptions::from(&cfg);
    let classifier = HttpClassifier::new(cfg);

    let progress = |p: Progress| info!("Progress: {}/{} - {}", p.current, p.total, p.stage);
    let result = analyze(
        &classifier,
        &comments,
        args.context.as_deref(),
        &options,
        Some(&progress),
    )
    .await?;

    // persist to date-scoped directory
    let persist_start = std::time::Instant::now();
    let today = Local::now().date_naive();
    let date_dir = Path::new(&args.output_dir).join(today.to_string());
    std::fs::create_dir_all(&date_dir)?;
    debug!("Output directory: {}", date_dir.display());

    std::fs::write(
        date_dir.join("analysis.full.json"),
        serde_json::to_vec_pretty(&result)?,
    )?;
    debug!("Wrote analysis.full.json");

    std::fs::write(date_dir.join("report.md"), render_report(&result))?;
    debug!("Wrote report.md");

    info!(
        "Output persisted - duration={:.2}s, directory={}",
        persist_start.elapsed().as_secs_f32(),
        date_dir.display()
    );
    info!(
        "Done - sentiment={:?}, satisfaction={}%, feedback={}, issues={}, questions={}",
        result.insights.overall_sentiment,
        result.insights.satisfaction_score,
        result.feedback.len(),
        result.issues.len(),
        result.questions.len()
    );
    Ok(())
}

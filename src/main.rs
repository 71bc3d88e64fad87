use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use scam_classifier::config::{DEFAULT_MODEL_PATH, ServerConfig};
use scam_classifier::model::{Classifier, ModelHandle, TfidfNbPipeline, TrainingOptions};
use scam_classifier::preprocess::PreprocessorOptions;
use scam_classifier::server::{self, AppState};
use scam_classifier::training::{self, TrainConfig};

/// Email scam classifier service, trainer and model inspector.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load the model and serve the HTTP API (default).
    Serve(ServeArgs),
    /// Fit a model on a labelled JSON Lines dataset and write the artifact.
    Train(TrainArgs),
    /// Print model details and classify two sample emails.
    Info(InfoArgs),
}

/// Flags override the matching `SCAM_CLASSIFIER_*` environment variables,
/// which `ServerConfig::from_env` reads.
#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Interface to bind.
    #[arg(long)]
    host: Option<String>,
    #[arg(long)]
    port: Option<u16>,
    /// Model artifact to load at startup.
    #[arg(long, value_name = "PATH")]
    model: Option<PathBuf>,
    /// Minimum email length in characters.
    #[arg(long)]
    min_chars: Option<usize>,
    /// Serve the keyword fallback if the artifact is missing.
    #[arg(long)]
    allow_fallback: bool,
}

#[derive(Args, Debug)]
struct TrainArgs {
    /// Labelled dataset, one {"text", "label"} object per line.
    #[arg(
        long,
        value_name = "PATH",
        env = "SCAM_CLASSIFIER_DATA",
        default_value = "data/emails.jsonl"
    )]
    data: PathBuf,
    /// Where to write the trained artifact.
    #[arg(
        long,
        value_name = "PATH",
        env = "SCAM_CLASSIFIER_MODEL_PATH",
        default_value = DEFAULT_MODEL_PATH
    )]
    output: PathBuf,
    /// Fraction of each class held out for evaluation.
    #[arg(long, env = "SCAM_CLASSIFIER_HOLDOUT", default_value_t = 0.2)]
    holdout: f64,
    #[arg(long, env = "SCAM_CLASSIFIER_SEED", default_value_t = 42)]
    seed: u64,
    /// Keep only the N most frequent tokens.
    #[arg(long, env = "SCAM_CLASSIFIER_MAX_FEATURES")]
    max_features: Option<usize>,
    /// Naive Bayes smoothing.
    #[arg(long, env = "SCAM_CLASSIFIER_ALPHA", default_value_t = 1.0)]
    alpha: f64,
    /// Do not drop text before the first blank line.
    #[arg(long, env = "SCAM_CLASSIFIER_KEEP_HEADERS")]
    keep_headers: bool,
}

#[derive(Args, Debug)]
struct InfoArgs {
    #[arg(
        long,
        value_name = "PATH",
        env = "SCAM_CLASSIFIER_MODEL_PATH",
        default_value = DEFAULT_MODEL_PATH
    )]
    model: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match cli.command.unwrap_or_else(|| Command::Serve(ServeArgs::default())) {
        Command::Serve(args) => serve(args).await,
        Command::Train(args) => train(args),
        Command::Info(args) => info(args),
    }
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = ServerConfig::from_env().context("invalid environment configuration")?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(model) = args.model {
        config.model_path = model;
    }
    if let Some(min_chars) = args.min_chars {
        config.min_chars = min_chars;
    }
    config.allow_fallback |= args.allow_fallback;
    config.validate()?;

    eprintln!("🛡️  Scam Classifier v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", config.model_path.display());

    // Refuse to serve traffic without a model.
    let model = ModelHandle::new();
    model
        .load_from(&config.model_path, config.allow_fallback)
        .with_context(|| {
            format!(
                "cannot start without a model ({})",
                config.model_path.display()
            )
        })?;
    if let Some(model_type) = model.info().model_type {
        eprintln!("   Model type: {model_type}");
    }

    let listener = tokio::net::TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr()))?;
    eprintln!("   Predict: http://{}/predict", config.bind_addr());
    eprintln!("   Health:  http://{}/health\n", config.bind_addr());

    server::serve(listener, AppState::new(model, &config)).await?;
    Ok(())
}

fn train(args: TrainArgs) -> anyhow::Result<()> {
    let records = training::load_jsonl(&args.data)?;
    let config = TrainConfig {
        options: TrainingOptions {
            preprocessor: PreprocessorOptions {
                strip_headers: !args.keep_headers,
                ..Default::default()
            },
            max_features: args.max_features,
            alpha: args.alpha,
        },
        holdout: args.holdout,
        seed: args.seed,
    };

    let pipeline = training::train(records, config)?;
    pipeline.save(&args.output)?;

    let summary = pipeline.summary();
    println!("Trained on {} emails", summary.documents);
    println!("  scam:       {}", summary.scam);
    println!("  not scam:   {}", summary.not_scam);
    println!("  vocabulary: {}", summary.vocabulary_size);
    if let Some(eval) = summary.holdout {
        println!(
            "  hold-out:   {} samples, accuracy {:.3}, precision {:.3}, recall {:.3}",
            eval.samples, eval.accuracy, eval.precision, eval.recall
        );
    }
    println!("Artifact written to {}", args.output.display());
    Ok(())
}

fn info(args: InfoArgs) -> anyhow::Result<()> {
    let pipeline = TfidfNbPipeline::load(&args.model)?;
    let summary = pipeline.summary();

    println!("Model:       {}", args.model.display());
    println!("Type:        {}", pipeline.model_type());
    println!("Trained at:  {}", pipeline.trained_at().to_rfc3339());
    println!(
        "Documents:   {} ({} scam, {} not scam)",
        summary.documents, summary.scam, summary.not_scam
    );
    println!("Vocabulary:  {}", summary.vocabulary_size);
    println!("Options:     {:?}", pipeline.preprocessor().options());

    let samples = [
        "URGENT! Your account has been suspended. Click here to verify now!",
        "Hi, your order has been shipped. Thanks for shopping with us.",
    ];
    println!();
    for sample in samples {
        let normalized = pipeline.preprocessor().normalize(sample);
        let prediction = pipeline.predict(&normalized)?;
        println!("{sample:?}");
        println!(
            "  -> {} (confidence {:.4})",
            prediction.label, prediction.confidence
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn env_of(subcommand: &str, arg: &str) -> Option<String> {
        let cmd = Cli::command();
        let sub = cmd.find_subcommand(subcommand).unwrap();
        let arg = sub.get_arguments().find(|a| a.get_id() == arg).unwrap();
        arg.get_env().map(|e| e.to_string_lossy().into_owned())
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn train_and_info_flags_read_the_environment() {
        for (arg, var) in [
            ("data", "SCAM_CLASSIFIER_DATA"),
            ("output", "SCAM_CLASSIFIER_MODEL_PATH"),
            ("holdout", "SCAM_CLASSIFIER_HOLDOUT"),
            ("seed", "SCAM_CLASSIFIER_SEED"),
            ("max_features", "SCAM_CLASSIFIER_MAX_FEATURES"),
            ("alpha", "SCAM_CLASSIFIER_ALPHA"),
            ("keep_headers", "SCAM_CLASSIFIER_KEEP_HEADERS"),
        ] {
            assert_eq!(env_of("train", arg).as_deref(), Some(var), "{arg}");
        }
        assert_eq!(
            env_of("info", "model").as_deref(),
            Some("SCAM_CLASSIFIER_MODEL_PATH")
        );
    }

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["scam-classifier"]).unwrap();
        assert!(cli.command.is_none());
        let cli = Cli::try_parse_from(["scam-classifier", "train", "--seed", "7"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Train(TrainArgs { seed: 7, .. }))));
    }
}

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use analytica::config::Config;
use analytica::morphology::lexicon::LexiconOracle;
use analytica::morphology::traits::MorphologyOracle;
use analytica::output::terminal;
use analytica::tokenizer::{Tokenizer, TokenizerState};
use analytica::topics::collection::DocumentCollection;
use analytica::topics::comparator::TopicComparator;
use analytica::topics::lda::LdaModel;
use analytica::topics::traits::TopicModel;

/// Analytica: find the topics that set two bodies of text apart.
///
/// Text is stemmed with a spell-tolerant morphology oracle, projected onto a
/// trained topic model, and each side's most distinguishing topic is named
/// with a single noun.
#[derive(Parser)]
#[command(name = "analytica", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tokenize a text file and show the stems of each paragraph
    Tokenize {
        /// Plain text file; every line is a paragraph
        file: PathBuf,

        /// Do not replace unknown words with spelling suggestions
        #[arg(long)]
        no_suggestions: bool,
    },

    /// Compare two document collections
    Compare {
        /// JSON array of documents (strings or nulls) for the source side
        source: PathBuf,

        /// JSON array of documents (strings or nulls) for the target side
        target: PathBuf,

        /// Print the result as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show the most relevant words of a topic
    Topic {
        /// Topic id
        id: usize,

        /// Number of words to show (default: 15)
        #[arg(long, default_value = "15")]
        top: usize,
    },

    /// Show configuration and whether the model and lexicon are present
    Status,
}

fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("analytica=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Tokenize {
            file,
            no_suggestions,
        } => {
            config.require_lexicon()?;
            let tokenizer = open_tokenizer(&config)?;

            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;

            let mut paragraphs = Vec::new();
            for paragraph in text.lines() {
                let stems = tokenizer.tokenize_paragraph_with(paragraph, !no_suggestions)?;
                paragraphs.push((paragraph.to_string(), stems));
            }
            terminal::display_tokenized(&paragraphs);

            save_tokenizer(&config, &tokenizer)?;
        }

        Commands::Compare {
            source,
            target,
            json,
        } => {
            config.require_lexicon()?;
            config.require_model()?;

            let source_docs = read_collection(&source)?;
            let target_docs = read_collection(&target)?;
            info!(
                source = source_docs.len(),
                target = target_docs.len(),
                "Comparing document collections"
            );

            let tokenizer = Arc::new(open_tokenizer(&config)?);
            let model = open_model(&config)?;
            let comparator = TopicComparator::new(Arc::clone(&tokenizer), model);

            let spinner = ProgressBar::new_spinner();
            spinner.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.cyan} {msg}")
                    .context("Invalid spinner template")?,
            );
            spinner.set_message("Inferring topic mixtures...");
            spinner.enable_steady_tick(Duration::from_millis(100));

            let result = comparator.compare(&source_docs, &target_docs);
            spinner.finish_and_clear();
            let comparison = result?;

            if json {
                println!("{}", serde_json::to_string_pretty(&comparison)?);
            } else {
                terminal::display_comparison(
                    &comparison,
                    &file_label(&source),
                    &file_label(&target),
                );
            }

            save_tokenizer(&config, &tokenizer)?;
        }

        Commands::Topic { id, top } => {
            config.require_lexicon()?;
            config.require_model()?;

            let tokenizer = Arc::new(open_tokenizer(&config)?);
            let model = open_model(&config)?;
            let comparator = TopicComparator::new(tokenizer, model);

            let words = comparator.top_words(id, top)?;
            terminal::display_top_words(id, &words);
        }

        Commands::Status => {
            println!("Language:        {}", config.language);
            println!("Topics:          {}", config.number_topics);
            println!("Error threshold: {}", config.error_threshold);
            println!("Instance dir:    {}", config.instance_dir.display());
            println!(
                "Topic model:     {} {}",
                config.model_path.display(),
                presence(config.model_path.exists())
            );
            println!(
                "Lexicon:         {} {}",
                config.lexicon_path.display(),
                presence(config.lexicon_path.exists())
            );
            match &config.tokenizer_state_path {
                Some(path) => println!(
                    "Tokenizer state: {} {}",
                    path.display(),
                    presence(path.exists())
                ),
                None => println!("Tokenizer state: {}", "not persisted".dimmed()),
            }
        }
    }

    Ok(())
}

/// Build the tokenizer, restoring saved caches when a state file exists.
fn open_tokenizer(config: &Config) -> Result<Tokenizer> {
    let lexicon_path = config.lexicon_path.clone();
    let build_oracle = move |language: &str| -> Result<Arc<dyn MorphologyOracle>> {
        let lexicon = LexiconOracle::load(&lexicon_path)?;
        if lexicon.language() != language {
            warn!(
                expected = language,
                found = lexicon.language(),
                "Lexicon language does not match"
            );
        }
        Ok(Arc::new(lexicon))
    };

    if let Some(path) = config.tokenizer_state_path.as_deref().filter(|p| p.exists()) {
        let state = TokenizerState::load(path)?;
        info!(
            stems = state.stems.len(),
            analyses = state.analyses.len(),
            "Restoring tokenizer caches from {}",
            path.display()
        );
        let tokenizer = Tokenizer::restore(state, build_oracle)?;
        if tokenizer.error_threshold() != config.error_threshold {
            info!(
                saved = tokenizer.error_threshold(),
                configured = config.error_threshold,
                "Using the configured error threshold instead of the saved one"
            );
        }
        return Ok(tokenizer.with_error_threshold(config.error_threshold));
    }

    let oracle = build_oracle(&config.language)?;
    Ok(Tokenizer::new(oracle).with_error_threshold(config.error_threshold))
}

fn save_tokenizer(config: &Config, tokenizer: &Tokenizer) -> Result<()> {
    if let Some(path) = &config.tokenizer_state_path {
        tokenizer.export()?.save(path)?;
    }
    Ok(())
}

fn open_model(config: &Config) -> Result<Arc<dyn TopicModel>> {
    let model = LdaModel::load(&config.model_path)?;
    if model.number_topics() != config.number_topics {
        warn!(
            configured = config.number_topics,
            loaded = model.number_topics(),
            "Topic model has a different number of topics than configured"
        );
    }
    Ok(Arc::new(model))
}

/// Read a JSON array of documents; null entries are dropped.
fn read_collection(path: &Path) -> Result<DocumentCollection> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let entries: Vec<Option<String>> = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON array of strings", path.display()))?;
    Ok(DocumentCollection::from_optional(entries))
}

fn file_label(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn presence(exists: bool) -> colored::ColoredString {
    if exists {
        "(present)".green()
    } else {
        "(missing)".red()
    }
}

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use proofmark::config::{CONFIG_FILE, Config};
use proofmark::embed::ollama::OllamaEmbedder;
use proofmark::generate::ollama::OllamaGenerator;
use proofmark::pipeline::Pipeline;
use proofmark::prompt::{Check, Checks};
use proofmark::terms::{TermRetriever, TermStore};

#[derive(Parser)]
#[command(
    name = "proofmark",
    version,
    about = "Proofread markdown with a local LLM and terminology lookup"
)]
struct Cli {
    /// Config file (default: ./proofmark.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Revise a markdown document paragraph by paragraph
    Revise {
        /// Markdown file to revise
        #[arg(short, long)]
        input_file: PathBuf,
        /// Where to write the result (default: overwrite the input)
        #[arg(short, long)]
        output_file: Option<PathBuf>,
        /// Checks to enable
        #[arg(short, long, num_args = 1.., required = true, value_enum)]
        checks: Vec<Check>,
        /// Summarize, check the whole argument, then revise
        #[arg(long)]
        logicflow: bool,
        /// Number of revision passes
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        repeat: Option<u64>,
        /// Skip the per-paragraph rationale and the audit trail
        #[arg(long)]
        no_rationale: bool,
        #[command(flatten)]
        model: ModelArgs,
        #[command(flatten)]
        terminology: TerminologyArgs,
    },
    /// Show which terms the retriever would offer for some text
    Terms {
        /// Text to look up; several queries share one index
        #[arg(required = true)]
        queries: Vec<String>,
        #[command(flatten)]
        model: ModelArgs,
        #[command(flatten)]
        terminology: TerminologyArgs,
    },
    /// Write a config file with the default settings
    Init {
        #[arg(default_value = CONFIG_FILE)]
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args)]
struct ModelArgs {
    /// Ollama base URL
    #[arg(long)]
    ollama_url: Option<String>,
    /// Generation model
    #[arg(long)]
    ollama_model: Option<String>,
    /// Sampling temperature
    #[arg(long)]
    temperature: Option<f32>,
    /// Embedding model for terminology lookup
    #[arg(long)]
    embed_model: Option<String>,
}

#[derive(Args)]
struct TerminologyArgs {
    /// JSON list of {"term": ...} records (required by the terminology check)
    #[arg(long)]
    terminology: Option<PathBuf>,
    /// Minimum similarity for a term to be used
    #[arg(long)]
    sim_threshold: Option<f32>,
}

impl ModelArgs {
    fn apply(self, config: &mut Config) {
        if let Some(url) = self.ollama_url {
            config.ollama.url = url;
        }
        if let Some(model) = self.ollama_model {
            config.ollama.model = model;
        }
        if let Some(t) = self.temperature {
            config.ollama.temperature = t;
        }
        if let Some(model) = self.embed_model {
            config.embed.model = model;
        }
    }
}

impl TerminologyArgs {
    fn apply(self, config: &mut Config) {
        if let Some(path) = self.terminology {
            config.terminology.path = Some(path);
        }
        if let Some(t) = self.sim_threshold {
            config.terminology.threshold = t;
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cwd = std::env::current_dir().context("resolving working directory")?;
    let mut config = Config::load(cli.config.as_deref(), &cwd)?;

    match cli.command {
        Commands::Revise {
            input_file,
            output_file,
            checks,
            logicflow,
            repeat,
            no_rationale,
            model,
            terminology,
        } => {
            model.apply(&mut config);
            terminology.apply(&mut config);
            if let Some(n) = repeat {
                config.pipeline.repeat = n as usize;
            }
            if no_rationale {
                config.pipeline.rationale = false;
            }
            let mut checks: Checks = checks.into_iter().collect();
            if logicflow {
                checks.insert(Check::Logicflow);
            }
            let output = output_file.unwrap_or_else(|| input_file.clone());
            revise(&config, &input_file, &output, checks)
        }
        Commands::Terms {
            queries,
            model,
            terminology,
        } => {
            model.apply(&mut config);
            terminology.apply(&mut config);
            lookup_terms(&config, &queries)
        }
        Commands::Init { path, force } => {
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            config.save(&path)?;
            println!("Wrote {}", path.display());
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_store(config: &Config) -> Result<TermStore> {
    let Some(path) = config.terminology.path.as_deref() else {
        bail!("terminology lookup needs a terminology file (--terminology or [terminology] path)");
    };
    Ok(TermStore::load(path)?)
}

fn revise(config: &Config, input: &Path, output: &Path, checks: Checks) -> Result<()> {
    let embedder = OllamaEmbedder::new(config.embed_url(), &config.embed.model);
    let retriever = if checks.contains(&Check::Terminology) {
        let store = load_store(config)?;
        Some(TermRetriever::build(store, &embedder).context("building the terminology index")?)
    } else {
        None
    };

    let generator = OllamaGenerator::new(
        &config.ollama.url,
        &config.ollama.model,
        config.ollama.temperature,
        config.timeout(),
    );
    let mut pipeline = Pipeline::new(&generator, retriever, checks)
        .with_threshold(config.terminology.threshold)
        .with_rationale(config.pipeline.rationale);

    for report in pipeline.run(input, output, config.pipeline.repeat)? {
        println!(
            "[pass {}] revised {} paragraphs -> {}",
            report.pass,
            report.paragraphs,
            report.output.display()
        );
        if let Some(audit) = report.audit {
            println!("[pass {}] audit trail -> {}", report.pass, audit.display());
        }
    }
    Ok(())
}

fn lookup_terms(config: &Config, queries: &[String]) -> Result<()> {
    let store = load_store(config)?;
    let embedder = OllamaEmbedder::new(config.embed_url(), &config.embed.model);
    let retriever =
        TermRetriever::build(store, &embedder).context("building the terminology index")?;
    let threshold = config.terminology.threshold;

    for query in queries {
        println!("{query}");
        let matches = retriever.search_scored(query, threshold)?;
        if matches.is_empty() {
            println!("  no terms at or above {threshold}");
        }
        for m in matches {
            if m.term.extra.is_empty() {
                println!("  {:.3}  {}", m.similarity, m.term.text);
            } else {
                let extra = serde_json::to_string(&m.term.extra)?;
                println!("  {:.3}  {}  {extra}", m.similarity, m.term.text);
            }
        }
    }
    Ok(())
}

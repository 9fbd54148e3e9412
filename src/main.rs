use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use tracing_subscriber::EnvFilter;

use bratparse::config::{get_config_path, load_config, save_config, ParserConfig};
use bratparse::errors::BratError;
use bratparse::export::DocumentRecord;
use bratparse::{BratParser, Corpus, ErrorPolicy};

/// Parser for brat standoff annotation corpora.
#[derive(Parser)]
#[command(name = "bratparse", about = "Parse brat standoff annotation corpora")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a corpus and print its documents as JSON
    Parse {
        /// Corpus directory, document file, or basename
        path: PathBuf,
        /// Error policy (overrides the config file)
        #[arg(short, long, value_enum)]
        policy: Option<ErrorPolicy>,
        /// Config file (default: .bratparse.json in the corpus root)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
        /// Write the JSON to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Parse documents one at a time
        #[arg(long)]
        sequential: bool,
    },
    /// Validate a corpus and list every problem found
    Check {
        /// Corpus directory, document file, or basename
        path: PathBuf,
        /// Config file (default: .bratparse.json in the corpus root)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Write a default config file
    InitConfig {
        /// Corpus root (default: current directory)
        path: Option<PathBuf>,
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run(cli: Cli) -> bratparse::errors::Result<i32> {
    match cli.command {
        Commands::Parse {
            path,
            policy,
            config,
            pretty,
            output,
            sequential,
        } => {
            let mut cfg = resolve_config(&path, config.as_deref())?;
            if let Some(policy) = policy {
                cfg.error_policy = policy;
            }
            if sequential {
                cfg.parallel = false;
            }
            let corpus = BratParser::new(cfg)?.parse(&path)?;
            print_diagnostics(&corpus);

            let records: Vec<DocumentRecord> =
                corpus.documents.iter().map(|d| d.to_record()).collect();
            let json = if pretty {
                serde_json::to_string_pretty(&records)?
            } else {
                serde_json::to_string(&records)?
            };
            match output {
                Some(out) => {
                    fs::write(&out, json).map_err(|e| BratError::File {
                        message: format!("failed to write output: {}", e),
                        path: out.display().to_string(),
                    })?;
                    eprintln!(
                        "Wrote {} documents to {} in {}ms",
                        records.len(),
                        out.display(),
                        corpus.duration_ms
                    );
                }
                None => println!("{}", json),
            }
            Ok(0)
        }
        Commands::Check { path, config } => {
            let mut cfg = resolve_config(&path, config.as_deref())?;
            cfg.error_policy = ErrorPolicy::Warn;
            let corpus = BratParser::new(cfg)?.parse(&path)?;
            print_diagnostics(&corpus);

            let mut annotations = 0;
            for d in &corpus.documents {
                println!(
                    "  {}: {} entities, {} relations, {} events, {} attributes",
                    d.id(),
                    d.entities().len(),
                    d.relations().len(),
                    d.events().len(),
                    d.attributes().len()
                );
                annotations += d.entities().len()
                    + d.relations().len()
                    + d.events().len()
                    + d.attributes().len()
                    + d.normalizations().len()
                    + d.notes().len();
            }
            println!(
                "Checked {} documents: {} annotations, {} problems in {}ms",
                corpus.documents.len(),
                annotations,
                corpus.diagnostics.len(),
                corpus.duration_ms
            );
            Ok(if corpus.diagnostics.is_empty() { 0 } else { 2 })
        }
        Commands::InitConfig { path, force } => {
            let root = resolve_path(path);
            let config_path = get_config_path(&root);
            if config_path.exists() && !force {
                return Err(BratError::Config {
                    message: format!(
                        "{} already exists; use --force to overwrite",
                        config_path.display()
                    ),
                });
            }
            save_config(&config_path, &ParserConfig::default())?;
            println!("Wrote default config to {}", config_path.display());
            Ok(0)
        }
    }
}

/// Loads the explicit config file, or the one in the corpus root if present.
fn resolve_config(corpus: &Path, explicit: Option<&Path>) -> bratparse::errors::Result<ParserConfig> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(BratError::Config {
                message: format!("config file '{}' not found", path.display()),
            });
        }
        return load_config(path);
    }
    let root = if corpus.is_dir() {
        corpus.to_path_buf()
    } else {
        corpus
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    };
    load_config(&get_config_path(&root))
}

fn print_diagnostics(corpus: &Corpus) {
    for diagnostic in &corpus.diagnostics {
        eprintln!("{}", diagnostic);
    }
}

/// Resolves an optional path argument, defaulting to the current directory.
fn resolve_path(path: Option<PathBuf>) -> PathBuf {
    path.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

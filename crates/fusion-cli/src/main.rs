//! Fusion CLI - Fuse vector and keyword search results from the command line.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

use fusion_core::{FusedResultList, FusionAlgorithm, FusionConfig, FusionError, ResultSet};
use fusion_query::FusionEngine;

/// Fusion - Combine vector and keyword search results into one ranking
#[derive(Parser)]
#[command(name = "fusion")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: user config dir, then ./hybrid-fusion.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fuse two result files ([{"id": ..., "score": ...}, ...], best first)
    Fuse {
        /// Vector search results (JSON)
        #[arg(long)]
        vector: PathBuf,

        /// Keyword search results (JSON)
        #[arg(long)]
        keyword: PathBuf,

        /// Vector weight: 0 = keyword only, 1 = vector only
        #[arg(short, long)]
        alpha: Option<f32>,

        /// Maximum number of results
        #[arg(short = 'k', long)]
        limit: Option<usize>,

        /// Fusion algorithm (ranked or relative)
        #[arg(long)]
        algorithm: Option<FusionAlgorithm>,

        /// Include a score breakdown per result
        #[arg(long)]
        explain: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    /// Print the effective configuration
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

/// Parameters for one `fuse` invocation; unset values come from config.
struct FuseRequest<'a> {
    vector: &'a Path,
    keyword: &'a Path,
    alpha: Option<f32>,
    limit: Option<usize>,
    algorithm: Option<FusionAlgorithm>,
}

#[derive(Serialize)]
struct FusedOutput<'a> {
    strategy: &'a str,
    alpha: f32,
    fingerprint: String,
    results: Vec<OutputHit<'a>>,
}

#[derive(Serialize)]
struct OutputHit<'a> {
    rank: usize,
    id: &'a str,
    score: f32,
    vector_component: f32,
    keyword_component: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    explanation: Option<String>,
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn load_config(path: Option<&Path>) -> Result<FusionConfig, FusionError> {
    match path {
        Some(path) => FusionConfig::load(path),
        None => FusionConfig::load_default(),
    }
}

fn load_results(path: &Path) -> Result<ResultSet, FusionError> {
    let content = fs::read_to_string(path)?;
    let results: ResultSet = serde_json::from_str(&content)?;
    debug!("Loaded {} results from {}", results.len(), path.display());
    Ok(results)
}

fn fuse_files(config: &FusionConfig, request: &FuseRequest<'_>) -> Result<FusedResultList, FusionError> {
    let search = &config.search;
    let alpha = request.alpha.unwrap_or(search.alpha);
    let limit = request.limit.unwrap_or(search.default_limit);
    let algorithm = request.algorithm.unwrap_or(search.algorithm);

    if limit > search.max_limit {
        return Err(FusionError::invalid_limit(
            limit,
            format!("exceeds maximum of {}", search.max_limit),
        ));
    }

    let vector = load_results(request.vector)?;
    let keyword = load_results(request.keyword)?;

    FusionEngine::new(search).fuse(&vector, &keyword, alpha, limit, algorithm)
}

fn render_json(fused: &FusedResultList, explain: bool) -> Result<String, FusionError> {
    let output = FusedOutput {
        strategy: &fused.strategy,
        alpha: fused.alpha,
        fingerprint: fused.fingerprint(),
        results: fused
            .iter()
            .enumerate()
            .map(|(i, hit)| OutputHit {
                rank: i + 1,
                id: hit.object_id.as_str(),
                score: hit.fused_score,
                vector_component: hit.vector_component,
                keyword_component: hit.keyword_component,
                explanation: explain.then(|| hit.explain(fused.alpha)),
            })
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&output)?)
}

fn render_text(fused: &FusedResultList, explain: bool) -> String {
    let mut out = format!(
        "{} (alpha {}) - {} result(s)\n",
        fused.strategy,
        fused.alpha,
        fused.len()
    );

    for (i, hit) in fused.iter().enumerate() {
        out.push_str(&format!(
            "{:>4}. {:<24} {:.6}  vector {:.6}  keyword {:.6}\n",
            i + 1,
            hit.object_id,
            hit.fused_score,
            hit.vector_component,
            hit.keyword_component
        ));
        if explain {
            out.push_str(&format!("      {}\n", hit.explain(fused.alpha)));
        }
    }

    out
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Fuse {
            vector,
            keyword,
            alpha,
            limit,
            algorithm,
            explain,
            format,
        } => {
            let request = FuseRequest {
                vector: &vector,
                keyword: &keyword,
                alpha,
                limit,
                algorithm,
            };

            let fused = match fuse_files(&config, &request) {
                Ok(fused) => fused,
                Err(e) => {
                    eprintln!("Error [{}]: {}", e.error_code(), e);
                    std::process::exit(1);
                }
            };

            match format {
                OutputFormat::Json => println!("{}", render_json(&fused, explain)?),
                OutputFormat::Text => print!("{}", render_text(&fused, explain)),
            }
        }
        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::io::Write;

    fn write_json(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_fuse_args() {
        let cli = Cli::try_parse_from([
            "fusion",
            "fuse",
            "--vector",
            "v.json",
            "--keyword",
            "k.json",
            "--algorithm",
            "relative",
            "-a",
            "0.3",
        ])
        .unwrap();

        match cli.command {
            Commands::Fuse {
                algorithm, alpha, ..
            } => {
                assert_eq!(algorithm, Some(FusionAlgorithm::RelativeScoreFusion));
                assert_eq!(alpha, Some(0.3));
            }
            Commands::Config => panic!("expected fuse"),
        }
    }

    #[test]
    fn test_fuse_files() {
        let vector = write_json(r#"[{"id": "A", "score": 5.0}, {"id": "B", "score": 4.99}, {"id": "C", "score": 0.0}]"#);
        let keyword = write_json(r#"[{"id": "A", "score": 5.0}, {"id": "B", "score": 0.01}, {"id": "C", "score": 0.0}]"#);

        let request = FuseRequest {
            vector: vector.path(),
            keyword: keyword.path(),
            alpha: None,
            limit: Some(2),
            algorithm: Some(FusionAlgorithm::RelativeScoreFusion),
        };

        let fused = fuse_files(&FusionConfig::default(), &request).unwrap();
        assert_eq!(fused.len(), 2);
        assert_eq!(fused.hits[0].object_id.as_str(), "A");

        let json = render_json(&fused, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["strategy"], "relativeScoreFusion");
        assert_eq!(value["results"][0]["rank"], 1);
        assert!(value["results"][1]["explanation"].is_string());

        let text = render_text(&fused, false);
        assert!(text.contains("relativeScoreFusion"));
        assert!(text.contains("A"));
    }

    #[test]
    fn test_fuse_files_rejects_large_limit() {
        let empty = write_json("[]");
        let request = FuseRequest {
            vector: empty.path(),
            keyword: empty.path(),
            alpha: None,
            limit: Some(1000),
            algorithm: None,
        };

        let err = fuse_files(&FusionConfig::default(), &request).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_LIMIT");
    }

    #[test]
    fn test_load_results_bad_json() {
        let file = write_json("{not json");
        let err = load_results(file.path()).unwrap_err();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
    }
}

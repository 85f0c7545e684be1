use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use paperion::config::{find_config_file, get_config, load_config, Config, ConfigFile};
use paperion::mcp::McpServer;
use paperion::models::{Document, Recommendation};
use paperion::query::SearchParams;
use paperion::recommend::JsonCollectionFile;
use paperion::PaperService;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Paperion - search and recommend academic papers from a full-text index
#[derive(Parser, Debug)]
#[command(name = "paperion")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Search and recommend academic papers from a full-text index", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
    /// Plain text format
    Plain,
}

impl OutputFormat {
    fn resolve(self) -> Self {
        match self {
            OutputFormat::Auto if std::io::stdout().is_terminal() => OutputFormat::Table,
            OutputFormat::Auto => OutputFormat::Json,
            other => other,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search papers by title expression, author, description or DOI
    ///
    /// The title may be a DOI, plain title words, or 'title--author--year [asc|desc]'
    /// where year is e.g. '2010', '>=2010' or '<1990'.
    #[command(alias = "s")]
    Search {
        /// Title words, DOI, or composite expression
        title: Option<String>,

        /// Author words
        #[arg(long, short)]
        author: Option<String>,

        /// Words matched against abstracts
        #[arg(long, short)]
        description: Option<String>,

        /// Exact DOI lookup
        #[arg(long)]
        doi: Option<String>,
    },

    /// Show one paper by identifier
    Get {
        paper_id: String,
    },

    /// Print the APA reference of a paper
    Cite {
        paper_id: String,
    },

    /// Search papers whose body text resembles the given text
    Content {
        text: String,
    },

    /// Print the body text of a paper
    Text {
        paper_id: String,
    },

    /// Show title and body of a paper by DOI
    PaperContent {
        doi: String,
    },

    /// Recommend papers
    #[command(subcommand, alias = "rec")]
    Recommend(RecommendCommands),

    /// Run the MCP server (stdio unless --http is given)
    Serve {
        /// Listen for streamable HTTP on this address instead of stdio
        #[arg(long, value_name = "ADDR")]
        http: Option<String>,
    },

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
enum RecommendCommands {
    /// Papers by the same author as a seed DOI
    Author { doi: String },

    /// Papers from the same journal as a seed DOI
    Journal { doi: String },

    /// Papers whose content resembles a seed DOI
    Similar { doi: String },

    /// Diversified recommendations from seed paper identifiers
    Seeds {
        /// Seed identifiers (none for the curated starter set)
        paper_ids: Vec<String>,

        /// Fixed random seed for reproducible output
        #[arg(long)]
        rng_seed: Option<u64>,
    },

    /// Diversified recommendations seeded by a caller's saved collections
    Collections {
        /// JSON file mapping callers to collection payloads
        #[arg(long, short)]
        file: PathBuf,

        /// Caller whose collections seed the recommendations
        #[arg(long, short)]
        caller: String,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Write the default configuration file
    Init {
        /// Destination (default: user config directory)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show {
        /// Print a configuration file as written, without environment overrides
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

fn resolve_config(cli: &Cli) -> Result<Config> {
    if let Some(path) = &cli.config {
        return load_config(path)
            .with_context(|| format!("Failed to load config {}", path.display()));
    }
    if let Some(path) = find_config_file() {
        return load_config(&path)
            .with_context(|| format!("Failed to load config {}", path.display()));
    }
    get_config().context("Failed to read configuration from environment")
}

fn init_tracing(cli: &Cli, config: &Config) {
    let level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => config.logging.level.as_str(),
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("paperion={}", level)));
    let json = config.logging.format.as_deref() == Some("json");

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
        }))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    init_tracing(&cli, &config);

    let format = cli.output.resolve();

    let command = match cli.command {
        Commands::Config(command) => return run_config_command(command, &config, format),
        command => command,
    };

    let service = Arc::new(
        PaperService::from_config(config).context("Failed to set up the index gateway")?,
    );

    match command {
        Commands::Search {
            title,
            author,
            description,
            doi,
        } => {
            let params = SearchParams {
                title,
                author,
                description,
                doi,
            };
            output_documents(&service.search(&params).await?, format)?;
        }

        Commands::Get { paper_id } => {
            let paper = service.get_by_id(&paper_id).await?;
            output_documents(std::slice::from_ref(&paper), format)?;
        }

        Commands::Cite { paper_id } => {
            let citation = service.apa_citation(&paper_id).await?;
            match format {
                OutputFormat::Json => print_json(&citation)?,
                _ => println!("{}", citation),
            }
        }

        Commands::Content { text } => {
            output_documents(&service.search_by_content(&text).await?, format)?;
        }

        Commands::Text { paper_id } => {
            let text = service.get_text(&paper_id).await?;
            match format {
                OutputFormat::Json => print_json(&text)?,
                _ => println!("{}", text.text),
            }
        }

        Commands::PaperContent { doi } => {
            let content = service.get_paper_content(&doi).await?;
            match format {
                OutputFormat::Json => print_json(&content)?,
                _ => {
                    println!("{}", content.title.as_deref().unwrap_or("(untitled)"));
                    println!();
                    println!("{}", content.content.as_deref().unwrap_or(""));
                }
            }
        }

        Commands::Recommend(command) => {
            run_recommend_command(command, &service, format).await?;
        }

        Commands::Serve { http } => {
            let server = McpServer::new(Arc::clone(&service))?;
            drop(service);

            match http {
                Some(addr) => {
                    let (bound_addr, handle) = server.run_http(&addr).await?;
                    tracing::info!("MCP server listening on {}", bound_addr);
                    handle
                        .await
                        .map_err(|e| anyhow::anyhow!("Server task failed: {}", e))?;
                }
                None => server.run().await?,
            }
        }

        Commands::Config(_) => {}
    }

    Ok(())
}

async fn run_recommend_command(
    command: RecommendCommands,
    service: &PaperService,
    format: OutputFormat,
) -> Result<()> {
    match command {
        RecommendCommands::Author { doi } => {
            output_documents(&service.recommend_same_author(&doi).await?, format)
        }
        RecommendCommands::Journal { doi } => {
            output_documents(&service.recommend_same_journal(&doi).await?, format)
        }
        RecommendCommands::Similar { doi } => {
            output_documents(&service.recommend_similar(&doi).await?, format)
        }
        RecommendCommands::Seeds {
            paper_ids,
            rng_seed,
        } => {
            let recommendations = match rng_seed {
                Some(seed) => {
                    service
                        .recommend_from_seeds_with(&paper_ids, &mut StdRng::seed_from_u64(seed))
                        .await?
                }
                None => service.recommend_from_seeds(&paper_ids).await?,
            };
            output_recommendations(&recommendations, format)
        }
        RecommendCommands::Collections { file, caller } => {
            let store = JsonCollectionFile::new(file);
            let recommendations = service.recommend_from_collections(&store, &caller).await?;
            output_recommendations(&recommendations, format)
        }
    }
}

fn run_config_command(command: ConfigCommands, config: &Config, format: OutputFormat) -> Result<()> {
    match command {
        ConfigCommands::Init { path, force } => {
            let path = match path {
                Some(path) => path,
                None => dirs::config_dir()
                    .map(|dir| dir.join("paperion").join("config.toml"))
                    .context("Could not determine the user config directory")?,
            };
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                );
            }
            ConfigFile::from(Config::default()).save(&path)?;
            println!("Wrote default configuration to {}", path.display());
        }
        ConfigCommands::Show { file } => {
            let shown = match file {
                Some(path) => ConfigFile::load(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                None => ConfigFile::from(config.clone()),
            };
            match format {
                OutputFormat::Json => print_json(&shown.config)?,
                _ => print!("{}", shown.to_toml()?),
            }
        }
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

fn document_cells(doc: &Document) -> Vec<comfy_table::Cell> {
    use comfy_table::{Attribute, Cell};
    vec![
        Cell::new(&doc.id),
        Cell::new(truncate(doc.title.as_deref().unwrap_or(""), 50)).add_attribute(Attribute::Bold),
        Cell::new(truncate(doc.author.as_deref().unwrap_or(""), 30)),
        Cell::new(doc.year.as_deref().unwrap_or("")),
        Cell::new(truncate(doc.journal.as_deref().unwrap_or(""), 30)),
    ]
}

fn document_line(doc: &Document) -> String {
    let mut line = format!(
        "[{}] {} - {}",
        doc.id,
        doc.title.as_deref().unwrap_or("(untitled)"),
        doc.author.as_deref().unwrap_or("unknown")
    );
    if let Some(year) = &doc.year {
        line.push_str(&format!(" ({})", year));
    }
    if let Some(doi) = &doc.doi {
        line.push_str(&format!("\n  DOI: {}", doi));
    }
    line
}

fn output_documents(documents: &[Document], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json | OutputFormat::Auto => print_json(documents)?,
        OutputFormat::Plain => {
            for doc in documents {
                println!("{}", document_line(doc));
            }
        }
        OutputFormat::Table => {
            let mut table = comfy_table::Table::new();
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.set_header(vec!["ID", "Title", "Author", "Year", "Journal"]);
            for doc in documents {
                table.add_row(document_cells(doc));
            }
            println!("{table}");
        }
    }
    Ok(())
}

fn output_recommendations(recommendations: &[Recommendation], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json | OutputFormat::Auto => print_json(recommendations)?,
        OutputFormat::Plain => {
            for rec in recommendations {
                println!("{}", document_line(&rec.document));
                println!("  Seed: {}", rec.seed.as_deref().unwrap_or("-"));
            }
        }
        OutputFormat::Table => {
            let mut table = comfy_table::Table::new();
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.set_header(vec!["ID", "Title", "Author", "Year", "Journal", "Seed"]);
            for rec in recommendations {
                let mut cells = document_cells(&rec.document);
                cells.push(comfy_table::Cell::new(rec.seed.as_deref().unwrap_or("-")));
                table.add_row(cells);
            }
            println!("{table}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_values() {
        assert_eq!(OutputFormat::Auto as i32, 0);
        assert_eq!(OutputFormat::Table as i32, 1);
        assert_eq!(OutputFormat::Json as i32, 2);
        assert_eq!(OutputFormat::Plain as i32, 3);
    }

    #[test]
    fn test_cli_search_command() {
        let cli = Cli::parse_from(["paperion", "search", "waves--Kondratiev-->=1930 asc", "-d", "cycles"]);
        match &cli.command {
            Commands::Search {
                title, description, ..
            } => {
                assert_eq!(title.as_deref(), Some("waves--Kondratiev-->=1930 asc"));
                assert_eq!(description.as_deref(), Some("cycles"));
            }
            _ => panic!("Expected Search command"),
        }
    }

    #[test]
    fn test_cli_recommend_seeds() {
        let cli = Cli::parse_from(["paperion", "recommend", "seeds", "1", "2", "--rng-seed", "7"]);
        match &cli.command {
            Commands::Recommend(RecommendCommands::Seeds {
                paper_ids,
                rng_seed,
            }) => {
                assert_eq!(paper_ids, &vec!["1".to_string(), "2".to_string()]);
                assert_eq!(*rng_seed, Some(7));
            }
            _ => panic!("Expected Recommend Seeds command"),
        }
    }

    #[test]
    fn test_cli_paper_content_command() {
        let cli = Cli::parse_from(["paperion", "paper-content", "10.1234/test"]);
        assert!(matches!(
            &cli.command,
            Commands::PaperContent { doi } if doi == "10.1234/test"
        ));
    }

    #[test]
    fn test_cli_serve_command() {
        let cli = Cli::parse_from(["paperion", "serve"]);
        assert!(matches!(cli.command, Commands::Serve { http: None }));

        let cli = Cli::parse_from(["paperion", "serve", "--http", "127.0.0.1:3000"]);
        match &cli.command {
            Commands::Serve { http } => assert_eq!(http.as_deref(), Some("127.0.0.1:3000")),
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_config_show_reads_file() {
        let cli = Cli::parse_from(["paperion", "config", "show", "--file", "custom.toml"]);
        assert!(matches!(
            &cli.command,
            Commands::Config(ConfigCommands::Show { file: Some(path) }) if path == &PathBuf::from("custom.toml")
        ));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[limits]\nsearch = 5\n").unwrap();
        let shown = run_config_command(
            ConfigCommands::Show { file: Some(path) },
            &Config::default(),
            OutputFormat::Json,
        );
        assert!(shown.is_ok());

        let missing = run_config_command(
            ConfigCommands::Show {
                file: Some(dir.path().join("missing.toml")),
            },
            &Config::default(),
            OutputFormat::Json,
        );
        assert!(missing.is_err());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer title here", 10), "a longe...");
    }
}

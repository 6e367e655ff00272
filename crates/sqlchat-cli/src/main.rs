use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sqlchat_catalog::{Database, PostgresDatabase};
use sqlchat_core::history::GREETING;
use sqlchat_core::{Config, ConversationHistory, Question, RawModelResponse};
use sqlchat_engine::{extract_query, Extraction, Orchestrator, Outcome, Stage};
use sqlchat_llm::{GeminiModel, LanguageModel};

const DEFAULT_CONFIG_FILE: &str = "sqlchat.toml";

/// sqlchat - ask questions of a PostgreSQL database in plain English
#[derive(Parser)]
#[command(name = "sqlchat")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: sqlchat.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive session
    Chat {
        /// Print the SQL that was executed for each answer
        #[arg(long)]
        show_sql: bool,

        /// Save the conversation as JSON on exit
        #[arg(short, long)]
        transcript: Option<PathBuf>,
    },

    /// Answer a single question
    Ask {
        /// The question to answer
        question: String,

        /// Print the SQL that was executed
        #[arg(long)]
        show_sql: bool,
    },

    /// Print the schema description sent to the model
    Schema,

    /// Extract a SQL statement from a model response (file or stdin)
    Extract {
        /// File holding the response; reads stdin when omitted
        file: Option<PathBuf>,
    },

    /// Write a default sqlchat.toml
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // .env may set RUST_LOG, so it is read before the subscriber is built
    load_env_file(None);
    init_tracing(log_filter(cli.verbose));

    match cli.command {
        Commands::Init { force } => {
            let path = cli.config.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            init_command(&path, force)
        }
        Commands::Extract { file } => extract_command(file.as_deref()).await,
        Commands::Chat { show_sql, transcript } => {
            let config = load_config(cli.config.as_deref(), cli.verbose)?;
            chat_command(&config, show_sql, transcript.as_deref()).await
        }
        Commands::Ask { question, show_sql } => {
            let config = load_config(cli.config.as_deref(), cli.verbose)?;
            ask_command(&config, &question, show_sql).await
        }
        Commands::Schema => {
            let config = load_config(cli.config.as_deref(), cli.verbose)?;
            schema_command(&config).await
        }
    }
}

/// Load `.env` (searched upward from the working directory) or a given file
///
/// Variables already set in the environment win.
fn load_env_file(path: Option<&Path>) {
    let loaded = match path {
        Some(path) => dotenvy::from_path(path),
        None => dotenvy::dotenv().map(|_| ()),
    };
    // A missing .env is normal
    loaded.ok();
}

/// `RUST_LOG` overrides the verbosity flag
fn log_filter(verbose: bool) -> EnvFilter {
    let default_level = if verbose { "info" } else { "warn" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Log to stderr
fn init_tracing(filter: EnvFilter) {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(path: Option<&Path>, verbose: bool) -> Result<Config> {
    let config = if let Some(config_path) = path {
        Config::from_file(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else if Path::new(DEFAULT_CONFIG_FILE).exists() {
        Config::from_file(Path::new(DEFAULT_CONFIG_FILE))?
    } else {
        if verbose {
            eprintln!("{}", "No config file found, using defaults".yellow());
        }
        Config::default()
    };

    if verbose {
        eprintln!(
            "{} {}@{}:{}/{}",
            "Database:".cyan(),
            config.database.user,
            config.database.host,
            config.database.port,
            config.database.dbname
        );
        eprintln!("{} {} ({})", "Model:".cyan(), config.model.model, config.model.provider);
    }

    Ok(config)
}

/// Connect to the configured database; failure here is fatal
async fn connect_database(config: &Config) -> Result<PostgresDatabase> {
    let password = config
        .database
        .resolve_password()
        .context("Database password is not configured")?;

    let db = PostgresDatabase::connect(&config.database, &password)
        .await
        .context("Failed to connect to database")?;
    db.test_connection()
        .await
        .context("Database connection test failed")?;

    tracing::info!(host = db.host(), port = db.port(), database = db.database(), "connected");
    Ok(db)
}

/// Build the configured model client; failure here is fatal
fn build_model(config: &Config) -> Result<Arc<dyn LanguageModel>> {
    match config.model.provider.as_str() {
        "gemini" => {
            let api_key = config.model.resolve_api_key()?;
            let model = GeminiModel::new(&config.model, api_key)
                .context("Failed to initialize language model")?;
            Ok(Arc::new(model))
        }
        other => Err(anyhow::anyhow!("Unsupported model provider '{}'. Supported: gemini", other)),
    }
}

async fn build_orchestrator(config: &Config) -> Result<Orchestrator> {
    let db = connect_database(config).await?;
    let model = build_model(config)?;
    Ok(Orchestrator::new(Arc::new(db), model)?)
}

/// Chat command - interactive question loop
async fn chat_command(config: &Config, show_sql: bool, transcript: Option<&Path>) -> Result<()> {
    let orchestrator = build_orchestrator(config).await?;
    let mut history = ConversationHistory::new();

    println!("{}", "sqlchat".bold().bright_blue());
    println!("{}", "Type 'exit' or 'quit' to leave.".dimmed());
    println!();
    print_assistant(GREETING);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("{} ", ">".green().bold());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if question.eq_ignore_ascii_case("exit") || question.eq_ignore_ascii_case("quit") {
            break;
        }

        history.push_user(question);

        match orchestrator.answer(&Question::new(question)).await {
            Ok(outcome) => {
                if show_sql {
                    print_sql(&outcome);
                }
                print_assistant(outcome.answer.as_str());
                history.push_assistant(outcome.answer.into_inner());
            }
            Err(e) => {
                // Fatal for this question only; the session keeps going
                eprintln!("{} {}", "Error:".red().bold(), e);
            }
        }
    }

    if let Some(path) = transcript {
        std::fs::write(path, history.to_json()?)
            .with_context(|| format!("Failed to write transcript to {}", path.display()))?;
        eprintln!("{} {}", "Transcript saved to:".green(), path.display());
    }

    Ok(())
}

/// Ask command - answer one question and exit
async fn ask_command(config: &Config, question: &str, show_sql: bool) -> Result<()> {
    let orchestrator = build_orchestrator(config).await?;
    let outcome = orchestrator.answer(&Question::new(question)).await?;

    if show_sql {
        print_sql(&outcome);
    }
    println!("{}", outcome.answer);

    Ok(())
}

/// Schema command - print what the model sees
async fn schema_command(config: &Config) -> Result<()> {
    let db = connect_database(config).await?;
    let schema = db.describe_schema().await?;

    if schema.is_empty() {
        eprintln!(
            "{} no tables found in schema '{}'",
            "⚠".yellow(),
            config.database.schema
        );
        return Ok(());
    }

    println!("{}", schema);
    Ok(())
}

/// Extract command - run only the extractor
async fn extract_command(file: Option<&Path>) -> Result<()> {
    let text = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            tokio::io::stdin().read_to_string(&mut buf).await?;
            buf
        }
    };

    match extract_query(&RawModelResponse::new(text)) {
        Extraction::Query { query, tier } => {
            eprintln!("{} {}", "Matched:".green().bold(), tier.as_str());
            println!("{}", query);
        }
        Extraction::DirectAnswer(answer) => {
            eprintln!("{}", "No SQL; the response is a direct answer".yellow().bold());
            println!("{}", answer);
        }
        Extraction::NoQueryFound { reason } => {
            return Err(anyhow::anyhow!("No query found: {}", reason));
        }
    }

    Ok(())
}

/// Init command - write a default config file
fn init_command(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(anyhow::anyhow!(
            "{} already exists. Use --force to overwrite it.",
            path.display()
        ));
    }

    Config::default().save_to_file(path)?;

    eprintln!("{} {}", "Config written to:".green(), path.display());
    eprintln!(
        "Set {} and {} in the environment or a .env file.",
        sqlchat_core::config::DB_PASSWORD_ENV.bold(),
        sqlchat_core::config::MODEL_API_KEY_ENV.bold()
    );
    Ok(())
}

fn print_assistant(text: &str) {
    println!("{} {}", "assistant:".bright_blue().bold(), text);
    println!();
}

fn print_sql(outcome: &Outcome) {
    match (&outcome.query, outcome.terminal) {
        (Some(query), Stage::ExecutionFailed) => {
            eprintln!("{} {}", "SQL (failed):".red(), query);
        }
        (Some(query), _) => {
            eprintln!("{} {}", "SQL:".cyan(), query);
        }
        (None, stage) => {
            eprintln!("{} none ({})", "SQL:".cyan(), stage);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_ask_with_global_flags() {
        let cli = Cli::try_parse_from(["sqlchat", "--verbose", "ask", "How many orders?", "--show-sql"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Ask { question, show_sql } => {
                assert_eq!(question, "How many orders?");
                assert!(show_sql);
            }
            _ => panic!("Expected ask command"),
        }
    }

    #[test]
    fn init_writes_loadable_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sqlchat.toml");

        init_command(&path, false).unwrap();
        let config = Config::from_file(&path).unwrap();
        assert_eq!(config, Config::default());

        assert!(init_command(&path, false).is_err());
        assert!(init_command(&path, true).is_ok());
    }

    #[tokio::test]
    async fn missing_database_password_is_fatal() {
        std::env::remove_var(sqlchat_core::config::DB_PASSWORD_ENV);
        let config = Config::default();

        let err = connect_database(&config).await.err().unwrap();
        let chain = format!("{:#}", err);
        assert!(chain.contains("Database password is not configured"));
        assert!(chain.contains(sqlchat_core::config::DB_PASSWORD_ENV));
    }

    #[test]
    fn env_file_log_level_reaches_filter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "RUST_LOG=sqlchat_engine=trace\n").unwrap();

        std::env::remove_var("RUST_LOG");
        load_env_file(Some(&path));

        assert!(log_filter(false).to_string().contains("sqlchat_engine=trace"));
        std::env::remove_var("RUST_LOG");
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let mut config = Config::default();
        config.model.provider = "mystery".to_string();
        config.model.api_key = Some("key".to_string());

        let err = build_model(&config).err().unwrap();
        assert!(err.to_string().contains("Unsupported model provider"));
    }
}

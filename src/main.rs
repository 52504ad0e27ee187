//! capability-mcp: MCP server exposing prompts, tools and resources.
//!
//! Without a subcommand the binary serves JSON-RPC on stdin/stdout. The
//! `prompts` subcommands edit the prompt file between runs.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgGroup, Parser, Subcommand};
use tracing::{debug, error, info, Level};
use tracing_subscriber::EnvFilter;

use capability_mcp::config::{self, Config};
use capability_mcp::error::StoreError;
use capability_mcp::mcp::{Dispatcher, McpServer, ServerInfo};
use capability_mcp::registry::Registry;
use capability_mcp::store::{PromptStore, StoredPrompt};
use capability_mcp::tools;

/// MCP server exposing registered prompts, tools and resources.
///
/// Speaks newline-delimited JSON-RPC 2.0 on stdin/stdout.
#[derive(Parser, Debug)]
#[command(name = "capability-mcp")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Decrease logging verbosity (only show errors)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve requests on stdin/stdout (default)
    Serve,

    /// Manage the prompt file
    Prompts {
        #[command(subcommand)]
        action: PromptsAction,
    },
}

#[derive(Subcommand, Debug)]
enum PromptsAction {
    /// List stored prompts
    List,

    /// Add a prompt
    #[command(group(ArgGroup::new("source").required(true).args(["template", "template_file"])))]
    Add {
        /// Unique id (ASCII letters, digits, hyphens)
        #[arg(long)]
        id: String,

        /// Display name
        #[arg(long)]
        name: String,

        /// Short description
        #[arg(long, default_value = "")]
        description: String,

        /// Template text
        #[arg(long)]
        template: Option<String>,

        /// Read the template text from a file
        #[arg(long, value_name = "FILE")]
        template_file: Option<PathBuf>,
    },

    /// Delete a prompt by id
    Delete {
        /// Id of the prompt to delete
        id: String,
    },
}

/// Determines the log level from CLI arguments.
#[allow(clippy::match_same_arms)] // Explicit "warn" arm for clarity
fn get_log_level(verbose: u8, quiet: bool, config_level: &str) -> Level {
    if quiet {
        return Level::ERROR;
    }

    match verbose {
        0 => match config_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::WARN,
        },
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Initialises the tracing subscriber for logging.
///
/// Logs go to stderr; stdout carries protocol traffic.
fn init_tracing(level: Level) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Builds the registry from the prompt file and, if enabled, the built-in
/// tools.
fn build_registry(cfg: &Config, store: &PromptStore) -> Result<Registry, String> {
    let mut registry = Registry::new();

    let prompts = store.load_or_init().map_err(|e| error_chain(&e))?;
    let loaded = prompts.register_into(&mut registry);
    info!(count = loaded, path = %store.path().display(), "Loaded prompts");

    if cfg.builtin_tools {
        tools::register_builtin(&mut registry).map_err(|e| e.to_string())?;
        info!(
            tools = registry.tool_count(),
            resources = registry.resource_count(),
            "Registered built-in tools"
        );
    }

    Ok(registry)
}

/// Runs the stdio server until EOF or a shutdown signal.
fn serve(cfg: &Config, store: &PromptStore) -> ExitCode {
    let registry = match build_registry(cfg, store) {
        Ok(registry) => registry,
        Err(e) => {
            error!(error = %e, "Failed to build registry");
            return ExitCode::FAILURE;
        }
    };

    let info = ServerInfo::from(&cfg.server);
    info!(name = %info.name, version = %info.version, "Starting MCP server");

    let server = McpServer::new(Dispatcher::new(info, registry));

    info!("MCP server ready, waiting for client connection...");

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Failed to create Tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(server.run()) {
        Ok(()) => {
            info!("Server shut down gracefully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Server error");
            ExitCode::FAILURE
        }
    }
}

/// Executes a `prompts` subcommand against the prompt file.
fn run_prompts(store: &PromptStore, action: PromptsAction) -> Result<(), StoreError> {
    let mut file = store.load_or_init()?;

    match action {
        PromptsAction::List => {
            if file.prompts.is_empty() {
                println!("No prompts stored in {}", store.path().display());
            }
            for prompt in &file.prompts {
                println!("{}  {}", prompt.id, prompt.name);
                if !prompt.description.is_empty() {
                    println!("    {}", prompt.description);
                }
            }
        }
        PromptsAction::Add {
            id,
            name,
            description,
            template,
            template_file,
        } => {
            let text = match (template, template_file) {
                (Some(text), _) => text,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .map_err(|e| StoreError::Read { path, source: e })?,
                (None, None) => unreachable!("clap requires one template source"),
            };
            file.add(StoredPrompt::new(id.clone(), name, description, text))?;
            store.save(&file)?;
            info!(prompt = %id, "Added prompt");
            println!("Added prompt '{id}'");
        }
        PromptsAction::Delete { id } => {
            let removed = file.remove(&id)?;
            store.save(&file)?;
            info!(prompt = %removed.id, "Deleted prompt");
            println!("Deleted prompt '{}'", removed.id);
        }
    }

    Ok(())
}

/// Renders an error with its source chain.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Entry point for the capability-mcp server.
fn main() -> ExitCode {
    let args = Args::parse();

    let config_path = args.config.as_deref();
    let loaded = config::find_config(config_path)
        .and_then(|found| {
            let cfg = found
                .as_deref()
                .map_or_else(|| Ok(Config::default()), config::read_config)?;
            Ok((cfg, found))
        });
    let (cfg, source) = match loaded {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Configuration error: {}", error_chain(&e));
            if config_path.is_none() {
                if let Some(default_path) = config::default_config_path() {
                    eprintln!("\nConfig read from: {}", default_path.display());
                }
            }
            return ExitCode::FAILURE;
        }
    };

    let log_level = get_log_level(args.verbose, args.quiet, &cfg.logging.level);
    init_tracing(log_level);

    // Reported only now that the subscriber is installed.
    match &source {
        Some(path) => debug!(path = %path.display(), "Loaded configuration"),
        None => debug!("No configuration file, using defaults"),
    }

    let store = PromptStore::new(&cfg.prompts_file);

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            // Display GPL license notice (required by GPLv3 Section 5d)
            eprintln!(
                "capability-mcp {}  Copyright (C) 2026  The Embedded Society",
                env!("CARGO_PKG_VERSION")
            );
            eprintln!("This program comes with ABSOLUTELY NO WARRANTY.");
            eprintln!("This is free software, licensed under GPL-3.0-or-later.");
            eprintln!();

            serve(&cfg, &store)
        }
        Command::Prompts { action } => match run_prompts(&store, action) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!(error = %error_chain(&e), "Prompt command failed");
                eprintln!("Error: {}", error_chain(&e));
                ExitCode::FAILURE
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn parses_prompt_subcommands() {
        let args = Args::try_parse_from([
            "capability-mcp",
            "prompts",
            "add",
            "--id",
            "quiz",
            "--name",
            "Quiz",
            "--template",
            "Ask a question",
        ])
        .unwrap();
        assert!(matches!(
            args.command,
            Some(Command::Prompts {
                action: PromptsAction::Add { .. }
            })
        ));

        let missing_source = Args::try_parse_from([
            "capability-mcp",
            "prompts",
            "add",
            "--id",
            "quiz",
            "--name",
            "Quiz",
        ]);
        assert!(missing_source.is_err());
    }

    #[test]
    fn config_path_with_subcommand() {
        let args = Args::try_parse_from(["capability-mcp", "cfg.json", "-v", "serve"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("cfg.json")));
        assert_eq!(args.verbose, 1);
        assert!(matches!(args.command, Some(Command::Serve)));
    }

    #[test]
    fn quiet_overrides_verbose() {
        assert_eq!(get_log_level(3, true, "trace"), Level::ERROR);
        assert_eq!(get_log_level(0, false, "DEBUG"), Level::DEBUG);
        assert_eq!(get_log_level(2, false, "error"), Level::DEBUG);
    }

    #[test]
    fn error_chain_includes_sources() {
        let err = StoreError::Read {
            path: PathBuf::from("p.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(error_chain(&err), "failed to read prompt file: p.json: gone");
    }
}

//! bioauth CLI
//!
//! Check for biometric hardware, see which sensor is present, and run a
//! single authentication challenge from the terminal.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use biometric_core::{
    load_config, resolve_config_path, save_config, system_service, AuthSession,
    BiometricAdapter, BiometricConfig, PromptConfig, ServiceBackend,
};

#[derive(Parser)]
#[command(name = "bioauth")]
#[command(version)]
#[command(about = "bioauth - biometric authentication from the command line")]
#[command(after_help = "EXAMPLES:
  bioauth status                    Is a sensor present and enrolled?
  bioauth kind                      Which sensor is present
  bioauth auth                      Run one challenge with the default prompt
  bioauth auth --title \"Deploy\"     Custom prompt title
  bioauth config init               Write a default config file")]
struct Cli {
    /// Config file (defaults to $BIOAUTH_CONFIG or the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured backend
    #[arg(long, global = true, value_enum)]
    backend: Option<BackendArg>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check biometric availability
    Status,

    /// Show the biometric sensor type
    Kind,

    /// Authenticate once
    #[command(after_help = "Exits with status 0 only when the user is verified.")]
    Auth {
        /// Prompt title
        #[arg(long)]
        title: Option<String>,
        /// Prompt subtitle
        #[arg(long)]
        subtitle: Option<String>,
        /// Cancel button label
        #[arg(long)]
        cancel_label: Option<String>,
        /// Print the session state as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage the config file
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Write the default configuration if none exists
    Init,
    /// Print the config file path
    Path,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    System,
    Fprintd,
    WindowsHello,
    Unsupported,
}

impl From<BackendArg> for ServiceBackend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::System => ServiceBackend::System,
            BackendArg::Fprintd => ServiceBackend::Fprintd,
            BackendArg::WindowsHello => ServiceBackend::WindowsHello,
            BackendArg::Unsupported => ServiceBackend::Unsupported,
        }
    }
}

/// Initialize logging
fn init_logging() {
    // stdout carries command output
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .compact(),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        None => {
            println!("bioauth - biometric authentication from the command line");
            println!();
            println!("Run 'bioauth --help' for usage information.");
            println!("Run 'bioauth status' to check for a sensor.");
        }
        Some(cmd) => {
            let config_path = cli.config.unwrap_or_else(resolve_config_path);
            if let Err(e) = handle_command(cmd, &config_path, cli.backend).await {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
}

async fn handle_command(
    cmd: Commands,
    config_path: &Path,
    backend: Option<BackendArg>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(config_path).await?;
    if let Some(backend) = backend {
        config.backend = backend.into();
    }
    debug!("Using backend {:?} from {}", config.backend, config_path.display());

    match cmd {
        Commands::Status => handle_status(&config).await?,
        Commands::Kind => handle_kind(&config),
        Commands::Auth { title, subtitle, cancel_label, json } => {
            let prompt = build_prompt(&config.prompt, title, subtitle, cancel_label);
            handle_auth(&config, prompt, json).await?;
        }
        Commands::Config { action } => match action {
            ConfigCommands::Show => handle_config_show(&config)?,
            ConfigCommands::Init => handle_config_init(config_path).await?,
            ConfigCommands::Path => println!("{}", config_path.display()),
        },
    }

    Ok(())
}

fn adapter_for(config: &BiometricConfig) -> BiometricAdapter {
    BiometricAdapter::new(system_service(config))
}

/// Command-line prompt strings override the configured ones
fn build_prompt(
    defaults: &PromptConfig,
    title: Option<String>,
    subtitle: Option<String>,
    cancel_label: Option<String>,
) -> PromptConfig {
    PromptConfig {
        title: title.unwrap_or_else(|| defaults.title.clone()),
        subtitle: subtitle.unwrap_or_else(|| defaults.subtitle.clone()),
        cancel_label: cancel_label.unwrap_or_else(|| defaults.cancel_label.clone()),
    }
}

async fn handle_status(config: &BiometricConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("Biometric Authentication Status");
    println!("================================");
    println!();

    let adapter = adapter_for(config);
    let kind = adapter.biometric_kind();

    if adapter.is_available().await {
        println!("[OK] {} is available", kind.label());
    } else {
        println!("[--] No enrolled biometric sensor detected");
        println!();
        println!("Enroll a fingerprint or face in your system settings, then retry.");
    }

    Ok(())
}

fn handle_kind(config: &BiometricConfig) {
    let kind = adapter_for(config).biometric_kind();
    println!("{} ({})", kind, kind.label());
}

async fn handle_auth(
    config: &BiometricConfig,
    prompt: PromptConfig,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = AuthSession::new(adapter_for(config));
    session.check_availability().await;

    if !json {
        eprintln!("{}", prompt.reason());
    }
    let outcome = session.authenticate(prompt).await;
    info!("Authentication result: {}", outcome.code());

    if json {
        println!("{}", serde_json::to_string_pretty(&session.snapshot().await)?);
    }

    if outcome.is_success() {
        if !json {
            println!("{}", outcome);
        }
        Ok(())
    } else {
        Err(outcome.to_string().into())
    }
}

fn handle_config_show(config: &BiometricConfig) -> Result<(), Box<dyn std::error::Error>> {
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

async fn handle_config_init(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if config_path.exists() {
        return Err(format!("Config already exists at {}", config_path.display()).into());
    }

    save_config(config_path, &BiometricConfig::default()).await?;
    println!("Wrote default config to {}", config_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_prompt_overrides() {
        let defaults = PromptConfig::default();
        let prompt = build_prompt(
            &defaults,
            Some("Deploy".to_string()),
            None,
            Some("Abort".to_string()),
        );
        assert_eq!(prompt.title, "Deploy");
        assert_eq!(prompt.subtitle, defaults.subtitle);
        assert_eq!(prompt.cancel_label, "Abort");
    }

    #[test]
    fn test_parse_auth_args() {
        let cli = Cli::parse_from(["bioauth", "--backend", "unsupported", "auth", "--json"]);
        assert!(matches!(cli.backend, Some(BackendArg::Unsupported)));
        assert!(matches!(cli.command, Some(Commands::Auth { json: true, .. })));
    }

    #[tokio::test]
    async fn test_auth_unsupported_backend_fails() {
        let config = BiometricConfig {
            backend: ServiceBackend::Unsupported,
            ..Default::default()
        };
        let err = handle_auth(&config, PromptConfig::default(), true).await.unwrap_err();
        assert!(err.to_string().contains("not available"));
    }

    #[tokio::test]
    async fn test_config_init_refuses_overwrite() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        handle_config_init(&path).await.unwrap();
        assert!(load_config(&path).await.is_ok());
        assert!(handle_config_init(&path).await.is_err());
    }
}

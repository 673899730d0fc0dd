mod config;
mod content;
mod controller;
mod events;
mod html;
mod launch;
mod logging;
mod menu;
mod progress;
mod render;
mod serve;
mod tui;
mod web_assets;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use config::{Overrides, SiteConfig};

/// Explicit subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Read the guide in the terminal (default when no subcommand is given)
    View {
        /// Append debug logs to this file; the viewer logs nothing otherwise
        #[arg(long)]
        log_file: Option<PathBuf>,
    },
    /// Serve the guide as a web page over HTTP
    Serve {
        /// Interface address to bind to [default: 127.0.0.1]
        #[arg(long)]
        bind: Option<String>,
        /// Starting port number for the HTTP server [default: 3333]
        #[arg(long)]
        port: Option<u16>,
        /// Directory holding images and other static files [default: public]
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },
}

#[derive(Parser)]
#[command(
    name = "zoonosis-guide",
    version,
    about = "Public information guide on zoonotic diseases: terminal reader and web page server",
    after_help = "INVOCATION FORMS:\n  zoonosis-guide                       Read the guide in the terminal\n  zoonosis-guide view                  Read the guide in the terminal\n  zoonosis-guide serve [OPTIONS]       Serve the guide over HTTP"
)]
struct Cli {
    /// YAML file overriding the emergency number, links and server settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Resolved dispatch mode after CLI argument parsing.
enum DispatchMode {
    View { log_file: Option<PathBuf> },
    Serve { overrides: Overrides },
}

fn resolve_dispatch_mode(command: Option<Commands>) -> DispatchMode {
    match command {
        None => DispatchMode::View { log_file: None },
        Some(Commands::View { log_file }) => DispatchMode::View { log_file },
        Some(Commands::Serve {
            bind,
            port,
            static_dir,
        }) => DispatchMode::Serve {
            overrides: Overrides {
                bind,
                port,
                static_dir,
            },
        },
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config;

    match resolve_dispatch_mode(cli.command) {
        DispatchMode::View { log_file } => {
            logging::init_for_terminal(log_file.as_deref()).with_context(|| {
                format!(
                    "opening log file {}",
                    log_file.as_deref().map(|p| p.display().to_string()).unwrap_or_default()
                )
            })?;
            let config = SiteConfig::load(config_path.as_deref(), Overrides::default())?;
            tracing::info!(emergency_number = %config.emergency_number, "view: starting");
            tui::run(&config).context("terminal viewer failed")
        }
        DispatchMode::Serve { overrides } => {
            logging::init_stderr("info");
            let config = SiteConfig::load(config_path.as_deref(), overrides)?;
            let rt = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("building tokio runtime")?;
            rt.block_on(serve::run_serve(config))?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_views() {
        let cli = parse(&["zoonosis-guide"]);
        assert!(matches!(
            resolve_dispatch_mode(cli.command),
            DispatchMode::View { log_file: None }
        ));
    }

    #[test]
    fn serve_flags_become_overrides() {
        let cli = parse(&[
            "zoonosis-guide",
            "serve",
            "--bind",
            "0.0.0.0",
            "--port",
            "8080",
            "--static-dir",
            "site",
        ]);
        let DispatchMode::Serve { overrides } = resolve_dispatch_mode(cli.command) else {
            panic!("expected serve");
        };
        assert_eq!(overrides.bind.as_deref(), Some("0.0.0.0"));
        assert_eq!(overrides.port, Some(8080));
        assert_eq!(overrides.static_dir, Some(PathBuf::from("site")));
    }

    #[test]
    fn serve_without_flags_leaves_config_values() {
        let cli = parse(&["zoonosis-guide", "serve"]);
        let DispatchMode::Serve { overrides } = resolve_dispatch_mode(cli.command) else {
            panic!("expected serve");
        };
        assert!(overrides.bind.is_none());
        assert!(overrides.port.is_none());
        assert!(overrides.static_dir.is_none());
    }

    #[test]
    fn config_flag_is_global() {
        let cli = parse(&["zoonosis-guide", "serve", "--config", "site.yml"]);
        assert_eq!(cli.config, Some(PathBuf::from("site.yml")));
        let cli = parse(&["zoonosis-guide", "--config", "site.yml", "view"]);
        assert_eq!(cli.config, Some(PathBuf::from("site.yml")));
    }

    #[test]
    fn unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["zoonosis-guide", "edit"]).is_err());
    }
}

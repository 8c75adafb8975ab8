use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_PATH: &str = "configs/default.toml";

#[derive(Parser, Debug)]
#[command(name = "airport")]
#[command(about = "Airport service management commands")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (TOML). Defaults to configs/default.toml when present.
    #[arg(long, global = true, env = "AIRPORT_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Block until the database accepts connections
    WaitForDb,

    /// Apply pending schema migrations
    Migrate,

    /// Copy bundled static assets into the static root
    Collectstatic {
        /// Remove existing files before copying
        #[arg(long)]
        clear: bool,
    },

    /// Create a staff user
    Createsuperuser {
        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,
    },

    /// Run the HTTP server
    Serve {
        /// Listen address, overrides server.bind and server.port
        #[arg(long)]
        bind: Option<String>,
    },
}

impl Cli {
    /// The explicit `--config` path, or the default file if it exists.
    pub fn config_path(&self) -> Option<PathBuf> {
        self.config.clone().or_else(|| {
            let default = PathBuf::from(DEFAULT_CONFIG_PATH);
            default.exists().then_some(default)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_startup_chain_commands() {
        let cli = Cli::try_parse_from(["airport", "wait-for-db"]).unwrap();
        assert_eq!(cli.command, Commands::WaitForDb);

        let cli = Cli::try_parse_from(["airport", "collectstatic", "--clear"]).unwrap();
        assert_eq!(cli.command, Commands::Collectstatic { clear: true });

        let cli = Cli::try_parse_from(["airport", "serve", "--bind", "0.0.0.0:8000"]).unwrap();
        assert_eq!(
            cli.command,
            Commands::Serve {
                bind: Some("0.0.0.0:8000".to_string())
            }
        );
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["airport", "migrate", "--config", "/etc/airport.toml"])
            .unwrap();
        assert_eq!(cli.command, Commands::Migrate);
        assert_eq!(cli.config_path(), Some(PathBuf::from("/etc/airport.toml")));
    }

    #[test]
    fn incomplete_commands_are_rejected() {
        assert!(Cli::try_parse_from(["airport", "runserver"]).is_err());
        assert!(Cli::try_parse_from(["airport", "createsuperuser", "--email", "a@b.com"]).is_err());
    }
}

use std::path::PathBuf;

use crate::error::Result;
pub use clap::Parser;
use movieshub_app::state::AppConfig;

#[derive(Debug, Clone, clap::Parser)]
#[command(version, about = "REST service for a movie catalogue")]
pub struct ServerConfig {
    #[arg(
        short,
        long,
        default_value_t = 3000,
        env = "MOVIESHUB_LISTEN_PORT",
        help = "Port to listen on"
    )]
    pub port: u16,
    #[arg(
        short,
        long,
        default_value = "127.0.0.1",
        env = "MOVIESHUB_LISTEN_ADDRESS",
        help = "Address to listen on"
    )]
    pub listen_address: String,

    #[arg(
        long,
        env = "MOVIESHUB_DATABASE_URL",
        help = "Database URL e.g. sqlite://file.db, default is sqlite://[data-dir]/movieshub.db, where data-dir is set by --data-dir"
    )]
    database_url: Option<String>,

    #[arg(
        long,
        env = "MOVIESHUB_DATA_DIR",
        help = "Data directory (database etc.), default is system default like ~/.local/share/movieshub",
        default_value_t = default_data_dir()
    )]
    data_dir: String,

    #[arg(
        long,
        env = "MOVIESHUB_DEFAULT_PAGE_SIZE",
        default_value = "100",
        value_parser = clap::value_parser!(u32).range(1..=1000),
        help = "Default page size for movie listing"
    )]
    pub default_page_size: u32,

    #[arg(
        long,
        env = "MOVIESHUB_MAX_CONNECTIONS",
        default_value_t = movieshub_dal::DEFAULT_MAX_CONNECTIONS,
        help = "Maximum number of database connections"
    )]
    pub max_connections: u32,

    #[arg(long, env = "MOVIESHUB_CORS", help = "Enable permissive CORS")]
    pub cors: bool,
}

fn default_data_dir() -> String {
    dirs::data_dir()
        .map(|p| p.join("movieshub"))
        .unwrap_or_else(|| PathBuf::from("movieshub"))
        .to_string_lossy()
        .to_string()
}

impl ServerConfig {
    pub fn load() -> Result<Self> {
        ServerConfig::try_parse().map_err(|e| e.into())
    }

    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    pub fn database_url(&self) -> String {
        self.database_url
            .clone()
            .unwrap_or_else(|| format!("sqlite://{}/movieshub.db", self.data_dir))
    }
}

impl From<&ServerConfig> for AppConfig {
    fn from(config: &ServerConfig) -> Self {
        AppConfig {
            default_page_size: config.default_page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config =
            ServerConfig::try_parse_from(["movieshub-server", "--data-dir", "/tmp/mh"]).unwrap();
        assert_eq!(3000, config.port);
        assert_eq!("127.0.0.1", config.listen_address);
        assert_eq!("sqlite:///tmp/mh/movieshub.db", config.database_url());
        assert_eq!(100, AppConfig::from(&config).default_page_size);
        assert!(!config.cors);
    }

    #[test]
    fn test_explicit_values() {
        let config = ServerConfig::try_parse_from([
            "movieshub-server",
            "--port",
            "8080",
            "--database-url",
            "sqlite::memory:",
            "--default-page-size",
            "20",
            "--cors",
        ])
        .unwrap();
        assert_eq!(8080, config.port);
        assert_eq!("sqlite::memory:", config.database_url());
        assert_eq!(20, config.default_page_size);
        assert!(config.cors);
    }

    #[test]
    fn test_invalid_page_size() {
        let res =
            ServerConfig::try_parse_from(["movieshub-server", "--default-page-size", "0"]);
        assert!(res.is_err());
    }
}

use once_cell::sync::Lazy;
use std::env;
use std::path::PathBuf;

const DEFAULT_PORT: u16 = 8080;

const PORT_KEY: &str = "PAGECHAIN_PORT";
const SOCKET_KEY: &str = "PAGECHAIN_SOCKET";
const WALLET_KEY: &str = "PAGECHAIN_WALLET";

static DEFAULT_SOCKET_PATH: Lazy<PathBuf> =
    Lazy::new(|| env::temp_dir().join("pagechain.sock"));

static DEFAULT_WALLET_PATH: Lazy<PathBuf> =
    Lazy::new(|| env::temp_dir().join("pagechain.wallet"));

#[derive(Debug, Clone)]
pub struct Config {
    /// TCP port the peer listener binds
    pub port: u16,
    /// Path of the local control socket
    pub socket_path: PathBuf,
    /// Default wallet file used by the CLI
    pub wallet_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

impl Config {
    pub fn from_env() -> Config {
        let port = env::var(PORT_KEY)
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let socket_path = env::var(SOCKET_KEY)
            .map(PathBuf::from)
            .unwrap_or_else(|_| DEFAULT_SOCKET_PATH.clone());

        let wallet_path = env::var(WALLET_KEY)
            .map(PathBuf::from)
            .unwrap_or_else(|_| DEFAULT_WALLET_PATH.clone());

        Config {
            port,
            socket_path,
            wallet_path,
        }
    }
}

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind: String,
    pub port: u16,
    /// Path of the append-only command log.
    pub aof_path: String,
    /// Expiration sweeper frequency (ticks per second).
    pub hz: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind: "127.0.0.1".to_string(),
            port: 6379,
            aof_path: "database.aof".to_string(),
            hz: 10,
        }
    }
}

impl Config {
    pub fn from_args(args: &[String]) -> Self {
        let mut config = Config::default();
        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--port" => {
                    if i + 1 < args.len() {
                        if let Ok(p) = args[i + 1].parse() {
                            config.port = p;
                        }
                        i += 1;
                    }
                }
                "--bind" => {
                    if i + 1 < args.len() {
                        config.bind = args[i + 1].clone();
                        i += 1;
                    }
                }
                "--aof" => {
                    if i + 1 < args.len() {
                        config.aof_path = args[i + 1].clone();
                        i += 1;
                    }
                }
                "--hz" => {
                    if i + 1 < args.len() {
                        if let Ok(h) = args[i + 1].parse() {
                            config.hz = h;
                        }
                        i += 1;
                    }
                }
                _ => {}
            }
            i += 1;
        }
        config
    }

    /// Tick interval of the expiration sweeper.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(1000 / self.hz.max(1))
    }
}

pub type SharedConfig = Arc<RwLock<Config>>;

use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub bot: BotConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Telegram bot token for the admin console bot.
    pub token: String,
    /// Telegram ids allowed to use the console.
    pub admin_ids: Vec<i64>,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            database: DatabaseConfig::from_env()?,
            bot: BotConfig::from_env()?,
        })
    }
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self, String> {
        let host = env::var("DB_HOST").map_err(|_| "DB_HOST is required".to_string())?;
        let port = env::var("DB_PORT")
            .unwrap_or_else(|_| "5432".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid DB_PORT: {}", e))?;
        let name = env::var("DB_NAME").map_err(|_| "DB_NAME is required".to_string())?;
        let user = env::var("DB_USER").map_err(|_| "DB_USER is required".to_string())?;
        let password = env::var("DB_PASSWORD").map_err(|_| "DB_PASSWORD is required".to_string())?;

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()
            .map_err(|e| format!("Invalid DB_MAX_CONNECTIONS: {}", e))?;
        let min_connections = env::var("DB_MIN_CONNECTIONS")
            .unwrap_or_else(|_| "1".to_string())
            .parse::<u32>()
            .map_err(|e| format!("Invalid DB_MIN_CONNECTIONS: {}", e))?;
        let acquire_timeout_secs = env::var("DB_ACQUIRE_TIMEOUT_SECS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u64>()
            .map_err(|e| format!("Invalid DB_ACQUIRE_TIMEOUT_SECS: {}", e))?;

        Ok(DatabaseConfig {
            host,
            port,
            name,
            user,
            password,
            max_connections,
            min_connections,
            acquire_timeout_secs,
        })
    }

    pub fn url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.name
        )
    }
}

impl BotConfig {
    pub fn from_env() -> Result<Self, String> {
        let token =
            env::var("ADMIN_BOT_TOKEN").map_err(|_| "ADMIN_BOT_TOKEN is required".to_string())?;

        let admin_ids = parse_admin_ids(&env::var("ADMIN_IDS").unwrap_or_default())?;

        Ok(BotConfig { token, admin_ids })
    }
}

/// Parses the comma-separated admin allow-list. Empty entries are dropped.
fn parse_admin_ids(raw: &str) -> Result<Vec<i64>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|e| format!("Invalid ADMIN_IDS entry '{}': {}", s, e))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_admin_ids_drops_empty_entries() {
        let ids = parse_admin_ids("42, ,7,,").unwrap();
        assert_eq!(ids, vec![42, 7]);
    }

    #[test]
    fn test_parse_admin_ids_empty_string() {
        let ids = parse_admin_ids("").unwrap();
        assert!(ids.is_empty());
    }

    #[test]
    fn test_parse_admin_ids_rejects_garbage() {
        assert!(parse_admin_ids("42,abc").is_err());
    }
}

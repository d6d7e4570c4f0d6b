use std::env;
use std::time::Duration;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub database_url: String,
    pub secret_key: String,
    pub api_base_uri: String,
    pub token_expiration_secs: u64,
    pub code_expiration_secs: u64,
    pub server_host: String,
    pub server_port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();

        // TOKEN_EXPIRATION 以天为单位（如 "7d"），CODE_EXPIRATION 以小时为单位（如 "3h"）
        let token_expiration = env::var("TOKEN_EXPIRATION")?
            .trim_end_matches('d')
            .parse::<u64>()
            .unwrap_or(7);
        let code_expiration = env::var("CODE_EXPIRATION")?
            .trim_end_matches('h')
            .parse::<u64>()
            .unwrap_or(3);
        Ok(Config {
            database_url: env::var("DATABASE_URL")?,
            secret_key: env::var("SECRET_KEY")?,
            api_base_uri: env::var("API_BASE_URI").unwrap_or_else(|_| "/api".into()),
            token_expiration_secs: token_expiration * 24 * 3600,
            code_expiration_secs: code_expiration * 3600,
            server_host: env::var("SERVER_HOST")?,
            server_port: env::var("SERVER_PORT")?.parse().unwrap_or(3000),
        })
    }

    pub fn token_expiration(&self) -> Duration {
        Duration::from_secs(self.token_expiration_secs)
    }

    pub fn code_expiration(&self) -> Duration {
        Duration::from_secs(self.code_expiration_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiration_accessors_convert_to_duration() {
        let config = Config {
            database_url: "postgres://localhost/wedding".into(),
            secret_key: "change-me".into(),
            api_base_uri: "/api".into(),
            token_expiration_secs: 7 * 24 * 3600,
            code_expiration_secs: 3 * 3600,
            server_host: "127.0.0.1".into(),
            server_port: 3000,
        };
        assert_eq!(config.token_expiration(), Duration::from_secs(604800));
        assert_eq!(config.code_expiration(), Duration::from_secs(10800));
    }
}

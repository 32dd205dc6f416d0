use std::net::SocketAddr;

use anyhow::Context;

const SECRET_KEY_MIN_LEN: usize = 32;

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub secret_key: String,
    pub omdb_api_key: String,
    pub omdb_base_url: String,
    pub database_url: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("omdb_base_url", &self.omdb_base_url)
            .field("database_url", &self.database_url)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 =
            std::env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().context("PORT")?;

        let secret_key = std::env::var("SECRET_KEY")
            .context("SECRET_KEY must be set to sign status messages")?;
        if secret_key.len() < SECRET_KEY_MIN_LEN {
            anyhow::bail!("SECRET_KEY must be at least {SECRET_KEY_MIN_LEN} bytes long");
        }

        let omdb_api_key = std::env::var("OMDB_API_KEY").unwrap_or_else(|_| "".to_string());
        let omdb_base_url = std::env::var("OMDB_BASE_URL")
            .unwrap_or_else(|_| "https://www.omdbapi.com/".to_string());

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://moviweb.db?mode=rwc".to_string());

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            secret_key,
            omdb_api_key,
            omdb_base_url,
            database_url,
        })
    }
}

use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;
use url::Url;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_model: String,
    pub public_rps: u32,
    pub generation_rps: u32,
    pub context_poll_secs: u64,
    pub cors_allowed_origin: Option<String>,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let openai_base_url =
            env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_OPENAI_BASE_URL.to_string());
        Url::parse(&openai_base_url)
            .map_err(|e| Error::Config(format!("Invalid value for OPENAI_BASE_URL: {}", e)))?;

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            openai_api_key: get_env("OPENAI_API_KEY")?,
            openai_base_url: openai_base_url.trim_end_matches('/').to_string(),
            openai_model: env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| DEFAULT_OPENAI_MODEL.to_string()),
            public_rps: get_env_parse_or("PUBLIC_RPS", 50)?,
            generation_rps: get_env_parse_or("GENERATION_RPS", 2)?,
            context_poll_secs: get_env_parse_or("CONTEXT_POLL_SECS", 5)?,
            cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN").ok(),
        })
    }

    /// Settings for tests and embedding; never reads the environment.
    pub fn for_tests() -> Self {
        Self {
            server_address: "127.0.0.1:0".to_string(),
            openai_api_key: "sk-test".to_string(),
            openai_base_url: "http://127.0.0.1:9".to_string(),
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            public_rps: 1000,
            generation_rps: 1000,
            context_poll_secs: 5,
            cors_allowed_origin: None,
        }
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> Result<&'static Config> {
    CONFIG
        .get()
        .ok_or_else(|| Error::Config("Configuration has not been initialized".to_string()))
}

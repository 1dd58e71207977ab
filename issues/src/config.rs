use anyhow::{Context, Result};

pub struct Config {
    pub mongo_uri: String,
    pub database: String,
    pub collection: String,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var_or = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let mongo_uri = lookup("MONGOURI").context("MONGOURI is not set")?;
        let port = var_or("ISSUES_PORT", "3000");
        let port = port
            .parse()
            .with_context(|| format!("ISSUES_PORT is not a valid port: {port:?}"))?;

        Ok(Self {
            mongo_uri,
            database: var_or("ISSUES_DATABASE", "issues"),
            collection: var_or("ISSUES_COLLECTION", "issues"),
            host: var_or("ISSUES_HOST", "0.0.0.0"),
            port,
        })
    }
}

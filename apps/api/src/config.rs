use anyhow::{bail, Context, Result};

/// Which storage backend the service runs against.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageBackend {
    Memory,
    Postgres { database_url: String },
}

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub storage: StorageBackend,
    pub llm_api_key: String,
    pub llm_base_url: String,
    pub llm_model: String,
    pub port: u16,
    pub rust_log: String,
    pub session_ttl_hours: i64,
    pub cookie_secure: bool,
    /// Registrations with one of these emails are flagged as admin.
    pub admin_emails: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_url = get("DATABASE_URL").filter(|s| !s.trim().is_empty());
        let storage = match (get("STORAGE_BACKEND").as_deref(), database_url) {
            (Some("memory"), _) | (None, None) => StorageBackend::Memory,
            (Some("postgres"), None) => {
                bail!("STORAGE_BACKEND=postgres requires DATABASE_URL to be set")
            }
            (Some("postgres") | None, Some(database_url)) => {
                StorageBackend::Postgres { database_url }
            }
            (Some(other), _) => bail!("Unknown STORAGE_BACKEND '{other}' (expected memory|postgres)"),
        };

        Ok(Config {
            storage,
            llm_api_key: get("LLM_API_KEY")
                .with_context(|| "Required environment variable 'LLM_API_KEY' is not set")?,
            llm_base_url: get("LLM_BASE_URL")
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            llm_model: get("LLM_MODEL").unwrap_or_else(|| "gpt-4o".to_string()),
            port: get("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            session_ttl_hours: get("SESSION_TTL_HOURS")
                .unwrap_or_else(|| "168".to_string())
                .parse::<i64>()
                .context("SESSION_TTL_HOURS must be an integer")?,
            cookie_secure: get("COOKIE_SECURE")
                .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            admin_emails: get("ADMIN_EMAILS")
                .map(|v| {
                    v.split(',')
                        .map(|e| e.trim().to_lowercase())
                        .filter(|e| !e.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
        })
    }

    pub fn is_admin_email(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        self.admin_emails.iter().any(|e| *e == email)
    }
}

#[cfg(test)]
impl Config {
    /// In-memory configuration for tests; never reaches the network.
    pub fn for_tests() -> Self {
        Config {
            storage: StorageBackend::Memory,
            llm_api_key: "test-key".to_string(),
            llm_base_url: "http://127.0.0.1:9".to_string(),
            llm_model: "test-model".to_string(),
            port: 0,
            rust_log: "debug".to_string(),
            session_ttl_hours: 1,
            cookie_secure: false,
            admin_emails: vec!["admin@example.com".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_to_memory_storage() {
        let config = Config::from_lookup(lookup(&[("LLM_API_KEY", "k")])).unwrap();
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.port, 8080);
        assert_eq!(config.llm_model, "gpt-4o");
        assert_eq!(config.session_ttl_hours, 168);
        assert!(!config.cookie_secure);
    }

    #[test]
    fn test_database_url_selects_postgres() {
        let config = Config::from_lookup(lookup(&[
            ("LLM_API_KEY", "k"),
            ("DATABASE_URL", "postgres://localhost/tailor"),
        ]))
        .unwrap();
        assert!(matches!(config.storage, StorageBackend::Postgres { .. }));
    }

    #[test]
    fn test_memory_override_wins_over_database_url() {
        let config = Config::from_lookup(lookup(&[
            ("LLM_API_KEY", "k"),
            ("DATABASE_URL", "postgres://localhost/tailor"),
            ("STORAGE_BACKEND", "memory"),
        ]))
        .unwrap();
        assert_eq!(config.storage, StorageBackend::Memory);
    }

    #[test]
    fn test_postgres_without_url_is_error() {
        let result = Config::from_lookup(lookup(&[
            ("LLM_API_KEY", "k"),
            ("STORAGE_BACKEND", "postgres"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_api_key_is_error() {
        assert!(Config::from_lookup(lookup(&[])).is_err());
    }

    #[test]
    fn test_admin_emails_are_normalized() {
        let config = Config::from_lookup(lookup(&[
            ("LLM_API_KEY", "k"),
            ("ADMIN_EMAILS", " Root@Example.com, ,ops@example.com"),
        ]))
        .unwrap();
        assert_eq!(config.admin_emails.len(), 2);
        assert!(config.is_admin_email("root@example.COM"));
        assert!(!config.is_admin_email("user@example.com"));
    }
}

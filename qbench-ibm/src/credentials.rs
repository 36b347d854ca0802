//! IBM Quantum credentials
//!
//! Lookup order used by [`CredentialsManager::load`]:
//! 1. `.env` file in the working directory (loaded into the environment)
//! 2. `IBM_QUANTUM_TOKEN` / `IBM_QUANTUM_INSTANCE` / `IBM_QUANTUM_URL`
//! 3. `~/.qiskit/qiskit-ibm.json`

use crate::error::{IBMError, Result};
use crate::IBM_QUANTUM_API_URL;
use serde_json::Value;
use std::env;
use std::path::{Path, PathBuf};

/// Shortest token accepted before any request is made
const MIN_TOKEN_LEN: usize = 32;

/// API token plus optional service instance and endpoint
#[derive(Clone)]
pub struct Credentials {
    token: String,
    instance: Option<String>,
    api_url: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("instance", &self.instance)
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl Credentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            instance: None,
            api_url: IBM_QUANTUM_API_URL.to_string(),
        }
    }

    /// Scope requests to a hub/group/project instance
    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    /// Point requests at another endpoint
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn instance(&self) -> Option<&str> {
        self.instance.as_deref()
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Reject tokens that cannot be valid
    pub fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(IBMError::InvalidToken("Token is empty".into()));
        }
        if self.token.len() < MIN_TOKEN_LEN {
            return Err(IBMError::InvalidToken(format!(
                "Token is too short ({} characters)",
                self.token.len()
            )));
        }
        Ok(())
    }

    /// Value of the `Authorization` header
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// Locates credentials on the local machine
pub struct CredentialsManager;

impl CredentialsManager {
    /// Load credentials from the environment or the Qiskit config file
    pub fn load() -> Result<Credentials> {
        let _ = dotenvy::dotenv();

        if let Ok(token) = env::var("IBM_QUANTUM_TOKEN") {
            let mut creds = Credentials::new(token);
            if let Ok(instance) = env::var("IBM_QUANTUM_INSTANCE") {
                creds = creds.with_instance(instance);
            }
            if let Ok(url) = env::var("IBM_QUANTUM_URL") {
                creds = creds.with_api_url(url);
            }
            creds.validate()?;
            return Ok(creds);
        }

        let path = Self::qiskit_config_path()?;
        if path.exists() {
            if let Some(creds) = Self::from_qiskit_config(&path)? {
                return Ok(creds);
            }
        }

        Err(IBMError::TokenNotFound)
    }

    /// Validated credentials from an explicit token
    pub fn from_token(token: impl Into<String>) -> Result<Credentials> {
        let creds = Credentials::new(token);
        creds.validate()?;
        Ok(creds)
    }

    /// Read a Qiskit account file
    ///
    /// Accepts a top-level `token` or a `default_provider` object with
    /// `token`, `instance` and `url`.
    pub fn from_qiskit_config(path: &Path) -> Result<Option<Credentials>> {
        let content = std::fs::read_to_string(path)?;
        let config: Value = serde_json::from_str(&content)?;

        let section = match config.get("default_provider") {
            Some(provider) if provider.get("token").is_some() => provider,
            _ => &config,
        };
        let Some(token) = section.get("token").and_then(Value::as_str) else {
            return Ok(None);
        };

        let mut creds = Credentials::new(token);
        if let Some(instance) = section.get("instance").and_then(Value::as_str) {
            creds = creds.with_instance(instance);
        }
        if let Some(url) = section.get("url").and_then(Value::as_str) {
            creds = creds.with_api_url(url);
        }
        creds.validate()?;
        Ok(Some(creds))
    }

    fn qiskit_config_path() -> Result<PathBuf> {
        let home = env::var("HOME")
            .or_else(|_| env::var("USERPROFILE"))
            .map_err(|_| IBMError::Other("Could not determine home directory".into()))?;

        Ok(PathBuf::from(home).join(".qiskit").join("qiskit-ibm.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TOKEN: &str = "0123456789abcdef0123456789abcdef0123";

    fn config_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_validate() {
        assert!(Credentials::new(TOKEN).validate().is_ok());
        assert!(Credentials::new("").validate().is_err());
        assert!(Credentials::new("short").validate().is_err());
    }

    #[test]
    fn test_auth_header_and_defaults() {
        let creds = Credentials::new(TOKEN);
        assert_eq!(creds.auth_header(), format!("Bearer {}", TOKEN));
        assert_eq!(creds.api_url(), IBM_QUANTUM_API_URL);
        assert_eq!(creds.instance(), None);
    }

    #[test]
    fn test_api_url_trailing_slash_trimmed() {
        let creds = Credentials::new(TOKEN).with_api_url("http://localhost:8080/");
        assert_eq!(creds.api_url(), "http://localhost:8080");
    }

    #[test]
    fn test_debug_hides_token() {
        let rendered = format!("{:?}", Credentials::new(TOKEN));
        assert!(!rendered.contains(TOKEN));
    }

    #[test]
    fn test_from_token() {
        assert!(CredentialsManager::from_token(TOKEN).is_ok());
        assert!(matches!(
            CredentialsManager::from_token("abc"),
            Err(IBMError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_qiskit_config_top_level_token() {
        let file = config_file(&format!(r#"{{"token": "{}"}}"#, TOKEN));
        let creds = CredentialsManager::from_qiskit_config(file.path())
            .unwrap()
            .unwrap();
        assert_eq!(creds.token(), TOKEN);
    }

    #[test]
    fn test_qiskit_config_default_provider() {
        let file = config_file(&format!(
            r#"{{"default_provider": {{"token": "{}", "instance": "hub/group/project", "url": "http://proxy"}}}}"#,
            TOKEN
        ));
        let creds = CredentialsManager::from_qiskit_config(file.path())
            .unwrap()
            .unwrap();
        assert_eq!(creds.instance(), Some("hub/group/project"));
        assert_eq!(creds.api_url(), "http://proxy");
    }

    #[test]
    fn test_qiskit_config_without_token() {
        let file = config_file(r#"{"channel": "ibm_quantum"}"#);
        assert!(CredentialsManager::from_qiskit_config(file.path())
            .unwrap()
            .is_none());
    }
}

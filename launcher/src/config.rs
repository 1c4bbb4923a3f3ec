// Configuration management for the Guacamole desktop launcher
//
// Optional JSON file in the XDG config directory. Every field has a default,
// so a missing file or a partial file is fine.

use anyhow::{Context, Result};
use colored::Colorize;
use guacview_keybinds::{KeyRegistry, KeySpec};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{
    CACHE_DIR_NAME, CONFIG_DIR_NAME, DEFAULT_CLIENT_URL_TEMPLATE, DEFAULT_GSETTINGS_PROGRAM,
    DEFAULT_LOGIN_URL, DEFAULT_REDIRECT_PORT, RECOVERY_FILE_NAME, TOKEN_PLACEHOLDER,
};

/// Launcher configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    /// Gateway login page loaded at startup
    pub login_url: String,

    /// Client deep-link template containing `{token}`
    pub client_url_template: String,

    /// Local port the authentication flow redirects to
    pub redirect_port: u16,

    /// Cache directory for the recovery file (defaults to `~/.cache/guac-webkit`)
    pub cache_dir: Option<PathBuf>,

    /// `gsettings` binary used to read and write keybindings
    pub gsettings_program: PathBuf,

    /// Keys disabled while fullscreen
    pub override_keys: Vec<KeySpec>,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            login_url: DEFAULT_LOGIN_URL.to_string(),
            client_url_template: DEFAULT_CLIENT_URL_TEMPLATE.to_string(),
            redirect_port: DEFAULT_REDIRECT_PORT,
            cache_dir: None,
            gsettings_program: PathBuf::from(DEFAULT_GSETTINGS_PROGRAM),
            override_keys: KeyRegistry::gnome_specs(),
        }
    }
}

impl LauncherConfig {
    /// Load configuration
    ///
    /// With an explicit path the file must exist and parse. Without one, the
    /// default location is used; a missing file gives defaults and a broken
    /// file is reported and replaced by defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config = if let Some(path) = explicit {
            Self::load_from_file(path)?
        } else {
            let path = Self::config_path()?;
            if path.exists() {
                Self::load_from_file(&path).unwrap_or_else(|e| {
                    eprintln!(
                        "{} Failed to load config file: {:#}",
                        "Warning:".yellow().bold(),
                        e
                    );
                    eprintln!("  Using built-in defaults.");
                    Self::default()
                })
            } else {
                Self::default()
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path
    fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Get the XDG-compliant configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to determine config directory (XDG_CONFIG_HOME or ~/.config)")?;

        Ok(config_dir.join(CONFIG_DIR_NAME).join("config.json"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        validate_http_url("login_url", &self.login_url)?;
        validate_http_url("client_url_template", &self.client_url_template)?;

        if !self.client_url_template.contains(TOKEN_PLACEHOLDER) {
            anyhow::bail!(
                "Invalid client_url_template '{}': must contain {TOKEN_PLACEHOLDER}",
                self.client_url_template
            );
        }

        self.registry()?;
        Ok(())
    }

    /// Override key registry built from `override_keys`
    pub fn registry(&self) -> Result<KeyRegistry> {
        KeyRegistry::from_specs(&self.override_keys).context("Invalid override_keys")
    }

    /// Resolved cache directory
    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.cache_dir {
            return Ok(dir.clone());
        }
        let cache_home = dirs::cache_dir()
            .context("Failed to determine cache directory (XDG_CACHE_HOME or ~/.cache)")?;
        Ok(cache_home.join(CACHE_DIR_NAME))
    }

    /// Recovery file location inside the cache directory
    pub fn recovery_file_path(&self) -> Result<PathBuf> {
        Ok(self.cache_dir()?.join(RECOVERY_FILE_NAME))
    }

    /// Client deep link for a session token
    pub fn client_url(&self, token: &str) -> String {
        client_url(&self.client_url_template, token)
    }
}

/// Embed `token` into a client URL template
pub fn client_url(template: &str, token: &str) -> String {
    template.replace(TOKEN_PLACEHOLDER, token)
}

fn validate_http_url(field: &str, value: &str) -> Result<()> {
    if !value.starts_with("http://") && !value.starts_with("https://") {
        anyhow::bail!("Invalid {field} '{value}': must start with http:// or https://");
    }
    url::Url::parse(value).with_context(|| format!("Invalid {field} '{value}'"))?;
    Ok(())
}

/// Print the effective configuration
pub fn cmd_config_show(explicit: Option<&Path>) -> Result<()> {
    let config = LauncherConfig::load(explicit)?;
    let config_path = match explicit {
        Some(path) => path.to_path_buf(),
        None => LauncherConfig::config_path()?,
    };

    println!();
    println!("{}", "Current configuration:".bold());
    println!("  Login URL:           {}", config.login_url);
    println!("  Client URL Template: {}", config.client_url_template);
    println!("  Redirect Port:       {}", config.redirect_port);
    println!("  Cache Directory:     {}", config.cache_dir()?.display());
    println!("  gsettings Program:   {}", config.gsettings_program.display());
    println!("  Override Keys:");
    for spec in &config.override_keys {
        println!(
            "    {} {} {}",
            spec.namespace,
            spec.name,
            format!("({})", spec.disabled.literal()).dimmed()
        );
    }
    println!();
    if config_path.exists() {
        println!(
            "Config file: {}",
            config_path.display().to_string().dimmed()
        );
    } else {
        println!(
            "Config file: {} {}",
            config_path.display().to_string().dimmed(),
            "(not present, using defaults)".dimmed()
        );
    }
    println!();

    Ok(())
}

/// Print the configuration file path
pub fn cmd_config_path() -> Result<()> {
    println!("{}", LauncherConfig::config_path()?.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use guacview_keybinds::DisabledValue;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = LauncherConfig::default();
        config.validate().unwrap();
        assert_eq!(config.redirect_port, 34567);
        assert_eq!(config.registry().unwrap().len(), 5);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "redirect_port": 40000 }"#).unwrap();

        let config = LauncherConfig::load(Some(&path)).unwrap();
        assert_eq!(config.redirect_port, 40000);
        assert_eq!(config.login_url, DEFAULT_LOGIN_URL);
        assert_eq!(config.override_keys, KeyRegistry::gnome_specs());
    }

    #[test]
    fn test_explicit_malformed_file_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ nope").unwrap();

        let err = LauncherConfig::load(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse config file"));
    }

    #[test]
    fn test_template_without_placeholder_rejected() {
        let config = LauncherConfig {
            client_url_template: "https://example.org/#/client/".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_http_login_url_rejected() {
        let config = LauncherConfig {
            login_url: "file:///etc/passwd".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_override_keys_rejected() {
        let config = LauncherConfig {
            override_keys: Vec::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_custom_override_keys() {
        let config: LauncherConfig = serde_json::from_str(
            r#"{ "override_keys": [
                { "namespace": "org.gnome.mutter", "name": "overlay-key", "disabled": "empty-string" },
                { "namespace": "org.gnome.desktop.wm.keybindings", "name": "panel-run-dialog", "disabled": "empty-list" }
            ] }"#,
        )
        .unwrap();

        let registry = config.registry().unwrap();
        assert_eq!(registry.len(), 2);
        assert!(
            registry
                .entries()
                .any(|(key, disabled)| key.name() == "panel-run-dialog"
                    && disabled == DisabledValue::EmptyList)
        );
    }

    #[test]
    fn test_client_url_embeds_token() {
        let url = client_url(DEFAULT_CLIENT_URL_TEMPLATE, "abc123");
        assert_eq!(
            url,
            "https://desktop-qriscloud.rc.nectar.org.au/#/client/abc123"
        );
    }

    #[test]
    fn test_explicit_cache_dir() {
        let config = LauncherConfig {
            cache_dir: Some(PathBuf::from("/tmp/guac-test")),
            ..Default::default()
        };
        assert_eq!(
            config.recovery_file_path().unwrap(),
            PathBuf::from("/tmp/guac-test/gnome-keybindings.json")
        );
    }
}

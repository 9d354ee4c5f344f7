//! Installer configuration
//!
//! All fields are optional in the TOML file; anything left out falls back
//! to the defaults the installer has always used. Positional arguments on
//! the command line win over both.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config read when `--config` is not given, if it exists
pub const DEFAULT_CONFIG_PATH: &str = "/etc/hostprep/config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProvisionConfig {
    pub app: AppConfig,
    pub runtime: RuntimeConfig,
    pub proxy: ProxyConfig,
    pub process_manager: ProcessManagerConfig,
    pub firewall: FirewallConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Used for the pm2 app, the nginx site file, and the symlink
    pub name: String,
    /// Port the app listens on behind the proxy
    pub port: u16,
    pub start_script: String,
    pub start_args: String,
    /// pm2 `max_memory_restart`
    pub memory_limit: String,
    pub install_dir: String,
    pub domain: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "temp-email".to_string(),
            port: 5000,
            start_script: "npm".to_string(),
            start_args: "start".to_string(),
            memory_limit: "500M".to_string(),
            install_dir: "/var/www/temp-email".to_string(),
            domain: "localhost".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Node.js major version pulled from NodeSource
    pub node_major: u32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self { node_major: 20 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub sites_available: String,
    pub sites_enabled: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            sites_available: "/etc/nginx/sites-available".to_string(),
            sites_enabled: "/etc/nginx/sites-enabled".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProcessManagerConfig {
    /// User pm2's boot hook runs as
    pub startup_user: String,
    /// Home of `startup_user`; resolved from the environment when unset
    pub startup_home: Option<String>,
}

impl Default for ProcessManagerConfig {
    fn default() -> Self {
        Self {
            startup_user: "root".to_string(),
            startup_home: None,
        }
    }
}

impl ProcessManagerConfig {
    pub fn home(&self) -> PathBuf {
        self.startup_home
            .as_deref()
            .map(expand)
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("/root"))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FirewallConfig {
    /// ufw rule for administrative access
    pub admin_rule: String,
    /// ufw application profile registered by nginx
    pub proxy_profile: String,
}

impl Default for FirewallConfig {
    fn default() -> Self {
        Self {
            admin_rule: "ssh".to_string(),
            proxy_profile: "Nginx Full".to_string(),
        }
    }
}

impl ProvisionConfig {
    /// Load from `path`, or from [`DEFAULT_CONFIG_PATH`] if present, or defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_PATH);
                if default.exists() {
                    Self::from_file(default)?
                } else {
                    log::debug!("no config at {DEFAULT_CONFIG_PATH}, using defaults");
                    Self::default()
                }
            }
        };

        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read config file: {}", path.display()))?;
        log::debug!("loaded config from {}", path.display());
        toml::from_str(&content)
            .with_context(|| format!("Invalid TOML in {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        let name = &self.app.name;
        if name.is_empty() {
            bail!("app.name must not be empty");
        }
        if name.contains(|c: char| c.is_whitespace() || c == '/' || c == '\'') {
            bail!("app.name '{name}' may not contain whitespace, quotes or slashes");
        }
        if let Err(e) = check_domain(&self.app.domain) {
            bail!("app.domain '{}' is not a valid nginx server_name: {e}", self.app.domain);
        }
        if self.app.port == 0 {
            bail!("app.port must be between 1 and 65535");
        }
        if self.app.memory_limit.trim().is_empty() {
            bail!("app.memory_limit must not be empty");
        }
        if self.runtime.node_major == 0 {
            bail!("runtime.node_major must be a Node.js major version");
        }
        Ok(())
    }

    pub fn sites_available(&self) -> PathBuf {
        expand(&self.proxy.sites_available)
    }

    pub fn sites_enabled(&self) -> PathBuf {
        expand(&self.proxy.sites_enabled)
    }
}

/// Domains end up verbatim in an nginx `server_name` directive
pub fn check_domain(domain: &str) -> Result<(), String> {
    if domain.is_empty() {
        return Err("domain must not be empty".to_string());
    }
    if let Some(c) = domain
        .chars()
        .find(|c| c.is_whitespace() || matches!(c, ';' | '{' | '}' | '\'' | '"'))
    {
        return Err(format!("domain may not contain {c:?}"));
    }
    Ok(())
}

/// Expand `~` and environment variables in a configured path
pub fn expand(path: &str) -> PathBuf {
    match shellexpand::full(path) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(e) => {
            log::warn!("could not expand '{path}': {e}");
            PathBuf::from(shellexpand::tilde(path).as_ref())
        }
    }
}

//! Generated configuration: `.env`, the nginx site, and the pm2 ecosystem file
//!
//! Rendering is pure; every run regenerates and overwrites all three.

use anyhow::{Context, Result};
use rand::RngCore;
use std::fs;
use std::io::Write;
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};

use crate::config::AppConfig;

pub const ENV_FILE: &str = ".env";
pub const ECOSYSTEM_FILE: &str = "ecosystem.config.js";

/// Bytes of randomness behind `SESSION_SECRET`
pub const SECRET_BYTES: usize = 32;

/// Port nginx listens on
const PROXY_LISTEN_PORT: u16 = 80;

/// Seconds nginx waits on an upstream read, for long-lived connections
const PROXY_READ_TIMEOUT: u32 = 86400;

/// Fresh hex-encoded secret from the thread-local CSPRNG
pub fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub fn render_env(port: u16, secret: &str) -> String {
    format!("NODE_ENV=production\nPORT={port}\nSESSION_SECRET={secret}\n")
}

pub fn render_site(domain: &str, port: u16) -> String {
    format!(
        r#"server {{
    listen {PROXY_LISTEN_PORT};
    server_name {domain};

    location / {{
        proxy_pass http://localhost:{port};
        proxy_http_version 1.1;
        proxy_set_header Upgrade $http_upgrade;
        proxy_set_header Connection 'upgrade';
        proxy_set_header Host $host;
        proxy_set_header X-Real-IP $remote_addr;
        proxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;
        proxy_set_header X-Forwarded-Proto $scheme;
        proxy_cache_bypass $http_upgrade;
        proxy_read_timeout {PROXY_READ_TIMEOUT};
    }}
}}
"#
    )
}

pub fn render_ecosystem(app: &AppConfig, project: &Path) -> String {
    format!(
        r#"module.exports = {{
  apps: [{{
    name: {name},
    script: {script},
    args: {args},
    cwd: {cwd},
    env: {{
      NODE_ENV: 'production',
      PORT: {port}
    }},
    instances: 1,
    autorestart: true,
    watch: false,
    max_memory_restart: {memory}
  }}]
}};
"#,
        name = js_str(&app.name),
        script = js_str(&app.start_script),
        args = js_str(&app.start_args),
        cwd = js_str(&project.to_string_lossy()),
        port = app.port,
        memory = js_str(&app.memory_limit),
    )
}

/// Single-quoted JavaScript string literal
fn js_str(s: &str) -> String {
    format!("'{}'", s.replace('\\', r"\\").replace('\'', r"\'"))
}

/// Write `.env` with a fresh secret, readable only by its owner
pub fn write_env(project: &Path, port: u16) -> Result<PathBuf> {
    let path = project.join(ENV_FILE);
    // `mode` only applies on create; tighten a leftover file before writing
    if path.exists() {
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600))
            .with_context(|| format!("Failed to restrict permissions on {}", path.display()))?;
    }
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(&path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    file.write_all(render_env(port, &generate_secret()).as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

pub fn write_ecosystem(project: &Path, app: &AppConfig) -> Result<PathBuf> {
    let path = project.join(ECOSYSTEM_FILE);
    write(&path, &render_ecosystem(app, project))?;
    Ok(path)
}

/// Overwrite `path` with `contents`
pub fn write(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}

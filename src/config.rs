use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::client::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use crate::util::strip_quotes;

#[derive(Debug, Default, PartialEq)]
struct RcConfig {
    url: Option<String>,
    key: Option<String>,
    timeout: Option<Duration>,
}

/// Resolves the client configuration, in order of precedence:
/// explicit arguments, `DATAGOUV_URL` / `DATAGOUV_API_KEY`, then the first
/// rc file found. The URL falls back to the public API; the key is required.
/// When url and key are both known up front no rc file is read, so its
/// `timeout` does not apply either.
pub(crate) fn load_config(url: Option<String>, key: Option<String>) -> Result<ClientConfig> {
    let mut url = url.or_else(|| non_empty_env("DATAGOUV_URL"));
    let mut key = key.or_else(|| non_empty_env("DATAGOUV_API_KEY"));
    let mut timeout = None;

    // The rc file is only consulted while url or key is still unresolved.
    let rc_candidates = if url.is_none() || key.is_none() {
        rc_candidates()
    } else {
        Vec::new()
    };
    for rc_path in &rc_candidates {
        if rc_path.exists() {
            let cfg = read_rc(rc_path).with_context(|| {
                format!("failed to read configuration file {}", rc_path.display())
            })?;

            if url.is_none() {
                url = cfg.url;
            }
            if key.is_none() {
                key = cfg.key;
            }
            timeout = cfg.timeout;
            break;
        }
    }

    let key = match key {
        Some(v) => v,
        None => {
            if !rc_candidates.is_empty() {
                bail!(
                    "Missing configuration: key (set DATAGOUV_API_KEY or put `key:` in one of: {})",
                    rc_candidates
                        .iter()
                        .map(|p| p.display().to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }
            bail!("Missing configuration: key (set DATAGOUV_API_KEY or create .datagouvrc)");
        }
    };

    Ok(ClientConfig {
        url: url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        key,
        timeout: timeout.unwrap_or(DEFAULT_TIMEOUT),
    })
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn read_rc(path: &Path) -> Result<RcConfig> {
    let text = std::fs::read_to_string(path)?;
    parse_rc(&text)
}

fn parse_rc(text: &str) -> Result<RcConfig> {
    let mut cfg = RcConfig::default();

    // `key:` may sit alone on a line with the token on the next one.
    let mut pending_key: Option<&str> = None;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(pk) = pending_key.take() {
            if !line.contains(':') || (pk == "url" && line.contains("://")) {
                set_field(&mut cfg, pk, strip_quotes(line))?;
                continue;
            }
        }

        if let Some((k, v)) = line.split_once(':') {
            let k = k.trim();
            let v = strip_quotes(v.trim());
            if v.is_empty() {
                pending_key = Some(k);
            } else {
                set_field(&mut cfg, k, v)?;
            }
        }
    }

    Ok(cfg)
}

fn set_field(cfg: &mut RcConfig, key: &str, value: &str) -> Result<()> {
    match key {
        "url" => cfg.url = Some(value.to_string()),
        "key" => cfg.key = Some(value.to_string()),
        "timeout" => {
            let secs: f64 = value
                .parse()
                .with_context(|| format!("invalid timeout `{}` (expected seconds)", value))?;
            if !secs.is_finite() || secs <= 0.0 {
                bail!("invalid timeout `{}` (expected a positive number of seconds)", value);
            }
            cfg.timeout = Some(Duration::from_secs_f64(secs));
        }
        _ => {}
    }
    Ok(())
}

fn rc_candidates() -> Vec<PathBuf> {
    // 1) DATAGOUV_RC (explicit)
    // 2) ./.datagouvrc
    // 3) ~/.datagouvrc
    if let Some(p) = non_empty_env("DATAGOUV_RC") {
        return vec![PathBuf::from(p)];
    }

    let mut v = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        v.push(cwd.join(".datagouvrc"));
    }
    if let Some(home) = dirs::home_dir() {
        v.push(home.join(".datagouvrc"));
    }
    v
}

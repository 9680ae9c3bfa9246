use crate::utils::error::{AppError, Result};
use std::path::{Component, Path, PathBuf};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_database_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(AppError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "sqlite" => Ok(()),
            scheme => Err(AppError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: redact_credentials(&url),
                reason: format!("Unsupported database scheme: {}", scheme),
            }),
        },
        Err(e) => Err(AppError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: "<unparseable>".to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

/// Strips the password from a URL before it is echoed back in an error.
fn redact_credentials(url: &Url) -> String {
    let mut url = url.clone();
    if url.password().is_some() {
        let _ = url.set_password(Some("***"));
    }
    url.to_string()
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(AppError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(AppError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

/// A file name resolved under a base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    pub path: PathBuf,
    /// `/`-joined normal components, so `r.csv`, `./r.csv` and `sub//r.csv`
    /// style spellings of one file share a key.
    pub key: String,
}

/// Joins `name` onto `base`, refusing anything that could land outside `base`.
pub fn resolve_within(base: &Path, name: &str) -> Result<ResolvedPath> {
    let invalid = |reason: &str| AppError::InvalidPath {
        path: name.to_string(),
        reason: reason.to_string(),
    };

    if name.trim().is_empty() {
        return Err(invalid("file name cannot be empty"));
    }
    if name.contains('\0') {
        return Err(invalid("file name contains null bytes"));
    }

    let mut parts = Vec::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(invalid("parent directory references are not allowed"))
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(invalid("absolute paths are not allowed"))
            }
        }
    }

    if parts.is_empty() {
        return Err(invalid("file name cannot be empty"));
    }

    let path = parts.iter().fold(base.to_path_buf(), |path, part| path.join(part));
    Ok(ResolvedPath {
        path,
        key: parts.join("/"),
    })
}

/// Accepts `host:port` where host is a name or an IP (IPv6 in brackets).
pub fn validate_host_port(field_name: &str, value: &str) -> Result<()> {
    let invalid = |reason: &str| AppError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    };

    let (host, port) = value
        .rsplit_once(':')
        .ok_or_else(|| invalid("expected host:port, e.g. 127.0.0.1:8080"))?;

    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    if host.is_empty() || host.chars().any(char::is_whitespace) {
        return Err(invalid("host cannot be empty or contain whitespace"));
    }
    if host.contains(':') && host.parse::<std::net::Ipv6Addr>().is_err() {
        return Err(invalid("IPv6 hosts must be written in brackets, e.g. [::1]:8080"));
    }
    if port.parse::<u16>().is_err() {
        return Err(invalid("port must be a number between 0 and 65535"));
    }
    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(AppError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!(
            "{} cannot be empty or whitespace-only",
            field_name
        )));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<()> {
    let trimmed = email.trim();
    let valid = match trimmed.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !trimmed.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(AppError::InvalidEmail(email.to_string()))
    }
}

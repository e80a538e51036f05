//! API token resolution.
//!
//! A token is taken from the first source that has one: an explicit value,
//! then a token file (`./auth.txt`), then the `DW_AUTH_TOKEN` environment
//! variable. Blank values count as absent.

use std::path::Path;

use crate::ClientError;

/// Default token file, relative to the working directory.
pub const TOKEN_FILE: &str = "auth.txt";

/// Environment variable holding the token.
pub const TOKEN_ENV: &str = "DW_AUTH_TOKEN";

/// Resolves the token from the explicit value, `token_file`, and the
/// process environment.
///
/// # Errors
///
/// * [`ClientError::Io`] if `token_file` exists but cannot be read
/// * [`ClientError::MissingToken`] if no source has a token
pub fn resolve_token(explicit: Option<&str>, token_file: &Path) -> Result<String, ClientError> {
    resolve_token_from(explicit, token_file, std::env::var(TOKEN_ENV).ok())
}

/// Resolves the token from the given sources, in order.
///
/// # Errors
///
/// * [`ClientError::Io`] if `token_file` exists but cannot be read
/// * [`ClientError::MissingToken`] if no source has a token
pub fn resolve_token_from(
    explicit: Option<&str>,
    token_file: &Path,
    env_value: Option<String>,
) -> Result<String, ClientError> {
    if let Some(token) = non_blank(explicit) {
        log::debug!("Using explicit API token");
        return Ok(token);
    }

    if token_file.is_file() {
        let contents = std::fs::read_to_string(token_file)?;
        if let Some(token) = non_blank(Some(&contents)) {
            log::debug!("Using API token from {}", token_file.display());
            return Ok(token);
        }
    }

    if let Some(token) = non_blank(env_value.as_deref()) {
        log::debug!("Using API token from {TOKEN_ENV}");
        return Ok(token);
    }

    Err(ClientError::MissingToken)
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_file(name: &str, contents: Option<&str>) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("dw_graphics_auth_{name}.txt"));
        let _ = std::fs::remove_file(&path);
        if let Some(contents) = contents {
            std::fs::write(&path, contents).unwrap();
        }
        path
    }

    #[test]
    fn explicit_token_wins() {
        let path = token_file("explicit", Some("from-file"));
        let token =
            resolve_token_from(Some("explicit"), &path, Some("from-env".to_string())).unwrap();
        assert_eq!(token, "explicit");
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn file_beats_environment() {
        let path = token_file("file", Some("  from-file\n"));
        let token = resolve_token_from(None, &path, Some("from-env".to_string())).unwrap();
        assert_eq!(token, "from-file");
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn falls_back_to_environment() {
        let path = token_file("env", None);
        let token = resolve_token_from(Some("  "), &path, Some("from-env".to_string())).unwrap();
        assert_eq!(token, "from-env");

        let blank = token_file("blank", Some("\n"));
        let token = resolve_token_from(None, &blank, Some("from-env".to_string())).unwrap();
        assert_eq!(token, "from-env");
        std::fs::remove_file(&blank).unwrap();
    }

    #[test]
    fn no_source_is_missing_token() {
        let path = token_file("missing", None);
        assert!(matches!(
            resolve_token_from(None, &path, None),
            Err(ClientError::MissingToken)
        ));
    }
}

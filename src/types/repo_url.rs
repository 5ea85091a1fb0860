// ABOUTME: HTTP(S) repository URL validation.
// ABOUTME: Derives the working-copy directory name and the token-authenticated clone URL.

use std::fmt;
use thiserror::Error;

use super::AccessToken;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepoUrlError {
    #[error("repository URL cannot be empty")]
    Empty,

    #[error("repository URL must start with http:// or https://: {0}")]
    UnsupportedScheme(String),

    #[error("repository URL has no host: {0}")]
    MissingHost(String),

    #[error("cannot derive a directory name from repository URL: {0}")]
    NoBaseName(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoUrl {
    raw: String,
    scheme: &'static str,
    // Everything after "scheme://" with any user-info removed.
    rest: String,
    base_name: String,
}

impl RepoUrl {
    pub fn parse(value: &str) -> Result<Self, RepoUrlError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(RepoUrlError::Empty);
        }

        let (scheme, after) = if let Some(rest) = value.strip_prefix("https://") {
            ("https", rest)
        } else if let Some(rest) = value.strip_prefix("http://") {
            ("http", rest)
        } else {
            return Err(RepoUrlError::UnsupportedScheme(value.to_string()));
        };

        // Drop existing user-info; the token replaces it.
        let authority_end = after.find('/').unwrap_or(after.len());
        let rest = match after[..authority_end].rfind('@') {
            Some(at) => &after[at + 1..],
            None => after,
        };

        let host_end = rest.find('/').unwrap_or(rest.len());
        if rest[..host_end].is_empty() {
            return Err(RepoUrlError::MissingHost(value.to_string()));
        }

        let base_name = rest[host_end..]
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .map(|segment| segment.strip_suffix(".git").unwrap_or(segment))
            .unwrap_or("");
        if base_name.is_empty() || base_name == "." || base_name == ".." {
            return Err(RepoUrlError::NoBaseName(value.to_string()));
        }

        Ok(Self {
            raw: value.to_string(),
            scheme,
            rest: rest.to_string(),
            base_name: base_name.to_string(),
        })
    }

    /// Repository base name without `.git`; names the local working copy.
    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// Clone URL with the token as user-info.
    pub fn authenticated(&self, token: &AccessToken) -> String {
        format!(
            "{}://{}@{}",
            self.scheme,
            urlencoding::encode(token.expose()),
            self.rest
        )
    }
}

impl fmt::Display for RepoUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_name_strips_git_suffix() {
        let url = RepoUrl::parse("https://example.com/demo.git").unwrap();
        assert_eq!(url.base_name(), "demo");
    }

    #[test]
    fn base_name_ignores_trailing_slash() {
        let url = RepoUrl::parse("https://github.com/org/web-app/").unwrap();
        assert_eq!(url.base_name(), "web-app");
    }

    #[test]
    fn authenticated_embeds_token() {
        let url = RepoUrl::parse("https://example.com/demo.git").unwrap();
        let token = AccessToken::new("abc123");
        assert_eq!(
            url.authenticated(&token),
            "https://abc123@example.com/demo.git"
        );
    }

    #[test]
    fn authenticated_replaces_existing_userinfo_and_encodes() {
        let url = RepoUrl::parse("https://olduser@example.com/org/demo.git").unwrap();
        let token = AccessToken::new("p@ss/word");
        assert_eq!(
            url.authenticated(&token),
            "https://p%40ss%2Fword@example.com/org/demo.git"
        );
    }

    #[test]
    fn rejects_ssh_scheme() {
        assert!(matches!(
            RepoUrl::parse("git@github.com:org/demo.git"),
            Err(RepoUrlError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn rejects_empty_and_hostless() {
        assert_eq!(RepoUrl::parse("  "), Err(RepoUrlError::Empty));
        assert!(matches!(
            RepoUrl::parse("https:///demo.git"),
            Err(RepoUrlError::MissingHost(_))
        ));
        assert!(matches!(
            RepoUrl::parse("https://example.com"),
            Err(RepoUrlError::NoBaseName(_))
        ));
    }
}

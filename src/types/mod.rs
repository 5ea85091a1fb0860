// ABOUTME: Validated domain types for deployment requests.
// ABOUTME: Repository URLs with derived working-copy names and redacting secrets.

mod access_token;
mod repo_url;

pub use access_token::AccessToken;
pub use repo_url::{RepoUrl, RepoUrlError};

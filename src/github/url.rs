use crate::error::{Error, Result};

/// Extracts `(owner, repo)` from a GitHub repository URL.
///
/// Accepted forms:
/// - `https://github.com/owner/repo` (optional trailing `/` or `.git`)
/// - `http://github.com/owner/repo`
/// - `git@github.com:owner/repo`
pub fn parse_repo_url(url: &str) -> Result<(String, String)> {
    let trimmed = url.trim().trim_end_matches('/');

    let rest = if let Some(rest) = trimmed.strip_prefix("https://github.com/") {
        rest
    } else if let Some(rest) = trimmed.strip_prefix("http://github.com/") {
        rest
    } else if let Some(rest) = trimmed.strip_prefix("git@github.com:") {
        rest
    } else {
        return Err(Error::InvalidUrl(url.to_string()));
    };

    let rest = rest.strip_suffix(".git").unwrap_or(rest);

    let mut segments = rest.split('/');
    let owner = segments.next().unwrap_or_default();
    let repo = segments.next().unwrap_or_default();

    if owner.is_empty() || repo.is_empty() || segments.next().is_some() {
        return Err(Error::InvalidUrl(url.to_string()));
    }
    if !is_valid_segment(owner) || !is_valid_segment(repo) {
        return Err(Error::InvalidUrl(url.to_string()));
    }

    Ok((owner.to_string(), repo.to_string()))
}

fn is_valid_segment(s: &str) -> bool {
    s.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_https_url() {
        let (owner, repo) = parse_repo_url("https://github.com/octocat/Hello-World").unwrap();
        assert_eq!(owner, "octocat");
        assert_eq!(repo, "Hello-World");
    }

    #[test]
    fn parses_trailing_slash_and_git_suffix() {
        let (owner, repo) = parse_repo_url("https://github.com/octocat/Hello-World.git/").unwrap();
        assert_eq!(owner, "octocat");
        assert_eq!(repo, "Hello-World");
    }

    #[test]
    fn parses_ssh_url() {
        let (owner, repo) = parse_repo_url("git@github.com:rust-lang/rust.git").unwrap();
        assert_eq!(owner, "rust-lang");
        assert_eq!(repo, "rust");
    }

    #[test]
    fn rejects_non_github_host() {
        assert!(parse_repo_url("https://gitlab.com/owner/repo").is_err());
    }

    #[test]
    fn rejects_missing_repo_segment() {
        assert!(parse_repo_url("https://github.com/octocat").is_err());
        assert!(parse_repo_url("https://github.com/octocat/").is_err());
    }

    #[test]
    fn rejects_extra_path_segments() {
        assert!(parse_repo_url("https://github.com/octocat/Hello-World/tree/main").is_err());
    }

    #[test]
    fn rejects_invalid_characters() {
        assert!(parse_repo_url("https://github.com/octo cat/repo").is_err());
    }
}

// Project Directories
// Maps a git remote onto the checkout directory under the base directory

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0} is not a valid project remote. Use git@gitlab.com:example/firecow.git syntax")]
pub struct RemoteError(pub String);

fn scp_like() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[\w.-]+@[\w.-]+:(?P<path>[\w./-]+?)(?:\.git)?/?$").expect("valid regex")
    })
}

fn url_like() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?:ssh|https?|git)://(?:[\w.-]+@)?[\w.-]+(?::\d+)?/(?P<path>[\w./-]+?)(?:\.git)?/?$",
        )
        .expect("valid regex")
    })
}

/// Directory a project with `remote` is checked out to.
///
/// `git@gitlab.com:firecow/example.git` under `/work` becomes
/// `/work/firecow-example`. Nested groups are joined with `-` as well.
pub fn project_dir_from_remote(base_dir: &Path, remote: &str) -> Result<PathBuf, RemoteError> {
    let remote = remote.trim();
    let captures = scp_like()
        .captures(remote)
        .or_else(|| url_like().captures(remote))
        .ok_or_else(|| RemoteError(remote.to_string()))?;

    let segments: Vec<&str> = captures["path"]
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    if segments.len() < 2 {
        return Err(RemoteError(remote.to_string()));
    }

    Ok(base_dir.join(segments.join("-")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "/home/user/git-local-devops";

    #[test]
    fn test_ssh_remote() {
        let dir = project_dir_from_remote(Path::new(BASE), "git@gitlab.com:firecow/example.git")
            .unwrap();
        assert_eq!(dir, PathBuf::from(format!("{}/firecow-example", BASE)));
    }

    #[test]
    fn test_base_dir_with_trailing_slash() {
        let dir = project_dir_from_remote(
            Path::new(&format!("{}/", BASE)),
            "git@gitlab.com:firecow/example.git",
        )
        .unwrap();
        assert_eq!(dir, PathBuf::from(format!("{}/firecow-example", BASE)));
    }

    #[test]
    fn test_url_remotes_and_nested_groups() {
        let base = Path::new(BASE);
        assert_eq!(
            project_dir_from_remote(base, "https://github.com/firecow/example.git").unwrap(),
            base.join("firecow-example")
        );
        assert_eq!(
            project_dir_from_remote(base, "ssh://git@gitlab.com:2222/org/team/service").unwrap(),
            base.join("org-team-service")
        );
    }

    #[test]
    fn test_invalid_remote() {
        let err = project_dir_from_remote(
            Path::new(BASE),
            "git@gitlab.coinvalidirecow/example.git",
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "git@gitlab.coinvalidirecow/example.git is not a valid project remote. Use git@gitlab.com:example/firecow.git syntax"
        );
    }

    #[test]
    fn test_single_segment_path_is_invalid() {
        assert!(project_dir_from_remote(Path::new(BASE), "git@gitlab.com:example.git").is_err());
    }
}

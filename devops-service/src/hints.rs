// Output Hints
// Matches configured patterns against captured action output

use crate::config::SearchFor;
use crate::execution::ActionOutput;
use crate::planner::GroupKey;

use regex::Regex;
use tracing::warn;

/// A configured hint whose pattern matched some action's output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HintMatch {
    pub hint: String,
    /// Action whose stdout or stderr matched
    pub source: GroupKey,
}

/// Search stdout and stderr of every output for every pattern. Matches are
/// returned in pattern order, then output order. Patterns that don't
/// compile are skipped.
pub fn search_output_for_hints(search_for: &[SearchFor], outputs: &[ActionOutput]) -> Vec<HintMatch> {
    let mut matches = Vec::new();

    for search in search_for {
        let regex = match Regex::new(&search.regex) {
            Ok(regex) => regex,
            Err(e) => {
                warn!(regex = %search.regex, error = %e, "ignoring invalid searchFor pattern");
                continue;
            }
        };

        for output in outputs {
            if regex.is_match(&output.stdout) || regex.is_match(&output.stderr) {
                matches.push(HintMatch {
                    hint: search.hint.clone(),
                    source: output.key.clone(),
                });
            }
        }
    }

    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::ActionStatus;

    use std::path::PathBuf;
    use std::time::Duration;

    fn output(project: &str, stdout: &str, stderr: &str) -> ActionOutput {
        ActionOutput {
            key: GroupKey::new(project, "start", "web"),
            cmd: vec!["docker-compose".to_string(), "up".to_string()],
            dir: PathBuf::from("/work"),
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            status: ActionStatus::Succeeded,
            duration: Duration::ZERO,
        }
    }

    fn search(regex: &str, hint: &str) -> SearchFor {
        SearchFor {
            regex: regex.to_string(),
            hint: hint.to_string(),
        }
    }

    #[test]
    fn test_matches_stdout_and_stderr() {
        let outputs = vec![
            output("a", "Service 'web' failed to build", ""),
            output("b", "", "port is already allocated"),
            output("c", "all good", ""),
        ];
        let patterns = vec![
            search("failed to build", "Run docker system prune"),
            search(r"port .* allocated", "Stop the other stack"),
        ];

        let matches = search_output_for_hints(&patterns, &outputs);

        assert_eq!(
            matches,
            vec![
                HintMatch {
                    hint: "Run docker system prune".to_string(),
                    source: GroupKey::new("a", "start", "web"),
                },
                HintMatch {
                    hint: "Stop the other stack".to_string(),
                    source: GroupKey::new("b", "start", "web"),
                },
            ]
        );
    }

    #[test]
    fn test_invalid_pattern_is_skipped() {
        let outputs = vec![output("a", "WARN deprecated", "")];
        let patterns = vec![search("(unclosed", "never"), search("WARN", "Check the logs")];

        let matches = search_output_for_hints(&patterns, &outputs);

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].hint, "Check the logs");
    }

    #[test]
    fn test_no_patterns_no_matches() {
        assert!(search_output_for_hints(&[], &[output("a", "x", "y")]).is_empty());
    }
}

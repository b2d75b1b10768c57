use std::io;

use thiserror::Error;

use super::commands::GitCli;

/// Why `git diff` did not produce a patch.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Not a git repository")]
    NotARepository,

    /// git ran and failed; `stderr` is its own diagnostic, passed through untouched.
    #[error("git diff failed with exit code {code:?}")]
    ToolFailure { code: Option<i32>, stderr: String },

    #[error("failed to run git: {0}")]
    Spawn(#[from] io::Error),
}

impl CaptureError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            CaptureError::NotARepository | CaptureError::Spawn(_) => 1,
            CaptureError::ToolFailure { code, .. } => code
                .and_then(|c| u8::try_from(c).ok())
                .filter(|&c| c != 0)
                .unwrap_or(1),
        }
    }
}

/// Classify a failed git invocation by its diagnostic text.
pub fn classify_failure(code: Option<i32>, stderr: &[u8]) -> CaptureError {
    let stderr = String::from_utf8_lossy(stderr).into_owned();
    if stderr.to_ascii_lowercase().contains("not a git repository") {
        CaptureError::NotARepository
    } else {
        CaptureError::ToolFailure { code, stderr }
    }
}

/// Run `git diff <args>` and return its stdout verbatim.
///
/// `args` are forwarded untouched (revision ranges, `--staged`, `-- paths`)
/// after `--no-color`, so a `color.diff = always` setting can't leak escape
/// codes into the patch. An empty result is not an error. Dropping the
/// future kills git.
pub async fn capture(git: &GitCli, args: &[String]) -> Result<String, CaptureError> {
    tracing::debug!(?args, "capturing git diff");
    let output = git
        .command()
        .args(["diff", "--no-color"])
        .args(args)
        .output()
        .await?;

    if !output.status.success() {
        let err = classify_failure(output.status.code(), &output.stderr);
        tracing::debug!(error = %err, "git diff failed");
        return Err(err);
    }

    let patch = match String::from_utf8(output.stdout) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("git diff output is not valid UTF-8, replacing invalid bytes");
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    };
    tracing::debug!(bytes = patch.len(), "captured diff");
    Ok(patch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_not_a_repository() {
        let err = classify_failure(
            Some(129),
            b"warning: Not a git repository. Use --no-index to compare two paths outside a working tree\n",
        );
        assert!(matches!(err, CaptureError::NotARepository));
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.to_string(), "Not a git repository");

        let err = classify_failure(
            Some(128),
            b"fatal: not a git repository (or any of the parent directories): .git\n",
        );
        assert!(matches!(err, CaptureError::NotARepository));
    }

    #[test]
    fn test_classify_other_failure_keeps_diagnostic() {
        let err = classify_failure(Some(128), b"fatal: bad revision 'nope'\n");
        match err {
            CaptureError::ToolFailure { code, ref stderr } => {
                assert_eq!(code, Some(128));
                assert_eq!(stderr, "fatal: bad revision 'nope'\n");
            }
            ref other => panic!("unexpected {other:?}"),
        }
        assert_eq!(err.exit_code(), 128);
    }

    #[test]
    fn test_exit_code_without_status() {
        let err = CaptureError::ToolFailure {
            code: None,
            stderr: String::new(),
        };
        assert_eq!(err.exit_code(), 1);
    }

    /// A stand-in for git that runs `script` with git's arguments as `$@`.
    #[cfg(unix)]
    fn fake_git(script: &str) -> GitCli {
        GitCli::new()
            .with_program("sh")
            .with_leading_args(["-c", script, "git"])
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_capture_is_byte_exact() {
        let git = fake_git(r"printf 'diff --git a/x.txt b/x.txt\r\n+one\n-two\n'");

        let patch = capture(&git, &[]).await.unwrap();
        assert_eq!(patch, "diff --git a/x.txt b/x.txt\r\n+one\n-two\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_capture_forwards_args() {
        let git = fake_git(r#"printf '%s|' "$@""#);

        let args = vec![
            "--staged".to_string(),
            "HEAD~1..HEAD".to_string(),
            "--".to_string(),
            "src/a b.rs".to_string(),
        ];
        let patch = capture(&git, &args).await.unwrap();
        assert_eq!(patch, "diff|--no-color|--staged|HEAD~1..HEAD|--|src/a b.rs|");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_capture_empty_is_ok() {
        let git = fake_git("exit 0");

        assert_eq!(capture(&git, &[]).await.unwrap(), "");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_capture_not_a_repository() {
        let git = fake_git(
            "echo 'fatal: not a git repository (or any of the parent directories): .git' >&2; exit 128",
        );

        let err = capture(&git, &[]).await.unwrap_err();
        assert!(matches!(err, CaptureError::NotARepository));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_capture_propagates_tool_failure() {
        let git = fake_git("echo 'fatal: ambiguous argument' >&2; exit 3");

        let err = capture(&git, &["nope".to_string()]).await.unwrap_err();
        assert_eq!(err.exit_code(), 3);
        match err {
            CaptureError::ToolFailure { stderr, .. } => {
                assert_eq!(stderr, "fatal: ambiguous argument\n")
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_capture_missing_program() {
        let git = GitCli::new().with_program("webdiff-no-such-git");
        let err = capture(&git, &[]).await.unwrap_err();
        assert!(matches!(err, CaptureError::Spawn(_)));
    }
}

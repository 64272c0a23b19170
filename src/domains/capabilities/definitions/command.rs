//! Helpers for capabilities that delegate to an external converter.

use bytes::Bytes;
use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, instrument};

use crate::domains::capabilities::CapabilityError;

/// qpdf, used by the PDF tools.
pub const QPDF: &str = "qpdf";

/// ImageMagick 7 entry point, used by the image tools.
pub const MAGICK: &str = "magick";

/// Locate an executable on `PATH`.
pub fn program_on_path(program: &str) -> Option<PathBuf> {
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file() || path.with_extension("exe").is_file()
}

/// Probe shared by every adapter.
pub fn require(program: &str) -> Result<(), CapabilityError> {
    match program_on_path(program) {
        Some(_) => Ok(()),
        None => Err(CapabilityError::unavailable(format!(
            "'{}' not found on PATH",
            program
        ))),
    }
}

/// Run a converter to completion.
///
/// A non-zero exit becomes [`CapabilityError::Failed`] carrying `failure` as
/// the client-facing message and the converter's stderr as detail.
#[instrument(skip(args, failure))]
pub async fn run<I, S>(program: &str, args: I, failure: &str) -> Result<(), CapabilityError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let output = Command::new(program)
        .args(args)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| CapabilityError::failed(failure, e))?;

    // qpdf exits with 3 when it succeeded with warnings.
    let succeeded = output.status.success() || (program == QPDF && output.status.code() == Some(3));
    if !succeeded {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CapabilityError::failed(
            failure,
            format!("{} exited with {}: {}", program, output.status, stderr.trim()),
        ));
    }

    debug!("{} finished", program);
    Ok(())
}

/// Read a converter's output file.
pub async fn read_output(path: &Path, failure: &str) -> Result<Bytes, CapabilityError> {
    tokio::fs::read(path)
        .await
        .map(Bytes::from)
        .map_err(|e| CapabilityError::failed(failure, format!("{}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_program_is_unavailable() {
        assert!(program_on_path("definitely-not-a-real-converter").is_none());
        assert!(matches!(
            require("definitely-not-a-real-converter"),
            Err(CapabilityError::Unavailable(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_reports_failure_with_message() {
        let err = run("sh", ["-c", "echo boom >&2; exit 2"], "Failed to do it")
            .await
            .unwrap_err();
        match err {
            CapabilityError::Failed { message, detail } => {
                assert_eq!(message, "Failed to do it");
                assert!(detail.contains("boom"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_success() {
        assert!(run("sh", ["-c", "exit 0"], "unused").await.is_ok());
    }

    #[tokio::test]
    async fn test_read_output_missing_file() {
        let err = read_output(Path::new("/nonexistent/out.pdf"), "Failed to read")
            .await
            .unwrap_err();
        assert!(matches!(err, CapabilityError::Failed { .. }));
    }
}

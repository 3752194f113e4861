use crate::error::ExportError;
use log::debug;
use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Program name looked up on PATH when nothing else is configured.
pub const DEFAULT_EXECUTABLE: &str = "rawji";

/// Resolve the converter. A value containing a path separator must point at
/// an existing executable file; a bare name is searched on PATH.
pub fn locate_executable(configured: &str) -> Result<PathBuf, ExportError> {
    let configured = configured.trim();
    let name = if configured.is_empty() {
        DEFAULT_EXECUTABLE
    } else {
        configured
    };

    let candidate = Path::new(name);
    if candidate.components().count() > 1 || candidate.is_absolute() {
        return if is_executable(candidate) {
            Ok(candidate.to_path_buf())
        } else {
            Err(ExportError::InvalidExecutable(candidate.to_path_buf()))
        };
    }

    let path_var = env::var_os("PATH").unwrap_or_default();
    find_in_path(name, &path_var).ok_or_else(|| ExportError::ExecutableNotFound(name.to_string()))
}

/// Search every directory of a PATH-style list for `name`.
pub fn find_in_path(name: &str, path_var: &OsStr) -> Option<PathBuf> {
    for dir in env::split_paths(path_var) {
        for file_name in candidate_names(name) {
            let candidate = dir.join(&file_name);
            if is_executable(&candidate) {
                debug!("Found {} at {}", name, candidate.display());
                return Some(candidate);
            }
        }
    }
    None
}

/// A regular file that may be run. On Unix at least one execute bit must be
/// set, so a stray non-executable file earlier on PATH does not hide the real
/// converter.
#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

fn candidate_names(name: &str) -> Vec<String> {
    if cfg!(windows) && Path::new(name).extension().is_none() {
        vec![format!("{}.exe", name), name.to_string()]
    } else {
        vec![name.to_string()]
    }
}

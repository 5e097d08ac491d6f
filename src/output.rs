/// Atomic output files: write to a staging file next to the target, then
/// rename over it so readers never see a partial report or chart.
use std::path::{Path, PathBuf};

/// Sibling path used while `target` is being produced.
///
/// The original file name is kept as the suffix so that writers which pick a
/// format from the extension (the PNG encoder does) still see it.
pub fn staging_path(target: &Path) -> PathBuf {
    let dir = target.parent().unwrap_or(Path::new("."));
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    dir.join(format!(".tmp.{}.{name}", std::process::id()))
}

/// Move a finished staging file into place.
pub fn commit(staged: &Path, target: &Path) -> Result<(), OutputError> {
    std::fs::rename(staged, target).map_err(|e| {
        let _ = std::fs::remove_file(staged);
        OutputError::Rename {
            from: staged.to_path_buf(),
            to: target.to_path_buf(),
            source: e,
        }
    })
}

/// Atomically replace `target` with `contents`.
pub fn write_atomic(target: &Path, contents: &[u8]) -> Result<(), OutputError> {
    ensure_parent(target)?;
    let staged = staging_path(target);
    std::fs::write(&staged, contents).map_err(|e| OutputError::Write {
        path: staged.clone(),
        source: e,
    })?;
    commit(&staged, target)?;
    tracing::debug!(path = %target.display(), bytes = contents.len(), "wrote output");
    Ok(())
}

/// Create the directory that will hold `target` if it does not exist yet.
pub fn ensure_parent(target: &Path) -> Result<(), OutputError> {
    match target.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            std::fs::create_dir_all(dir).map_err(|e| OutputError::Write {
                path: dir.to_path_buf(),
                source: e,
            })
        }
        _ => Ok(()),
    }
}

#[derive(Debug)]
pub enum OutputError {
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    Rename {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for OutputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputError::Write { path, source } => {
                write!(f, "failed to write {}: {source}", path.display())
            }
            OutputError::Rename { from, to, source } => {
                write!(
                    f,
                    "failed to rename {} -> {}: {source}",
                    from.display(),
                    to.display()
                )
            }
        }
    }
}

impl std::error::Error for OutputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OutputError::Write { source, .. } => Some(source),
            OutputError::Rename { source, .. } => Some(source),
        }
    }
}

//! Filesystem utilities.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Copy a source tree, skipping paths matched by ignore patterns.
///
/// Patterns are matched against the path relative to `src`, glob-style.
/// A bare name (no slash, no wildcard) matches that name at any depth,
/// mirroring how ignore files are usually written.
pub fn copy_dir_filtered(src: &Path, dst: &Path, ignore: &[String]) -> Result<()> {
    let patterns: Vec<glob::Pattern> = ignore
        .iter()
        .map(|p| {
            let p = p.trim().trim_end_matches('/');
            let expanded = if p.contains('/') || p.contains('*') {
                p.to_string()
            } else {
                format!("**/{p}")
            };
            glob::Pattern::new(&expanded)
                .with_context(|| format!("invalid ignore pattern: {p}"))
        })
        .collect::<Result<_>>()?;

    ensure_dir(dst)?;

    let mut walker = WalkDir::new(src).into_iter();
    while let Some(entry) = walker.next() {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .expect("walkdir yields paths under its root");
        if rel.as_os_str().is_empty() {
            continue;
        }

        let rel_str = rel.to_string_lossy();
        let ignored = patterns
            .iter()
            .any(|p| p.matches(&rel_str) || p.matches(&format!("**/{rel_str}")));
        if ignored {
            if entry.file_type().is_dir() {
                walker.skip_current_dir();
            }
            continue;
        }

        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            ensure_dir(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                ensure_dir(parent)?;
            }
            fs::copy(entry.path(), &target).with_context(|| {
                format!(
                    "failed to copy {} to {}",
                    entry.path().display(),
                    target.display()
                )
            })?;
        }
    }
    Ok(())
}

/// Read ignore patterns from a file: one per line, `#` comments and blank
/// lines skipped.
pub fn read_ignore_file(path: &Path) -> Result<Vec<String>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read ignore file: {}", path.display()))?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// Mark a file as executable (no-op off unix).
pub fn make_executable(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(path)
            .with_context(|| format!("failed to stat: {}", path.display()))?
            .permissions();
        perms.set_mode(perms.mode() | 0o755);
        fs::set_permissions(path, perms)
            .with_context(|| format!("failed to chmod: {}", path.display()))?;
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
    Ok(())
}

/// Canonicalize a path, falling back to the input if it does not exist yet.
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Make a path absolute against the current directory. Unlike
/// [`normalize_path`] this never touches the filesystem, so it works for
/// paths that do not exist yet.
pub fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

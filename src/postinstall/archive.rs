//! Release archive writers.
//!
//! The release bundle ships as both a gzip-compressed tarball and a zip
//! archive, each containing the binary plus the generated `man/` and
//! `completions/` trees, left alongside the binary in the install dir.
//! A checksum file covering both archives is written next to them.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use sha2::{Digest, Sha256};

use crate::core::package::BuiltArtifact;

/// Directories included in the archives, next to the binary.
pub const BUNDLED_DIRS: &[&str] = &["man", "completions"];

/// Write `<package>.tgz` into the install directory.
pub fn write_tgz(artifact: &BuiltArtifact) -> Result<PathBuf> {
    let out = artifact
        .install_dir
        .join(format!("{}.tgz", artifact.package));
    let file =
        File::create(&out).with_context(|| format!("failed to create {}", out.display()))?;

    let encoder = GzEncoder::new(file, Compression::default());
    let mut tar = tar::Builder::new(encoder);

    tar.append_path_with_name(artifact.binary_path(), artifact.exe_relative_path())
        .context("failed to archive binary")?;
    for dir in BUNDLED_DIRS {
        tar.append_dir_all(dir, artifact.install_dir.join(dir))
            .with_context(|| format!("failed to archive {dir}/"))?;
    }

    tar.into_inner()
        .context("failed to finish tar stream")?
        .finish()
        .context("failed to finish gzip stream")?;
    Ok(out)
}

/// Write `<package>.zip` into the install directory.
pub fn write_zip(artifact: &BuiltArtifact) -> Result<PathBuf> {
    use zip::write::SimpleFileOptions;

    let out = artifact
        .install_dir
        .join(format!("{}.zip", artifact.package));
    let file =
        File::create(&out).with_context(|| format!("failed to create {}", out.display()))?;
    let mut zip = zip::ZipWriter::new(file);

    let exe_opts = SimpleFileOptions::default().unix_permissions(0o755);
    let file_opts = SimpleFileOptions::default().unix_permissions(0o644);

    let exe_name = artifact.exe_relative_path().to_string_lossy().into_owned();
    zip.start_file(exe_name, exe_opts)
        .context("failed to add binary to zip")?;
    copy_into(&artifact.binary_path(), &mut zip)?;

    for dir in BUNDLED_DIRS {
        let root = artifact.install_dir.join(dir);
        for entry in walkdir::WalkDir::new(&root).sort_by_file_name() {
            let entry = entry?;
            let rel = entry
                .path()
                .strip_prefix(&artifact.install_dir)
                .expect("entries live under the install dir");
            let name = rel.to_string_lossy().replace('\\', "/");
            if entry.file_type().is_dir() {
                zip.add_directory(name, file_opts)
                    .context("failed to add directory to zip")?;
            } else {
                zip.start_file(name, file_opts)
                    .with_context(|| format!("failed to add {} to zip", rel.display()))?;
                copy_into(entry.path(), &mut zip)?;
            }
        }
    }

    zip.finish().context("failed to finish zip")?;
    Ok(out)
}

/// Write `<package>.sha256` covering the given archives.
pub fn write_checksums(artifact: &BuiltArtifact, archives: &[&Path]) -> Result<PathBuf> {
    let out = artifact
        .install_dir
        .join(format!("{}.sha256", artifact.package));
    let mut lines = String::new();

    for archive in archives {
        let bytes = std::fs::read(archive)
            .with_context(|| format!("failed to read {}", archive.display()))?;
        let digest = hex::encode(Sha256::digest(&bytes));
        let name = archive
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        lines.push_str(&format!("{digest}  {name}\n"));
    }

    std::fs::write(&out, lines)
        .with_context(|| format!("failed to write {}", out.display()))?;
    Ok(out)
}

fn copy_into(path: &Path, zip: &mut zip::ZipWriter<File>) -> Result<()> {
    let mut src =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut buf = Vec::new();
    src.read_to_end(&mut buf)?;
    zip.write_all(&buf)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::triple::TargetTriple;

    fn fixture_artifact(dir: &Path) -> BuiltArtifact {
        std::fs::create_dir_all(dir.join("man/man1")).unwrap();
        std::fs::create_dir_all(dir.join("completions")).unwrap();
        std::fs::write(dir.join("mailsync"), b"#!/bin/sh\n").unwrap();
        std::fs::write(dir.join("man/man1/mailsync.1"), b".TH MAILSYNC 1\n").unwrap();
        std::fs::write(dir.join("completions/bash"), b"complete -F _mailsync\n").unwrap();

        BuiltArtifact {
            package: "mailsync".into(),
            target: "x86_64-linux".into(),
            triple: TargetTriple::new("x86_64-unknown-linux-musl"),
            install_dir: dir.to_path_buf(),
            binary_name: "mailsync".into(),
            exe_subpath: None,
        }
    }

    #[test]
    fn test_tgz_contains_binary_and_dirs() {
        let tmp = tempfile::TempDir::new().unwrap();
        let artifact = fixture_artifact(tmp.path());

        let tgz = write_tgz(&artifact).unwrap();
        assert!(tgz.ends_with("mailsync.tgz"));

        let file = File::open(&tgz).unwrap();
        let mut archive = tar::Archive::new(flate2::read::GzDecoder::new(file));
        let names: Vec<String> = archive
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().to_string_lossy().into_owned())
            .collect();

        assert!(names.contains(&"mailsync".to_string()));
        assert!(names.iter().any(|n| n.starts_with("man/")));
        assert!(names.iter().any(|n| n.starts_with("completions/")));
    }

    #[test]
    fn test_zip_contains_binary_and_dirs() {
        let tmp = tempfile::TempDir::new().unwrap();
        let artifact = fixture_artifact(tmp.path());

        let path = write_zip(&artifact).unwrap();
        let mut archive = zip::ZipArchive::new(File::open(&path).unwrap()).unwrap();
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();

        assert!(names.contains(&"mailsync".to_string()));
        assert!(names.iter().any(|n| n.starts_with("man/")));
        assert!(names.iter().any(|n| n.starts_with("completions/")));
    }

    #[test]
    fn test_checksums_cover_both_archives() {
        let tmp = tempfile::TempDir::new().unwrap();
        let artifact = fixture_artifact(tmp.path());

        let tgz = write_tgz(&artifact).unwrap();
        let zip = write_zip(&artifact).unwrap();
        let sums = write_checksums(&artifact, &[&tgz, &zip]).unwrap();

        let contents = std::fs::read_to_string(&sums).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("mailsync.tgz"));
        assert!(lines[1].ends_with("mailsync.zip"));
        // sha256 hex digests
        assert!(lines.iter().all(|l| l.split_whitespace().next().unwrap().len() == 64));
    }
}

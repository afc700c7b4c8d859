//! Post-install pipeline tests against a stub binary.
//!
//! The stub is a shell script speaking the expected self-documentation
//! protocol: `<binary> man <dir>` writes a manual-page tree and
//! `<binary> completion <shell>` prints a script to stdout.

#![cfg(unix)]

use std::fs;
use std::fs::File;
use std::path::Path;

use slipway::core::package::BuiltArtifact;
use slipway::core::triple::TargetTriple;
use slipway::errors::Error;
use slipway::postinstall::emulation::ExecStrategy;
use slipway::postinstall::{PostInstallPipeline, COMPLETION_SHELLS};

const STUB: &str = r#"#!/bin/sh
case "$1" in
  man)
    mkdir -p "$2/man1"
    printf '.TH MAILSYNC 1\n' > "$2/man1/mailsync.1"
    ;;
  completion)
    printf '# %s completion for mailsync\n' "$2"
    ;;
  *)
    echo "unknown subcommand: $1" >&2
    exit 2
    ;;
esac
"#;

fn stub_artifact(dir: &Path, script: &str) -> BuiltArtifact {
    let binary = dir.join("mailsync");
    fs::write(&binary, script).unwrap();
    slipway::util::fs::make_executable(&binary).unwrap();

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
fn test_pipeline_produces_full_bundle() {
    let tmp = tempfile::TempDir::new().unwrap();
    let artifact = stub_artifact(tmp.path(), STUB);

    let bundle = PostInstallPipeline::new(ExecStrategy::Native)
        .run(&artifact)
        .unwrap();

    let man_page = bundle.man_dir.join("man1/mailsync.1");
    assert!(man_page.is_file());
    assert!(fs::read_to_string(&man_page).unwrap().contains(".TH MAILSYNC"));

    let mut shells: Vec<String> = fs::read_dir(&bundle.completions_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    shells.sort();
    assert_eq!(shells, COMPLETION_SHELLS);
    for shell in COMPLETION_SHELLS {
        let script = fs::read_to_string(bundle.completions_dir.join(shell)).unwrap();
        assert!(script.contains(shell), "completion for {shell}: {script}");
    }

    assert!(bundle.tgz.ends_with("mailsync.tgz"));
    assert!(bundle.zip.ends_with("mailsync.zip"));
    assert!(bundle.checksums.ends_with("mailsync.sha256"));
    assert_eq!(
        fs::read_to_string(&bundle.checksums).unwrap().lines().count(),
        2
    );
}

#[test]
fn test_archives_contain_binary_man_and_completions() {
    let tmp = tempfile::TempDir::new().unwrap();
    let artifact = stub_artifact(tmp.path(), STUB);

    let bundle = PostInstallPipeline::new(ExecStrategy::Native)
        .run(&artifact)
        .unwrap();

    let file = File::open(&bundle.tgz).unwrap();
    let mut archive = tar::Archive::new(flate2::read::GzDecoder::new(file));
    let tgz_names: Vec<String> = archive
        .entries()
        .unwrap()
        .map(|e| e.unwrap().path().unwrap().to_string_lossy().into_owned())
        .collect();
    assert!(tgz_names.contains(&"mailsync".to_string()));
    assert!(tgz_names.contains(&"man/man1/mailsync.1".to_string()));
    for shell in COMPLETION_SHELLS {
        assert!(tgz_names.contains(&format!("completions/{shell}")));
    }

    let mut archive = zip::ZipArchive::new(File::open(&bundle.zip).unwrap()).unwrap();
    let zip_names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect();
    assert!(zip_names.contains(&"mailsync".to_string()));
    assert!(zip_names.contains(&"man/man1/mailsync.1".to_string()));
    for shell in COMPLETION_SHELLS {
        assert!(zip_names.contains(&format!("completions/{shell}")));
    }
}

#[test]
fn test_windows_artifact_archives_exe_name() {
    let tmp = tempfile::TempDir::new().unwrap();
    let binary = tmp.path().join("mailsync.exe");
    fs::write(&binary, STUB).unwrap();
    slipway::util::fs::make_executable(&binary).unwrap();

    let artifact = BuiltArtifact {
        package: "mailsync".into(),
        target: "x86_64-windows".into(),
        triple: TargetTriple::new("x86_64-pc-windows-gnu"),
        install_dir: tmp.path().to_path_buf(),
        binary_name: "mailsync.exe".into(),
        exe_subpath: None,
    };

    let bundle = PostInstallPipeline::new(ExecStrategy::Native)
        .run(&artifact)
        .unwrap();

    let file = File::open(&bundle.tgz).unwrap();
    let mut archive = tar::Archive::new(flate2::read::GzDecoder::new(file));
    let tgz_names: Vec<String> = archive
        .entries()
        .unwrap()
        .map(|e| e.unwrap().path().unwrap().to_string_lossy().into_owned())
        .collect();
    assert!(tgz_names.contains(&"mailsync.exe".to_string()));
    assert!(!tgz_names.contains(&"mailsync".to_string()));

    let mut archive = zip::ZipArchive::new(File::open(&bundle.zip).unwrap()).unwrap();
    let zip_names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect();
    assert!(zip_names.contains(&"mailsync.exe".to_string()));
}

#[test]
fn test_failing_man_step_is_named() {
    let tmp = tempfile::TempDir::new().unwrap();
    let artifact = stub_artifact(tmp.path(), "#!/bin/sh\nexit 1\n");

    let err = PostInstallPipeline::new(ExecStrategy::Native)
        .run(&artifact)
        .unwrap_err();

    match err {
        Error::PostInstallFailure { target, step, .. } => {
            assert_eq!(target, "x86_64-linux");
            assert_eq!(step, "man generation");
        }
        other => panic!("expected post-install failure, got {other}"),
    }
}

#[test]
fn test_failing_completion_step_is_named() {
    // Man pages succeed, completions fail.
    let script = r#"#!/bin/sh
case "$1" in
  man) mkdir -p "$2/man1"; : > "$2/man1/mailsync.1" ;;
  *) exit 1 ;;
esac
"#;
    let tmp = tempfile::TempDir::new().unwrap();
    let artifact = stub_artifact(tmp.path(), script);

    let err = PostInstallPipeline::new(ExecStrategy::Native)
        .run(&artifact)
        .unwrap_err();

    match err {
        Error::PostInstallFailure { step, diagnostic, .. } => {
            assert_eq!(step, "bash completion");
            assert!(diagnostic.contains("exit code"), "diagnostic: {diagnostic}");
        }
        other => panic!("expected post-install failure, got {other}"),
    }
}

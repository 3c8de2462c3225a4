use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use tgzkit_archive::detect::ArchiveFormat;
use tgzkit_archive::{facade, task, Settings};
use tgzkit_core::{ErrorKind, GzipLevel, TarOptions, TgzError, VirtualProgress};

fn sample_tree(root: &Path) {
    fs::create_dir_all(root.join("docs/nested")).unwrap();
    fs::create_dir_all(root.join("empty")).unwrap();
    fs::write(root.join("readme.md"), "# sample\n").unwrap();
    fs::write(root.join("docs/guide.txt"), "guide ".repeat(5_000)).unwrap();
    fs::write(root.join("docs/nested/blob.bin"), vec![7u8; 3_000]).unwrap();
}

/// Staged files in the temp dir whose names start with `prefix`.
fn staged_files(prefix: &str) -> HashSet<PathBuf> {
    fs::read_dir(std::env::temp_dir())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .map(|n| n.to_string_lossy().starts_with(prefix))
                .unwrap_or(false)
        })
        .collect()
}

#[test]
fn test_tar_gzip_roundtrip() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let source = dir.path().join("project");
    sample_tree(&source);

    let archive = dir.path().join("project.tar.gz");
    facade::tar_gzip_file(&source, &archive)?;
    assert_eq!(ArchiveFormat::detect_path(&archive)?, ArchiveFormat::Gzip);

    let destination = dir.path().join("restored");
    facade::untar_gzip_file(&archive, &destination)?;

    assert_eq!(fs::read_to_string(destination.join("readme.md"))?, "# sample\n");
    assert_eq!(
        fs::read(destination.join("docs/guide.txt"))?,
        fs::read(source.join("docs/guide.txt"))?
    );
    assert_eq!(fs::read(destination.join("docs/nested/blob.bin"))?, vec![7u8; 3_000]);
    assert!(destination.join("empty").is_dir());
    Ok(())
}

#[test]
fn test_ungzip_yields_plain_tar() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let source = dir.path().join("project");
    sample_tree(&source);

    let archive = dir.path().join("project.tgz");
    let settings = Settings::default()
        .with_level(GzipLevel::BEST)
        .with_tar_options(TarOptions::new().with_strict_checksum(true));
    let mut progress = VirtualProgress::new();
    facade::tar_gzip_file_with(&source, &archive, &settings, &mut progress)?;
    assert_eq!(progress.completed_units(), 100);

    let tar = dir.path().join("project.tar");
    facade::ungzip_file(&archive, &tar)?;
    assert_eq!(ArchiveFormat::detect_path(&tar)?, ArchiveFormat::Tar);
    assert_eq!(fs::metadata(&tar)?.len() % 512, 0);

    let destination = dir.path().join("restored");
    facade::untar_file_with(&tar, &destination, &settings, &mut progress)?;
    assert_eq!(fs::read_to_string(destination.join("readme.md"))?, "# sample\n");
    Ok(())
}

#[test]
fn test_staged_tar_removed_on_success() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let source = dir.path().join("stage-success-7f3a");
    sample_tree(&source);

    let archive = dir.path().join("out.tar.gz");
    facade::tar_gzip_file(&source, &archive)?;
    assert!(staged_files("stage-success-7f3a-").is_empty());

    facade::untar_gzip_file(&archive, &dir.path().join("restored"))?;
    assert!(staged_files("out.tar-").is_empty());
    Ok(())
}

#[test]
fn test_staged_tar_removed_on_failure() {
    let dir = tempfile::tempdir().unwrap();
    let bogus = dir.path().join("stage-failure-91c2.tar.gz");
    fs::write(&bogus, b"this is not a gzip stream").unwrap();

    let err = facade::untar_gzip_file(&bogus, &dir.path().join("out")).unwrap_err();
    assert!(matches!(err, TgzError::DecompressionFailed { .. }));
    assert_eq!(err.kind(), ErrorKind::CorruptData);
    assert!(staged_files("stage-failure-91c2.tar-").is_empty());
}

#[test]
fn test_missing_source_reports_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = facade::tar_gzip_file(&dir.path().join("absent"), &dir.path().join("x.tar.gz"))
        .unwrap_err();
    assert!(matches!(err, TgzError::SourceNotFound { .. }));
    assert!(!dir.path().join("x.tar.gz").exists());
}

#[test]
fn test_background_roundtrip_via_callbacks() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("project");
    sample_tree(&source);
    let archive = dir.path().join("project.tar.gz");
    let destination = dir.path().join("restored");

    let (tx, rx) = mpsc::channel();
    let (src, dst) = (source.clone(), archive.clone());
    let handle = task::spawn(
        move || facade::tar_gzip_file(&src, &dst),
        move |result| tx.send(result).unwrap(),
    )
    .unwrap();
    rx.recv().unwrap().unwrap();
    handle.join().unwrap();

    let (tx, rx) = mpsc::channel();
    let (src, dst) = (archive.clone(), destination.clone());
    let handle = task::spawn(
        move || facade::untar_gzip_file(&src, &dst),
        move |result| tx.send(result).unwrap(),
    )
    .unwrap();
    rx.recv().unwrap().unwrap();
    handle.join().unwrap();

    assert_eq!(fs::read_to_string(destination.join("readme.md")).unwrap(), "# sample\n");
}

#[test]
fn test_background_failure_reaches_callback() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.tar");
    let destination = dir.path().join("out");

    let (tx, rx) = mpsc::channel();
    let handle = task::spawn(
        move || facade::untar_file(&missing, &destination),
        move |result| tx.send(result).unwrap(),
    )
    .unwrap();
    handle.join().unwrap();

    let err = rx.recv().unwrap().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[cfg(feature = "async-io")]
#[tokio::test]
async fn test_run_blocking_tar_gzip() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("project");
    sample_tree(&source);
    let archive = dir.path().join("project.tar.gz");

    let (src, dst) = (source.clone(), archive.clone());
    task::run_blocking(move || facade::tar_gzip_file(&src, &dst))
        .await
        .unwrap();
    assert!(archive.exists());
}

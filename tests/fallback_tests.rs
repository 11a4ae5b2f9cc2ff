// Tests for loading recordings from disk and saving them locally when an
// upload cannot complete

use anyhow::Result;
use chrono::{TimeZone, Utc};
use recording_upload::fallback::{default_filename, save_locally};
use recording_upload::upload::artifact::content_type_for;
use recording_upload::upload::RecordingArtifact;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

#[test]
fn test_open_infers_content_type() -> Result<()> {
    let temp_dir = TempDir::new()?;

    let cases = [
        ("lecture.webm", "video/webm"),
        ("lecture.MP4", "video/mp4"),
        ("voice.wav", "audio/wav"),
        ("notes.bin", "video/webm"),
        ("no-extension", "video/webm"),
    ];

    for (name, expected) in cases {
        let path = temp_dir.path().join(name);
        fs::write(&path, b"0123456789")?;

        let artifact = RecordingArtifact::open(&path, "video/webm")?;
        assert_eq!(artifact.content_type(), expected, "content type for {}", name);
        assert_eq!(artifact.len(), 10);
    }

    Ok(())
}

#[test]
fn test_open_missing_file_fails() -> Result<()> {
    let temp_dir = TempDir::new()?;

    let err = RecordingArtifact::open(temp_dir.path().join("missing.webm"), "video/webm").unwrap_err();
    assert!(err.to_string().contains("Failed to read recording"));

    Ok(())
}

#[test]
fn test_content_type_for_unknown_extension_is_none() {
    assert_eq!(content_type_for(Path::new("a/lecture.webm")), Some("video/webm"));
    assert_eq!(content_type_for(Path::new("clip.M4A")), Some("audio/mp4"));
    assert_eq!(content_type_for(Path::new("notes.bin")), None);
    assert_eq!(content_type_for(Path::new("recording")), None);
}

#[test]
fn test_save_locally_creates_directory() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let dir = temp_dir.path().join("downloads").join("recordings");
    let artifact = RecordingArtifact::new(b"recorded".to_vec(), "video/webm");

    let path = save_locally(&dir, "lecture.webm", &artifact)?;

    assert_eq!(path, dir.join("lecture.webm"));
    assert_eq!(fs::read(&path)?, b"recorded");

    Ok(())
}

#[test]
fn test_save_locally_ignores_directory_components() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let artifact = RecordingArtifact::new(b"x".to_vec(), "video/webm");

    let path = save_locally(temp_dir.path(), "../../escape.webm", &artifact)?;

    assert_eq!(path, temp_dir.path().join("escape.webm"));
    assert!(path.exists());

    Ok(())
}

#[test]
fn test_save_locally_overwrites_existing_file() -> Result<()> {
    let temp_dir = TempDir::new()?;

    save_locally(temp_dir.path(), "lecture.webm", &RecordingArtifact::new(b"first".to_vec(), "video/webm"))?;
    let path = save_locally(temp_dir.path(), "lecture.webm", &RecordingArtifact::new(b"second".to_vec(), "video/webm"))?;

    assert_eq!(fs::read(path)?, b"second");

    Ok(())
}

#[test]
fn test_default_filename_is_filesystem_safe() {
    let now = Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap() + chrono::Duration::milliseconds(123);

    let name = default_filename(now);

    assert_eq!(name, "lecture-2024-03-05T14-07-09-123Z.webm");
    assert!(!name.contains(':'));
}

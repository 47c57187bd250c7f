//! Golden tests for machine-readable output shapes.
//!
//! The JSON report is consumed by scripts, so its field set and spelling
//! are pinned here. Run with `--features golden`.

#![cfg(feature = "golden")]

use dsk_core::{UploadKind, UploadReport};

fn report(kind: UploadKind, link: &str, name: &str, files: u64) -> UploadReport {
    UploadReport {
        link: link.to_string(),
        size: 1_048_576,
        files,
        kind,
        name: name.to_string(),
        completed_at: jiff::Timestamp::UNIX_EPOCH,
    }
}

#[test]
fn test_file_report_json_shape() {
    let report = report(
        UploadKind::File,
        "https://drive.google.com/uc?id=file-1&export=download",
        "video.mkv",
        1,
    );
    let rendered = serde_json::to_string_pretty(&report).unwrap();
    insta::assert_snapshot!(rendered, @r###"
    {
      "link": "https://drive.google.com/uc?id=file-1&export=download",
      "size": 1048576,
      "files": 1,
      "kind": "File",
      "name": "video.mkv",
      "completed_at": "1970-01-01T00:00:00Z"
    }
    "###);
}

#[test]
fn test_folder_report_json_shape() {
    let report = report(
        UploadKind::Folder,
        "https://drive.google.com/drive/folders/folder-1",
        "album",
        3,
    );
    let rendered = serde_json::to_string_pretty(&report).unwrap();
    insta::assert_snapshot!(rendered, @r###"
    {
      "link": "https://drive.google.com/drive/folders/folder-1",
      "size": 1048576,
      "files": 3,
      "kind": "Folder",
      "name": "album",
      "completed_at": "1970-01-01T00:00:00Z"
    }
    "###);
}

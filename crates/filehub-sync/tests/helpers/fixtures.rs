use bytes::Bytes;
use filehub_core::{Location, Upload, UploadId};
use filehub_sync::FileCandidate;

pub fn location(id: i64, name: &str) -> Location {
    Location {
        id,
        location_name: name.to_string(),
        path: format!("/srv/{}", name),
    }
}

pub fn upload(id: UploadId, filename: &str, download_count: u64) -> Upload {
    Upload {
        id,
        filename: filename.to_string(),
        size: 1024,
        upload_time: "2024-03-01 09:00:00".to_string(),
        user_id: "jdoe".to_string(),
        file_location: format!("/srv/inbox/{}", filename),
        download_count,
    }
}

pub fn pdf(name: &str) -> FileCandidate {
    FileCandidate::from_bytes(name, Bytes::from_static(b"%PDF-1.7 test"))
}

/// Sparse file of exactly `size` bytes; nothing is written to disk.
pub fn sparse_file(dir: &tempfile::TempDir, name: &str, size: u64) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let file = std::fs::File::create(&path).unwrap();
    file.set_len(size).unwrap();
    path
}

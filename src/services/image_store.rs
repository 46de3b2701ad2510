//! Product images on the local filesystem.

use std::{
    io,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use tokio::fs;

use crate::dto::products::ImageUpload;

const FALLBACK_MIMETYPE: &str = "application/octet-stream";

#[derive(Debug, Clone, PartialEq)]
pub struct StoredImage {
    pub file_name: String,
    pub mimetype: String,
}

/// Reduce an uploaded file name to ASCII letters, digits, `_`, `.` and `-`,
/// dropping any directory components.
pub fn secure_filename(name: &str) -> String {
    let spaced: String = name
        .chars()
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    kept.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// `<stem>_<timestamp><.ext>` so repeated uploads of one file never collide.
pub fn unique_file_name(original: &str, now: DateTime<Utc>) -> String {
    let safe = secure_filename(original);
    let path = Path::new(&safe);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("image");
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    format!("{stem}_{}{ext}", now.format("%Y%m%d%H%M%S%6f"))
}

pub async fn save(folder: &str, upload: &ImageUpload) -> io::Result<StoredImage> {
    fs::create_dir_all(folder).await?;
    let file_name = unique_file_name(&upload.file_name, Utc::now());
    fs::write(Path::new(folder).join(&file_name), &upload.bytes).await?;
    tracing::debug!(file = %file_name, bytes = upload.bytes.len(), "image stored");
    Ok(StoredImage {
        file_name,
        mimetype: upload
            .content_type
            .clone()
            .unwrap_or_else(|| FALLBACK_MIMETYPE.to_string()),
    })
}

pub async fn read(folder: &str, file_name: &str) -> io::Result<Vec<u8>> {
    fs::read(resolve(folder, file_name)?).await
}

/// Best effort: a missing or locked file is logged and otherwise ignored.
pub async fn remove(folder: &str, file_name: &str) {
    let result = match resolve(folder, file_name) {
        Ok(path) => fs::remove_file(path).await,
        Err(err) => Err(err),
    };
    if let Err(err) = result {
        tracing::warn!(file = %file_name, error = %err, "failed to remove image");
    }
}

fn resolve(folder: &str, file_name: &str) -> io::Result<PathBuf> {
    if file_name.is_empty() || secure_filename(file_name) != file_name {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "unsafe image file name",
        ));
    }
    Ok(Path::new(folder).join(file_name))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn strips_directories_and_odd_characters() {
        assert_eq!(secure_filename("../../etc/passwd"), "etc_passwd");
        assert_eq!(secure_filename("My cat.jpg"), "My_cat.jpg");
        assert_eq!(secure_filename("ph\u{f6}to$.png"), "phto.png");
    }

    #[test]
    fn unique_name_keeps_extension() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 45).unwrap();
        assert_eq!(
            unique_file_name("shoe.png", now),
            "shoe_20240501123045000000.png"
        );
        assert_eq!(unique_file_name("///", now), "image_20240501123045000000");
    }

    #[test]
    fn refuses_to_resolve_traversal() {
        assert!(resolve("uploads", "../secret").is_err());
        assert!(resolve("uploads", "shoe_1.png").is_ok());
    }

    #[tokio::test]
    async fn save_read_remove() {
        let folder = std::env::temp_dir().join(format!("image-store-{}", uuid::Uuid::new_v4()));
        let folder = folder.to_string_lossy().into_owned();
        let upload = ImageUpload {
            file_name: "front.jpg".into(),
            content_type: Some("image/jpeg".into()),
            bytes: vec![1, 2, 3],
        };

        let stored = save(&folder, &upload).await.unwrap();
        assert_eq!(stored.mimetype, "image/jpeg");
        assert!(stored.file_name.starts_with("front_"));
        assert_eq!(read(&folder, &stored.file_name).await.unwrap(), vec![1, 2, 3]);

        remove(&folder, &stored.file_name).await;
        assert!(read(&folder, &stored.file_name).await.is_err());
    }
}

use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|candidate| ext.eq_ignore_ascii_case(candidate))
        })
        .unwrap_or(false)
}

/// List png/jpg/jpeg files directly inside `folder`, sorted by path.
///
/// Subdirectories are skipped whatever their name. A missing or
/// unreadable folder is returned as an error.
pub async fn list_images(folder: impl AsRef<Path>) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(folder.as_ref()).await?;
    let mut images = vec![];

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !is_image(&path) {
            continue;
        }

        // follows symlinks, a dangling one is just skipped
        match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => images.push(path),
            _ => {
                tracing::debug!("skip non-file entry: {}", path.display());
            }
        }
    }

    images.sort();

    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_folder() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("comfy-pose-batch-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn extension_match_ignores_case() {
        assert!(is_image(Path::new("a.png")));
        assert!(is_image(Path::new("a.JPG")));
        assert!(is_image(Path::new("dir/a.JpEg")));
        assert!(!is_image(Path::new("a.gif")));
        assert!(!is_image(Path::new("apng")));
        assert!(!is_image(Path::new("png")));
    }

    #[tokio::test]
    async fn lists_only_matching_files() {
        let dir = temp_folder();
        for name in ["b.png", "a.JPG", "c.jpeg"] {
            std::fs::write(dir.join(name), b"img").unwrap();
        }
        for name in ["notes.txt", "photo.webp", "README"] {
            std::fs::write(dir.join(name), b"other").unwrap();
        }
        std::fs::create_dir(dir.join("nested.png")).unwrap();
        std::fs::write(dir.join("nested.png").join("inner.png"), b"img").unwrap();

        let images = list_images(&dir).await.unwrap();

        assert_eq!(
            images,
            vec![dir.join("a.JPG"), dir.join("b.png"), dir.join("c.jpeg")]
        );

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn empty_folder_yields_nothing() {
        let dir = temp_folder();
        assert!(list_images(&dir).await.unwrap().is_empty());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn missing_folder_is_an_error() {
        let dir = std::env::temp_dir().join(format!("comfy-pose-batch-{}", uuid::Uuid::new_v4()));
        let err = list_images(&dir).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}

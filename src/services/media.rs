use crate::{
    config::Config,
    error::Result,
    models::media::UploadedImage,
    utils::{
        image::{inspect_image, ImageInfo},
        validation::FormErrors,
    },
};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

pub const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

/// 帖子图片的存放子目录
const POSTS_DIR: &str = "posts";

#[derive(Clone)]
pub struct MediaService {
    config: Config,
}

impl MediaService {
    pub async fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
        })
    }

    /// 校验上传图片，失败时给出 `image` 字段的表单错误
    pub fn validate(&self, upload: &UploadedImage) -> std::result::Result<ImageInfo, FormErrors> {
        inspect_image(
            &upload.data,
            self.config.max_upload_size,
            &self.config.allowed_image_types,
        )
        .map_err(|reason| {
            debug!("Rejected upload {}: {}", upload.file_name, reason);
            FormErrors::single("image", INVALID_IMAGE)
        })
    }

    /// 保存图片，返回相对于 MEDIA_ROOT 的路径
    pub async fn store(&self, upload: &UploadedImage, info: &ImageInfo) -> Result<String> {
        let dir = Path::new(&self.config.media_root).join(POSTS_DIR);
        tokio::fs::create_dir_all(&dir).await?;

        let stem = sanitize_stem(&upload.file_name);
        let ext = info.format.extension();
        let mut name = format!("{}.{}", stem, ext);
        // create_new 保证同名并发上传不会共用同一个文件
        let mut file = loop {
            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(dir.join(&name))
                .await
            {
                Ok(file) => break file,
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    let suffix = uuid::Uuid::new_v4().simple().to_string();
                    name = format!("{}_{}.{}", stem, &suffix[..7], ext);
                }
                Err(e) => return Err(e.into()),
            }
        };
        file.write_all(&upload.data).await?;
        file.flush().await?;

        let relative = format!("{}/{}", POSTS_DIR, name);
        info!(
            "Stored image {} ({}x{})",
            relative, info.dimensions.width, info.dimensions.height
        );
        Ok(relative)
    }

    /// 删除已保存的图片；文件不存在不算错误
    pub async fn remove(&self, relative: &str) {
        let path = self.absolute_path(relative);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove media file {}: {}", path.display(), e);
            }
        }
    }

    pub fn absolute_path(&self, relative: &str) -> PathBuf {
        Path::new(&self.config.media_root).join(relative)
    }
}

fn sanitize_stem(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();

    let cleaned: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .take(64)
        .collect();

    if cleaned.trim_matches('_').is_empty() {
        "image".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;

    const SMALL_GIF: &[u8] = &[
        0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00,
        0x00, 0xFF, 0xFF, 0xFF, 0x21, 0xF9, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x2C, 0x00, 0x00,
        0x00, 0x00, 0x02, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x0C, 0x0A, 0x00, 0x3B,
    ];

    fn config(root: &Path) -> Config {
        Config {
            media_root: root.to_string_lossy().into_owned(),
            ..Config::default()
        }
    }

    #[test]
    fn test_sanitize_stem() {
        assert_eq!(sanitize_stem("small.gif"), "small");
        assert_eq!(sanitize_stem("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_stem("my photo!.png"), "my_photo_");
        assert_eq!(sanitize_stem("!!!.gif"), "image");
    }

    #[tokio::test]
    async fn test_invalid_upload_reports_image_error() {
        let media = MediaService::new(&Config::default()).await.unwrap();
        let upload = UploadedImage::new("notes.txt", None, Bytes::from_static(b"just some text"));
        let errors = media.validate(&upload).unwrap_err();
        assert_eq!(errors.get("image"), Some(&[INVALID_IMAGE.to_string()][..]));
    }

    #[tokio::test]
    async fn test_store_avoids_collisions() {
        let root = std::env::temp_dir().join(format!("rainbow-media-{}", uuid::Uuid::new_v4()));
        let media = MediaService::new(&config(&root)).await.unwrap();
        let upload = UploadedImage::new("small.gif", None, Bytes::from_static(SMALL_GIF));
        let info = media.validate(&upload).unwrap();

        let first = media.store(&upload, &info).await.unwrap();
        let second = media.store(&upload, &info).await.unwrap();
        assert_eq!(first, "posts/small.gif");
        assert_ne!(first, second);
        assert!(second.starts_with("posts/small_"));
        assert!(media.absolute_path(&second).exists());

        media.remove(&first).await;
        assert!(!media.absolute_path(&first).exists());
        let _ = std::fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn test_concurrent_stores_get_distinct_files() {
        let root = std::env::temp_dir().join(format!("rainbow-media-{}", uuid::Uuid::new_v4()));
        let media = MediaService::new(&config(&root)).await.unwrap();
        let upload = UploadedImage::new("cat.gif", None, Bytes::from_static(SMALL_GIF));
        let info = media.validate(&upload).unwrap();

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let (media, upload, info) = (media.clone(), upload.clone(), info.clone());
                tokio::spawn(async move { media.store(&upload, &info).await.unwrap() })
            })
            .collect();
        let mut names = Vec::new();
        for task in tasks {
            names.push(task.await.unwrap());
        }
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 8);
        for name in &names {
            assert_eq!(std::fs::read(media.absolute_path(name)).unwrap(), SMALL_GIF);
        }
        let _ = std::fs::remove_dir_all(root);
    }
}

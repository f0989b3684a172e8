use serde::{Deserialize, Serialize};

/// 上传图片支持的格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Webp,
    Gif,
}

impl ImageFormat {
    /// 通过文件头识别格式
    pub fn detect(data: &[u8]) -> Option<Self> {
        if data.len() < 4 {
            return None;
        }

        match &data[0..4] {
            [0xFF, 0xD8, 0xFF, _] => Some(Self::Jpeg),
            [0x89, 0x50, 0x4E, 0x47] => Some(Self::Png),
            [0x47, 0x49, 0x46, 0x38] => Some(Self::Gif),
            _ if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" => {
                Some(Self::Webp)
            }
            _ => None,
        }
    }

    /// 获取文件扩展名
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Gif => "gif",
        }
    }

    /// 配置里的类型名（`jpeg,jpg,png,...`）是否覆盖该格式
    pub fn is_allowed(&self, allowed_types: &str) -> bool {
        allowed_types
            .split(',')
            .map(|t| t.trim().to_ascii_lowercase())
            .any(|t| match self {
                Self::Jpeg => t == "jpeg" || t == "jpg",
                other => t == other.extension(),
            })
    }
}

/// 图片尺寸
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

/// 校验通过的图片信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub format: ImageFormat,
    pub dimensions: ImageDimensions,
}

/// 校验上传的图片：大小、格式、尺寸
pub fn inspect_image(data: &[u8], max_size: usize, allowed_types: &str) -> Result<ImageInfo, String> {
    if data.is_empty() {
        return Err("The submitted file is empty.".to_string());
    }

    if data.len() > max_size {
        return Err(format!(
            "Image is too large: {} bytes (max {} bytes)",
            data.len(),
            max_size
        ));
    }

    let format = ImageFormat::detect(data).ok_or_else(|| "Unsupported image format".to_string())?;
    if !format.is_allowed(allowed_types) {
        return Err(format!("Image type {} is not allowed", format.extension()));
    }

    let size = imagesize::blob_size(data).map_err(|e| format!("Corrupted image: {:?}", e))?;
    if size.width == 0 || size.height == 0 {
        return Err("Image dimensions are invalid".to_string());
    }

    if size.width > 10000 || size.height > 10000 {
        return Err("Image dimensions are too large".to_string());
    }

    Ok(ImageInfo {
        format,
        dimensions: ImageDimensions {
            width: size.width as u32,
            height: size.height as u32,
        },
    })
}

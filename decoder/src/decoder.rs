use std::{io, path::Path, path::PathBuf};

use image::ImageError;
use thiserror::Error;
use tracing::debug;

/// 图像解码失败
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("读取图像文件 {} 失败", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("解码图像文件 {} 失败", .path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: ImageError,
    },
}

/// 解码后的图像
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// 行跨度, 单位为字节
    pub stride: usize,
    pub bytes_per_pixel: usize,
    /// 原始 EXIF 方向值, 未读取到时为 `None`
    pub orientation: Option<u8>,
}

impl DecodedImage {
    /// 锁定像素缓冲区, 锁存续期间缓冲区不可修改
    pub fn lock(&self) -> PixelLock<'_> {
        debug!(
            "锁定像素缓冲区: {}x{}, {} 字节",
            self.width,
            self.height,
            self.pixels.len()
        );
        PixelLock {
            pixels: &self.pixels,
        }
    }
}

/// 像素缓冲区锁, 离开作用域时释放
pub struct PixelLock<'a> {
    pixels: &'a [u8],
}

impl PixelLock<'_> {
    pub fn pixels(&self) -> &[u8] {
        self.pixels
    }
}

impl Drop for PixelLock<'_> {
    fn drop(&mut self) {
        debug!("释放像素缓冲区");
    }
}

/// 图像解码接口
pub trait ImageDecoder {
    /// 解码图像文件
    ///
    /// # 参数
    ///
    /// * `path` - 图像文件路径
    fn decode(&self, path: &Path) -> Result<DecodedImage, DecodeError>;
}

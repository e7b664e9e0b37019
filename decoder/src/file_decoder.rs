use std::path::Path;

use image::{ColorType, DynamicImage, ImageDecoder as _, ImageReader};
use tracing::{debug, warn};

use crate::decoder::{DecodeError, DecodedImage, ImageDecoder};

/// 基于 image 库的文件解码器, 支持 JPEG / PNG / BMP 等格式
#[derive(Debug, Default, Clone, Copy)]
pub struct FileDecoder;

impl ImageDecoder for FileDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedImage, DecodeError> {
        let io_error = |source| DecodeError::Io {
            path: path.to_path_buf(),
            source,
        };
        let image_error = |source| DecodeError::Image {
            path: path.to_path_buf(),
            source,
        };

        let reader = ImageReader::open(path)
            .map_err(io_error)?
            .with_guessed_format()
            .map_err(io_error)?;
        let mut decoder = reader.into_decoder().map_err(image_error)?;

        let orientation = match decoder.orientation() {
            Ok(orientation) => Some(orientation.to_exif()),
            Err(e) => {
                warn!("读取图像方向失败, 使用默认方向: {}", e);
                None
            }
        };
        let image = to_8bit(DynamicImage::from_decoder(decoder).map_err(image_error)?);

        let width = image.width();
        let height = image.height();
        let bytes_per_pixel = image.color().bytes_per_pixel() as usize;
        let stride = width as usize * bytes_per_pixel;
        debug!(
            "图像解码完成: {} {}x{}, 颜色类型: {:?}, 方向: {:?}",
            path.display(),
            width,
            height,
            image.color(),
            orientation
        );

        Ok(DecodedImage {
            pixels: image.into_bytes(),
            width,
            height,
            stride,
            bytes_per_pixel,
            orientation,
        })
    }
}

/// 将 16 位和浮点图像转换为每通道 8 位, 通道数保持不变
fn to_8bit(image: DynamicImage) -> DynamicImage {
    match image.color() {
        ColorType::L16 => DynamicImage::ImageLuma8(image.into_luma8()),
        ColorType::La16 => DynamicImage::ImageLumaA8(image.into_luma_alpha8()),
        ColorType::Rgb16 | ColorType::Rgb32F => DynamicImage::ImageRgb8(image.into_rgb8()),
        ColorType::Rgba16 | ColorType::Rgba32F => DynamicImage::ImageRgba8(image.into_rgba8()),
        _ => image,
    }
}

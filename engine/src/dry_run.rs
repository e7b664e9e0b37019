use std::time::Instant;

use serde_json::{Value, json};
use tracing::{debug, info};

use crate::engine::{EngineResult, Frame, RecognitionEngine};

/// 引擎状态错误(未初始化或重复初始化)
pub const CODE_INVALID_STATE: i32 = 1;
/// 配置不是合法的 JSON 对象
pub const CODE_INVALID_CONFIG: i32 = 2;
/// 图像尺寸与缓冲区不匹配
pub const CODE_INVALID_FRAME: i32 = 3;

/// 空运行引擎
///
/// 不做任何识别, 只校验调用顺序, 配置格式和图像尺寸,
/// 并返回描述输入图像的结果, 用于在没有厂商引擎的环境下演示完整流程.
#[derive(Debug, Default)]
pub struct DryRunEngine {
    config: Option<Value>,
    frame_id: u64,
}

impl DryRunEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// 是否已初始化
    pub fn is_initialized(&self) -> bool {
        self.config.is_some()
    }

    /// 校验图像尺寸
    ///
    /// # 参数
    ///
    /// * `frame` - 待校验的图像
    fn check_frame(frame: &Frame) -> Result<(), String> {
        if frame.width == 0 || frame.height == 0 {
            return Err(format!("图像尺寸无效: {}x{}", frame.width, frame.height));
        }
        if frame.stride < frame.width {
            return Err(format!(
                "行跨度 {} 小于图像宽度 {}",
                frame.stride, frame.width
            ));
        }
        if !(1..=8).contains(&frame.orientation) {
            return Err(format!("图像方向 {} 无效", frame.orientation));
        }
        let bytes_per_pixel = frame.image_type.bytes_per_pixel();
        let expected = (frame.stride * (frame.height - 1) + frame.width) * bytes_per_pixel;
        if frame.buffer.len() < expected {
            return Err(format!(
                "缓冲区长度 {} 小于所需长度 {}",
                frame.buffer.len(),
                expected
            ));
        }
        Ok(())
    }
}

impl RecognitionEngine for DryRunEngine {
    fn initialize(&mut self, config: &str) -> EngineResult {
        if self.is_initialized() {
            return EngineResult::failure(CODE_INVALID_STATE, "Engine already initialized", "");
        }
        let config: Value = match serde_json::from_str(config) {
            Ok(value @ Value::Object(_)) => value,
            Ok(_) => {
                return EngineResult::failure(
                    CODE_INVALID_CONFIG,
                    "Invalid configuration",
                    json!({ "error": "配置必须是 JSON 对象" }).to_string(),
                );
            }
            Err(e) => {
                return EngineResult::failure(
                    CODE_INVALID_CONFIG,
                    "Invalid configuration",
                    json!({ "error": e.to_string() }).to_string(),
                );
            }
        };
        if let Some(charset) = config.get("charset") {
            debug!("空运行引擎字符集: {}", charset);
        }
        info!("空运行引擎已初始化, 不会执行真实识别");
        self.config = Some(config);
        self.frame_id = 0;
        EngineResult::ok("")
    }

    fn process(&mut self, frame: &Frame) -> EngineResult {
        if !self.is_initialized() {
            return EngineResult::failure(CODE_INVALID_STATE, "Engine not initialized", "");
        }
        let start = Instant::now();
        if let Err(reason) = Self::check_frame(frame) {
            return EngineResult::failure(
                CODE_INVALID_FRAME,
                "Invalid frame",
                json!({ "error": reason }).to_string(),
            );
        }

        let frame_id = self.frame_id;
        self.frame_id += 1;
        let result = json!({
            "duration": start.elapsed().as_millis() as u64,
            "frame_id": frame_id,
            "plates": [],
            "image": {
                "type": frame.image_type.as_str(),
                "width": frame.width,
                "height": frame.height,
                "stride": frame.stride,
                "orientation": frame.orientation,
            },
        });
        EngineResult::ok(result.to_string())
    }

    fn shutdown(&mut self) -> EngineResult {
        if self.config.take().is_none() {
            return EngineResult::failure(CODE_INVALID_STATE, "Engine not initialized", "");
        }
        debug!("空运行引擎共处理 {} 帧", self.frame_id);
        EngineResult::ok("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ImageType;

    fn frame(buffer: &[u8], width: usize, height: usize, stride: usize) -> Frame<'_> {
        Frame {
            image_type: ImageType::Rgb24,
            buffer,
            width,
            height,
            stride,
            orientation: 1,
        }
    }

    #[test]
    fn test_process_result() {
        let mut engine = DryRunEngine::new();
        assert!(engine.initialize("{\"charset\":\"latin\"}").is_success());

        let buffer = vec![0u8; 4 * 2 * 3];
        let result = engine.process(&frame(&buffer, 4, 2, 4));
        assert!(result.is_success());

        let value: Value = serde_json::from_str(&result.json).unwrap();
        assert_eq!(value["frame_id"], 0);
        assert_eq!(value["plates"], json!([]));
        assert_eq!(value["image"]["type"], "RGB24");
        assert_eq!(value["image"]["width"], 4);
        assert_eq!(value["image"]["stride"], 4);

        let result = engine.process(&frame(&buffer, 4, 2, 4));
        let value: Value = serde_json::from_str(&result.json).unwrap();
        assert_eq!(value["frame_id"], 1);

        assert!(engine.shutdown().is_success());
        assert!(!engine.is_initialized());
    }

    #[test]
    fn test_lifecycle_errors() {
        let mut engine = DryRunEngine::new();
        let buffer = vec![0u8; 12];
        assert_eq!(
            engine.process(&frame(&buffer, 2, 2, 2)).code,
            CODE_INVALID_STATE
        );
        assert_eq!(engine.shutdown().code, CODE_INVALID_STATE);

        assert!(engine.initialize("{}").is_success());
        assert_eq!(engine.initialize("{}").code, CODE_INVALID_STATE);
        assert!(engine.shutdown().is_success());
        assert!(engine.initialize("{}").is_success());
    }

    #[test]
    fn test_invalid_config() {
        let mut engine = DryRunEngine::new();
        let result = engine.initialize("[1, 2]");
        assert_eq!(result.code, CODE_INVALID_CONFIG);
        let result = engine.initialize("{\"debug_level\":");
        assert_eq!(result.code, CODE_INVALID_CONFIG);
        assert!(!engine.is_initialized());
    }

    #[test]
    fn test_invalid_frame() {
        let mut engine = DryRunEngine::new();
        engine.initialize("{}");

        let buffer = vec![0u8; 10];
        let result = engine.process(&frame(&buffer, 4, 2, 4));
        assert_eq!(result.code, CODE_INVALID_FRAME);

        let buffer = vec![0u8; 24];
        let result = engine.process(&frame(&buffer, 4, 2, 3));
        assert_eq!(result.code, CODE_INVALID_FRAME);

        let mut rotated = frame(&buffer, 4, 2, 4);
        rotated.orientation = 9;
        assert_eq!(engine.process(&rotated).code, CODE_INVALID_FRAME);
    }
}

use std::fmt;

use thiserror::Error;

/// 图像像素格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageType {
    /// 单通道灰度
    Y,
    /// 3 通道, R G B 排列
    Rgb24,
    /// 4 通道, R G B A 排列
    Rgba32,
}

impl ImageType {
    /// 依据每像素字节数确定格式, 仅支持 1, 3, 4
    ///
    /// # 参数
    ///
    /// * `bytes_per_pixel` - 每像素字节数
    pub fn from_bytes_per_pixel(bytes_per_pixel: usize) -> Option<Self> {
        match bytes_per_pixel {
            1 => Some(ImageType::Y),
            3 => Some(ImageType::Rgb24),
            4 => Some(ImageType::Rgba32),
            _ => None,
        }
    }

    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            ImageType::Y => 1,
            ImageType::Rgb24 => 3,
            ImageType::Rgba32 => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageType::Y => "Y",
            ImageType::Rgb24 => "RGB24",
            ImageType::Rgba32 => "RGBA32",
        }
    }
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 送入引擎的一帧图像
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub image_type: ImageType,
    pub buffer: &'a [u8],
    pub width: usize,
    pub height: usize,
    /// 行跨度, 单位为像素(采样)而不是字节
    pub stride: usize,
    /// EXIF 方向, 取值 1-8
    pub orientation: u8,
}

/// 引擎调用结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineResult {
    pub code: i32,
    pub phrase: String,
    pub json: String,
}

impl EngineResult {
    /// 成功结果
    ///
    /// # 参数
    ///
    /// * `json` - 结果内容
    pub fn ok(json: impl Into<String>) -> Self {
        Self {
            code: 0,
            phrase: "OK".to_string(),
            json: json.into(),
        }
    }

    /// 失败结果
    ///
    /// # 参数
    ///
    /// * `code` - 错误码, 不能为 0
    /// * `phrase` - 错误描述
    /// * `json` - 诊断内容
    pub fn failure(code: i32, phrase: impl Into<String>, json: impl Into<String>) -> Self {
        debug_assert_ne!(code, 0);
        Self {
            code,
            phrase: phrase.into(),
            json: json.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == 0
    }

    /// 诊断内容, 引擎未返回 JSON 时使用错误描述
    pub fn payload(&self) -> &str {
        if self.json.is_empty() {
            &self.phrase
        } else {
            &self.json
        }
    }

    /// 将失败结果转换为错误
    ///
    /// # 参数
    ///
    /// * `operation` - 产生该结果的引擎操作
    pub fn check(self, operation: Operation) -> Result<Self, EngineError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(EngineError {
                operation,
                code: self.code,
                phrase: self.phrase,
                payload: self.json,
            })
        }
    }
}

/// 引擎操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Initialize,
    Process,
    Shutdown,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Operation::Initialize => "Init",
            Operation::Process => "Process",
            Operation::Shutdown => "DeInit",
        };
        write!(f, "{}", name)
    }
}

/// 引擎调用失败
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{operation} 执行失败 (code: {code}, phrase: {phrase}): {payload}")]
pub struct EngineError {
    pub operation: Operation,
    pub code: i32,
    pub phrase: String,
    pub payload: String,
}

/// 车牌识别引擎接口
///
/// 引擎为进程级资源, 需先 `initialize`, 使用结束后 `shutdown`.
/// 使用 [`crate::EngineSession`] 保证初始化与释放成对出现.
pub trait RecognitionEngine {
    /// 初始化引擎
    ///
    /// # 参数
    ///
    /// * `config` - JSON 格式的引擎配置
    fn initialize(&mut self, config: &str) -> EngineResult;

    /// 识别一帧图像
    ///
    /// # 参数
    ///
    /// * `frame` - 待识别的图像, 调用期间缓冲区不可修改
    fn process(&mut self, frame: &Frame) -> EngineResult;

    /// 释放引擎
    fn shutdown(&mut self) -> EngineResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_type_from_bytes_per_pixel() {
        assert_eq!(ImageType::from_bytes_per_pixel(1), Some(ImageType::Y));
        assert_eq!(ImageType::from_bytes_per_pixel(3), Some(ImageType::Rgb24));
        assert_eq!(ImageType::from_bytes_per_pixel(4), Some(ImageType::Rgba32));
        assert_eq!(ImageType::from_bytes_per_pixel(2), None);
        assert_eq!(ImageType::from_bytes_per_pixel(6), None);
        assert_eq!(ImageType::Rgba32.bytes_per_pixel(), 4);
    }

    #[test]
    fn test_result_check() {
        let result = EngineResult::ok("{}").check(Operation::Process).unwrap();
        assert_eq!(result.payload(), "{}");

        let error = EngineResult::failure(3, "Invalid frame", "{\"reason\":\"size\"}")
            .check(Operation::Process)
            .unwrap_err();
        assert_eq!(error.operation, Operation::Process);
        assert_eq!(error.code, 3);
        assert_eq!(error.payload, "{\"reason\":\"size\"}");
        assert!(error.to_string().starts_with("Process 执行失败"));
    }

    #[test]
    fn test_result_payload_fallback() {
        let result = EngineResult::failure(1, "Not initialized", "");
        assert!(!result.is_success());
        assert_eq!(result.payload(), "Not initialized");
    }
}

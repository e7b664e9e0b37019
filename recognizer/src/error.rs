use std::path::PathBuf;

use decoder::DecodeError;
use engine::EngineError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("参数错误: {0}")]
    Argument(String),
    #[error("缺少必需参数 {0}")]
    MissingArgument(&'static str),
    #[error("文件不存在: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("不支持的像素格式: 每像素 {0} 字节, 仅支持 1, 3, 4 字节")]
    UnsupportedPixelFormat(usize),
    /// 行跨度须为每像素字节数的整数倍且不小于图像宽度, 不满足时直接拒绝,
    /// 不会按 `stride / bytes_per_pixel` 截断换算
    #[error("行跨度无效: {stride} 字节, 图像宽度 {width}, 每像素 {bytes_per_pixel} 字节")]
    InvalidStride {
        stride: usize,
        width: u32,
        bytes_per_pixel: usize,
    },
    #[error("引擎初始化失败")]
    EngineInit(#[source] EngineError),
    #[error("图像识别失败")]
    Processing(#[source] EngineError),
    #[error("引擎释放失败")]
    EngineShutdown(#[source] EngineError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("配置错误")]
    Config(#[source] anyhow::Error),
    #[error("输出识别结果失败")]
    Output(#[from] std::io::Error),
}

use std::io::Write;
use std::path::Path;

use common::normalize_separators;
use config::EngineConfig;
use decoder::ImageDecoder;
use engine::{EngineSession, Frame, ImageType, RecognitionEngine};
use tracing::{debug, error, info, warn};

use crate::args::Args;
use crate::error::HarnessError;

/// 缺省的图像方向 (不旋转)
const DEFAULT_ORIENTATION: u8 = 1;

/// 单次识别的运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Configured,
    EngineReady,
    ImageLoaded,
    Processed,
    ShutDown,
    Failed,
}

fn transition(state: &mut RunState, next: RunState) {
    debug!("运行状态: {:?} -> {:?}", state, next);
    *state = next;
}

/// 根据命令行参数生成引擎配置
///
/// 先加载 `--config` 指定的配置文件 (未指定时使用默认配置), 再应用命令行参数
///
/// # 参数
///
/// * `args` - 命令行参数
pub fn build_config(args: &Args) -> Result<EngineConfig, HarnessError> {
    let mut config = match &args.config {
        Some(config_file) => {
            info!("加载引擎配置文件: {}", config_file.display());
            EngineConfig::load(config_file).map_err(HarnessError::Config)?
        }
        None => EngineConfig::default(),
    };

    if let Some(charset) = args.charset {
        config.charset = charset;
    }
    if let Some(assets) = &args.assets {
        config.assets_folder = normalize_separators(assets);
    }
    if let Some(tokendata) = &args.tokendata {
        config.license_token_data = tokendata.clone();
    }

    #[cfg(feature = "extended-flags")]
    {
        if let Some(rectify) = args.rectify {
            config.recogn_rectify_enabled = rectify;
        }
        if let Some(tokenfile) = &args.tokenfile {
            config.license_token_file = Some(normalize_separators(tokenfile));
        }
    }
    #[cfg(not(feature = "extended-flags"))]
    {
        if args.rectify.is_some() {
            warn!("参数 --rectify 未启用, 已忽略");
        }
        if args.tokenfile.is_some() {
            warn!("参数 --tokenfile 未启用, 已忽略");
        }
    }

    config.validate().map_err(HarnessError::Config)?;
    Ok(config)
}

/// 将字节行跨度换算为采样行跨度
///
/// 字节行跨度不是每像素字节数的整数倍时返回错误, 不做截断
///
/// # 参数
///
/// * `stride` - 行跨度, 单位为字节
/// * `bytes_per_pixel` - 每像素字节数
/// * `width` - 图像宽度
pub fn stride_in_samples(
    stride: usize,
    bytes_per_pixel: usize,
    width: u32,
) -> Result<usize, HarnessError> {
    let invalid = || HarnessError::InvalidStride {
        stride,
        width,
        bytes_per_pixel,
    };
    if bytes_per_pixel == 0 || stride % bytes_per_pixel != 0 {
        return Err(invalid());
    }
    let samples = stride / bytes_per_pixel;
    if samples < width as usize {
        return Err(invalid());
    }
    Ok(samples)
}

/// 取 1-8 范围内的 EXIF 方向, 其余情况返回 1
pub fn normalize_orientation(orientation: Option<u8>) -> u8 {
    match orientation {
        Some(value @ 1..=8) => value,
        Some(value) => {
            warn!("图像方向 {} 无效, 使用默认方向", value);
            DEFAULT_ORIENTATION
        }
        None => DEFAULT_ORIENTATION,
    }
}

/// 车牌识别流程
///
/// 初始化引擎, 解码并识别一张图像, 输出识别结果, 最后释放引擎
pub struct Harness<'a> {
    engine: &'a mut dyn RecognitionEngine,
    decoder: &'a dyn ImageDecoder,
    state: RunState,
}

impl<'a> Harness<'a> {
    /// 创建识别流程
    ///
    /// # 参数
    ///
    /// * `engine` - 识别引擎
    /// * `decoder` - 图像解码器
    pub fn new(engine: &'a mut dyn RecognitionEngine, decoder: &'a dyn ImageDecoder) -> Self {
        Self {
            engine,
            decoder,
            state: RunState::Idle,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// 执行一次识别, 识别结果写入 `out`
    ///
    /// # 参数
    ///
    /// * `args` - 命令行参数
    /// * `out` - 识别结果输出
    pub fn run(&mut self, args: &Args, out: &mut dyn Write) -> Result<(), HarnessError> {
        let result = self.execute(args, out);
        if result.is_err() {
            transition(&mut self.state, RunState::Failed);
        }
        result
    }

    fn execute(&mut self, args: &Args, out: &mut dyn Write) -> Result<(), HarnessError> {
        let image_file = args
            .image
            .as_deref()
            .ok_or(HarnessError::MissingArgument("--image"))?;

        let config = build_config(args)?
            .to_json()
            .map_err(HarnessError::Config)?;
        transition(&mut self.state, RunState::Configured);

        let decoder = self.decoder;
        let state = &mut self.state;
        let mut session =
            EngineSession::start(&mut *self.engine, &config).map_err(HarnessError::EngineInit)?;
        transition(state, RunState::EngineReady);

        let recognized = recognize(&mut session, decoder, image_file, state, out);
        let finished = session.finish();
        transition(state, RunState::ShutDown);

        match (recognized, finished) {
            (Ok(()), Ok(_)) => Ok(()),
            (Ok(()), Err(e)) => Err(HarnessError::EngineShutdown(e)),
            (Err(e), Ok(_)) => Err(e),
            (Err(e), Err(shutdown_error)) => {
                error!("引擎释放失败: {}", shutdown_error);
                Err(e)
            }
        }
    }
}

fn recognize(
    session: &mut EngineSession,
    decoder: &dyn ImageDecoder,
    image_file: &Path,
    state: &mut RunState,
    out: &mut dyn Write,
) -> Result<(), HarnessError> {
    if !image_file.exists() {
        return Err(HarnessError::FileNotFound(image_file.to_path_buf()));
    }

    let image = decoder.decode(image_file)?;
    let image_type = ImageType::from_bytes_per_pixel(image.bytes_per_pixel)
        .ok_or(HarnessError::UnsupportedPixelFormat(image.bytes_per_pixel))?;
    let stride = stride_in_samples(image.stride, image.bytes_per_pixel, image.width)?;
    let orientation = normalize_orientation(image.orientation);
    info!(
        "已加载图像: {} {}x{}, 方向: {}",
        image_file.display(),
        image.width,
        image.height,
        orientation
    );
    transition(state, RunState::ImageLoaded);

    let result = {
        let lock = image.lock();
        let frame = Frame {
            image_type,
            buffer: lock.pixels(),
            width: image.width as usize,
            height: image.height as usize,
            stride,
            orientation,
        };
        session.process(&frame).map_err(HarnessError::Processing)?
    };
    drop(image);
    transition(state, RunState::Processed);

    info!("识别完成");
    writeln!(out, "{}", result.payload())?;
    out.flush()?;
    Ok(())
}

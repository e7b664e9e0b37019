use std::{collections::HashMap, env, path::PathBuf, str::FromStr};

use clap::{ArgAction, CommandFactory, Parser};
use config::Charset;
use tracing::Level;

use crate::error::HarnessError;

const BIN_NAME: &str = "recognizer";
const FLAG_PREFIX: &str = "--";

/// 车牌识别示例: 初始化识别引擎, 识别一张图像并输出 JSON 结果
///
/// 参数均为 `--名称 值` 成对出现, 例如 `--image plate.jpg --charset latin`
#[derive(Parser, Debug, Clone)]
#[command(name = BIN_NAME, version, about, long_about = None)]
pub struct Args {
    /// 待识别的图像路径 (JPEG / PNG / BMP)
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// 资源目录, 包含引擎配置文件和模型
    #[arg(long)]
    pub assets: Option<String>,

    /// 识别字符集 (latin, korean, chinese)
    #[arg(long, value_parser = Charset::from_str)]
    pub charset: Option<Charset>,

    /// base64 格式的许可证数据, 不提供时以试用模式运行
    #[arg(long)]
    pub tokendata: Option<String>,

    /// 许可证文件路径
    #[arg(long)]
    pub tokenfile: Option<String>,

    /// 是否启用矫正层 (true, false)
    #[arg(long, action = ArgAction::Set)]
    pub rectify: Option<bool>,

    /// 并行识别模式 (true, false), 仅为兼容保留, 设置后无效果
    #[arg(long, action = ArgAction::Set)]
    pub parallel: Option<bool>,

    /// 覆盖默认引擎配置的 YAML 文件
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// 日志等级 (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: Level,

    /// 日志文件路径, 不提供时只输出到控制台
    #[arg(long)]
    pub log_file: Option<String>,

    /// 追加日志到文件
    #[arg(long, action = ArgAction::Set, default_value_t = false)]
    pub append_log: bool,

    /// 识别完成后等待按键再退出
    #[arg(long, action = ArgAction::Set, default_value_t = true)]
    pub wait: bool,

    /// 未识别的参数名, 会被忽略
    #[arg(skip)]
    pub ignored_flags: Vec<String>,
}

/// 解析 `--名称 值` 形式的参数对
///
/// 参数名包含 `--` 前缀, 重复出现时以最后一次为准
///
/// # 参数
///
/// * `args` - 命令行参数, 不包含程序名
pub fn parse_arguments<S: AsRef<str>>(args: &[S]) -> Result<HashMap<String, String>, HarnessError> {
    if args.len() % 2 != 0 {
        return Err(HarnessError::Argument(format!(
            "参数个数必须为偶数: {}",
            args.len()
        )));
    }

    let mut flags = HashMap::new();
    for pair in args.chunks(2) {
        let key = pair[0].as_ref();
        if !key.starts_with(FLAG_PREFIX) {
            return Err(HarnessError::Argument(format!("无效的参数名: {}", key)));
        }
        flags.insert(key.to_string(), pair[1].as_ref().to_string());
    }
    Ok(flags)
}

impl Args {
    /// 从进程参数创建
    pub fn new() -> Result<Self, HarnessError> {
        let raw: Vec<String> = env::args().skip(1).collect();
        if let [flag] = raw.as_slice() {
            if matches!(flag.as_str(), "-h" | "--help" | "-V" | "--version") {
                // 打印帮助或版本信息后退出
                let _ = Self::parse_from([BIN_NAME, flag.as_str()]);
            }
        }
        Self::from_args(&raw)
    }

    /// 从参数列表创建
    ///
    /// # 参数
    ///
    /// * `raw` - 命令行参数, 不包含程序名
    pub fn from_args<S: AsRef<str>>(raw: &[S]) -> Result<Self, HarnessError> {
        let flags = parse_arguments(raw)?;
        Self::from_flags(&flags)
    }

    /// 从参数对创建, 未知参数记录到 `ignored_flags`
    ///
    /// # 参数
    ///
    /// * `flags` - 参数名到值的映射
    pub fn from_flags(flags: &HashMap<String, String>) -> Result<Self, HarnessError> {
        let known_flags = Self::known_flags();

        let mut keys: Vec<&String> = flags.keys().collect();
        keys.sort();

        let mut argv = vec![BIN_NAME.to_string()];
        let mut ignored_flags = Vec::new();
        for key in keys {
            if known_flags.contains(key) {
                // 使用 `--名称=值` 的形式, 值以 `-` 开头时也能正确解析
                argv.push(format!("{}={}", key, flags[key]));
            } else {
                ignored_flags.push(key.clone());
            }
        }

        let mut args =
            Self::try_parse_from(argv).map_err(|e| HarnessError::Argument(e.to_string()))?;
        args.ignored_flags = ignored_flags;
        Ok(args)
    }

    /// 所有支持的参数名
    fn known_flags() -> Vec<String> {
        Self::command()
            .get_arguments()
            .filter_map(|arg| arg.get_long())
            .map(|long| format!("{}{}", FLAG_PREFIX, long))
            .collect()
    }

    /// 用法说明
    pub fn usage() -> String {
        Self::command().render_help().to_string()
    }
}

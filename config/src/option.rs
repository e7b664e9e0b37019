use std::{fmt, str::FromStr};

use anyhow::{Error, bail};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// 引擎调试日志等级
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DebugLevel {
    #[schemars(title = "详细")]
    Verbose,
    #[schemars(title = "信息")]
    Info,
    #[schemars(title = "警告")]
    Warn,
    #[schemars(title = "错误")]
    Error,
    #[schemars(title = "致命")]
    Fatal,
}

/// 识别总分计算方式
///
/// 识别器为车牌中每个字符输出一个分数, 总分由以下方式计算:
///
/// - `min` - 取最小值
/// - `mean` - 取平均值
/// - `median` - 取中位数
/// - `max` - 取最大值
/// - `minmax` - 取 (max + min) * 0.5
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScoreType {
    Min,
    Mean,
    Median,
    Max,
    MinMax,
}

/// 识别字符集
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Charset {
    #[schemars(title = "拉丁字母")]
    Latin,
    #[schemars(title = "韩文")]
    Korean,
    #[schemars(title = "中文")]
    Chinese,
}

impl Charset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Charset::Latin => "latin",
            Charset::Korean => "korean",
            Charset::Chinese => "chinese",
        }
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Charset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "latin" => Ok(Charset::Latin),
            "korean" => Ok(Charset::Korean),
            "chinese" => Ok(Charset::Chinese),
            other => bail!("不支持的字符集 '{}', 可选值: latin, korean, chinese", other),
        }
    }
}

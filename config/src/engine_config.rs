use std::{fs, path::Path};

use anyhow::{Context, Result, bail};
use common::Roi;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::option::{Charset, DebugLevel, ScoreType};

// 编译期默认值, 参见 https://www.doubango.org/SDKs/anpr/docs/Configuration_options.html

pub const DEFAULT_DEBUG_LEVEL: DebugLevel = DebugLevel::Info;
pub const DEFAULT_DEBUG_WRITE_INPUT_IMAGE: bool = false;
pub const DEFAULT_DEBUG_INTERNAL_DATA_PATH: &str = ".";

pub const DEFAULT_NUM_THREADS: i32 = -1;
pub const DEFAULT_GPGPU_ENABLED: bool = true;
pub const DEFAULT_MAX_LATENCY: i32 = -1;
pub const DEFAULT_OPENVINO_ENABLED: bool = true;
pub const DEFAULT_OPENVINO_DEVICE: &str = "CPU";

pub const DEFAULT_DETECT_MINSCORE: f64 = 0.3;
pub const DEFAULT_DETECT_ROI: Roi = Roi::DISABLED;

pub const DEFAULT_PYRAMIDAL_SEARCH_ENABLED: bool = true;
pub const DEFAULT_PYRAMIDAL_SEARCH_SENSITIVITY: f64 = 0.33;
pub const DEFAULT_PYRAMIDAL_SEARCH_MINSCORE: f64 = 0.3;
pub const DEFAULT_PYRAMIDAL_SEARCH_MIN_IMAGE_SIZE_INPIXELS: u32 = 800;

pub const DEFAULT_KLASS_LPCI_ENABLED: bool = false;
pub const DEFAULT_KLASS_VCR_ENABLED: bool = false;
pub const DEFAULT_KLASS_VMMR_ENABLED: bool = false;
pub const DEFAULT_KLASS_VCR_GAMMA: f64 = 1.5;

pub const DEFAULT_RECOGN_MINSCORE: f64 = 0.2;
pub const DEFAULT_RECOGN_SCORE_TYPE: ScoreType = ScoreType::Min;
pub const DEFAULT_RECOGN_RECTIFY_ENABLED: bool = false;

pub const DEFAULT_CHARSET: Charset = Charset::Latin;

/// 识别引擎配置
///
/// 字段名即引擎读取的 JSON 键名, 字段顺序即序列化顺序.
/// 值为 `None` 的可选项(依赖引擎版本)在序列化时省略.
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    #[schemars(title = "调试日志等级")]
    pub debug_level: DebugLevel,
    #[schemars(title = "是否写出输入图像用于调试")]
    pub debug_write_input_image_enabled: bool,
    #[schemars(title = "调试数据目录")]
    pub debug_internal_data_path: String,

    #[schemars(title = "最大线程数(-1 表示自动)")]
    pub num_threads: i32,
    #[schemars(title = "是否启用 GPGPU 计算")]
    pub gpgpu_enabled: bool,
    #[schemars(title = "并行模式最大延迟帧数(-1 表示自动)")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_latency: Option<i32>,
    #[schemars(title = "是否启用夜视图像增强")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ienv_enabled: Option<bool>,
    #[schemars(title = "是否启用 OpenVINO")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openvino_enabled: Option<bool>,
    #[schemars(title = "OpenVINO 设备")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openvino_device: Option<String>,

    #[schemars(title = "检测最低分数")]
    pub detect_minscore: f64,
    #[schemars(title = "检测区域")]
    pub detect_roi: Roi,

    #[schemars(title = "是否返回无车牌车辆")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub car_noplate_detect_enabled: Option<bool>,
    #[schemars(title = "无车牌车辆检测最低分数")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub car_noplate_detect_min_score: Option<f64>,

    #[schemars(title = "是否启用金字塔搜索")]
    pub pyramidal_search_enabled: bool,
    #[schemars(title = "金字塔搜索灵敏度")]
    pub pyramidal_search_sensitivity: f64,
    #[schemars(title = "金字塔搜索最低分数")]
    pub pyramidal_search_minscore: f64,
    #[schemars(title = "触发金字塔搜索的最小图像尺寸(像素)")]
    pub pyramidal_search_min_image_size_inpixels: u32,

    #[schemars(title = "是否启用车牌国家识别")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub klass_lpci_enabled: Option<bool>,
    #[schemars(title = "是否启用车辆颜色识别")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub klass_vcr_enabled: Option<bool>,
    #[schemars(title = "是否启用车辆品牌型号识别")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub klass_vmmr_enabled: Option<bool>,
    #[schemars(title = "是否启用车身类型识别")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub klass_vbsr_enabled: Option<bool>,
    #[schemars(title = "车辆颜色识别伽马校正系数")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub klass_vcr_gamma: Option<f64>,

    #[schemars(title = "识别最低分数")]
    pub recogn_minscore: f64,
    #[schemars(title = "识别总分计算方式")]
    pub recogn_score_type: ScoreType,
    #[schemars(title = "是否启用矫正层")]
    pub recogn_rectify_enabled: bool,

    #[schemars(title = "资源目录")]
    pub assets_folder: String,
    #[schemars(title = "识别字符集")]
    pub charset: Charset,
    #[schemars(title = "许可证数据(base64)")]
    pub license_token_data: String,
    #[schemars(title = "许可证文件路径")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_token_file: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debug_level: DEFAULT_DEBUG_LEVEL,
            debug_write_input_image_enabled: DEFAULT_DEBUG_WRITE_INPUT_IMAGE,
            debug_internal_data_path: DEFAULT_DEBUG_INTERNAL_DATA_PATH.to_string(),

            num_threads: DEFAULT_NUM_THREADS,
            gpgpu_enabled: DEFAULT_GPGPU_ENABLED,
            max_latency: Some(DEFAULT_MAX_LATENCY),
            ienv_enabled: None,
            openvino_enabled: Some(DEFAULT_OPENVINO_ENABLED),
            openvino_device: Some(DEFAULT_OPENVINO_DEVICE.to_string()),

            detect_minscore: DEFAULT_DETECT_MINSCORE,
            detect_roi: DEFAULT_DETECT_ROI,

            car_noplate_detect_enabled: None,
            car_noplate_detect_min_score: None,

            pyramidal_search_enabled: DEFAULT_PYRAMIDAL_SEARCH_ENABLED,
            pyramidal_search_sensitivity: DEFAULT_PYRAMIDAL_SEARCH_SENSITIVITY,
            pyramidal_search_minscore: DEFAULT_PYRAMIDAL_SEARCH_MINSCORE,
            pyramidal_search_min_image_size_inpixels:
                DEFAULT_PYRAMIDAL_SEARCH_MIN_IMAGE_SIZE_INPIXELS,

            klass_lpci_enabled: Some(DEFAULT_KLASS_LPCI_ENABLED),
            klass_vcr_enabled: Some(DEFAULT_KLASS_VCR_ENABLED),
            klass_vmmr_enabled: Some(DEFAULT_KLASS_VMMR_ENABLED),
            klass_vbsr_enabled: None,
            klass_vcr_gamma: Some(DEFAULT_KLASS_VCR_GAMMA),

            recogn_minscore: DEFAULT_RECOGN_MINSCORE,
            recogn_score_type: DEFAULT_RECOGN_SCORE_TYPE,
            recogn_rectify_enabled: DEFAULT_RECOGN_RECTIFY_ENABLED,

            assets_folder: String::new(),
            charset: DEFAULT_CHARSET,
            license_token_data: String::new(),
            license_token_file: None,
        }
    }
}

/// 检查分数是否在 (0, 1] 区间
fn check_score(name: &str, value: f64) -> Result<()> {
    if !(value > 0.0 && value <= 1.0) {
        bail!("配置项 {} 的值 {} 超出范围 (0, 1]", name, value);
    }
    Ok(())
}

/// 检查比例是否在 [0, 1] 区间
fn check_ratio(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        bail!("配置项 {} 的值 {} 超出范围 [0, 1]", name, value);
    }
    Ok(())
}

impl EngineConfig {
    /// 从 YAML 文件加载配置, 文件中未出现的配置项使用默认值
    ///
    /// # 参数
    ///
    /// * `config_file` - 配置文件路径
    pub fn load(config_file: impl AsRef<Path>) -> Result<Self> {
        let config_file = config_file.as_ref();
        let config_data = fs::read(config_file)
            .with_context(|| format!("读取配置文件 {} 失败", config_file.display()))?;
        let config = Self::from_yaml(&config_data)?;
        debug!("已加载配置文件: {}", config_file.display());
        Ok(config)
    }

    /// 从 YAML 内容解析配置, 未知配置项会被忽略
    ///
    /// # 参数
    ///
    /// * `data` - YAML 内容
    pub fn from_yaml(data: &[u8]) -> Result<Self> {
        // 空文件按默认配置处理
        if data.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(Self::default());
        }
        serde_yaml::from_slice::<EngineConfig>(data).context("解析配置文件失败, 请检查格式是否正确")
    }

    /// 检查配置项取值范围
    pub fn validate(&self) -> Result<()> {
        check_score("detect_minscore", self.detect_minscore)?;
        check_score("recogn_minscore", self.recogn_minscore)?;
        check_score("pyramidal_search_minscore", self.pyramidal_search_minscore)?;
        check_ratio(
            "pyramidal_search_sensitivity",
            self.pyramidal_search_sensitivity,
        )?;
        if let Some(score) = self.car_noplate_detect_min_score {
            check_ratio("car_noplate_detect_min_score", score)?;
        }
        if let Some(gamma) = self.klass_vcr_gamma {
            if !(gamma >= 0.0) {
                bail!("配置项 klass_vcr_gamma 的值 {} 不能小于 0", gamma);
            }
        }

        let roi = &self.detect_roi;
        if roi.0.iter().any(|v| !(*v >= 0.0)) {
            bail!("检测区域 {:?} 不能包含负数", roi.0);
        }
        if !roi.is_disabled() && (roi.right() <= roi.left() || roi.bottom() <= roi.top()) {
            bail!(
                "检测区域 {:?} 无效, 需满足 right > left 且 bottom > top",
                roi.0
            );
        }
        Ok(())
    }

    /// 序列化为引擎读取的 JSON 文本
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("序列化引擎配置失败")
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    #[test]
    fn test_default_to_json() {
        let text = EngineConfig::default().to_json().unwrap();
        assert!(text.starts_with("{\"debug_level\":\"info\","));

        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            value,
            json!({
                "debug_level": "info",
                "debug_write_input_image_enabled": false,
                "debug_internal_data_path": ".",
                "num_threads": -1,
                "gpgpu_enabled": true,
                "max_latency": -1,
                "openvino_enabled": true,
                "openvino_device": "CPU",
                "detect_minscore": 0.3,
                "detect_roi": [0.0, 0.0, 0.0, 0.0],
                "pyramidal_search_enabled": true,
                "pyramidal_search_sensitivity": 0.33,
                "pyramidal_search_minscore": 0.3,
                "pyramidal_search_min_image_size_inpixels": 800,
                "klass_lpci_enabled": false,
                "klass_vcr_enabled": false,
                "klass_vmmr_enabled": false,
                "klass_vcr_gamma": 1.5,
                "recogn_minscore": 0.2,
                "recogn_score_type": "min",
                "recogn_rectify_enabled": false,
                "assets_folder": "",
                "charset": "latin",
                "license_token_data": ""
            })
        );
    }

    #[test]
    fn test_optional_keys_omitted() {
        let config = EngineConfig {
            max_latency: None,
            openvino_enabled: None,
            openvino_device: None,
            ..EngineConfig::default()
        };
        let text = config.to_json().unwrap();
        assert!(!text.contains("max_latency"));
        assert!(!text.contains("openvino"));
        assert!(!text.contains("null"));
    }

    #[test]
    fn test_from_yaml_partial() {
        let yaml = b"
recogn_score_type: median
detect_roi: [645, 1241, 301, 711]
klass_vbsr_enabled: true
some_future_option: 42
";
        let config = EngineConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.recogn_score_type, ScoreType::Median);
        assert_eq!(config.detect_roi, Roi::new(645.0, 1241.0, 301.0, 711.0));
        assert_eq!(config.klass_vbsr_enabled, Some(true));

        let expected = EngineConfig {
            recogn_score_type: ScoreType::Median,
            detect_roi: Roi::new(645.0, 1241.0, 301.0, 711.0),
            klass_vbsr_enabled: Some(true),
            ..EngineConfig::default()
        };
        assert_eq!(config, expected);
    }

    #[test]
    fn test_from_yaml_empty() {
        let config = EngineConfig::from_yaml(b"\n").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_load_missing_file() {
        let path = std::env::temp_dir().join("alpr-config-missing.yaml");
        let error = EngineConfig::load(&path).unwrap_err();
        assert!(error.to_string().contains("读取配置文件"));
    }

    #[test]
    fn test_validate_default() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn test_validate_score_out_of_range() {
        let config = EngineConfig {
            detect_minscore: 0.0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            recogn_minscore: 1.2,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            pyramidal_search_sensitivity: 0.0,
            ..EngineConfig::default()
        };
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_roi() {
        let config = EngineConfig {
            detect_roi: Roi::new(100.0, 50.0, 0.0, 10.0),
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            detect_roi: Roi::new(-1.0, 50.0, 0.0, 10.0),
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            detect_roi: Roi::new(645.0, 1241.0, 301.0, 711.0),
            ..EngineConfig::default()
        };
        config.validate().unwrap();
    }
}

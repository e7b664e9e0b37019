use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

//常用结构体

/// 检测区域
///
/// 序列化为 `[left, right, top, bottom]`, 全部为 0 时表示不限制检测区域
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[schemars(title = "检测区域 [left, right, top, bottom]")]
pub struct Roi(pub [f64; 4]);

impl Roi {
    /// 不限制检测区域
    pub const DISABLED: Roi = Roi([0.0; 4]);

    /// 创建检测区域
    ///
    /// # 参数
    ///
    /// - `left` - 左边界
    /// - `right` - 右边界
    /// - `top` - 上边界
    /// - `bottom` - 下边界
    pub fn new(left: f64, right: f64, top: f64, bottom: f64) -> Self {
        Roi([left, right, top, bottom])
    }

    pub fn left(&self) -> f64 {
        self.0[0]
    }

    pub fn right(&self) -> f64 {
        self.0[1]
    }

    pub fn top(&self) -> f64 {
        self.0[2]
    }

    pub fn bottom(&self) -> f64 {
        self.0[3]
    }

    /// 是否未启用检测区域
    pub fn is_disabled(&self) -> bool {
        self.0.iter().all(|v| *v == 0.0)
    }
}

/// 统一路径分隔符
///
/// Windows 下将 `\` 替换为 `/`, 其他平台原样返回
///
/// # 参数
///
/// - `path` - 路径
pub fn normalize_separators(path: &str) -> String {
    if cfg!(windows) {
        path.replace('\\', "/")
    } else {
        path.to_string()
    }
}

//! 词表存储的运行配置

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::model::data_core::StoreError;
use crate::model::table::DEFAULT_LANGUAGE_NAME;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// 快照文件路径
    pub snapshot_path: PathBuf,
    /// 没有快照时创建的默认语言名
    pub default_language_name: String,
    /// 首次运行时使用内置的示例词表
    pub use_bundled_seed: bool,
    /// 每次修改后立即保存
    pub autosave: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            snapshot_path: PathBuf::from("localization.json"),
            default_language_name: DEFAULT_LANGUAGE_NAME.to_string(),
            use_bundled_seed: true,
            autosave: true,
        }
    }
}

impl StoreConfig {
    /// 从JSON配置文件读取，未出现的字段取默认值
    pub fn from_file(path: &Path) -> Result<Self, StoreError> {
        let text = std::fs::read_to_string(path)?;
        let mut config: Self = serde_json::from_str(&text)?;
        if config.default_language_name.trim().is_empty() {
            tracing::warn!("配置中的默认语言名为空，改用 {}", DEFAULT_LANGUAGE_NAME);
            config.default_language_name = DEFAULT_LANGUAGE_NAME.to_string();
        }
        Ok(config)
    }
}

//! 多语言词表库
//!
//! 默认语言词表 + 各语言翻译列，按行号对齐，缺失翻译时回退到默认语言。
//! 提供词表存储、可见行视图与编辑会话三层

pub mod model;
pub mod utils;
pub mod vm;

// 重新导出主要类型
pub use model::data_core::{LoadSource, LocalizationStore, StoreError};
pub use model::table::{LanguageInfo, LocalizationData, WordColumn, MISSING_WORD};
pub use model::view_index::{ReorderError, ViewIndex};
pub use vm::session::EditSession;

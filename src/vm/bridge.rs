//! VM桥接层：编辑前端共用的状态文本
//!
//! 前端只负责展示，这里只提供公共常量

// === 常量定义（消除魔法值） ===
pub const STATUS_READY: &str = "就绪";
pub const STATUS_LOADED: &str = "词表加载完成";
pub const STATUS_SAVED: &str = "已保存";
pub const STATUS_UNSAVED: &str = "有未保存的修改";
pub const STATUS_FILTER_LOCKED: &str = "过滤中，不能拖动排序";
pub const STATUS_ERROR_PREFIX: &str = "错误: ";

//! 快照持久化：文件、内存两种实现 + 内置示例词表

use std::{
    cell::RefCell,
    path::{Path, PathBuf},
};

use crate::model::data_core::StoreError;
use crate::utils::fs::{read_snapshot_file, write_snapshot_file};

/// 首次运行时附带的示例词表
pub const BUNDLED_SEED: &str = include_str!("../../assets/localization.json");

/// 快照的读写来源。`load` 返回 None 表示尚无快照
pub trait SnapshotProvider {
    fn load(&self) -> Result<Option<Vec<u8>>, StoreError>;
    fn save(&self, bytes: &[u8]) -> Result<(), StoreError>;
}

/// 基于单个JSON文件的快照
#[derive(Debug, Clone)]
pub struct FileSnapshot {
    path: PathBuf,
}

impl FileSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotProvider for FileSnapshot {
    fn load(&self) -> Result<Option<Vec<u8>>, StoreError> {
        let bytes = read_snapshot_file(&self.path)?;
        match &bytes {
            Some(b) => tracing::debug!("读取快照: {} ({} 字节)", self.path.display(), b.len()),
            None => tracing::info!("快照文件不存在: {}", self.path.display()),
        }
        Ok(bytes)
    }

    fn save(&self, bytes: &[u8]) -> Result<(), StoreError> {
        write_snapshot_file(&self.path, bytes)?;
        tracing::info!("快照已保存到: {}", self.path.display());
        Ok(())
    }
}

/// 内存快照，用于嵌入场景与测试
#[derive(Debug, Default)]
pub struct MemorySnapshot {
    bytes: RefCell<Option<Vec<u8>>>,
    saves: RefCell<usize>,
}

impl MemorySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: RefCell::new(Some(bytes.into())),
            saves: RefCell::new(0),
        }
    }

    pub fn contents(&self) -> Option<Vec<u8>> {
        self.bytes.borrow().clone()
    }

    /// 已执行的保存次数
    pub fn save_count(&self) -> usize {
        *self.saves.borrow()
    }
}

impl SnapshotProvider for MemorySnapshot {
    fn load(&self) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.bytes.borrow().clone())
    }

    fn save(&self, bytes: &[u8]) -> Result<(), StoreError> {
        *self.bytes.borrow_mut() = Some(bytes.to_vec());
        *self.saves.borrow_mut() += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::table::LocalizationData;

    #[test]
    fn test_bundled_seed_is_rectangular() {
        let data = LocalizationData::from_slice(BUNDLED_SEED.as_bytes()).expect("内置词表应可解析");
        assert_eq!(data.languages.len(), 4);
        assert_eq!(data.words.len(), 4);
        assert!(data.words.iter().all(|c| c.len() == 5), "内置词表各列长度应一致");
    }

    #[test]
    fn test_file_snapshot_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FileSnapshot::new(dir.path().join("localization.json"));

        assert!(provider.load().unwrap().is_none());
        provider.save(b"{}").unwrap();
        assert_eq!(provider.load().unwrap().as_deref(), Some(&b"{}"[..]));
    }

    #[test]
    fn test_memory_snapshot_counts_saves() {
        let provider = MemorySnapshot::new();
        assert!(provider.load().unwrap().is_none());

        provider.save(b"a").unwrap();
        provider.save(b"b").unwrap();
        assert_eq!(provider.save_count(), 2);
        assert_eq!(provider.contents().as_deref(), Some(&b"b"[..]));
    }
}

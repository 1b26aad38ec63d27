//! IO helper: snapshot file read / atomic write

use std::{
    fs,
    io::{self, Write},
    path::Path,
};

use tempfile::NamedTempFile;

use crate::model::data_core::StoreError;

/// 读取快照文件，文件不存在时返回 None
pub fn read_snapshot_file(p: &Path) -> Result<Option<Vec<u8>>, StoreError> {
    match fs::read(p) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StoreError::Io(e)),
    }
}

/// 写入临时文件后整体替换，避免写到一半的快照
pub fn write_snapshot_file(p: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let parent = match p.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut temp_file = NamedTempFile::new_in(parent)?;
    temp_file.write_all(bytes)?;
    temp_file.as_file().sync_all()?;

    match temp_file.persist(p) {
        Ok(_) => Ok(()),
        Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => {
            fs::remove_file(p)?;
            err.file
                .persist(p)
                .map(|_| ())
                .map_err(|e| StoreError::Io(e.error))
        }
        Err(err) => Err(StoreError::Io(err.error)),
    }
}

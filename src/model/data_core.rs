//! LocalizationStore：多语言词表核心状态、默认词索引与回退查询

use std::cell::RefCell;
use std::collections::HashMap;

use thiserror::Error;

use crate::model::table::{
    LanguageInfo, LocalizationData, WordColumn, DEFAULT_LANGUAGE_INDEX, DEFAULT_LANGUAGE_NAME,
    MISSING_WORD,
};
use crate::utils::persistence::SnapshotProvider;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO失败: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON解析失败: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("无效索引: {index}（当前长度 {len}）")]
    InvalidIndex { index: usize, len: usize },
}

/// 启动加载走的是哪条路径
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// 读取已有快照
    Snapshot,
    /// 快照损坏或不可读，替换为空表
    Recovered,
    /// 使用内置示例词表
    Bundled,
    /// 新建单语言空表
    Seeded,
}

/// 词表存储：所有列始终等长，索引 0 为默认语言
#[derive(Debug, Default)]
pub struct LocalizationStore {
    languages: Vec<LanguageInfo>,
    columns: Vec<Vec<String>>,
    selected: usize,
    /// 去空白、忽略大小写后的默认词 -> 行号，重复词取第一次出现
    default_index: RefCell<HashMap<String, usize>>,
    dirty: bool,
}

fn lookup_key(word: &str) -> String {
    word.trim().to_lowercase()
}

fn is_untranslated(value: &str) -> bool {
    value.is_empty() || value == MISSING_WORD
}

impl LocalizationStore {
    /// 空表（没有任何语言）
    pub fn new() -> Self {
        Self::default()
    }

    /// 只有默认语言、没有词条的表
    pub fn with_default_language(name: &str) -> Self {
        Self::from_data(LocalizationData::with_default_language(name))
    }

    /// 从快照构建，不规整的快照在此修复
    pub fn from_data(data: LocalizationData) -> Self {
        Self::from_data_with_default(data, DEFAULT_LANGUAGE_NAME)
    }

    /// 同 `from_data`；快照有词列却没有语言时，以 `default_language_name` 补建默认语言
    fn from_data_with_default(mut data: LocalizationData, default_language_name: &str) -> Self {
        if data.languages.is_empty() && !data.words.is_empty() {
            tracing::warn!("快照缺少语言列表，补建默认语言 {}", default_language_name);
            data.languages.push(LanguageInfo::new(default_language_name));
        }

        let selected = usize::try_from(data.selected_language_index).unwrap_or(usize::MAX);
        let mut store = Self {
            languages: data.languages,
            columns: data.words.into_iter().map(|c| c.items).collect(),
            selected,
            default_index: RefCell::new(HashMap::new()),
            dirty: false,
        };
        if store.normalize() {
            tracing::warn!(
                "快照形状不规整，已修复为 {} 列 x {} 行",
                store.columns.len(),
                store.row_count()
            );
        }
        store.rebuild_default_index();
        store.dirty = false;
        store
    }

    /// 解析快照字节，损坏时替换为空表并继续
    pub fn from_snapshot_bytes(bytes: &[u8]) -> (Self, LoadSource) {
        Self::parse_snapshot(bytes, DEFAULT_LANGUAGE_NAME)
    }

    fn parse_snapshot(bytes: &[u8], default_language_name: &str) -> (Self, LoadSource) {
        match LocalizationData::from_slice(bytes) {
            Ok(data) => (
                Self::from_data_with_default(data, default_language_name),
                LoadSource::Snapshot,
            ),
            Err(e) => {
                tracing::warn!("快照解析失败，使用空表: {}", e);
                (Self::from_data(LocalizationData::default()), LoadSource::Recovered)
            }
        }
    }

    /// 启动加载：已有快照 -> 内置示例 -> 单语言空表
    ///
    /// 无论走哪条路径，返回的表至少包含默认语言，且各列等长。
    pub fn load_or_create(
        provider: &dyn SnapshotProvider,
        seed: Option<&[u8]>,
        default_language_name: &str,
    ) -> (Self, LoadSource) {
        let (mut store, source) = match provider.load() {
            Ok(Some(bytes)) => Self::parse_snapshot(&bytes, default_language_name),
            Ok(None) => {
                let seeded = seed.and_then(|bytes| match LocalizationData::from_slice(bytes) {
                    Ok(data) => Some(data),
                    Err(e) => {
                        tracing::warn!("内置词表解析失败，改用空表: {}", e);
                        None
                    }
                });
                let (mut store, source) = match seeded {
                    Some(data) => (Self::from_data(data), LoadSource::Bundled),
                    None => (
                        Self::with_default_language(default_language_name),
                        LoadSource::Seeded,
                    ),
                };
                if let Err(e) = store.save(provider) {
                    tracing::error!("初始词表保存失败: {}", e);
                }
                (store, source)
            }
            Err(e) => {
                tracing::error!("快照读取失败，使用空表: {}", e);
                (Self::from_data(LocalizationData::default()), LoadSource::Recovered)
            }
        };

        if store.languages.is_empty() {
            store.languages.push(LanguageInfo::new(default_language_name));
            store.normalize();
        }

        tracing::info!(
            "词表加载完成({:?}): {} 种语言，{} 个词条",
            source,
            store.language_count(),
            store.row_count()
        );
        (store, source)
    }

    /// 按快照格式写出，成功后清除脏标记
    pub fn save(&mut self, provider: &dyn SnapshotProvider) -> Result<(), StoreError> {
        let bytes = self.snapshot().to_pretty_bytes()?;
        provider.save(&bytes)?;
        self.dirty = false;
        Ok(())
    }

    pub fn snapshot(&self) -> LocalizationData {
        LocalizationData {
            languages: self.languages.clone(),
            words: self
                .columns
                .iter()
                .map(|items| WordColumn {
                    items: items.clone(),
                })
                .collect(),
            selected_language_index: self.selected as i64,
        }
    }

    // === 只读访问 ===

    pub fn languages(&self) -> &[LanguageInfo] {
        &self.languages
    }

    pub fn language_count(&self) -> usize {
        self.languages.len()
    }

    pub fn language_name(&self, index: usize) -> Option<&str> {
        self.languages.get(index).map(LanguageInfo::name)
    }

    pub fn column(&self, language_index: usize) -> Option<&[String]> {
        self.columns.get(language_index).map(Vec::as_slice)
    }

    pub fn word_at(&self, language_index: usize, row_index: usize) -> Option<&str> {
        self.columns
            .get(language_index)
            .and_then(|col| col.get(row_index))
            .map(String::as_str)
    }

    /// 行数以默认列为准
    pub fn row_count(&self) -> usize {
        self.columns
            .get(DEFAULT_LANGUAGE_INDEX)
            .map_or(0, Vec::len)
    }

    pub fn selected_language(&self) -> usize {
        self.selected
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_rectangular(&self) -> bool {
        let len = self.row_count();
        self.columns.len() == self.languages.len() && self.columns.iter().all(|c| c.len() == len)
    }

    // === 语言 ===

    /// 追加语言，新列用缺失占位填满。名称为空时忽略
    pub fn add_language(&mut self, name: &str) -> Option<usize> {
        if name.trim().is_empty() {
            tracing::warn!("忽略空白语言名");
            return None;
        }

        let rows = self.row_count();
        self.languages.push(LanguageInfo::new(name));
        self.columns.push(WordColumn::filled(rows).items);
        self.normalize();
        self.dirty = true;

        let index = self.languages.len() - 1;
        tracing::info!("添加语言: {} (索引 {})", name, index);
        Some(index)
    }

    /// 删除语言及其整列；默认语言不可删除
    pub fn remove_language(&mut self, index: usize) -> Result<(), StoreError> {
        if index == DEFAULT_LANGUAGE_INDEX || index >= self.languages.len() {
            tracing::warn!("拒绝删除语言: 索引 {}", index);
            return Err(StoreError::InvalidIndex {
                index,
                len: self.languages.len(),
            });
        }

        let removed = self.languages.remove(index);
        if index < self.columns.len() {
            self.columns.remove(index);
        }

        if self.selected == index {
            self.selected = DEFAULT_LANGUAGE_INDEX;
        } else if self.selected > index {
            self.selected -= 1;
        }

        self.normalize();
        self.dirty = true;
        tracing::info!("删除语言: {} (索引 {})", removed.name, index);
        Ok(())
    }

    /// 切换当前语言，越界时忽略
    pub fn set_selected_language(&mut self, index: usize) -> bool {
        if index >= self.languages.len() {
            return false;
        }
        if self.selected != index {
            self.selected = index;
            self.dirty = true;
        }
        true
    }

    // === 词条 ===

    /// 默认列追加词条，其他列同时追加缺失占位，返回新行号
    pub fn add_word_to_default(&mut self, word: &str) -> usize {
        if self.languages.is_empty() {
            tracing::info!("表中没有语言，补建默认语言 {}", DEFAULT_LANGUAGE_NAME);
            self.languages.push(LanguageInfo::new(DEFAULT_LANGUAGE_NAME));
        }
        self.normalize();

        let new_index = self.row_count();
        for (l, column) in self.columns.iter_mut().enumerate() {
            if l == DEFAULT_LANGUAGE_INDEX {
                column.push(word.to_string());
            } else {
                column.push(MISSING_WORD.to_string());
            }
        }
        self.dirty = true;

        let key = lookup_key(word);
        if !key.is_empty() {
            self.default_index
                .borrow_mut()
                .entry(key)
                .or_insert(new_index);
        }
        new_index
    }

    /// 从所有列删除一行；行号超出所有列时不做任何事
    pub fn remove_word_at(&mut self, row_index: usize) -> bool {
        let mut removed = false;
        for column in &mut self.columns {
            if row_index < column.len() {
                column.remove(row_index);
                removed = true;
            }
        }
        if !removed {
            return false;
        }

        self.normalize();
        self.rebuild_default_index();
        self.dirty = true;
        tracing::debug!("删除第 {} 行", row_index);
        true
    }

    /// 按语言与行号写入单元格，任一索引越界时忽略
    pub fn set_word_at(&mut self, language_index: usize, row_index: usize, value: &str) -> bool {
        if language_index >= self.languages.len() {
            return false;
        }
        let Some(cell) = self
            .columns
            .get_mut(language_index)
            .and_then(|col| col.get_mut(row_index))
        else {
            return false;
        };
        if cell == value {
            return false;
        }

        *cell = value.to_string();
        self.dirty = true;
        if language_index == DEFAULT_LANGUAGE_INDEX {
            self.rebuild_default_index();
        }
        true
    }

    /// 按给定顺序重排所有列：新第 i 行取原第 `order[i]` 行
    ///
    /// `order` 必须恰好是 `0..row_count` 的一个排列，否则不做任何修改。
    pub fn reorder_rows(&mut self, order: &[usize]) -> bool {
        if !is_permutation(order, self.row_count()) {
            tracing::warn!("重排被拒绝: 不是 0..{} 的排列", self.row_count());
            return false;
        }
        if order.iter().enumerate().all(|(i, &r)| i == r) {
            return true;
        }

        for column in &mut self.columns {
            let reordered: Vec<String> = order
                .iter()
                .map(|&r| std::mem::take(&mut column[r]))
                .collect();
            *column = reordered;
        }
        self.rebuild_default_index();
        self.dirty = true;
        true
    }

    /// 修复列形状：列数与语言数一致，短列在末尾补缺失占位。幂等
    ///
    /// 返回是否做了修改。
    pub fn normalize(&mut self) -> bool {
        let mut changed = false;

        if self.columns.len() > self.languages.len() {
            tracing::warn!(
                "丢弃 {} 个没有对应语言的词列",
                self.columns.len() - self.languages.len()
            );
            self.columns.truncate(self.languages.len());
            changed = true;
        }
        while self.columns.len() < self.languages.len() {
            self.columns.push(Vec::new());
            changed = true;
        }

        let max_len = self.columns.iter().map(Vec::len).max().unwrap_or(0);
        for column in &mut self.columns {
            if column.len() < max_len {
                column.resize(max_len, MISSING_WORD.to_string());
                changed = true;
            }
        }

        if self.selected >= self.languages.len() {
            if self.selected != DEFAULT_LANGUAGE_INDEX {
                changed = true;
            }
            self.selected = DEFAULT_LANGUAGE_INDEX;
        }

        if changed {
            self.rebuild_default_index();
        }
        changed
    }

    // === 查询 ===

    /// 以默认语言词条查询当前语言的翻译；找不到时原样返回输入
    pub fn get<'a>(&'a self, word: &'a str) -> &'a str {
        if word.is_empty() {
            return "";
        }

        let key = lookup_key(word);
        let cached = self.default_index.borrow().get(&key).copied();
        let index = match cached {
            Some(index) => index,
            None => match self.find_index_in_default(word) {
                Some(index) => {
                    self.default_index.borrow_mut().insert(key, index);
                    index
                }
                None => return word,
            },
        };
        self.get_by_index(index)
    }

    /// 读取当前语言第 `row_index` 行：当前语言 -> 默认语言 -> 空串
    ///
    /// 空字符串与缺失占位同样视为未翻译。
    pub fn get_by_index(&self, row_index: usize) -> &str {
        if self.selected >= self.languages.len() {
            return "";
        }
        let Some(value) = self.word_at(self.selected, row_index) else {
            return "";
        };
        if is_untranslated(value) {
            return self
                .word_at(DEFAULT_LANGUAGE_INDEX, row_index)
                .unwrap_or("");
        }
        value
    }

    /// 在默认列中线性查找（去空白、忽略大小写的完全匹配）
    pub fn find_index_in_default(&self, word: &str) -> Option<usize> {
        let key = lookup_key(word);
        self.column(DEFAULT_LANGUAGE_INDEX)?
            .iter()
            .position(|item| lookup_key(item) == key)
    }

    /// 默认列中包含 `needle` 的所有词条
    pub fn search_in_default(&self, needle: &str, case_sensitive: bool) -> Vec<(usize, &str)> {
        let Some(column) = self.column(DEFAULT_LANGUAGE_INDEX) else {
            return Vec::new();
        };

        let folded = needle.to_lowercase();
        column
            .iter()
            .enumerate()
            .filter(|(_, word)| {
                if case_sensitive {
                    word.contains(needle)
                } else {
                    word.to_lowercase().contains(&folded)
                }
            })
            .map(|(i, word)| (i, word.as_str()))
            .collect()
    }

    fn rebuild_default_index(&self) {
        let mut index = self.default_index.borrow_mut();
        index.clear();
        let Some(column) = self.columns.get(DEFAULT_LANGUAGE_INDEX) else {
            return;
        };
        for (i, word) in column.iter().enumerate() {
            let key = lookup_key(word);
            if !key.is_empty() {
                index.entry(key).or_insert(i);
            }
        }
    }
}

/// `order` 是否为 `0..len` 的排列
pub(crate) fn is_permutation(order: &[usize], len: usize) -> bool {
    if order.len() != len {
        return false;
    }
    let mut seen = vec![false; len];
    for &r in order {
        if r >= len || seen[r] {
            return false;
        }
        seen[r] = true;
    }
    true
}

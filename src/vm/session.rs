//! EditSession：编辑前端的视图模型（过滤状态、拖动开关、两阶段删除）

use crate::model::data_core::{LocalizationStore, StoreError};
use crate::model::table::DEFAULT_LANGUAGE_INDEX;
use crate::model::view_index::{ReorderError, ViewIndex};
use crate::utils::persistence::SnapshotProvider;
use crate::vm::bridge::{
    STATUS_ERROR_PREFIX, STATUS_FILTER_LOCKED, STATUS_READY, STATUS_SAVED, STATUS_UNSAVED,
};

/// 遍历期间登记、遍历结束后统一执行的删除
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingEdit {
    RemoveWord(usize),
    RemoveLanguage(usize),
}

#[derive(Debug)]
pub struct EditSession {
    filter_text: String,
    filter_language: usize,
    pending: Vec<PendingEdit>,
    status: String,
}

impl Default for EditSession {
    fn default() -> Self {
        Self {
            filter_text: String::new(),
            filter_language: DEFAULT_LANGUAGE_INDEX,
            pending: Vec::new(),
            status: STATUS_READY.to_string(),
        }
    }
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter_text(&self) -> &str {
        &self.filter_text
    }

    pub fn filter_language(&self) -> usize {
        self.filter_language
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// 设置过滤语言与过滤词，语言越界时退回默认语言
    pub fn set_filter(&mut self, store: &LocalizationStore, language: usize, text: &str) {
        self.filter_text = text.to_string();
        self.filter_language = language;
        self.clamp_filter_language(store);
    }

    pub fn clear_filter(&mut self) {
        self.filter_text.clear();
    }

    /// 当前过滤条件下的可见行
    pub fn view(&self, store: &LocalizationStore) -> ViewIndex {
        ViewIndex::filtered(store, &self.filter_text, self.filter_language)
    }

    /// 过滤词非空时禁止拖动
    pub fn is_drag_enabled(&self) -> bool {
        self.filter_text.trim().is_empty()
    }

    // === 两阶段删除 ===

    pub fn queue_remove_word(&mut self, row_index: usize) {
        self.queue(PendingEdit::RemoveWord(row_index));
    }

    pub fn queue_remove_language(&mut self, language_index: usize) {
        self.queue(PendingEdit::RemoveLanguage(language_index));
    }

    pub fn pending(&self) -> &[PendingEdit] {
        &self.pending
    }

    fn queue(&mut self, edit: PendingEdit) {
        if !self.pending.contains(&edit) {
            self.pending.push(edit);
        }
    }

    /// 执行登记的删除：先删语言再删行，各自按索引从大到小，索引不会互相错位
    ///
    /// 返回实际生效的删除数量。
    pub fn apply_pending(&mut self, store: &mut LocalizationStore) -> usize {
        let pending = std::mem::take(&mut self.pending);

        let mut languages: Vec<usize> = pending
            .iter()
            .filter_map(|e| match e {
                PendingEdit::RemoveLanguage(i) => Some(*i),
                PendingEdit::RemoveWord(_) => None,
            })
            .collect();
        let mut rows: Vec<usize> = pending
            .iter()
            .filter_map(|e| match e {
                PendingEdit::RemoveWord(r) => Some(*r),
                PendingEdit::RemoveLanguage(_) => None,
            })
            .collect();
        languages.sort_unstable_by(|a, b| b.cmp(a));
        rows.sort_unstable_by(|a, b| b.cmp(a));

        let mut applied = 0;
        for index in languages {
            match self.remove_language(store, index) {
                Ok(()) => applied += 1,
                Err(e) => tracing::warn!("跳过登记的语言删除: {}", e),
            }
        }
        for row in rows {
            if store.remove_word_at(row) {
                applied += 1;
            }
        }

        if applied > 0 {
            self.status = STATUS_UNSAVED.to_string();
        }
        applied
    }

    /// 删除语言并修正过滤语言
    pub fn remove_language(
        &mut self,
        store: &mut LocalizationStore,
        index: usize,
    ) -> Result<(), StoreError> {
        let result = store.remove_language(index);
        match &result {
            Ok(()) => {
                if self.filter_language == index {
                    self.filter_language = DEFAULT_LANGUAGE_INDEX;
                } else if self.filter_language > index {
                    self.filter_language -= 1;
                }
                self.clamp_filter_language(store);
                self.status = STATUS_UNSAVED.to_string();
            }
            Err(e) => self.status = format!("{}{}", STATUS_ERROR_PREFIX, e),
        }
        result
    }

    // === 排序 ===

    /// 提交整表的新行序，过滤生效时拒绝
    pub fn commit_reorder(
        &mut self,
        store: &mut LocalizationStore,
        view: &ViewIndex,
        new_order: &[usize],
    ) -> Result<(), ReorderError> {
        if !self.is_drag_enabled() {
            self.status = STATUS_FILTER_LOCKED.to_string();
            return Err(ReorderError::FilterActive);
        }
        match ViewIndex::apply_reorder(store, view, new_order) {
            Ok(()) => {
                self.status = STATUS_UNSAVED.to_string();
                Ok(())
            }
            Err(e) => {
                self.status = format!("{}{}", STATUS_ERROR_PREFIX, e);
                Err(e)
            }
        }
    }

    /// 把可见位置 `from` 的行拖到 `to`
    pub fn move_row(
        &mut self,
        store: &mut LocalizationStore,
        from: usize,
        to: usize,
    ) -> Result<(), ReorderError> {
        let view = self.view(store);
        let Some(order) = view.moved(from, to) else {
            return Err(ReorderError::NotAPermutation);
        };
        self.commit_reorder(store, &view, &order)
    }

    // === 保存 ===

    pub fn save(
        &mut self,
        store: &mut LocalizationStore,
        provider: &dyn SnapshotProvider,
    ) -> Result<(), StoreError> {
        match store.save(provider) {
            Ok(()) => {
                self.status = STATUS_SAVED.to_string();
                Ok(())
            }
            Err(e) => {
                tracing::error!("词表保存失败: {}", e);
                self.status = format!("{}{}", STATUS_ERROR_PREFIX, e);
                Err(e)
            }
        }
    }

    fn clamp_filter_language(&mut self, store: &LocalizationStore) {
        if self.filter_language >= store.language_count() {
            self.filter_language = DEFAULT_LANGUAGE_INDEX;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::table::MISSING_WORD;
    use crate::utils::persistence::MemorySnapshot;

    fn store_with_rows(words: &[&str]) -> LocalizationStore {
        let mut store = LocalizationStore::with_default_language("English");
        store.add_language("Turkish");
        store.add_language("Deutsch");
        for word in words {
            store.add_word_to_default(word);
        }
        store
    }

    #[test]
    fn test_filter_disables_drag() {
        let mut store = store_with_rows(&["Hello", "Quit", "Help"]);
        let mut session = EditSession::new();
        assert!(session.is_drag_enabled());

        session.set_filter(&store, 0, "he");
        assert!(!session.is_drag_enabled());
        assert_eq!(session.view(&store).rows(), &[0, 2]);

        let before = store.snapshot();
        let result = session.move_row(&mut store, 0, 1);
        assert_eq!(result, Err(ReorderError::FilterActive));
        assert_eq!(session.status(), STATUS_FILTER_LOCKED);
        assert_eq!(store.snapshot(), before, "过滤中不应修改行序");

        session.clear_filter();
        session.move_row(&mut store, 0, 2).unwrap();
        assert_eq!(store.column(0).unwrap(), &["Quit", "Help", "Hello"]);
    }

    #[test]
    fn test_commit_reorder_rejects_filtered_session_with_unfiltered_view() {
        let mut store = store_with_rows(&["a", "b"]);
        let view = ViewIndex::identity(&store);
        let mut session = EditSession::new();
        session.set_filter(&store, 0, "a");

        assert_eq!(
            session.commit_reorder(&mut store, &view, &[1, 0]),
            Err(ReorderError::FilterActive)
        );
    }

    #[test]
    fn test_two_phase_row_removal() {
        let mut store = store_with_rows(&["a", "b", "c", "d"]);
        let mut session = EditSession::new();

        for row in session.view(&store).rows().to_vec() {
            if row % 2 == 0 {
                session.queue_remove_word(row);
            }
        }
        session.queue_remove_word(0);
        assert_eq!(session.pending().len(), 2, "重复登记应被忽略");
        assert_eq!(store.row_count(), 4, "登记阶段不修改词表");

        assert_eq!(session.apply_pending(&mut store), 2);
        assert_eq!(store.column(0).unwrap(), &["b", "d"]);
        assert!(store.is_rectangular());
        assert!(session.pending().is_empty());
        assert_eq!(session.status(), STATUS_UNSAVED);
    }

    #[test]
    fn test_two_phase_language_removal_skips_default() {
        let mut store = store_with_rows(&["a"]);
        let mut session = EditSession::new();
        session.queue_remove_language(0);
        session.queue_remove_language(1);
        session.queue_remove_language(2);

        assert_eq!(session.apply_pending(&mut store), 2);
        assert_eq!(store.language_count(), 1);
        assert_eq!(store.language_name(0), Some("English"));
    }

    #[test]
    fn test_remove_language_reclamps_filter_language() {
        let mut store = store_with_rows(&["a"]);
        let mut session = EditSession::new();

        session.set_filter(&store, 2, "x");
        session.remove_language(&mut store, 1).unwrap();
        assert_eq!(session.filter_language(), 1, "应继续指向 Deutsch");

        session.remove_language(&mut store, 1).unwrap();
        assert_eq!(session.filter_language(), 0);

        assert!(session.remove_language(&mut store, 0).is_err());
        assert!(session.status().starts_with(STATUS_ERROR_PREFIX));
    }

    #[test]
    fn test_set_filter_clamps_language() {
        let store = store_with_rows(&["a"]);
        let mut session = EditSession::new();
        session.set_filter(&store, 9, MISSING_WORD);
        assert_eq!(session.filter_language(), 0);
    }

    #[test]
    fn test_save_updates_status() {
        let mut store = store_with_rows(&["a"]);
        let provider = MemorySnapshot::new();
        let mut session = EditSession::new();

        session.save(&mut store, &provider).unwrap();
        assert_eq!(session.status(), STATUS_SAVED);
        assert!(!store.is_dirty());
        assert_eq!(provider.save_count(), 1);
    }
}

//! 视图索引：可见行位置 -> 底层行号的投影，以及拖动排序的回写

use thiserror::Error;

use crate::model::data_core::{is_permutation, LocalizationStore};
use crate::model::table::DEFAULT_LANGUAGE_INDEX;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReorderError {
    #[error("过滤条件生效时不能拖动排序")]
    FilterActive,
    #[error("新顺序不是当前视图行的排列")]
    NotAPermutation,
    #[error("视图已过期: 视图 {view_len} 行，词表 {row_count} 行")]
    StaleView { view_len: usize, row_count: usize },
}

/// 可见行的底层行号序列。只读取词表，不持有任何数据
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewIndex {
    rows: Vec<usize>,
    filtered: bool,
}

impl ViewIndex {
    /// 未过滤的视图 `[0, 1, .., row_count-1]`
    pub fn identity(store: &LocalizationStore) -> Self {
        Self {
            rows: (0..store.row_count()).collect(),
            filtered: false,
        }
    }

    /// 按谓词过滤指定语言列，结果按底层行号升序
    ///
    /// 没有谓词时返回恒等视图；语言索引越界时退回默认语言。
    pub fn build(
        store: &LocalizationStore,
        predicate: Option<&dyn Fn(&str) -> bool>,
        filter_language: Option<usize>,
    ) -> Self {
        let Some(predicate) = predicate else {
            return Self::identity(store);
        };

        let language = filter_language
            .filter(|&l| l < store.language_count())
            .unwrap_or(DEFAULT_LANGUAGE_INDEX);
        let rows = (0..store.row_count())
            .filter(|&r| predicate(store.word_at(language, r).unwrap_or("")))
            .collect();
        Self {
            rows,
            filtered: true,
        }
    }

    /// 编辑器的子串过滤：去空白、忽略大小写；过滤词为空时不过滤
    pub fn filtered(store: &LocalizationStore, needle: &str, filter_language: usize) -> Self {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return Self::identity(store);
        }
        let contains = |word: &str| word.to_lowercase().contains(&needle);
        Self::build(store, Some(&contains), Some(filter_language))
    }

    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 可见位置对应的底层行号
    pub fn underlying(&self, position: usize) -> Option<usize> {
        self.rows.get(position).copied()
    }

    /// 底层行号在视图中的位置
    pub fn position_of(&self, row: usize) -> Option<usize> {
        self.rows.iter().position(|&r| r == row)
    }

    pub fn is_filtered(&self) -> bool {
        self.filtered
    }

    /// 只有未过滤的视图允许拖动
    pub fn is_drag_enabled(&self) -> bool {
        !self.filtered
    }

    /// 把位置 `from` 的行拖到位置 `to` 后的新顺序
    pub fn moved(&self, from: usize, to: usize) -> Option<Vec<usize>> {
        if from >= self.rows.len() || to >= self.rows.len() {
            return None;
        }
        let mut order = self.rows.clone();
        let row = order.remove(from);
        order.insert(to, row);
        Some(order)
    }

    /// 提交拖动排序：每一列重建为 `[col[new_order[0]], col[new_order[1]], ..]`
    ///
    /// 只接受未过滤且与词表行数一致的视图，`new_order` 必须是视图行的排列。
    /// 出错时词表保持不变。成功后旧视图不再反映行序，需要重新构建。
    pub fn apply_reorder(
        store: &mut LocalizationStore,
        view: &ViewIndex,
        new_order: &[usize],
    ) -> Result<(), ReorderError> {
        if view.filtered {
            return Err(ReorderError::FilterActive);
        }
        let row_count = store.row_count();
        if view.rows.len() != row_count {
            return Err(ReorderError::StaleView {
                view_len: view.rows.len(),
                row_count,
            });
        }
        if !is_permutation(new_order, row_count) {
            return Err(ReorderError::NotAPermutation);
        }

        store.reorder_rows(new_order);
        tracing::info!("行顺序已更新: {} 行", row_count);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::table::MISSING_WORD;

    fn fruit_store() -> LocalizationStore {
        let mut store = LocalizationStore::with_default_language("English");
        store.add_language("Turkish");
        for (word, tr) in [("apple", "elma"), ("banana", "muz"), ("avocado", "avokado")] {
            let row = store.add_word_to_default(word);
            store.set_word_at(1, row, tr);
        }
        store
    }

    fn permutations(n: usize) -> Vec<Vec<usize>> {
        if n == 0 {
            return vec![Vec::new()];
        }
        let mut out = Vec::new();
        for p in permutations(n - 1) {
            for i in 0..=p.len() {
                let mut q = p.clone();
                q.insert(i, n - 1);
                out.push(q);
            }
        }
        out
    }

    #[test]
    fn test_identity_view() {
        let store = fruit_store();
        let view = ViewIndex::build(&store, None, Some(1));
        assert_eq!(view.rows(), &[0, 1, 2]);
        assert!(view.is_drag_enabled());
        assert!(ViewIndex::identity(&LocalizationStore::new()).is_empty());
    }

    #[test]
    fn test_substring_filter() {
        let mut store = fruit_store();
        store.add_word_to_default("grape");

        let view = ViewIndex::filtered(&store, "ap", 0);
        assert_eq!(view.rows(), &[0, 3], "应按底层行号升序");

        // "apple" 不包含 "av"
        let view = ViewIndex::filtered(&store, "av", 0);
        assert_eq!(view.rows(), &[2]);
    }

    #[test]
    fn test_filter_is_case_insensitive_and_trimmed() {
        let store = fruit_store();
        let view = ViewIndex::filtered(&store, "  AV ", 0);
        assert_eq!(view.rows(), &[2]);
        assert!(!view.is_drag_enabled());

        let blank = ViewIndex::filtered(&store, "   ", 1);
        assert_eq!(blank.rows(), &[0, 1, 2]);
        assert!(blank.is_drag_enabled(), "空过滤词不算过滤");
    }

    #[test]
    fn test_filter_on_translation_column() {
        let store = fruit_store();
        let view = ViewIndex::filtered(&store, "MU", 1);
        assert_eq!(view.rows(), &[1]);
        assert_eq!(view.underlying(0), Some(1));
        assert_eq!(view.position_of(1), Some(0));
        assert_eq!(view.position_of(0), None);
    }

    #[test]
    fn test_filter_language_out_of_range_clamps_to_default() {
        let store = fruit_store();
        let view = ViewIndex::filtered(&store, "banana", 42);
        assert_eq!(view.rows(), &[1]);
    }

    #[test]
    fn test_custom_predicate() {
        let mut store = fruit_store();
        store.add_word_to_default("cherry");
        let missing = |w: &str| w == MISSING_WORD;
        let view = ViewIndex::build(&store, Some(&missing), Some(1));
        assert_eq!(view.rows(), &[3]);
    }

    #[test]
    fn test_moved() {
        let store = fruit_store();
        let view = ViewIndex::identity(&store);
        assert_eq!(view.moved(0, 2), Some(vec![1, 2, 0]));
        assert_eq!(view.moved(2, 0), Some(vec![2, 0, 1]));
        assert_eq!(view.moved(1, 1), Some(vec![0, 1, 2]));
        assert_eq!(view.moved(3, 0), None);
    }

    #[test]
    fn test_reorder_any_permutation_preserves_cells() {
        for order in permutations(3) {
            let mut store = fruit_store();
            let before = store.snapshot();
            let view = ViewIndex::identity(&store);

            ViewIndex::apply_reorder(&mut store, &view, &order).expect("排列应被接受");

            for l in 0..store.language_count() {
                for (new_pos, &old) in order.iter().enumerate() {
                    assert_eq!(
                        store.word_at(l, new_pos),
                        Some(before.words[l].items[old].as_str()),
                        "排列 {:?} 的第 {} 列不一致",
                        order,
                        l
                    );
                }
                let mut a = before.words[l].items.clone();
                let mut b = store.column(l).unwrap().to_vec();
                a.sort();
                b.sort();
                assert_eq!(a, b, "单元格集合不应改变");
            }
        }
    }

    #[test]
    fn test_reorder_keeps_lookup_consistent() {
        let mut store = fruit_store();
        store.set_selected_language(1);
        let view = ViewIndex::identity(&store);
        let order = view.moved(0, 2).unwrap();

        ViewIndex::apply_reorder(&mut store, &view, &order).unwrap();
        assert_eq!(store.column(0).unwrap(), &["banana", "avocado", "apple"]);
        assert_eq!(store.find_index_in_default("apple"), Some(2));
        assert_eq!(store.get("Apple"), "elma");
    }

    #[test]
    fn test_reorder_rejected_while_filtered() {
        let mut store = fruit_store();
        let before = store.snapshot();
        let view = ViewIndex::filtered(&store, "a", 0);

        let result = ViewIndex::apply_reorder(&mut store, &view, &[2, 1, 0]);
        assert_eq!(result, Err(ReorderError::FilterActive));
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_reorder_rejects_invented_or_dropped_rows() {
        let mut store = fruit_store();
        let before = store.snapshot();
        let view = ViewIndex::identity(&store);

        for bad in [&[0, 1][..], &[0, 1, 1], &[0, 1, 3], &[0, 1, 2, 3]] {
            assert_eq!(
                ViewIndex::apply_reorder(&mut store, &view, bad),
                Err(ReorderError::NotAPermutation)
            );
        }
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_reorder_rejects_stale_view() {
        let mut store = fruit_store();
        let view = ViewIndex::identity(&store);
        store.add_word_to_default("cherry");

        assert_eq!(
            ViewIndex::apply_reorder(&mut store, &view, &[0, 1, 2]),
            Err(ReorderError::StaleView {
                view_len: 3,
                row_count: 4
            })
        );
    }
}

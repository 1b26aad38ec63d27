//! 性能基准测试模块
//!
//! 用于测量大词表的规整、查询、过滤与重排耗时

use std::time::Instant;

use crate::model::data_core::LocalizationStore;
use crate::model::table::{LanguageInfo, LocalizationData, WordColumn, MISSING_WORD};
use crate::model::view_index::ViewIndex;

/// 性能测试结果
#[derive(Debug)]
pub struct PerformanceResult {
    pub operation: String,
    pub duration_ms: u128,
    pub success: bool,
    pub details: String,
}

impl PerformanceResult {
    pub fn new(operation: &str, duration_ms: u128, success: bool, details: &str) -> Self {
        Self {
            operation: operation.to_string(),
            duration_ms,
            success,
            details: details.to_string(),
        }
    }
}

/// 生成测试词表：每隔几行留一个缺失翻译，最后一列故意短一截
pub fn generate_large_table(rows: usize, languages: usize) -> LocalizationData {
    let languages = languages.max(1);
    let mut data = LocalizationData {
        languages: (0..languages)
            .map(|l| LanguageInfo::new(format!("语言_{}", l)))
            .collect(),
        words: Vec::with_capacity(languages),
        selected_language_index: (languages - 1) as i64,
    };

    for l in 0..languages {
        let len = if l > 0 && l == languages - 1 { rows / 2 } else { rows };
        let items = (0..len)
            .map(|r| match (l, r % 7) {
                (0, _) => format!("word_{}", r),
                (_, 3) => MISSING_WORD.to_string(),
                _ => format!("翻译_{}_{}", l, r),
            })
            .collect();
        data.words.push(WordColumn { items });
    }
    data
}

fn timed<T>(f: impl FnOnce() -> T) -> (T, u128) {
    let start = Instant::now();
    let value = f();
    (value, start.elapsed().as_millis())
}

/// 测试加载（含规整与索引构建）性能
pub fn benchmark_load(data: LocalizationData) -> (LocalizationStore, PerformanceResult) {
    let (store, ms) = timed(|| LocalizationStore::from_data(data));
    let result = PerformanceResult::new(
        "词表加载",
        ms,
        store.is_rectangular(),
        &format!("{} 种语言 x {} 行", store.language_count(), store.row_count()),
    );
    (store, result)
}

/// 测试按默认词查询的性能
pub fn benchmark_lookup(store: &LocalizationStore, samples: usize) -> PerformanceResult {
    let rows = store.row_count().max(1);
    let (hits, ms) = timed(|| {
        (0..samples)
            .filter(|i| {
                let key = format!("WORD_{}", i % rows);
                store.get(&key) != key
            })
            .count()
    });
    PerformanceResult::new(
        "默认词查询",
        ms,
        store.row_count() == 0 || hits == samples,
        &format!("{} 次查询，命中 {}", samples, hits),
    )
}

/// 测试过滤视图构建性能
pub fn benchmark_filter(store: &LocalizationStore, needle: &str) -> PerformanceResult {
    let (view, ms) = timed(|| ViewIndex::filtered(store, needle, store.selected_language()));
    PerformanceResult::new(
        &format!("过滤视图: {}", needle),
        ms,
        view.len() <= store.row_count(),
        &format!("可见 {} 行", view.len()),
    )
}

/// 测试整表反转重排性能
pub fn benchmark_reorder(store: &mut LocalizationStore) -> PerformanceResult {
    let view = ViewIndex::identity(store);
    let order: Vec<usize> = view.rows().iter().rev().copied().collect();
    let (result, ms) = timed(|| ViewIndex::apply_reorder(store, &view, &order));
    PerformanceResult::new(
        "整表重排",
        ms,
        result.is_ok(),
        &format!("{} 行", order.len()),
    )
}

/// 运行综合性能测试
pub fn run_performance_suite() -> Vec<PerformanceResult> {
    let mut results = Vec::new();

    // 小型 / 中型 / 大型
    let test_cases = [(1_000, 4), (10_000, 8), (50_000, 16)];

    for (rows, languages) in test_cases {
        tracing::info!("测试规模：{} 行，{} 种语言", rows, languages);

        let (data, gen_ms) = timed(|| generate_large_table(rows, languages));
        results.push(PerformanceResult::new(
            &format!("数据生成({}x{})", rows, languages),
            gen_ms,
            true,
            &format!("{} 列", data.words.len()),
        ));

        let (mut store, load) = benchmark_load(data);
        results.push(load);
        results.push(benchmark_lookup(&store, rows));
        results.push(benchmark_filter(&store, "_1"));
        results.push(benchmark_reorder(&mut store));
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_large_table_is_ragged() {
        let data = generate_large_table(10, 3);
        assert_eq!(data.languages.len(), 3);
        assert_eq!(data.words[0].len(), 10);
        assert_eq!(data.words[2].len(), 5, "最后一列应短一截，用来测试规整");
    }

    #[test]
    fn test_performance_benchmarks() {
        let (mut store, load) = benchmark_load(generate_large_table(500, 3));
        assert!(load.success);
        assert!(load.duration_ms < 1000); // 应该在1秒内完成

        let lookup = benchmark_lookup(&store, 500);
        assert!(lookup.success, "{}", lookup.details);

        let filter = benchmark_filter(&store, "_1");
        assert!(filter.success);

        let reorder = benchmark_reorder(&mut store);
        assert!(reorder.success);
        assert_eq!(store.word_at(0, 0), Some("word_499"));
    }
}

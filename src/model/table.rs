//! 快照数据类型：语言列表 + 与之平行的词列，按位置对齐

use serde::{Deserialize, Deserializer, Serialize};

/// 缺失翻译的占位值（与空字符串区分）
pub const MISSING_WORD: &str = "__MISSING__";

/// 默认语言固定在索引 0
pub const DEFAULT_LANGUAGE_INDEX: usize = 0;

/// 没有任何语言时补种的默认语言名
pub const DEFAULT_LANGUAGE_NAME: &str = "English";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageInfo {
    #[serde(default)]
    pub name: String,
}

impl LanguageInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// 单个语言的一列词条
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordColumn {
    #[serde(default, deserialize_with = "nullable_items")]
    pub items: Vec<String>,
}

impl WordColumn {
    pub fn filled(len: usize) -> Self {
        Self {
            items: vec![MISSING_WORD.to_string(); len],
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// 持久化快照：`words[i]` 对应 `languages[i]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizationData {
    #[serde(default)]
    pub languages: Vec<LanguageInfo>,
    #[serde(default)]
    pub words: Vec<WordColumn>,
    #[serde(rename = "selectedLanguageIndex", default)]
    pub selected_language_index: i64,
}

impl LocalizationData {
    /// 单语言空表
    pub fn with_default_language(name: &str) -> Self {
        Self {
            languages: vec![LanguageInfo::new(name)],
            words: vec![WordColumn::default()],
            selected_language_index: 0,
        }
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    pub fn to_pretty_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }
}

// 快照里的 null 单元格按空字符串读取
fn nullable_items<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<Option<String>>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_field_names() {
        let data = LocalizationData {
            languages: vec![LanguageInfo::new("English")],
            words: vec![WordColumn {
                items: vec!["Hello".into()],
            }],
            selected_language_index: 0,
        };
        let text = String::from_utf8(data.to_pretty_bytes().unwrap()).unwrap();
        assert!(text.contains("\"languages\""));
        assert!(text.contains("\"words\""));
        assert!(text.contains("\"items\""));
        assert!(text.contains("\"selectedLanguageIndex\""), "应使用快照约定的字段名");
    }

    #[test]
    fn test_null_cells_read_as_empty() {
        let json = br#"{"languages":[{"name":"English"}],"words":[{"items":["Hi",null]}]}"#;
        let data = LocalizationData::from_slice(json).unwrap();
        assert_eq!(data.words[0].items, vec!["Hi".to_string(), String::new()]);
        assert_eq!(data.selected_language_index, 0, "缺省的选中语言应为0");
    }

    #[test]
    fn test_missing_fields_default() {
        let data = LocalizationData::from_slice(b"{}").unwrap();
        assert!(data.languages.is_empty());
        assert!(data.words.is_empty());

        let data = LocalizationData::from_slice(br#"{"words":[{"items":null},{}]}"#).unwrap();
        assert_eq!(data.words.len(), 2);
        assert!(data.words.iter().all(WordColumn::is_empty));
    }

    #[test]
    fn test_filled_column() {
        let col = WordColumn::filled(3);
        assert_eq!(col.len(), 3);
        assert!(col.items.iter().all(|w| w == MISSING_WORD));
    }
}

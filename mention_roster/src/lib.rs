//! `mention_roster`：从 TSV 文件加载候选名单。
//!
//! 格式：
//!
//! - `keyword<TAB>payload<TAB>weight`
//! - payload 可省略，默认与 keyword 相同
//! - weight 可省略，默认 0；按权重降序排列，同权重保持文件顺序
//! - 允许 `#` 开头注释行

use std::{
    fs,
    path::{Path, PathBuf},
};

use mention_core::model::CandidateItem;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("failed to read roster {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("roster line {line}: missing keyword")]
    MissingKeyword { line: usize },
    #[error("roster line {line}: invalid weight {value:?}")]
    InvalidWeight { line: usize, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    keyword: String,
    payload: String,
    weight: i32,
}

#[derive(Debug, Clone, Default)]
pub struct Roster {
    entries: Vec<Entry>,
}

impl Roster {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RosterError> {
        let path = path.as_ref();
        let s = fs::read_to_string(path).map_err(|source| RosterError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let roster = Self::from_tsv_str(&s)?;
        tracing::info!(path = %path.display(), entries = roster.len(), "roster loaded");
        Ok(roster)
    }

    pub fn from_tsv_str(s: &str) -> Result<Self, RosterError> {
        let mut entries = Vec::new();
        for (idx, line) in s.lines().enumerate() {
            if line.trim().is_empty() || line.trim_start().starts_with('#') {
                continue;
            }
            let mut it = line.split('\t').map(str::trim);
            let keyword = it.next().unwrap_or("");
            if keyword.is_empty() {
                return Err(RosterError::MissingKeyword { line: idx + 1 });
            }
            let payload = it.next().filter(|p| !p.is_empty()).unwrap_or(keyword);
            let weight = match it.next().filter(|w| !w.is_empty()) {
                Some(w) => w.parse::<i32>().map_err(|_| RosterError::InvalidWeight {
                    line: idx + 1,
                    value: w.to_string(),
                })?,
                None => 0,
            };
            entries.push(Entry {
                keyword: keyword.to_string(),
                payload: payload.to_string(),
                weight,
            });
        }
        // sort_by 是稳定排序
        entries.sort_by(|a, b| b.weight.cmp(&a.weight));
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 转成引擎的候选全集（焦点/隐藏标志全为初始值）。
    pub fn into_candidates(self) -> Vec<CandidateItem> {
        self.entries
            .into_iter()
            .map(|e| CandidateItem::new(e.keyword, e.payload))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parses_columns_and_defaults() {
        let roster = Roster::from_tsv_str(
            "# people\n\
             john\tu42\n\
             \n\
             jane\n\
             amy\tu7\t10\n",
        )
        .unwrap();
        assert_eq!(
            roster.into_candidates(),
            vec![
                CandidateItem::new("amy", "u7"),
                CandidateItem::new("john", "u42"),
                CandidateItem::new("jane", "jane"),
            ]
        );
    }

    #[test]
    fn empty_payload_column_falls_back_to_keyword() {
        let roster = Roster::from_tsv_str("bob\t\t3\n").unwrap();
        assert_eq!(roster.into_candidates(), vec![CandidateItem::new("bob", "bob")]);
    }

    #[test]
    fn missing_keyword_reports_line() {
        let err = Roster::from_tsv_str("john\n\tu1\n").unwrap_err();
        assert!(matches!(err, RosterError::MissingKeyword { line: 2 }));
    }

    #[test]
    fn bad_weight_is_rejected() {
        let err = Roster::from_tsv_str("john\tu1\theavy\n").unwrap_err();
        assert_eq!(err.to_string(), "roster line 1: invalid weight \"heavy\"");
    }

    #[test]
    fn unreadable_path_keeps_the_path() {
        let err = Roster::from_path("/definitely/not/here.tsv").unwrap_err();
        assert!(matches!(err, RosterError::Io { ref path, .. } if path.ends_with("here.tsv")));
    }
}

//! 错题本存储
//!
//! 跨会话累积的错题记录，按 (题干, 题型) 去重，
//! 键是十进制整数字符串，按历史最大键 +1 单调分配。
//!
//! 文件格式：单个 JSON 对象，键为十进制字符串，值为
//! `{"type","description","options","answer","user_answer","explanation"}`。

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::models::{QuestionType, VerdictResult};
use crate::utils::logging::truncate_text;
use crate::workflow::ExamSession;

/// 一条错题记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WrongQuestionRecord {
    /// 题目类型的中文标签（选择/填空/简答）
    #[serde(rename = "type")]
    pub type_label: String,
    pub description: String,
    /// 选择题为 "A:xxx,B:xxx" 形式，非选择题为 "None"
    pub options: String,
    pub answer: String,
    pub user_answer: String,
    pub explanation: String,
}

/// 错题本
///
/// 独占持有自己的持久化映射；每次操作都是完整的
/// 读-改-写（加载全文件、应用全部修改、整体写回）。
pub struct WrongQuestionBank {
    path: PathBuf,
}

impl WrongQuestionBank {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 把一次已提交考试中非"正确"的题目收入错题本
    ///
    /// 同一 (题干, 题型) 的记录视为重复，静默跳过（包括本批内部的重复）。
    /// 所有插入在一次读-改-写中完成，避免中途崩溃留下半写状态。
    /// 返回新插入的记录数。
    pub fn ingest(&self, session: &ExamSession) -> Result<usize, StoreError> {
        let mut data = super::persist::load(&self.path);

        let mut next_key = data
            .keys()
            .filter_map(|k| k.parse::<u64>().ok())
            .max()
            .unwrap_or(0)
            + 1;

        let mut inserted = 0usize;
        for (index, verdict) in session.verdicts() {
            if verdict.result == VerdictResult::Correct {
                continue;
            }
            let question = match session.question(*index) {
                Some(question) => question,
                None => continue,
            };

            let is_duplicate = data.values().any(|existing| {
                existing.get("description").and_then(Value::as_str)
                    == Some(question.description.as_str())
                    && existing.get("type").and_then(Value::as_str) == Some(question.qtype.label())
            });
            if is_duplicate {
                debug!(
                    "跳过重复错题: {}",
                    truncate_text(&question.description, 20)
                );
                continue;
            }

            let record = WrongQuestionRecord {
                type_label: question.qtype.label().to_string(),
                description: question.description.clone(),
                options: question.options_field(),
                answer: question.answer.clone(),
                user_answer: session.answer(*index).unwrap_or("").to_string(),
                explanation: question.explanation.clone(),
            };
            data.insert(next_key.to_string(), serde_json::to_value(&record)?);
            next_key += 1;
            inserted += 1;
        }

        if inserted > 0 {
            super::persist::save(&self.path, &data)?;
            info!("已保存 {} 道新错题", inserted);
        } else {
            info!("没有新的错题需要保存");
        }
        Ok(inserted)
    }

    /// 加载全部错题
    pub fn list_all(&self) -> BTreeMap<String, WrongQuestionRecord> {
        let data = super::persist::load(&self.path);
        let mut records = BTreeMap::new();
        for (key, value) in data {
            match serde_json::from_value::<WrongQuestionRecord>(value) {
                Ok(record) => {
                    records.insert(key, record);
                }
                Err(e) => {
                    warn!("跳过无法解析的错题记录 {}: {}", key, e);
                }
            }
        }
        records
    }

    /// 按题目类型筛选错题
    pub fn list_by_type(&self, qtype: QuestionType) -> BTreeMap<String, WrongQuestionRecord> {
        self.list_all()
            .into_iter()
            .filter(|(_, record)| record.type_label == qtype.label())
            .collect()
    }

    /// 删除指定错题，键不存在时返回 NotFound，不产生任何状态变更
    pub fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut data = super::persist::load(&self.path);
        if data.remove(key).is_none() {
            return Err(StoreError::NotFound {
                key: key.to_string(),
            });
        }
        super::persist::save(&self.path, &data)?;
        info!("错题 '{}' 已删除", key);
        Ok(())
    }

    /// 清空错题本（删除整个存储文件）
    pub fn clear(&self) -> Result<(), StoreError> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
            info!("错题本已清空");
        } else {
            info!("错题本文件不存在，无需清空");
        }
        Ok(())
    }
}

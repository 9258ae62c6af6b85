//! 聊天记录存档
//!
//! 历史教学对话的持久化存储，支持续聊。
//!
//! 文件格式：单个 JSON 对象，键为 "dialogN"，值为编号字段形式
//! `{"num": 轮数, "Q1": 提问, "A1": 回答, "Q2": …}`（从 1 开始编号，
//! 不是数组）。存档边界负责与 `Vec<ChatTurn>` 互转。
//!
//! 保存语义是整体替换：同一键再次保存时，存储的轮列表被会话当前的
//! 完整轮列表替换（last-writer-wins，不做追加合并）。

use std::path::PathBuf;

use serde_json::{json, Map, Value};
use tracing::info;

use crate::error::StoreError;
use crate::models::ChatTurn;
use crate::utils::logging::truncate_text;

/// 聊天存档
pub struct ChatArchive {
    path: PathBuf,
}

impl ChatArchive {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 保存一段对话，返回它的对话键
    ///
    /// 键不存在（或未提供）时按扫描分配下一个可用的 "dialogN"；
    /// 键已存在时整体替换其内容。
    pub fn save(&self, dialog_key: Option<&str>, turns: &[ChatTurn]) -> Result<String, StoreError> {
        let mut data = super::persist::load(&self.path);

        let key = match dialog_key {
            Some(key) if data.contains_key(key) => key.to_string(),
            _ => next_dialog_key(&data),
        };

        data.insert(key.clone(), turns_to_value(turns));
        super::persist::save(&self.path, &data)?;
        info!("对话 {} 已保存，共 {} 轮", key, turns.len());
        Ok(key)
    }

    /// 列出所有对话：(对话键, 首轮提问预览)
    pub fn load_list(&self) -> Vec<(String, String)> {
        let data = super::persist::load(&self.path);
        data.iter()
            .map(|(key, dialog)| {
                let preview = dialog
                    .get("Q1")
                    .and_then(Value::as_str)
                    .unwrap_or("无提问内容");
                (key.clone(), truncate_text(preview, 30))
            })
            .collect()
    }

    /// 加载指定对话的完整轮列表
    pub fn load_detail(&self, key: &str) -> Result<Vec<ChatTurn>, StoreError> {
        let data = super::persist::load(&self.path);
        let dialog = data.get(key).ok_or_else(|| StoreError::NotFound {
            key: key.to_string(),
        })?;
        Ok(value_to_turns(dialog))
    }

    /// 删除指定对话，键不存在时返回 NotFound
    pub fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut data = super::persist::load(&self.path);
        if data.remove(key).is_none() {
            return Err(StoreError::NotFound {
                key: key.to_string(),
            });
        }
        super::persist::save(&self.path, &data)?;
        info!("聊天记录 '{}' 已删除", key);
        Ok(())
    }
}

/// 扫描分配下一个可用的对话键
fn next_dialog_key(data: &Map<String, Value>) -> String {
    let mut n = 1usize;
    while data.contains_key(&format!("dialog{}", n)) {
        n += 1;
    }
    format!("dialog{}", n)
}

/// 轮列表 → 编号字段对象
fn turns_to_value(turns: &[ChatTurn]) -> Value {
    let mut dialog = Map::new();
    dialog.insert("num".to_string(), json!(turns.len()));
    for (i, turn) in turns.iter().enumerate() {
        dialog.insert(format!("Q{}", i + 1), json!(turn.question));
        dialog.insert(format!("A{}", i + 1), json!(turn.answer));
    }
    Value::Object(dialog)
}

/// 编号字段对象 → 轮列表（缺失的字段按空串处理）
fn value_to_turns(dialog: &Value) -> Vec<ChatTurn> {
    let num = dialog.get("num").and_then(Value::as_u64).unwrap_or(0);
    let mut turns = Vec::with_capacity(num as usize);
    for i in 1..=num {
        let question = dialog
            .get(format!("Q{}", i))
            .and_then(Value::as_str)
            .unwrap_or("");
        let answer = dialog
            .get(format!("A{}", i))
            .and_then(Value::as_str)
            .unwrap_or("");
        turns.push(ChatTurn::new(question, answer));
    }
    turns
}

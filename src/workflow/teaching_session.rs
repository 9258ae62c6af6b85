//! 教学会话 - 流程层
//!
//! 教学模式的多轮对话缓冲：持有单次会话的完整问答历史，
//! 通过聊天存档保存/续聊。会话本身是内存态的，跨会话共享
//! 只通过存档文件进行。

use tracing::info;

use crate::clients::{ChatMessage, LanguageModel};
use crate::error::{StoreError, TransportError};
use crate::models::ChatTurn;
use crate::stores::ChatArchive;

/// 一次教学会话
#[derive(Default)]
pub struct TeachingSession {
    history: Vec<ChatTurn>,
    dialog_key: Option<String>,
}

impl TeachingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    pub fn dialog_key(&self) -> Option<&str> {
        self.dialog_key.as_deref()
    }

    /// 发送一条用户消息，返回助手回复
    ///
    /// 完整历史作为上下文发给 LLM。调用失败时历史保持不变
    /// （这一轮不会被记录），调用方可以重试。
    pub async fn ask(
        &mut self,
        llm: &dyn LanguageModel,
        user_message: &str,
    ) -> Result<String, TransportError> {
        let mut messages = Vec::with_capacity(self.history.len() * 2 + 1);
        for turn in &self.history {
            messages.push(ChatMessage::user(&turn.question));
            messages.push(ChatMessage::assistant(&turn.answer));
        }
        messages.push(ChatMessage::user(user_message));

        let reply = llm.complete(&messages).await?;
        self.history.push(ChatTurn::new(user_message, reply.clone()));
        Ok(reply)
    }

    /// 把当前会话保存到聊天存档
    ///
    /// 首次保存分配新的对话键并记住它，之后的保存整体替换
    /// 同一键下的内容。空会话不写存档，返回 Ok(None)。
    pub fn save(&mut self, archive: &ChatArchive) -> Result<Option<String>, StoreError> {
        if self.history.is_empty() {
            info!("没有需要保存的对话内容");
            return Ok(None);
        }
        let key = archive.save(self.dialog_key.as_deref(), &self.history)?;
        self.dialog_key = Some(key.clone());
        Ok(Some(key))
    }

    /// 从存档加载一段历史对话并续聊
    pub fn load(&mut self, archive: &ChatArchive, key: &str) -> Result<(), StoreError> {
        let turns = archive.load_detail(key)?;
        self.history = turns;
        self.dialog_key = Some(key.to_string());
        info!("已加载对话 {}，共 {} 轮", key, self.history.len());
        Ok(())
    }

    /// 开始新的会话
    pub fn reset(&mut self) {
        self.history.clear();
        self.dialog_key = None;
    }
}

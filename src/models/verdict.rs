//! 判卷结果数据模型

use serde::{Deserialize, Serialize};

/// 单道题目的判卷结论
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerdictResult {
    /// 正确
    Correct,
    /// 错误
    Incorrect,
    /// 部分正确
    PartiallyCorrect,
    /// 未作答
    Unanswered,
    /// 评估失败（LLM 调用出错等本地降级结果）
    EvaluationFailed,
}

impl VerdictResult {
    /// 结论的中文标签
    pub fn label(&self) -> &'static str {
        match self {
            VerdictResult::Correct => "正确",
            VerdictResult::Incorrect => "错误",
            VerdictResult::PartiallyCorrect => "部分正确",
            VerdictResult::Unanswered => "未作答",
            VerdictResult::EvaluationFailed => "评估失败",
        }
    }
}

impl std::fmt::Display for VerdictResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// 一道题目的完整判卷结果，生成后不可变
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationVerdict {
    pub result: VerdictResult,
    /// 得分，0..=10
    pub score: u8,
    /// 评分理由
    pub reason: String,
    /// 标准答案
    pub correct_answer: String,
    /// 答案解释
    pub explanation: String,
}

/// 评分提示词要求模型返回的片段：`{score=数字, reason="理由"}`
///
/// 解析器保证总能返回一个可用的片段，解析失败时 score 为 0、
/// reason 中包含原始文本以便排查。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerdictFragment {
    pub score: u8,
    pub reason: String,
}

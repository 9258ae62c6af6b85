//! 考试会话 - 流程层
//!
//! 状态机：NotStarted → InProgress → Submitted（终态）
//!
//! 不变量：
//! - status ≠ NotStarted 时，0 ≤ current_index < 题目数量
//! - verdicts 在 Submitted 之前为空，提交后键恰好覆盖 0..题目数量
//! - 提交是一次性的：重复提交直接返回已有结果，不会重新判卷
//!
//! 会话是单次、内存态的：离开考试模式即丢弃，只有非"正确"的
//! 判卷结论会在丢弃前投影进错题本。

use std::collections::{BTreeMap, HashMap};

use tracing::{info, warn};

use crate::clients::{ChatMessage, LanguageModel};
use crate::error::ExamError;
use crate::models::{EvaluationVerdict, Question};
use crate::services::{parser, prompts, GradingEngine};

/// 考试会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExamStatus {
    NotStarted,
    InProgress,
    Submitted,
}

/// 一次考试会话
#[derive(Default)]
pub struct ExamSession {
    questions: Vec<Question>,
    answers: HashMap<usize, String>,
    verdicts: BTreeMap<usize, EvaluationVerdict>,
    current_index: usize,
    status: ExamStatus,
    total_score: u32,
    /// 出题的学科范围
    subject: String,
}

impl Default for ExamStatus {
    fn default() -> Self {
        ExamStatus::NotStarted
    }
}

impl ExamSession {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            ..Default::default()
        }
    }

    pub fn status(&self) -> ExamStatus {
        self.status
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    pub fn answer(&self, index: usize) -> Option<&str> {
        self.answers.get(&index).map(String::as_str)
    }

    pub fn verdict(&self, index: usize) -> Option<&EvaluationVerdict> {
        self.verdicts.get(&index)
    }

    pub fn verdicts(&self) -> &BTreeMap<usize, EvaluationVerdict> {
        &self.verdicts
    }

    pub fn total_score(&self) -> u32 {
        self.total_score
    }

    /// 生成考题并进入答题状态
    ///
    /// 只能在 NotStarted 状态调用。LLM 调用失败或一道有效题目都
    /// 解析不出来时返回 [`ExamError::GenerationFailed`]，会话保持
    /// NotStarted，调用方可以重试。
    ///
    /// 成功时返回解析过程中产生的警告（被丢弃的片段、数量不符等）。
    pub async fn generate(
        &mut self,
        llm: &dyn LanguageModel,
        count: usize,
    ) -> Result<Vec<String>, ExamError> {
        if self.status != ExamStatus::NotStarted {
            return Err(ExamError::InvalidState("考试已经开始，不能重新生成题目"));
        }

        info!("正在生成 {} 道考题...", count);
        let prompt = prompts::question_generation(&self.subject, count);
        let raw = llm
            .complete(&[ChatMessage::system(prompt)])
            .await
            .map_err(|e| ExamError::GenerationFailed {
                reason: format!("LLM 调用失败: {}", e),
            })?;

        let (questions, warnings) = parser::parse_questions(&raw, count);
        for warning in &warnings {
            warn!("{}", warning);
        }
        if questions.is_empty() {
            return Err(ExamError::GenerationFailed {
                reason: "未能从模型输出中解析出任何有效题目".to_string(),
            });
        }

        info!("✓ 生成完成，共 {} 道有效题目", questions.len());
        self.questions = questions;
        self.answers.clear();
        self.verdicts.clear();
        self.current_index = 0;
        self.total_score = 0;
        self.status = ExamStatus::InProgress;

        Ok(warnings)
    }

    /// 跳转到指定题目，越界时静默钳位到有效范围
    ///
    /// 提交后仍然允许跳转（查看判卷结果），状态保持 Submitted。
    pub fn go_to(&mut self, index: usize) {
        if self.status == ExamStatus::NotStarted || self.questions.is_empty() {
            return;
        }
        self.current_index = index.min(self.questions.len() - 1);
    }

    /// 记录某道题的答案
    ///
    /// 幂等：同一题目重复作答时覆盖旧值。与 current_index 无关，
    /// 任何有效题目下标都可以作答（支持来回翻题预填）。
    pub fn record_answer(&mut self, index: usize, answer: impl Into<String>) {
        if index >= self.questions.len() {
            warn!("作答下标 {} 超出题目范围，忽略", index);
            return;
        }
        self.answers.insert(index, answer.into());
    }

    /// 提交考试：按题目顺序逐题判卷，累计总分，进入 Submitted 终态
    ///
    /// 重复提交是幂等的：直接返回上次计算的总分，不会重新判卷。
    pub async fn submit(&mut self, grader: &GradingEngine) -> Result<u32, ExamError> {
        match self.status {
            ExamStatus::NotStarted => Err(ExamError::InvalidState("没有题目可以提交")),
            ExamStatus::Submitted => Ok(self.total_score),
            ExamStatus::InProgress => {
                info!("开始判卷，共 {} 道题目", self.questions.len());

                let mut graded = Vec::with_capacity(self.questions.len());
                for (index, question) in self.questions.iter().enumerate() {
                    let user_answer = self.answers.get(&index).map(String::as_str).unwrap_or("");
                    let verdict = grader.grade(question, user_answer).await;
                    info!(
                        "第 {} 题: {} ({} 分)",
                        index + 1,
                        verdict.result,
                        verdict.score
                    );
                    graded.push(verdict);
                }

                let mut total = 0u32;
                for (index, verdict) in graded.into_iter().enumerate() {
                    total += u32::from(verdict.score);
                    self.verdicts.insert(index, verdict);
                }

                self.total_score = total;
                self.status = ExamStatus::Submitted;
                self.current_index = 0;
                info!("✅ 考试已提交，总分: {}", total);
                Ok(total)
            }
        }
    }

    /// 重置会话，回到 NotStarted
    pub fn reset(&mut self) {
        let subject = std::mem::take(&mut self.subject);
        *self = Self::new(subject);
    }
}

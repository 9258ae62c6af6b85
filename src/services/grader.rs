//! 判卷服务 - 业务能力层
//!
//! 只负责"给一道题判分"能力，不关心流程：
//! - 选择题本地精确比对，不调用 LLM
//! - 填空题、简答题一律交给 LLM 评分（不做精确匹配短路，保持单一代码路径）
//! - 未作答直接判未作答，不调用 LLM
//! - LLM 调用失败降级为"评估失败"结论，绝不向上抛错

use std::sync::Arc;

use tracing::{debug, warn};

use crate::clients::{ChatMessage, LanguageModel};
use crate::models::{EvaluationVerdict, Question, QuestionType, VerdictResult};
use crate::services::{parser, prompts};

/// 判卷满分
const FULL_SCORE: u8 = 10;

/// 判卷引擎
pub struct GradingEngine {
    llm: Arc<dyn LanguageModel>,
}

impl GradingEngine {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    /// 给一道题判分，总是返回一个可用的判卷结论
    pub async fn grade(&self, question: &Question, user_answer: &str) -> EvaluationVerdict {
        let user_answer = user_answer.trim();
        let correct_answer = question.answer.trim();

        if user_answer.is_empty() {
            return EvaluationVerdict {
                result: VerdictResult::Unanswered,
                score: 0,
                reason: "未作答".to_string(),
                correct_answer: correct_answer.to_string(),
                explanation: question.explanation.clone(),
            };
        }

        match question.qtype {
            QuestionType::Choice => self.grade_choice(question, user_answer),
            QuestionType::FillBlank | QuestionType::OpenResponse => {
                self.grade_with_llm(question, user_answer).await
            }
        }
    }

    /// 选择题：去除首尾空白后精确比对（区分大小写）
    fn grade_choice(&self, question: &Question, user_answer: &str) -> EvaluationVerdict {
        let correct_answer = question.answer.trim();
        if user_answer == correct_answer {
            EvaluationVerdict {
                result: VerdictResult::Correct,
                score: FULL_SCORE,
                reason: "回答正确".to_string(),
                correct_answer: correct_answer.to_string(),
                explanation: question.explanation.clone(),
            }
        } else {
            EvaluationVerdict {
                result: VerdictResult::Incorrect,
                score: 0,
                reason: format!("回答错误，正确答案是 {}", correct_answer),
                correct_answer: correct_answer.to_string(),
                explanation: question.explanation.clone(),
            }
        }
    }

    /// 填空/简答：交给 LLM 评分，按得分映射结论
    async fn grade_with_llm(&self, question: &Question, user_answer: &str) -> EvaluationVerdict {
        let messages = [
            ChatMessage::system(prompts::grading_system()),
            ChatMessage::user(prompts::grading_user(question, user_answer)),
        ];

        match self.llm.complete(&messages).await {
            Ok(reply) => {
                debug!("判卷回复: {}", reply);
                let fragment = parser::parse_verdict(&reply);
                let result = match fragment.score {
                    0 => VerdictResult::Incorrect,
                    FULL_SCORE => VerdictResult::Correct,
                    _ => VerdictResult::PartiallyCorrect,
                };
                EvaluationVerdict {
                    result,
                    score: fragment.score,
                    reason: fragment.reason,
                    correct_answer: question.answer.trim().to_string(),
                    explanation: question.explanation.clone(),
                }
            }
            Err(e) => {
                // 本地非致命失败，会话继续判后面的题
                warn!("判卷 LLM 调用失败: {}", e);
                EvaluationVerdict {
                    result: VerdictResult::EvaluationFailed,
                    score: 0,
                    reason: format!("GPT 评估出错: {}", e),
                    correct_answer: question.answer.trim().to_string(),
                    explanation: question.explanation.clone(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// 按脚本依次返回回复的假 LLM
    struct ScriptedLlm {
        replies: Mutex<VecDeque<Result<String, String>>>,
    }

    impl ScriptedLlm {
        fn new(replies: Vec<Result<&str, &str>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(
                    replies
                        .into_iter()
                        .map(|r| r.map(str::to_string).map_err(str::to_string))
                        .collect(),
                ),
            })
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedLlm {
        async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, TransportError> {
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .expect("脚本回复已用完")
                .map_err(TransportError::ApiCall)
        }
    }

    fn choice_question() -> Question {
        Question {
            qtype: QuestionType::Choice,
            description: "1+1=？".to_string(),
            options: vec![
                crate::models::ChoiceOption { label: "A".to_string(), text: "1".to_string() },
                crate::models::ChoiceOption { label: "B".to_string(), text: "2".to_string() },
            ],
            answer: "B".to_string(),
            explanation: "略".to_string(),
        }
    }

    fn open_question() -> Question {
        Question {
            qtype: QuestionType::OpenResponse,
            description: "为什么压电晶体一压就会产生电？".to_string(),
            options: Vec::new(),
            answer: "因为压电效应".to_string(),
            explanation: "略".to_string(),
        }
    }

    #[tokio::test]
    async fn test_grade_choice_exact_match() {
        let engine = GradingEngine::new(ScriptedLlm::new(vec![]));
        let verdict = engine.grade(&choice_question(), " B ").await;
        assert_eq!(verdict.result, VerdictResult::Correct);
        assert_eq!(verdict.score, 10);
    }

    #[tokio::test]
    async fn test_grade_choice_mismatch_reports_answer() {
        let engine = GradingEngine::new(ScriptedLlm::new(vec![]));
        let verdict = engine.grade(&choice_question(), "C").await;
        assert_eq!(verdict.result, VerdictResult::Incorrect);
        assert_eq!(verdict.score, 0);
        assert!(verdict.reason.contains("B"));
    }

    #[tokio::test]
    async fn test_grade_empty_answer_skips_llm() {
        // 没给脚本回复：如果调用了 LLM 会 panic
        let engine = GradingEngine::new(ScriptedLlm::new(vec![]));
        let verdict = engine.grade(&open_question(), "   ").await;
        assert_eq!(verdict.result, VerdictResult::Unanswered);
        assert_eq!(verdict.score, 0);
    }

    #[tokio::test]
    async fn test_grade_open_response_maps_scores() {
        let engine = GradingEngine::new(ScriptedLlm::new(vec![
            Ok("{score=10, reason=\"完全正确\"}"),
            Ok("{score=6, reason=\"答出了要点\"}"),
            Ok("{score=0, reason=\"答非所问\"}"),
        ]));
        let question = open_question();

        let verdict = engine.grade(&question, "压电效应").await;
        assert_eq!(verdict.result, VerdictResult::Correct);
        assert_eq!(verdict.score, 10);

        let verdict = engine.grade(&question, "和电有关").await;
        assert_eq!(verdict.result, VerdictResult::PartiallyCorrect);
        assert_eq!(verdict.score, 6);

        let verdict = engine.grade(&question, "不知道但要写点什么").await;
        assert_eq!(verdict.result, VerdictResult::Incorrect);
        assert_eq!(verdict.score, 0);
    }

    #[tokio::test]
    async fn test_grade_transport_failure_degrades_locally() {
        let engine = GradingEngine::new(ScriptedLlm::new(vec![Err("网络超时")]));
        let verdict = engine.grade(&open_question(), "压电效应").await;
        assert_eq!(verdict.result, VerdictResult::EvaluationFailed);
        assert_eq!(verdict.score, 0);
        assert!(verdict.reason.contains("网络超时"));
    }

    #[tokio::test]
    async fn test_grade_unparseable_reply_scores_zero() {
        let engine = GradingEngine::new(ScriptedLlm::new(vec![Ok("这次我不想按格式回答")]));
        let verdict = engine.grade(&open_question(), "压电效应").await;
        assert_eq!(verdict.result, VerdictResult::Incorrect);
        assert_eq!(verdict.score, 0);
        assert!(verdict.reason.contains("无法解析评分结果"));
    }
}

//! 题目数据模型
//!
//! 题目由模型输出解析而来，解析完成后不可变，
//! 由生成它的考试会话独占持有。

use serde::{Deserialize, Serialize};

/// 题目类型
///
/// 模型输出与持久化文件使用中文标签（选择/填空/简答），
/// 在解析与存储边界处转换。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionType {
    /// 选择题
    Choice,
    /// 填空题
    FillBlank,
    /// 简答题
    OpenResponse,
}

impl QuestionType {
    /// 从中文标签解析题目类型，未知标签返回 None
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "选择" => Some(QuestionType::Choice),
            "填空" => Some(QuestionType::FillBlank),
            "简答" => Some(QuestionType::OpenResponse),
            _ => None,
        }
    }

    /// 题目类型的中文标签
    pub fn label(&self) -> &'static str {
        match self {
            QuestionType::Choice => "选择",
            QuestionType::FillBlank => "填空",
            QuestionType::OpenResponse => "简答",
        }
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// 选择题的一个选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    /// 选项标签（A、B、C、D）
    pub label: String,
    /// 选项内容
    pub text: String,
}

/// 一道题目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub qtype: QuestionType,
    /// 题干描述
    pub description: String,
    /// 选项列表，仅选择题非空
    #[serde(default)]
    pub options: Vec<ChoiceOption>,
    /// 标准答案
    pub answer: String,
    /// 答案解释
    pub explanation: String,
}

impl Question {
    /// 渲染持久化文件中的 options 字段
    ///
    /// 选择题渲染为 "A:xxx,B:xxx" 形式，非选择题为 "None"（与原始文件格式一致）。
    pub fn options_field(&self) -> String {
        if self.options.is_empty() {
            "None".to_string()
        } else {
            self.options
                .iter()
                .map(|opt| format!("{}:{}", opt.label, opt.text))
                .collect::<Vec<_>>()
                .join(",")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_type_labels() {
        assert_eq!(QuestionType::from_label("选择"), Some(QuestionType::Choice));
        assert_eq!(QuestionType::from_label(" 填空 "), Some(QuestionType::FillBlank));
        assert_eq!(QuestionType::from_label("简答"), Some(QuestionType::OpenResponse));
        assert_eq!(QuestionType::from_label("判断"), None);
        assert_eq!(QuestionType::Choice.label(), "选择");
    }

    #[test]
    fn test_options_field() {
        let question = Question {
            qtype: QuestionType::Choice,
            description: "1+1=？".to_string(),
            options: vec![
                ChoiceOption { label: "A".to_string(), text: "1".to_string() },
                ChoiceOption { label: "B".to_string(), text: "2".to_string() },
            ],
            answer: "B".to_string(),
            explanation: "略".to_string(),
        };
        assert_eq!(question.options_field(), "A:1,B:2");

        let fill = Question {
            qtype: QuestionType::FillBlank,
            description: "床前明月光，_______地上霜。".to_string(),
            options: Vec::new(),
            answer: "疑是".to_string(),
            explanation: "略".to_string(),
        };
        assert_eq!(fill.options_field(), "None");
    }
}

//! 模型输出解析服务 - 业务能力层
//!
//! 将 LLM 的"大致结构化"输出解析为校验过的领域记录。
//! 模型输出只是近似 JSON：key=value 风格、单引号、Markdown 代码块
//! 都可能出现，片段之间还可能夹杂多余的说明文字。
//!
//! 解析策略：
//! - 题目解析按片段独立进行，单个片段失败只产生警告并被丢弃，
//!   绝不让整次解析失败
//! - 评分解析按固定顺序尝试多个策略（严格解析 → 紧格式匹配 → 宽松匹配），
//!   全部失败时返回带原始文本的兜底片段，永不报错

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::models::{ChoiceOption, Question, QuestionType, VerdictFragment};
use crate::utils::logging::truncate_text;

/// 评分满分
const MAX_SCORE: u8 = 10;

fn key_value_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // 只改写键位置（{ 或 , 之后）的 key=，避免破坏值内部的等号
    RE.get_or_init(|| {
        Regex::new(r"([{,]\s*)([A-Za-z_][A-Za-z0-9_]*)\s*=\s*").expect("正则表达式无效")
    })
}

fn single_quote_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"'([^']*)'").expect("正则表达式无效"))
}

fn verdict_tight_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\{\s*"?score"?\s*[:=]\s*(\d+)\s*[,，]\s*"?reason"?\s*[:=]\s*"([^"]*)"\s*\}"#)
            .expect("正则表达式无效")
    })
}

fn verdict_loose_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)score\D*?(\d+).*?reason\s*[:=：]?\s*"?([^"\n]+)"?"#)
            .expect("正则表达式无效")
    })
}

/// 把 key=value 风格的键规范化为带引号的 JSON 键
fn normalize_keys(text: &str) -> String {
    key_value_re().replace_all(text, "${1}\"${2}\": ").into_owned()
}

/// 去掉 Markdown 代码块围栏
fn strip_code_fences(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// 扫描提取所有顶层花括号片段
///
/// 片段可能分布在多行，值内部的花括号（字符串中）不会截断片段。
/// 未闭合的片段被整体丢弃。
fn extract_fragments(text: &str) -> Vec<String> {
    let mut fragments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (pos, ch) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' if depth > 0 => in_string = true,
            '{' => {
                if depth == 0 {
                    start = pos;
                }
                depth += 1;
            }
            '}' => {
                if depth > 0 {
                    depth -= 1;
                    if depth == 0 {
                        fragments.push(text[start..pos + ch.len_utf8()].to_string());
                    }
                }
            }
            _ => {}
        }
    }

    fragments
}

/// 容忍数字、布尔等非字符串值的字段读取
fn field_string(obj: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// 解析选择题的选项字段："A:xxx,B:xxx" 形式，中英文逗号、冒号均可
fn parse_options(raw: &str) -> Result<Vec<ChoiceOption>, String> {
    let mut options = Vec::new();
    for part in raw.split([',', '，']) {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let (label, text) = part
            .split_once([':', '：'])
            .ok_or_else(|| format!("选项缺少标签分隔符: {}", part))?;
        options.push(ChoiceOption {
            label: label.trim().to_string(),
            text: text.trim().to_string(),
        });
    }
    if options.len() < 2 {
        return Err(format!("选择题选项不足两个: {}", raw));
    }
    Ok(options)
}

/// 解析单个题目片段
///
/// 必填字段：type、description、answer、explanation；
/// 选择题额外要求 option 字段能解析出至少两个选项。
fn parse_question_fragment(fragment: &str) -> Result<Question, String> {
    let value: Value =
        serde_json::from_str(fragment).map_err(|e| format!("JSON 解析失败: {}", e))?;
    let obj = value.as_object().ok_or("片段不是对象")?;

    let type_label = field_string(obj, "type").ok_or("缺少 type 字段")?;
    let qtype = QuestionType::from_label(&type_label)
        .ok_or_else(|| format!("未知题目类型: {}", type_label))?;
    let description = field_string(obj, "description").ok_or("缺少 description 字段")?;
    let answer = field_string(obj, "answer").ok_or("缺少 answer 字段")?;
    let explanation = field_string(obj, "explanation").ok_or("缺少 explanation 字段")?;

    let options = if qtype == QuestionType::Choice {
        let raw_options = field_string(obj, "option").ok_or("选择题缺少 option 字段")?;
        parse_options(&raw_options)?
    } else {
        Vec::new()
    };

    Ok(Question {
        qtype,
        description,
        options,
        answer,
        explanation,
    })
}

/// 把模型的出题回复解析为题目列表
///
/// 每个片段独立解析，失败的片段被丢弃并记录一条警告；
/// 解析出的数量与期望不符时也只产生警告，返回部分结果，绝不整体失败。
pub fn parse_questions(raw: &str, expected_count: usize) -> (Vec<Question>, Vec<String>) {
    let mut warnings = Vec::new();

    let cleaned = strip_code_fences(raw);
    let normalized = normalize_keys(&cleaned);
    let fragments = extract_fragments(&normalized);

    if fragments.is_empty() {
        warnings.push(format!(
            "未能从模型输出中提取任何题目片段: {}",
            truncate_text(raw.trim(), 80)
        ));
    }

    let mut questions = Vec::new();
    for fragment in fragments {
        match parse_question_fragment(&fragment) {
            Ok(question) => questions.push(question),
            Err(reason) => {
                warnings.push(format!(
                    "丢弃无法解析的片段（{}）: {}",
                    reason,
                    truncate_text(&fragment, 60)
                ));
            }
        }
    }

    if questions.len() != expected_count {
        warnings.push(format!(
            "期望 {} 道题目，实际解析出 {} 道",
            expected_count,
            questions.len()
        ));
    }

    (questions, warnings)
}

fn clamp_score(score: u64) -> u8 {
    score.min(MAX_SCORE as u64) as u8
}

/// 策略一：规范化后严格 JSON 解析
pub(crate) fn parse_verdict_strict(raw: &str) -> Option<VerdictFragment> {
    let cleaned = strip_code_fences(raw);
    let normalized = normalize_keys(&cleaned);
    let normalized = single_quote_re().replace_all(&normalized, "\"${1}\"");
    let fragment = extract_fragments(&normalized).into_iter().next()?;

    let value: Value = serde_json::from_str(&fragment).ok()?;
    let obj = value.as_object()?;
    let score = match obj.get("score")? {
        Value::Number(n) => n.as_u64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    let reason = field_string(obj, "reason")?;

    Some(VerdictFragment {
        score: clamp_score(score),
        reason,
    })
}

/// 策略二：紧格式匹配 `{score=数字, reason="理由"}`
pub(crate) fn parse_verdict_tight(raw: &str) -> Option<VerdictFragment> {
    let captures = verdict_tight_re().captures(raw)?;
    let score: u64 = captures[1].parse().ok()?;
    Some(VerdictFragment {
        score: clamp_score(score),
        reason: captures[2].trim().to_string(),
    })
}

/// 策略三：宽松匹配，容忍字段周围的多余文字
pub(crate) fn parse_verdict_loose(raw: &str) -> Option<VerdictFragment> {
    let captures = verdict_loose_re().captures(raw)?;
    let score: u64 = captures[1].parse().ok()?;
    let reason = captures[2].trim().trim_end_matches(['}', '，', '。']).trim();
    Some(VerdictFragment {
        score: clamp_score(score),
        reason: if reason.is_empty() {
            "无评分理由".to_string()
        } else {
            reason.to_string()
        },
    })
}

/// 把判卷回复解析为评分片段
///
/// 按顺序尝试各解析策略，全部失败时返回 score=0 的兜底片段，
/// reason 中包含原始文本以便排查。该函数永不失败。
pub fn parse_verdict(raw: &str) -> VerdictFragment {
    type Strategy = fn(&str) -> Option<VerdictFragment>;
    const STRATEGIES: &[(&str, Strategy)] = &[
        ("strict", parse_verdict_strict),
        ("tight", parse_verdict_tight),
        ("loose", parse_verdict_loose),
    ];

    for (name, strategy) in STRATEGIES {
        if let Some(fragment) = strategy(raw) {
            debug!("评分解析策略 {} 命中: score={}", name, fragment.score);
            return fragment;
        }
    }

    VerdictFragment {
        score: 0,
        reason: format!("无法解析评分结果: {}", raw.trim()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_fragments_multiline() {
        let text = "前置说明\n{a=1}\n中间文字 {b=2}\n{c=3";
        let fragments = extract_fragments(text);
        assert_eq!(fragments, vec!["{a=1}", "{b=2}"]);
    }

    #[test]
    fn test_extract_fragments_brace_in_string() {
        let text = r#"{"reason": "格式形如 {score=1}", "score": 5}"#;
        let fragments = extract_fragments(text);
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0], text);
    }

    #[test]
    fn test_normalize_keys_preserves_value_equals() {
        let raw = r#"{type="选择", description="1+1=？", option="A:1,B:2", answer="B", explanation="略"}"#;
        let normalized = normalize_keys(raw);
        assert!(normalized.contains(r#""type": "选择""#));
        // 值内部的等号不能被改写
        assert!(normalized.contains("1+1=？"));
    }

    #[test]
    fn test_parse_questions_preserves_fields() {
        let raw = concat!(
            "{type=\"选择\", description=\"1+1=？\", option=\"A:1,B:2,C:3,D:4\", answer=\"B\", explanation=\"基本运算\"}\n",
            "{type=\"填空\", description=\"床前明月光，_______地上霜。\", option=\"None\", answer=\"疑是\", explanation=\"略\"}\n",
            "{type=\"简答\", description=\"为什么压电晶体一压就会产生电？\", option=\"None\", answer=\"因为压电效应\", explanation=\"略\"}",
        );
        let (questions, warnings) = parse_questions(raw, 3);
        assert_eq!(questions.len(), 3);
        assert!(warnings.is_empty());

        let choice = &questions[0];
        assert_eq!(choice.qtype, QuestionType::Choice);
        assert_eq!(choice.description, "1+1=？");
        assert_eq!(choice.answer, "B");
        assert_eq!(choice.explanation, "基本运算");
        assert_eq!(choice.options.len(), 4);
        assert_eq!(choice.options[1].label, "B");
        assert_eq!(choice.options[1].text, "2");

        assert_eq!(questions[1].qtype, QuestionType::FillBlank);
        assert!(questions[1].options.is_empty());
        assert_eq!(questions[2].qtype, QuestionType::OpenResponse);
    }

    #[test]
    fn test_parse_questions_drops_malformed_keeps_valid() {
        let raw = concat!(
            "{type=\"选择\", description=\"好题\", option=\"A:1,B:2\", answer=\"A\", explanation=\"略\"}\n",
            "{type=\"判断\", description=\"未知类型\", option=\"None\", answer=\"对\", explanation=\"略\"}\n",
            "{type=\"填空\", description=\"缺答案\", option=\"None\", explanation=\"略\"}\n",
            "这一行不是片段\n",
            "{type=\"简答\", description=\"另一道好题\", option=\"None\", answer=\"答案\", explanation=\"略\"}",
        );
        let (questions, warnings) = parse_questions(raw, 4);
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].description, "好题");
        assert_eq!(questions[1].description, "另一道好题");
        // 两个坏片段 + 数量不符
        assert_eq!(warnings.len(), 3);
        assert!(warnings.iter().any(|w| w.contains("未知题目类型")));
        assert!(warnings.iter().any(|w| w.contains("期望 4 道题目")));
    }

    #[test]
    fn test_parse_questions_choice_requires_two_options() {
        let raw = "{type=\"选择\", description=\"单选项\", option=\"A:1\", answer=\"A\", explanation=\"略\"}";
        let (questions, warnings) = parse_questions(raw, 1);
        assert!(questions.is_empty());
        assert!(warnings.iter().any(|w| w.contains("选项不足")));
    }

    #[test]
    fn test_parse_questions_strips_code_fences() {
        let raw = "```json\n{type=\"填空\", description=\"题\", option=\"None\", answer=\"答\", explanation=\"略\"}\n```";
        let (questions, warnings) = parse_questions(raw, 1);
        assert_eq!(questions.len(), 1);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_parse_questions_chinese_punctuation_options() {
        let raw = "{type=\"选择\", description=\"题\", option=\"A：甲，B：乙，C：丙\", answer=\"A\", explanation=\"略\"}";
        let (questions, _) = parse_questions(raw, 1);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].options.len(), 3);
        assert_eq!(questions[0].options[2].text, "丙");
    }

    #[test]
    fn test_parse_verdict_strict() {
        let fragment = parse_verdict_strict("{score=7, reason=\"ok\"}").unwrap();
        assert_eq!(fragment, VerdictFragment { score: 7, reason: "ok".to_string() });

        // 单引号也可以
        let fragment = parse_verdict_strict("{score=3, reason='还行'}").unwrap();
        assert_eq!(fragment.score, 3);
        assert_eq!(fragment.reason, "还行");
    }

    #[test]
    fn test_parse_verdict_tight() {
        let fragment = parse_verdict_tight("{ score: 10 , reason: \"完全正确\" }").unwrap();
        assert_eq!(fragment.score, 10);
        assert_eq!(fragment.reason, "完全正确");
    }

    #[test]
    fn test_parse_verdict_loose() {
        let raw = "评分如下：score 是 6 分，reason: \"答出了要点但不完整\"，请参考。";
        let fragment = parse_verdict_loose(raw).unwrap();
        assert_eq!(fragment.score, 6);
        assert!(fragment.reason.contains("要点"));
    }

    #[test]
    fn test_parse_verdict_clamps_score() {
        let fragment = parse_verdict("{score=99, reason=\"超出满分\"}");
        assert_eq!(fragment.score, 10);
    }

    #[test]
    fn test_parse_verdict_garbage_never_fails() {
        let fragment = parse_verdict("garbage");
        assert_eq!(fragment.score, 0);
        assert!(fragment.reason.contains("garbage"));
    }

    #[test]
    fn test_parse_verdict_prefers_strict() {
        let fragment = parse_verdict("{score=7, reason=\"ok\"}");
        assert_eq!(fragment, VerdictFragment { score: 7, reason: "ok".to_string() });
    }
}

//! # Exam Tutor
//!
//! 一个面向《测试技术与传感器》课程的 LLM 考试与辅导助手
//!
//! ## 架构设计
//!
//! 本系统采用严格的分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（识别工作线程），只暴露能力
//! - `RecognitionFeed` - 语音识别馈送，start / stop / poll
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个文本或题目
//! - `parser` - 容错解析 LLM 输出（题目片段 / 评分判定）
//! - `GradingEngine` - 判卷能力（确定性比对 + LLM 评估）
//! - `prompts` - 出题 / 阅卷提示词模板
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义一次完整会话的状态机
//! - `ExamSession` - 考试会话（未开始 → 进行中 → 已提交）
//! - `TeachingSession` - 教学对话（多轮问答 + 存档续聊）
//!
//! ### ④ 持久化层（Stores）
//! - `stores/` - 扁平 JSON 文件存储，读-改-写纪律
//! - `WrongQuestionBank` - 错题本
//! - `ChatArchive` - 聊天记录存档
//!
//! ## 模块结构

pub mod app;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod stores;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::App;
pub use clients::{ChatMessage, LanguageModel, OpenAiClient};
pub use config::Config;
pub use error::{ExamError, StoreError, TransportError};
pub use infrastructure::{Fragment, FragmentSource, RecognitionFeed};
pub use models::{ChatTurn, EvaluationVerdict, Question, QuestionType, VerdictResult};
pub use services::GradingEngine;
pub use stores::{ChatArchive, WrongQuestionBank};
pub use workflow::{ExamSession, ExamStatus, TeachingSession};

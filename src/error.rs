//! 错误类型定义
//!
//! 所有致命条件在组件边界处转换为显式的错误值，核心逻辑不允许让进程终止：
//! - 解析失败降级为警告（片段被丢弃，操作继续）
//! - LLM 传输失败在调用处捕获，降级为本地结果（评估失败的判卷结论等）
//! - 存储文件损坏按空存储处理并记录警告

use thiserror::Error;

/// LLM / 语音服务传输错误
///
/// 调用方必须捕获并本地降级，不允许向上传播为未处理的故障。
#[derive(Debug, Error)]
pub enum TransportError {
    /// API 调用失败（网络、鉴权等）
    #[error("LLM API 调用失败: {0}")]
    ApiCall(String),
    /// API 返回了空内容
    #[error("LLM 返回内容为空")]
    EmptyContent,
}

/// 考试会话错误
#[derive(Debug, Error)]
pub enum ExamError {
    /// 题目生成失败，会话保持未开始状态，调用方可以重试
    #[error("生成考题失败: {reason}")]
    GenerationFailed { reason: String },
    /// 状态机前置条件不满足
    #[error("当前状态不允许该操作: {0}")]
    InvalidState(&'static str),
}

/// 持久化存储错误
#[derive(Debug, Error)]
pub enum StoreError {
    /// 请求的记录不存在，不产生任何状态变更
    #[error("未找到指定记录: {key}")]
    NotFound { key: String },
    #[error("存储文件读写失败: {0}")]
    Io(#[from] std::io::Error),
    #[error("存储数据序列化失败: {0}")]
    Json(#[from] serde_json::Error),
}

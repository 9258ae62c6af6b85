/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    /// 考试出题的学科范围
    pub exam_subject: String,
    /// 一次考试生成的题目数量
    pub exam_question_count: usize,
    /// 错题本文件路径
    pub wrong_question_path: String,
    /// 聊天记录文件路径
    pub chat_record_path: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.chatfire.cn/v1".to_string(),
            llm_model_name: "gpt-4o".to_string(),
            exam_subject: "测试技术与传感器".to_string(),
            exam_question_count: 10,
            wrong_question_path: "wrong.json".to_string(),
            chat_record_path: "discuss.json".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            exam_subject: std::env::var("EXAM_SUBJECT").unwrap_or(default.exam_subject),
            exam_question_count: std::env::var("EXAM_QUESTION_COUNT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.exam_question_count),
            wrong_question_path: std::env::var("WRONG_QUESTION_PATH").unwrap_or(default.wrong_question_path),
            chat_record_path: std::env::var("CHAT_RECORD_PATH").unwrap_or(default.chat_record_path),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }
}

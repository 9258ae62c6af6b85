//! 控制台前端 - 薄 I/O 层
//!
//! 只负责读输入、调核心、打印结果，不包含任何业务逻辑。
//! 教学/考试/错题本/历史记录四个模式共享同一套核心入口。

use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::clients::{LanguageModel, OpenAiClient};
use crate::config::Config;
use crate::error::ExamError;
use crate::models::QuestionType;
use crate::services::GradingEngine;
use crate::stores::{ChatArchive, WrongQuestionBank};
use crate::utils::logging;
use crate::workflow::{ExamSession, ExamStatus, TeachingSession};

/// 应用主结构
pub struct App {
    config: Config,
    llm: Arc<dyn LanguageModel>,
    grader: GradingEngine,
    bank: WrongQuestionBank,
    archive: ChatArchive,
}

impl App {
    /// 初始化应用
    pub fn new(config: Config) -> Self {
        logging::log_startup(&config.llm_model_name);

        let llm: Arc<dyn LanguageModel> = Arc::new(OpenAiClient::new(&config));
        let grader = GradingEngine::new(Arc::clone(&llm));
        let bank = WrongQuestionBank::new(&config.wrong_question_path);
        let archive = ChatArchive::new(&config.chat_record_path);

        Self {
            config,
            llm,
            grader,
            bank,
            archive,
        }
    }

    /// 运行主菜单循环
    pub async fn run(&self) -> Result<()> {
        loop {
            println!("\n====== 考试助手 ======");
            println!("1. 教学模式");
            println!("2. 考试模式");
            println!("3. 错题本");
            println!("4. 历史记录");
            println!("q. 退出");

            match prompt("请选择: ")?.as_str() {
                "1" => self.run_teaching().await?,
                "2" => self.run_exam().await?,
                "3" => self.run_wrong_book()?,
                "4" => self.run_history()?,
                "q" | "Q" => break,
                other => println!("未知选项: {}", other),
            }
        }
        Ok(())
    }

    /// 教学模式：多轮问答，离开时可保存对话
    async fn run_teaching(&self) -> Result<()> {
        let mut session = TeachingSession::new();
        println!("进入教学模式，输入问题开始对话（back 返回主菜单）");

        loop {
            let input = prompt("你: ")?;
            match input.as_str() {
                "" => continue,
                "back" | "q" => break,
                _ => match session.ask(self.llm.as_ref(), &input).await {
                    Ok(reply) => println!("助手: {}", reply),
                    // 传输失败只影响这一轮，历史不变，可以继续
                    Err(e) => println!("调用 LLM 出错: {}", e),
                },
            }
        }

        if !session.history().is_empty() && prompt("保存本次对话？(y/n): ")? == "y" {
            match session.save(&self.archive)? {
                Some(key) => println!("对话已保存为 {}", key),
                None => {}
            }
        }
        Ok(())
    }

    /// 考试模式：生成 → 作答/翻题 → 提交 → 错题入库
    async fn run_exam(&self) -> Result<()> {
        let mut session = ExamSession::new(&self.config.exam_subject);
        let count = self.config.exam_question_count;

        println!("正在生成 {} 道考题，请稍候...", count);
        if let Err(e) = session.generate(self.llm.as_ref(), count).await {
            // 生成失败会话保持未开始，直接回主菜单，用户可重试
            println!("{}", e);
            return Ok(());
        }

        loop {
            self.show_current_question(&session);
            let input = prompt("作答（n 下一题 / p 上一题 / submit 提交 / back 放弃）: ")?;
            match input.as_str() {
                "n" => session.go_to(session.current_index() + 1),
                "p" => session.go_to(session.current_index().saturating_sub(1)),
                "back" | "q" => return Ok(()),
                "submit" => break,
                "" => continue,
                answer => {
                    session.record_answer(session.current_index(), answer);
                }
            }
        }

        println!("正在判卷，请稍候...");
        match session.submit(&self.grader).await {
            Ok(total) => println!("判卷完成，总分: {}", total),
            Err(e @ ExamError::InvalidState(_)) => {
                println!("{}", e);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }

        self.show_verdicts(&session);

        // 离开考试模式前，把非"正确"的题目投影进错题本
        let inserted = self.bank.ingest(&session)?;
        if inserted > 0 {
            println!("已保存 {} 道错题到错题本", inserted);
        }
        Ok(())
    }

    fn show_current_question(&self, session: &ExamSession) {
        let index = session.current_index();
        if let Some(question) = session.current_question() {
            println!(
                "\n第 {}/{} 题 [{}] {}",
                index + 1,
                session.questions().len(),
                question.qtype,
                question.description
            );
            for option in &question.options {
                println!("  {}. {}", option.label, option.text);
            }
            if let Some(answer) = session.answer(index) {
                println!("  当前作答: {}", answer);
            }
            if session.status() == ExamStatus::Submitted {
                if let Some(verdict) = session.verdict(index) {
                    println!("  判卷: {} ({} 分) - {}", verdict.result, verdict.score, verdict.reason);
                }
            }
        }
    }

    fn show_verdicts(&self, session: &ExamSession) {
        for (index, verdict) in session.verdicts() {
            println!(
                "第 {} 题: {} ({} 分) - {}",
                index + 1,
                verdict.result,
                verdict.score,
                verdict.reason
            );
        }
    }

    /// 错题本：查看、按类型筛选、删除、清空
    fn run_wrong_book(&self) -> Result<()> {
        loop {
            let records = self.bank.list_all();
            if records.is_empty() {
                println!("错题本是空的");
            }
            for (key, record) in &records {
                println!(
                    "[{}] ({}) {}",
                    key,
                    record.type_label,
                    logging::truncate_text(&record.description, 40)
                );
            }

            let input = prompt("错题本（t <题型> 筛选 / d <键> 删除 / clear 清空 / back 返回）: ")?;
            match input.as_str() {
                "back" | "q" => return Ok(()),
                "clear" => {
                    self.bank.clear()?;
                }
                other => {
                    if let Some(key) = other.strip_prefix("d ") {
                        // NotFound 只提示，不改变任何状态
                        if let Err(e) = self.bank.delete(key.trim()) {
                            println!("{}", e);
                        }
                    } else if let Some(label) = other.strip_prefix("t ") {
                        match QuestionType::from_label(label) {
                            Some(qtype) => {
                                for (key, record) in self.bank.list_by_type(qtype) {
                                    println!(
                                        "[{}] {}",
                                        key,
                                        logging::truncate_text(&record.description, 40)
                                    );
                                }
                            }
                            None => println!("未知题型: {}", label),
                        }
                    }
                }
            }
        }
    }

    /// 历史记录：列出、查看、删除存档的对话
    fn run_history(&self) -> Result<()> {
        let list = self.archive.load_list();
        if list.is_empty() {
            println!("暂无历史对话");
            return Ok(());
        }
        for (key, preview) in &list {
            println!("[{}] {}", key, preview);
        }

        let input = prompt("历史记录（v <键> 查看 / d <键> 删除 / back 返回）: ")?;
        if let Some(key) = input.strip_prefix("v ") {
            match self.archive.load_detail(key.trim()) {
                Ok(turns) => {
                    for turn in turns {
                        println!("你: {}", turn.question);
                        println!("助手: {}", turn.answer);
                    }
                }
                Err(e) => println!("{}", e),
            }
        } else if let Some(key) = input.strip_prefix("d ") {
            if let Err(e) = self.archive.delete(key.trim()) {
                println!("{}", e);
            }
        }
        Ok(())
    }
}

/// 读取一行用户输入
fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    std::io::stdout().flush()?;
    let mut line = String::new();
    if std::io::stdin().lock().read_line(&mut line)? == 0 {
        // EOF 按退出处理
        info!("输入流已结束");
        return Ok("q".to_string());
    }
    let line = line.trim().to_string();
    if line.len() > 2000 {
        warn!("输入过长，已截断");
        return Ok(logging::truncate_text(&line, 2000));
    }
    Ok(line)
}

//! 语音识别馈送 - 基础设施层
//!
//! 持有识别工作线程这一稀缺资源，只向外暴露 start / stop / poll 能力。
//! 馈送只产出文本片段，绝不直接触碰会话或存储状态——识别出的文本由
//! 前端通过与键盘输入相同的入口转发。
//!
//! 并发模型：
//! - 专用工作线程逐帧读取识别结果，写入有界交换队列
//! - 每读一帧检查一次取消标志，取消延迟以一帧为界
//! - 消费方按固定间隔轮询，一次取空当前全部片段并只取最新一条
//!   （过时的中间片段可丢弃）

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::JoinHandle;

use tracing::{debug, info, warn};

/// 交换队列容量
const EXCHANGE_CAPACITY: usize = 64;

/// 识别馈送产出的一个条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// 一段识别出的文本
    Text(String),
    /// 工作线程已停止（结束哨兵）
    Stopped,
    /// 识别失败（错误哨兵，携带失败描述）
    Error(String),
}

/// 识别文本来源：一次调用约等于一个音频帧的处理
///
/// `Ok(None)` 表示没有新的完整句子（继续读下一帧），
/// 实现内部应在帧粒度上阻塞，使取消检查的节奏与帧对齐。
pub trait FragmentSource: Send {
    /// 阻塞读取下一段识别文本；`Err` 表示音频流或识别服务失败
    fn next_fragment(&mut self) -> anyhow::Result<Option<String>>;

    /// 音频流是否已结束
    fn is_finished(&self) -> bool {
        false
    }
}

/// 语音识别馈送
pub struct RecognitionFeed {
    receiver: Receiver<Fragment>,
    cancel: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl RecognitionFeed {
    /// 启动识别工作线程
    pub fn start(source: impl FragmentSource + 'static) -> Self {
        let (sender, receiver) = std::sync::mpsc::sync_channel(EXCHANGE_CAPACITY);
        let cancel = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancel);

        let worker = std::thread::spawn(move || run_worker(source, sender, flag));
        info!("语音识别已启动");

        Self {
            receiver,
            cancel,
            worker: Some(worker),
        }
    }

    /// 取空当前可用的条目，返回最新的一条；队列为空时返回 None
    pub fn poll(&self) -> Option<Fragment> {
        let mut latest = None;
        while let Ok(fragment) = self.receiver.try_recv() {
            latest = Some(fragment);
        }
        latest
    }

    /// 通知工作线程停止并等待其退出
    pub fn stop(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
            info!("语音识别已停止");
        }
    }

    /// 工作线程是否仍在运行
    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .map(|worker| !worker.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for RecognitionFeed {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_worker(
    mut source: impl FragmentSource,
    sender: SyncSender<Fragment>,
    cancel: Arc<AtomicBool>,
) {
    loop {
        // 每帧检查一次取消标志
        if cancel.load(Ordering::Relaxed) || source.is_finished() {
            break;
        }
        match source.next_fragment() {
            Ok(Some(text)) => {
                debug!("识别到文本片段: {}", text);
                push(&sender, Fragment::Text(text));
            }
            Ok(None) => continue,
            Err(e) => {
                warn!("语音识别出错: {}", e);
                push(&sender, Fragment::Error(e.to_string()));
                return;
            }
        }
    }
    push(&sender, Fragment::Stopped);
}

/// 非阻塞入队：队列满时丢弃该条目（过时片段本就可丢弃），
/// 消费方已断开时静默忽略
fn push(sender: &SyncSender<Fragment>, fragment: Fragment) {
    match sender.try_send(fragment) {
        Ok(()) | Err(TrySendError::Disconnected(_)) => {}
        Err(TrySendError::Full(_)) => {
            debug!("识别交换队列已满，丢弃过时片段");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    /// 按脚本逐帧产出片段的假识别源
    struct ScriptedSource {
        frames: Vec<anyhow::Result<Option<String>>>,
        cursor: usize,
    }

    impl ScriptedSource {
        fn new(frames: Vec<anyhow::Result<Option<String>>>) -> Self {
            Self { frames, cursor: 0 }
        }
    }

    impl FragmentSource for ScriptedSource {
        fn next_fragment(&mut self) -> anyhow::Result<Option<String>> {
            let frame = self.frames.get_mut(self.cursor);
            self.cursor += 1;
            match frame {
                Some(frame) => std::mem::replace(frame, Ok(None)),
                None => {
                    // 脚本放完后模拟静音帧
                    std::thread::sleep(Duration::from_millis(5));
                    Ok(None)
                }
            }
        }

        fn is_finished(&self) -> bool {
            false
        }
    }

    fn wait_for<T>(feed: &RecognitionFeed, pick: impl Fn(Fragment) -> Option<T>) -> T {
        for _ in 0..200 {
            if let Some(fragment) = feed.poll() {
                if let Some(value) = pick(fragment) {
                    return value;
                }
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        panic!("等待识别片段超时");
    }

    #[test]
    fn test_poll_returns_latest_fragment() {
        let source = ScriptedSource::new(vec![
            Ok(Some("你".to_string())),
            Ok(Some("你好".to_string())),
            Ok(Some("你好世界".to_string())),
        ]);
        let mut feed = RecognitionFeed::start(source);

        // 一次轮询取空队列，只保留最新片段
        let text = wait_for(&feed, |fragment| match fragment {
            Fragment::Text(text) if text == "你好世界" => Some(text),
            _ => None,
        });
        assert_eq!(text, "你好世界");
        feed.stop();
    }

    #[test]
    fn test_stop_emits_stopped_sentinel() {
        let source = ScriptedSource::new(vec![]);
        let mut feed = RecognitionFeed::start(source);
        assert!(feed.is_running());

        feed.stop();
        assert!(!feed.is_running());

        let mut saw_stopped = false;
        while let Ok(fragment) = feed.receiver.try_recv() {
            if fragment == Fragment::Stopped {
                saw_stopped = true;
            }
        }
        assert!(saw_stopped);
    }

    #[test]
    fn test_source_error_emits_error_sentinel() {
        let source = ScriptedSource::new(vec![
            Ok(Some("片段".to_string())),
            Err(anyhow::anyhow!("麦克风被占用")),
        ]);
        let feed = RecognitionFeed::start(source);

        let description = wait_for(&feed, |fragment| match fragment {
            Fragment::Error(description) => Some(description),
            _ => None,
        });
        assert!(description.contains("麦克风被占用"));
    }
}

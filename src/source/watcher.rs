//! 配置文件监控模块
//!
//! 监控文件配置源对应的文件，变更后自动重载并广播事件

use crate::error::{Result, SourceError};
use crate::source::FileSource;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tracing::{debug, error, info};

/// 配置源变更事件
#[derive(Debug, Clone)]
pub struct SourceChangeEvent {
    /// 配置文件路径
    pub path: PathBuf,
    /// 重载版本号
    pub version: u64,
    /// 变更时间
    pub timestamp: Instant,
}

/// 配置文件监控器
pub struct SourceWatcher {
    /// 被监控的文件配置源
    source: Arc<FileSource>,
    /// 文件系统监控器
    watcher: Option<RecommendedWatcher>,
    /// 事件发送器
    event_sender: broadcast::Sender<SourceChangeEvent>,
    /// 防抖动延迟
    debounce_delay: Duration,
}

impl SourceWatcher {
    /// 创建新的配置文件监控器
    ///
    /// # 参数
    /// * `source` - 文件配置源
    /// * `debounce_delay` - 防抖动延迟时间
    ///
    /// # 返回
    /// * `(Self, broadcast::Receiver<SourceChangeEvent>)` - 监控器和事件接收器
    pub fn new(
        source: Arc<FileSource>,
        debounce_delay: Duration,
    ) -> (Self, broadcast::Receiver<SourceChangeEvent>) {
        let (event_sender, event_receiver) = broadcast::channel(32);

        let watcher = Self {
            source,
            watcher: None,
            event_sender,
            debounce_delay,
        };

        (watcher, event_receiver)
    }

    /// 启动配置文件监控
    pub fn start(&mut self) -> Result<()> {
        let target_path = self.source.path().to_path_buf();
        info!("启动配置文件监控: {}", target_path.display());

        let (tx, rx) = mpsc::channel();
        let mut watcher = RecommendedWatcher::new(
            tx,
            notify::Config::default().with_poll_interval(Duration::from_secs(1)),
        )
        .map_err(|e| SourceError::WatchError(format!("创建文件监控器失败: {e}")))?;

        // 监控文件所在目录，编辑器的替换式写入才能被捕获
        let watch_path = target_path.parent().unwrap_or(&target_path);
        watcher
            .watch(watch_path, RecursiveMode::NonRecursive)
            .map_err(|e| {
                SourceError::WatchError(format!("监控目录失败 {}: {e}", watch_path.display()))
            })?;

        self.watcher = Some(watcher);

        let source = Arc::clone(&self.source);
        let event_sender = self.event_sender.clone();
        let debounce_delay = self.debounce_delay;

        tokio::spawn(async move {
            Self::handle_file_events(rx, source, target_path, event_sender, debounce_delay).await;
        });

        info!("配置文件监控已启动");
        Ok(())
    }

    /// 处理文件系统事件
    async fn handle_file_events(
        rx: mpsc::Receiver<notify::Result<Event>>,
        source: Arc<FileSource>,
        target_path: PathBuf,
        event_sender: broadcast::Sender<SourceChangeEvent>,
        debounce_delay: Duration,
    ) {
        let mut last_event_time: Option<Instant> = None;
        let mut version = 1u64;

        for res in rx {
            match res {
                Ok(event) => {
                    if !Self::is_target_file_event(&event, &target_path) {
                        continue;
                    }

                    debug!("检测到配置文件变更事件: {:?}", event);

                    // 防抖动处理
                    let now = Instant::now();
                    if let Some(last_time) = last_event_time {
                        if now.duration_since(last_time) < debounce_delay {
                            debug!("跳过重复事件（防抖动）");
                            continue;
                        }
                    }
                    last_event_time = Some(now);

                    // 延迟处理，确保文件写入完成
                    tokio::time::sleep(debounce_delay).await;

                    match source.reload().await {
                        Ok(()) => {
                            info!("配置源重载成功，版本: {}", version);

                            let change_event = SourceChangeEvent {
                                path: target_path.clone(),
                                version,
                                timestamp: Instant::now(),
                            };
                            version += 1;

                            if let Err(e) = event_sender.send(change_event) {
                                error!("发送配置变更事件失败: {}", e);
                            }
                        }
                        Err(e) => {
                            error!("配置源重载失败: {}", e);
                        }
                    }
                }
                Err(e) => {
                    error!("文件监控事件错误: {}", e);
                }
            }
        }
    }

    /// 检查是否是目标文件的事件
    fn is_target_file_event(event: &Event, target_path: &Path) -> bool {
        match &event.kind {
            EventKind::Modify(_) | EventKind::Create(_) => {
                event.paths.iter().any(|path| path == target_path)
            }
            _ => false,
        }
    }

    /// 停止监控
    pub fn stop(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            drop(watcher);
            info!("配置文件监控已停止");
        }
    }

    /// 获取事件发送器的克隆
    pub fn get_event_sender(&self) -> broadcast::Sender<SourceChangeEvent> {
        self.event_sender.clone()
    }
}

impl Drop for SourceWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

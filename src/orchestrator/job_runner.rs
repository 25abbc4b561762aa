//! 会话调度 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：加载配置、创建后端和会话注册表
//! 2. **提交会话**：每个上传对应一个 tokio 任务，会话之间并发执行
//! 3. **任务监督**：任务被取消或 panic 时把会话标记为失败，错误不会向上传播
//! 4. **状态查询**：按会话 ID 返回状态快照
//! 5. **过期清理**：定期删除已结束且超过保留期的会话

use std::any::Any;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult, ConfigError, SessionError};
use crate::infrastructure::{DocumentContentReader, GenerationBackend, PlainTextReader};
use crate::models::JobState;
use crate::orchestrator::pipeline::{DocumentSource, Pipeline, ProgressReporter};
use crate::services::{InMemorySessionStore, LlmService, SessionStore};
use crate::utils::logging::{log_startup, short_id};

/// 取消后的会话描述
pub const CANCELLED_MESSAGE: &str = "Job cancelled";

/// 应用主结构
pub struct App {
    config: Config,
    store: Arc<dyn SessionStore>,
    pipeline: Arc<Pipeline>,
}

impl App {
    /// 初始化应用（LLM 后端 + 内存注册表 + 纯文本读取器）
    pub async fn initialize(config: Config) -> AppResult<Self> {
        if config.llm_api_key.trim().is_empty() {
            return Err(ConfigError::MissingSetting {
                name: "llm_api_key",
            }
            .into());
        }

        log_startup(&config);

        let backend: Arc<dyn GenerationBackend> = Arc::new(LlmService::new(&config));
        Ok(Self::with_backend(
            config,
            backend,
            Arc::new(InMemorySessionStore::new()),
            Arc::new(PlainTextReader::new()),
        ))
    }

    /// 使用指定的后端、注册表和读取器组装应用
    pub fn with_backend(
        config: Config,
        backend: Arc<dyn GenerationBackend>,
        store: Arc<dyn SessionStore>,
        reader: Arc<dyn DocumentContentReader>,
    ) -> Self {
        let pipeline = Arc::new(Pipeline::new(&config, backend, reader));
        Self {
            config,
            store,
            pipeline,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 提交已经提取好的文档文本
    pub fn submit_text(&self, filename: impl Into<String>, text: impl Into<String>) -> JobHandle {
        self.spawn(DocumentSource::Text(text.into()), Some(filename.into()))
    }

    /// 提交上传文件，由文档读取器转换为文本
    pub fn submit_file(&self, path: impl Into<PathBuf>) -> JobHandle {
        let path = path.into();
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string());
        self.spawn(DocumentSource::File(path), filename)
    }

    /// 查询会话状态
    pub fn status(&self, session_id: &Uuid) -> Result<JobState, SessionError> {
        self.store.get(session_id).ok_or(SessionError::NotFound {
            session_id: *session_id,
        })
    }

    /// 主动移除会话记录
    pub fn close_session(&self, session_id: &Uuid) -> Option<JobState> {
        self.store.remove(session_id)
    }

    /// 清理超过保留期的已结束会话
    pub fn evict_expired(&self) -> usize {
        self.store.evict_expired(self.config.session_ttl())
    }

    /// 启动后台清理任务，每隔 `period` 执行一次
    pub fn spawn_evictor(&self, period: Duration) -> JoinHandle<()> {
        let store = self.store.clone();
        let ttl = self.config.session_ttl();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period.max(Duration::from_millis(1)));
            loop {
                ticker.tick().await;
                let evicted = store.evict_expired(ttl);
                if evicted > 0 {
                    info!("🧹 已清理 {} 个过期会话", evicted);
                }
            }
        })
    }

    fn spawn(&self, source: DocumentSource, filename: Option<String>) -> JobHandle {
        let session_id = Uuid::new_v4();
        let initial = JobState::new(session_id, filename);
        self.store.put(initial.clone());

        let (sender, receiver) = watch::channel(initial);
        let reporter = Arc::new(ProgressReporter::new(session_id, self.store.clone(), sender));

        let run = {
            let pipeline = self.pipeline.clone();
            let reporter = reporter.clone();
            tokio::spawn(async move { pipeline.run(source, &reporter).await })
        };
        let abort = run.abort_handle();
        let cancelled = reporter.cancel_flag();

        let supervisor = tokio::spawn(async move {
            if let Err(e) = run.await {
                let tag = short_id(&session_id);
                if e.is_cancelled() {
                    warn!("[会话 {}] ⚠️ 任务已取消", tag);
                    reporter.fail(CANCELLED_MESSAGE);
                } else {
                    let detail = match e.try_into_panic() {
                        Ok(payload) => panic_message(payload),
                        Err(e) => e.to_string(),
                    };
                    error!("[会话 {}] ❌ 任务异常退出: {}", tag, detail);
                    reporter.fail(AppError::Other(detail).to_string());
                }
            }
            reporter.snapshot()
        });

        JobHandle {
            session_id,
            progress: receiver,
            abort,
            cancelled,
            supervisor,
        }
    }
}

/// 会话句柄
///
/// 订阅进度、取消任务、等待结束。丢弃句柄不会影响任务执行。
pub struct JobHandle {
    session_id: Uuid,
    progress: watch::Receiver<JobState>,
    abort: AbortHandle,
    cancelled: Arc<AtomicBool>,
    supervisor: JoinHandle<JobState>,
}

impl JobHandle {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// 订阅状态变化（每次阶段或描述更新都会推送）
    pub fn progress(&self) -> watch::Receiver<JobState> {
        self.progress.clone()
    }

    /// 取消任务，会话标记为 `Job cancelled`
    ///
    /// 正在写入的导出文件会被删除。
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.abort.abort();
    }

    /// 等待会话结束并返回最终状态
    pub async fn wait(self) -> JobState {
        match self.supervisor.await {
            Ok(state) => state,
            Err(e) => {
                error!("[会话 {}] 监督任务异常: {}", short_id(&self.session_id), e);
                self.progress.borrow().clone()
            }
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "task panicked".to_string()
    }
}

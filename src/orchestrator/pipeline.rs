//! 单个会话的处理管线 - 编排层
//!
//! 读取文档 → 内容校验 → 功能提取 → 逐个功能生成 → 汇总 → 导出。
//! 所有状态变化都经过 [`ProgressReporter`]，它同时写入会话注册表并推送到 watch 通道。

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppResult, ExportError, SessionError};
use crate::infrastructure::{DocumentContentReader, GenerationBackend};
use crate::models::{Feature, JobPhase, JobState, Stats, TestCase};
use crate::services::normalizer::normalize_feature;
use crate::services::{
    ContentGate, FeatureExtractor, ResultAggregator, SessionStore, SpreadsheetExporter,
    TestCaseSynthesizer,
};
use crate::utils::logging::{log_run_complete, log_run_start, short_id};
use crate::workflow::{FeatureCtx, FeatureFlow};

/// 文档来源
#[derive(Debug, Clone)]
pub enum DocumentSource {
    /// 调用方已经提取好的文本
    Text(String),
    /// 需要读取的上传文件
    File(PathBuf),
}

impl DocumentSource {
    fn upload_path(&self) -> Option<&Path> {
        match self {
            DocumentSource::File(path) => Some(path),
            DocumentSource::Text(_) => None,
        }
    }
}

/// 进度报告器
///
/// 每次修改都写回注册表，然后把新快照推送给订阅者。
/// 同时持有会话的取消标记，供后台导出线程检查。
pub struct ProgressReporter {
    session_id: Uuid,
    store: Arc<dyn SessionStore>,
    sender: watch::Sender<JobState>,
    cancelled: Arc<AtomicBool>,
}

impl ProgressReporter {
    pub fn new(session_id: Uuid, store: Arc<dyn SessionStore>, sender: watch::Sender<JobState>) -> Self {
        Self {
            session_id,
            store,
            sender,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    pub fn advance(&self, phase: JobPhase, message: impl Into<String>) -> Result<JobState, SessionError> {
        let message = message.into();
        self.apply(&mut |state| state.advance(phase, message.clone()))
    }

    pub fn report(&self, message: impl Into<String>) -> Result<JobState, SessionError> {
        let message = message.into();
        self.apply(&mut |state| state.report(message.clone()))
    }

    pub fn complete(
        &self,
        artifact_reference: impl Into<String>,
        summary: Stats,
        message: impl Into<String>,
    ) -> Result<JobState, SessionError> {
        let artifact_reference = artifact_reference.into();
        let message = message.into();
        self.apply(&mut |state| {
            state.complete(artifact_reference.clone(), summary.clone(), message.clone())
        })
    }

    /// 标记失败；会话已结束时忽略
    pub fn fail(&self, detail: impl Into<String>) {
        let detail = detail.into();
        if let Err(e) = self.apply(&mut |state| state.fail(detail.clone())) {
            debug!(
                "[会话 {}] 忽略失败标记（{}）: {}",
                short_id(&self.session_id),
                e,
                detail
            );
        }
    }

    /// 当前快照（优先注册表，会话已被清理时取最后推送的值）
    pub fn snapshot(&self) -> JobState {
        self.store
            .get(&self.session_id)
            .unwrap_or_else(|| self.sender.borrow().clone())
    }

    fn apply(
        &self,
        change: &mut dyn FnMut(&mut JobState) -> Result<(), SessionError>,
    ) -> Result<JobState, SessionError> {
        let state = self.store.update(&self.session_id, change)?;
        self.sender.send_replace(state.clone());
        Ok(state)
    }
}

/// 处理管线
///
/// - 持有各项业务能力，本身无状态，可被多个会话共享
/// - 会话内的后端调用严格串行
pub struct Pipeline {
    gate: ContentGate,
    reader: Arc<dyn DocumentContentReader>,
    extractor: FeatureExtractor,
    flow: FeatureFlow,
    exporter: SpreadsheetExporter,
    cleanup_uploads: bool,
}

impl Pipeline {
    pub fn new(
        config: &Config,
        backend: Arc<dyn GenerationBackend>,
        reader: Arc<dyn DocumentContentReader>,
    ) -> Self {
        Self {
            gate: ContentGate::from_config(config),
            reader,
            extractor: FeatureExtractor::new(backend.clone(), config.max_document_chars),
            flow: FeatureFlow::new(TestCaseSynthesizer::new(backend, config.rate_limit_delay())),
            exporter: SpreadsheetExporter::new(&config.download_folder, config.export_format),
            cleanup_uploads: config.cleanup_uploads,
        }
    }

    /// 处理一个会话，结果写入会话状态，不向上返回错误
    pub async fn run(&self, source: DocumentSource, reporter: &ProgressReporter) {
        let session_id = reporter.session_id();
        let tag = short_id(&session_id);
        let filename = reporter
            .snapshot()
            .filename
            .unwrap_or_else(|| "(text)".to_string());
        log_run_start(&session_id, &filename);

        match self.process(&source, reporter).await {
            Ok((artifact, stats)) => log_run_complete(&session_id, &stats, &artifact),
            Err(e) => {
                error!("[会话 {}] ❌ 处理失败: {}", tag, e);
                reporter.fail(e.to_string());
            }
        }

        if self.cleanup_uploads {
            if let Some(path) = source.upload_path() {
                match tokio::fs::remove_file(path).await {
                    Ok(()) => debug!("[会话 {}] 已删除上传文件: {}", tag, path.display()),
                    Err(e) => warn!("[会话 {}] ⚠️ 无法删除上传文件 {}: {}", tag, path.display(), e),
                }
            }
        }
    }

    async fn process(
        &self,
        source: &DocumentSource,
        reporter: &ProgressReporter,
    ) -> AppResult<(PathBuf, Stats)> {
        let tag = short_id(&reporter.session_id());

        // ========== 阶段 1: 读取文档 ==========
        reporter.advance(JobPhase::ReadingDocument, "Reading FRD document...")?;

        let text = match source {
            DocumentSource::Text(text) => text.clone(),
            DocumentSource::File(path) => self.reader.read(path).await?,
        };
        let document = self.gate.admit(Some(text.as_str()))?;
        info!("[会话 {}] 📄 文档通过校验: {} 字符", tag, document.chars().count());

        // ========== 阶段 2: 提取功能并生成测试用例 ==========
        reporter.advance(JobPhase::Processing, "Processing document with AI...")?;
        reporter.report("Extracting features from FRD document...")?;

        let raw_features = self.extractor.extract(document).await?;
        let features: Vec<Feature> = raw_features
            .iter()
            .enumerate()
            .map(|(i, raw)| normalize_feature(raw, i + 1))
            .collect();

        let total = features.len();
        info!("[会话 {}] 🧩 找到 {} 个功能", tag, total);
        reporter.report(format!("Found {} features. Generating test cases...", total))?;

        let test_cases = self.generate_all(&features, &tag, reporter).await?;

        reporter.report(format!(
            "Generated {} test cases successfully!",
            test_cases.len()
        ))?;

        // ========== 阶段 3: 汇总并导出 ==========
        reporter.advance(JobPhase::Saving, "Saving test cases...")?;

        let stats = ResultAggregator::stats(&test_cases);
        let artifact = self.export(test_cases, reporter.cancel_flag()).await?;
        let artifact_name = artifact
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| artifact.display().to_string());

        reporter.complete(artifact_name, stats.clone(), "Test cases generated successfully!")?;
        Ok((artifact, stats))
    }

    async fn generate_all(
        &self,
        features: &[Feature],
        tag: &str,
        reporter: &ProgressReporter,
    ) -> AppResult<Vec<TestCase>> {
        let total = features.len();
        let mut all_cases = Vec::new();

        for (i, feature) in features.iter().enumerate() {
            let ctx = FeatureCtx::new(tag, i + 1, total);
            reporter.report(format!(
                "Generating test cases for feature {}/{}: {}",
                ctx.position, total, feature.feature_name
            ))?;

            let outcome = self.flow.run(feature, &ctx).await;
            all_cases.extend(outcome.into_test_cases());
        }

        Ok(all_cases)
    }

    /// 写文件放到阻塞线程；任务被取消后该线程仍会跑完，由取消标记阻止留下文件
    async fn export(
        &self,
        test_cases: Vec<TestCase>,
        cancelled: Arc<AtomicBool>,
    ) -> Result<PathBuf, ExportError> {
        let exporter = self.exporter.clone();
        tokio::task::spawn_blocking(move || {
            exporter.export_unless_cancelled(&test_cases, None, &cancelled)
        })
            .await
            .map_err(|e| ExportError::TaskFailed(e.to_string()))?
    }
}

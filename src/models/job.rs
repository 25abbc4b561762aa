//! 会话状态机
//!
//! ```text
//! uploaded → reading_document → processing → saving → completed
//!     └──────────────┴──────────────┴───────────┴────→ error
//! ```
//!
//! 阶段与描述信息总是在同一次调用中一起更新。

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SessionError;
use crate::models::Stats;

/// 处理阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobPhase {
    Uploaded,
    ReadingDocument,
    Processing,
    Saving,
    Completed,
    Error,
}

impl JobPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            JobPhase::Uploaded => "uploaded",
            JobPhase::ReadingDocument => "reading_document",
            JobPhase::Processing => "processing",
            JobPhase::Saving => "saving",
            JobPhase::Completed => "completed",
            JobPhase::Error => "error",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobPhase::Completed | JobPhase::Error)
    }

    /// 正常流程中的下一个阶段
    pub fn next(self) -> Option<JobPhase> {
        match self {
            JobPhase::Uploaded => Some(JobPhase::ReadingDocument),
            JobPhase::ReadingDocument => Some(JobPhase::Processing),
            JobPhase::Processing => Some(JobPhase::Saving),
            JobPhase::Saving => Some(JobPhase::Completed),
            JobPhase::Completed | JobPhase::Error => None,
        }
    }
}

impl std::fmt::Display for JobPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 会话状态快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobState {
    pub session_id: Uuid,
    pub phase: JobPhase,
    /// 最新的进度描述
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_summary: Option<Stats>,
    /// 生成的文件名
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    pub created_at: DateTime<Local>,
    pub updated_at: DateTime<Local>,
}

impl JobState {
    /// 上传完成时创建
    pub fn new(session_id: Uuid, filename: Option<String>) -> Self {
        let now = Local::now();
        Self {
            session_id,
            phase: JobPhase::Uploaded,
            message: "File uploaded successfully".to_string(),
            filename,
            result_summary: None,
            artifact_reference: None,
            error_detail: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// 进入下一个非终止阶段
    pub fn advance(&mut self, phase: JobPhase, message: impl Into<String>) -> Result<(), SessionError> {
        if phase.is_terminal() || self.phase.next() != Some(phase) {
            return Err(self.invalid(phase));
        }
        self.phase = phase;
        self.set(message.into());
        Ok(())
    }

    /// 同一阶段内更新进度描述
    pub fn report(&mut self, message: impl Into<String>) -> Result<(), SessionError> {
        if self.phase.is_terminal() {
            return Err(self.invalid(self.phase));
        }
        self.set(message.into());
        Ok(())
    }

    /// saving → completed
    pub fn complete(
        &mut self,
        artifact_reference: impl Into<String>,
        summary: Stats,
        message: impl Into<String>,
    ) -> Result<(), SessionError> {
        if self.phase != JobPhase::Saving {
            return Err(self.invalid(JobPhase::Completed));
        }
        self.phase = JobPhase::Completed;
        self.artifact_reference = Some(artifact_reference.into());
        self.result_summary = Some(summary);
        self.set(message.into());
        Ok(())
    }

    /// 任意非终止阶段 → error
    pub fn fail(&mut self, detail: impl Into<String>) -> Result<(), SessionError> {
        if self.phase.is_terminal() {
            return Err(self.invalid(JobPhase::Error));
        }
        let detail = detail.into();
        self.phase = JobPhase::Error;
        self.error_detail = Some(detail.clone());
        self.artifact_reference = None;
        self.set(detail);
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    fn set(&mut self, message: String) {
        self.message = message;
        self.updated_at = Local::now();
    }

    fn invalid(&self, to: JobPhase) -> SessionError {
        SessionError::InvalidTransition {
            from: self.phase,
            to,
        }
    }
}

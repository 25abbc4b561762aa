//! # FRD Test Case Generator
//!
//! 把功能需求文档（FRD）转换为结构化的测试用例表格
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 外部资源的抽象，只暴露能力
//! - `GenerationBackend` - 生成后端（提取功能 / 生成测试用例）
//! - `DocumentContentReader` - 文档读取（文件 → 文本）
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个文档或单个功能
//! - `ContentGate` - 文档内容校验
//! - `FeatureExtractor` / `TestCaseSynthesizer` - 调用后端并解析响应
//! - `normalizer` - 原始记录规范化
//! - `ResultAggregator` - 汇总统计
//! - `SpreadsheetExporter` - 导出 Excel / CSV
//! - `SessionStore` - 会话注册表
//! - `LlmService` - 基于 OpenAI 兼容接口的生成后端
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个功能"的完整处理流程
//! - `FeatureCtx` - 上下文封装（会话 + 功能序号）
//! - `FeatureFlow` - 流程编排（生成 → 规范化 → 限速）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/job_runner` - 会话调度，管理任务和注册表
//! - `orchestrator/pipeline` - 单个会话的阶段编排
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{DocumentContentReader, GenerationBackend, PlainTextReader};
pub use models::{Feature, JobPhase, JobState, Stats, TestCase};
pub use orchestrator::{App, JobHandle};
pub use services::{ExportFormat, InMemorySessionStore, SessionStore};
pub use workflow::{FeatureCtx, FeatureFlow, FeatureOutcome};

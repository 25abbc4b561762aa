//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责会话调度和阶段编排，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `job_runner` - 会话调度
//! - 管理应用生命周期（初始化、提交、查询、清理）
//! - 每个会话一个 tokio 任务，会话之间并发
//! - 监督任务：取消 / panic 都转换为会话失败
//! - 通过 watch 通道推送进度
//!
//! ### `pipeline` - 单个会话的处理管线
//! - 读取文档、内容校验、功能提取
//! - 逐个功能调用 FeatureFlow（严格串行）
//! - 汇总统计、导出文件
//!
//! ## 层次关系
//!
//! ```text
//! job_runner (处理多个会话)
//!     ↓
//! pipeline (处理 Vec<Feature>)
//!     ↓
//! workflow::FeatureFlow (处理单个 Feature)
//!     ↓
//! services (能力层：extract / synthesize / normalize / export)
//!     ↓
//! infrastructure (基础设施：GenerationBackend / DocumentContentReader)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：job_runner 管会话，pipeline 管阶段
//! 2. **向下依赖**：编排层 → workflow → services → infrastructure
//! 3. **无业务逻辑**：只做调度和进度报告，不做具体业务判断

pub mod job_runner;
pub mod pipeline;

// 重新导出主要类型
pub use job_runner::{App, JobHandle, CANCELLED_MESSAGE};
pub use pipeline::{DocumentSource, Pipeline, ProgressReporter};

/// 日志工具模块
///
/// 提供日志初始化以及格式化输出的辅助函数
use std::path::Path;

use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::config::Config;
use crate::models::Stats;

/// 初始化日志
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 debug / info 级别。重复调用无副作用。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - FRD 测试用例生成");
    info!("🤖 模型: {}", config.llm_model_name);
    info!("⏱️ 调用间隔: {} ms", config.rate_limit_delay_ms);
    info!("📁 输出目录: {}", config.download_folder.display());
    info!("{}", "=".repeat(60));
}

/// 记录会话开始
pub fn log_run_start(session_id: &Uuid, filename: &str) {
    info!("\n{}", "=".repeat(60));
    info!("[会话 {}] 📄 开始处理文档: {}", short_id(session_id), filename);
    info!("{}", "=".repeat(60));
}

/// 记录会话完成统计
pub fn log_run_complete(session_id: &Uuid, stats: &Stats, artifact: &Path) {
    let tag = short_id(session_id);
    info!("\n{}", "─".repeat(60));
    info!("[会话 {}] 📊 处理完成统计", tag);
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("[会话 {}] ✅ 测试用例: {}", tag, stats.total_test_cases);
    info!("[会话 {}] 🧩 覆盖功能: {}", tag, stats.features.len());
    for (test_type, count) in &stats.test_types {
        info!("[会话 {}]   {}: {}", tag, test_type, count);
    }
    info!("[会话 {}] 💾 已保存至: {}", tag, artifact.display());
    info!("{}", "─".repeat(60));
}

/// 会话 ID 的短格式（前 8 位），仅用于日志
pub fn short_id(session_id: &Uuid) -> String {
    session_id.simple().to_string().chars().take(8).collect()
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（字符数）
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text_counts_chars() {
        assert_eq!(truncate_text("短文本", 10), "短文本");
        assert_eq!(truncate_text("功能需求文档", 2), "功能...");
    }

    #[test]
    fn test_short_id_length() {
        let id = Uuid::new_v4();
        assert_eq!(short_id(&id).len(), 8);
    }
}

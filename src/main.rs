use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;

use frd_testgen::utils::logging;
use frd_testgen::{App, Config, ExportFormat, JobPhase};

#[derive(Parser, Debug)]
#[command(
    name = "frd-testgen",
    about = "Generate test cases from a Functional Requirements Document",
    version
)]
struct Args {
    /// FRD 文档路径（.txt / .md）
    file: PathBuf,

    /// TOML 配置文件（环境变量优先）
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 输出目录
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// 导出格式：xlsx / csv
    #[arg(short, long)]
    format: Option<ExportFormat>,

    /// 显示详细日志
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 加载配置
    let mut config = match &args.config {
        Some(path) => Config::from_toml_file(path)
            .with_context(|| format!("无法加载配置文件 {}", path.display()))?,
        None => Config::from_env(),
    };
    if let Some(dir) = args.output_dir {
        config.download_folder = dir;
    }
    if let Some(format) = args.format {
        config.export_format = format;
    }
    config.verbose_logging |= args.verbose;

    // 初始化日志
    logging::init(config.verbose_logging);

    let download_folder = config.download_folder.clone();
    let app = App::initialize(config).await.context("初始化失败")?;

    let handle = app.submit_file(&args.file);
    let mut progress = handle.progress();
    let printer = tokio::spawn(async move {
        loop {
            {
                let state = progress.borrow_and_update();
                eprintln!("[{}] {}", state.phase, state.message);
                if state.is_terminal() {
                    break;
                }
            }
            if progress.changed().await.is_err() {
                break;
            }
        }
    });

    let state = handle.wait().await;
    let _ = printer.await;

    if state.phase != JobPhase::Completed {
        bail!("{}", state.message);
    }

    if let Some(artifact) = &state.artifact_reference {
        info!("💾 输出文件: {}", download_folder.join(artifact).display());
        println!("{}", download_folder.join(artifact).display());
    }
    if let Some(summary) = &state.result_summary {
        let json = serde_json::to_string_pretty(summary).context("无法序列化统计信息")?;
        eprintln!("{}", json);
    }

    Ok(())
}

//! # Autotest 命令行入口
//!
//! 加载配置、启动浏览器会话并执行 JSON 测试文件。
//!
//! ## 主要功能
//! - 解析命令行参数（配置文件、测试文件、无头模式）
//! - 初始化日志（`RUST_LOG` 优先，其次为配置中的 `log_level`）
//! - 启动或连接浏览器，逐个执行用例并输出报告
//! - 失败时保存错误截图并以非零状态退出
//!
//! ## 环境变量
//! - `RUST_LOG`: 日志过滤规则
//! - `AUTOTEST_*`: 覆盖配置文件中的同名字段，例如 `AUTOTEST_HEADLESS=true`

use anyhow::Context;
use autotest::{captcha::solver_from_config, config::Config, driver::Session, runner::Runner};
use clap::Parser;
use std::path::PathBuf;
use tokio::io::AsyncBufReadExt;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "autotest", version, about = "Run declarative UI test cases in Chrome")]
struct Cli {
    /// Configuration file (YAML, TOML or JSON)
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Test case file
    #[arg(short, long, default_value = "testcase/login_example.json")]
    file: PathBuf,

    /// Run the browser headless regardless of the configuration
    #[arg(long)]
    headless: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_result = Config::load(Some(cli.config.as_path()));
    let mut config = match &config_result {
        Ok(config) => config.clone(),
        Err(_) => Config::default(),
    };
    if cli.headless {
        config.headless = true;
    }

    // Initialize tracing - respect RUST_LOG environment variable
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Autotest v{}", autotest::VERSION);
    if let Err(e) = config_result {
        warn!("{}; using default configuration", e);
    }

    let session = Session::start(&config)
        .await
        .context("failed to start browser session")?;
    let runner = Runner::new(session.page(), &config, solver_from_config(&config));

    let success = match runner.run_suite_file(&cli.file).await {
        Ok(report) => {
            if let Some(case) = report.first_failure() {
                error!("First failure: {}", case);
            }
            report.is_success()
        }
        Err(e) => {
            error!("{}", e);
            false
        }
    };
    if !success {
        runner.capture_error_screenshot().await;
    }

    if config.keep_browser_open {
        info!("Keeping the browser open; press Enter or Ctrl+C to exit");
        wait_for_exit().await;
        return Ok(());
    }

    if let Err(e) = session.stop().await {
        warn!("Failed to close browser session: {}", e);
    }

    if !success {
        std::process::exit(1);
    }
    info!("All test cases passed");
    Ok(())
}

/// Block until Enter, Ctrl+C or SIGTERM
async fn wait_for_exit() {
    let enter = async {
        let mut line = String::new();
        let mut stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let _ = stdin.read_line(&mut line).await;
    };

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = enter => {}
                    _ = tokio::signal::ctrl_c() => info!("Received Ctrl+C signal"),
                    _ = sigterm.recv() => info!("Received SIGTERM signal"),
                }
            }
            Err(e) => {
                warn!("Cannot listen for SIGTERM: {}", e);
                tokio::select! {
                    _ = enter => {}
                    _ = tokio::signal::ctrl_c() => info!("Received Ctrl+C signal"),
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::select! {
            _ = enter => {}
            _ = tokio::signal::ctrl_c() => info!("Received Ctrl+C signal"),
        }
    }
}

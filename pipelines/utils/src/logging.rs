//! 日志初始化: 同时输出到终端 (stderr) 与日志文件.

use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::{self, time::ChronoLocal};
use tracing_subscriber::prelude::*;

/// 日志时间戳格式.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 安装全局日志订阅者, 级别为 INFO.
///
/// `log_path` 处的文件会被重新创建 (截断旧内容). 文件中不写入 ANSI 颜色码.
/// 每个进程只能成功调用一次.
pub fn init<P: AsRef<Path>>(log_path: P) -> Result<()> {
    let log_path = log_path.as_ref();
    let file = File::create(log_path)
        .with_context(|| format!("cannot create log file {}", log_path.display()))?;

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_timer(ChronoLocal::new(TIME_FORMAT.to_owned()));
    let logfile = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_timer(ChronoLocal::new(TIME_FORMAT.to_owned()));

    tracing_subscriber::registry()
        .with(LevelFilter::INFO)
        .with(console)
        .with(logfile)
        .try_init()
        .context("logging already initialized")
}

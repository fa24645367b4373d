//! Logging setup / 日志初始化
//!
//! Console output always; an extra file sink when `output_path` is set.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Logger settings / 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Application name stamped on facade log events / 应用名
    #[serde(default = "default_app_name")]
    pub app_name: String,
    /// Default filter when `RUST_LOG` is unset / 日志级别
    #[serde(default = "default_level")]
    pub level: String,
    /// Optional log file / 日志文件路径
    #[serde(default)]
    pub output_path: Option<String>,
    /// JSON formatted file output / 文件日志使用JSON格式
    #[serde(default = "default_json")]
    pub json: bool,
}

fn default_app_name() -> String {
    "file-storage".to_string()
}

fn default_level() -> String {
    "info".to_string()
}

fn default_json() -> bool {
    true
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            level: default_level(),
            output_path: None,
            json: default_json(),
        }
    }
}

/// Install the global subscriber. Keep the returned guard alive so buffered
/// file output gets flushed / 初始化日志，需持有返回的guard
pub fn init_logging(config: &LogConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("file_storage={}", config.level)));

    let console_layer = fmt::layer().compact().with_target(false);

    let (file_layer, guard) = match &config.output_path {
        Some(output_path) => {
            let path = Path::new(output_path);
            let dir = match path.parent() {
                Some(dir) if !dir.as_os_str().is_empty() => dir,
                _ => Path::new("."),
            };
            std::fs::create_dir_all(dir)?;
            let file_name = path.file_name().ok_or_else(|| {
                anyhow::anyhow!("log output path has no file name: {}", output_path)
            })?;

            let file_appender = tracing_appender::rolling::never(dir, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            let layer = if config.json {
                fmt::layer().json().with_writer(non_blocking).with_ansi(false).boxed()
            } else {
                fmt::layer().with_writer(non_blocking).with_ansi(false).boxed()
            };
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context};
use tokio_util::sync::CancellationToken;

use file_storage::config::{self, StorageConfig};
use file_storage::logging::init_logging;
use file_storage::{DriverRegistry, DriverType, FileUploader, UploadFile};

const USAGE: &str = "\
Usage: file-storage [--config <path>] <command>

Commands:
  upload <file> [--random] [--driver <type>]
  multipart <file> <part-size-mb> [--random] [--driver <type>]
  delete <path>... [--driver <type>]
  version";

#[derive(Debug, PartialEq)]
enum Command {
    Upload { file: PathBuf, part_size_mb: Option<u64> },
    Delete { paths: Vec<String> },
    Version,
}

#[derive(Debug, PartialEq)]
struct Cli {
    config: Option<PathBuf>,
    driver: Option<DriverType>,
    random: bool,
    command: Command,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> anyhow::Result<Cli> {
    let mut config = None;
    let mut driver = None;
    let mut random = false;
    let mut positional = Vec::new();

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let value = args.next().ok_or_else(|| anyhow!("--config needs a value"))?;
                config = Some(PathBuf::from(value));
            }
            "--driver" => {
                let value = args.next().ok_or_else(|| anyhow!("--driver needs a value"))?;
                driver = Some(value.parse::<DriverType>()?);
            }
            "--random" => random = true,
            "-h" | "--help" => bail!("{}", USAGE),
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let command = match positional.next().as_deref() {
        Some("upload") => Command::Upload {
            file: positional
                .next()
                .map(PathBuf::from)
                .ok_or_else(|| anyhow!("upload needs a file"))?,
            part_size_mb: None,
        },
        Some("multipart") => {
            let file = positional
                .next()
                .map(PathBuf::from)
                .ok_or_else(|| anyhow!("multipart needs a file"))?;
            let part_size = positional
                .next()
                .ok_or_else(|| anyhow!("multipart needs a part size in MB"))?;
            let part_size_mb = part_size
                .parse::<u64>()
                .with_context(|| format!("invalid part size: {}", part_size))?;
            Command::Upload {
                file,
                part_size_mb: Some(part_size_mb),
            }
        }
        Some("delete") => {
            let paths: Vec<String> = positional.by_ref().collect();
            if paths.is_empty() {
                bail!("delete needs at least one path");
            }
            Command::Delete { paths }
        }
        Some("version") => Command::Version,
        Some(other) => bail!("unknown command: {}\n\n{}", other, USAGE),
        None => bail!("{}", USAGE),
    };

    Ok(Cli {
        config,
        driver,
        random,
        command,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = parse_args(std::env::args().skip(1))?;

    if cli.command == Command::Version {
        println!("file-storage {} (built {})", env!("CARGO_PKG_VERSION"), env!("BUILD_TIME"));
        return Ok(());
    }

    // Load configuration / 加载配置
    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let storage_config: StorageConfig = config::load_config(&config_path)?;

    let _log_guard = init_logging(&storage_config.log)?;

    let registry = DriverRegistry::from_config(&storage_config);
    let driver_type = cli.driver.unwrap_or(storage_config.default_driver);
    let driver = registry
        .get_driver(driver_type)
        .await
        .with_context(|| format!("driver {} is not available", driver_type))?;

    let uploader = FileUploader::new(driver).with_app_name(storage_config.log.app_name.clone());

    // Ctrl-C cancels the running operation / Ctrl-C 取消当前操作
    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl-C, cancelling");
            ctrl_c_token.cancel();
        }
    });

    match cli.command {
        Command::Upload { file, part_size_mb } => {
            let file = UploadFile::from_path(&file).await?;
            let result = match part_size_mb {
                Some(part_size_mb) => {
                    uploader
                        .multipart_upload(&file, cli.random, part_size_mb, &cancel)
                        .await?
                }
                None => uploader.upload(&file, cli.random, &cancel).await?,
            };
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Delete { paths } => {
            uploader.delete_objects(&paths, &cancel).await?;
            println!("Deleted {} path(s)", paths.len());
        }
        Command::Version => {}
    }

    Ok(())
}

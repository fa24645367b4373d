pub mod chunk;
pub mod config;
pub mod error;
pub mod file;
pub mod logging;
pub mod naming;
pub mod storage;
pub mod uploader;
pub mod utils;

// Driver modules (point to project root drivers via path attribute) / 驱动模块
#[path = "../drivers/mod.rs"]
pub mod drivers;

pub use error::{ErrorKind, Result, UploadError};
pub use file::UploadFile;
pub use storage::{DriverRegistry, DriverType, StorageDriver};
pub use uploader::{FileUploader, UploadResult};

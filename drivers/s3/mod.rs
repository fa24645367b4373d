//! S3-compatible storage / S3兼容存储
//!
//! `S3Backend` is also the transport of the OSS, COS, OBS and Qiniu drivers.

pub mod backend;
pub mod config;
pub mod driver;
pub mod factory;

pub use backend::{BucketOptions, S3Backend};
pub use config::S3CompatibleConfig;
pub use driver::S3Driver;
pub use factory::S3DriverFactory;

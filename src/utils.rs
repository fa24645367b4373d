//! Helper functions shared by drivers and the facade / 通用工具函数

use crate::error::{Result, UploadError};

/// Human-readable size in base 1024 / 文件大小格式化
///
/// `file_size(25 * 1024 * 1024) == "25.00MB"`
pub fn file_size(bytes: u64) -> String {
    const FACTOR: f64 = 1024.0;
    let mut size = bytes as f64;
    for unit in ["", "K", "M", "G", "T", "P"] {
        if size < FACTOR {
            return format!("{:.2}{}B", size, unit);
        }
        size /= FACTOR;
    }
    format!("{:.2}PB", size * FACTOR)
}

/// Content type from a file extension (with or without the dot) / 获取文件类型
pub fn get_content_type(ext: &str) -> String {
    mime_guess::from_ext(ext.trim_start_matches('.'))
        .first()
        .map(|m| m.to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string())
}

/// Prefix `http://` or `https://` unless the address already has a scheme / 补全协议
pub fn with_scheme(address: &str, use_ssl: bool) -> String {
    if address.is_empty() || address.starts_with("http://") || address.starts_with("https://") {
        return address.to_string();
    }
    let scheme = if use_ssl { "https" } else { "http" };
    format!("{}://{}", scheme, address)
}

/// Object key rules shared by all object stores / 校验对象名
pub fn check_valid_object_name(key: &str) -> Result<()> {
    let invalid = |reason: &str| Err(UploadError::invalid_destination(key, reason));

    if key.trim().is_empty() {
        return invalid("object name cannot be empty");
    }
    if key.len() > 1024 {
        return invalid("object name cannot be longer than 1024 characters");
    }
    if key.contains("//") {
        return invalid("object name with a \"//\" is not supported");
    }
    Ok(())
}

/// S3 bucket naming rules / 校验存储桶名称
pub fn check_valid_bucket_name(bucket: &str) -> Result<()> {
    let invalid = |reason: &str| Err(UploadError::invalid_destination(bucket, reason));

    if bucket.trim().is_empty() {
        return invalid("bucket name cannot be empty");
    }
    if bucket.len() < 3 {
        return invalid("bucket name cannot be shorter than 3 characters");
    }
    if bucket.len() > 63 {
        return invalid("bucket name cannot be longer than 63 characters");
    }
    if bucket.split('.').count() == 4 && bucket.split('.').all(|p| p.parse::<u8>().is_ok()) {
        return invalid("bucket name cannot be an ip address");
    }
    if bucket.contains("..") || bucket.contains(".-") || bucket.contains("-.") {
        return invalid("bucket name contains invalid characters");
    }

    let bytes = bucket.as_bytes();
    let edge_ok = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit();
    let body_ok = |b: u8| edge_ok(b) || b == b'.' || b == b'-';
    let edges_ok = edge_ok(bytes[0]) && edge_ok(bytes[bytes.len() - 1]);
    if !edges_ok || !bytes.iter().all(|b| body_ok(*b)) {
        return invalid("bucket name contains invalid characters");
    }

    Ok(())
}

//! Storage key generation / 存储路径与文件名生成
//!
//! Key layout: `{prefix}/{YYYY-MM-DD}/{name}`. The name is either the
//! original base name or a randomized one that keeps the original extension.

use rand::Rng;

const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of the random suffix appended to randomized names / 随机名后缀长度
pub const RANDOM_SUFFIX_LEN: usize = 6;

/// Characters trimmed from the right of every path segment / 默认裁剪字符
const DEFAULT_TRIM_CHARS: &[char] = &[
    '\t',     // Tab
    '\u{0B}', // Vertical tab
    '\n',     // New line
    '\r',     // Carriage return
    '\u{0C}', // New page
    ' ',      // Ordinary space
    '\0',     // NUL
    '\u{85}', // Next line
    '\u{A0}', // Non-breaking space
];

fn is_trim_char(c: char) -> bool {
    c == '/' || DEFAULT_TRIM_CHARS.contains(&c)
}

/// Random alphanumeric string / 生成随机字符串
pub fn randomly_name(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

/// Current local date partition, evaluated on every call / 当前日期分区
pub fn date_partition() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

/// Last path component, accepting both `/` and `\` separators / 获取文件基础名
pub fn base_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches(['/', '\\']);
    match trimmed.rfind(['/', '\\']) {
        Some(pos) => &trimmed[pos + 1..],
        None => trimmed,
    }
}

/// Extension including the dot, cut at any query marker / 获取文件扩展名
///
/// `ext("a/b.png?x=1") == ".png"`, `ext("README") == ""`
pub fn ext(path: &str) -> String {
    let name = base_name(path);
    let ext = match name.rfind('.') {
        Some(pos) => &name[pos..],
        None => return String::new(),
    };
    match ext.find('?') {
        Some(p) => ext[..p].to_string(),
        None => ext.to_string(),
    }
}

/// Join path segments with exactly one `/` / 拼接路径
///
/// Trailing separators and whitespace/control characters are trimmed from
/// every segment, leading separators from every segment but the first.
/// Empty segments are skipped.
pub fn join<S: AsRef<str>>(segments: &[S]) -> String {
    let mut joined = String::new();
    for segment in segments {
        let segment = segment.as_ref().replace('\\', "/");
        let mut segment = segment.trim_end_matches(is_trim_char);
        if !joined.is_empty() {
            segment = segment.trim_start_matches('/');
        }
        if segment.is_empty() {
            continue;
        }
        if !joined.is_empty() {
            joined.push('/');
        }
        joined.push_str(segment);
    }
    joined
}

fn to_base36(mut value: u128) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut buf = Vec::new();
    while value > 0 {
        buf.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    buf.reverse();
    String::from_utf8(buf).unwrap_or_default()
}

/// Randomized file name: base36 nanosecond timestamp + 6 random chars + ext / 随机文件名
pub fn random_file_name(original_name: &str) -> String {
    let nanos = chrono::Utc::now()
        .timestamp_nanos_opt()
        .map(|n| n.max(0) as u128)
        .unwrap_or_default();
    let name = format!("{}{}", to_base36(nanos), randomly_name(RANDOM_SUFFIX_LEN)).to_lowercase();
    format!("{}{}", name, ext(original_name))
}

/// Build the storage key for an upload / 生成上传路径
pub fn gen_name(prefix: &str, original_name: &str, randomly: bool) -> String {
    let name = if randomly {
        random_file_name(original_name)
    } else {
        base_name(original_name).to_string()
    };

    join(&[prefix, date_partition().as_str(), name.as_str()])
}

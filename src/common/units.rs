use lazy_static::lazy_static;
use regex::Regex;

pub const SIZE_UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

const PROGRESS_CELLS: usize = 10;
const FILLED_CELL: &str = "⬤";
const EMPTY_CELL: &str = "○";

/// 字节数转为可读字符串，如 `1.50MB`
pub fn get_readable_file_size(size_in_bytes: u64) -> String {
    if size_in_bytes == 0 {
        return "0B".to_string();
    }

    let mut size = size_in_bytes as f64;
    let mut index = 0;
    while size >= 1024.0 && index < SIZE_UNITS.len() - 1 {
        size /= 1024.0;
        index += 1;
    }

    format!("{:.2}{}", size, SIZE_UNITS[index])
}

/// 秒数转为 `1d2h3m4s` 形式，0 秒返回空字符串
pub fn get_readable_time(seconds: u64) -> String {
    const PERIODS: [(&str, u64); 4] = [("d", 86400), ("h", 3600), ("m", 60), ("s", 1)];

    let mut remaining = seconds;
    let mut result = String::new();
    for (name, period) in PERIODS {
        if remaining >= period {
            result.push_str(&format!("{}{}", remaining / period, name));
            remaining %= period;
        }
    }
    result
}

/// 解析 `hh:mm:ss`，格式错误时返回 0
pub fn time_to_seconds(duration: &str) -> u64 {
    let parts: Vec<&str> = duration.trim().split(':').collect();
    if parts.len() != 3 {
        return 0;
    }

    let parsed: Option<Vec<u64>> = parts.iter().map(|p| p.trim().parse().ok()).collect();
    match parsed.as_deref() {
        Some([h, m, s]) => h * 3600 + m * 60 + s,
        _ => 0,
    }
}

lazy_static! {
    static ref SPEED_PATTERN: Regex = Regex::new(r"^\s*(\d+(?:\.\d+)?|\.\d+)\s*([kmgtb])").unwrap();
}

/// 把引擎上报的速度字符串（如 `1.5MiB/s`、`300 KB/s`）转换为字节数
///
/// 只认第一个单位字母，无法识别时返回 0。
pub fn speed_string_to_bytes(size_text: &str) -> f64 {
    let lowered = size_text.to_lowercase();
    let Some(caps) = SPEED_PATTERN.captures(&lowered) else {
        return 0.0;
    };
    let Ok(value) = caps[1].parse::<f64>() else {
        return 0.0;
    };

    let multiplier = match &caps[2] {
        "k" => 1024.0,
        "m" => 1048576.0,
        "g" => 1073741824.0,
        "t" => 1099511627776.0,
        _ => 1.0,
    };
    value * multiplier
}

/// 解析 `45.3%` 或 `45.3`，格式错误时返回 0
pub fn parse_percentage(text: &str) -> f64 {
    text.trim()
        .trim_end_matches('%')
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// 把百分比限制在 [0, 100]，NaN 视为 0
pub fn clamp_percentage(pct: f64) -> f64 {
    if pct.is_nan() { 0.0 } else { pct.clamp(0.0, 100.0) }
}

/// 10 格进度条
pub fn get_progress_bar_string(pct: f64) -> String {
    let filled = (clamp_percentage(pct) / 10.0).floor() as usize;
    let filled = filled.min(PROGRESS_CELLS);
    format!(
        "{}{}",
        FILLED_CELL.repeat(filled),
        EMPTY_CELL.repeat(PROGRESS_CELLS - filled)
    )
}

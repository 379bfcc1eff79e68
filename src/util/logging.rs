use std::io::Write;

use chrono::{DateTime, Utc};
use log::Level;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 一行带 UTC 时间戳的日志，例如 `[2024-05-01 12:00:00] INFO  Starting`
pub fn format_line(now: DateTime<Utc>, level: Level, msg: &str) -> String {
    format!("[{}] {:<5} {}", now.format(TIMESTAMP_FORMAT), level, msg)
}

/// 初始化 env_logger，默认级别 info，可用 `RUST_LOG` 覆盖。
/// 重复调用（例如测试中）是无害的。
pub fn init() {
    let env = env_logger::Env::default().default_filter_or("info");
    let _ = env_logger::Builder::from_env(env)
        .format(|buf, record| {
            let line = format_line(Utc::now(), record.level(), &record.args().to_string());
            writeln!(buf, "{}", line)
        })
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn line_has_bracketed_timestamp() {
        let t = Utc.with_ymd_and_hms(2023, 3, 7, 9, 5, 1).unwrap();
        let line = format_line(t, Level::Error, "Output directory out already exists");
        assert_eq!(line, "[2023-03-07 09:05:01] ERROR Output directory out already exists");
    }

    #[test]
    fn level_is_padded() {
        let t = Utc.with_ymd_and_hms(2023, 3, 7, 9, 5, 1).unwrap();
        assert!(format_line(t, Level::Info, "x").starts_with("[2023-03-07 09:05:01] INFO  x"));
    }
}

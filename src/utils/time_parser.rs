use chrono::{DateTime, Utc};
use std::time::Duration;

/// 时间字符串解析工具
pub struct TimeParser;

impl TimeParser {
    /// 解析时间间隔字符串，支持多种格式：
    /// - 纯数字：按秒处理，如 `300`
    /// - 单一单位：30s, 5m, 12h, 1d, 2w
    /// - 组合格式：1d12h, 1h30m
    pub fn parse_interval(input: &str) -> Result<Duration, String> {
        let input = input.trim();
        if input.is_empty() {
            return Err("时间间隔不能为空".to_string());
        }

        if let Ok(secs) = input.parse::<u64>() {
            return Ok(Duration::from_secs(secs));
        }

        let mut total_secs: u64 = 0;
        let mut remaining = input;

        while !remaining.is_empty() {
            // 提取数字
            let digits = remaining
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(remaining.len());
            if digits == 0 {
                return Err(format!("无效的时间格式: '{}'", input));
            }
            let num: u64 = remaining[..digits]
                .parse()
                .map_err(|_| format!("无效的数字: '{}'", &remaining[..digits]))?;
            remaining = &remaining[digits..];

            // 提取单位
            let unit_len = remaining
                .find(|c: char| !c.is_alphabetic())
                .unwrap_or(remaining.len());
            if unit_len == 0 {
                return Err(format!("缺少时间单位，数字 '{}' 后应跟时间单位", num));
            }
            let unit = &remaining[..unit_len];
            remaining = &remaining[unit_len..];

            let factor: u64 = match unit.to_lowercase().as_str() {
                "s" | "sec" | "second" | "seconds" => 1,
                "m" | "min" | "minute" | "minutes" => 60,
                "h" | "hour" | "hours" => 60 * 60,
                "d" | "day" | "days" => 24 * 60 * 60,
                "w" | "week" | "weeks" => 7 * 24 * 60 * 60,
                _ => return Err(format!("不支持的时间单位: '{}'", unit)),
            };

            total_secs = num
                .checked_mul(factor)
                .and_then(|secs| total_secs.checked_add(secs))
                .ok_or_else(|| format!("时间间隔超出有效范围: '{}'", input))?;
        }

        Ok(Duration::from_secs(total_secs))
    }

    /// 格式化持续时间为人类可读的字符串
    pub fn format_duration_human(from: DateTime<Utc>, to: DateTime<Utc>) -> String {
        let duration = to.signed_duration_since(from);

        if duration.num_seconds() < 0 {
            return "0s".to_string();
        }

        let days = duration.num_days();
        let hours = (duration.num_seconds() % 86400) / 3600;
        let minutes = (duration.num_seconds() % 3600) / 60;

        if days > 0 {
            format!("{}d{}h", days, hours)
        } else if hours > 0 {
            format!("{}h{}m", hours, minutes)
        } else if minutes > 0 {
            format!("{}m", minutes)
        } else {
            format!("{}s", duration.num_seconds())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_units() {
        assert_eq!(
            TimeParser::parse_interval("30s").unwrap(),
            Duration::from_secs(30)
        );
        assert_eq!(
            TimeParser::parse_interval("5m").unwrap(),
            Duration::from_secs(300)
        );
        assert_eq!(
            TimeParser::parse_interval("1d").unwrap(),
            Duration::from_secs(86400)
        );
        assert_eq!(
            TimeParser::parse_interval("2w").unwrap(),
            Duration::from_secs(14 * 86400)
        );
    }

    #[test]
    fn test_parse_combined_and_bare_seconds() {
        assert_eq!(
            TimeParser::parse_interval("1d12h").unwrap(),
            Duration::from_secs(36 * 3600)
        );
        assert_eq!(
            TimeParser::parse_interval("1h30m").unwrap(),
            Duration::from_secs(5400)
        );
        assert_eq!(
            TimeParser::parse_interval(" 300 ").unwrap(),
            Duration::from_secs(300)
        );
    }

    #[test]
    fn test_invalid_format() {
        assert!(TimeParser::parse_interval("").is_err());
        assert!(TimeParser::parse_interval("abc").is_err());
        assert!(TimeParser::parse_interval("1x").is_err());
        assert!(TimeParser::parse_interval("m5").is_err());
        assert!(TimeParser::parse_interval("99999999999999999999w").is_err());
    }

    #[test]
    fn test_format_duration_human() {
        let from = Utc::now();
        let to = from + chrono::Duration::seconds(90061);
        assert_eq!(TimeParser::format_duration_human(from, to), "1d1h");
        assert_eq!(
            TimeParser::format_duration_human(from, from + chrono::Duration::seconds(45)),
            "45s"
        );
    }
}

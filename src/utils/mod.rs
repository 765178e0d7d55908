pub mod time_parser;

pub use time_parser::TimeParser;

/// 短码最大长度
const MAX_SHORT_CODE_LEN: usize = 128;

/// 短码只允许字母、数字以及 `-` `_` `.` `/`，且不能以 `/` 开头或包含 `..`
pub fn is_valid_short_code(code: &str) -> bool {
    !code.is_empty()
        && code.len() <= MAX_SHORT_CODE_LEN
        && !code.starts_with('/')
        && !code.contains("..")
        && code
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'/'))
}

/// 转义 HTML 特殊字符
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_short_code() {
        assert!(is_valid_short_code("abc123"));
        assert!(is_valid_short_code("docs/v1.2"));
        assert!(is_valid_short_code("a-b_c"));

        assert!(!is_valid_short_code(""));
        assert!(!is_valid_short_code("/abs"));
        assert!(!is_valid_short_code("a/../b"));
        assert!(!is_valid_short_code("with space"));
        assert!(!is_valid_short_code("ünicode"));
        assert!(!is_valid_short_code(&"x".repeat(129)));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x?a=1&b='2'">"#),
            "&lt;a href=&quot;x?a=1&amp;b=&#39;2&#39;&quot;&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }
}

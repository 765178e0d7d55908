use std::fmt;

#[derive(Debug, Clone)]
pub enum LinkwatchError {
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    FileOperation(String),
    Validation(String),
    NotFound(String),
    Serialization(String),
    DateParse(String),
    HttpClient(String),
}

impl LinkwatchError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            LinkwatchError::DatabaseConfig(_) => "E001",
            LinkwatchError::DatabaseConnection(_) => "E002",
            LinkwatchError::DatabaseOperation(_) => "E003",
            LinkwatchError::FileOperation(_) => "E004",
            LinkwatchError::Validation(_) => "E005",
            LinkwatchError::NotFound(_) => "E006",
            LinkwatchError::Serialization(_) => "E007",
            LinkwatchError::DateParse(_) => "E008",
            LinkwatchError::HttpClient(_) => "E009",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            LinkwatchError::DatabaseConfig(_) => "Database Configuration Error",
            LinkwatchError::DatabaseConnection(_) => "Database Connection Error",
            LinkwatchError::DatabaseOperation(_) => "Database Operation Error",
            LinkwatchError::FileOperation(_) => "File Operation Error",
            LinkwatchError::Validation(_) => "Validation Error",
            LinkwatchError::NotFound(_) => "Resource Not Found",
            LinkwatchError::Serialization(_) => "Serialization Error",
            LinkwatchError::DateParse(_) => "Date Parse Error",
            LinkwatchError::HttpClient(_) => "HTTP Client Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            LinkwatchError::DatabaseConfig(msg)
            | LinkwatchError::DatabaseConnection(msg)
            | LinkwatchError::DatabaseOperation(msg)
            | LinkwatchError::FileOperation(msg)
            | LinkwatchError::Validation(msg)
            | LinkwatchError::NotFound(msg)
            | LinkwatchError::Serialization(msg)
            | LinkwatchError::DateParse(msg)
            | LinkwatchError::HttpClient(msg) => msg,
        }
    }

    /// 格式化为彩色输出（用于终端启动失败提示）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出（用于日志）
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for LinkwatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for LinkwatchError {}

// 便捷的构造函数
impl LinkwatchError {
    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        LinkwatchError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        LinkwatchError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        LinkwatchError::DatabaseOperation(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        LinkwatchError::FileOperation(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        LinkwatchError::Validation(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        LinkwatchError::NotFound(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        LinkwatchError::Serialization(msg.into())
    }

    pub fn date_parse<T: Into<String>>(msg: T) -> Self {
        LinkwatchError::DateParse(msg.into())
    }

    pub fn http_client<T: Into<String>>(msg: T) -> Self {
        LinkwatchError::HttpClient(msg.into())
    }
}

impl From<sea_orm::DbErr> for LinkwatchError {
    fn from(err: sea_orm::DbErr) -> Self {
        LinkwatchError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for LinkwatchError {
    fn from(err: std::io::Error) -> Self {
        LinkwatchError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for LinkwatchError {
    fn from(err: serde_json::Error) -> Self {
        LinkwatchError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for LinkwatchError {
    fn from(err: chrono::ParseError) -> Self {
        LinkwatchError::DateParse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LinkwatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique() {
        let errors = [
            LinkwatchError::database_config("a"),
            LinkwatchError::database_connection("a"),
            LinkwatchError::database_operation("a"),
            LinkwatchError::file_operation("a"),
            LinkwatchError::validation("a"),
            LinkwatchError::not_found("a"),
            LinkwatchError::serialization("a"),
            LinkwatchError::date_parse("a"),
            LinkwatchError::http_client("a"),
        ];
        let mut codes: Vec<&str> = errors.iter().map(|e| e.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_display_uses_simple_format() {
        let err = LinkwatchError::validation("batch_size must be greater than 0");
        assert_eq!(
            err.to_string(),
            "Validation Error: batch_size must be greater than 0"
        );
        assert_eq!(err.message(), "batch_size must be greater than 0");
    }

    #[test]
    fn test_from_db_err() {
        let err: LinkwatchError = sea_orm::DbErr::Custom("boom".to_string()).into();
        assert_eq!(err.code(), "E003");
        assert!(err.message().contains("boom"));
    }

    #[test]
    fn test_colored_contains_code() {
        let err = LinkwatchError::not_found("abc");
        assert!(err.format_colored().contains("E006"));
    }
}

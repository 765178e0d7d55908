use crate::storage::{ShortLink, UrlStatus};
use migration::entities::{short_link, url_status};

/// 将 Sea-ORM Model 转换为 ShortLink
pub fn model_to_shortlink(model: short_link::Model) -> ShortLink {
    ShortLink {
        code: model.short_code,
        target: model.target_url,
        created_at: model.created_at,
        expires_at: model.expires_at,
    }
}

/// 将 ShortLink 转换为 ActiveModel（用于插入/更新）
pub fn shortlink_to_active_model(link: &ShortLink) -> short_link::ActiveModel {
    use sea_orm::ActiveValue::*;

    short_link::ActiveModel {
        short_code: Set(link.code.clone()),
        target_url: Set(link.target.clone()),
        created_at: Set(link.created_at),
        expires_at: Set(link.expires_at),
    }
}

/// 将状态行 Model 转换为 UrlStatus
///
/// 库里的状态码超出 u16 范围时按 NULL 处理。
pub fn model_to_status(model: url_status::Model) -> UrlStatus {
    UrlStatus {
        url_id: model.url_id,
        last_checked_at: model.last_checked_at,
        last_status_code: model
            .last_status_code
            .and_then(|code| u16::try_from(code).ok()),
        last_error: model.last_error,
        gone_at: model.gone_at,
        archive_url: model.archive_url,
        archive_checked_at: model.archive_checked_at,
    }
}

/// 将 UrlStatus 转换为完整的 ActiveModel（upsert 整行覆盖）
pub fn status_to_active_model(status: &UrlStatus) -> url_status::ActiveModel {
    use sea_orm::ActiveValue::*;

    url_status::ActiveModel {
        url_id: Set(status.url_id.clone()),
        last_checked_at: Set(status.last_checked_at),
        last_status_code: Set(status.last_status_code.map(i32::from)),
        last_error: Set(status.last_error.clone()),
        gone_at: Set(status.gone_at),
        archive_url: Set(status.archive_url.clone()),
        archive_checked_at: Set(status.archive_checked_at),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use sea_orm::ActiveValue;

    #[test]
    fn test_model_to_shortlink() {
        let now = Utc::now();
        let link = model_to_shortlink(short_link::Model {
            short_code: "abc123".to_string(),
            target_url: "https://example.com".to_string(),
            created_at: now,
            expires_at: Some(now + Duration::days(7)),
        });

        assert_eq!(link.code, "abc123");
        assert_eq!(link.target, "https://example.com");
        assert_eq!(link.expires_at, Some(now + Duration::days(7)));
    }

    #[test]
    fn test_shortlink_to_active_model_sets_all_columns() {
        let link = ShortLink {
            code: "xyz".to_string(),
            target: "https://target.com".to_string(),
            created_at: Utc::now(),
            expires_at: None,
        };
        let model = shortlink_to_active_model(&link);
        assert!(matches!(model.short_code, ActiveValue::Set(ref code) if code == "xyz"));
        assert!(matches!(model.expires_at, ActiveValue::Set(None)));
    }

    #[test]
    fn test_status_code_conversion() {
        let now = Utc::now();
        let status = UrlStatus {
            url_id: "a".to_string(),
            last_checked_at: Some(now),
            last_status_code: Some(410),
            last_error: None,
            gone_at: Some(now),
            archive_url: Some("https://web.archive.org/web/1/x".to_string()),
            archive_checked_at: Some(now),
        };

        let active = status_to_active_model(&status);
        assert!(matches!(active.last_status_code, ActiveValue::Set(Some(410))));

        let model = url_status::Model {
            url_id: "a".to_string(),
            last_checked_at: Some(now),
            last_status_code: Some(410),
            last_error: None,
            gone_at: Some(now),
            archive_url: status.archive_url.clone(),
            archive_checked_at: Some(now),
        };
        assert_eq!(model_to_status(model), status);
    }

    #[test]
    fn test_out_of_range_status_code_reads_as_null() {
        let model = url_status::Model {
            url_id: "a".to_string(),
            last_checked_at: None,
            last_status_code: Some(-1),
            last_error: None,
            gone_at: None,
            archive_url: None,
            archive_checked_at: None,
        };
        assert_eq!(model_to_status(model).last_status_code, None);
    }
}

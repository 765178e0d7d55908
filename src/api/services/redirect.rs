use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Responder, web};
use chrono::SecondsFormat;
use tracing::{debug, error, trace, warn};

use crate::checker::{StatusRepository, UrlRepository};
use crate::storage::{LinkTarget, UrlStatus};
use crate::utils::{escape_html, is_valid_short_code};

/// 短链接跳转
///
/// 只读取检查器写下的状态，不会触发实时探测：目标地址被确认失效（gone_at 已设置）
/// 时展示失效提示页，其余情况（包括状态未知、状态读取失败）照常跳转。
pub struct RedirectService {}

impl RedirectService {
    pub async fn handle_redirect(
        path: web::Path<String>,
        urls: web::Data<Arc<dyn UrlRepository>>,
        statuses: web::Data<Arc<dyn StatusRepository>>,
    ) -> impl Responder {
        let code = path.into_inner();

        if !is_valid_short_code(&code) {
            trace!("Invalid short code rejected: {}", &code);
            return Self::not_found_response();
        }

        let target = match urls.get_target(&code).await {
            Ok(Some(target)) => target,
            Ok(None) => {
                debug!("Redirect link not found: {}", &code);
                return Self::not_found_response();
            }
            Err(e) => {
                error!("Database error during redirect lookup: {}", e);
                return Self::error_response();
            }
        };

        match statuses.get_status(&code).await {
            Ok(Some(status)) if status.is_gone() => {
                debug!("Serving gone interstitial for {}", &code);
                Self::gone_response(&target, &status)
            }
            Ok(_) => Self::finish_redirect(&target),
            Err(e) => {
                warn!(
                    "Failed to read destination status for {}, redirecting anyway: {}",
                    &code, e
                );
                Self::finish_redirect(&target)
            }
        }
    }

    fn finish_redirect(target: &LinkTarget) -> HttpResponse {
        HttpResponse::build(StatusCode::TEMPORARY_REDIRECT)
            .insert_header(("Location", target.destination.as_str()))
            .finish()
    }

    #[inline]
    fn not_found_response() -> HttpResponse {
        HttpResponse::build(StatusCode::NOT_FOUND)
            .insert_header(("Content-Type", "text/html; charset=utf-8"))
            .insert_header(("Cache-Control", "public, max-age=60"))
            .body("Not Found")
    }

    #[inline]
    fn error_response() -> HttpResponse {
        HttpResponse::build(StatusCode::INTERNAL_SERVER_ERROR)
            .insert_header(("Content-Type", "text/html; charset=utf-8"))
            .body("Internal Server Error")
    }

    fn gone_response(target: &LinkTarget, status: &UrlStatus) -> HttpResponse {
        HttpResponse::build(StatusCode::OK)
            .insert_header(("Content-Type", "text/html; charset=utf-8"))
            .insert_header(("Cache-Control", "no-store"))
            .body(render_gone_page(target, status))
    }
}

/// 渲染失效提示页
pub fn render_gone_page(target: &LinkTarget, status: &UrlStatus) -> String {
    let destination = escape_html(&target.destination);

    let status_line = match status.last_status_code {
        Some(code) => format!("The destination last responded with HTTP {}.", code),
        None => "The destination could not be reached on the last check.".to_string(),
    };
    let since = status
        .gone_at
        .map(|at| {
            format!(
                "<p>Unavailable since {}.</p>",
                at.to_rfc3339_opts(SecondsFormat::Secs, true)
            )
        })
        .unwrap_or_default();
    let archive = match status.archive_url.as_deref() {
        Some(url) => format!(
            r#"<p>An archived copy is available: <a href="{0}" rel="noopener noreferrer">{0}</a></p>"#,
            escape_html(url)
        ),
        None => "<p>No archived copy is known.</p>".to_string(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="robots" content="noindex">
<title>Link no longer available</title>
</head>
<body>
<h1>This link's destination is gone</h1>
<p>Original destination: <code>{destination}</code></p>
<p>{status_line}</p>
{since}
{archive}
<p><a href="{destination}" rel="nofollow noopener noreferrer">Continue to the original destination anyway</a></p>
</body>
</html>
"#
    )
}

/// 跳转路由配置
pub fn redirect_routes() -> actix_web::Scope {
    web::scope("")
        .route("/{path:.*}", web::get().to(RedirectService::handle_redirect))
        .route("/{path:.*}", web::head().to(RedirectService::handle_redirect))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn target() -> LinkTarget {
        LinkTarget {
            url_id: "abc".to_string(),
            destination: "https://example.com/a?x=1&y=<2>".to_string(),
        }
    }

    #[test]
    fn test_gone_page_shows_code_and_archive() {
        let status = UrlStatus {
            last_status_code: Some(410),
            gone_at: Some(Utc::now()),
            archive_url: Some("https://web.archive.org/web/2024/https://example.com/a".to_string()),
            archive_checked_at: Some(Utc::now()),
            ..UrlStatus::unchecked("abc")
        };
        let html = render_gone_page(&target(), &status);

        assert!(html.contains("HTTP 410"));
        assert!(html.contains("https://web.archive.org/web/2024/https://example.com/a"));
        assert!(html.contains("https://example.com/a?x=1&amp;y=&lt;2&gt;"));
        assert!(!html.contains("y=<2>"));
    }

    #[test]
    fn test_gone_page_without_archive_or_code() {
        let status = UrlStatus {
            gone_at: Some(Utc::now()),
            ..UrlStatus::unchecked("abc")
        };
        let html = render_gone_page(&target(), &status);

        assert!(html.contains("could not be reached"));
        assert!(html.contains("No archived copy"));
    }
}

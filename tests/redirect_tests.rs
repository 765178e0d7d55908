//! Redirect service tests
//!
//! Short code → 307 redirect, or the gone interstitial once the checker has
//! marked the destination as gone.

mod common;

use std::sync::Arc;
use std::time::Duration;

use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use actix_web::{App, web};
use chrono::Utc;

use common::{FakeProber, FakeResolver, MemoryStore, target};
use linkwatch::api::services::redirect_routes;
use linkwatch::checker::{
    ArchiveResolver, CheckerScheduler, CheckerSettings, DestinationProber, ProbeOutcome,
    StatusRepository, UrlRepository,
};
use linkwatch::storage::UrlStatus;

macro_rules! redirect_app {
    ($store:expr) => {{
        let urls: Arc<dyn UrlRepository> = $store.clone();
        let statuses: Arc<dyn StatusRepository> = $store.clone();
        test::init_service(
            App::new()
                .app_data(web::Data::new(urls))
                .app_data(web::Data::new(statuses))
                .service(redirect_routes()),
        )
        .await
    }};
}

fn header<'a>(resp: &'a actix_web::dev::ServiceResponse, name: &str) -> Option<&'a str> {
    resp.headers().get(name).and_then(|v| v.to_str().ok())
}

#[actix_rt::test]
async fn test_unchecked_link_redirects() {
    let store = Arc::new(MemoryStore::with_targets(vec![target("abc")]));
    let app = redirect_app!(store);

    let resp = test::call_service(&app, TestRequest::get().uri("/abc").to_request()).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(header(&resp, "Location"), Some("https://abc.example.com/"));
}

#[actix_rt::test]
async fn test_alive_and_unknown_links_redirect() {
    let store = Arc::new(MemoryStore::with_targets(vec![target("ok"), target("flaky")]));
    store.put_status(UrlStatus {
        last_checked_at: Some(Utc::now()),
        last_status_code: Some(200),
        ..UrlStatus::unchecked("ok")
    });
    store.put_status(UrlStatus {
        last_checked_at: Some(Utc::now()),
        last_error: Some("timed out".to_string()),
        ..UrlStatus::unchecked("flaky")
    });
    let app = redirect_app!(store);

    for code in ["ok", "flaky"] {
        let resp = test::call_service(
            &app,
            TestRequest::get().uri(&format!("/{}", code)).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT, "code {}", code);
    }
}

#[actix_rt::test]
async fn test_unknown_and_invalid_codes_are_not_found() {
    let store = Arc::new(MemoryStore::with_targets(vec![target("abc")]));
    let app = redirect_app!(store);

    for uri in ["/missing", "/a/../b", "/bad%3Ccode"] {
        let resp = test::call_service(&app, TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "uri {}", uri);
    }
}

#[actix_rt::test]
async fn test_gone_link_serves_interstitial() {
    let store = Arc::new(MemoryStore::with_targets(vec![target("old")]));
    store.put_status(UrlStatus {
        last_checked_at: Some(Utc::now()),
        last_status_code: Some(404),
        gone_at: Some(Utc::now()),
        archive_checked_at: Some(Utc::now()),
        ..UrlStatus::unchecked("old")
    });
    let app = redirect_app!(store);

    let resp = test::call_service(&app, TestRequest::get().uri("/old").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(header(&resp, "Location").is_none());
    assert_eq!(header(&resp, "Cache-Control"), Some("no-store"));
    assert!(header(&resp, "Content-Type").unwrap().starts_with("text/html"));

    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(body.contains("HTTP 404"));
    assert!(body.contains("https://old.example.com/"));
    assert!(body.contains("No archived copy"));
}

#[actix_rt::test]
async fn test_status_read_failure_falls_back_to_redirect() {
    let store = Arc::new(MemoryStore::with_targets(vec![target("abc")]));
    store.set_fail_reads(true);
    let app = redirect_app!(store);

    let resp = test::call_service(&app, TestRequest::get().uri("/abc").to_request()).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
}

#[actix_rt::test]
async fn test_head_request_redirects() {
    let store = Arc::new(MemoryStore::with_targets(vec![target("abc")]));
    let app = redirect_app!(store);

    let resp = test::call_service(
        &app,
        TestRequest::default()
            .method(actix_web::http::Method::HEAD)
            .uri("/abc")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
}

#[actix_rt::test]
async fn test_checked_gone_destination_shows_archive_link() {
    let link = target("promo");
    let store = Arc::new(MemoryStore::with_targets(vec![link.clone()]));
    let prober = Arc::new(FakeProber::new(Duration::ZERO));
    prober.respond(&link.destination, ProbeOutcome::from_status(410));
    let snapshot = "https://web.archive.org/web/20240101000000/https://promo.example.com/";
    let resolver = Arc::new(FakeResolver::with_snapshot(&link.destination, snapshot));

    let settings = CheckerSettings {
        archive_lookup_enabled: true,
        ..Default::default()
    };
    let urls: Arc<dyn UrlRepository> = store.clone();
    let statuses: Arc<dyn StatusRepository> = store.clone();
    let scheduler = CheckerScheduler::new(
        settings,
        urls,
        statuses,
        prober.clone() as Arc<dyn DestinationProber>,
        Some(resolver.clone() as Arc<dyn ArchiveResolver>),
    );

    // 检查前照常跳转
    let app = redirect_app!(store);
    let resp = test::call_service(&app, TestRequest::get().uri("/promo").to_request()).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);

    let report = scheduler.run_tick().await.unwrap();
    assert_eq!(report.newly_gone, 1);
    assert_eq!(report.snapshots_found, 1);

    let resp = test::call_service(&app, TestRequest::get().uri("/promo").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(body.contains("HTTP 410"));
    assert!(body.contains(snapshot));
}

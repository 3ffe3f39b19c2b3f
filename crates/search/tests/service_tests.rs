//! Offset query tests for the search façade.

mod common;

use serde_json::json;

use kindgate_search::error::{EngineError, ErrorKind};
use kindgate_search::tenant::IdentityContext;
use kindgate_search::types::{CursorToken, KindPattern, QuerySpec, SortOrder, SortSpec};

use common::{FakeEngine, Reply, identity, page, service};

fn spec() -> QuerySpec {
    QuerySpec::new(KindPattern::parse("tenant1:wks:wellbore:1.0.0").unwrap())
}

#[tokio::test]
async fn test_offset_query_returns_page_without_cursor() {
    let engine = FakeEngine::new();
    engine.script_first_page(Reply::Page(page(&["1", "2"], 57, Some("ignored"))));
    let service = service(&engine);

    let result = service
        .query(&spec().with_offset(20).with_limit(2), &identity("tenant1"))
        .await
        .unwrap();

    assert_eq!(result.total_count, 57);
    assert_eq!(result.len(), 2);
    assert!(result.cursor.is_none());

    let request = engine.last_request().unwrap();
    assert!(request.keep_alive.is_none());
    assert_eq!(request.body["from"], 20);
    assert_eq!(request.body["size"], 2);
}

#[tokio::test]
async fn test_offset_query_ignores_cursor_field() {
    let engine = FakeEngine::new();
    let service = service(&engine);

    let result = service
        .query(
            &spec().with_cursor(CursorToken::new("ABC")),
            &identity("tenant1"),
        )
        .await
        .unwrap();

    assert!(result.cursor.is_none());
    assert!(engine.continued_handles().is_empty());
}

#[tokio::test]
async fn test_query_body_carries_acl_and_sort() {
    let engine = FakeEngine::new();
    let service = service(&engine);
    let spec = spec()
        .with_query("data.Name:\"Well 1\"")
        .with_sort(SortSpec::single("data.Depth", SortOrder::Desc))
        .with_query_as_owner(true);

    service.query(&spec, &identity("tenant1")).await.unwrap();

    let body = engine.last_request().unwrap().body;
    assert_eq!(
        body["query"]["bool"]["must"][0]["query_string"]["query"],
        "data.Name:\"Well 1\""
    );
    assert_eq!(
        body["query"]["bool"]["filter"][0],
        json!({"terms": {"acl.owners": ["data.default.viewers@tenant1.example.com"]}})
    );
    assert_eq!(body["sort"][0]["data.Depth"]["order"], "desc");
}

#[tokio::test]
async fn test_identity_without_groups_is_forbidden() {
    let engine = FakeEngine::new();
    let service = service(&engine);
    let no_groups = IdentityContext::builder()
        .user_id("alice@example.com")
        .partition("tenant1")
        .build()
        .unwrap();

    let err = service.query(&spec(), &no_groups).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert_eq!(err.reason(), "missing authorization groups");
    assert_eq!(engine.search_calls(), 0);
}

#[tokio::test]
async fn test_root_identity_has_no_acl_filter() {
    let engine = FakeEngine::new();
    let service = service(&engine);
    let root = IdentityContext::builder()
        .user_id("svc@example.com")
        .partition("tenant1")
        .root(true)
        .build()
        .unwrap();

    service.query(&spec(), &root).await.unwrap();

    let body = engine.last_request().unwrap().body;
    assert!(body["query"]["bool"].get("filter").is_none());
}

#[tokio::test]
async fn test_result_window_is_enforced() {
    let engine = FakeEngine::new();
    let service = service(&engine);

    let err = service
        .query(
            &spec().with_offset(9_999).with_limit(10),
            &identity("tenant1"),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::BadRequest);
    assert_eq!(engine.search_calls(), 0);
}

#[tokio::test]
async fn test_server_errors_hide_detail() {
    let engine = FakeEngine::new();
    engine.script_first_page(Reply::Fail(|| {
        EngineError::internal("NullPointerException at shard 3")
    }));
    let service = service(&engine);

    let err = service.query(&spec(), &identity("tenant1")).await.unwrap_err();
    let response = err.to_response();

    assert_eq!(response.code, 500);
    assert!(!response.message.contains("NullPointerException"));
}

#[tokio::test]
async fn test_engine_not_found_is_404() {
    let engine = FakeEngine::new();
    engine.script_first_page(Reply::Fail(|| EngineError::NotFound {
        message: "no such index".to_string(),
    }));
    let service = service(&engine);

    let err = service.query(&spec(), &identity("tenant1")).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
}

use axum::response::IntoResponse;
use common_http_errors::ApiError;
use http_body_util::BodyExt; // for collect()

async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn insufficient_stock_shape() {
    let err = ApiError::InsufficientStock {
        part_title: "Brake Pad Set".into(),
        available: 3,
    };
    let resp = err.into_response();
    assert_eq!(resp.status(), axum::http::StatusCode::CONFLICT);
    assert_eq!(
        resp.headers().get("X-Error-Code").unwrap(),
        "insufficient_stock"
    );
    let body = body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "insufficient_stock");
    assert_eq!(body["available"], 3);
    assert_eq!(
        body["message"],
        "Not enough stock for Brake Pad Set. Available: 3"
    );
}

#[tokio::test]
async fn datastore_error_is_opaque() {
    let err = ApiError::datastore("connection refused (host=10.0.0.3)");
    let resp = err.into_response();
    assert_eq!(
        resp.status(),
        axum::http::StatusCode::INTERNAL_SERVER_ERROR
    );
    let body = body_json(resp).await;
    assert_eq!(body["code"], "datastore_error");
    // Driver detail must never reach the caller.
    assert!(body.get("message").is_none(), "body was: {body}");
}

#[tokio::test]
async fn validation_and_not_found_status_codes() {
    let resp = ApiError::validation("empty_order").into_response();
    assert_eq!(resp.status(), axum::http::StatusCode::BAD_REQUEST);
    assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "empty_order");

    let resp = ApiError::NotFound { code: "inventory_not_found" }.into_response();
    assert_eq!(resp.status(), axum::http::StatusCode::NOT_FOUND);

    let resp = ApiError::Unauthorized.into_response();
    assert_eq!(resp.status(), axum::http::StatusCode::UNAUTHORIZED);
    let body = body_json(resp).await;
    assert_eq!(body["message"], "Unauthorized access");
}

#[tokio::test]
async fn conflict_shape() {
    let resp = ApiError::Conflict { code: "stock_conflict" }.into_response();
    assert_eq!(resp.status(), axum::http::StatusCode::CONFLICT);
    let body = body_json(resp).await;
    assert_eq!(body["code"], "stock_conflict");
}

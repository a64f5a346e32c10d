use axum::{body::Body, http::Request, http::StatusCode};
use tower::ServiceExt;

#[tokio::test]
async fn livez_healthy_and_recommend_requires_auth() {
    let state = jr_api::test_state("test-key");
    let app = jr_api::create_router(state);

    let livez_response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/livez")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(livez_response.status(), StatusCode::OK);

    let unauthorized = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/recommend/job")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"base_job_id": 1, "job_ids": [2, 3]}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(unauthorized.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_api_key_is_rejected() {
    let state = jr_api::test_state("test-key");
    let app = jr_api::create_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/jobs")
                .header("x-api-key", "other-key")
                .header("content-type", "application/json")
                .body(Body::from(
                    r#"{"job_id": 1, "title": "Engineer", "content": "Build things"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

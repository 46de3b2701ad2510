use axum::{body::Body, extract::State, http::Request, http::StatusCode};
use serial_test::serial;
use storefront_api::routes::{create_app, health::health_check};
use tower::ServiceExt;

mod common;

#[tokio::test]
#[serial]
async fn health_check_reports_database_up() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let (status, response) = health_check(State(state)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response.0.message, "Health check");

    let data = response.0.data.expect("health data");
    assert_eq!(data.status, "ok");
    assert_eq!(data.database, "up");
    Ok(())
}

#[tokio::test]
#[serial]
async fn unknown_route_is_not_found() -> anyhow::Result<()> {
    let app = create_app(common::setup_state().await?);
    let response = app
        .oneshot(Request::builder().uri("/api/nope").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}

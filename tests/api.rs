use std::str::FromStr;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use serial_test::serial;
use storefront_api::{entity::users, routes::create_app, services::auth_service::issue_token};
use tower::ServiceExt;
use uuid::Uuid;

mod common;

fn bearer(state: &storefront_api::state::AppState, user: &users::Model) -> String {
    let token = issue_token(&state.config.jwt_secret, user).unwrap();
    format!("Bearer {token}")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn json_request(method: &str, uri: &str, auth: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_request(uri: &str, auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
#[serial]
async fn place_and_list_orders_over_http() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let user = common::create_user(&state, "alice", "user").await?;
    let hoodie = common::create_product(&state, "Hoodie", 1999, 10).await?;
    let mug = common::create_product(&state, "Mug", 500, 5).await?;
    let auth = bearer(&state, &user);
    let app = create_app(state.clone());

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            &format!("/api/cart/{}", user.id),
            Some(auth.as_str()),
            json!({ "productId": hoodie.id, "quantity": 3 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            &format!("/api/orders/{}", user.id),
            Some(auth.as_str()),
            json!({ "cartItems": [
                { "id": hoodie.id, "price": 19.99, "quantity": 3 },
                { "id": mug.id, "price": "5.00", "quantity": 2 }
            ]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Order placed successfully");
    let total = Decimal::from_str(body["total_price"].as_str().unwrap())?;
    assert_eq!(total, Decimal::from_str("69.97")?);
    let order_id = body["order_id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, get_request(&format!("/api/cart/{}", user.id), Some(auth.as_str()))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));

    let (status, body) =
        send(&app, get_request(&format!("/api/orders/{}", user.id), Some(auth.as_str()))).await;
    assert_eq!(status, StatusCode::OK);
    let orders = body.as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["order_id"], order_id);
    assert_eq!(orders[0]["status"], "Pending");
    assert_eq!(orders[0]["items"].as_array().unwrap().len(), 2);
    Ok(())
}

#[tokio::test]
#[serial]
async fn order_errors_map_to_status_codes() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let user = common::create_user(&state, "bob", "user").await?;
    let product = common::create_product(&state, "Vinyl", 2500, 1).await?;
    let auth = bearer(&state, &user);
    let app = create_app(state.clone());
    let uri = format!("/api/orders/{}", user.id);

    let (status, _) = send(&app, json_request("POST", &uri, Some(auth.as_str()), json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            &uri,
            Some(auth.as_str()),
            json!({ "cartItems": [{ "id": product.id, "price": 25, "quantity": 2 }] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("Not enough stock"));

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            &uri,
            Some(auth.as_str()),
            json!({ "cartItems": [{ "id": Uuid::new_v4(), "price": 1, "quantity": 1 }] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert_eq!(common::stock_of(&state, product.id).await?, 1);
    assert_eq!(common::row_counts(&state).await?.0, 0);
    Ok(())
}

#[tokio::test]
#[serial]
async fn orders_require_the_owner_or_an_admin() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let owner = common::create_user(&state, "carol", "user").await?;
    let stranger = common::create_user(&state, "mallory", "user").await?;
    let admin = common::create_user(&state, "root", "admin").await?;
    let app = create_app(state.clone());
    let uri = format!("/api/orders/{}", owner.id);

    let (status, _) = send(&app, get_request(&uri, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, get_request(&uri, Some("Bearer not-a-token"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, get_request(&uri, Some(bearer(&state, &stranger).as_str()))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, get_request(&uri, Some(bearer(&state, &admin).as_str()))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
    Ok(())
}

#[tokio::test]
#[serial]
async fn register_then_login() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let app = create_app(state);
    let credentials = json!({ "username": "dave", "password": "hunter2" });

    let (status, body) = send(
        &app,
        json_request("POST", "/api/auth/register", None, credentials.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["role"], "user");
    let user_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        json_request("POST", "/api/auth/register", None, credentials.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "username": "dave", "password": "wrong" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        json_request("POST", "/api/auth/login", None, credentials),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["data"]["access_token"].as_str().unwrap();

    let (status, body) = send(
        &app,
        get_request(&format!("/api/orders/{user_id}"), Some(format!("Bearer {token}").as_str())),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
    Ok(())
}

#[tokio::test]
#[serial]
async fn admin_creates_product_from_multipart_form() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let admin = common::create_user(&state, "root", "admin").await?;
    let shopper = common::create_user(&state, "erin", "user").await?;
    let app = create_app(state.clone());

    let boundary = "X-STOREFRONT-BOUNDARY";
    let form = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"product\"\r\n\r\n\
         {{\"name\":\"Desk Lamp\",\"brand\":\"Lumen\",\"price\":\"34.50\",\"category\":\"home\",\"stockQuantity\":7}}\r\n\
         --{boundary}--\r\n"
    );
    let request = |auth: String| {
        Request::builder()
            .method("POST")
            .uri("/api/product")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .header(header::AUTHORIZATION, auth)
            .body(Body::from(form.clone()))
            .unwrap()
    };

    let (status, _) = send(&app, request(bearer(&state, &shopper))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, request(bearer(&state, &admin))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["name"], "Desk Lamp");
    assert_eq!(body["data"]["price"], "34.50");
    assert_eq!(body["data"]["stockQuantity"], 7);

    let (status, body) = send(&app, get_request("/api/products/search?keyword=LAMP", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    Ok(())
}

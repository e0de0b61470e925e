//! End-to-end tests against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port and drives `ApiClient` over real
//! HTTP with the reqwest transport. Timeout and connection failures use bare
//! sockets: one listener that accepts and never answers, one that answers
//! every connection with a redirect, and one port that was bound and released.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use storefront_core::{
    ApiClient, ApiConfig, ApiResult, Credentials, NewOrder, OrderLine, OrderStatus, OrderUpdate,
    Problem, ProductQuery,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

async fn start_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(mock_server::run(listener));
    format!("http://{addr}")
}

async fn client() -> ApiClient {
    ApiClient::new(ApiConfig::new(start_server().await, 5_000)).unwrap()
}

fn demo_credentials() -> Credentials {
    Credentials {
        email: mock_server::DEMO_EMAIL.to_string(),
        password: mock_server::DEMO_PASSWORD.to_string(),
    }
}

#[tokio::test]
async fn storefront_lifecycle() {
    let client = client().await;

    // Step 1: browse the catalog.
    let page = client.list_products(&ProductQuery::default()).await.unwrap();
    assert_eq!(page.items.len(), 4);

    let shoes = client
        .list_products(&ProductQuery {
            category: Some("shoes".to_string()),
            limit: Some(5),
        })
        .await
        .unwrap();
    assert_eq!(shoes.items.len(), 2);

    let product = client.get_product(3).await.unwrap();
    assert_eq!(product.title, "Wool Beanie");

    // Step 2: order history needs a session.
    assert_eq!(client.order_history().await, Err(Problem::Unauthorized));

    // Step 3: log in.
    let session = client.login(&demo_credentials()).await.unwrap().unwrap().result;
    assert_eq!(session.email, mock_server::DEMO_EMAIL);
    let authed = client.with_bearer_token(&session.access_token).unwrap();

    // Step 4: place an order.
    let order = authed
        .place_order(&NewOrder {
            lines: vec![OrderLine {
                product_id: 1,
                quantity: 2,
            }],
        })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.status, OrderStatus::Placed);
    assert!((order.total - 119.0).abs() < 1e-9);

    // Step 5: history shows it.
    let history = authed.order_history().await.unwrap();
    assert_eq!(history.items.len(), 1);
    assert_eq!(history.items[0].id, order.id);

    // Step 6: cancel it.
    let cancelled = authed
        .update_order(
            order.id,
            &OrderUpdate {
                status: OrderStatus::Cancelled,
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);

    // Step 7: reopening is refused.
    let reopened = authed
        .update_order(
            order.id,
            &OrderUpdate {
                status: OrderStatus::Placed,
            },
        )
        .await
        .unwrap();
    assert_eq!(reopened, Err(Problem::Rejected));
}

#[tokio::test]
async fn missing_product_is_not_found() {
    let client = client().await;
    assert_eq!(client.get_product(404).await, Err(Problem::NotFound));
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let client = client().await;
    let result = client
        .login(&Credentials {
            email: mock_server::DEMO_EMAIL.to_string(),
            password: "wrong".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(result, Err(Problem::Unauthorized));
}

#[tokio::test]
async fn invalid_order_is_rejected() {
    let client = client().await;
    let session = client.login(&demo_credentials()).await.unwrap().unwrap().result;
    let result = client
        .with_bearer_token(&session.access_token)
        .unwrap()
        .place_order(&NewOrder { lines: Vec::new() })
        .await
        .unwrap();
    assert_eq!(result, Err(Problem::Rejected));
}

#[tokio::test]
async fn episodes_come_from_feed() {
    let client = client().await;
    let episodes = client.get_episodes().await.unwrap();
    assert_eq!(episodes.len(), 2);
    assert_eq!(episodes[0].guid, "ep-2");
    assert_eq!(episodes[0].enclosure.as_ref().unwrap().duration, Some(2140));
}

#[tokio::test]
async fn unexpected_shape_is_bad_data() {
    #[derive(Debug, serde::Deserialize)]
    #[allow(dead_code)]
    struct NotAProduct {
        sku: String,
    }

    let client = client().await;
    let result: ApiResult<NotAProduct> = client.get("products/1", &[]).await;
    assert_eq!(result.unwrap_err(), Problem::BadData);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let client = client().await;
    let result: ApiResult<serde_json::Value> = client.get("nowhere", &[]).await;
    assert_eq!(result, Err(Problem::NotFound));
}

#[tokio::test]
async fn silent_server_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let client = ApiClient::new(ApiConfig::new(format!("http://{addr}"), 200)).unwrap();
    let result: ApiResult<serde_json::Value> = client.get("products", &[]).await;
    assert_eq!(result, Err(Problem::Timeout));
}

#[tokio::test]
async fn redirect_is_not_followed() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = accepted.clone();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let _ = socket
                .write_all(
                    b"HTTP/1.1 302 Found\r\nLocation: /other\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                )
                .await;
        }
    });

    let client = ApiClient::new(ApiConfig::new(format!("http://{addr}"), 5_000)).unwrap();
    let result: ApiResult<serde_json::Value> = client.get("products", &[]).await;
    assert_eq!(result, Err(Problem::Unknown));
    assert_eq!(accepted.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn closed_port_cannot_connect() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };

    let client = ApiClient::new(ApiConfig::new(format!("http://{addr}"), 5_000)).unwrap();
    let started = std::time::Instant::now();
    let result: ApiResult<serde_json::Value> = client.get("products", &[]).await;
    assert_eq!(result, Err(Problem::CannotConnect));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn concurrent_calls_are_independent() {
    let client = client().await;
    let query = ProductQuery::default();
    let (a, b, c) = tokio::join!(
        client.get_product(1),
        client.get_product(999),
        client.list_products(&query),
    );
    assert_eq!(a.unwrap().id, 1);
    assert_eq!(b, Err(Problem::NotFound));
    assert_eq!(c.unwrap().items.len(), 4);
}

use std::{
    collections::HashMap,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const DEMO_EMAIL: &str = "demo@example.com";
pub const DEMO_PASSWORD: &str = "hunter22";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    pub title: String,
    pub price: f64,
    pub image: Option<String>,
    pub category: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: u64,
    pub quantity: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Placed,
    Shipped,
    Delivered,
    Cancelled,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub lines: Vec<OrderLine>,
    pub status: OrderStatus,
    pub total: f64,
    pub placed_at: u64,
}

#[derive(Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
}

#[derive(Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub email: String,
    pub full_name: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct LoginResponse {
    pub result: Session,
}

#[derive(Deserialize)]
pub struct NewOrder {
    pub lines: Vec<OrderLine>,
}

#[derive(Deserialize)]
pub struct OrderUpdate {
    pub status: OrderStatus,
}

#[derive(Deserialize)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Deserialize)]
pub struct FeedParams {
    pub rss_url: String,
}

pub struct Store {
    products: Vec<Product>,
    orders: HashMap<Uuid, (String, Order)>,
    sessions: HashMap<String, String>,
}

impl Store {
    fn seeded() -> Self {
        let product = |id, title: &str, price, category: &str| Product {
            id,
            title: title.to_string(),
            price,
            image: Some(format!("https://cdn.example.com/products/{id}.png")),
            category: Some(category.to_string()),
        };
        Self {
            products: vec![
                product(1, "Canvas Sneaker", 59.5, "shoes"),
                product(2, "Trail Runner", 89.0, "shoes"),
                product(3, "Wool Beanie", 19.99, "accessories"),
                product(4, "Rain Jacket", 120.0, "outerwear"),
            ],
            orders: HashMap::new(),
            sessions: HashMap::new(),
        }
    }
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::seeded()));
    Router::new()
        .route("/login", post(login))
        .route("/products", get(list_products))
        .route("/products/{id}", get(get_product))
        .route("/orders", get(list_orders).post(place_order))
        .route("/orders/{id}", put(update_order))
        .route("/api.json", get(episode_feed))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn login(
    State(db): State<Db>,
    Json(input): Json<Credentials>,
) -> Result<Json<LoginResponse>, StatusCode> {
    if input.email != DEMO_EMAIL || input.password != DEMO_PASSWORD {
        tracing::debug!(email = %input.email, "login rejected");
        return Err(StatusCode::UNAUTHORIZED);
    }
    let token = Uuid::new_v4().simple().to_string();
    db.write()
        .await
        .sessions
        .insert(token.clone(), input.email.clone());
    Ok(Json(LoginResponse {
        result: Session {
            access_token: token,
            email: input.email,
            full_name: Some("Demo User".to_string()),
        },
    }))
}

async fn list_products(
    State(db): State<Db>,
    Query(filter): Query<ProductFilter>,
) -> Json<Page<Product>> {
    let store = db.read().await;
    let items = store
        .products
        .iter()
        .filter(|p| match &filter.category {
            Some(category) => p.category.as_deref() == Some(category.as_str()),
            None => true,
        })
        .take(filter.limit.unwrap_or(usize::MAX))
        .cloned()
        .collect();
    Json(Page { items })
}

async fn get_product(
    State(db): State<Db>,
    Path(id): Path<u64>,
) -> Result<Json<Product>, StatusCode> {
    let store = db.read().await;
    store
        .products
        .iter()
        .find(|p| p.id == id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// Email of the session named by the bearer token.
fn authenticate(store: &Store, headers: &HeaderMap) -> Result<String, StatusCode> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .and_then(|token| store.sessions.get(token))
        .cloned()
        .ok_or(StatusCode::UNAUTHORIZED)
}

async fn list_orders(
    State(db): State<Db>,
    headers: HeaderMap,
) -> Result<Json<Page<Order>>, StatusCode> {
    let store = db.read().await;
    let email = authenticate(&store, &headers)?;
    let mut items: Vec<Order> = store
        .orders
        .values()
        .filter(|(owner, _)| *owner == email)
        .map(|(_, order)| order.clone())
        .collect();
    items.sort_by_key(|o| o.placed_at);
    Ok(Json(Page { items }))
}

async fn place_order(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<NewOrder>,
) -> Result<(StatusCode, Json<Order>), StatusCode> {
    let mut store = db.write().await;
    let email = authenticate(&store, &headers)?;
    if input.lines.is_empty() || input.lines.iter().any(|l| l.quantity == 0) {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    let mut total = 0.0;
    for line in &input.lines {
        let product = store
            .products
            .iter()
            .find(|p| p.id == line.product_id)
            .ok_or(StatusCode::UNPROCESSABLE_ENTITY)?;
        total += product.price * f64::from(line.quantity);
    }
    let order = Order {
        id: Uuid::new_v4(),
        lines: input.lines,
        status: OrderStatus::Placed,
        total,
        placed_at: now_secs(),
    };
    store.orders.insert(order.id, (email, order.clone()));
    Ok((StatusCode::CREATED, Json(order)))
}

async fn update_order(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(input): Json<OrderUpdate>,
) -> Result<Json<Order>, StatusCode> {
    let mut store = db.write().await;
    let email = authenticate(&store, &headers)?;
    let (owner, order) = store.orders.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    if *owner != email {
        return Err(StatusCode::FORBIDDEN);
    }
    if order.status == OrderStatus::Cancelled && input.status != OrderStatus::Cancelled {
        return Err(StatusCode::CONFLICT);
    }
    order.status = input.status;
    Ok(Json(order.clone()))
}

async fn episode_feed(Query(params): Query<FeedParams>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "feed": { "url": params.rss_url, "title": "Storefront Radio" },
        "items": [
            {
                "guid": "ep-2",
                "title": "Shipping at scale",
                "pubDate": "2024-03-08 09:00:00",
                "author": "Storefront Radio",
                "enclosure": { "link": "https://cdn.example.com/ep-2.mp3", "type": "audio/mpeg", "duration": 2140 },
                "categories": ["logistics"]
            },
            {
                "guid": "ep-1",
                "title": "Hello, storefront",
                "pubDate": "2024-03-01 09:00:00",
                "author": "Storefront Radio"
            }
        ]
    }))
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

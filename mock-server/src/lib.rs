use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{Path, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};

pub const SERVICE_PREFIX: &str = "/swcloud/SWWService";
pub const DEFAULT_API_KEY: &str = "test-key";
pub const PAGE_SIZE: usize = 2;

pub type Article = Map<String, Value>;

#[derive(Default)]
pub struct Store {
    articles: BTreeMap<i64, Article>,
    /// barcode -> (article_id, position)
    barcodes: HashMap<String, (i64, i64)>,
    images: Vec<Value>,
    next_id: i64,
}

pub type Db = Arc<RwLock<Store>>;

#[derive(Clone)]
pub struct AppState {
    api_key: Arc<str>,
    db: Db,
}

pub fn app() -> Router {
    app_with_key(DEFAULT_API_KEY)
}

pub fn app_with_key(api_key: &str) -> Router {
    let state = AppState {
        api_key: Arc::from(api_key),
        db: Arc::new(RwLock::new(Store::default())),
    };
    Router::new()
        .route(&service_path("version"), get(version))
        .route(&service_path("article"), post(create_article).put(update_article))
        .route(&service_path("article/{id}"), get(get_article).delete(delete_article))
        .route(&service_path("article/{id}/{page}"), get(list_articles))
        .route(&service_path("barcode_lookup/{barcode}"), get(barcode_lookup))
        .route(&service_path("article_image"), post(upload_image))
        .route(&service_path("maintenance"), get(maintenance))
        .fallback(unsupported)
        .layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with_key(listener: TcpListener, api_key: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_key(api_key)).await
}

fn service_path(endpoint: &str) -> String {
    format!("{SERVICE_PREFIX}/{endpoint}")
}

/// The service's error envelope.
fn service_error(code: i64, text: &str) -> Json<Value> {
    Json(json!({"errorcode": code, "errorstring": text}))
}

fn no_data() -> Json<Value> {
    service_error(0, "no data found")
}

async fn require_api_key(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Response {
    let presented = headers.get("x-auth").and_then(|v| v.to_str().ok());
    if presented != Some(&*state.api_key) {
        tracing::debug!(path = %request.uri().path(), "rejecting request without valid X-Auth");
        return (StatusCode::UNAUTHORIZED, service_error(12, "not authorized")).into_response();
    }
    next.run(request).await
}

async fn version() -> Json<Value> {
    Json(json!({"version": "2.0", "service": "SWWService"}))
}

fn parse_id(raw: &str) -> Result<i64, Json<Value>> {
    raw.parse()
        .map_err(|_| service_error(6, &format!("couldn't parse parameter '{raw}'")))
}

fn parse_object(body: &str) -> Result<Article, Json<Value>> {
    match serde_json::from_str(body) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err(service_error(7, "body must be an object")),
        Err(_) => Err(service_error(6, "couldn't parse body")),
    }
}

async fn get_article(State(state): State<AppState>, Path(id): Path<String>) -> Json<Value> {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(err) => return err,
    };
    let store = state.db.read().await;
    match store.articles.get(&id) {
        Some(article) => Json(Value::Object(article.clone())),
        None => no_data(),
    }
}

/// `article/-1/{page}` lists all articles, `PAGE_SIZE` per page, pages
/// numbered from 1.
async fn list_articles(
    State(state): State<AppState>,
    Path((id, page)): Path<(String, String)>,
) -> Json<Value> {
    let (id, page) = match (parse_id(&id), parse_id(&page)) {
        (Ok(id), Ok(page)) => (id, page),
        (Err(err), _) | (_, Err(err)) => return err,
    };
    if id != -1 {
        return service_error(4, "only article/-1/{page} listings are supported");
    }
    if page < 1 {
        return service_error(6, "page numbers start at 1");
    }
    let Some(skip) = usize::try_from(page - 1)
        .ok()
        .and_then(|index| index.checked_mul(PAGE_SIZE))
    else {
        return service_error(6, &format!("page {page} is out of range"));
    };
    let store = state.db.read().await;
    let articles: Vec<Value> = store
        .articles
        .values()
        .skip(skip)
        .take(PAGE_SIZE)
        .cloned()
        .map(Value::Object)
        .collect();
    let pages = store.articles.len().div_ceil(PAGE_SIZE);
    Json(json!({"page": page, "pages": pages, "articles": articles}))
}

async fn create_article(State(state): State<AppState>, body: String) -> Json<Value> {
    let mut article = match parse_object(&body) {
        Ok(article) => article,
        Err(err) => return err,
    };
    let mut store = state.db.write().await;
    store.next_id += 1;
    let id = store.next_id;
    article.insert("article_id".to_string(), json!(id));
    if let Some(barcode) = article.get("barcode").and_then(Value::as_str) {
        store.barcodes.insert(barcode.to_string(), (id, 1));
    }
    store.articles.insert(id, article);
    tracing::info!(article_id = id, "article created");
    Json(json!({"article_id": id}))
}

async fn update_article(State(state): State<AppState>, body: String) -> Json<Value> {
    let changes = match parse_object(&body) {
        Ok(changes) => changes,
        Err(err) => return err,
    };
    let Some(id) = changes.get("article_id") else {
        return service_error(5, "missing param article_id");
    };
    let Some(id) = id.as_i64() else {
        return service_error(7, "article_id must be an integer");
    };
    let mut store = state.db.write().await;
    let Some(article) = store.articles.get_mut(&id) else {
        return service_error(11, "article does not exist");
    };
    for (key, value) in changes {
        article.insert(key, value);
    }
    Json(Value::Object(article.clone()))
}

async fn delete_article(State(state): State<AppState>, Path(id): Path<String>) -> Json<Value> {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(err) => return err,
    };
    let mut store = state.db.write().await;
    if store.articles.remove(&id).is_none() {
        return service_error(11, "article does not exist");
    }
    store.barcodes.retain(|_, (article_id, _)| *article_id != id);
    Json(json!({"article_id": id, "deleted": true}))
}

async fn barcode_lookup(State(state): State<AppState>, Path(barcode): Path<String>) -> Json<Value> {
    let store = state.db.read().await;
    match store.barcodes.get(&barcode) {
        Some((article_id, position)) => {
            Json(json!({"article_id": article_id, "position": position, "barcode": barcode}))
        }
        None => no_data(),
    }
}

async fn upload_image(State(state): State<AppState>, body: String) -> Json<Value> {
    let upload = match parse_object(&body) {
        Ok(upload) => upload,
        Err(err) => return err,
    };
    let Some(article_id) = upload.get("article_id").and_then(Value::as_i64) else {
        return service_error(5, "missing param article_id");
    };
    if upload
        .get("image")
        .and_then(Value::as_str)
        .map_or(true, str::is_empty)
    {
        return service_error(5, "missing param image");
    }
    let mut store = state.db.write().await;
    if !store.articles.contains_key(&article_id) {
        return service_error(11, "article does not exist");
    }
    store.images.push(Value::Object(upload));
    Json(json!({"image_id": store.images.len(), "article_id": article_id}))
}

async fn maintenance() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        [(header::CONTENT_TYPE, "text/html")],
        "<html>Down for maintenance</html>",
    )
        .into_response()
}

async fn unsupported() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, service_error(4, "unsupported endpoint"))
}

//! Test harness: the full router over a fresh in-memory store.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use shopping_cart::{build_router, AppState, MemoryStore, Store};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_admins(&[])
    }

    pub fn with_admins(admins: &[&str]) -> Self {
        Self::build(admins, Duration::from_secs(30))
    }

    pub fn with_timeout(request_timeout: Duration) -> Self {
        Self::build(&[], request_timeout)
    }

    fn build(admins: &[&str], request_timeout: Duration) -> Self {
        let store = Arc::new(MemoryStore::new());
        let shared: Arc<dyn Store> = store.clone();
        let state = AppState::new(shared, admins.iter().map(|a| a.to_string()));
        TestApp {
            router: build_router(state, request_timeout),
            store,
        }
    }

    /// Send a raw body, optionally declaring its length up front.
    pub async fn post_raw(&self, uri: &str, body: String, declare_length: bool) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if declare_length {
            builder = builder.header(header::CONTENT_LENGTH, body.len());
        }
        let response = self
            .router
            .clone()
            .oneshot(builder.body(Body::from(body)).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes)
            .unwrap_or_else(|e| panic!("non-JSON body ({}): {:?}", e, bytes));
        (status, json)
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        auth: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let auth = token.map(|t| format!("Bearer {}", t));
        self.request(Method::GET, uri, auth.as_deref(), None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        let auth = token.map(|t| format!("Bearer {}", t));
        self.request(Method::POST, uri, auth.as_deref(), Some(body)).await
    }

    pub async fn register(&self, username: &str, password: &str) -> Value {
        let (status, body) = self
            .post("/users", None, json!({ "username": username, "password": password }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "register {}: {}", username, body);
        body
    }

    pub async fn login(&self, username: &str, password: &str) -> String {
        let (status, body) = self
            .post("/users/login", None, json!({ "username": username, "password": password }))
            .await;
        assert_eq!(status, StatusCode::OK, "login {}: {}", username, body);
        body["token"].as_str().unwrap().to_string()
    }

    /// Register and log in; returns the token.
    pub async fn sign_up(&self, username: &str) -> String {
        self.register(username, "pw1234567").await;
        self.login(username, "pw1234567").await
    }

    pub async fn create_item(&self, name: &str) -> i64 {
        let (status, body) = self.post("/items", None, json!({ "name": name })).await;
        assert_eq!(status, StatusCode::CREATED, "create item: {}", body);
        body["id"].as_i64().unwrap()
    }

    /// POST /carts with the given items; returns the cart body.
    pub async fn add_to_cart(&self, token: &str, item_ids: &[i64]) -> Value {
        let (status, body) = self
            .post("/carts", Some(token), json!({ "item_ids": item_ids }))
            .await;
        assert_eq!(status, StatusCode::OK, "add to cart: {}", body);
        body
    }
}

//! Scripted backend for driving a `Storefront` without a network

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use state_dispatch::MemoryStore;
use storefront::{
    ApiError, Category, CategoryId, LoginResponse, OtpResponse, Product, RemoteApi, Storefront,
    UserRef,
};

pub fn product(id: u64, name: &str) -> Product {
    Product {
        id,
        name: name.to_string(),
        image: format!("https://img/{id}.jpg"),
        rating: 4.0,
        price: 10.0 * id as f64,
        listed_date: None,
        expiration_date: None,
        bids: None,
        is_sold: None,
    }
}

pub fn category(id: u64, name: &str) -> Category {
    Category {
        id,
        name: name.to_string(),
        image: format!("https://img/c{id}.png"),
        subcategories: None,
    }
}

pub fn rejected(status: u16, body: &str) -> ApiError {
    ApiError::Status {
        status,
        body: body.to_string(),
    }
}

#[derive(Default)]
pub struct StubApi {
    pub categories: Vec<Category>,
    pub recommended: Vec<Product>,
    pub bestsellers: Vec<Product>,
    pub category_products: HashMap<CategoryId, Vec<Product>>,
    /// `None` means the login succeeds with [`StubApi::TOKEN`]
    pub login_error: Option<(u16, String)>,
    pub register_error: Option<(u16, String)>,
    pub otp_status: i64,
    pub(crate) gates: Mutex<HashMap<CategoryId, oneshot::Receiver<()>>>,
    pub(crate) calls: Mutex<Vec<String>>,
}

impl StubApi {
    pub const TOKEN: &'static str = "token-abc";

    pub fn new() -> Self {
        Self {
            otp_status: OtpResponse::VERIFIED,
            ..Default::default()
        }
    }

    /// Hold the `category_products(id)` response until the returned sender
    /// fires or is dropped.
    pub fn gate(&self, id: CategoryId) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().insert(id, rx);
        tx
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().push(call.into());
    }

    fn fail(error: &Option<(u16, String)>) -> Result<(), ApiError> {
        match error {
            Some((status, body)) => Err(rejected(*status, body)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RemoteApi for StubApi {
    async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        self.record("categories");
        Ok(self.categories.clone())
    }

    async fn recommended(&self) -> Result<Vec<Product>, ApiError> {
        self.record("recommended");
        Ok(self.recommended.clone())
    }

    async fn bestsellers(&self) -> Result<Vec<Product>, ApiError> {
        self.record("bestsellers");
        Ok(self.bestsellers.clone())
    }

    async fn category_products(&self, category_id: CategoryId) -> Result<Vec<Product>, ApiError> {
        self.record(format!("category_products/{category_id}"));
        let gate = self.gates.lock().remove(&category_id);
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        self.category_products
            .get(&category_id)
            .cloned()
            .ok_or_else(|| rejected(404, r#"{"message":"Unknown category"}"#))
    }

    async fn login(&self, email: &str, _password: &str) -> Result<LoginResponse, ApiError> {
        self.record("login");
        Self::fail(&self.login_error)?;
        Ok(LoginResponse {
            token: Self::TOKEN.to_string(),
            user: UserRef {
                id: Some(1),
                email: email.to_string(),
                name: Some("Ayşe".to_string()),
            },
        })
    }

    async fn register(
        &self,
        _email: &str,
        _password: &str,
        _accepted_terms: bool,
    ) -> Result<(), ApiError> {
        self.record("register");
        Self::fail(&self.register_error)
    }

    async fn verify_otp(&self, _email: &str, _otp: &str) -> Result<OtpResponse, ApiError> {
        self.record("verify_otp");
        Ok(OtpResponse {
            status: self.otp_status,
        })
    }
}

/// A fresh app over `api` and `storage`, with nothing left in flight
pub async fn boot(api: Arc<StubApi>, storage: Arc<MemoryStore>) -> Storefront {
    let mut app = Storefront::new(api, storage);
    app.settle().await;
    app
}

use std::sync::Arc;

use reqwest::Method;

use crate::domain::{ApiError, Cart, Product};
use crate::interface_adapters::gateway::{ApiGateway, ApiRequest, RequestOptions};
use crate::interface_adapters::protocol::ProductList;

// Product pages and the cart view.
#[derive(Clone)]
pub struct CatalogUseCase {
    pub gateway: Arc<ApiGateway>,
}

impl CatalogUseCase {
    pub async fn list_products(&self, category: Option<&str>) -> Result<Vec<Product>, ApiError> {
        let mut options = RequestOptions::public();
        if let Some(category) = category.filter(|c| !c.is_empty()) {
            options = options.query("category", category);
        }

        let list: ProductList = self.gateway.get("/products", options).await?;
        Ok(list.into_products())
    }

    pub async fn product(&self, id: &str) -> Result<Product, ApiError> {
        self.gateway
            .send(
                ApiRequest::new(Method::GET, "/products")
                    .segment(id)
                    .options(RequestOptions::public()),
            )
            .await
    }

    pub async fn cart(&self) -> Result<Cart, ApiError> {
        self.gateway.get("/cart", RequestOptions::default()).await
    }
}

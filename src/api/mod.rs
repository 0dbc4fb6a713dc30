/// API routes and handlers
pub mod account;
pub mod activity;
pub mod health;
pub mod home;
pub mod letters;
pub mod memories;
pub mod middleware;
pub mod mood;
pub mod phrases;
pub mod photos;

use crate::{
    context::AppContext,
    db::models::{Page, PageRequest},
};
use axum::Router;
use serde::{Deserialize, Serialize};

/// Build API routes
pub fn routes(upload_limit: usize) -> Router<AppContext> {
    Router::new()
        .merge(health::routes())
        .merge(home::routes())
        .merge(account::routes())
        .merge(phrases::routes())
        .merge(photos::routes(upload_limit))
        .merge(letters::routes())
        .merge(mood::routes())
        .merge(memories::routes())
        .merge(activity::routes())
}

/// `?page=&per_page=`
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl PageQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.per_page)
    }
}

/// Paginated listing body
#[derive(Debug, Serialize)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl<T> From<Page<T>> for Listing<T> {
    fn from(page: Page<T>) -> Self {
        let total_pages = page.total_pages();
        Self {
            items: page.items,
            page: page.page,
            per_page: page.per_page,
            total: page.total,
            total_pages,
        }
    }
}

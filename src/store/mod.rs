// src/store/mod.rs

use async_trait::async_trait;

use crate::models::{
    Customer, EmailList, Employee, ListCustomer, PurchaseRecord, ReturnRecord, UserListCriteria,
};

pub mod postgres;
pub mod rest;

pub use postgres::PgStore;
pub use rest::RestStore;

/// Failure to read from or write to the backing data store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered, but with an error body.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("unexpected row: {0}")]
    Decode(String),

    #[error("invalid store configuration: {0}")]
    Config(String),
}

impl StoreError {
    /// The backend itself failed (it answered 5xx), as opposed to refusing
    /// the request.
    pub fn is_backend_fault(&self) -> bool {
        matches!(self, StoreError::Rejected { status, .. } if *status >= 500)
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Everything the dashboard reads from (or asks of) the relational backend.
#[async_trait]
pub trait Store: Send + Sync {
    /// Short backend name for diagnostics.
    fn backend(&self) -> &'static str;

    /// Purchases, optionally restricted to one exact category.
    async fn purchases(&self, category: Option<&str>) -> Result<Vec<PurchaseRecord>>;

    /// Every return that references a purchase.
    async fn returns(&self) -> Result<Vec<ReturnRecord>>;

    /// Customers whose name or email contains `search` (case-insensitive).
    async fn customers(&self, search: Option<&str>) -> Result<Vec<Customer>>;

    /// Employees whose name contains `search` (case-insensitive).
    async fn employees(&self, search: Option<&str>) -> Result<Vec<Employee>>;

    /// Sets `emptitle` for every employee called `empname`; returns rows touched.
    async fn set_employee_title(&self, empname: &str, title: &str) -> Result<u64>;

    /// Email lists, newest first.
    async fn email_lists(&self) -> Result<Vec<EmailList>>;

    async fn list_customers(&self, list_id: i64) -> Result<Vec<ListCustomer>>;

    /// Drops a list and its memberships. `false` if no such list.
    async fn delete_email_list(&self, list_id: i64) -> Result<bool>;

    /// Stored procedure `RefreshAllEmailLists`.
    async fn refresh_email_lists(&self) -> Result<()>;

    /// Stored procedure `CreateOrUpdateUserList`.
    async fn create_user_list(&self, criteria: &UserListCriteria) -> Result<()>;
}

/// `%text%` pattern for ILIKE searches.
pub(crate) fn contains_pattern(search: &str) -> String {
    format!("%{search}%")
}

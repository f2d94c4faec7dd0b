use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tower::ServiceExt;

use insightedge_api::models::{
    Customer, EmailList, Employee, ListCustomer, PurchaseRecord, ReturnRecord, UserListCriteria,
};
use insightedge_api::store::{Result, Store, StoreError};
use insightedge_api::{app, AppState};

/// In-memory stand-in for the relational backend.
#[derive(Default)]
struct MemoryStore {
    purchases: Vec<PurchaseRecord>,
    returns: Vec<ReturnRecord>,
    customers: Vec<Customer>,
    employees: Mutex<Vec<Employee>>,
    lists: Mutex<Vec<EmailList>>,
    members: Vec<(i64, ListCustomer)>,
    user_lists: Mutex<Vec<UserListCriteria>>,
    refreshed: Mutex<u32>,
    fail_with: Option<(u16, String)>,
}

impl MemoryStore {
    fn check(&self) -> Result<()> {
        match &self.fail_with {
            Some((status, msg)) => {
                Err(StoreError::Rejected { status: *status, message: msg.clone() })
            }
            None => Ok(()),
        }
    }
}

fn contains(hay: &Option<String>, needle: &str) -> bool {
    hay.as_deref()
        .is_some_and(|h| h.to_lowercase().contains(&needle.to_lowercase()))
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn purchases(&self, category: Option<&str>) -> Result<Vec<PurchaseRecord>> {
        self.check()?;
        Ok(self
            .purchases
            .iter()
            .filter(|p| category.is_none() || p.category.as_deref() == category)
            .cloned()
            .collect())
    }

    async fn returns(&self) -> Result<Vec<ReturnRecord>> {
        self.check()?;
        Ok(self.returns.clone())
    }

    async fn customers(&self, search: Option<&str>) -> Result<Vec<Customer>> {
        self.check()?;
        Ok(self
            .customers
            .iter()
            .filter(|c| search.map_or(true, |q| contains(&c.custname, q) || contains(&c.email, q)))
            .cloned()
            .collect())
    }

    async fn employees(&self, search: Option<&str>) -> Result<Vec<Employee>> {
        self.check()?;
        let all = self.employees.lock().unwrap();
        Ok(all
            .iter()
            .filter(|e| search.map_or(true, |q| contains(&Some(e.empname.clone()), q)))
            .cloned()
            .collect())
    }

    async fn set_employee_title(&self, empname: &str, title: &str) -> Result<u64> {
        self.check()?;
        let mut n = 0;
        for e in self.employees.lock().unwrap().iter_mut().filter(|e| e.empname == empname) {
            e.emptitle = Some(title.to_string());
            n += 1;
        }
        Ok(n)
    }

    async fn email_lists(&self) -> Result<Vec<EmailList>> {
        self.check()?;
        let mut lists = self.lists.lock().unwrap().clone();
        lists.sort_by(|a, b| b.created_date.cmp(&a.created_date));
        Ok(lists)
    }

    async fn list_customers(&self, list_id: i64) -> Result<Vec<ListCustomer>> {
        self.check()?;
        Ok(self
            .members
            .iter()
            .filter(|(id, _)| *id == list_id)
            .map(|(_, c)| c.clone())
            .collect())
    }

    async fn delete_email_list(&self, list_id: i64) -> Result<bool> {
        self.check()?;
        let mut lists = self.lists.lock().unwrap();
        let before = lists.len();
        lists.retain(|l| l.list_id != list_id);
        Ok(lists.len() < before)
    }

    async fn refresh_email_lists(&self) -> Result<()> {
        self.check()?;
        *self.refreshed.lock().unwrap() += 1;
        Ok(())
    }

    async fn create_user_list(&self, criteria: &UserListCriteria) -> Result<()> {
        self.check()?;
        self.user_lists.lock().unwrap().push(criteria.clone());
        Ok(())
    }
}

fn purchase(id: i64, date: &str, qty: i64, amount: Decimal, cat: Option<&str>) -> PurchaseRecord {
    PurchaseRecord {
        id,
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").ok(),
        quantity: Some(qty),
        amount: Some(amount),
        category: cat.map(str::to_string),
    }
}

fn seeded() -> MemoryStore {
    let day = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok();
    MemoryStore {
        purchases: vec![
            purchase(1, "2024-01-05", 2, Decimal::from(20), Some("books")),
            purchase(2, "2024-01-20", 1, Decimal::from(15), Some("books")),
            purchase(3, "2024-02-01", 3, Decimal::from(45), Some("books")),
            purchase(4, "2024-01-07", 1, Decimal::new(1250, 2), Some("toys")),
            purchase(5, "2024-03-03", 4, Decimal::from(8), None),
        ],
        returns: vec![
            ReturnRecord { purchase_id: 1, date: day("2024-01-10") },
            ReturnRecord { purchase_id: 4, date: day("2024-01-09") },
        ],
        customers: vec![
            Customer {
                customerid: 1,
                email: Some("ada.lovelace.1@example.com".into()),
                custname: Some("Ada Lovelace".into()),
                age: Some(36),
                gender: Some("F".into()),
            },
            Customer {
                customerid: 2,
                email: Some("customer.2@example.com".into()),
                custname: Some("Unknown Customer".into()),
                age: Some(-1),
                gender: None,
            },
        ],
        employees: Mutex::new(vec![
            Employee {
                employeeid: 1,
                empname: "Grace Hopper".into(),
                emptitle: Some("Agent".into()),
                tenure: Some("1-2 years".into()),
            },
            Employee {
                employeeid: 2,
                empname: "Alan Turing".into(),
                emptitle: Some("Manager".into()),
                tenure: None,
            },
        ]),
        lists: Mutex::new(vec![
            EmailList {
                list_id: 1,
                list_title: "Billing".into(),
                created_date: day("2024-01-01").and_then(|d| d.and_hms_opt(8, 0, 0)),
            },
            EmailList {
                list_id: 2,
                list_title: "Returns".into(),
                created_date: day("2024-05-01").and_then(|d| d.and_hms_opt(8, 0, 0)),
            },
        ]),
        members: vec![(
            1,
            ListCustomer {
                cust_name: Some("Ada Lovelace".into()),
                email: Some("ada.lovelace.1@example.com".into()),
            },
        )],
        ..Default::default()
    }
}

fn failing(msg: &str) -> MemoryStore {
    failing_with(401, msg)
}

fn failing_with(status: u16, msg: &str) -> MemoryStore {
    MemoryStore { fail_with: Some((status, msg.to_string())), ..Default::default() }
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn with_json(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_reports_backend() {
    let (status, body) = send(app(AppState::new(seeded())), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok", "version": "v1", "store": "memory" }));
}

#[tokio::test]
async fn products_summary_without_category() {
    let (status, body) = send(app(AppState::new(seeded())), get("/api/products")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["categories"], json!(["books", "toys", "Uncategorized"]));

    let books = &body["summaryByCategory"][0];
    assert_eq!(books["category"], "books");
    assert_eq!(books["numPurchases"], 3);
    assert_eq!(books["totalQuantity"], 6);
    assert_eq!(books["totalAmount"].as_f64(), Some(80.0));

    let toys = &body["summaryByCategory"][1];
    assert_eq!(toys["totalAmount"].as_f64(), Some(12.5));
}

#[tokio::test]
async fn blank_category_means_summary() {
    let (status, body) = send(app(AppState::new(seeded())), get("/api/products?category=%20%20")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("summaryByCategory").is_some());
}

#[tokio::test]
async fn products_series_for_category() {
    let (status, body) = send(app(AppState::new(seeded())), get("/api/products?category=books")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["category"], "books");

    let series = body["series"].as_array().unwrap();
    assert_eq!(series.len(), 2);
    assert_eq!(series[0]["month"], "2024-01");
    assert_eq!(series[0]["totalQuantity"], 3);
    assert_eq!(series[0]["totalAmount"].as_f64(), Some(35.0));
    // only the return of purchase 1; purchase 4 is a toy
    assert_eq!(series[0]["numReturns"], 1);
    assert_eq!(series[1]["month"], "2024-02");
    assert_eq!(series[1]["numReturns"], 0);
}

#[tokio::test]
async fn unknown_category_yields_empty_series() {
    let (status, body) = send(app(AppState::new(seeded())), get("/api/products?category=garden")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "category": "garden", "series": [] }));
}

#[tokio::test]
async fn store_failure_is_surfaced_verbatim() {
    let (status, body) = send(app(AppState::new(failing("JWT expired"))), get("/api/products")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "JWT expired" }));

    let (status, _) =
        send(app(AppState::new(failing("JWT expired"))), get("/api/products?category=books")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn backend_outage_is_server_error() {
    let down = || AppState::new(failing_with(503, "upstream connect error"));

    let (status, body) = send(app(down()), get("/api/products")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "upstream connect error" }));

    let (status, _) = send(app(down()), get("/api/products?category=books")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (status, _) = send(app(down()), get("/api/employee?q=grace")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn customer_search_matches_name_or_email() {
    let state = AppState::new(seeded());

    let (_, all) = send(app(state.clone()), get("/api/customer")).await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    let (_, by_name) = send(app(state.clone()), get("/api/customer?q=ADA")).await;
    assert_eq!(by_name[0]["custname"], "Ada Lovelace");
    assert_eq!(by_name.as_array().unwrap().len(), 1);

    let (_, by_email) = send(app(state), get("/api/customer?q=customer.2")).await;
    assert_eq!(by_email[0]["customerid"], 2);
}

#[tokio::test]
async fn employee_role_update() {
    let state = AppState::new(seeded());

    let (status, body) = send(
        app(state.clone()),
        with_json("PATCH", "/api/employee", json!({ "empname": "Grace Hopper", "newRole": "Supervisor" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "updated": true }));

    let (_, rows) = send(app(state), get("/api/employee?q=grace")).await;
    assert_eq!(rows[0]["emptitle"], "Supervisor");
}

#[tokio::test]
async fn employee_role_rejects_unknown_title_and_name() {
    let state = AppState::new(seeded());

    let (status, body) = send(
        app(state.clone()),
        with_json("PATCH", "/api/employee", json!({ "empname": "Grace Hopper", "newRole": "CEO" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Supervisor"));

    let (status, _) = send(
        app(state),
        with_json("PATCH", "/api/employee", json!({ "empname": "Nobody", "newRole": "Agent" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn marketing_lists_newest_first() {
    let (status, body) = send(app(AppState::new(seeded())), get("/api/marketing")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["listId"], 2);
    assert_eq!(body[0]["listTitle"], "Returns");
    assert_eq!(body[1]["listId"], 1);
}

#[tokio::test]
async fn marketing_list_members_by_query_and_action() {
    let state = AppState::new(seeded());

    let (_, by_query) = send(app(state.clone()), get("/api/marketing?listid=1")).await;
    assert_eq!(by_query, json!([{ "custName": "Ada Lovelace", "email": "ada.lovelace.1@example.com" }]));

    let (status, by_action) = send(
        app(state.clone()),
        with_json("POST", "/api/marketing", json!({ "action": "getCustomersByList", "listId": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_action, by_query);

    let (status, body) = send(
        app(state),
        with_json("POST", "/api/marketing", json!({ "action": "getCustomersByList" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "listId is required");
}

#[tokio::test]
async fn marketing_create_and_refresh() {
    let state = AppState::new(seeded());

    let (status, body) = send(
        app(state.clone()),
        with_json(
            "POST",
            "/api/marketing",
            json!({
                "action": "createUserList",
                "listTitle": "Big spenders",
                "minSpend": 250.5,
                "categories": ["books"],
                "hasReturned": false
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User list created/updated successfully");

    let (status, body) = send(
        app(state.clone()),
        with_json("POST", "/api/marketing", json!({ "action": "refreshAll" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "All lists refreshed successfully");

    let (status, body) = send(
        app(state),
        with_json("POST", "/api/marketing", json!({ "action": "createUserList" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "listTitle is required");
}

#[tokio::test]
async fn marketing_blank_form_fields_mean_no_filter() {
    let store = Arc::new(seeded());
    let state = AppState { store: store.clone() };

    let (status, body) = send(
        app(state),
        with_json(
            "POST",
            "/api/marketing",
            json!({
                "action": "createUserList",
                "listTitle": "Everyone",
                "minDate": "",
                "minSpend": 0,
                "categories": [],
                "hasReturned": null
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let saved = store.user_lists.lock().unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].list_title.as_deref(), Some("Everyone"));
    assert_eq!(saved[0].min_date, None);
    assert_eq!(saved[0].min_spend, None);
}

#[tokio::test]
async fn marketing_form_values_are_parsed() {
    let store = Arc::new(seeded());
    let state = AppState { store: store.clone() };

    let (status, _) = send(
        app(state),
        with_json(
            "POST",
            "/api/marketing",
            json!({
                "action": "createUserList",
                "listTitle": "Spring",
                "minDate": "2024-03-01",
                "minSpend": "99.95"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let saved = store.user_lists.lock().unwrap();
    assert_eq!(saved[0].min_date, NaiveDate::from_ymd_opt(2024, 3, 1));
    assert_eq!(saved[0].min_spend, Some(Decimal::new(9995, 2)));
}

#[tokio::test]
async fn marketing_bad_field_is_named_in_the_error() {
    let (status, body) = send(
        app(AppState::new(seeded())),
        with_json(
            "POST",
            "/api/marketing",
            json!({ "action": "createUserList", "listTitle": "Spring", "minDate": "not-a-date" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let msg = body["error"].as_str().unwrap();
    assert_ne!(msg, "Invalid action");
    assert!(msg.contains("minDate"), "{msg}");

    let (status, body) = send(
        app(AppState::new(seeded())),
        with_json("POST", "/api/marketing", json!({ "action": "createUserList", "minSpend": true })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("minSpend"));
}

#[tokio::test]
async fn marketing_invalid_action() {
    let (status, body) = send(
        app(AppState::new(seeded())),
        with_json("POST", "/api/marketing", json!({ "action": "dropTables" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Invalid action" }));

    let (status, body) = send(
        app(AppState::new(seeded())),
        with_json("POST", "/api/marketing", json!({ "listTitle": "no action" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid action");
}

#[tokio::test]
async fn marketing_delete() {
    let state = AppState::new(seeded());

    let req = Request::builder()
        .method("DELETE")
        .uri("/api/marketing?listid=2")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(state.clone()), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "deleted": true }));

    let (_, lists) = send(app(state), get("/api/marketing")).await;
    assert_eq!(lists.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn marketing_store_failure_is_server_error() {
    let (status, body) = send(app(AppState::new(failing("relation does not exist"))), get("/api/marketing")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "relation does not exist");
}

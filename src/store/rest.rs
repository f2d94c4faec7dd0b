// src/store/rest.rs
//
// PostgREST-style query API (the interface a hosted Supabase project exposes).

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use super::{Result, Store, StoreError};
use crate::config::RestConfig;
use crate::models::{
    Customer, EmailList, Employee, ListCustomer, PurchaseRecord, ReturnRecord, UserListCriteria,
};

/// Rows asked for per request. The backend may return fewer (its own
/// `max-rows` cap), so only an empty page ends a scan.
const PAGE_SIZE: usize = 1000;

#[derive(Clone)]
pub struct RestStore {
    client: reqwest::Client,
    base: String,
}

impl RestStore {
    pub fn new(cfg: &RestConfig) -> Result<Self> {
        let key = HeaderValue::from_str(&cfg.api_key)
            .map_err(|e| StoreError::Config(format!("api key: {e}")))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", cfg.api_key))
            .map_err(|e| StoreError::Config(format!("api key: {e}")))?;

        let mut headers = HeaderMap::new();
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;

        Ok(Self { client, base: format!("{}/rest/v1", cfg.url.trim_end_matches('/')) })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.base, table)
    }

    /// GET every row of `table` matching `params`, one page at a time.
    /// `params` should include an `order` so paging is stable.
    async fn get_all<T: DeserializeOwned>(
        &self,
        table: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let mut out = Vec::new();
        let mut offset = 0usize;
        loop {
            let resp = self
                .client
                .get(self.table_url(table))
                .query(params)
                .query(&[("limit", PAGE_SIZE), ("offset", offset)])
                .send()
                .await?;
            let page: Vec<T> = check(resp).await?.json().await?;
            if page.is_empty() {
                break;
            }
            offset += page.len();
            out.extend(page);
        }
        tracing::debug!(table, rows = out.len(), "fetched rows");
        Ok(out)
    }

    /// Runs a mutation asking for the affected rows back and counts them.
    async fn count_affected(&self, req: reqwest::RequestBuilder) -> Result<u64> {
        let resp = req.header("Prefer", "return=representation").send().await?;
        let rows: Vec<serde_json::Value> = check(resp).await?.json().await?;
        Ok(rows.len() as u64)
    }

    async fn rpc(&self, function: &str, args: serde_json::Value) -> Result<()> {
        let resp = self
            .client
            .post(format!("{}/rpc/{}", self.base, function))
            .json(&args)
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }
}

/// Turns a non-2xx answer into `StoreError::Rejected`, keeping the backend's
/// own message when it sent one.
async fn check(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    #[derive(Deserialize)]
    struct ErrorBody { message: String }

    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|b| b.message)
        .unwrap_or_else(|_| if text.is_empty() { status.to_string() } else { text });
    Err(StoreError::Rejected { status: status.as_u16(), message })
}

/// Value for a PostgREST filter, quoted so commas and parentheses in user
/// input stay literal.
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Calendar date from a `date` or `timestamp` column.
pub(crate) fn parse_store_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

pub(crate) fn parse_store_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|d| d.naive_utc()))
        .or_else(|| parse_store_date(raw).and_then(|d| d.and_hms_opt(0, 0, 0)))
}

/// Integer column that may arrive as `2`, `2.0` or `"2"`.
fn whole(v: Option<Decimal>, field: &str) -> Result<Option<i64>> {
    match v {
        None => Ok(None),
        Some(d) if d.fract().is_zero() => d
            .to_i64()
            .map(Some)
            .ok_or_else(|| StoreError::Decode(format!("{field} out of range: {d}"))),
        Some(d) => Err(StoreError::Decode(format!("{field} is not a whole number: {d}"))),
    }
}

// ───────────────────────────────────────
// Wire rows
// ───────────────────────────────────────
#[derive(Deserialize)]
struct PurchaseRow {
    purchaseid: i64,
    purchdate: Option<String>,
    quantity: Option<Decimal>,
    amount: Option<Decimal>,
    category: Option<String>,
}

impl TryFrom<PurchaseRow> for PurchaseRecord {
    type Error = StoreError;

    fn try_from(r: PurchaseRow) -> Result<Self> {
        Ok(PurchaseRecord {
            id: r.purchaseid,
            date: r.purchdate.as_deref().and_then(parse_store_date),
            quantity: whole(r.quantity, "quantity")?,
            amount: r.amount,
            category: r.category,
        })
    }
}

#[derive(Deserialize)]
struct ReturnRow {
    purchaseid: Option<i64>,
    returndate: Option<String>,
}

#[derive(Deserialize)]
struct CustomerRow {
    customerid: i64,
    email: Option<String>,
    custname: Option<String>,
    age: Option<Decimal>,
    gender: Option<String>,
}

impl TryFrom<CustomerRow> for Customer {
    type Error = StoreError;

    fn try_from(r: CustomerRow) -> Result<Self> {
        let age = whole(r.age, "age")?
            .map(i32::try_from)
            .transpose()
            .map_err(|e| StoreError::Decode(format!("age: {e}")))?;
        Ok(Customer {
            customerid: r.customerid,
            email: r.email,
            custname: r.custname,
            age,
            gender: r.gender,
        })
    }
}

#[derive(Deserialize)]
struct EmailListRow {
    listid: i64,
    listtitle: String,
    createddate: Option<String>,
}

#[derive(Deserialize)]
struct ListMemberRow {
    customer: Option<ListMember>,
}

#[derive(Deserialize)]
struct ListMember {
    custname: Option<String>,
    email: Option<String>,
}

#[async_trait]
impl Store for RestStore {
    fn backend(&self) -> &'static str {
        "rest"
    }

    async fn purchases(&self, category: Option<&str>) -> Result<Vec<PurchaseRecord>> {
        let mut params = vec![
            ("select", "purchaseid,purchdate,quantity,amount,category".to_string()),
            ("order", "purchaseid".to_string()),
        ];
        if let Some(cat) = category {
            params.push(("category", format!("eq.{cat}")));
        }
        self.get_all::<PurchaseRow>("purchase", &params)
            .await?
            .into_iter()
            .map(PurchaseRecord::try_from)
            .collect()
    }

    async fn returns(&self) -> Result<Vec<ReturnRecord>> {
        let params = [
            ("select", "purchaseid,returndate".to_string()),
            ("purchaseid", "not.is.null".to_string()),
            ("order", "returnid".to_string()),
        ];
        let rows = self.get_all::<ReturnRow>("returns", &params).await?;
        Ok(rows
            .into_iter()
            .filter_map(|r| {
                Some(ReturnRecord {
                    purchase_id: r.purchaseid?,
                    date: r.returndate.as_deref().and_then(parse_store_date),
                })
            })
            .collect())
    }

    async fn customers(&self, search: Option<&str>) -> Result<Vec<Customer>> {
        let mut params = vec![
            ("select", "customerid,email,custname,age,gender".to_string()),
            ("order", "customerid".to_string()),
        ];
        if let Some(q) = search {
            let pat = quoted(&format!("*{q}*"));
            params.push(("or", format!("(custname.ilike.{pat},email.ilike.{pat})")));
        }
        self.get_all::<CustomerRow>("customer", &params)
            .await?
            .into_iter()
            .map(Customer::try_from)
            .collect()
    }

    async fn employees(&self, search: Option<&str>) -> Result<Vec<Employee>> {
        let mut params = vec![
            ("select", "employeeid,empname,emptitle,tenure".to_string()),
            ("order", "employeeid".to_string()),
        ];
        if let Some(q) = search {
            let pat = quoted(&format!("*{q}*"));
            params.push(("or", format!("(empname.ilike.{pat})")));
        }
        self.get_all::<Employee>("employee", &params).await
    }

    async fn set_employee_title(&self, empname: &str, title: &str) -> Result<u64> {
        let req = self
            .client
            .patch(self.table_url("employee"))
            .query(&[("empname", format!("eq.{empname}"))])
            .json(&json!({ "emptitle": title }));
        self.count_affected(req).await
    }

    async fn email_lists(&self) -> Result<Vec<EmailList>> {
        let params = [
            ("select", "listid,listtitle,createddate".to_string()),
            ("order", "createddate.desc,listid".to_string()),
        ];
        let rows = self.get_all::<EmailListRow>("emaillist", &params).await?;
        Ok(rows
            .into_iter()
            .map(|r| EmailList {
                list_id: r.listid,
                list_title: r.listtitle,
                created_date: r.createddate.as_deref().and_then(parse_store_timestamp),
            })
            .collect())
    }

    async fn list_customers(&self, list_id: i64) -> Result<Vec<ListCustomer>> {
        let params = [
            ("select", "customer(custname,email)".to_string()),
            ("listid", format!("eq.{list_id}")),
            ("order", "customerid".to_string()),
        ];
        let rows = self.get_all::<ListMemberRow>("customeremaillist", &params).await?;
        Ok(rows
            .into_iter()
            .filter_map(|r| r.customer)
            .map(|c| ListCustomer { cust_name: c.custname, email: c.email })
            .collect())
    }

    async fn delete_email_list(&self, list_id: i64) -> Result<bool> {
        // no transactions over this API: memberships first, then the list
        let filter = [("listid", format!("eq.{list_id}"))];
        let resp = self
            .client
            .delete(self.table_url("customeremaillist"))
            .query(&filter)
            .send()
            .await?;
        check(resp).await?;

        let req = self.client.delete(self.table_url("emaillist")).query(&filter);
        Ok(self.count_affected(req).await? > 0)
    }

    async fn refresh_email_lists(&self) -> Result<()> {
        self.rpc("RefreshAllEmailLists", json!({})).await
    }

    async fn create_user_list(&self, c: &UserListCriteria) -> Result<()> {
        let args = json!({
            "p_listTitle": c.list_title,
            "p_minDate": c.min_date,
            "p_minSpend": c.min_spend,
            "p_categories": c.categories,
            "p_hasReturned": c.has_returned,
        });
        self.rpc("CreateOrUpdateUserList", args).await
    }
}

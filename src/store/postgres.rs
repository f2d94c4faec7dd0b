// src/store/postgres.rs

use async_trait::async_trait;
use sqlx::{query, query_as, PgPool};

use super::{contains_pattern, Result, Store};
use crate::models::{
    Customer, EmailList, Employee, ListCustomer, PurchaseRecord, ReturnRecord, UserListCriteria,
};

/// Direct Postgres access through a pooled `sqlx` connection.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn purchases(&self, category: Option<&str>) -> Result<Vec<PurchaseRecord>> {
        // purchdate may be stored as a timestamp; keep the calendar date only
        let rows = if let Some(cat) = category {
            query_as::<_, PurchaseRecord>(
                r#"SELECT purchaseid::int8 AS id, purchdate::date AS date,
                          quantity::int8 AS quantity, amount::numeric AS amount, category
                   FROM public.purchase
                   WHERE category = $1"#,
            )
            .bind(cat)
            .fetch_all(&self.pool)
            .await?
        } else {
            query_as::<_, PurchaseRecord>(
                r#"SELECT purchaseid::int8 AS id, purchdate::date AS date,
                          quantity::int8 AS quantity, amount::numeric AS amount, category
                   FROM public.purchase"#,
            )
            .fetch_all(&self.pool)
            .await?
        };
        Ok(rows)
    }

    async fn returns(&self) -> Result<Vec<ReturnRecord>> {
        let rows = query_as::<_, ReturnRecord>(
            r#"SELECT purchaseid::int8 AS purchase_id, returndate::date AS date
               FROM public.returns
               WHERE purchaseid IS NOT NULL"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn customers(&self, search: Option<&str>) -> Result<Vec<Customer>> {
        let rows = if let Some(q) = search {
            query_as::<_, Customer>(
                r#"SELECT customerid::int8 AS customerid, email, custname, age::int4 AS age, gender
                   FROM public.customer
                   WHERE custname ILIKE $1 OR email ILIKE $1
                   ORDER BY customerid"#,
            )
            .bind(contains_pattern(q))
            .fetch_all(&self.pool)
            .await?
        } else {
            query_as::<_, Customer>(
                r#"SELECT customerid::int8 AS customerid, email, custname, age::int4 AS age, gender
                   FROM public.customer
                   ORDER BY customerid"#,
            )
            .fetch_all(&self.pool)
            .await?
        };
        Ok(rows)
    }

    async fn employees(&self, search: Option<&str>) -> Result<Vec<Employee>> {
        let rows = if let Some(q) = search {
            query_as::<_, Employee>(
                r#"SELECT employeeid::int8 AS employeeid, empname, emptitle, tenure::text AS tenure
                   FROM public.employee
                   WHERE empname ILIKE $1
                   ORDER BY employeeid"#,
            )
            .bind(contains_pattern(q))
            .fetch_all(&self.pool)
            .await?
        } else {
            query_as::<_, Employee>(
                r#"SELECT employeeid::int8 AS employeeid, empname, emptitle, tenure::text AS tenure
                   FROM public.employee
                   ORDER BY employeeid"#,
            )
            .fetch_all(&self.pool)
            .await?
        };
        Ok(rows)
    }

    async fn set_employee_title(&self, empname: &str, title: &str) -> Result<u64> {
        let res = query(r#"UPDATE public.employee SET emptitle = $2 WHERE empname = $1"#)
            .bind(empname)
            .bind(title)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }

    async fn email_lists(&self) -> Result<Vec<EmailList>> {
        let rows = query_as::<_, EmailList>(
            r#"SELECT listid::int8 AS list_id, listtitle AS list_title,
                      createddate::timestamp AS created_date
               FROM public.emaillist
               ORDER BY createddate DESC"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_customers(&self, list_id: i64) -> Result<Vec<ListCustomer>> {
        let rows = query_as::<_, ListCustomer>(
            r#"SELECT c.custname AS cust_name, c.email
               FROM public.customeremaillist cel
               JOIN public.customer c ON c.customerid = cel.customerid
               WHERE cel.listid = $1
               ORDER BY c.custname"#,
        )
        .bind(list_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn delete_email_list(&self, list_id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        query(r#"DELETE FROM public.customeremaillist WHERE listid = $1"#)
            .bind(list_id)
            .execute(&mut *tx)
            .await?;
        let res = query(r#"DELETE FROM public.emaillist WHERE listid = $1"#)
            .bind(list_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(res.rows_affected() > 0)
    }

    async fn refresh_email_lists(&self) -> Result<()> {
        query(r#"SELECT public."RefreshAllEmailLists"()"#)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn create_user_list(&self, c: &UserListCriteria) -> Result<()> {
        query(
            r#"
            SELECT public."CreateOrUpdateUserList"(
                "p_listTitle"   => $1::text,
                "p_minDate"     => $2::date,
                "p_minSpend"    => $3::numeric,
                "p_categories"  => $4::text[],
                "p_hasReturned" => $5::boolean
            )
            "#,
        )
        .bind(&c.list_title)
        .bind(c.min_date)
        .bind(c.min_spend)
        .bind(&c.categories)
        .bind(c.has_returned)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

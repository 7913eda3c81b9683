//! SurrealDB implementation of [`CustomerRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use undangan_core::error::UndanganResult;
use undangan_core::models::customer::{CreateCustomer, Customer, CustomerStatus, UpdateCustomer};
use undangan_core::repository::CustomerRepository;
use uuid::Uuid;

use super::CountRow;
use crate::error::{DbError, parse_uuid};

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct CustomerRow {
    full_name: String,
    email: String,
    password_hash: String,
    domain: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct CustomerRowWithId {
    record_id: String,
    full_name: String,
    email: String,
    password_hash: String,
    domain: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_status(s: &str) -> Result<CustomerStatus, DbError> {
    s.parse().map_err(DbError::Decode)
}

impl CustomerRow {
    fn into_customer(self, id: Uuid) -> Result<Customer, DbError> {
        Ok(Customer {
            id,
            full_name: self.full_name,
            email: self.email,
            password_hash: self.password_hash,
            domain: self.domain,
            status: parse_status(&self.status)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl CustomerRowWithId {
    fn try_into_customer(self) -> Result<Customer, DbError> {
        let id = parse_uuid(&self.record_id, "customer")?;
        CustomerRow {
            full_name: self.full_name,
            email: self.email,
            password_hash: self.password_hash,
            domain: self.domain,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_customer(id)
    }
}

fn first_customer(rows: Vec<CustomerRow>, id: Uuid) -> Result<Option<Customer>, DbError> {
    rows.into_iter()
        .next()
        .map(|row| row.into_customer(id))
        .transpose()
}

/// Empty and whitespace-only domains are stored as `NONE`.
pub(crate) fn normalize_domain(domain: Option<String>) -> Option<String> {
    domain
        .map(|d| d.trim().to_ascii_lowercase())
        .filter(|d| !d.is_empty())
}

/// SurrealDB implementation of the Customer repository.
#[derive(Clone)]
pub struct SurrealCustomerRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealCustomerRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn find_one(&self, field: &'static str, value: String) -> Result<Option<Customer>, DbError> {
        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM customer \
             WHERE {field} = $value LIMIT 1"
        );
        let mut result = self.db.query(query).bind(("value", value)).await?;

        let rows: Vec<CustomerRowWithId> = result.take(0)?;
        rows.into_iter()
            .next()
            .map(CustomerRowWithId::try_into_customer)
            .transpose()
    }
}

impl<C: Connection> CustomerRepository for SurrealCustomerRepository<C> {
    async fn create(&self, input: CreateCustomer) -> UndanganResult<Customer> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('customer', $id) SET \
                 full_name = $full_name, \
                 email = $email, \
                 password_hash = $password_hash, \
                 domain = $domain, \
                 status = $status",
            )
            .bind(("id", id_str.clone()))
            .bind(("full_name", input.full_name))
            .bind(("email", input.email.trim().to_lowercase()))
            .bind(("password_hash", input.password_hash))
            .bind(("domain", normalize_domain(input.domain)))
            .bind(("status", input.status.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from_statement)?;

        let rows: Vec<CustomerRow> = result.take(0).map_err(DbError::from)?;
        let customer = first_customer(rows, id)?;
        Ok(customer.ok_or(DbError::NotFound {
            entity: "customer".into(),
            id: id_str,
        })?)
    }

    async fn get_by_id(&self, id: Uuid) -> UndanganResult<Customer> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('customer', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CustomerRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "customer".into(),
            id: id_str,
        })?;

        Ok(row.into_customer(id)?)
    }

    async fn get_by_email(&self, email: &str) -> UndanganResult<Customer> {
        let email = email.trim().to_lowercase();
        let customer = self.find_one("email", email.clone()).await?;
        Ok(customer.ok_or(DbError::NotFound {
            entity: "customer".into(),
            id: format!("email={email}"),
        })?)
    }

    async fn find_by_domain(&self, domain: &str) -> UndanganResult<Option<Customer>> {
        let domain = domain.trim().to_ascii_lowercase();
        if domain.is_empty() {
            return Ok(None);
        }
        Ok(self.find_one("domain", domain).await?)
    }

    async fn exists_by_domain(&self, domain: &str) -> UndanganResult<bool> {
        let domain = domain.trim().to_ascii_lowercase();
        if domain.is_empty() {
            return Ok(false);
        }

        let mut result = self
            .db
            .query("SELECT count() AS total FROM customer WHERE domain = $domain GROUP ALL")
            .bind(("domain", domain))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;

        Ok(CountRow::total(&rows) > 0)
    }

    async fn list(&self, limit: u64) -> UndanganResult<Vec<Customer>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM customer \
                 ORDER BY created_at DESC LIMIT $limit",
            )
            .bind(("limit", limit))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CustomerRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(CustomerRowWithId::try_into_customer)
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn update(&self, id: Uuid, input: UpdateCustomer) -> UndanganResult<Customer> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.full_name.is_some() {
            sets.push("full_name = $full_name");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        if input.domain.is_some() {
            sets.push("domain = $domain");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('customer', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(full_name) = input.full_name {
            builder = builder.bind(("full_name", full_name));
        }
        if let Some(status) = input.status {
            builder = builder.bind(("status", status.as_str().to_string()));
        }
        if let Some(domain) = input.domain {
            builder = builder.bind(("domain", normalize_domain(domain)));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(DbError::from_statement)?;

        let rows: Vec<CustomerRow> = result.take(0).map_err(DbError::from)?;
        let customer = first_customer(rows, id)?;
        Ok(customer.ok_or(DbError::NotFound {
            entity: "customer".into(),
            id: id_str,
        })?)
    }

    async fn set_domain_if_empty(&self, id: Uuid, domain: &str) -> UndanganResult<bool> {
        let Some(domain) = normalize_domain(Some(domain.to_string())) else {
            return Ok(false);
        };

        let result = self
            .db
            .query(
                "UPDATE type::record('customer', $id) SET \
                 domain = $domain, updated_at = time::now() \
                 WHERE domain = NONE OR domain = ''",
            )
            .bind(("id", id.to_string()))
            .bind(("domain", domain))
            .await
            .map_err(DbError::from)?;
        let mut result = result.check().map_err(DbError::from_statement)?;

        let rows: Vec<CustomerRow> = result.take(0).map_err(DbError::from)?;
        Ok(!rows.is_empty())
    }

    async fn replace_domain(&self, id: Uuid, expected: &str, domain: &str) -> UndanganResult<bool> {
        let expected = expected.trim().to_ascii_lowercase();
        let Some(domain) = normalize_domain(Some(domain.to_string())) else {
            return Ok(false);
        };
        if expected.is_empty() {
            return Ok(false);
        }

        let result = self
            .db
            .query(
                "UPDATE type::record('customer', $id) SET \
                 domain = $domain, updated_at = time::now() \
                 WHERE domain = $expected",
            )
            .bind(("id", id.to_string()))
            .bind(("domain", domain))
            .bind(("expected", expected))
            .await
            .map_err(DbError::from)?;
        let mut result = result.check().map_err(DbError::from_statement)?;

        let rows: Vec<CustomerRow> = result.take(0).map_err(DbError::from)?;
        Ok(!rows.is_empty())
    }
}

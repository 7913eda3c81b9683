//! SurrealDB implementation of [`InvitationRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use undangan_core::error::UndanganResult;
use undangan_core::models::invitation::{
    CreateInvitation, Invitation, InvitationFilter, UpdateInvitation, normalize_content,
};
use undangan_core::repository::{InvitationRepository, PaginatedResult, Pagination};
use uuid::Uuid;

use super::CountRow;
use crate::error::{DbError, parse_uuid};

#[derive(Debug, SurrealValue)]
pub(crate) struct InvitationRow {
    customer_id: String,
    slug: String,
    title: String,
    search_name: String,
    event_date: Option<DateTime<Utc>>,
    theme_key: String,
    is_published: bool,
    content: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct InvitationRowWithId {
    record_id: String,
    customer_id: String,
    slug: String,
    title: String,
    search_name: String,
    event_date: Option<DateTime<Utc>>,
    theme_key: String,
    is_published: bool,
    content: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl InvitationRow {
    pub(crate) fn into_invitation(self, id: Uuid) -> Result<Invitation, DbError> {
        Ok(Invitation {
            id,
            customer_id: parse_uuid(&self.customer_id, "customer")?,
            slug: self.slug,
            title: self.title,
            search_name: self.search_name,
            event_date: self.event_date,
            theme_key: self.theme_key,
            is_published: self.is_published,
            content: self.content,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl InvitationRowWithId {
    fn try_into_invitation(self) -> Result<Invitation, DbError> {
        let id = parse_uuid(&self.record_id, "invitation")?;
        InvitationRow {
            customer_id: self.customer_id,
            slug: self.slug,
            title: self.title,
            search_name: self.search_name,
            event_date: self.event_date,
            theme_key: self.theme_key,
            is_published: self.is_published,
            content: self.content,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_invitation(id)
    }
}

/// SurrealDB implementation of the Invitation repository.
#[derive(Clone)]
pub struct SurrealInvitationRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealInvitationRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> InvitationRepository for SurrealInvitationRepository<C> {
    async fn create(&self, input: CreateInvitation) -> UndanganResult<Invitation> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('invitation', $id) SET \
                 customer_id = $customer_id, \
                 slug = $slug, \
                 title = $title, \
                 search_name = $search_name, \
                 event_date = $event_date, \
                 theme_key = $theme_key, \
                 is_published = $is_published, \
                 content = $content",
            )
            .bind(("id", id_str.clone()))
            .bind(("customer_id", input.customer_id.to_string()))
            .bind(("slug", input.slug))
            .bind(("title", input.title))
            .bind(("search_name", input.search_name))
            .bind(("event_date", input.event_date))
            .bind(("theme_key", input.theme_key))
            .bind(("is_published", input.is_published))
            .bind(("content", normalize_content(input.content)))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from_statement)?;

        let rows: Vec<InvitationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "invitation".into(),
            id: id_str,
        })?;

        Ok(row.into_invitation(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> UndanganResult<Invitation> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('invitation', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<InvitationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "invitation".into(),
            id: id_str,
        })?;

        Ok(row.into_invitation(id)?)
    }

    async fn find_published(
        &self,
        customer_id: Uuid,
        slug: &str,
    ) -> UndanganResult<Option<Invitation>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM invitation \
                 WHERE customer_id = $customer_id AND slug = $slug \
                 AND is_published = true LIMIT 1",
            )
            .bind(("customer_id", customer_id.to_string()))
            .bind(("slug", slug.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<InvitationRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .next()
            .map(InvitationRowWithId::try_into_invitation)
            .transpose()?)
    }

    async fn exists_by_customer_and_slug(
        &self,
        customer_id: Uuid,
        slug: &str,
    ) -> UndanganResult<bool> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM invitation \
                 WHERE customer_id = $customer_id AND slug = $slug GROUP ALL",
            )
            .bind(("customer_id", customer_id.to_string()))
            .bind(("slug", slug.to_string()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;

        Ok(CountRow::total(&rows) > 0)
    }

    async fn update(&self, id: Uuid, input: UpdateInvitation) -> UndanganResult<Invitation> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.slug.is_some() {
            sets.push("slug = $slug");
        }
        if input.title.is_some() {
            sets.push("title = $title");
        }
        if input.search_name.is_some() {
            sets.push("search_name = $search_name");
        }
        if input.event_date.is_some() {
            sets.push("event_date = $event_date");
        }
        if input.theme_key.is_some() {
            sets.push("theme_key = $theme_key");
        }
        if input.is_published.is_some() {
            sets.push("is_published = $is_published");
        }
        if input.content.is_some() {
            sets.push("content = $content");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('invitation', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(slug) = input.slug {
            builder = builder.bind(("slug", slug));
        }
        if let Some(title) = input.title {
            builder = builder.bind(("title", title));
        }
        if let Some(search_name) = input.search_name {
            builder = builder.bind(("search_name", search_name));
        }
        if let Some(event_date) = input.event_date {
            builder = builder.bind(("event_date", event_date));
        }
        if let Some(theme_key) = input.theme_key {
            builder = builder.bind(("theme_key", theme_key));
        }
        if let Some(is_published) = input.is_published {
            builder = builder.bind(("is_published", is_published));
        }
        if let Some(content) = input.content {
            builder = builder.bind(("content", normalize_content(Some(content))));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(DbError::from_statement)?;

        let rows: Vec<InvitationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "invitation".into(),
            id: id_str,
        })?;

        Ok(row.into_invitation(id)?)
    }

    async fn delete(&self, id: Uuid) -> UndanganResult<()> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("DELETE type::record('invitation', $id) RETURN BEFORE")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<InvitationRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "invitation".into(),
                id: id_str,
            }
            .into());
        }

        Ok(())
    }

    async fn list(
        &self,
        filter: InvitationFilter,
        pagination: Pagination,
    ) -> UndanganResult<PaginatedResult<Invitation>> {
        let search = filter.search_text();

        let mut conditions = Vec::new();
        if filter.customer_id.is_some() {
            conditions.push("customer_id = $customer_id");
        }
        if filter.state.is_some() {
            conditions.push("is_published = $is_published");
        }
        if filter.event_from.is_some() {
            conditions.push("(event_date != NONE AND event_date >= $event_from)");
        }
        if filter.event_to.is_some() {
            conditions.push("(event_date != NONE AND event_date <= $event_to)");
        }
        if search.is_some() {
            conditions.push(
                "(string::contains(string::lowercase(title), $search) \
                 OR string::contains(string::lowercase(search_name), $search))",
            );
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!(
            "SELECT count() AS total FROM invitation {where_clause} GROUP ALL; \
             SELECT meta::id(id) AS record_id, * FROM invitation {where_clause} \
             ORDER BY created_at DESC \
             LIMIT $limit START $offset;"
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset));

        if let Some(customer_id) = filter.customer_id {
            builder = builder.bind(("customer_id", customer_id.to_string()));
        }
        if let Some(state) = filter.state {
            builder = builder.bind(("is_published", state.is_published()));
        }
        if let Some(from) = filter.event_from {
            builder = builder.bind(("event_from", from));
        }
        if let Some(to) = filter.event_to {
            builder = builder.bind(("event_to", to));
        }
        if let Some(search) = search {
            builder = builder.bind(("search", search));
        }

        let mut result = builder.await.map_err(DbError::from)?;

        let count_rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        let rows: Vec<InvitationRowWithId> = result.take(1).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(InvitationRowWithId::try_into_invitation)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total: CountRow::total(&count_rows),
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{types::Json, FromRow, PgPool};
use tracing::info;

use crate::errors::AppError;
use crate::records::{strip_key_fields, Attributes, RecordKey, RecordStore, EMAIL_FIELD, ID_FIELD};

/// `RecordStore` over a PostgreSQL table:
/// `(id TEXT, email TEXT, attributes JSONB)` with `(id, email)` as primary key.
///
/// The table name comes from configuration and is interpolated into SQL, so
/// it is restricted to a plain identifier.
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
    table: String,
}

#[derive(Debug, FromRow)]
struct RecordRow {
    id: String,
    email: String,
    attributes: Value,
}

impl RecordRow {
    fn into_item(self) -> Attributes {
        let mut item = Attributes::new();
        item.insert(ID_FIELD.to_string(), Value::String(self.id));
        item.insert(EMAIL_FIELD.to_string(), Value::String(self.email));
        if let Value::Object(attributes) = self.attributes {
            item.extend(attributes);
        }
        item
    }
}

impl PgRecordStore {
    pub fn new(pool: PgPool, table: &str) -> Result<Self, AppError> {
        if !is_valid_table_name(table) {
            return Err(AppError::Validation(format!(
                "Record table name '{table}' must match [A-Za-z_][A-Za-z0-9_]*"
            )));
        }
        Ok(Self {
            pool,
            table: table.to_string(),
        })
    }

    /// Creates the record table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), AppError> {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                id          TEXT        NOT NULL,
                email       TEXT        NOT NULL,
                attributes  JSONB       NOT NULL DEFAULT '{{}}'::jsonb,
                created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
                PRIMARY KEY (id, email)
            )
            "#,
            table = self.table
        ))
        .execute(&self.pool)
        .await?;

        info!("Record table '{}' ready", self.table);
        Ok(())
    }
}

fn is_valid_table_name(table: &str) -> bool {
    let mut chars = table.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    table.len() <= 63 && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn create(&self, item: &Attributes) -> Result<(), AppError> {
        let key = RecordKey::from_item(item)?;
        let attributes = strip_key_fields(item);

        sqlx::query(&format!(
            r#"
            INSERT INTO {table} (id, email, attributes)
            VALUES ($1, $2, $3)
            ON CONFLICT (id, email)
            DO UPDATE SET attributes = EXCLUDED.attributes, updated_at = now()
            "#,
            table = self.table
        ))
        .bind(&key.id)
        .bind(&key.email)
        .bind(Json(&attributes))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, key: &RecordKey) -> Result<Option<Attributes>, AppError> {
        let row: Option<RecordRow> = sqlx::query_as(&format!(
            "SELECT id, email, attributes FROM {} WHERE id = $1 AND email = $2",
            self.table
        ))
        .bind(&key.id)
        .bind(&key.email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(RecordRow::into_item))
    }

    async fn update(&self, key: &RecordKey, updates: &Attributes) -> Result<(), AppError> {
        let updates = strip_key_fields(updates);

        // JSONB `||` replaces top-level attributes present on the right and
        // keeps the rest. ON CONFLICT makes the merge a single statement.
        sqlx::query(&format!(
            r#"
            INSERT INTO {table} AS t (id, email, attributes)
            VALUES ($1, $2, $3)
            ON CONFLICT (id, email)
            DO UPDATE SET attributes = t.attributes || EXCLUDED.attributes, updated_at = now()
            "#,
            table = self.table
        ))
        .bind(&key.id)
        .bind(&key.email)
        .bind(Json(&updates))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, key: &RecordKey) -> Result<(), AppError> {
        sqlx::query(&format!(
            "DELETE FROM {} WHERE id = $1 AND email = $2",
            self.table
        ))
        .bind(&key.id)
        .bind(&key.email)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn scan(&self) -> Result<Vec<Attributes>, AppError> {
        let rows: Vec<RecordRow> = sqlx::query_as(&format!(
            "SELECT id, email, attributes FROM {} ORDER BY id, email",
            self.table
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(RecordRow::into_item).collect())
    }

    async fn query_by_id(&self, id: &str) -> Result<Vec<Attributes>, AppError> {
        let rows: Vec<RecordRow> = sqlx::query_as(&format!(
            "SELECT id, email, attributes FROM {} WHERE id = $1 ORDER BY email",
            self.table
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(RecordRow::into_item).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_table_name_validation() {
        assert!(is_valid_table_name("viewers"));
        assert!(is_valid_table_name("_resume_viewers2"));
        assert!(!is_valid_table_name(""));
        assert!(!is_valid_table_name("2viewers"));
        assert!(!is_valid_table_name("viewers; DROP TABLE x"));
        assert!(!is_valid_table_name("public.viewers"));
    }

    #[test]
    fn test_row_into_item_restores_key_fields() {
        let row = RecordRow {
            id: "42".to_string(),
            email: "a@b.co".to_string(),
            attributes: json!({"company": "Acme"}),
        };
        assert_eq!(
            Value::Object(row.into_item()),
            json!({"id": "42", "email": "a@b.co", "company": "Acme"})
        );
    }
}

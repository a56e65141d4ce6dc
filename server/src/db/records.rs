//! Database operations for the records table.

use super::sql::{push_filter, push_sort};
use super::Pool;
use folio_engine::{
    BoundaryPair, CollectionSchema, Error, Filter, QueryExecutor, Record, RecordId, Result,
    SortKey, StoreSnapshot, Summary,
};
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{FromRow, Postgres, QueryBuilder, Row};

/// A stored record row from the database.
#[derive(Debug)]
pub struct StoredRecord {
    pub id: Value,
    pub payload: Value,
}

impl<'r> FromRow<'r, PgRow> for StoredRecord {
    fn from_row(row: &'r PgRow) -> std::result::Result<Self, sqlx::Error> {
        Ok(StoredRecord {
            id: row.try_get("id")?,
            payload: row.try_get("payload")?,
        })
    }
}

impl StoredRecord {
    /// Convert database row to an engine Record.
    pub fn to_record(&self, schema: &CollectionSchema) -> Result<Record> {
        let id = RecordId::from_value(&self.id).ok_or_else(|| {
            Error::store(format!("invalid id {} in collection {}", self.id, schema.name))
        })?;
        Ok(Record::new(id, schema.name.clone(), self.payload.clone()))
    }
}

/// Runs paginator queries against the `records` table.
#[derive(Debug, Clone)]
pub struct PgExecutor {
    pool: Pool,
}

impl PgExecutor {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }
}

/// `SELECT <columns> FROM records WHERE collection = $1 AND <filter>`
fn select_where<'a>(
    columns: &str,
    schema: &CollectionSchema,
    filter: &Filter,
) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {columns} FROM records WHERE collection = "));
    qb.push_bind(schema.name.clone());
    qb.push(" AND ");
    push_filter(&mut qb, schema, filter);
    qb
}

impl QueryExecutor for PgExecutor {
    async fn find_by_id(&self, schema: &CollectionSchema, id: &RecordId) -> Result<Option<Record>> {
        let stored = sqlx::query_as::<_, StoredRecord>(
            r#"
            SELECT id, payload
            FROM records
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(&schema.name)
        .bind(Json(id.to_value()))
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::store)?;

        stored.map(|s| s.to_record(schema)).transpose()
    }

    async fn count(&self, schema: &CollectionSchema, filter: &Filter) -> Result<u64> {
        let mut qb = select_where("COUNT(*)", schema, filter);
        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(Error::store)?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn fetch(
        &self,
        schema: &CollectionSchema,
        filter: &Filter,
        sort: &[SortKey],
        limit: Option<u64>,
    ) -> Result<Vec<Record>> {
        let mut qb = select_where("id, payload", schema, filter);
        qb.push(" ORDER BY ");
        push_sort(&mut qb, schema, sort);
        if let Some(limit) = limit {
            qb.push(" LIMIT ");
            qb.push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        let rows = qb
            .build_query_as::<StoredRecord>()
            .fetch_all(&self.pool)
            .await
            .map_err(Error::store)?;
        rows.iter().map(|s| s.to_record(schema)).collect()
    }

    /// Count and both edges in one query: rows are numbered under `sort`
    /// and only the first and last are returned.
    async fn summarize(
        &self,
        schema: &CollectionSchema,
        filter: &Filter,
        sort: &[SortKey],
    ) -> Result<Summary> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT id, payload, total FROM (SELECT id, payload, ROW_NUMBER() OVER (ORDER BY ",
        );
        push_sort(&mut qb, schema, sort);
        qb.push(") AS rn, COUNT(*) OVER () AS total FROM records WHERE collection = ");
        qb.push_bind(schema.name.clone());
        qb.push(" AND ");
        push_filter(&mut qb, schema, filter);
        qb.push(") ranked WHERE rn = 1 OR rn = total ORDER BY rn");

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(Error::store)?;

        let mut summary = Summary::default();
        let mut boundary = BoundaryPair::default();
        for row in &rows {
            let total: i64 = row.try_get("total").map_err(Error::store)?;
            summary.total = u64::try_from(total).unwrap_or_default();

            let record = StoredRecord::from_row(row)
                .map_err(Error::store)?
                .to_record(schema)?;
            if boundary.first.is_none() {
                boundary.first = Some(record.clone());
            }
            boundary.last = Some(record);
        }
        summary.boundary = boundary;

        tracing::debug!(collection = %schema.name, total = summary.total, "summarized");
        Ok(summary)
    }
}

/// Upsert every record of a snapshot in one transaction.
pub async fn upsert_snapshot(
    pool: &Pool,
    snapshot: &StoreSnapshot,
) -> std::result::Result<usize, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut written = 0;

    for (collection, records) in &snapshot.collections {
        for record in records {
            sqlx::query(
                r#"
                INSERT INTO records (collection, id, payload)
                VALUES ($1, $2, $3)
                ON CONFLICT (collection, id) DO UPDATE SET
                    payload = EXCLUDED.payload
                "#,
            )
            .bind(collection)
            .bind(Json(record.id.to_value()))
            .bind(Json(record.payload()))
            .execute(&mut *tx)
            .await?;
            written += 1;
        }
    }

    tx.commit().await?;
    Ok(written)
}

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use crate::{
    OrderRecord, RawInventoryRow, Result, SessionId, SessionRecord, SessionStore, Sheet,
    SheetKind, SheetStoreError, Version,
    store::{InventorySheet, OrderLogSheet, WriteOptions, check_version},
};

/// PostgreSQL-backed sheets and session store.
///
/// Each sheet is a table plus a row in `sheet_versions`. An overwrite locks
/// the version row, checks it, replaces the table contents and bumps the
/// version inside one transaction.
#[derive(Clone)]
pub struct PostgresSheetStore {
    pool: PgPool,
}

impl PostgresSheetStore {
    /// Creates a new PostgreSQL sheet store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    async fn current_version<'e, E>(executor: E, sheet: SheetKind) -> Result<Version>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        let version: Option<i64> =
            sqlx::query_scalar("SELECT version FROM sheet_versions WHERE sheet = $1")
                .bind(sheet.as_str())
                .fetch_optional(executor)
                .await?;
        Ok(version.map_or(Version::initial(), Version::new))
    }

    /// Locks the version row of `sheet` for the rest of the transaction and
    /// checks the writer's expectation against it.
    async fn lock_and_check(
        tx: &mut Transaction<'_, Postgres>,
        sheet: SheetKind,
        options: &WriteOptions,
    ) -> Result<Version> {
        sqlx::query(
            "INSERT INTO sheet_versions (sheet, version) VALUES ($1, 0) ON CONFLICT (sheet) DO NOTHING",
        )
        .bind(sheet.as_str())
        .execute(&mut **tx)
        .await?;

        let current: i64 =
            sqlx::query_scalar("SELECT version FROM sheet_versions WHERE sheet = $1 FOR UPDATE")
                .bind(sheet.as_str())
                .fetch_one(&mut **tx)
                .await?;
        let current = Version::new(current);

        check_version(sheet, current, options)?;
        Ok(current)
    }

    async fn bump_version(
        tx: &mut Transaction<'_, Postgres>,
        sheet: SheetKind,
        current: Version,
    ) -> Result<Version> {
        let next = current.next();
        sqlx::query("UPDATE sheet_versions SET version = $2 WHERE sheet = $1")
            .bind(sheet.as_str())
            .bind(next.as_i64())
            .execute(&mut **tx)
            .await?;
        Ok(next)
    }

    fn row_to_inventory(row: PgRow) -> Result<RawInventoryRow> {
        Ok(RawInventoryRow {
            label: row.try_get("sku_short_name")?,
            available: row.try_get("available_qty")?,
            image_ref: row.try_get("image_ref")?,
            sku_code: row.try_get("sku_code")?,
        })
    }

    fn row_to_order(row: PgRow) -> Result<OrderRecord> {
        let order_qty: i64 = row.try_get("order_qty")?;
        Ok(OrderRecord {
            timestamp: row.try_get("recorded_at")?,
            login_id: row.try_get("login_id")?,
            customer_name: row.try_get("customer_name")?,
            customer_id: row.try_get("customer_id")?,
            sku_label: row.try_get("sku_short_name")?,
            available_qty: row.try_get("available_qty")?,
            order_qty: u32::try_from(order_qty).map_err(|_| SheetStoreError::Unavailable {
                sheet: SheetKind::OrderLog,
                reason: format!("order_qty {order_qty} out of range"),
            })?,
            unit_price: row.try_get("unit_price")?,
            remark: row.try_get("remark")?,
        })
    }
}

#[async_trait]
impl InventorySheet for PostgresSheetStore {
    #[tracing::instrument(skip(self))]
    async fn read_inventory(&self) -> Result<Sheet<RawInventoryRow>> {
        let mut tx = self.pool.begin().await?;
        let version = Self::current_version(&mut *tx, SheetKind::Inventory).await?;

        let rows = sqlx::query(
            r#"
            SELECT sku_short_name, available_qty, image_ref, sku_code
            FROM inventory_rows
            ORDER BY position ASC
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;

        let rows = rows
            .into_iter()
            .map(Self::row_to_inventory)
            .collect::<Result<Vec<_>>>()?;
        Ok(Sheet::new(rows, version))
    }

    #[tracing::instrument(skip(self, rows), fields(rows = rows.len()))]
    async fn overwrite_inventory(
        &self,
        rows: Vec<RawInventoryRow>,
        options: WriteOptions,
    ) -> Result<Version> {
        let mut tx = self.pool.begin().await?;
        let current = Self::lock_and_check(&mut tx, SheetKind::Inventory, &options).await?;

        sqlx::query("DELETE FROM inventory_rows")
            .execute(&mut *tx)
            .await?;

        for (position, row) in rows.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO inventory_rows (position, sku_short_name, available_qty, image_ref, sku_code)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(position as i32)
            .bind(&row.label)
            .bind(&row.available)
            .bind(&row.image_ref)
            .bind(&row.sku_code)
            .execute(&mut *tx)
            .await?;
        }

        let version = Self::bump_version(&mut tx, SheetKind::Inventory, current).await?;
        tx.commit().await?;
        Ok(version)
    }
}

#[async_trait]
impl OrderLogSheet for PostgresSheetStore {
    #[tracing::instrument(skip(self))]
    async fn read_order_log(&self) -> Result<Sheet<OrderRecord>> {
        let mut tx = self.pool.begin().await?;
        let version = Self::current_version(&mut *tx, SheetKind::OrderLog).await?;

        let rows = sqlx::query(
            r#"
            SELECT recorded_at, login_id, customer_name, customer_id, sku_short_name,
                   available_qty, order_qty, unit_price, remark
            FROM order_log
            ORDER BY position ASC
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;

        let rows = rows
            .into_iter()
            .map(Self::row_to_order)
            .collect::<Result<Vec<_>>>()?;
        Ok(Sheet::new(rows, version))
    }

    #[tracing::instrument(skip(self, rows), fields(rows = rows.len()))]
    async fn overwrite_order_log(
        &self,
        rows: Vec<OrderRecord>,
        options: WriteOptions,
    ) -> Result<Version> {
        let mut tx = self.pool.begin().await?;
        let current = Self::lock_and_check(&mut tx, SheetKind::OrderLog, &options).await?;

        sqlx::query("DELETE FROM order_log").execute(&mut *tx).await?;

        for (position, record) in rows.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_log (position, recorded_at, login_id, customer_name, customer_id,
                                       sku_short_name, available_qty, order_qty, unit_price, remark)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                "#,
            )
            .bind(position as i64)
            .bind(record.timestamp)
            .bind(&record.login_id)
            .bind(&record.customer_name)
            .bind(&record.customer_id)
            .bind(&record.sku_label)
            .bind(record.available_qty)
            .bind(i64::from(record.order_qty))
            .bind(&record.unit_price)
            .bind(&record.remark)
            .execute(&mut *tx)
            .await?;
        }

        let version = Self::bump_version(&mut tx, SheetKind::OrderLog, current).await?;
        tx.commit().await?;
        Ok(version)
    }
}

#[async_trait]
impl SessionStore for PostgresSheetStore {
    async fn load_session(&self, session_id: SessionId) -> Result<Option<SessionRecord>> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT session_id, version, updated_at, state
            FROM sessions
            WHERE session_id = $1
            "#,
        )
        .bind(session_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(SessionRecord {
                session_id: SessionId::from_uuid(row.try_get::<Uuid, _>("session_id")?),
                version: Version::new(row.try_get("version")?),
                updated_at: row.try_get("updated_at")?,
                state: row.try_get("state")?,
            })),
            None => Ok(None),
        }
    }

    async fn save_session(&self, record: SessionRecord, options: WriteOptions) -> Result<Version> {
        let mut tx = self.pool.begin().await?;

        let current: Option<i64> =
            sqlx::query_scalar("SELECT version FROM sessions WHERE session_id = $1 FOR UPDATE")
                .bind(record.session_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await?;
        let exists = current.is_some();
        let current = current.map_or(Version::initial(), Version::new);
        check_version(SheetKind::Sessions, current, &options)?;

        let version = current.next();
        let written = if exists {
            sqlx::query(
                r#"
                UPDATE sessions SET version = $2, updated_at = $3, state = $4
                WHERE session_id = $1 AND version = $5
                "#,
            )
            .bind(record.session_id.as_uuid())
            .bind(version.as_i64())
            .bind(Utc::now())
            .bind(&record.state)
            .bind(current.as_i64())
            .execute(&mut *tx)
            .await?
        } else {
            // No row to lock yet: a concurrent first save can win the insert.
            sqlx::query(
                r#"
                INSERT INTO sessions (session_id, version, updated_at, state)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (session_id) DO NOTHING
                "#,
            )
            .bind(record.session_id.as_uuid())
            .bind(version.as_i64())
            .bind(Utc::now())
            .bind(&record.state)
            .execute(&mut *tx)
            .await?
        };

        if written.rows_affected() == 0 {
            return Err(SheetStoreError::ConcurrencyConflict {
                sheet: SheetKind::Sessions,
                expected: options.expected_version.unwrap_or(current),
                actual: version,
            });
        }

        tx.commit().await?;
        Ok(version)
    }

    async fn delete_session(&self, session_id: SessionId) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE session_id = $1")
            .bind(session_id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

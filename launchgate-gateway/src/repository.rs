use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use launchgate_core::config::CoreConfig;
use launchgate_core::db::{run_migrations, DatabaseMigrator, DatabasePool};
use launchgate_core::errors::{LaunchGateError, Result};
use launchgate_protocol::event::{AppStats, Event, EventQuery, EventType, NewEvent, StatsWindow};
use launchgate_rules::{AuthorizationRule, RuleDraft, RuleError, RuleStore};
use sqlx::{FromRow, QueryBuilder, Sqlite};

use crate::events::EventStore;

const RULE_COLUMNS: &str = "id, app, version_rule, ip_rule, detail_info, created_at";

/// SQLite-backed store for authorization rules and lifecycle events.
#[derive(Clone)]
pub struct SqliteStore {
    pool: DatabasePool,
}

struct EmbeddedMigrations;

#[async_trait]
impl DatabaseMigrator for EmbeddedMigrations {
    async fn run_migrations(&self, pool: &DatabasePool) -> Result<()> {
        sqlx::migrate!("./migrations").run(pool.inner()).await?;
        Ok(())
    }
}

impl SqliteStore {
    /// Connects to the configured database and ensures migrations ran.
    pub async fn from_config(config: &CoreConfig) -> Result<Self> {
        let pool = DatabasePool::connect(config).await?;
        Self::from_pool(pool).await
    }

    /// Builds the store from an existing pool, running migrations first.
    pub async fn from_pool(pool: DatabasePool) -> Result<Self> {
        let migrators: Vec<Box<dyn DatabaseMigrator + Send + Sync>> =
            vec![Box::new(EmbeddedMigrations)];
        run_migrations(&pool, &migrators).await?;
        Ok(Self { pool })
    }

    /// Private in-memory database with the schema applied.
    pub async fn in_memory() -> Result<Self> {
        Self::from_pool(DatabasePool::in_memory().await?).await
    }
}

fn storage_error(err: sqlx::Error) -> RuleError {
    RuleError::storage(err.to_string())
}

#[async_trait]
impl RuleStore for SqliteStore {
    async fn list_rules(&self) -> std::result::Result<Vec<AuthorizationRule>, RuleError> {
        let rows = sqlx::query_as::<_, RuleRow>(&format!(
            "SELECT {RULE_COLUMNS} FROM authorizations ORDER BY id ASC"
        ))
        .fetch_all(self.pool.inner())
        .await
        .map_err(storage_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_rules_for_app(
        &self,
        app: &str,
    ) -> std::result::Result<Vec<AuthorizationRule>, RuleError> {
        let rows = sqlx::query_as::<_, RuleRow>(&format!(
            "SELECT {RULE_COLUMNS} FROM authorizations WHERE app = ? ORDER BY id ASC"
        ))
        .bind(app)
        .fetch_all(self.pool.inner())
        .await
        .map_err(storage_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_rule(&self, id: i64) -> std::result::Result<Option<AuthorizationRule>, RuleError> {
        let row = sqlx::query_as::<_, RuleRow>(&format!(
            "SELECT {RULE_COLUMNS} FROM authorizations WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool.inner())
        .await
        .map_err(storage_error)?;

        Ok(row.map(Into::into))
    }

    async fn create_rule(
        &self,
        draft: RuleDraft,
    ) -> std::result::Result<AuthorizationRule, RuleError> {
        let row = sqlx::query_as::<_, RuleRow>(&format!(
            "INSERT INTO authorizations (app, version_rule, ip_rule, detail_info, created_at) \
             VALUES (?, ?, ?, ?, ?) RETURNING {RULE_COLUMNS}"
        ))
        .bind(&draft.app)
        .bind(&draft.version_rule)
        .bind(&draft.ip_rule)
        .bind(&draft.detail_info)
        .bind(Utc::now())
        .fetch_one(self.pool.inner())
        .await
        .map_err(storage_error)?;

        Ok(row.into())
    }

    async fn update_rule(
        &self,
        id: i64,
        draft: RuleDraft,
    ) -> std::result::Result<AuthorizationRule, RuleError> {
        let row = sqlx::query_as::<_, RuleRow>(&format!(
            "UPDATE authorizations SET app = ?, version_rule = ?, ip_rule = ?, detail_info = ? \
             WHERE id = ? RETURNING {RULE_COLUMNS}"
        ))
        .bind(&draft.app)
        .bind(&draft.version_rule)
        .bind(&draft.ip_rule)
        .bind(&draft.detail_info)
        .bind(id)
        .fetch_optional(self.pool.inner())
        .await
        .map_err(storage_error)?;

        row.map(Into::into).ok_or(RuleError::NotFound(id))
    }

    async fn delete_rule(&self, id: i64) -> std::result::Result<(), RuleError> {
        let result = sqlx::query("DELETE FROM authorizations WHERE id = ?")
            .bind(id)
            .execute(self.pool.inner())
            .await
            .map_err(storage_error)?;

        if result.rows_affected() == 0 {
            return Err(RuleError::NotFound(id));
        }
        Ok(())
    }
}

#[async_trait]
impl EventStore for SqliteStore {
    async fn record_event(&self, event: NewEvent) -> Result<Event> {
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            INSERT INTO events (app, version, event_type, client_ip, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, app, version, event_type, client_ip, created_at
            "#,
        )
        .bind(&event.app)
        .bind(&event.version)
        .bind(event.event_type.as_str())
        .bind(&event.client_ip)
        .bind(event.created_at)
        .fetch_one(self.pool.inner())
        .await?;

        row.try_into()
    }

    async fn list_events(&self, query: &EventQuery) -> Result<Vec<Event>> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, app, version, event_type, client_ip, created_at FROM events WHERE 1=1",
        );

        if let Some(app) = &query.app {
            builder.push(" AND app = ");
            builder.push_bind(app.clone());
        }

        if let Some(event_type) = query.event_type {
            builder.push(" AND event_type = ");
            builder.push_bind(event_type.as_str());
        }

        builder.push(" ORDER BY created_at DESC, id DESC");

        let rows = builder
            .build_query_as::<EventRow>()
            .fetch_all(self.pool.inner())
            .await?;

        rows.into_iter().map(Event::try_from).collect()
    }

    async fn stats(&self, window: StatsWindow) -> Result<Vec<AppStats>> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT app, \
             COALESCE(SUM(CASE WHEN event_type = 'start' THEN 1 ELSE 0 END), 0) AS start_count, \
             COALESCE(SUM(CASE WHEN event_type = 'stop' THEN 1 ELSE 0 END), 0) AS stop_count, \
             COUNT(DISTINCT client_ip) AS unique_ips \
             FROM events WHERE 1=1",
        );

        if let Some(start) = window.start {
            builder.push(" AND created_at >= ");
            builder.push_bind(start);
        }

        if let Some(end) = window.end {
            builder.push(" AND created_at <= ");
            builder.push_bind(end);
        }

        builder.push(" GROUP BY app ORDER BY app ASC");

        let rows = builder
            .build_query_as::<StatsRow>()
            .fetch_all(self.pool.inner())
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[derive(FromRow)]
struct RuleRow {
    id: i64,
    app: String,
    version_rule: String,
    ip_rule: String,
    detail_info: String,
    created_at: DateTime<Utc>,
}

impl From<RuleRow> for AuthorizationRule {
    fn from(row: RuleRow) -> Self {
        AuthorizationRule {
            id: row.id,
            app: row.app,
            version_rule: row.version_rule,
            ip_rule: row.ip_rule,
            detail_info: row.detail_info,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct EventRow {
    id: i64,
    app: String,
    version: String,
    event_type: String,
    client_ip: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<EventRow> for Event {
    type Error = LaunchGateError;

    fn try_from(row: EventRow) -> Result<Self> {
        let event_type = EventType::from_str(&row.event_type)
            .map_err(|err| LaunchGateError::DatabaseError(err.to_string()))?;

        Ok(Event {
            id: row.id,
            app: row.app,
            version: row.version,
            event_type,
            client_ip: row.client_ip,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct StatsRow {
    app: String,
    start_count: i64,
    stop_count: i64,
    unique_ips: i64,
}

impl From<StatsRow> for AppStats {
    fn from(row: StatsRow) -> Self {
        AppStats {
            app: row.app,
            start_count: row.start_count.max(0) as u64,
            stop_count: row.stop_count.max(0) as u64,
            unique_ips: row.unique_ips.max(0) as u64,
        }
    }
}

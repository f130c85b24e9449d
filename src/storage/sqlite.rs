//! SQLite mirror of the dataset.
//!
//! One `runs` row per sweep and one `domain_results` row per domain in that
//! sweep. Evaluator records are stored as JSON so the mirror does not need a
//! schema change when a rule or indicator is added.

use async_trait::async_trait;
use log::debug;
use sqlx::SqlitePool;

use super::migrations::run_migrations;
use super::pool::init_db_pool_with_path;
use super::RowSink;
use crate::aggregate::ResultRow;
use crate::config::{METRIC_SET_VERSION, THREAT_WEIGHTS_VERSION, WCAG21_RULESET_VERSION};
use crate::error_handling::{DatabaseError, SinkError};

/// Metadata for a sweep, recorded at start.
pub struct RunMetadata<'a> {
    pub run_id: &'a str,
    pub start_time_ms: i64,
    pub version: &'a str,
}

/// Totals for a completed sweep, recorded at end.
pub struct RunStats<'a> {
    pub run_id: &'a str,
    pub total_domains: usize,
    pub success_count: usize,
    pub partial_count: usize,
    pub failure_count: usize,
    pub elapsed_seconds: f64,
}

fn to_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Inserts or updates run metadata in the runs table.
pub async fn insert_run_metadata(
    pool: &SqlitePool,
    meta: &RunMetadata<'_>,
) -> Result<(), DatabaseError> {
    sqlx::query(
        "INSERT INTO runs (run_id, version, metric_set_version, ruleset_version, weights_version, start_time_ms)
         VALUES (?, ?, ?, ?, ?, ?)
         ON CONFLICT(run_id) DO UPDATE SET
             version=excluded.version,
             metric_set_version=excluded.metric_set_version,
             ruleset_version=excluded.ruleset_version,
             weights_version=excluded.weights_version,
             start_time_ms=excluded.start_time_ms",
    )
    .bind(meta.run_id)
    .bind(meta.version)
    .bind(METRIC_SET_VERSION)
    .bind(WCAG21_RULESET_VERSION)
    .bind(THREAT_WEIGHTS_VERSION)
    .bind(meta.start_time_ms)
    .execute(pool)
    .await
    .map_err(DatabaseError::SqlError)?;

    Ok(())
}

/// Updates run totals when a sweep completes.
pub async fn update_run_stats(pool: &SqlitePool, stats: &RunStats<'_>) -> Result<(), DatabaseError> {
    let end_time_ms = chrono::Utc::now().timestamp_millis();

    sqlx::query(
        "UPDATE runs
         SET end_time_ms = ?, elapsed_seconds = ?, total_domains = ?,
             success_count = ?, partial_count = ?, failure_count = ?
         WHERE run_id = ?",
    )
    .bind(end_time_ms)
    .bind(stats.elapsed_seconds)
    .bind(to_i64(stats.total_domains))
    .bind(to_i64(stats.success_count))
    .bind(to_i64(stats.partial_count))
    .bind(to_i64(stats.failure_count))
    .bind(stats.run_id)
    .execute(pool)
    .await
    .map_err(DatabaseError::SqlError)?;

    Ok(())
}

/// Inserts one result row for `run_id`.
pub async fn insert_result_row(
    pool: &SqlitePool,
    run_id: &str,
    row: &ResultRow,
) -> Result<(), DatabaseError> {
    let metrics_json = row.metrics.as_ref().map(serde_json::to_string).transpose()?;
    let accessibility_json = row
        .accessibility
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;
    let threat_json = row.threat.as_ref().map(serde_json::to_string).transpose()?;

    sqlx::query(
        "INSERT INTO domain_results (
             run_id, rank, hostname, tier, fetch_status, http_status, outcome, attempts,
             final_url, elapsed_ms, timestamp, failure_reason, compliance_percent, risk_score,
             metrics_json, accessibility_json, threat_json)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(run_id)
    .bind(i64::try_from(row.rank).unwrap_or(i64::MAX))
    .bind(&row.hostname)
    .bind(row.tier.as_str())
    .bind(row.fetch_status.code())
    .bind(row.fetch_status.http_status().map(i64::from))
    .bind(row.outcome.as_str())
    .bind(i64::from(row.attempts))
    .bind(row.final_url.as_deref())
    .bind(i64::try_from(row.elapsed_ms).unwrap_or(i64::MAX))
    .bind(row.timestamp.to_rfc3339())
    .bind(row.failure_reason.as_deref())
    .bind(row.accessibility.as_ref().map(|a| a.compliance_percent))
    .bind(row.threat.as_ref().map(|t| t.risk_score))
    .bind(metrics_json)
    .bind(accessibility_json)
    .bind(threat_json)
    .execute(pool)
    .await?;

    debug!("Mirrored {} into run {run_id}", row.hostname);
    Ok(())
}

/// Row sink writing into the SQLite mirror. Cloning shares the pool.
#[derive(Clone)]
pub struct SqliteSink {
    pool: SqlitePool,
    run_id: String,
}

impl SqliteSink {
    /// Opens the database, applies migrations, and registers the run.
    pub async fn open(
        db_path: &std::path::Path,
        meta: &RunMetadata<'_>,
    ) -> Result<Self, DatabaseError> {
        let pool = init_db_pool_with_path(db_path).await?;
        run_migrations(&pool).await?;
        insert_run_metadata(&pool, meta).await?;
        Ok(Self {
            pool,
            run_id: meta.run_id.to_string(),
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }
}

#[async_trait]
impl RowSink for SqliteSink {
    async fn write_row(&mut self, row: &ResultRow) -> Result<(), SinkError> {
        insert_result_row(&self.pool, &self.run_id, row).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use sqlx::Row;
    use tempfile::TempDir;

    use super::*;
    use crate::aggregate::aggregate;
    use crate::domain::{DomainEntry, TierBoundaries};
    use crate::fetch::{FetchResult, FetchStatus};

    async fn open_sink(dir: &TempDir) -> SqliteSink {
        SqliteSink::open(
            &dir.path().join("water.db"),
            &RunMetadata {
                run_id: "run-1",
                start_time_ms: 1_700_000_000_000,
                version: "test",
            },
        )
        .await
        .expect("open mirror")
    }

    #[tokio::test]
    async fn test_mirror_records_rows_and_run_totals() {
        let dir = TempDir::new().expect("temp dir");
        let mut sink = open_sink(&dir).await;

        let content = b"<html lang=\"en\"><title>t</title></html>";
        let entry = DomainEntry::new(3, "example.com", &TierBoundaries::default()).expect("host");
        let mut fetch = FetchResult::failed(entry.clone(), FetchStatus::Ok, 10);
        fetch.raw_content = Some(content.to_vec());
        let row = aggregate(
            &entry,
            &fetch,
            Some(crate::metrics::extract(content)),
            Some(crate::accessibility::evaluate(content)),
            Some(crate::threat::evaluate(content, &Default::default(), None)),
        );
        sink.write_row(&row).await.expect("insert row");

        update_run_stats(
            sink.pool(),
            &RunStats {
                run_id: "run-1",
                total_domains: 1,
                success_count: 0,
                partial_count: 1,
                failure_count: 0,
                elapsed_seconds: 0.5,
            },
        )
        .await
        .expect("update run");

        let stored = sqlx::query(
            "SELECT hostname, fetch_status, outcome, metrics_json FROM domain_results WHERE run_id = ?",
        )
        .bind("run-1")
        .fetch_one(sink.pool())
        .await
        .expect("select row");
        assert_eq!(stored.get::<String, _>("hostname"), "example.com");
        assert_eq!(stored.get::<String, _>("fetch_status"), "OK");
        assert_eq!(stored.get::<String, _>("outcome"), "partial");
        let metrics: serde_json::Value =
            serde_json::from_str(&stored.get::<String, _>("metrics_json")).expect("json");
        assert_eq!(metrics["has_lang"], serde_json::json!(1.0));

        let run = sqlx::query("SELECT total_domains, ruleset_version FROM runs WHERE run_id = ?")
            .bind("run-1")
            .fetch_one(sink.pool())
            .await
            .expect("select run");
        assert_eq!(run.get::<i64, _>("total_domains"), 1);
        assert_eq!(run.get::<String, _>("ruleset_version"), WCAG21_RULESET_VERSION);
    }

    #[tokio::test]
    async fn test_duplicate_hostname_in_run_is_rejected() {
        let dir = TempDir::new().expect("temp dir");
        let mut sink = open_sink(&dir).await;
        let entry = DomainEntry::new(1, "dup.example", &TierBoundaries::default()).expect("host");
        let fetch = FetchResult::failed(entry.clone(), FetchStatus::Timeout, 1);
        let row = aggregate(&entry, &fetch, None, None, None);

        sink.write_row(&row).await.expect("first insert");
        assert!(sink.write_row(&row).await.is_err());
    }
}

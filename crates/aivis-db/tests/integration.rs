//! Offline unit tests for aivis-db pool configuration and row types.
//! These tests do not require a live database connection.

use aivis_core::{AppConfig, BrandAlias, Environment};
use aivis_db::{AnalyticsFactRow, CanonicalBrandRow, PoolConfig};
use std::path::PathBuf;

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        log_level: "info".to_string(),
        tracked_path: PathBuf::from("./config/tracked.yaml"),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        similarity_threshold: 0.85,
        max_concurrent_answers: 4,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[test]
fn canonical_brand_row_projects_to_candidate() {
    use chrono::Utc;
    use sqlx::types::Json;
    use uuid::Uuid;

    let now = Utc::now();
    let row = CanonicalBrandRow {
        id: Uuid::new_v4(),
        canonical_name: "High Rise".to_string(),
        canonical_slug: "high rise".to_string(),
        canonical_website: Some("highrise.com".to_string()),
        additional_websites: vec!["highrise.io".to_string()],
        aliases: Json(vec![BrandAlias {
            name: "High Rise".to_string(),
            first_seen_at: now,
            mention_count: 1,
        }]),
        domain_verified: false,
        total_mentions: 1,
        first_seen_at: now,
        last_seen_at: now,
        created_at: now,
        updated_at: now,
    };

    let candidate = row.candidate();
    assert_eq!(candidate.id, row.id);
    assert_eq!(candidate.slug, "high rise");
    assert_eq!(candidate.website.as_deref(), Some("highrise.com"));
    assert_eq!(candidate.additional_websites, vec!["highrise.io".to_string()]);
}

/// Compile-time smoke test: confirm that [`AnalyticsFactRow`] has all expected
/// fields with the correct types. No database required.
#[test]
fn analytics_fact_row_has_expected_fields() {
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    let row = AnalyticsFactRow {
        id: 1_i64,
        result_id: Uuid::new_v4(),
        website_id: Uuid::new_v4(),
        fact_date: NaiveDate::from_ymd_opt(2026, 10, 1).expect("valid date"),
        engine: "chatgpt".to_string(),
        tag: "general".to_string(),
        brand_slug: "no_brands".to_string(),
        canonical_brand_id: None,
        brand_name: None,
        brand_website: None,
        is_own_brand: false,
        mention_count: 0_i16,
        ranking_position: None,
        sentiment_score: None,
        total_citations: 2_i32,
        own_brand_citations: 1_i32,
        model: None,
        response_length: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    assert_eq!(row.brand_slug, "no_brands");
    assert_eq!(row.mention_count, 0);
    assert!(row.canonical_brand_id.is_none());
    assert_eq!(row.total_citations, 2);
    assert_eq!(row.own_brand_citations, 1);
}

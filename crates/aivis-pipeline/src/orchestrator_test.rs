use aivis_core::{AnswerMetadata, Citation, DEFAULT_SIMILARITY_THRESHOLD, NO_BRANDS_SLUG};
use chrono::NaiveDate;

use super::*;
use crate::test_support::{acme_website, MemoryStore};

fn mention(name: &str, rank: Option<i32>) -> Mention {
    Mention {
        name: name.to_string(),
        domain: None,
        domain_verified: false,
        sentiment: Some(55.0),
        ranking_position: rank,
    }
}

fn answer(tags: &[&str], citation_domains: &[&str], mentions: Vec<Mention>) -> AnswerContext {
    let tracked = acme_website();
    AnswerContext {
        result_id: Uuid::new_v4(),
        website_id: tracked.id,
        engine: "perplexity".to_string(),
        tags: tags.iter().map(|t| (*t).to_string()).collect(),
        metadata: AnswerMetadata {
            date: NaiveDate::from_ymd_opt(2026, 10, 2).unwrap(),
            model: Some("sonar".to_string()),
            response_length: Some(640),
        },
        citations: citation_domains
            .iter()
            .map(|d| Citation {
                url: format!("https://{d}/"),
                title: None,
                domain: Some((*d).to_string()),
            })
            .collect(),
        mentions,
    }
}

async fn run(store: &MemoryStore, answer: &AnswerContext) -> AnswerOutcome {
    process_answer(store, &acme_website(), answer, DEFAULT_SIMILARITY_THRESHOLD)
        .await
        .unwrap()
}

#[tokio::test]
async fn acme_and_other_co_scenario() {
    let store = MemoryStore::default();
    let answer = answer(
        &["general"],
        &["acme.com", "other.com"],
        vec![mention("Acme", Some(1)), mention("Other Co", Some(2))],
    );

    let outcome = run(&store, &answer).await;
    assert_eq!(outcome.facts_written, 2);
    assert!(!outcome.degraded);

    let rows = store.fact_rows();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.own_brand_citations == 1));
    assert!(rows.iter().all(|r| r.canonical_brand_id.is_some()));

    let acme = rows.iter().find(|r| r.brand_slug == "acme").unwrap();
    assert!(acme.is_own_brand);
    let other = rows.iter().find(|r| r.brand_slug == "other").unwrap();
    assert!(!other.is_own_brand);
    assert_eq!(store.citations.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn zero_mentions_write_one_placeholder_per_tag() {
    let store = MemoryStore {
        fail_resolve: true,
        fail_alias_lookup: true,
        ..MemoryStore::default()
    };
    let answer = answer(&["general", "pricing", "alternatives"], &[], vec![]);

    let outcome = run(&store, &answer).await;
    assert_eq!(outcome.facts_written, 3);
    assert!(!outcome.degraded, "no mentions means no store calls");

    let rows = store.fact_rows();
    assert!(rows.iter().all(|r| r.brand_slug == NO_BRANDS_SLUG));
    assert!(rows.iter().all(|r| r.mention_count == 0));
    assert!(rows.iter().all(|r| r.canonical_brand_id.is_none()));
}

#[tokio::test]
async fn resolution_failure_degrades_identity_and_own_brand() {
    let store = MemoryStore {
        fail_resolve: true,
        ..MemoryStore::default()
    };
    let answer = answer(
        &["general"],
        &["acme.com"],
        vec![mention("Acme", Some(1)), mention("Zenith", Some(2))],
    );

    let outcome = run(&store, &answer).await;
    assert!(outcome.degraded);
    assert_eq!(outcome.facts_written, 2);

    let rows = store.fact_rows();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.canonical_brand_id.is_none()));
    assert!(rows.iter().all(|r| !r.is_own_brand));
    let acme = rows.iter().find(|r| r.brand_slug == "acme").unwrap();
    assert_eq!(acme.own_brand_citations, 1, "citation counts do not depend on identity");
}

#[tokio::test]
async fn short_resolution_batch_degrades_every_mention() {
    let store = MemoryStore {
        truncate_resolve: true,
        ..MemoryStore::default()
    };
    let answer = answer(
        &["general"],
        &[],
        vec![mention("Acme", Some(1)), mention("Zenith", Some(2))],
    );

    let outcome = run(&store, &answer).await;
    assert!(outcome.degraded);
    let rows = store.fact_rows();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.canonical_brand_id.is_none()));
    assert!(rows.iter().all(|r| !r.is_own_brand));
}

#[tokio::test]
async fn own_brand_failure_degrades_the_whole_batch() {
    let store = MemoryStore {
        fail_alias_lookup: true,
        ..MemoryStore::default()
    };
    let answer = answer(&["general"], &["acme.com"], vec![mention("Acme", Some(1))]);

    let outcome = run(&store, &answer).await;
    assert!(outcome.degraded);

    let rows = store.fact_rows();
    assert_eq!(rows.len(), 1);
    assert!(!rows[0].is_own_brand);
    assert!(rows[0].canonical_brand_id.is_none());
    assert_eq!(rows[0].own_brand_citations, 1);
}

#[tokio::test]
async fn fact_write_failure_surfaces_for_retry() {
    let store = MemoryStore {
        fail_write: true,
        ..MemoryStore::default()
    };
    let answer = answer(&["general"], &[], vec![mention("Acme", Some(1))]);

    let err = process_answer(&store, &acme_website(), &answer, DEFAULT_SIMILARITY_THRESHOLD)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Store(_)));
}

#[tokio::test]
async fn invalid_mentions_are_skipped_not_fatal() {
    let store = MemoryStore::default();
    let answer = answer(
        &["general"],
        &[],
        vec![mention("  ", None), mention("Zenith", Some(3)), mention("***", None)],
    );

    let outcome = run(&store, &answer).await;
    assert_eq!(outcome.skipped_mentions, 2);
    assert_eq!(outcome.mentions, 1);
    assert_eq!(outcome.facts_written, 1);
    assert_eq!(store.fact_rows()[0].brand_slug, "zenith");
}

#[tokio::test]
async fn only_invalid_mentions_fall_back_to_placeholders() {
    let store = MemoryStore::default();
    let answer = answer(&["general", "pricing"], &[], vec![mention("", None)]);

    let outcome = run(&store, &answer).await;
    assert_eq!(outcome.skipped_mentions, 1);
    assert_eq!(outcome.facts_written, 2);
    assert!(store.fact_rows().iter().all(FactRow::is_placeholder));
}

#[tokio::test]
async fn redelivered_answer_replaces_rows_and_reuses_identity() {
    let store = MemoryStore::default();
    let answer = answer(
        &["general", "pricing"],
        &[],
        vec![mention("Acme Inc.", Some(1)), mention("Zenith", Some(2))],
    );

    run(&store, &answer).await;
    let first = store.fact_rows();
    run(&store, &answer).await;
    let second = store.fact_rows();

    assert_eq!(first.len(), 4);
    assert_eq!(second.len(), 4);
    assert_eq!(store.brand_count(), 2);
    for row in &second {
        let earlier = first
            .iter()
            .find(|r| r.brand_slug == row.brand_slug && r.tag == row.tag)
            .unwrap();
        assert_eq!(earlier.canonical_brand_id, row.canonical_brand_id);
    }
    assert_eq!(store.brand("acme").unwrap().total_mentions, 2);
}

#[tokio::test]
async fn spellings_of_one_new_brand_share_an_identity() {
    let store = MemoryStore::default();
    let answer = answer(
        &["general"],
        &[],
        vec![mention("Zenith Labs", Some(1)), mention("Zenith Labs Inc", Some(3))],
    );

    run(&store, &answer).await;
    assert_eq!(store.brand_count(), 1);
    let rows = store.fact_rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].ranking_position, Some(1));
}

#[test]
fn preview_leaves_identity_null_and_uses_configured_aliases() {
    let answer = answer(
        &["general"],
        &["acme.com"],
        vec![mention("ACME Widgets", Some(1)), mention("Zenith", Some(2))],
    );
    let rows = preview_answer_facts(&acme_website(), &answer, DEFAULT_SIMILARITY_THRESHOLD);
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.canonical_brand_id.is_none()));
    let widgets = rows.iter().find(|r| r.brand_slug == "acme widgets").unwrap();
    assert!(widgets.is_own_brand);
}

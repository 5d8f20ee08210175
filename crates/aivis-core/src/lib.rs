//! Pure domain logic for AI answer brand analytics.
//!
//! Everything in this crate is deterministic and free of I/O apart from
//! configuration loading: identity normalization, canonical brand matching
//! rules, own-brand matching, and fact-row expansion. Persistence lives in
//! `aivis-db`; orchestration in `aivis-pipeline`.

pub mod app_config;
pub mod config;
pub mod domain;
pub mod facts;
pub mod normalize;
pub mod own_brand;
pub mod resolver;
pub mod similarity;
pub mod tracked;
pub mod types;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use domain::{domain_matches, normalize_domain};
pub use facts::{
    classify_citations, expand_answer_facts, own_brand_citations, CitationRecord, FactRow,
    NO_BRANDS_SLUG, UNTAGGED,
};
pub use normalize::{display_slug, normalize_brand_name};
pub use own_brand::match_own_brand_batch;
pub use resolver::{
    find_canonical_match, initial_aliases, record_alias, BrandAlias, CanonicalCandidate, MatchKind,
};
pub use similarity::{slug_similarity, slugs_match, DEFAULT_SIMILARITY_THRESHOLD};
pub use tracked::{load_tracked_websites, TrackedBrand, TrackedWebsite, TrackedWebsitesFile};
pub use types::{AnswerContext, AnswerMetadata, Citation, Mention, ResolvedMention};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read tracked websites file {path}: {source}")]
    TrackedFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse tracked websites file: {0}")]
    TrackedFileParse(#[from] serde_yaml::Error),

    #[error("tracked websites validation failed: {0}")]
    Validation(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid mention: {0}")]
    InvalidMention(String),
}

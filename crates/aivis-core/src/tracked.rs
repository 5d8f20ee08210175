use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::normalize_domain;
use crate::normalize::normalize_brand_name;
use crate::ConfigError;

/// A business whose prompts are tracked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedWebsite {
    pub id: Uuid,
    pub name: String,
    pub domain: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// The brand identity the own-brand matcher compares mentions against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedBrand {
    pub name: String,
    pub aliases: Vec<String>,
}

impl TrackedWebsite {
    #[must_use]
    pub fn brand(&self) -> TrackedBrand {
        TrackedBrand {
            name: self.name.clone(),
            aliases: self.aliases.clone(),
        }
    }

    /// Normalized tracked domain; `None` only for configs that skipped validation.
    #[must_use]
    pub fn normalized_domain(&self) -> Option<String> {
        normalize_domain(&self.domain)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackedWebsitesFile {
    pub websites: Vec<TrackedWebsite>,
}

impl TrackedWebsitesFile {
    #[must_use]
    pub fn find(&self, website_id: Uuid) -> Option<&TrackedWebsite> {
        self.websites.iter().find(|w| w.id == website_id)
    }
}

/// Load and validate the tracked websites configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_tracked_websites(path: &Path) -> Result<TrackedWebsitesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::TrackedFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let file: TrackedWebsitesFile =
        serde_yaml::from_str(&content).map_err(ConfigError::TrackedFileParse)?;

    validate_tracked(&file)?;

    Ok(file)
}

fn validate_tracked(file: &TrackedWebsitesFile) -> Result<(), ConfigError> {
    let mut seen_ids = HashSet::new();
    let mut seen_slugs = HashSet::new();

    for website in &file.websites {
        let slug = normalize_brand_name(&website.name);
        if slug.is_empty() {
            return Err(ConfigError::Validation(format!(
                "website {} must have a non-empty brand name",
                website.id
            )));
        }

        if normalize_domain(&website.domain).is_none() {
            return Err(ConfigError::Validation(format!(
                "website '{}' has invalid domain '{}'",
                website.name, website.domain
            )));
        }

        if !seen_ids.insert(website.id) {
            return Err(ConfigError::Validation(format!(
                "duplicate website id: {}",
                website.id
            )));
        }

        if !seen_slugs.insert(slug.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate brand identity: '{}' (from website '{}')",
                slug, website.name
            )));
        }
    }

    Ok(())
}

//! Canonical brand inspection and maintenance handlers for the CLI.

use clap::Subcommand;

/// Sub-commands available under `brands`.
#[derive(Debug, Subcommand)]
pub enum BrandsCommands {
    /// List canonical brands by mention volume
    List {
        /// Maximum number of brands to show
        #[arg(long, default_value = "50")]
        limit: i64,
    },
    /// Show one canonical brand with its aliases
    Show {
        /// Identity slug of the brand (as printed by `brands list`)
        slug: String,
    },
    /// Record a secondary website for a canonical brand
    AddWebsite {
        /// Identity slug of the brand
        slug: String,
        /// Domain or URL of the secondary website
        domain: String,
    },
}

/// Format an optional website for display, with a placeholder when `None`.
fn fmt_website(website: Option<&str>) -> &str {
    website.unwrap_or("\u{2014}")
}

/// List canonical brands ordered by total mentions.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_brands_list(pool: &sqlx::PgPool, limit: i64) -> anyhow::Result<()> {
    let brands = aivis_db::list_canonical_brands(pool, limit).await?;

    if brands.is_empty() {
        println!("no canonical brands yet; run `process` first");
        return Ok(());
    }

    println!(
        "{:<28}{:<28}{:<28}{:<10}VERIFIED",
        "SLUG", "NAME", "WEBSITE", "MENTIONS"
    );
    for brand in &brands {
        println!(
            "{:<28}{:<28}{:<28}{:<10}{}",
            brand.canonical_slug,
            brand.canonical_name,
            fmt_website(brand.canonical_website.as_deref()),
            brand.total_mentions,
            if brand.domain_verified { "yes" } else { "no" }
        );
    }

    Ok(())
}

/// Show one canonical brand, its websites, and its recorded aliases.
///
/// # Errors
///
/// Returns an error if the brand is not found or the query fails.
pub(crate) async fn run_brands_show(pool: &sqlx::PgPool, slug: &str) -> anyhow::Result<()> {
    let brand = aivis_db::get_canonical_brand_by_slug(pool, slug)
        .await?
        .ok_or_else(|| anyhow::anyhow!("canonical brand '{slug}' not found"))?;

    println!("id:             {}", brand.id);
    println!("name:           {}", brand.canonical_name);
    println!("slug:           {}", brand.canonical_slug);
    println!(
        "display slug:   {}",
        aivis_core::display_slug(&brand.canonical_name)
    );
    println!(
        "website:        {}",
        fmt_website(brand.canonical_website.as_deref())
    );
    if !brand.additional_websites.is_empty() {
        println!("also:           {}", brand.additional_websites.join(", "));
    }
    println!("verified:       {}", brand.domain_verified);
    println!("mentions:       {}", brand.total_mentions);
    println!(
        "seen:           {} .. {}",
        brand.first_seen_at.format("%Y-%m-%d"),
        brand.last_seen_at.format("%Y-%m-%d")
    );

    println!();
    println!("{:<32}{:<14}FIRST SEEN", "ALIAS", "MENTIONS");
    for alias in &brand.aliases.0 {
        println!(
            "{:<32}{:<14}{}",
            alias.name,
            alias.mention_count,
            alias.first_seen_at.format("%Y-%m-%d")
        );
    }

    Ok(())
}

/// Add a secondary website to a canonical brand.
///
/// # Errors
///
/// Returns an error if the domain is invalid, the brand is not found, or the
/// update fails.
pub(crate) async fn run_brands_add_website(
    pool: &sqlx::PgPool,
    slug: &str,
    domain: &str,
) -> anyhow::Result<()> {
    let normalized = aivis_core::normalize_domain(domain)
        .ok_or_else(|| anyhow::anyhow!("'{domain}' is not a valid domain"))?;

    let brand = match aivis_db::add_additional_website(pool, slug, domain).await {
        Ok(brand) => brand,
        Err(aivis_db::DbError::NotFound) => {
            anyhow::bail!("canonical brand '{slug}' not found")
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(slug, domain = %normalized, "secondary website recorded");
    println!(
        "{}: websites = [{}]",
        brand.canonical_slug,
        brand
            .canonical_website
            .iter()
            .chain(brand.additional_websites.iter())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    );

    Ok(())
}

//! Target registry bootstrap
//!
//! Thin collaborator over the store's idempotent upsert: CSV import for
//! seeding the registry. Expected header: `url,group_name,countryCode`
//! (the country column is optional). Rows with an empty url or group are
//! skipped with a warning; scheme-less URLs get `https://` prefixed.

use std::path::Path;

use anyhow::{Context, bail};
use tracing::{info, warn};

use crate::storage::ProbeStore;

/// One target registered during a CSV import
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedTarget {
    pub id: i64,
    pub url: String,
    pub group_name: String,
    pub country_code: Option<String>,
}

/// Prefix `https://` onto URLs that carry no scheme.
pub fn normalize_url(raw: &str) -> String {
    if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    }
}

/// Load targets from a CSV file and upsert them into the registry
pub async fn import_csv(
    store: &dyn ProbeStore,
    path: impl AsRef<Path>,
) -> anyhow::Result<Vec<ImportedTarget>> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read CSV file: {}", path.display()))?;

    let mut lines = content.lines();
    let header = lines
        .next()
        .with_context(|| format!("CSV file is empty: {}", path.display()))?;

    let columns: Vec<&str> = header.split(',').map(str::trim).collect();
    let Some(url_idx) = columns.iter().position(|c| *c == "url") else {
        bail!("CSV must contain an 'url' column");
    };
    let Some(group_idx) = columns.iter().position(|c| *c == "group_name") else {
        bail!("CSV must contain a 'group_name' column");
    };
    let country_idx = columns.iter().position(|c| *c == "countryCode");

    let mut imported = Vec::new();

    // Header is row 1
    for (idx, line) in lines.enumerate() {
        let row_num = idx + 2;
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let url = fields.get(url_idx).copied().unwrap_or_default();
        let group_name = fields.get(group_idx).copied().unwrap_or_default();

        if url.is_empty() || group_name.is_empty() {
            warn!("skipping row {row_num}: empty url or group_name");
            continue;
        }

        let url = normalize_url(url);
        let country_code = country_idx
            .and_then(|i| fields.get(i))
            .filter(|c| !c.is_empty())
            .map(|c| c.to_string());

        match store
            .register_target(&url, group_name, country_code.as_deref())
            .await
        {
            Ok(id) => {
                info!("registered {url} (group: {group_name})");
                imported.push(ImportedTarget {
                    id,
                    url,
                    group_name: group_name.to_string(),
                    country_code,
                });
            }
            Err(e) => {
                warn!("row {row_num}: failed to register {url}: {e}");
            }
        }
    }

    info!("CSV import complete: {} targets", imported.len());
    Ok(imported)
}

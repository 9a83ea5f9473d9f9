use crate::config::types::Config;
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates a parsed configuration.
///
/// Catches the mistakes that would otherwise surface mid-crawl:
/// unusable site names, URL templates the probe cannot instantiate,
/// degenerate pagination bounds, and empty or duplicated query plans.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site(config)?;
    validate_pagination(config)?;
    validate_output(config)?;
    validate_queries(config)?;
    Ok(())
}

fn validate_site(config: &Config) -> Result<(), ConfigError> {
    let name = config.site.name.trim();
    if name.is_empty() {
        return Err(ConfigError::Validation(
            "site.name must not be empty".to_string(),
        ));
    }
    if !name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "site.name '{}' must contain only alphanumerics, '-', or '_' (it is used in filenames)",
            name
        )));
    }

    let template = &config.site.url_template;
    if !template.contains("{page}") {
        return Err(ConfigError::InvalidUrl(format!(
            "url-template '{}' is missing the {{page}} placeholder",
            template
        )));
    }

    // Instantiate with dummy values; the result must be a real URL
    let sample = template
        .replace("{category}", "category")
        .replace("{subcategory}", "subcategory")
        .replace("{page}", "1");
    Url::parse(&sample)
        .map_err(|e| ConfigError::InvalidUrl(format!("url-template '{}': {}", template, e)))?;

    Ok(())
}

fn validate_pagination(config: &Config) -> Result<(), ConfigError> {
    let p = &config.pagination;
    if p.step_size == 0 {
        return Err(ConfigError::Validation(
            "pagination.step-size must be at least 1".to_string(),
        ));
    }
    if p.max_pages == 0 {
        return Err(ConfigError::Validation(
            "pagination.max-pages must be at least 1".to_string(),
        ));
    }
    if p.step_size > p.max_pages {
        return Err(ConfigError::Validation(format!(
            "pagination.step-size ({}) must not exceed pagination.max-pages ({})",
            p.step_size, p.max_pages
        )));
    }
    if p.probe_retries == 0 {
        return Err(ConfigError::Validation(
            "pagination.probe-retries must be at least 1".to_string(),
        ));
    }
    Ok(())
}

fn validate_output(config: &Config) -> Result<(), ConfigError> {
    let o = &config.output;
    for (field, value) in [
        ("output.records-dir", &o.records_dir),
        ("output.checkpoint-dir", &o.checkpoint_dir),
        ("output.archive-dir", &o.archive_dir),
        ("output.master-path", &o.master_path),
        ("output.report-path", &o.report_path),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "{} must not be empty",
                field
            )));
        }
    }
    Ok(())
}

fn validate_queries(config: &Config) -> Result<(), ConfigError> {
    if config.queries.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[queries]] entry is required".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for entry in &config.queries {
        if entry.category.trim().is_empty() || entry.subcategory.trim().is_empty() {
            return Err(ConfigError::Validation(
                "query category and subcategory must not be empty".to_string(),
            ));
        }
        let id = entry.to_query().id();
        if !seen.insert(id.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate query entry: {}",
                id
            )));
        }
    }
    Ok(())
}

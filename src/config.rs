use crate::cleaning::{ExtractionPattern, ExtractionRule, NormalizeRules};
use crate::{DashError, Result};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub anchor_column: String,
    pub name_column: String,
    pub fuel_column: String,
    pub transmission_column: String,
    pub owner_column: String,
    pub year_column: String,
    pub extraction_rules: Vec<ExtractionRule>,
    pub page_size: usize,
    /// Seconds before a cached dataset is reloaded. `None` keeps it until an
    /// explicit refresh.
    pub cache_ttl_secs: Option<i64>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            anchor_column: "Price".to_string(),
            name_column: "Name".to_string(),
            fuel_column: "Fuel_Type".to_string(),
            transmission_column: "Transmission".to_string(),
            owner_column: "Owner_Type".to_string(),
            year_column: "Year".to_string(),
            extraction_rules: vec![
                ExtractionRule::new("Engine", ExtractionPattern::Integer),
                ExtractionRule::new("Power", ExtractionPattern::Decimal),
                ExtractionRule::new("Mileage", ExtractionPattern::Decimal),
            ],
            page_size: 50,
            cache_ttl_secs: None,
        }
    }
}

impl DashboardConfig {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: DashboardConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(DashError::InvalidConfig(
                "page_size must be at least 1".to_string(),
            ));
        }
        if matches!(self.cache_ttl_secs, Some(secs) if secs <= 0) {
            return Err(DashError::InvalidConfig(
                "cache_ttl_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn page_size(&self) -> Result<NonZeroUsize> {
        NonZeroUsize::new(self.page_size)
            .ok_or_else(|| DashError::InvalidConfig("page_size must be at least 1".to_string()))
    }

    pub fn cache_ttl(&self) -> Option<chrono::Duration> {
        self.cache_ttl_secs.map(chrono::Duration::seconds)
    }

    pub fn normalize_rules(&self) -> NormalizeRules {
        NormalizeRules {
            anchor_column: self.anchor_column.clone(),
            extraction_rules: self.extraction_rules.clone(),
        }
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Categorical tariff-risk bucket assigned to a company
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExposureLevel {
    High,
    Medium,
    Low,
    None,
}

impl ExposureLevel {
    pub const ALL: [ExposureLevel; 4] = [
        ExposureLevel::High,
        ExposureLevel::Medium,
        ExposureLevel::Low,
        ExposureLevel::None,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExposureLevel::High => "high",
            ExposureLevel::Medium => "medium",
            ExposureLevel::Low => "low",
            ExposureLevel::None => "none",
        }
    }
}

impl fmt::Display for ExposureLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExposureLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(ExposureLevel::High),
            "medium" => Ok(ExposureLevel::Medium),
            "low" => Ok(ExposureLevel::Low),
            "none" => Ok(ExposureLevel::None),
            other => Err(format!(
                "unknown exposure level '{}' (expected high, medium, low or none)",
                other
            )),
        }
    }
}

/// One row of the portfolio dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub ticker: String,
    pub company_name: String,
    pub sector: String,
    pub industry: String,
    pub investment_usd: f64,
    pub revenue_usd: f64,
    pub cogs_usd: f64,
    pub gross_margin_pct: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fiscal_year: Option<i32>,
    pub imports_into_us: bool,
    pub affected_cogs_pct: f64,
    pub exposure_level: ExposureLevel,
    pub confidence: f64,
}

impl CompanyRecord {
    /// Portion of COGS subject to tariffs, in USD
    pub fn affected_cogs_usd(&self) -> f64 {
        self.cogs_usd * self.affected_cogs_pct
    }
}

/// Opaque per-call identifier (`rq_` + 8 hex chars)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn new() -> Self {
        let id = Uuid::new_v4().simple().to_string();
        Self(format!("rq_{}", &id[..8]))
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

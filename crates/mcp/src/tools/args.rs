//! Argument adaptation between MCP tool calls and the query engine.
//!
//! Callers driven by strict JSON schemas cannot omit optional fields, so they
//! send `""` (or `0` for the numeric bounds) to mean "unset". That convention
//! stops here: everything past this module sees [`FilterValue::Absent`].

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use tariffscope_core::engine::ops;
use tariffscope_core::{
    CompanyLookup, ExposureLevel, FilterValue, ImportsFilter, QueryError, QueryFilter,
    QueryOptions, QueryResult, SortField, DEFAULT_LIMIT,
};

#[derive(Debug, Default, Deserialize)]
pub struct QueryPortfolioArgs {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub sector: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub industry: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub exposure_level: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub imports_filter: Option<String>,
    #[serde(default, deserialize_with = "number_or_blank")]
    pub min_revenue: Option<f64>,
    #[serde(default, deserialize_with = "number_or_blank")]
    pub max_revenue: Option<f64>,
    #[serde(default, deserialize_with = "number_or_blank")]
    pub min_affected_cogs_pct: Option<f64>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub company_name: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub ticker: Option<String>,
    #[serde(default, deserialize_with = "integer_or_blank")]
    pub limit: Option<i64>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub sort_by: Option<String>,
    #[serde(default, deserialize_with = "bool_or_blank")]
    pub sort_desc: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CompanyDetailsArgs {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub ticker: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub company_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SectorArgs {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub sector: Option<String>,
}

/// Arguments of `query_sp500_portfolio`
pub fn query_arguments(arguments: &Value) -> QueryResult<(QueryFilter, QueryOptions)> {
    let args: QueryPortfolioArgs = decode(ops::QUERY_PORTFOLIO, arguments)?;

    let exposure_level = args
        .exposure_level
        .map(|raw| raw.parse::<ExposureLevel>())
        .transpose()
        .map_err(QueryError::InvalidArgument)?;

    // Values other than yes/no impose no constraint
    let imports = args
        .imports_filter
        .as_deref()
        .and_then(ImportsFilter::parse);

    // 0 means unset for every numeric bound
    let bound = |value: Option<f64>| FilterValue::from(value.filter(|v| *v != 0.0));

    let filter = QueryFilter {
        sector: args.sector.into(),
        industry: args.industry.into(),
        exposure_level: exposure_level.into(),
        imports: imports.into(),
        min_revenue: bound(args.min_revenue),
        max_revenue: bound(args.max_revenue),
        min_affected_cogs_pct: bound(args.min_affected_cogs_pct),
        company_name: args.company_name.into(),
        ticker: args.ticker.into(),
    };

    let sort_by = args
        .sort_by
        .map(|raw| raw.parse::<SortField>())
        .transpose()?;

    let limit = match args.limit {
        None => DEFAULT_LIMIT,
        Some(n) if n >= 1 => usize::try_from(n).unwrap_or(usize::MAX),
        Some(n) => {
            return Err(QueryError::invalid_argument(format!(
                "limit must be at least 1, got {}",
                n
            )))
        }
    };

    let options = QueryOptions {
        sort_by: sort_by.into(),
        sort_desc: args.sort_desc.unwrap_or(true),
        limit,
    };

    Ok((filter, options))
}

/// Arguments of `get_company_details`
pub fn lookup_arguments(arguments: &Value) -> QueryResult<CompanyLookup> {
    let args: CompanyDetailsArgs = decode(ops::COMPANY_DETAILS, arguments)?;
    Ok(CompanyLookup {
        ticker: args.ticker.into(),
        company_name: args.company_name.into(),
    })
}

/// Arguments of `get_sector_analysis`
pub fn sector_argument(arguments: &Value) -> QueryResult<FilterValue<String>> {
    let args: SectorArgs = decode(ops::SECTOR_ANALYSIS, arguments)?;
    Ok(args.sector.into())
}

/// `null` is treated as an empty argument object
fn decode<T: DeserializeOwned + Default>(op: &str, arguments: &Value) -> QueryResult<T> {
    if arguments.is_null() {
        return Ok(T::default());
    }

    T::deserialize(arguments).map_err(|e| {
        QueryError::invalid_argument(format!("Invalid arguments for {}: {}", op, e))
    })
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Numeric {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Numeric {
    fn into_f64<E: de::Error>(self) -> Result<Option<f64>, E> {
        let value = match self {
            Numeric::Integer(n) => n as f64,
            Numeric::Float(f) => f,
            Numeric::Text(s) if s.trim().is_empty() => return Ok(None),
            Numeric::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| E::custom(format!("expected a number, got '{}'", s)))?,
        };

        if value.is_finite() {
            Ok(Some(value))
        } else {
            Err(E::custom("expected a finite number"))
        }
    }
}

/// Number or numeric string; blank means absent
fn number_or_blank<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Numeric>::deserialize(deserializer)? {
        Some(n) => n.into_f64(),
        None => Ok(None),
    }
}

/// Whole number or integer string; blank means absent
fn integer_or_blank<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Numeric>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Numeric::Integer(n)) => Ok(Some(n)),
        Some(Numeric::Float(f)) if f.fract() == 0.0 && f.is_finite() => Ok(Some(f as i64)),
        Some(Numeric::Float(f)) => Err(de::Error::custom(format!(
            "expected a whole number, got {}",
            f
        ))),
        Some(Numeric::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Numeric::Text(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("expected a whole number, got '{}'", s))),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Text(String),
}

/// Boolean or "true"/"false"; blank means absent
fn bool_or_blank<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Flag>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Flag::Bool(b)) => Ok(Some(b)),
        Some(Flag::Text(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "" => Ok(None),
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            _ => Err(de::Error::custom(format!("expected true or false, got '{}'", s))),
        },
    }
}

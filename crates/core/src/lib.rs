// Core query engine for the tariff-exposure portfolio dataset

pub mod aggregation;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod filter;
pub mod metrics;
pub mod sort;
pub mod types;

pub use dataset::Portfolio;
pub use engine::{CompanyLookup, PortfolioEngine, ToolResponse};
pub use error::{DatasetError, QueryError, QueryResult};
pub use filter::{FilterValue, ImportsFilter, QueryFilter};
pub use sort::{QueryOptions, SortField, DEFAULT_LIMIT};
pub use types::*;

pub mod chart;
pub mod config;
pub mod csv_codec;
pub mod http;
pub mod import;
pub mod metrics_server;
pub mod observability;
pub mod stats;

pub use chart::ChartData;
pub use csv_codec::ImportSummary;

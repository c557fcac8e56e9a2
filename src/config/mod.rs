pub mod app;

pub use app::{AdvisoryConfig, AppConfig, ReportConfig, RoutingConfig};

pub mod pagination;
pub mod password;
pub mod telemetry;

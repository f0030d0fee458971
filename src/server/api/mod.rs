pub mod health_controller;
pub mod metrics_controller;
pub mod proxy_controller;

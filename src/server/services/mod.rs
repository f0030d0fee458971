pub mod edge_services;
pub mod relay_services;

pub use edge_services::EdgeServices;
pub use relay_services::DynRelayService;

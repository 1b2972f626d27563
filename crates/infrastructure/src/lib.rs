//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod http_console_gateway;
mod in_memory_rbac_gateway;

pub use http_console_gateway::HttpConsoleGateway;
pub use in_memory_rbac_gateway::InMemoryRbacGateway;

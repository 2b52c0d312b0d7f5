pub mod api_router;
pub mod catalyst;
pub mod config;
pub mod dashboards;
pub mod directory;
pub mod hierarchy;
pub mod interchange;
pub mod observations;
pub mod shared;
pub mod standards;
#[cfg(test)]
pub mod tests;

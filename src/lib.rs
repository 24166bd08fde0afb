pub mod app;
pub mod config;
pub mod events;
pub mod executor;
pub mod logging;
pub mod lxc;
pub mod poller;
pub mod screen;
pub mod signals;
pub mod store;
pub mod types;
pub mod ui;

#[cfg(test)]
mod test_support;

pub mod handler;
pub mod input;
pub mod key_bindings;

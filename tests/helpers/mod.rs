pub mod factories;
pub mod factory;
pub mod stores;

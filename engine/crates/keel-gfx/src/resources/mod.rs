pub mod handles;
pub mod manager;
pub mod resource;
pub mod state_store;

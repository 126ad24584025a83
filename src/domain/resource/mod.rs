pub mod resource;
pub mod resource_set;
pub mod resource_store;

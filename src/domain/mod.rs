pub mod kernel_model;
pub mod reservation;
pub mod resource;
pub mod route;
pub mod scheduler;
pub mod utils;
pub mod vehicle;

pub mod pending_allocation;
pub mod reservation_entry;
pub mod reservation_pool;

pub mod allocation_arbiter;
pub mod deferred_request_manager;
pub mod scheduler;
pub mod scheduler_client;
pub mod scheduler_config;
pub mod scheduler_message;
pub mod scheduler_module;
pub mod task_handle;

#[macro_use]
mod log_macros;

pub mod error;
pub mod lifecycle;
pub mod tracing_init;
mod dispatcher_task;
mod router_task;

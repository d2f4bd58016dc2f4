//! Per-service worker logic shared by the fleet's binaries: the dual-loop
//! skeleton plus one module per service (Submitter, Canceller, the four
//! Monitor-family members, and the three Handlers).

pub mod account_handler;
pub mod account_monitor;
pub mod canceller;
pub mod order_handler;
pub mod order_monitor;
pub mod position_handler;
pub mod position_monitor;
pub mod position_reconciler;
pub mod skeleton;
pub mod submitter;

pub use skeleton::{
    run_broker_service, run_handler_service, run_monitor_service, MonitorHandler, WorkerHandler,
};

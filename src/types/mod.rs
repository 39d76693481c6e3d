//! Core request/response types

pub mod request;
pub mod response;

pub use request::{TaskContext, TaskKind, TaskRequest};
pub use response::{Completion, TaskResponse, UsageSummary};

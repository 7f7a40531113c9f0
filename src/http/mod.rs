//! HTTP response capture for refresh flows.

mod response;

pub use response::CapturedResponse;

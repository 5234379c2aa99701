//! Provider-neutral issue values
//!
//! `IssueRequest` goes into an adapter call and `IssueResponse` comes out of it.
//! Neither is persisted; both live for a single upstream round trip.

mod request;
mod response;

pub use request::IssueRequest;
pub use response::{IssueResponse, IssueStatus};

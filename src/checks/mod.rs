//! Compliance rule sets.
//!
//! Each rule set turns observations of a target into one [`Section`] of
//! [`CheckOutcome`]s. Probe failures never escape a rule set: they become an
//! ERROR outcome scoped to the step that hit them.
//!
//! | Module | Section | Rule codes |
//! |--------|---------|------------|
//! | [`network`] | `Network`, `Schema` | `NET-*`, `URL-*`, `HTTP-*`, `JSON-*`, `CARD-STRUCT` |
//! | [`card`] | `AgentCard` | `CARD-0xx` |
//! | [`jsonrpc`] | `JSON-RPC` | `RPC-0xx` |
//! | [`rest`] | `HTTP+JSON` | `REST-0xx` |
//!
//! [`Section`]: crate::model::Section
//! [`CheckOutcome`]: crate::model::CheckOutcome

pub mod card;
pub mod jsonrpc;
pub mod network;
pub mod rest;

pub use card::{CardChecks, RawCard};
pub use jsonrpc::{JsonRpcChecks, RpcProfile};
pub use network::{CardFetch, CardService};
pub use rest::{rest_endpoint, RestChecks};

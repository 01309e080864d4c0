//! JSON-RPC request handling for the Meridian node.
//!
//! The flow for one request: raw text → [`meridian_json::Value`] → envelope
//! detection → [`dispatch`] by method name → handler resolves a ledger
//! snapshot and runs the appropriate enumerator → result serialized back
//! into a success or error envelope.

pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod params;
pub mod server;

pub use dispatch::{dispatch, Context};
pub use envelope::process_request;
pub use error::{ErrorKind, ErrorObject};
pub use server::RpcServer;

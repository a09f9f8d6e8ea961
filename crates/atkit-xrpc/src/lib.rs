//! atkit-xrpc - XRPC identity resolution and session lifecycle.
//!
//! [`XrpcResolver`] walks handle → DID → identity document → PDS →
//! authorization server. [`XrpcAgent`] logs in, keeps the session's tokens
//! fresh in the background and ends the session.

mod agent;
mod pds;
mod resolver;
mod xrpc;

pub use agent::{
    AgentConfig, AgentState, HANDLE_NOT_RESOLVABLE, PDS_NOT_RESOLVABLE, RefreshSchedule,
    XrpcAgent, refresh_schedule,
};
pub use pds::XrpcPds;
pub use resolver::{
    DEFAULT_HANDLE_RESOLVER, DEFAULT_PLC_DIRECTORY, HandleStep, PlcDirectory, ResolverOptions,
    WebDirectory, XrpcResolver,
};
pub use xrpc::XrpcClient;
pub use xrpc::endpoints::{GetSessionResponse, SessionResponse};

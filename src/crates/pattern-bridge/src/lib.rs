//! Bridge to an out-of-process pattern worker
//!
//! Heavy patterns (translation, model inference) run in a separate worker
//! process that speaks JSON over HTTP. This crate provides:
//!
//! - `client` - the [`IpcBridge`] lifecycle, health, version and execution calls
//! - `messages` - request/response wire types with id correlation
//! - `adapter` - [`RemotePattern`], exposing worker patterns through the registry
//! - `config` - [`BridgeConfig`] with file and environment loading

pub mod adapter;
pub mod client;
pub mod config;
pub mod error;
pub mod messages;

pub use adapter::{register_remote_patterns, RemotePattern};
pub use client::{BridgeState, IpcBridge};
pub use config::{load_config_file, BridgeConfig, WireFormat};
pub use error::{BridgeError, Result};
pub use messages::{new_request_id, RpcRequest, RpcResponse};

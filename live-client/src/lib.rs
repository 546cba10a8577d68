//! # live-client
//!
//! Live status sync for repeater controllers.
//!
//! This is the library that front-ends use to keep a status display in sync
//! with the device.
//!
//! ## Features
//!
//! - **Two channels**: periodic HTTP pull plus WebSocket push deltas
//! - **Single writer**: every mutation runs on the engine task
//! - **Self-healing push**: reconnect supervisor with injectable retry policy
//! - **Pure core**: uses live-core for side-effect-free logic
//!
//! ## Example
//!
//! ```ignore
//! use live_client::{DeviceEndpoint, EngineConfig, HttpPullClient, LiveEngine, LogSink, WsTransport};
//!
//! let endpoint = DeviceEndpoint::from_page_url("http://192.168.4.1/")?;
//! let config = EngineConfig::default();
//! let pull = HttpPullClient::new(endpoint.clone(), config.request_timeout)?;
//! let engine = LiveEngine::new(config, pull, WsTransport::new(), &endpoint.push_url(), LogSink);
//!
//! let handle = engine.spawn();
//! println!("{}", handle.snapshot().repeater_state);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod endpoint;
pub mod engine;
pub mod pull;
pub mod sink;
pub mod supervisor;
pub mod transport;

pub use config::EngineConfig;
pub use endpoint::{DeviceEndpoint, EndpointError, DEFAULT_PUSH_PORT};
pub use engine::{EngineCommand, EngineError, EngineHandle, LiveEngine};
pub use pull::{HttpPullClient, MockPullClient, PullClient, PullError};
pub use sink::{effect_target, ChannelSink, LogSink, SinkError, ViewSink};
pub use supervisor::{PushEvent, Supervisor};
pub use transport::{MockTransport, PushTransport, TransportError, WsTransport};

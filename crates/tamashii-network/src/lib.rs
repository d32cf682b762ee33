//! Network layer for the Tamashii terminal agent.
//!
//! The agent keeps one TCP connection to its manager. Events cross that link
//! as length-prefixed frames handled by [`EventCodec`]; [`TcpClient`] wraps
//! the framed stream with connect/send/receive timeouts.
//!
//! # Example
//!
//! ```no_run
//! use tamashii_network::{TcpClient, TcpClientConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut client = TcpClient::new(TcpClientConfig::default());
//! client.connect().await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod codec;

pub use client::{TcpClient, TcpClientConfig, TcpClientError};
pub use codec::EventCodec;

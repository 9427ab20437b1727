//! rota-client: HTTP implementation of the availability backend
//!
//! ```rust,ignore
//! use rota_client::HttpBackend;
//!
//! let backend = HttpBackend::new(&config.backend)?;
//! let staff = backend.fetch_staff().await?;
//! ```

pub mod client;
pub mod error;

pub use client::HttpBackend;
pub use error::{ClientError, Result};

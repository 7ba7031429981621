//! Upload provider for Hetzner Object Storage
//!
//! This crate lets a file-storage layer persist uploads to Hetzner Object
//! Storage through its S3-compatible API, using Hetzner's regional endpoints
//! (`fsn1`, `nbg1`, `hel1`) instead of generic AWS ones.
//!
//! It provides:
//! - Upload by buffer or by stream (streams go through multipart upload)
//! - Delete
//! - Public URL computation, with an optional CDN base URL
//! - Client injection behind the [`ObjectClient`] trait for testing
//!
//! # Quick Start
//!
//! ```no_run
//! use hetzner_object_storage::*;
//!
//! # async fn example() -> Result<()> {
//! let storage = HetznerStorage::new(
//!     ProviderConfig::new(HetznerRegion::Fsn1)
//!         .credentials("access-key", "secret-key")
//!         .bucket("media")
//!         .prefix("uploads")
//!         .public_read(),
//! )?;
//!
//! let mut file = UploadFile::from_bytes(&b"hello"[..], "hello.txt");
//! storage.upload(&mut file).await?;
//! println!("stored at {}", file.url.unwrap());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod file;
pub mod path;
pub mod provider;
pub mod region;
pub mod s3;

pub use client::*;
pub use config::*;
pub use error::*;
pub use file::*;
pub use path::*;
pub use provider::*;
pub use region::*;
pub use s3::*;

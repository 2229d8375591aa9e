//! Refrain Client
//!
//! HTTP client for the Refrain server: the static catalog document and the
//! likes API.
//!
//! # Features
//!
//! - **Catalog**: fetch and parse the whole catalog document in one request
//! - **Likes**: list, like and unlike tracks with a bearer token
//! - **Liked set**: optimistic local membership that reverts on failure
//!
//! # Example
//!
//! ```ignore
//! use refrain_client::{ClientConfig, LikeKey, LikedSet, RefrainClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = RefrainClient::new(ClientConfig::with_token(
//!         "https://music.example.com",
//!         "token",
//!     ))?;
//!
//!     let catalog = client.fetch_catalog().await?;
//!     println!("{} albums", catalog.albums().len());
//!
//!     let mut liked = LikedSet::new();
//!     liked.refresh(&client).await?;
//!     liked.toggle_remote(&client, LikeKey::new(1, 3)).await;
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod liked_set;
mod likes;
mod types;

pub use client::{LikesClientHandle, RefrainClient};
pub use error::{ClientError, Result};
pub use liked_set::LikedSet;
pub use types::{ClientConfig, LikeKey, LikeOutcome, UnlikeOutcome, DEFAULT_CATALOG_PATH};

pub use likes::LikesClient;

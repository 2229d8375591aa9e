//! Refrain Player
//!
//! Headless player session: fetches the catalog, restores saved state, drives
//! a simulated media device and persists state as it settles.

pub mod config;
pub mod console;
pub mod device;
pub mod error;
pub mod session;

pub use config::PlayerConfig;
pub use device::SimulatedDevice;
pub use error::{AppError, Result};
pub use session::{Session, SessionView, UiCommand};

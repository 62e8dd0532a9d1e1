pub mod config;
pub mod constants;
pub mod device;
pub mod error;
pub mod frame;
pub mod image;
pub mod transport;
pub mod value;

#[cfg(test)]
mod tests;

// Re-export the connection type for easy access
pub use config::Config;
pub use device::{CallbackResult, Gdm70x, Reading};
pub use error::{GdmError, Result};
pub use image::Image;
pub use transport::Transport;
pub use value::{Measurement, Multiplier, Unit};

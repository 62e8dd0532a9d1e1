pub mod error;
pub mod logging;
pub mod output;
pub mod xpm;

pub use error::FormatError;
pub use output::ValueFormat;
pub use xpm::{FilenameFormat, write_xpm};

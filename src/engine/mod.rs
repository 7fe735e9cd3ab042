pub mod config;
pub mod error;
pub mod visualize;

pub use config::Config;
pub use error::{write_artifact, SublineError};
pub use visualize::{build_plot, render_batch, visualize_batch};

//! CLI API

pub use crate::app::cli::args::{use_color, Args, Command, SessionArgs, ValidateArgs};

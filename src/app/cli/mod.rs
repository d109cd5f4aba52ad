//! Command line parsing

pub mod api;
pub mod args;

#[cfg(test)]
mod tests;

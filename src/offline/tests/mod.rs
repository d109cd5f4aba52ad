//! Test modules for the offline cache controller
//!
//! `support` holds the fake network shared by the suites.

mod support;

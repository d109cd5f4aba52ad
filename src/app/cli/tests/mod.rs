//! Tests for command line parsing and its interaction with the config file

//! Integration tests for the deployment configuration resolver

mod config_loading;
mod scenario;
mod tasks;
mod test_utils;

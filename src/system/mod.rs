//! System interaction: external command execution and local network probing.

pub mod net;

pub use net::{detect_subnets, find_system_macs, has_command, run_command};

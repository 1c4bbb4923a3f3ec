//! Guacamole remote desktop launcher
//!
//! Loads the gateway login page, captures the session token from the local
//! redirect, and keeps the desktop's own shortcuts out of the way while the
//! remote session is fullscreen.

pub mod clipboard;
pub mod config;
pub mod console;
pub mod constants;
pub mod display;
pub mod events;
pub mod keys;
pub mod redirect;
pub mod session;
pub mod utils;

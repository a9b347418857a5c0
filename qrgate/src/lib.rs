//! qrgate library
//!
//! A public QR scanner with a password-gated QR generator, served over HTTP.
//! The binary entry point is in main.rs.

pub mod config;
pub mod error;
pub mod qr;
pub mod session;
pub mod web;

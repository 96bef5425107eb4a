//! HTTP API gateway for the Arcade launch pipeline.
//!
//! Exposes game launches, the game catalog and per-user access management
//! over JSON. Authentication is left to the hosting proxy.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod error;
pub mod routes;

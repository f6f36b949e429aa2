//! osf-api: OSF REST adapter for the osf CLI client
//!
//! This crate provides the implementation of the RemoteStore trait
//! on top of the OSF JSON:API and its file service. It is the only
//! crate that directly depends on an HTTP client.

pub mod client;
pub mod model;

pub use client::OsfClient;

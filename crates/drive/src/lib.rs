//! dsk-drive: Drive REST API adapter for the dsk upload client
//!
//! This crate provides the implementation of the RemoteStore trait
//! against the Drive v3 REST API. It is the only crate that speaks
//! HTTP to the storage service.

pub mod client;
pub mod link;
mod resumable;

pub use client::{DriveClient, DriveConnector};
pub use link::id_from_link;

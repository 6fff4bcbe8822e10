#![doc = "profile-deploy-core: core logic library for profile-deploy."]

//! This crate contains the publishing pipeline for managed-config profile files:
//! listing a source directory, rewriting each file's first line into a
//! `#!MANAGED-CONFIG` header that points at its own public URL, and uploading
//! the result through an [`contract::ObjectStore`].
//!
//! No cloud SDK is linked here. The CLI crate supplies the concrete store.
//!
//! # Usage
//! Build a [`publisher::Publisher`] around a store, then hand it to
//! [`deploy::deploy`] together with a [`config::DeployConfig`].

pub mod config;
pub mod contract;
pub mod deploy;
pub mod error;
pub mod header;
pub mod listing;
pub mod publisher;

pub use error::DeployError;

#![doc = "binary-file-manager-core: ingestion pipeline and link classification for vault attachments."]

//! This crate holds the domain logic of binary-file-manager. New binaries that
//! land in the configured source folder get a metadata note rendered from a
//! template, and the binary itself is filed under the attachments folder.
//!
//! Every host collaborator (document store, link index, seen-set, external
//! template engine, notification sink) is a trait in [`contract`], with one
//! production implementation in this crate and `mockall` doubles behind the
//! `test-export-mocks` feature.
//!
//! # Navigation
//! - Orchestrator: [`generator::MetaDataGenerator`]
//! - Link classification: [`classify::LinkClassifier`]
//! - Settings: [`settings::ManagerSettings`]

pub mod classify;
pub mod contract;
pub mod engine;
pub mod error;
pub mod extension;
pub mod file_list;
pub mod formatter;
pub mod generator;
pub mod links;
pub mod notice;
pub mod paths;
pub mod retry;
pub mod settings;
pub mod template;
pub mod uniquify;
pub mod vault;

//! Notedex - scanned-notes ingestion and page search.
//!
//! Documents are uploaded, handed to an external asynchronous OCR
//! service, aggregated into per-page text records once the OCR job
//! completes, and queried through a lexical relevance ranker that
//! returns the best-matching pages with signed deep links back to the
//! viewable file.

pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod ocr;
pub mod repository;
pub mod search;
pub mod server;
pub mod services;
pub mod signer;
pub mod storage;

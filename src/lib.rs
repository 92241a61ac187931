//! # pdfshelf
//!
//! A local PDF library: a directory of PDFs kept searchable by an in-memory
//! inverted index, with summaries, page extraction and EPUB conversion on
//! top.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌──────────────┐
//! │   Scanner   │──▶│   Rebuild    │──▶│   Snapshot   │
//! │  store dir  │   │ extract+index│   │ records+index│
//! └─────────────┘   └──────────────┘   └──────┬───────┘
//!                                             │
//!                      ┌──────────────────────┤
//!                      ▼                      ▼
//!                 ┌──────────┐          ┌──────────┐
//!                 │   CLI    │          │   HTTP   │
//!                 │ (shelf)  │          │  (axum)  │
//!                 └──────────┘          └──────────┘
//! ```
//!
//! Rebuilds always start from the directory, run on a single background
//! worker and publish a new immutable [`lifecycle::Snapshot`] atomically.
//! Searches read whichever snapshot is current.
//!
//! ## Quick Start
//!
//! ```bash
//! shelf list                    # what is in the store
//! shelf search "ownership"      # ranked search
//! shelf summary report.pdf      # three-sentence summary
//! shelf serve                   # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`error`] | Error taxonomy |
//! | [`scanner`] | Store directory enumeration |
//! | [`extract`] | PDF text and metadata extraction |
//! | [`tokenize`] | Tokenizer shared by indexing and queries |
//! | [`index`] | Inverted index and scoring |
//! | [`rebuild`] | Scan → extract → index pipeline |
//! | [`lifecycle`] | Snapshot publication and rebuild worker |
//! | [`search`] | Query engine |
//! | [`library`] | Facade over all operations |
//! | [`documents`] | Listing and metadata commands |
//! | [`summary`] | Extractive summaries |
//! | [`pages`] | Page-range extraction |
//! | [`chunk`] | Paragraph sectioning |
//! | [`epub`] | EPUB 3 writer |
//! | [`server`] | HTTP server |

pub mod chunk;
pub mod config;
pub mod documents;
pub mod epub;
pub mod error;
pub mod extract;
pub mod index;
pub mod library;
pub mod lifecycle;
pub mod models;
pub mod pages;
pub mod rebuild;
pub mod scanner;
pub mod search;
pub mod server;
pub mod summary;
pub mod tokenize;

//! # docqa
//!
//! A local document knowledge base with multi-format text extraction and
//! question answering by a large language model.
//!
//! Files of many media types are reduced to plain text, the text is kept
//! in a single SQLite table, and questions are answered by sending every
//! stored document, framed as one context block, to an LLM.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────┐
//! │ Upload (CLI/ │──▶│  Extractors  │──▶│  SQLite  │
//! │  HTTP batch) │   │ PDF/DOCX/OCR │   │  store   │
//! └──────────────┘   │ audio/video  │   └────┬─────┘
//!                    │ spreadsheets │        │
//!                    └──────────────┘        ▼
//!                                     ┌─────────────┐   ┌─────────┐
//!                                     │   Context   │──▶│   LLM   │
//!                                     │  assembler  │   │ answer  │
//!                                     └─────────────┘   └─────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! docqa init
//! docqa upload ./report.pdf ./meeting.mp3 ./budget.xlsx
//! docqa ask "What did the meeting decide about the budget?"
//! docqa serve
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`schema`] | Table creation |
//! | [`models`] | Stored record types |
//! | [`store`] | Insert, list, get, delete |
//! | [`traits`] | OCR, transcoder, speech, and LLM seams |
//! | [`extract`] | Per-format text extraction |
//! | [`speech`] | Speech-to-text clients |
//! | [`ingest`] | Batch upload pipeline |
//! | [`context`] | Context block assembly |
//! | [`llm`] | LLM completion clients |
//! | [`answer`] | Prompt and question answering |
//! | [`view`] | Read-side CLI commands |
//! | [`server`] | JSON HTTP API |

pub mod answer;
pub mod config;
pub mod context;
pub mod db;
pub mod extract;
pub mod ingest;
pub mod llm;
pub mod models;
pub mod schema;
pub mod server;
pub mod speech;
pub mod store;
pub mod traits;
pub mod view;

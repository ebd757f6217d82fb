//! Core, DOM-free controller logic for the Web UI.
//!
//! # Design
//! - Every DOM, network and timer touch point is a trait so the controllers run natively in tests.
//! - Components receive their element handles at construction; nothing here queries a document.
//! - Server responses are the only source of selection and job state.

pub mod clock;
pub mod config;
pub mod error;
pub mod files;
pub mod flash;
pub mod grid;
pub mod jobs;
pub mod selection;
pub mod theme;

#![doc = "docbench-core: project ingestion, analysis and multi-provider README generation."]

//! This crate holds all logic for docbench: it turns a project (uploaded files, a ZIP
//! archive or a GitHub repository) into a bounded set of source files, derives structural
//! metadata, asks every configured LLM provider for a README and ranks the answers.
//!
//! # Usage
//! Build a [`config::RunConfig`], a [`catalog::Credentials`] table and the two collaborators
//! ([`providers::OpenAiCompatibleClient`], [`github::GithubClient`]), then call
//! [`pipeline::generate_documentation_comparison`].

pub mod analyze;
pub mod catalog;
pub mod config;
pub mod contract;
pub mod error;
pub mod fanout;
pub mod github;
pub mod ingest;
pub mod language;
pub mod pipeline;
pub mod prompt;
pub mod providers;
pub mod rank;

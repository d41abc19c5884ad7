//! Markdown proofreading with a local LLM.
//!
//! A document is split into sections and paragraphs ([`document`]), each
//! paragraph is rewritten by a generation model ([`generate`]) using prompts
//! from [`prompt`], optionally with domain vocabulary picked by the
//! terminology retriever ([`terms`], built on [`embed`]). [`pipeline`] ties
//! it together and writes the revised document plus an audit trail.

pub mod config;
pub mod document;
pub mod embed;
pub mod generate;
pub mod pipeline;
pub mod prompt;
pub mod terms;

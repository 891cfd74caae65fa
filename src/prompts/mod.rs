//! Prompt templates for the LLM classification stages.

pub mod relevance;
pub mod stance;

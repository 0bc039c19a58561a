//! # article_crew
//!
//! A small crew of role-specialised agents that writes an article about a
//! topic: a researcher gathers facts (with an encyclopedia lookup tool), a
//! writer drafts the article, and an optional editor polishes it.
//!
//! ## Architecture
//!
//! ```text
//!   topic ──► ArticlePipeline ──► Crew ──► Task (research) ──► Task (write) ──► Task (edit)
//!                                            │                   │                │
//!                                            ▼                   ▼                ▼
//!                                          Agent ──► LlmClient (groq | gemini)
//!                                            │
//!                                            └──► KnowledgeLookup tool
//! ```
//!
//! ## Modules
//! - `llm`: completion clients and the provider registry
//! - `tools`: the lookup tool and the tool trait
//! - `agents`: persona + client + tools, and the completion loop
//! - `task`: task state machine and dependency graph
//! - `crew`: sequential execution in dependency order
//! - `article`: crew assembly and result parsing
//! - `api`: HTTP surface

pub mod agents;
pub mod api;
pub mod article;
pub mod config;
pub mod crew;
pub mod llm;
pub mod task;
pub mod tools;

pub use article::{Article, ArticleError, ArticlePipeline};
pub use config::Config;
pub use crew::{Crew, CrewError, CrewOutput};

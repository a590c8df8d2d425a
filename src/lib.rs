//! Brief Assistant - bilingual project-intake chat
//!
//! Guides a visitor from a first message to a structured creative-services
//! brief. Every turn is classified, folded into session memory and answered
//! by an LLM steered with the current conversation phase. Ranked reply
//! suggestions and proactive hints keep the conversation moving.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

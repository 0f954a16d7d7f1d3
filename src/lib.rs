//! Auto-reply pipeline for a host chat system.
//!
//! When an inbound message event arrives and the user's auto-reply setting is
//! enabled, the pipeline asks an OpenAI-compatible completion endpoint for a
//! reply conditioned on a short rolling per-conversation history, then hands
//! the result (or a canned "away" fallback) to the host's send API.
//!
//! The host application itself — event delivery, settings storage, the actual
//! message transport — stays behind the interfaces in [`host`].

pub mod config;
pub mod generator;
pub mod history;
pub mod host;
pub mod llm_client;
pub mod persona;
pub mod policy;

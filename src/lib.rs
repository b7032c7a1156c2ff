//! Call-signaling relay and session-negotiation client.
//!
//! Two parties (a user and a specialist) find each other through a small
//! relay server and then negotiate a direct audio/video session.
//!
//! It provides:
//! - `relay_server`: a binary that registers participant identities and
//!   routes offers, answers, candidates and termination notices between them.
//! - a client library: [`signaling_client::SignalingClient`] for the relay
//!   link and [`call_manager::CallManager`] for the negotiation state machine.

/// Client-side negotiation state machine and the collaborator traits it drives.
pub mod call_manager;
/// Handles configuration loading and management.
pub mod config;
/// Logging utilities for the application.
pub mod log;
/// Relay server: wire protocol, registration table and routing.
pub mod signaling;
/// Signaling client for communicating with the relay.
pub mod signaling_client;
/// TLS (Transport Layer Security) utility functions.
pub mod tls_utils;

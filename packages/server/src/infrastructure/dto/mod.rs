//! Data Transfer Objects (DTOs) for the HTTP diagnostics API.
//!
//! WebSocket frames are domain messages (`domain::InboundMessage`,
//! `domain::OutboundMessage`) and need no separate DTO.

pub mod conversion;
pub mod http;

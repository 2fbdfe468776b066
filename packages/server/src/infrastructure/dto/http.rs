//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

/// Entry of `GET /api/rooms`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummaryDto {
    pub id: String,
    pub member_count: usize,
    /// RFC 3339 (UTC)
    pub created_at: String,
}

/// Body of `GET /api/rooms/{room_id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomDetailDto {
    pub id: String,
    pub created_at: String,
    pub members: Vec<MemberDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDto {
    pub name: String,
    pub language: String,
    pub connected_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthDto {
    pub status: String,
}

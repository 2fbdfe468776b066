//! Conversion from domain models to HTTP DTOs.

use shabe_shared::time::timestamp_to_rfc3339;

use crate::domain::{MemberSnapshot, RoomSummary};
use crate::infrastructure::dto::http::{MemberDto, RoomDetailDto, RoomSummaryDto};
use crate::usecase::RoomDetail;

impl From<RoomSummary> for RoomSummaryDto {
    fn from(model: RoomSummary) -> Self {
        Self {
            id: model.id.as_str().to_string(),
            member_count: model.member_count,
            created_at: timestamp_to_rfc3339(model.created_at.value()),
        }
    }
}

impl From<MemberSnapshot> for MemberDto {
    fn from(model: MemberSnapshot) -> Self {
        Self {
            name: model.display_name,
            language: model.language.as_str().to_string(),
            connected_at: timestamp_to_rfc3339(model.connected_at.value()),
        }
    }
}

impl From<RoomDetail> for RoomDetailDto {
    fn from(model: RoomDetail) -> Self {
        Self {
            id: model.id.as_str().to_string(),
            created_at: timestamp_to_rfc3339(model.created_at.value()),
            members: model.members.into_iter().map(MemberDto::from).collect(),
        }
    }
}

//! Shared application state handed to every handler.

use std::sync::Arc;

use crate::usecase::{GetRoomDetailUseCase, GetRoomsUseCase, SessionUseCases};

pub struct AppState {
    /// Use cases driving each WebSocket connection
    pub session_usecases: SessionUseCases,
    /// GetRoomsUseCase（ルーム一覧取得のユースケース）
    pub get_rooms_usecase: Arc<GetRoomsUseCase>,
    /// GetRoomDetailUseCase（ルーム詳細取得のユースケース）
    pub get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
}

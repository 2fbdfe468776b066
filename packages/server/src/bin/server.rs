//! Shabe chat server.
//!
//! Participants join a room over a WebSocket and each chat line is delivered
//! to the other members translated into their own language.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin shabe-server
//! cargo run --bin shabe-server -- --auth static --static-token dev=Alice --translator dictionary
//! ```

use std::sync::Arc;

use clap::Parser;
use shabe_server::{
    config::{ServerArgs, ServerConfig},
    domain::RoomRegistry,
    ui::Server,
    usecase::{
        ConnectParticipantUseCase, DisconnectParticipantUseCase, GetRoomDetailUseCase,
        GetRoomsUseCase, SendMessageUseCase, SessionUseCases, UpdatePreferencesUseCase,
    },
};
use shabe_shared::{logger::setup_logger, time::SystemClock};

#[tokio::main]
async fn main() {
    let args = ServerArgs::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    let config = match ServerConfig::try_from(args) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize dependencies in order:
    // 1. Collaborators (translator, authenticator)
    // 2. Room registry
    // 3. UseCases
    // 4. Server

    // 1. Create collaborators
    let (translator, authenticator) =
        match (config.build_translator(), config.build_authenticator()) {
            (Ok(translator), Ok(authenticator)) => (translator, authenticator),
            (Err(e), _) | (_, Err(e)) => {
                tracing::error!("Failed to initialize: {}", e);
                std::process::exit(1);
            }
        };
    tracing::info!("Translator: {}", config.translator_name());

    // 2. Create the room registry (in-memory)
    let clock = Arc::new(SystemClock);
    let registry = RoomRegistry::with_clock(clock.clone());

    // 3. Create UseCases
    let session_usecases = SessionUseCases {
        connect: Arc::new(ConnectParticipantUseCase::new(
            authenticator,
            registry.clone(),
            clock,
        )),
        disconnect: Arc::new(DisconnectParticipantUseCase::new()),
        send_message: Arc::new(SendMessageUseCase::new(translator)),
        update_preferences: Arc::new(UpdatePreferencesUseCase::new()),
    };
    let get_rooms_usecase = Arc::new(GetRoomsUseCase::new(registry.clone()));
    let get_room_detail_usecase = Arc::new(GetRoomDetailUseCase::new(registry));

    // 4. Create and run the server
    let server = Server::new(session_usecases, get_rooms_usecase, get_room_detail_usecase);
    if let Err(e) = server.run(config.host, config.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

pub mod auth_user;
pub mod lobby_controller;
pub mod lobby_hub;
pub mod websocket;

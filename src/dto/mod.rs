pub mod action_dto;
pub mod claims_dto;
pub mod draft_dto;
pub mod player_dto;
pub mod render_dto;
pub mod user_dto;

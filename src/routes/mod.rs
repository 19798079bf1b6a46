pub mod draft;
pub mod lobby;
pub mod users;

pub mod login;
pub mod refresh;
pub mod token_response;
pub mod verify;

pub mod difficulty;
pub mod question;

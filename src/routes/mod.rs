pub mod docs;
pub mod health;
pub mod quiz;
pub mod study;

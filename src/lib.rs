pub mod bot;
pub mod caption;
pub mod config;
pub mod openai;

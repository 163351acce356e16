pub mod account;
pub mod admin;
pub mod lessons;
pub mod modules;

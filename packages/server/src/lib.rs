pub mod attachments;
pub mod config;
pub mod entity;
pub mod error;
pub mod following;
pub mod identity;
pub mod models;
pub mod repo;
pub mod services;
pub mod state;
pub mod visibility;

pub mod config;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod services;
pub mod startup;

//! Citizen registry service
//! Registration, login, stateless token sessions and role-gated CRUD over
//! the user directory

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;
pub mod telemetry;

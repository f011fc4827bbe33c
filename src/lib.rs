//! Sayara Backend Library
//!
//! Core modules for the Sayara car-marketplace backend: accounts and
//! sign-in, the listing lifecycle with paid publication, coupons, offers
//! and inspections, and the admin panel.

pub mod admin;
pub mod auth;
pub mod config;
pub mod coupons;
pub mod db;
pub mod error;
pub mod handlers;
pub mod listings;
pub mod middleware;
pub mod models;
pub mod offers;
pub mod payments;
pub mod routes;
pub mod settings;
pub mod state;

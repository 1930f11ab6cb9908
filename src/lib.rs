//! Backend for the SAGE admin console.
//!
//! Serves the browser shell and its JSON fixtures, answers the login form,
//! and turns configured OpenAPI documents into the endpoint browser shown on
//! the API documentation pages.

pub mod auth;
pub mod config;
pub mod docs;
pub mod openapi;
pub mod ui;
pub mod web;

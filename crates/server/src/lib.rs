//! HTTP surface of the predictive maintenance service

pub mod api;
pub mod config;

#![doc = "The `taskhub` library crate."]
#![doc = ""]
#![doc = "This crate contains all the core business logic, domain models, authentication"]
#![doc = "mechanisms (including refresh-token persistence and rotation), routing"]
#![doc = "configuration, and error handling for the TaskHub application."]
#![doc = "It is used by the main binary (`main.rs`) to construct and run the application."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;

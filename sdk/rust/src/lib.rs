//! Client for the todo REST service.

pub mod client;

pub use client::{ClientError, Todo, TodoClient};

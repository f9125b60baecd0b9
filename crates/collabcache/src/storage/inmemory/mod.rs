//! In-memory authoritative repository.
//!
//! A single [`InMemoryRepository`] implements all fourteen repository
//! traits. It is the authoritative side in tests and local development and
//! counts every call it serves.

mod access;
mod content;
mod people;
mod repository;

pub use repository::InMemoryRepository;

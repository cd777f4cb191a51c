pub mod allocator;
pub mod api;
pub mod clock;
pub mod config;
pub mod domain;
pub mod error;
pub mod payments;
pub mod policy;
pub mod repository;
pub mod service;

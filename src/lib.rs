//! # Campus Stream
//!
//! The real-time delivery core of a multi-tenant corporate learning
//! platform:
//! - A chat message stream over bounded-lifetime SSE connections with
//!   cursor-based resumption
//! - A TTL-expiring presence directory
//! - A capped unread-count query
//!
//! Course, quiz, and certificate CRUD live elsewhere; this service reads
//! their data only through narrow repository traits.
//!
//! ## Module Structure
//!
//! ```text
//! campus_stream/
//! +-- config/         Configuration management
//! +-- domain/         Entities and repository traits
//! +-- application/    Services and DTOs
//! +-- infrastructure/ Database, cache, and metrics implementations
//! +-- presentation/   HTTP routes, handlers, and middleware
//! +-- shared/         Common utilities (errors, snowflake IDs)
//! ```

// Configuration module
pub mod config;

// Domain layer - Core types and traits
pub mod domain;

// Application layer - Business services
pub mod application;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Presentation layer - HTTP surface
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;

//! Use-case services around the live view.
//!
//! # Responsibility
//! - Orchestrate repository calls into submission use-cases.
//! - Hold session and curriculum-filter state for the page.

pub mod attendance_service;
pub mod curriculum;
pub mod session;

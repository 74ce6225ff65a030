//! HMS Front Desk Test Suite
//!
//! End-to-end tests across the desks and coordinators:
//! - Registration and patient resolution
//! - Doctor directory loading
//! - Prescription and lab history aggregation
//! - Partial failures, timeouts and busy desks through a fault-injecting store
//! - The reception → doctor → lab → portal walkthrough

pub mod fault;

pub mod patient;
pub mod provider;
pub mod records;

//! FiadoPay: a simulated payment-processing backend.
//!
//! Accepts a payment request, runs it through pluggable method and anti-fraud
//! rules, persists it `Pending`, settles it asynchronously and notifies
//! merchants through signed webhook callbacks. Persistence lives behind
//! async-trait ports; in-memory reference stores ship under
//! `infrastructure`.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod rules;
pub mod webhook;

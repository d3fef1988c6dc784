//! Submission pipeline for the Prêmio CNA Brasil Artesanal contest.
//!
//! The crate owns everything between an incoming submission form and the
//! confirmation the applicant receives: tracking-code allocation, entry
//! persistence behind the [`contest::store::EntryStore`] seam, deterministic
//! certificate rendering, and notification dispatch. The HTTP binary in
//! `services/api` wires these pieces to concrete infrastructure.

pub mod config;
pub mod contest;
pub mod error;
pub mod telemetry;

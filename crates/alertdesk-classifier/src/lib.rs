// SPDX-FileCopyrightText: 2026 Alertdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Incident classification for alertdesk.
//!
//! Two strategies live side by side:
//! - [`rules`]: operator-managed regex rules. The highest-ranked firing rule
//!   wins and no match yields `None`.
//! - [`heuristic`]: fixed Japanese keyword lists. No match yields `Low`.
//!
//! [`IncidentClassifier`] runs the rule strategy against rules loaded from storage.

pub mod heuristic;
pub mod incident;
pub mod rules;

pub use incident::{IncidentClassifier, Override, apply_manual_override};
pub use rules::{classify_level, determine_incident_type};

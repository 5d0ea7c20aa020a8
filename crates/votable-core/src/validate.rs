//! Candidate mark validation
//!
//! `VoteValidator` carries the voting policy for one host type (today: an
//! optional value range). Build one per host type at startup and hand it to
//! each aggregate; there is no process-global configuration to mutate.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::range::VoteRange;

/// Candidate fields for a new mark, before acceptance.
#[derive(Debug, Clone, Default)]
pub struct MarkDraft {
    /// Proposed vote value
    pub value: Option<f64>,
    /// Acting voter id
    pub voted_by_id: Option<String>,
    /// Acting voter entity kind
    pub voter_type: Option<String>,
}

/// Field of a draft that a violation points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkField {
    Value,
    VotedById,
    VoterType,
}

impl std::fmt::Display for MarkField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MarkField::Value => "value",
            MarkField::VotedById => "voted_by_id",
            MarkField::VoterType => "voter_type",
        };
        write!(f, "{name}")
    }
}

/// Why a field was rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Required field absent or blank
    Missing,
    /// Value present but outside the configured range
    OutOfRange { min: f64, max: f64 },
}

/// A single field-level rejection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldViolation {
    /// Which field
    pub field: MarkField,
    /// What went wrong
    pub kind: ViolationKind,
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            ViolationKind::Missing => write!(f, "{} is required", self.field),
            ViolationKind::OutOfRange { min, max } => {
                write!(f, "{} must lie in [{min}, {max}]", self.field)
            }
        }
    }
}

fn fmt_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Rejection of a candidate mark, carrying every field violation found.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}", fmt_violations(.violations))]
pub struct MarkRejection {
    /// Every violation found, in field order
    pub violations: Vec<FieldViolation>,
}

impl MarkRejection {
    /// The violations recorded against one field.
    pub fn violations_on(&self, field: MarkField) -> Vec<&FieldViolation> {
        self.violations
            .iter()
            .filter(|v| v.field == field)
            .collect()
    }
}

/// Voting policy for one host type.
#[derive(Debug, Clone, Default)]
pub struct VoteValidator {
    range: Option<VoteRange>,
}

impl VoteValidator {
    /// Policy without a value range: any numeric value passes.
    pub fn unconstrained() -> Self {
        Self::default()
    }

    /// Policy with an inclusive value range.
    pub fn with_range(range: impl Into<VoteRange>) -> Self {
        VoteValidator {
            range: Some(range.into()),
        }
    }

    /// Install or replace the value range.
    pub fn set_range(&mut self, range: impl Into<VoteRange>) {
        self.range = Some(range.into());
    }

    /// Remove the value range.
    pub fn reset_range(&mut self) {
        self.range = None;
    }

    /// The configured range, if any.
    pub fn range(&self) -> Option<VoteRange> {
        self.range
    }

    /// Check a candidate mark, collecting every violation before reporting.
    pub fn validate(&self, draft: &MarkDraft) -> std::result::Result<(), MarkRejection> {
        let mut violations = Vec::new();

        match draft.value {
            None => violations.push(FieldViolation {
                field: MarkField::Value,
                kind: ViolationKind::Missing,
            }),
            Some(value) => {
                if let Some(range) = self.range {
                    if !range.contains(value) {
                        violations.push(FieldViolation {
                            field: MarkField::Value,
                            kind: ViolationKind::OutOfRange {
                                min: range.min(),
                                max: range.max(),
                            },
                        });
                    }
                }
            }
        }

        if is_blank(&draft.voted_by_id) {
            violations.push(FieldViolation {
                field: MarkField::VotedById,
                kind: ViolationKind::Missing,
            });
        }
        if is_blank(&draft.voter_type) {
            violations.push(FieldViolation {
                field: MarkField::VoterType,
                kind: ViolationKind::Missing,
            });
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(MarkRejection { violations })
        }
    }
}

fn is_blank(field: &Option<String>) -> bool {
    match field {
        None => true,
        Some(s) => s.trim().is_empty(),
    }
}

// 🏷️ Verification Rules - the five gateway predicates
// Lists, clock and grammar are injected, so every predicate is a pure function of its inputs.

use crate::error::VerificationResult;
use crate::lists::{ListKind, ListProvider};
use crate::qxban::QxbanFormat;
use crate::temporal::{parse_timestamp, Clock, DateEvaluator};
use chrono::{DateTime, Utc};
use serde::Serialize;

// ============================================================================
// PRIORITY OUTCOME
// ============================================================================

/// Either the requested priority is honoured, or the configured fallback applies.
/// A fallback is not a rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PriorityOutcome {
    Authorized,
    Default(String),
}

impl PriorityOutcome {
    pub fn is_authorized(&self) -> bool {
        matches!(self, PriorityOutcome::Authorized)
    }

    /// Priority the missive will actually be handled with
    pub fn effective<'a>(&'a self, requested: &'a str) -> &'a str {
        match self {
            PriorityOutcome::Authorized => requested,
            PriorityOutcome::Default(default) => default,
        }
    }
}

// ============================================================================
// RULE ENGINE
// ============================================================================

pub struct RuleEngine<L, C> {
    lists: L,
    clock: C,
    dates: DateEvaluator,
    qxban: QxbanFormat,
}

impl<L: ListProvider, C: Clock> RuleEngine<L, C> {
    /// Engine with the default 3s date tolerance and default QXBAN grammar
    pub fn new(lists: L, clock: C) -> Self {
        RuleEngine {
            lists,
            clock,
            dates: DateEvaluator::default(),
            qxban: QxbanFormat::default(),
        }
    }

    /// Builder: replace the date policy
    pub fn with_date_evaluator(mut self, dates: DateEvaluator) -> Self {
        self.dates = dates;
        self
    }

    /// Builder: replace the QXBAN grammar
    pub fn with_qxban_format(mut self, qxban: QxbanFormat) -> Self {
        self.qxban = qxban;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Receiver BIC and receiver QXBAN are both on their allow-lists
    pub fn verify_receiver(&self, bic: &str, qxban: &str) -> VerificationResult<bool> {
        let authorized = self.lists.load(ListKind::ReceiverBic)?.contains(bic)
            && self.lists.load(ListKind::ReceiverAccount)?.contains(qxban);

        tracing::debug!(bic, qxban, authorized, "verify_receiver");
        Ok(authorized)
    }

    /// Sender BIC allowed, QXBAN well-formed for that BIC, QXBAN not blacklisted
    pub fn verify_sender(&self, bic: &str, qxban: &str) -> VerificationResult<bool> {
        let authorized = self.lists.load(ListKind::SenderBic)?.contains(bic)
            && self.qxban.is_valid(qxban, bic)
            && !self.lists.load(ListKind::SenderBlacklist)?.contains(qxban);

        tracing::debug!(bic, qxban, authorized, "verify_sender");
        Ok(authorized)
    }

    /// Send date is in effect, or ahead of now by less than the tolerance
    pub fn verify_date_correct(&self, date: &str) -> VerificationResult<bool> {
        let input = parse_timestamp(date)?;
        let correct = self.dates.is_within_window(input, self.clock.now());

        tracing::debug!(date, correct, "verify_date_correct");
        Ok(correct)
    }

    /// Send date is strictly before now
    pub fn verify_date_passed(&self, date: &str) -> VerificationResult<bool> {
        let input = parse_timestamp(date)?;
        let passed = self.dates.has_passed(input, self.clock.now());

        tracing::debug!(date, passed, "verify_date_passed");
        Ok(passed)
    }

    /// Listed priority → Authorized, otherwise the configured default
    pub fn verify_priority(&self, priority: &str) -> VerificationResult<PriorityOutcome> {
        let priorities = self.lists.load_priority()?;

        let outcome = if priorities.contains(priority) {
            PriorityOutcome::Authorized
        } else {
            PriorityOutcome::Default(priorities.default)
        };

        tracing::debug!(priority, outcome = ?outcome, "verify_priority");
        Ok(outcome)
    }
}

// ============================================================================
// TESTS
// ============================================================================

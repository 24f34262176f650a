// 📨 Missive Acknowledgement
// Runs the gateway checks over a nominal missive, in order, and decides ACK / NACK.
//
// Order matters: receiver → sender → send date are blocking (first failure
// gives the NACK code); "date not yet passed" and "priority downgraded" only
// attach routing warnings to an ACK.

use crate::error::VerificationResult;
use crate::lists::ListProvider;
use crate::rules::{PriorityOutcome, RuleEngine};
use crate::temporal::{parse_timestamp, Clock};
use anyhow::{Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

// ============================================================================
// MISSIVE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Party {
    pub bic: String,
    pub iban: String,
}

/// Envelope fields of a SEPAmail missive (MsvId, MsvTyp, Rcv, Snd, SndDtTm, MsvPri)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Missive {
    pub id: String,

    #[serde(rename = "type")]
    pub missive_type: String,

    pub receiver: Party,

    pub sender: Party,

    /// Send date time, as written by the sender
    pub send_date: String,

    pub priority: String,
}

impl Missive {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read missive: {:?}", path.as_ref()))?;

        serde_json::from_str(&content).context("Failed to parse missive JSON")
    }

    /// Only nominal missives get acknowledged
    pub fn is_nominal(&self) -> bool {
        self.missive_type == "Nominal"
    }

    /// Missive envelope fields are read with surrounding whitespace stripped
    fn trimmed(&self) -> Missive {
        Missive {
            id: self.id.trim().to_string(),
            missive_type: self.missive_type.trim().to_string(),
            receiver: Party {
                bic: self.receiver.bic.trim().to_string(),
                iban: self.receiver.iban.trim().to_string(),
            },
            sender: Party {
                bic: self.sender.bic.trim().to_string(),
                iban: self.sender.iban.trim().to_string(),
            },
            send_date: self.send_date.trim().to_string(),
            priority: self.priority.trim().to_string(),
        }
    }
}

// ============================================================================
// ACKNOWLEDGEMENT
// ============================================================================

/// Acquittal code: class / sub-class / detail (AcqCla / AcqSub / AcqDet)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReturnCode {
    pub class: u8,
    pub sub: u8,
    pub detail: u8,
}

impl ReturnCode {
    pub const ACCEPTED: ReturnCode = ReturnCode::new(2, 1, 9);
    pub const RECEIVER_REJECTED: ReturnCode = ReturnCode::new(4, 2, 4);
    pub const SENDER_REJECTED: ReturnCode = ReturnCode::new(4, 2, 5);
    pub const DATE_REJECTED: ReturnCode = ReturnCode::new(4, 3, 3);

    pub const fn new(class: u8, sub: u8, detail: u8) -> Self {
        ReturnCode { class, sub, detail }
    }
}

impl fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.class, self.sub, self.detail)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AckStatus {
    Ack,
    Nack,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutingWarning {
    pub code: String,
    pub description: String,
}

impl RoutingWarning {
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        RoutingWarning {
            code: code.into(),
            description: description.into(),
        }
    }

    /// Send date is ahead of the receiving server's clock
    pub fn bad_time(missive_id: &str, ahead_ms: i64) -> Self {
        RoutingWarning::new(
            "BAD_TIME",
            format!(
                "timestamp SndDtTm (missive id {}) is greater than the datetime of receipt server ; \
                 the difference is {} milliseconds",
                missive_id, ahead_ms
            ),
        )
    }

    /// Missive downgraded to `priority`; None for a priority without a warning code
    pub fn priority(priority: &str) -> Option<Self> {
        let code = match priority {
            "HIGHEST" => "PRI_HIGHEST",
            "HIGH" => "PRI_HIGH",
            "NORMAL" => "PRI_NORM",
            "LOW" => "PRI_LOW",
            "LOWEST" => "PRI_LOWEST",
            _ => return None,
        };

        Some(RoutingWarning::new(
            code,
            format!("missive will be handled with \"{}\" priority only", priority),
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Acknowledgement {
    pub missive_id: String,
    pub status: AckStatus,
    pub return_code: ReturnCode,
    pub warnings: Vec<RoutingWarning>,
}

impl Acknowledgement {
    fn nack(missive_id: &str, return_code: ReturnCode) -> Self {
        Acknowledgement {
            missive_id: missive_id.to_string(),
            status: AckStatus::Nack,
            return_code,
            warnings: Vec::new(),
        }
    }

    pub fn is_ack(&self) -> bool {
        self.status == AckStatus::Ack
    }
}

// ============================================================================
// MISSIVE VERIFIER
// ============================================================================

pub struct MissiveVerifier<'a, L, C> {
    engine: &'a RuleEngine<L, C>,
}

impl<'a, L: ListProvider, C: Clock> MissiveVerifier<'a, L, C> {
    pub fn new(engine: &'a RuleEngine<L, C>) -> Self {
        MissiveVerifier { engine }
    }

    pub fn verify(&self, missive: &Missive) -> VerificationResult<Acknowledgement> {
        let missive = missive.trimmed();
        let id = missive.id.as_str();

        if !self
            .engine
            .verify_receiver(&missive.receiver.bic, &missive.receiver.iban)?
        {
            tracing::info!(missive = id, "Verifying receiver [KO]");
            return Ok(Acknowledgement::nack(id, ReturnCode::RECEIVER_REJECTED));
        }
        tracing::info!(missive = id, "Verifying receiver [OK]");

        if !self
            .engine
            .verify_sender(&missive.sender.bic, &missive.sender.iban)?
        {
            tracing::info!(missive = id, "Verifying sender [KO]");
            return Ok(Acknowledgement::nack(id, ReturnCode::SENDER_REJECTED));
        }
        tracing::info!(missive = id, "Verifying sender [OK]");

        if !self.engine.verify_date_correct(&missive.send_date)? {
            tracing::info!(missive = id, "Verifying correct date [KO]");
            return Ok(Acknowledgement::nack(id, ReturnCode::DATE_REJECTED));
        }
        tracing::info!(missive = id, "Verifying correct date [OK]");

        let mut warnings = Vec::new();

        if !self.engine.verify_date_passed(&missive.send_date)? {
            let sent = parse_timestamp(&missive.send_date)?;
            let ahead_ms = (sent - self.engine.now()).num_milliseconds();

            tracing::info!(missive = id, ahead_ms, "Verifying passed date [KO]");
            warnings.push(RoutingWarning::bad_time(id, ahead_ms));
        }

        match self.engine.verify_priority(&missive.priority)? {
            PriorityOutcome::Authorized => {
                tracing::info!(missive = id, "Verifying priority [OK]");
            }
            PriorityOutcome::Default(fallback) => {
                tracing::info!(missive = id, fallback = %fallback, "Verifying priority [KO]");
                warnings.extend(RoutingWarning::priority(&fallback));
            }
        }

        Ok(Acknowledgement {
            missive_id: id.to_string(),
            status: AckStatus::Ack,
            return_code: ReturnCode::ACCEPTED,
            warnings,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================

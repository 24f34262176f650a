// 🚦 Request Dispatcher
// action + flat parameter map → one RuleEngine call → one flat JSON value.

use crate::lists::ListProvider;
use crate::rules::{PriorityOutcome, RuleEngine};
use crate::temporal::Clock;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Message returned for an unknown or absent action
pub const GENERIC_ERROR: &str = "An error has occurred";

// ============================================================================
// ACTION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    VerifyReceiver,
    VerifySender,
    VerifyDateCorrect,
    VerifyDatePassed,
    VerifyPriority,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::VerifyReceiver => "verify_receiver",
            Action::VerifySender => "verify_sender",
            Action::VerifyDateCorrect => "verify_date_correct",
            Action::VerifyDatePassed => "verify_date_passed",
            Action::VerifyPriority => "verify_priority",
        }
    }

    /// Required parameters, as (query key, label used in the error message), in check order
    pub fn parameters(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Action::VerifyReceiver => &[("receiverBIC", "receiver BIC"), ("receiverIBAN", "receiver IBAN")],
            Action::VerifySender => &[("senderBIC", "sender BIC"), ("senderIBAN", "sender IBAN")],
            Action::VerifyDateCorrect | Action::VerifyDatePassed => &[("date", "date")],
            Action::VerifyPriority => &[("priority", "priority")],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAction(pub String);

impl fmt::Display for UnknownAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown action '{}'", self.0)
    }
}

impl std::error::Error for UnknownAction {}

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "verify_receiver" => Ok(Action::VerifyReceiver),
            "verify_sender" => Ok(Action::VerifySender),
            "verify_date_correct" => Ok(Action::VerifyDateCorrect),
            "verify_date_passed" => Ok(Action::VerifyDatePassed),
            "verify_priority" => Ok(Action::VerifyPriority),
            other => Err(UnknownAction(other.to_string())),
        }
    }
}

// ============================================================================
// RESPONSE
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Boolean verdict of a check
    Verdict(bool),
    /// Outcome of the priority check
    Priority(PriorityOutcome),
    /// A required parameter is absent (label, e.g. "receiver IBAN")
    MissingArgument(&'static str),
    /// Action absent or not recognised
    UnknownAction,
    /// The engine could not evaluate (configuration or date format)
    Failed(String),
}

impl Response {
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Response::MissingArgument(_) | Response::UnknownAction | Response::Failed(_)
        )
    }

    /// Caller's fault (bad request) as opposed to the gateway's
    pub fn is_client_error(&self) -> bool {
        matches!(self, Response::MissingArgument(_) | Response::UnknownAction)
    }

    /// Flat wire value: a boolean, the default priority, or a message
    pub fn to_json(&self) -> Value {
        match self {
            Response::Verdict(verdict) => Value::Bool(*verdict),
            Response::Priority(PriorityOutcome::Authorized) => Value::Bool(true),
            Response::Priority(PriorityOutcome::Default(default)) => Value::String(default.clone()),
            Response::MissingArgument(label) => Value::String(format!("Missing argument {}", label)),
            Response::UnknownAction => Value::String(GENERIC_ERROR.to_string()),
            Response::Failed(message) => Value::String(format!("Error: {}", message)),
        }
    }
}

// ============================================================================
// DISPATCH
// ============================================================================

/// Route a request; `params` includes the `action` key
pub fn dispatch<L, C>(engine: &RuleEngine<L, C>, params: &HashMap<String, String>) -> Response
where
    L: ListProvider,
    C: Clock,
{
    let action = match params.get("action").map(|name| name.parse::<Action>()) {
        Some(Ok(action)) => action,
        Some(Err(err)) => {
            tracing::warn!(%err, "Rejected request");
            return Response::UnknownAction;
        }
        None => {
            tracing::warn!("Request without action");
            return Response::UnknownAction;
        }
    };

    let missing = action
        .parameters()
        .iter()
        .find(|(key, _)| !params.contains_key(*key));
    if let Some(&(_, label)) = missing {
        return Response::MissingArgument(label);
    }

    let arg = |key: &str| params.get(key).map(String::as_str).unwrap_or_default();

    let result = match action {
        Action::VerifyReceiver => engine
            .verify_receiver(arg("receiverBIC"), arg("receiverIBAN"))
            .map(Response::Verdict),
        Action::VerifySender => engine
            .verify_sender(arg("senderBIC"), arg("senderIBAN"))
            .map(Response::Verdict),
        Action::VerifyDateCorrect => engine.verify_date_correct(arg("date")).map(Response::Verdict),
        Action::VerifyDatePassed => engine.verify_date_passed(arg("date")).map(Response::Verdict),
        Action::VerifyPriority => engine.verify_priority(arg("priority")).map(Response::Priority),
    };

    result.unwrap_or_else(|err| {
        tracing::warn!(action = action.name(), error = %err, "Verification failed");
        Response::Failed(err.to_string())
    })
}

// ============================================================================
// TESTS
// ============================================================================

// SMACK Verification Gateway - Core Library
// Exposes all modules for use in the CLI, the HTTP server, and tests

pub mod error;
pub mod config;
pub mod lists;      // Reference lists (allow / deny)
pub mod qxban;      // QXBAN positional grammar
pub mod temporal;   // Clock + send-date windows
pub mod rules;      // The five verification predicates
pub mod dispatcher; // action → predicate → flat JSON value
pub mod missive;    // ACK / NACK of a nominal missive

// Re-export commonly used types
pub use error::{VerificationError, VerificationResult};
pub use config::{GatewayConfig, ListPaths};
pub use lists::{
    FileListProvider, InMemoryListProvider, ListKind, ListProvider,
    PriorityList, ReferenceList,
};
pub use qxban::{QxbanFormat, QXBAN_LENGTH};
pub use temporal::{
    parse_timestamp, Clock, DateEvaluator, FixedClock, SystemClock, WindowBoundary,
};
pub use rules::{PriorityOutcome, RuleEngine};
pub use dispatcher::{dispatch, Action, Response, GENERIC_ERROR};
pub use missive::{
    AckStatus, Acknowledgement, Missive, MissiveVerifier, Party, ReturnCode, RoutingWarning,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

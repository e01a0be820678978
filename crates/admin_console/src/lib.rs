//! StreamGoal — Admin Console
//!
//! Login gate plus CRUD over the catalog tables. Forms come in as raw
//! strings, get parsed into write payloads, and every write answers with a
//! notification and the freshly re-read list.

pub mod auth;
pub mod console;
pub mod error;
pub mod forms;

pub use auth::{AdminAuth, Credentials, DEFAULT_ADMIN_EMAIL, DEFAULT_ADMIN_PASSWORD};
pub use console::{AdminConsole, FormOptions, Notification, Outcome, Variant};
pub use error::{AdminError, FormError};
pub use forms::{parse_kickoff, AdForm, CompetitionForm, LiveTvForm, MatchForm, TeamForm, DEFAULT_AD_DELAY_SECS};

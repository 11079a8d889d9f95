//! Outcome of a single routing decision.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status code summarising the most recent `resolve()` call.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(into = "u8", try_from = "u8")]
pub enum Status {
    /// Request opened, routing has not run yet.
    #[default]
    SessionStarted,
    /// Not logged in, routed to the gateway.
    AuthRequired,
    /// Credentials were rejected.
    AuthFailed,
    /// Credentials were accepted on this request.
    Authenticated,
    /// The requested resource is served.
    Permitted,
    /// The allow hook refused the route.
    Denied,
    /// Unknown route id.
    NotFound,
    /// Logged out on request.
    Closed,
    /// Logged out after inactivity.
    Expired,
    /// The load hook replaced the computed route.
    Deviated,
}

impl Status {
    /// All statuses in code order.
    pub const ALL: [Status; 10] = [
        Status::SessionStarted,
        Status::AuthRequired,
        Status::AuthFailed,
        Status::Authenticated,
        Status::Permitted,
        Status::Denied,
        Status::NotFound,
        Status::Closed,
        Status::Expired,
        Status::Deviated,
    ];

    /// Numeric code, 0 through 9.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Look a status up by its numeric code.
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    /// Human-readable label.
    pub fn text(self) -> &'static str {
        match self {
            Self::SessionStarted => "SESSION STARTED",
            Self::AuthRequired => "AUTHENTICATION REQUIRED",
            Self::AuthFailed => "AUTHENTICATION FAILED",
            Self::Authenticated => "SUCCESSFULLY AUTHENTICATED",
            Self::Permitted => "PERMITTED ACCESS",
            Self::Denied => "ACCESS DENIED",
            Self::NotFound => "PAGE NOT FOUND",
            Self::Closed => "SESSION CLOSED",
            Self::Expired => "SESSION EXPIRED",
            Self::Deviated => "MODIFIED ROUTE",
        }
    }

    /// Whether this status ends the session.
    pub fn is_logout(self) -> bool {
        matches!(self, Self::Closed | Self::Expired)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

impl From<Status> for u8 {
    fn from(status: Status) -> u8 {
        status.code()
    }
}

impl TryFrom<u8> for Status {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or_else(|| format!("unknown status code {code}"))
    }
}

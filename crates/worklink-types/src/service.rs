//! Service request status vocabulary.
//!
//! The chat subsystem relays service-request status changes as
//! notifications; it never owns the request lifecycle itself.

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a service request, as relayed by status-update
/// notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Pending,
    Accepted,
    InProgress,
    Completed,
    Cancelled,
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceStatus::Pending => write!(f, "pending"),
            ServiceStatus::Accepted => write!(f, "accepted"),
            ServiceStatus::InProgress => write!(f, "in_progress"),
            ServiceStatus::Completed => write!(f, "completed"),
            ServiceStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for ServiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ServiceStatus::Pending),
            "accepted" => Ok(ServiceStatus::Accepted),
            "in_progress" => Ok(ServiceStatus::InProgress),
            "completed" => Ok(ServiceStatus::Completed),
            "cancelled" => Ok(ServiceStatus::Cancelled),
            other => Err(format!("invalid service status: '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_status_roundtrip() {
        for status in [
            ServiceStatus::Pending,
            ServiceStatus::Accepted,
            ServiceStatus::InProgress,
            ServiceStatus::Completed,
            ServiceStatus::Cancelled,
        ] {
            let s = status.to_string();
            let parsed: ServiceStatus = s.parse().unwrap();
            assert_eq!(status, parsed);
        }
    }

    #[test]
    fn test_service_status_serde() {
        let status = ServiceStatus::InProgress;
        let json = serde_json::to_string(&status).unwrap();
        assert_eq!(json, "\"in_progress\"");
        let parsed: ServiceStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ServiceStatus::InProgress);
    }

    #[test]
    fn test_service_status_rejects_unknown() {
        assert!("archived".parse::<ServiceStatus>().is_err());
    }
}

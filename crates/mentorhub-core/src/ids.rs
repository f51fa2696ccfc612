use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! branded_id {
    ($(#[$meta:meta])* $name:ident, $prefix:expr) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            pub fn new() -> Self {
                Self(format!("{}_{}", $prefix, Uuid::now_v7()))
            }

            pub fn from_raw(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::convert::Infallible;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.to_owned()))
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

branded_id!(
    /// Committed mentoring session.
    SessionId,
    "sess"
);
branded_id!(
    /// Any account: mentor, mentee or admin.
    UserId,
    "usr"
);
branded_id!(SessionTypeId, "stype");
branded_id!(NotificationId, "ntf");
branded_id!(
    /// One `book_and_notify` invocation. Correlates step events and log lines.
    AttemptId,
    "book"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_carry_their_prefix() {
        assert!(SessionId::new().as_str().starts_with("sess_"));
        assert!(UserId::new().as_str().starts_with("usr_"));
        assert!(SessionTypeId::new().as_str().starts_with("stype_"));
        assert!(NotificationId::new().as_str().starts_with("ntf_"));
        assert!(AttemptId::new().as_str().starts_with("book_"));
    }

    #[test]
    fn ids_are_unique() {
        let a = SessionId::new();
        let b = SessionId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn from_raw_preserves_value() {
        let id = UserId::from_raw("m1");
        assert_eq!(id.as_str(), "m1");
        assert_eq!(id.to_string(), "m1");
    }

    #[test]
    fn blank_detection() {
        assert!(SessionTypeId::from_raw("   ").is_blank());
        assert!(SessionTypeId::from_raw("").is_blank());
        assert!(!SessionTypeId::from_raw("st1").is_blank());
    }

    #[test]
    fn serializes_transparently() {
        let id = UserId::from_raw("admin-7");
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""admin-7""#);
        let parsed: UserId = serde_json::from_str(r#""admin-7""#).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn monotonic_ordering() {
        let ids: Vec<AttemptId> = (0..50).map(|_| AttemptId::new()).collect();
        for w in ids.windows(2) {
            assert!(w[0] < w[1], "not monotonic: {} >= {}", w[0], w[1]);
        }
    }
}

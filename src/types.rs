use chrono::{DateTime, TimeDelta, Utc};

/// A subkey of a parsed OpenPGP key, reduced to the facts the validity
/// count needs.
///
/// Built once at the parse boundary and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subkey {
    /// Creation time of the subkey packet.
    pub created: DateTime<Utc>,
    /// Expiration derived from the binding signature's key validity period.
    /// `None` when the subkey never expires.
    pub expires: Option<DateTime<Utc>>,
    /// The binding signature is valid and carries a key flags subpacket.
    pub flags_valid: bool,
    /// The key flags declare communication (transport) encryption.
    pub encrypts_communications: bool,
    /// The public key algorithm is capable of encryption.
    pub algorithm_can_encrypt: bool,
}

impl Subkey {
    /// Returns true if the subkey is expired as of `at`.
    ///
    /// The expiration instant itself still counts as valid.
    pub fn is_expired(&self, at: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|expires| at > expires)
    }
}

/// A parsed OpenPGP public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub fingerprint: String,
    /// Subkeys in the order the key block lists them.
    pub subkeys: Vec<Subkey>,
}

/// The reference instants a key file is evaluated at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Window {
    /// Now.
    Current,
    /// Seven days from now.
    OneWeek,
    /// Fourteen days from now.
    TwoWeeks,
}

impl Window {
    pub const ALL: [Window; 3] = [Window::Current, Window::OneWeek, Window::TwoWeeks];

    pub fn offset(self) -> TimeDelta {
        match self {
            Self::Current => TimeDelta::zero(),
            Self::OneWeek => TimeDelta::days(7),
            Self::TwoWeeks => TimeDelta::days(14),
        }
    }

    pub fn reference_instant(self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.offset()
    }
}

impl std::fmt::Display for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Current => "current",
            Self::OneWeek => "future_1week",
            Self::TwoWeeks => "future_2weeks",
        };
        f.write_str(name)
    }
}

/// Valid encryption subkey counts for one key file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidityCounts {
    pub current: u64,
    pub one_week: u64,
    pub two_weeks: u64,
}

impl ValidityCounts {
    pub fn get(&self, window: Window) -> u64 {
        match window {
            Window::Current => self.current,
            Window::OneWeek => self.one_week,
            Window::TwoWeeks => self.two_weeks,
        }
    }
}

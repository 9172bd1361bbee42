//! Value types shared by the API clients.
//!
//! These are the few entities that recur across the service's APIs:
//!
//! | Type | Meaning |
//! |------|---------|
//! | [`Backend`] | Which deployment of the filtering service is targeted |
//! | [`Credential`] | Login/password pair, generated fresh for each test |
//! | [`DomainList`] / [`DomainEntry`] | Per-profile black, white and alias lists |
//! | [`Schedule`] | Weekly filtering schedule as `(minute, blocked)` switch points |
//! | [`Period`] | Subscription duration such as `5d`, `12h` or `3d4h` |

use core::fmt;
use std::net::IpAddr;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Minutes in a week; schedule switch points lie in `0..MINUTES_PER_WEEK`.
pub const MINUTES_PER_WEEK: u32 = 7 * 24 * 60;

/// Deployment variant of the filtering service.
///
/// Both backends run the same product and share test logic, but differ in
/// catalog contents (plans, categories, presets) and localisation, so
/// expected values are chosen per backend.
///
/// # Example
///
/// ```
/// use filterprobe::Backend;
///
/// assert_eq!(Backend::Xorp.host_env_var(), "XORP_HOST");
/// assert_eq!("tredy".parse::<Backend>().unwrap(), Backend::Tredy);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Backend {
    /// The Russian-market deployment.
    Xorp,
    /// The international deployment.
    Tredy,
}

impl Backend {
    /// Every backend, in the order live suites run them.
    pub const ALL: [Backend; 2] = [Backend::Xorp, Backend::Tredy];

    /// Returns the lowercase backend name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Backend::Xorp => "xorp",
            Backend::Tredy => "tredy",
        }
    }

    /// Returns the environment variable that holds this backend's base URL.
    pub const fn host_env_var(&self) -> &'static str {
        match self {
            Backend::Xorp => "XORP_HOST",
            Backend::Tredy => "TREDY_HOST",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown backend name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown backend: {0:?}")]
pub struct UnknownBackend(pub String);

impl FromStr for Backend {
    type Err = UnknownBackend;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "xorp" => Ok(Backend::Xorp),
            "tredy" => Ok(Backend::Tredy),
            _ => Err(UnknownBackend(s.to_string())),
        }
    }
}

/// Login/password pair used for HTTP Basic authentication.
///
/// Credentials are ephemeral: tests generate a fresh pair, register it, and
/// never persist it. The password is redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credential {
    /// Account login. Email-shaped, since the reseller API reuses it as e-mail.
    pub login: String,
    /// Account password.
    pub password: String,
}

impl Credential {
    /// Creates a credential from a login and a password.
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// One of the three per-profile domain lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DomainList {
    /// Always-allowed domains.
    White,
    /// Always-blocked domains.
    Black,
    /// Domains resolved to a fixed address.
    Alias,
}

impl DomainList {
    /// Every list, in the order the service documents them.
    pub const ALL: [DomainList; 3] = [DomainList::White, DomainList::Black, DomainList::Alias];

    /// Returns the wire name of the list.
    pub const fn as_str(&self) -> &'static str {
        match self {
            DomainList::White => "white",
            DomainList::Black => "black",
            DomainList::Alias => "alias",
        }
    }
}

impl fmt::Display for DomainList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A domain to add to one of a profile's lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainEntry {
    /// Block the domain.
    Black(String),
    /// Allow the domain.
    White(String),
    /// Resolve the domain to `ip`.
    Alias {
        /// Aliased domain.
        domain: String,
        /// Address the alias resolves to.
        ip: IpAddr,
    },
}

impl DomainEntry {
    /// Returns the list this entry belongs to.
    pub fn list(&self) -> DomainList {
        match self {
            DomainEntry::Black(_) => DomainList::Black,
            DomainEntry::White(_) => DomainList::White,
            DomainEntry::Alias { .. } => DomainList::Alias,
        }
    }

    /// Returns the domain name of the entry.
    pub fn domain(&self) -> &str {
        match self {
            DomainEntry::Black(domain) | DomainEntry::White(domain) => domain,
            DomainEntry::Alias { domain, .. } => domain,
        }
    }
}

/// Weekly filtering schedule.
///
/// A schedule is an ordered list of switch points: at `minute` (counted from
/// the start of the week) filtering becomes `blocked` or not. On the wire it
/// is a nested array, e.g. `[[0, true], [1980, false]]`.
///
/// # Example
///
/// ```
/// use filterprobe::Schedule;
///
/// let schedule = Schedule::new().at(0, true).at(1980, false);
/// assert_eq!(schedule.render(), "[[0, true], [1980, false]]");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Schedule(Vec<(u32, bool)>);

impl Schedule {
    /// Creates an empty schedule.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends a switch point.
    pub fn at(mut self, minute: u32, blocked: bool) -> Self {
        self.0.push((minute, blocked));
        self
    }

    /// Returns the switch points in order.
    pub fn entries(&self) -> &[(u32, bool)] {
        &self.0
    }

    /// Returns true if the schedule has no switch points.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if every minute is within the week and minutes increase.
    pub fn is_well_formed(&self) -> bool {
        self.0.iter().all(|(minute, _)| *minute < MINUTES_PER_WEEK)
            && self.0.windows(2).all(|pair| pair[0].0 < pair[1].0)
    }

    /// Renders the schedule as a positional RPC parameter literal.
    pub fn render(&self) -> String {
        let items: Vec<String> = self
            .0
            .iter()
            .map(|(minute, blocked)| format!("[{}, {}]", minute, blocked))
            .collect();
        format!("[{}]", items.join(", "))
    }
}

impl From<Vec<(u32, bool)>> for Schedule {
    fn from(entries: Vec<(u32, bool)>) -> Self {
        Self(entries)
    }
}

/// Subscription duration in days and hours.
///
/// The text form is `<days>d<hours>h` with either part optional, e.g. `5d`,
/// `12h`, `3d4h`. Zero parts are omitted when displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    days: u32,
    hours: u32,
}

impl Period {
    /// Creates a period, returning `None` if it would be empty.
    pub const fn new(days: u32, hours: u32) -> Option<Self> {
        if days == 0 && hours == 0 {
            None
        } else {
            Some(Self { days, hours })
        }
    }

    /// Builds a period from parts known to be non-empty.
    pub(crate) const fn from_parts(days: u32, hours: u32) -> Self {
        Self { days, hours }
    }

    /// Returns the day part.
    pub const fn days(&self) -> u32 {
        self.days
    }

    /// Returns the hour part.
    pub const fn hours(&self) -> u32 {
        self.hours
    }

    /// Returns the whole period in hours.
    pub const fn total_hours(&self) -> u64 {
        self.days as u64 * 24 + self.hours as u64
    }
}

/// Error returned when a [`Period`] cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PeriodError {
    #[error("period is empty")]
    Empty,

    #[error("period must not be zero")]
    Zero,

    #[error("missing number before unit '{0}'")]
    MissingNumber(char),

    #[error("number too large in period")]
    Overflow,

    #[error("unexpected character {0:?} in period")]
    UnexpectedChar(char),

    #[error("units must appear once, days before hours")]
    UnitOrder,

    #[error("number without a unit")]
    MissingUnit,
}

impl FromStr for Period {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(PeriodError::Empty);
        }

        let mut days: Option<u32> = None;
        let mut hours: Option<u32> = None;
        let mut digits = String::new();

        for c in s.chars() {
            match c {
                '0'..='9' => digits.push(c),
                'd' | 'h' => {
                    if digits.is_empty() {
                        return Err(PeriodError::MissingNumber(c));
                    }
                    let value: u32 = digits.parse().map_err(|_| PeriodError::Overflow)?;
                    digits.clear();

                    if c == 'd' {
                        if days.is_some() || hours.is_some() {
                            return Err(PeriodError::UnitOrder);
                        }
                        days = Some(value);
                    } else {
                        if hours.is_some() {
                            return Err(PeriodError::UnitOrder);
                        }
                        hours = Some(value);
                    }
                }
                other => return Err(PeriodError::UnexpectedChar(other)),
            }
        }

        if !digits.is_empty() {
            return Err(PeriodError::MissingUnit);
        }

        Period::new(days.unwrap_or(0), hours.unwrap_or(0)).ok_or(PeriodError::Zero)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.days > 0 {
            write!(f, "{}d", self.days)?;
        }
        if self.hours > 0 {
            write!(f, "{}h", self.hours)?;
        }
        Ok(())
    }
}

#[cfg(feature = "serde")]
impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

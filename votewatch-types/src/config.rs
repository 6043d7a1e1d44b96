//! Configuration types shared across the poller, the vendor connector and the ledger.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::VoteError;

/// Where a candidate's percentage history starts counting from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpeningBaseline {
    /// The earliest snapshot is the baseline: shares it reports earn nothing.
    /// Candidates first seen later still count their first share as a gain.
    #[default]
    FirstSnapshot,
    /// Every candidate starts from 0%, so the opening share is credited in full.
    Zero,
}

/// Conversion constants turning percentage gains into points and money.
///
/// `base_total_votes` is the assumed vote pool a full 100% represents, so a
/// one-point percentage gain is worth `base_total_votes / 100` points.
/// Every ledger produced by one orchestrator uses the same instance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateConfig {
    /// Assumed total vote pool (default 100 000).
    pub base_total_votes: f64,
    /// Money per point in baht (default 4).
    pub baht_per_point: f64,
    /// Starting point of every candidate's history.
    pub opening_baseline: OpeningBaseline,
}

impl Default for RateConfig {
    fn default() -> Self {
        Self::new(100_000.0, 4.0)
    }
}

impl RateConfig {
    /// Construct a rate pair with the default opening baseline.
    #[must_use]
    pub const fn new(base_total_votes: f64, baht_per_point: f64) -> Self {
        Self {
            base_total_votes,
            baht_per_point,
            opening_baseline: OpeningBaseline::FirstSnapshot,
        }
    }

    /// Override the opening baseline.
    #[must_use]
    pub const fn with_opening_baseline(mut self, baseline: OpeningBaseline) -> Self {
        self.opening_baseline = baseline;
        self
    }

    /// Check both constants are finite and strictly positive.
    ///
    /// # Errors
    /// Returns `InvalidArg` naming the offending constant.
    pub fn validate(&self) -> Result<(), VoteError> {
        if !(self.base_total_votes.is_finite() && self.base_total_votes > 0.0) {
            return Err(VoteError::InvalidArg(format!(
                "base_total_votes must be finite and > 0, got {}",
                self.base_total_votes
            )));
        }
        if !(self.baht_per_point.is_finite() && self.baht_per_point > 0.0) {
            return Err(VoteError::InvalidArg(format!(
                "baht_per_point must be finite and > 0, got {}",
                self.baht_per_point
            )));
        }
        Ok(())
    }

    /// Points represented by a percentage-point gain.
    #[must_use]
    pub fn points_for_gain(&self, delta_pct: f64) -> f64 {
        (delta_pct / 100.0) * self.base_total_votes
    }

    /// Money represented by a number of points.
    #[must_use]
    pub fn money_for_points(&self, points: f64) -> f64 {
        points * self.baht_per_point
    }
}

/// Login credentials for the vendor site.
///
/// Never serialized; `Debug` redacts the password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Environment variable holding the username.
    pub const USERNAME_ENV: &'static str = "VOTE_USERNAME";
    /// Environment variable holding the password.
    pub const PASSWORD_ENV: &'static str = "VOTE_PASSWORD";

    /// Build credentials; returns `None` when either part is empty.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Option<Self> {
        let username = username.into();
        let password = password.into();
        if username.trim().is_empty() || password.is_empty() {
            return None;
        }
        Some(Self { username, password })
    }

    /// Read credentials from `VOTE_USERNAME` / `VOTE_PASSWORD`.
    ///
    /// Missing or empty variables yield `None` so login can fail closed.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let username = std::env::var(Self::USERNAME_ENV).unwrap_or_default();
        let password = std::env::var(Self::PASSWORD_ENV).unwrap_or_default();
        Self::new(username, password)
    }

    /// Login name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Secret.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Username reduced to its first three characters, for logs.
    #[must_use]
    pub fn masked_username(&self) -> String {
        let head: String = self.username.chars().take(3).collect();
        format!("{head}***")
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.masked_username())
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Endpoints and request shaping for the authenticated vendor session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Page that renders the login form (visited first to obtain a session cookie).
    pub login_page: Url,
    /// Form action receiving the credentials.
    pub login_url: Url,
    /// Page embedding the chart data.
    pub data_url: Url,
    /// Form field carrying the username.
    #[serde(default = "default_username_field")]
    pub username_field: String,
    /// Form field carrying the password.
    #[serde(default = "default_password_field")]
    pub password_field: String,
    /// Case-insensitive path fragment identifying the login surface.
    #[serde(default = "default_login_marker")]
    pub login_marker: String,
    /// Per-request timeout, in seconds when serialized.
    #[serde(default = "default_request_timeout", with = "duration_secs")]
    pub request_timeout: Duration,
    /// User agent sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// `Accept-Language` header value.
    #[serde(default = "default_accept_language")]
    pub accept_language: String,
    /// Merge hidden inputs and CSRF meta tags from the login page into the login form.
    #[serde(default = "default_true")]
    pub harvest_hidden_fields: bool,
}

fn default_username_field() -> String {
    "username".to_string()
}

fn default_password_field() -> String {
    "userpassword".to_string()
}

fn default_login_marker() -> String {
    "login".to_string()
}

const fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

fn default_accept_language() -> String {
    "th,en;q=0.9".to_string()
}

const fn default_true() -> bool {
    true
}

impl SessionConfig {
    /// Build a configuration for the three endpoints with default request shaping.
    #[must_use]
    pub fn new(login_page: Url, login_url: Url, data_url: Url) -> Self {
        Self {
            login_page,
            login_url,
            data_url,
            username_field: default_username_field(),
            password_field: default_password_field(),
            login_marker: default_login_marker(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
            accept_language: default_accept_language(),
            harvest_hidden_fields: true,
        }
    }

    /// Endpoints of the Y Universe Awards 2025 "The Best Couple" vote summary.
    ///
    /// # Errors
    /// Only fails if the built-in URLs stop parsing.
    pub fn yna2025() -> Result<Self, VoteError> {
        let parse = |s: &str| {
            Url::parse(s).map_err(|e| VoteError::InvalidArg(format!("bad url {s}: {e}")))
        };
        Ok(Self::new(
            parse("https://acmonlinebiz.com/yna2025/login.php")?,
            parse("https://acmonlinebiz.com/yna2025/login_action.php")?,
            parse("https://acmonlinebiz.com/yna2025/votesummary.php?tpid=4")?,
        ))
    }

    /// Override the per-request timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Validate field names and the timeout.
    ///
    /// # Errors
    /// Returns `InvalidArg` for empty field names, an empty login marker, or a zero timeout.
    pub fn validate(&self) -> Result<(), VoteError> {
        if self.username_field.trim().is_empty() || self.password_field.trim().is_empty() {
            return Err(VoteError::InvalidArg(
                "login form field names must not be empty".to_string(),
            ));
        }
        if self.login_marker.trim().is_empty() {
            return Err(VoteError::InvalidArg(
                "login_marker must not be empty".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(VoteError::InvalidArg(
                "request_timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Poller and ledger configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Conversion constants shared by every reconstruction.
    pub rates: RateConfig,
    /// Interval between scheduled cycles, in seconds when serialized.
    #[serde(with = "duration_secs")]
    pub poll_interval: Duration,
    /// Age after which the latest snapshot counts as stale; defaults to twice the poll interval.
    #[serde(with = "opt_duration_secs")]
    pub stale_after: Option<Duration>,
    /// Hard bound on one whole cycle (login, retry and fetch included).
    #[serde(with = "duration_secs")]
    pub cycle_timeout: Duration,
    /// Random jitter added to each scheduled tick, as a percentage of the interval.
    pub jitter_percent: u8,
    /// Timezone for offset-less timestamps and presentation labels.
    pub timezone: Tz,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            rates: RateConfig::default(),
            poll_interval: Duration::from_secs(60 * 60),
            stale_after: None,
            cycle_timeout: Duration::from_secs(90),
            jitter_percent: 5,
            timezone: chrono_tz::Asia::Bangkok,
        }
    }
}

impl WatchConfig {
    /// Effective staleness threshold.
    #[must_use]
    pub fn stale_after(&self) -> Duration {
        self.stale_after
            .unwrap_or_else(|| self.poll_interval.saturating_mul(2))
    }

    /// Validate rates and durations.
    ///
    /// # Errors
    /// Returns `InvalidArg` for invalid rates, zero durations or jitter above 100%.
    pub fn validate(&self) -> Result<(), VoteError> {
        self.rates.validate()?;
        if self.poll_interval.is_zero() || self.cycle_timeout.is_zero() {
            return Err(VoteError::InvalidArg(
                "poll_interval and cycle_timeout must be greater than zero".to_string(),
            ));
        }
        if self.jitter_percent > 100 {
            return Err(VoteError::InvalidArg(format!(
                "jitter_percent must be within [0, 100], got {}",
                self.jitter_percent
            )));
        }
        Ok(())
    }
}

/// On-disk settings file: session endpoints, poller config and the snapshot directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchSettings {
    /// Vendor endpoints and request shaping.
    pub session: SessionConfig,
    /// Poller and ledger configuration.
    #[serde(default)]
    pub watch: WatchConfig,
    /// Directory receiving one JSON record per successful cycle.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data_yna2025")
}

impl WatchSettings {
    /// Validate every section.
    ///
    /// # Errors
    /// Propagates the first section error.
    pub fn validate(&self) -> Result<(), VoteError> {
        self.session.validate()?;
        self.watch.validate()
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

mod opt_duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match d {
            Some(d) => s.serialize_some(&d.as_secs()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Option::<u64>::deserialize(d).map(|o| o.map(Duration::from_secs))
    }
}

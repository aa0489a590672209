//! Per-username lookups against the Roblox user and validation endpoints.

use std::fmt;
use std::io;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ureq::Agent;

/// Default endpoint for the lookup-by-name request.
pub const DEFAULT_LOOKUP_URL: &str = "https://api.roblox.com/users/get-by-username";

/// Default endpoint for the username validation request.
pub const DEFAULT_VALIDATE_URL: &str = "https://auth.roblox.com/v1/usernames/validate";

/// Upper bound on a single request, connect to last body byte.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Birthdate sent with every validation request.
///
/// The validation endpoint insists on an age-gate field. A fixed adult date
/// keeps the answer about the name itself rather than about age rules.
pub const PLACEHOLDER_BIRTHDAY: &str = "1990-01-01T00:00:00.000Z";

const FALLBACK_REJECTION: &str = "Username is not available";

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// An existing account, as resolved by the lookup endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct User {
    /// Numeric account id.
    pub id: u64,
    /// Name as spelled by the service (may differ in case from the query).
    pub name: String,
}

/// Answer of [`Checker::check_exists`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Existence {
    /// An account with this name exists.
    Exists(User),
    /// No account was found, or the lookup could not be completed.
    NotFound,
}

/// Answer of [`Checker::check_validity`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Validity {
    /// The service accepts the name for registration.
    Valid,
    /// The name cannot be registered; carries the reason.
    Invalid(String),
}

/// Classification of one username.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Outcome {
    /// Already registered by the given account.
    Taken(User),
    /// Free to register.
    Available,
    /// Rejected by validation, with the reason.
    Invalid(String),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Taken(user) => write!(f, "taken (ID: {})", user.id),
            Self::Available => write!(f, "available"),
            Self::Invalid(reason) => write!(f, "invalid: {reason}"),
        }
    }
}

/// Failure kinds of a single remote call.
///
/// These never leave the [`Checker`] boundary; they are logged and then
/// folded into [`Existence::NotFound`] or [`Validity::Invalid`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LookupError {
    /// The request did not complete within the configured timeout.
    #[error("request timeout - please try again")]
    Timeout,
    /// Connection, DNS, TLS or other transport failure.
    #[error("network error: {0}")]
    Transport(#[source] Box<ureq::Error>),
    /// The response body did not match the expected schema.
    #[error("unexpected response: {0}")]
    Malformed(String),
    /// A well-formed answer saying no, with the service's reason.
    #[error("{0}")]
    Rejected(String),
}

impl LookupError {
    /// Short label for log fields.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Transport(_) => "transport",
            Self::Malformed(_) => "malformed",
            Self::Rejected(_) => "rejected",
        }
    }
}

impl From<ureq::Error> for LookupError {
    fn from(e: ureq::Error) -> Self {
        match e {
            ureq::Error::Timeout(_) => Self::Timeout,
            ureq::Error::Io(ref err) if err.kind() == io::ErrorKind::TimedOut => Self::Timeout,
            other => Self::Transport(Box::new(other)),
        }
    }
}

/// Resolves the status of one username.
///
/// Both calls are total: every failure is already folded into the negative
/// answer, so callers never handle errors.
pub trait Checker {
    /// Does an account with this name exist?
    fn check_exists(&self, username: &str) -> Existence;

    /// Would the service accept this name for a new account?
    fn check_validity(&self, username: &str) -> Validity;
}

/// Classify a single username.
///
/// Validation is skipped when the name already exists, since an existing
/// account already makes it unavailable.
pub fn check_username<C: Checker + ?Sized>(checker: &C, username: &str) -> Outcome {
    match checker.check_exists(username) {
        Existence::Exists(user) => Outcome::Taken(user),
        Existence::NotFound => match checker.check_validity(username) {
            Validity::Valid => Outcome::Available,
            Validity::Invalid(reason) => Outcome::Invalid(reason),
        },
    }
}

/// Connection settings captured by a [`Client`] at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Lookup-by-name endpoint, queried with `?username=`.
    pub lookup_url: String,
    /// Validation endpoint, receives a JSON body.
    pub validate_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            lookup_url: DEFAULT_LOOKUP_URL.to_string(),
            validate_url: DEFAULT_VALIDATE_URL.to_string(),
            timeout: REQUEST_TIMEOUT,
            user_agent: USER_AGENT.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct UserRecord {
    #[serde(rename = "Id")]
    id: Option<u64>,
    #[serde(rename = "Username")]
    username: Option<String>,
}

#[derive(Serialize)]
struct ValidationRequest<'a> {
    username: &'a str,
    birthday: &'a str,
}

#[derive(Deserialize)]
struct ValidationResponse {
    code: Option<i64>,
    message: Option<String>,
}

fn parse_user(body: &str, username: &str) -> Result<Option<User>, LookupError> {
    let record: UserRecord =
        serde_json::from_str(body).map_err(|e| LookupError::Malformed(e.to_string()))?;
    Ok(record.id.map(|id| User {
        id,
        name: record.username.unwrap_or_else(|| username.to_string()),
    }))
}

fn parse_validation(body: &str) -> Result<(), LookupError> {
    let response: ValidationResponse =
        serde_json::from_str(body).map_err(|e| LookupError::Malformed(e.to_string()))?;
    if response.code == Some(0) {
        return Ok(());
    }
    let reason = response
        .message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_REJECTION.to_string());
    Err(LookupError::Rejected(reason))
}

/// An HTTP client for the two Roblox endpoints.
///
/// The underlying agent is built once from a [`ClientConfig`]; nothing about
/// it changes afterwards.
///
/// # Example
///
/// ```no_run
/// use roblox_avail::check::{Client, Outcome, check_username};
///
/// let client = Client::new();
/// match check_username(&client, "builderman") {
///     Outcome::Taken(user) => println!("taken by {}", user.id),
///     Outcome::Available => println!("go grab it!"),
///     Outcome::Invalid(reason) => println!("invalid: {reason}"),
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    agent: Agent,
    config: ClientConfig,
}

impl Client {
    /// Create a client for the public endpoints with default timeouts.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    /// Create a client from explicit settings.
    #[must_use]
    pub fn with_config(config: ClientConfig) -> Self {
        let agent_config = Agent::config_builder()
            .timeout_global(Some(config.timeout))
            .user_agent(config.user_agent.as_str())
            .http_status_as_error(false)
            .build();
        Self {
            agent: Agent::new_with_config(agent_config),
            config,
        }
    }

    /// The settings this client was built with.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Look a username up by name.
    ///
    /// A non-success status is an ordinary "not found", not an error.
    ///
    /// # Errors
    ///
    /// [`LookupError::Timeout`] or [`LookupError::Transport`] when the request
    /// fails, [`LookupError::Malformed`] when the body is not the expected
    /// record.
    pub fn lookup_user(&self, username: &str) -> Result<Option<User>, LookupError> {
        let mut response = self
            .agent
            .get(&self.config.lookup_url)
            .query("username", username)
            .call()?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(%username, status = status.as_u16(), "lookup returned non-success status");
            return Ok(None);
        }

        let body = response.body_mut().read_to_string()?;
        parse_user(&body, username)
    }

    /// Ask the validation endpoint whether `username` can be registered.
    ///
    /// # Errors
    ///
    /// [`LookupError::Rejected`] carries the service's reason when the name
    /// is refused; the other variants describe why no answer was obtained.
    pub fn validate_username(&self, username: &str) -> Result<(), LookupError> {
        let payload = serde_json::to_string(&ValidationRequest {
            username,
            birthday: PLACEHOLDER_BIRTHDAY,
        })
        .map_err(|e| LookupError::Malformed(e.to_string()))?;

        let mut response = self
            .agent
            .post(&self.config.validate_url)
            .header("Content-Type", "application/json")
            .send(payload)?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Rejected(format!("API error: {}", status.as_u16())));
        }

        let body = response.body_mut().read_to_string()?;
        parse_validation(&body)
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Checker for Client {
    fn check_exists(&self, username: &str) -> Existence {
        match self.lookup_user(username) {
            Ok(Some(user)) => {
                tracing::debug!(%username, id = user.id, "username exists");
                Existence::Exists(user)
            }
            Ok(None) => Existence::NotFound,
            // The lookup endpoint is only trusted on a positive match; any
            // failure reads as "not found" and validation decides.
            Err(e) => {
                tracing::warn!(%username, kind = e.kind(), error = %e, "existence lookup failed");
                Existence::NotFound
            }
        }
    }

    fn check_validity(&self, username: &str) -> Validity {
        match self.validate_username(username) {
            Ok(()) => Validity::Valid,
            Err(LookupError::Rejected(reason)) => {
                tracing::debug!(%username, %reason, "validation rejected username");
                Validity::Invalid(reason)
            }
            Err(e) => {
                tracing::warn!(%username, kind = e.kind(), error = %e, "validation request failed");
                Validity::Invalid(e.to_string())
            }
        }
    }
}

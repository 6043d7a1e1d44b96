use std::collections::VecDeque;
use std::sync::Arc;

use chrono::Utc;
use url::Url;
use votewatch_core::{AuthFailure, Credentials, SessionConfig, Snapshot, VoteError};

use crate::adapter::{AcmTransport, HttpPage};
use crate::extract::PageExtractor;
use crate::html;
use crate::session_sm::{Action, Event, SessionMachine, SessionState};

/// Meta tags whose `content` is submitted as `_token`.
const CSRF_META_NAMES: [&str; 3] = ["csrf-token", "_token", "csrf_token"];

/// One authenticated vendor session.
///
/// Owns the transport (and with it the cookie jar) and the login state. All
/// operations take `&mut self`; callers serialize access.
pub struct SessionManager {
    config: SessionConfig,
    credentials: Option<Credentials>,
    transport: Arc<dyn AcmTransport>,
    extractor: Arc<dyn PageExtractor>,
    machine: SessionMachine,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("data_url", &self.config.data_url.as_str())
            .field("credentials", &self.credentials)
            .field("state", &self.machine.state)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Assemble a session from its parts. Starts `LoggedOut`.
    #[must_use]
    pub fn new(
        config: SessionConfig,
        credentials: Option<Credentials>,
        transport: Arc<dyn AcmTransport>,
        extractor: Arc<dyn PageExtractor>,
    ) -> Self {
        Self {
            config,
            credentials,
            transport,
            extractor,
            machine: SessionMachine::default(),
        }
    }

    /// Allow `max` re-logins per fetch after an expiry (default 1).
    #[must_use]
    pub fn with_max_relogins(mut self, max: u8) -> Self {
        self.machine = SessionMachine {
            relogins_left: max,
            max_relogins: max,
            ..self.machine
        };
        self
    }

    /// Current authentication phase.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.machine.state
    }

    /// Endpoints and request shaping in use.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Submit credentials and report whether the vendor accepted them.
    ///
    /// Returns `Ok(false)` without any request when no credentials are
    /// configured, and `Ok(false)` when the vendor keeps the client on the
    /// login surface without a session cookie. Acceptance is provisional:
    /// the vendor exposes no explicit success flag.
    ///
    /// # Errors
    /// Network-class failures are returned as errors and leave the session
    /// state unchanged.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "votewatch_acm::session::login", skip(self))
    )]
    pub async fn login(&mut self) -> Result<bool, VoteError> {
        match self.drive(Event::LoginRequested).await {
            Ok(_) => Ok(true),
            Err(VoteError::Auth { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Fetch one snapshot, logging in first when needed.
    ///
    /// If the data request is redirected to the login surface, the session
    /// is re-established once and the request retried once. A second
    /// redirect fails the call with `Auth(ExpiredAfterRelogin)`.
    ///
    /// # Errors
    /// `Auth` when no session can be established, network-class errors for
    /// transport failures and non-2xx statuses, `Parse` when the page has no
    /// usable data.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "votewatch_acm::session::fetch_snapshot", skip(self))
    )]
    pub async fn fetch_snapshot(&mut self) -> Result<Snapshot, VoteError> {
        let page = self
            .drive(Event::FetchRequested)
            .await?
            .ok_or_else(|| VoteError::Other("fetch finished without a data page".into()))?;
        let snapshot = self.extractor.extract(&page, Utc::now())?;
        #[cfg(feature = "tracing")]
        tracing::info!(
            candidates = snapshot.percentages.len(),
            "snapshot extracted"
        );
        Ok(snapshot)
    }

    fn dispatch(&mut self, event: Event) -> Vec<Action> {
        let (next, actions) = std::mem::take(&mut self.machine).handle(event);
        self.machine = next;
        actions
    }

    /// Run the machine from `start` until it delivers a page, settles, or fails.
    async fn drive(&mut self, start: Event) -> Result<Option<HttpPage>, VoteError> {
        let mut queue: VecDeque<Action> = self.dispatch(start).into();
        let mut data_page: Option<HttpPage> = None;
        while let Some(action) = queue.pop_front() {
            let event = match action {
                Action::SubmitLogin => self.submit_login().await,
                Action::RequestData => match self.request_data().await {
                    Ok(Some(page)) => {
                        data_page = Some(page);
                        Event::DataReceived
                    }
                    Ok(None) => Event::RedirectedToLogin,
                    Err(error) => Event::TransportFailed { error },
                },
                Action::Deliver => return Ok(data_page.take()),
                Action::Ready => return Ok(None),
                Action::Fail { error } => return Err(error),
            };
            queue.extend(self.dispatch(event));
        }
        Err(VoteError::Other("session machine stalled".into()))
    }

    /// `Ok(None)` when the request landed on the login surface.
    async fn request_data(&self) -> Result<Option<HttpPage>, VoteError> {
        let page = self.transport.get(&self.config.data_url).await?;
        if self.is_login_surface(&page.final_url) {
            #[cfg(feature = "tracing")]
            tracing::warn!(url = %page.final_url, "data request redirected to login; session expired");
            return Ok(None);
        }
        page.ensure_success()?;
        Ok(Some(page))
    }

    async fn submit_login(&self) -> Event {
        let Some(creds) = self.credentials.as_ref() else {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                "no credentials configured ({} / {}); login not attempted",
                Credentials::USERNAME_ENV,
                Credentials::PASSWORD_ENV
            );
            return Event::LoginRejected {
                reason: AuthFailure::MissingCredentials,
            };
        };
        match self.post_credentials(creds).await {
            Ok(true) => {
                #[cfg(feature = "tracing")]
                tracing::info!(user = %creds.masked_username(), "login accepted");
                Event::LoginSucceeded
            }
            Ok(false) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(user = %creds.masked_username(), "login rejected");
                Event::LoginRejected {
                    reason: AuthFailure::Rejected,
                }
            }
            Err(error) => Event::TransportFailed { error },
        }
    }

    async fn post_credentials(&self, creds: &Credentials) -> Result<bool, VoteError> {
        let form_page = self.transport.get(&self.config.login_page).await?;
        form_page.ensure_success()?;

        let mut form: Vec<(String, String)> = if self.config.harvest_hidden_fields {
            hidden_fields(&form_page.body)
        } else {
            Vec::new()
        };
        form.retain(|(k, _)| k != &self.config.username_field && k != &self.config.password_field);
        form.push((self.config.username_field.clone(), creds.username().to_string()));
        form.push((self.config.password_field.clone(), creds.password().to_string()));

        let page = self.transport.post_form(&self.config.login_url, &form).await?;
        if page.status >= 500 {
            page.ensure_success()?;
        }
        Ok(!self.is_login_surface(&page.final_url)
            || self.transport.has_session_cookies(&self.config.data_url))
    }

    /// True if `url` is the login page, the login action, or any path
    /// containing the login marker.
    #[must_use]
    pub fn is_login_surface(&self, url: &Url) -> bool {
        let path = url.path();
        path == self.config.login_page.path()
            || path == self.config.login_url.path()
            || path
                .to_ascii_lowercase()
                .contains(&self.config.login_marker.to_ascii_lowercase())
    }
}

/// Hidden inputs and CSRF meta values of a login form page.
fn hidden_fields(body: &str) -> Vec<(String, String)> {
    let mut fields: Vec<(String, String)> = html::opening_tags(body, "input")
        .into_iter()
        .filter(|tag| {
            html::attr(tag, "type").is_some_and(|t| t.eq_ignore_ascii_case("hidden"))
        })
        .filter_map(|tag| {
            let name = html::attr(tag, "name").filter(|n| !n.is_empty())?;
            Some((name, html::attr(tag, "value").unwrap_or_default()))
        })
        .collect();
    let csrf = html::opening_tags(body, "meta").into_iter().find_map(|tag| {
        let name = html::attr(tag, "name")?;
        CSRF_META_NAMES
            .iter()
            .any(|n| n.eq_ignore_ascii_case(&name))
            .then(|| html::attr(tag, "content").unwrap_or_default())
    });
    if let Some(token) = csrf {
        fields.retain(|(k, _)| k != "_token");
        fields.push(("_token".to_string(), token));
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_inputs_and_csrf_meta_are_collected() {
        let body = r#"<html><head><meta name="csrf-token" content="tok123"></head>
            <form><input type="hidden" name="redirect" value="votesummary.php">
            <input type="HIDDEN" name="_token" value="stale">
            <input type="text" name="username"></form></html>"#;
        let fields = hidden_fields(body);
        assert_eq!(
            fields,
            vec![
                ("redirect".to_string(), "votesummary.php".to_string()),
                ("_token".to_string(), "tok123".to_string()),
            ]
        );
    }
}

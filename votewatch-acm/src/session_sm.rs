//! Pure session state machine.
//!
//! The driver in `session.rs` feeds it events from the transport and executes
//! the actions it returns. Keeping the machine free of I/O makes the
//! "one re-login, one retry" bound testable on its own.

use votewatch_core::{AuthFailure, VoteError};

/// Authentication phase of the session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    /// No session has been established (initial state).
    #[default]
    LoggedOut,
    /// A login request is in flight.
    LoggingIn,
    /// The last login was accepted and no expiry has been observed since.
    LoggedIn,
    /// The vendor redirected a data request back to the login surface.
    SessionExpired,
}

impl SessionState {
    /// True for states a caller can observe between operations.
    #[must_use]
    pub const fn is_resting(self) -> bool {
        !matches!(self, Self::LoggingIn)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// A caller wants a snapshot.
    FetchRequested,
    /// A caller wants to (re)establish the session only.
    LoginRequested,
    LoginSucceeded,
    LoginRejected { reason: AuthFailure },
    /// The data page arrived and is not the login surface.
    DataReceived,
    /// The data request landed on the login surface.
    RedirectedToLogin,
    /// Timeout, connection failure or unexpected status.
    TransportFailed { error: VoteError },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    SubmitLogin,
    RequestData,
    /// Hand the received data page to the extractor.
    Deliver,
    /// A standalone login completed.
    Ready,
    Fail { error: VoteError },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionMachine {
    pub state: SessionState,
    /// Where a login that dies on the network falls back to.
    pub resume_state: SessionState,
    /// Re-logins still allowed in the current operation.
    pub relogins_left: u8,
    pub max_relogins: u8,
    /// Whether the current operation ends in a data request.
    pub fetching: bool,
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self::new(1)
    }
}

impl SessionMachine {
    #[must_use]
    pub const fn new(max_relogins: u8) -> Self {
        Self {
            state: SessionState::LoggedOut,
            resume_state: SessionState::LoggedOut,
            relogins_left: max_relogins,
            max_relogins,
            fetching: false,
        }
    }

    pub fn handle(self, event: Event) -> (Self, Vec<Action>) {
        use SessionState::{LoggedIn, LoggedOut, LoggingIn, SessionExpired};

        match (self.state, event) {
            (LoggedIn, Event::FetchRequested) => (
                Self {
                    relogins_left: self.max_relogins,
                    fetching: true,
                    ..self
                },
                vec![Action::RequestData],
            ),
            (prev @ (LoggedOut | SessionExpired), Event::FetchRequested) => (
                Self {
                    state: LoggingIn,
                    resume_state: prev,
                    relogins_left: self.max_relogins,
                    fetching: true,
                    ..self
                },
                vec![Action::SubmitLogin],
            ),
            (prev @ (LoggedOut | SessionExpired | LoggedIn), Event::LoginRequested) => (
                Self {
                    state: LoggingIn,
                    resume_state: prev,
                    fetching: false,
                    ..self
                },
                vec![Action::SubmitLogin],
            ),
            // A previous operation was dropped mid-login (cycle timeout):
            // start the login over from the state it left.
            (LoggingIn, e @ (Event::FetchRequested | Event::LoginRequested)) => (
                Self {
                    relogins_left: self.max_relogins,
                    fetching: e == Event::FetchRequested,
                    ..self
                },
                vec![Action::SubmitLogin],
            ),
            (LoggingIn, Event::LoginSucceeded) => {
                let action = if self.fetching {
                    Action::RequestData
                } else {
                    Action::Ready
                };
                (
                    Self {
                        state: LoggedIn,
                        resume_state: LoggedIn,
                        ..self
                    },
                    vec![action],
                )
            }
            (LoggingIn, Event::LoginRejected { reason }) => (
                Self {
                    state: LoggedOut,
                    resume_state: LoggedOut,
                    fetching: false,
                    ..self
                },
                vec![Action::Fail {
                    error: VoteError::auth(reason),
                }],
            ),
            (LoggedIn, Event::DataReceived) if self.fetching => (
                Self {
                    fetching: false,
                    ..self
                },
                vec![Action::Deliver],
            ),
            (LoggedIn, Event::RedirectedToLogin) if self.fetching => {
                if self.relogins_left > 0 {
                    (
                        Self {
                            state: LoggingIn,
                            resume_state: SessionExpired,
                            relogins_left: self.relogins_left - 1,
                            ..self
                        },
                        vec![Action::SubmitLogin],
                    )
                } else {
                    (
                        Self {
                            state: SessionExpired,
                            resume_state: SessionExpired,
                            fetching: false,
                            ..self
                        },
                        vec![Action::Fail {
                            error: VoteError::auth(AuthFailure::ExpiredAfterRelogin),
                        }],
                    )
                }
            }
            (LoggingIn, Event::TransportFailed { error }) => (
                Self {
                    state: self.resume_state,
                    fetching: false,
                    ..self
                },
                vec![Action::Fail { error }],
            ),
            (_, Event::TransportFailed { error }) => (
                Self {
                    fetching: false,
                    ..self
                },
                vec![Action::Fail { error }],
            ),
            (state, event) => {
                let error = VoteError::Other(format!(
                    "session event {event:?} is invalid in state {state:?}"
                ));
                (
                    Self {
                        fetching: false,
                        ..self
                    },
                    vec![Action::Fail { error }],
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(m: SessionMachine, e: Event) -> (SessionMachine, Action) {
        let (m, mut actions) = m.handle(e);
        assert_eq!(actions.len(), 1, "one action per event");
        (m, actions.remove(0))
    }

    #[test]
    fn first_fetch_logs_in_then_requests_data() {
        let (m, a) = step(SessionMachine::default(), Event::FetchRequested);
        assert_eq!(a, Action::SubmitLogin);
        assert_eq!(m.state, SessionState::LoggingIn);
        let (m, a) = step(m, Event::LoginSucceeded);
        assert_eq!(a, Action::RequestData);
        let (m, a) = step(m, Event::DataReceived);
        assert_eq!(a, Action::Deliver);
        assert_eq!(m.state, SessionState::LoggedIn);
    }

    #[test]
    fn expiry_allows_exactly_one_relogin_and_retry() {
        let m = SessionMachine {
            state: SessionState::LoggedIn,
            ..SessionMachine::default()
        };
        let (m, a) = step(m, Event::FetchRequested);
        assert_eq!(a, Action::RequestData);
        let (m, a) = step(m, Event::RedirectedToLogin);
        assert_eq!(a, Action::SubmitLogin);
        assert_eq!(m.resume_state, SessionState::SessionExpired);
        let (m, a) = step(m, Event::LoginSucceeded);
        assert_eq!(a, Action::RequestData);
        let (m, a) = step(m, Event::RedirectedToLogin);
        assert_eq!(
            a,
            Action::Fail {
                error: VoteError::auth(AuthFailure::ExpiredAfterRelogin)
            }
        );
        assert_eq!(m.state, SessionState::SessionExpired);

        // The next operation starts with a fresh budget and logs in first.
        let (m, a) = step(m, Event::FetchRequested);
        assert_eq!(a, Action::SubmitLogin);
        assert_eq!(m.relogins_left, 1);
    }

    #[test]
    fn rejected_login_fails_without_data_request() {
        let (m, _) = step(SessionMachine::default(), Event::FetchRequested);
        let (m, a) = step(
            m,
            Event::LoginRejected {
                reason: AuthFailure::MissingCredentials,
            },
        );
        assert_eq!(
            a,
            Action::Fail {
                error: VoteError::auth(AuthFailure::MissingCredentials)
            }
        );
        assert_eq!(m.state, SessionState::LoggedOut);
    }

    #[test]
    fn network_failure_restores_the_resting_state() {
        let expired = SessionMachine {
            state: SessionState::SessionExpired,
            resume_state: SessionState::SessionExpired,
            ..SessionMachine::default()
        };
        let (m, _) = step(expired, Event::FetchRequested);
        let (m, a) = step(
            m,
            Event::TransportFailed {
                error: VoteError::network("timeout"),
            },
        );
        assert!(matches!(a, Action::Fail { .. }));
        assert_eq!(m.state, SessionState::SessionExpired);

        let logged_in = SessionMachine {
            state: SessionState::LoggedIn,
            ..SessionMachine::default()
        };
        let (m, _) = step(logged_in, Event::FetchRequested);
        let (m, _) = step(
            m,
            Event::TransportFailed {
                error: VoteError::network("reset"),
            },
        );
        assert_eq!(m.state, SessionState::LoggedIn);
        assert!(m.state.is_resting());
    }

    #[test]
    fn standalone_login_ends_ready() {
        let (m, a) = step(SessionMachine::default(), Event::LoginRequested);
        assert_eq!(a, Action::SubmitLogin);
        let (m, a) = step(m, Event::LoginSucceeded);
        assert_eq!(a, Action::Ready);
        assert_eq!(m.state, SessionState::LoggedIn);
    }

    #[test]
    fn interrupted_login_is_restarted() {
        let (m, _) = step(SessionMachine::default(), Event::FetchRequested);
        // The driver future was dropped here; the machine still says LoggingIn.
        let (m, a) = step(m, Event::FetchRequested);
        assert_eq!(a, Action::SubmitLogin);
        assert!(m.fetching);
        assert_eq!(m.resume_state, SessionState::LoggedOut);
        let (_, a) = step(m, Event::LoginSucceeded);
        assert_eq!(a, Action::RequestData);
    }

    #[test]
    fn stray_events_fail_without_moving() {
        let (m, a) = step(SessionMachine::default(), Event::DataReceived);
        assert!(matches!(a, Action::Fail { error: VoteError::Other(_) }));
        assert_eq!(m.state, SessionState::LoggedOut);
    }
}

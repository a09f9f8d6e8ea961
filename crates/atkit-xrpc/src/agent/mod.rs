//! Session lifecycle management.
//!
//! [`XrpcAgent`] owns one session. It logs in, restores, refreshes and ends
//! that session, and keeps it alive with a single one-shot refresh timer that
//! is rearmed after every refresh.
//!
//! All session mutation happens under one lock. Network calls run outside the
//! lock; their results are committed only if no login, logout or token
//! replacement happened in the meantime.

mod config;
mod schedule;

pub use config::AgentConfig;
pub use schedule::{RefreshSchedule, refresh_schedule};

use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};

use atkit_core::error::{AuthError, Error, ProtocolError};
use atkit_core::session::{SessionConfigurationError, SessionData};
use atkit_core::traits::IdentityResolver;
use atkit_core::types::{AtIdentifier, Did, Handle, PdsUrl};
use atkit_core::{
    AccessToken, Credentials, Exchange, RefreshToken, Result, SessionEvent, TokenValidator,
};

use crate::pds::XrpcPds;
use crate::resolver::{ResolverOptions, XrpcResolver};
use crate::xrpc::XrpcClient;
use crate::xrpc::endpoints::SessionResponse;

/// Error code reported when login cannot resolve the identifier to a DID.
pub const HANDLE_NOT_RESOLVABLE: &str = "HandleNotResolvable";

/// Error code reported when login cannot find the account's PDS.
pub const PDS_NOT_RESOLVABLE: &str = "PdsNotResolvable";

/// Lifecycle state of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    /// No session has been established.
    Anonymous,
    /// A login or restore is in progress.
    Authenticating,
    /// A session is installed.
    Authenticated,
    /// The session tokens are being refreshed.
    Refreshing,
    /// A session is installed but its access token has expired.
    Expired,
    /// The session was ended by logout.
    LoggedOut,
}

/// An AT Protocol session agent backed by XRPC.
///
/// Dropping the agent cancels its refresh timer and any background refresh.
pub struct XrpcAgent {
    inner: Arc<AgentInner>,
}

struct AgentInner {
    client: XrpcClient,
    resolver: Arc<dyn IdentityResolver>,
    config: AgentConfig,
    shared: Mutex<AgentShared>,
    // Held for the duration of a refresh exchange so refreshes never overlap
    refreshing: Mutex<()>,
    // Held for a whole login or restore so installations happen one at a time
    installing: Mutex<()>,
    events: broadcast::Sender<SessionEvent>,
    shutdown: CancellationToken,
}

struct AgentShared {
    session: Option<SessionData>,
    state: AgentState,
    timer: Option<RefreshTimer>,
    // Bumped whenever the session is replaced or cleared
    generation: u64,
    // Bumped whenever the timer is stopped or rearmed
    timer_epoch: u64,
}

struct RefreshTimer {
    cancel: CancellationToken,
    due: DateTime<Utc>,
    _task: JoinHandle<()>,
}

impl AgentShared {
    fn stop_timer(&mut self) {
        self.timer_epoch += 1;
        if let Some(timer) = self.timer.take() {
            timer.cancel.cancel();
            debug!(due = %timer.due, "Refresh timer stopped");
        }
    }

    /// Stop the timer and start an operation that replaces the session.
    fn begin(&mut self, state: AgentState) -> u64 {
        self.stop_timer();
        self.generation += 1;
        self.state = state;
        self.generation
    }
}

impl XrpcAgent {
    /// Create an agent from an explicit client and resolver.
    pub fn new(client: XrpcClient, resolver: Arc<dyn IdentityResolver>, config: AgentConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));

        Self {
            inner: Arc::new(AgentInner {
                client,
                resolver,
                config,
                shared: Mutex::new(AgentShared {
                    session: None,
                    state: AgentState::Anonymous,
                    timer: None,
                    generation: 0,
                    timer_epoch: 0,
                }),
                refreshing: Mutex::new(()),
                installing: Mutex::new(()),
                events,
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Create an agent with a default client, resolver and configuration.
    pub fn with_defaults() -> Result<Self> {
        let client = XrpcClient::new()?;
        let resolver = XrpcResolver::new(client.clone(), ResolverOptions::default())?;
        Ok(Self::new(client, Arc::new(resolver), AgentConfig::default()))
    }

    /// Returns the identity resolver used for login.
    pub fn resolver(&self) -> &Arc<dyn IdentityResolver> {
        &self.inner.resolver
    }

    /// Returns the agent configuration.
    pub fn config(&self) -> &AgentConfig {
        &self.inner.config
    }

    /// Subscribe to lifecycle events.
    ///
    /// Only events sent after subscribing are received.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Returns a snapshot of the current session.
    pub async fn session(&self) -> Option<SessionData> {
        self.inner.shared.lock().await.session.clone()
    }

    /// Returns the DID of the current session.
    pub async fn did(&self) -> Option<Did> {
        self.inner
            .shared
            .lock()
            .await
            .session
            .as_ref()
            .map(|s| s.did.clone())
    }

    /// Returns the current lifecycle state.
    pub async fn state(&self) -> AgentState {
        let shared = self.inner.shared.lock().await;
        let expired = shared
            .session
            .as_ref()
            .and_then(SessionData::expires_at)
            .is_some_and(|exp| exp <= Utc::now());

        match shared.state {
            AgentState::Authenticated if expired => AgentState::Expired,
            state => state,
        }
    }

    /// Returns true if a session with a live access token is installed.
    pub async fn is_authenticated(&self) -> bool {
        matches!(
            self.state().await,
            AgentState::Authenticated | AgentState::Refreshing
        )
    }

    /// Returns when the next background refresh is due, if one is armed.
    pub async fn refresh_scheduled_at(&self) -> Option<DateTime<Utc>> {
        self.inner.shared.lock().await.timer.as_ref().map(|t| t.due)
    }

    /// Stop the refresh timer and cancel all in-flight operations.
    ///
    /// Operations started afterwards fail with [`Error::Cancelled`].
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
    }

    /// Log in with credentials.
    ///
    /// Without an explicit `service` the identifier must be a handle or DID;
    /// it is resolved to its PDS first. Resolution misses and server refusals
    /// come back as the inner `Err`. A token issued for another account or
    /// service is a fatal [`AuthError::TokenValidation`].
    ///
    /// Concurrent logins run one after another; the last to finish owns the
    /// session.
    #[instrument(skip(self, credentials, cancel), fields(identifier = credentials.identifier()))]
    pub async fn login(
        &self,
        credentials: &Credentials,
        service: Option<PdsUrl>,
        cancel: &CancellationToken,
    ) -> Result<Exchange<SessionData>> {
        let inner = &self.inner;
        let _serial = inner
            .cancellable(cancel, async { Ok(inner.installing.lock().await) })
            .await?;
        let generation = inner.shared.lock().await.begin(AgentState::Authenticating);

        let outcome = inner.login_exchange(credentials, service, cancel).await;

        let mut guard = inner.shared.lock().await;
        let shared = &mut *guard;
        let session = match outcome {
            Ok(Ok(session)) => session,
            other => {
                AgentInner::settle(inner, shared, generation);
                return other;
            }
        };

        if shared.generation != generation {
            debug!("Login superseded by a concurrent session change");
            return Err(Error::Cancelled);
        }

        shared.session = Some(session.clone());
        shared.state = AgentState::Authenticated;
        AgentInner::arm(inner, shared);
        drop(guard);

        info!(did = %session.did, "Logged in");
        if let (Some(service), Some(access_token), Some(refresh_token)) = (
            session.service.clone(),
            session.access_token.clone(),
            session.refresh_token.clone(),
        ) {
            inner.emit(SessionEvent::Created {
                did: session.did.clone(),
                service,
                handle: session.handle.clone(),
                access_token,
                refresh_token,
            });
        }

        Ok(Ok(session))
    }

    /// Exchange the refresh token for a new token pair.
    ///
    /// `refresh_token` and `service` override the session's own values. On a
    /// server refusal the previous tokens stay in place, a
    /// [`SessionEvent::RefreshFailed`] is published and the refusal is
    /// returned as the inner `Err`.
    #[instrument(skip_all)]
    pub async fn refresh_session(
        &self,
        refresh_token: Option<RefreshToken>,
        service: Option<PdsUrl>,
        cancel: &CancellationToken,
    ) -> Result<Exchange<SessionData>> {
        AgentInner::refresh(&self.inner, refresh_token, service, None, cancel).await
    }

    /// Restore a persisted session.
    ///
    /// The access token is reused if it has more than the configured reuse
    /// threshold left and the PDS confirms it; otherwise the refresh token is
    /// exchanged. Returns `false` if neither works. A session resolving to a
    /// DID other than `did` is a fatal [`AuthError::SessionRestoration`].
    #[instrument(skip(self, access_token, refresh_token, cancel), fields(%did, %service))]
    pub async fn restore_session(
        &self,
        did: &Did,
        access_token: Option<AccessToken>,
        refresh_token: RefreshToken,
        service: PdsUrl,
        cancel: &CancellationToken,
    ) -> Result<bool> {
        let inner = &self.inner;
        let _serial = inner
            .cancellable(cancel, async { Ok(inner.installing.lock().await) })
            .await?;
        let generation = inner.shared.lock().await.begin(AgentState::Authenticating);

        let outcome = inner
            .restore_exchange(did, access_token, refresh_token, &service, cancel)
            .await;

        let mut guard = inner.shared.lock().await;
        let shared = &mut *guard;
        let (session, refreshed) = match outcome {
            Ok(Some(restored)) => restored,
            Ok(None) => {
                if shared.generation == generation {
                    shared.stop_timer();
                    shared.state = match shared.session {
                        Some(_) => AgentState::Authenticated,
                        None => AgentState::Anonymous,
                    };
                }
                return Ok(false);
            }
            Err(e) => {
                AgentInner::settle(inner, shared, generation);
                return Err(e);
            }
        };

        if shared.generation != generation {
            debug!("Restore superseded by a concurrent session change");
            return Err(Error::Cancelled);
        }

        shared.session = Some(session.clone());
        shared.state = AgentState::Authenticated;
        AgentInner::arm(inner, shared);
        drop(guard);

        info!(refreshed, "Session restored");
        if refreshed {
            inner.emit_refreshed(&session);
        }
        Ok(true)
    }

    /// Install a persisted session without contacting the PDS.
    ///
    /// The caller is responsible for the tokens being valid. The refresh
    /// timer is armed if the session can be refreshed.
    pub async fn resume_session(&self, session: SessionData) {
        let mut guard = self.inner.shared.lock().await;
        let shared = &mut *guard;
        shared.begin(AgentState::Authenticated);
        info!(did = %session.did, "Session resumed");
        shared.session = Some(session);
        AgentInner::arm(&self.inner, shared);
    }

    /// End the session.
    ///
    /// The session must carry a refresh token and a service; otherwise this
    /// fails with [`AuthError::InvalidSessionConfiguration`] before any
    /// network call. Local state is cleared even if the PDS refuses, and the
    /// refusal is returned afterwards.
    #[instrument(skip_all)]
    pub async fn logout(&self, cancel: &CancellationToken) -> Result<()> {
        let inner = &self.inner;

        let (did, service, refresh_token, generation) = {
            let shared = inner.shared.lock().await;
            let Some(SessionData {
                did,
                service: Some(service),
                refresh_token: Some(refresh_token),
                ..
            }) = shared.session.as_ref()
            else {
                let missing = SessionConfigurationError::missing_from(
                    shared.session.as_ref(),
                    SessionConfigurationError::LOGOUT,
                );
                return Err(AuthError::InvalidSessionConfiguration(missing).into());
            };
            (
                did.clone(),
                service.clone(),
                refresh_token.clone(),
                shared.generation,
            )
        };

        info!(%did, "Logging out");
        let pds = XrpcPds::new(inner.client.clone(), service.clone());
        let remote = inner
            .cancellable(cancel, pds.delete_session(&refresh_token))
            .await;

        {
            let mut shared = inner.shared.lock().await;
            if shared.generation == generation {
                shared.stop_timer();
                shared.session = None;
                shared.generation += 1;
                shared.state = AgentState::LoggedOut;
            }
        }
        inner.emit(SessionEvent::Ended { did, service });

        if let Err(e) = &remote {
            warn!(error = %e, "Remote session deletion failed; local session cleared");
        }
        remote
    }

    /// Replace the session tokens.
    ///
    /// Both tokens must validate against the session's DID and service. On
    /// rejection the previous tokens are kept.
    #[instrument(skip_all)]
    pub async fn set_tokens(
        &self,
        access_token: AccessToken,
        refresh_token: RefreshToken,
    ) -> Result<()> {
        let mut guard = self.inner.shared.lock().await;
        let shared = &mut *guard;

        let Some(session) = shared.session.as_mut() else {
            return Err(AuthError::AuthenticationRequired.into());
        };
        let Some(service) = session.service.as_ref() else {
            return Err(AuthError::InvalidSessionConfiguration(
                SessionConfigurationError::MISSING_SERVICE,
            )
            .into());
        };

        validate_token("access", access_token.as_str(), &session.did, service)?;
        validate_token("refresh", refresh_token.as_str(), &session.did, service)?;

        session.access_token = Some(access_token);
        session.refresh_token = Some(refresh_token);
        info!(did = %session.did, "Session tokens replaced");

        shared.generation += 1;
        shared.state = AgentState::Authenticated;
        AgentInner::arm(&self.inner, shared);
        Ok(())
    }
}

impl Drop for XrpcAgent {
    fn drop(&mut self) {
        self.inner.shutdown.cancel();
    }
}

impl std::fmt::Debug for XrpcAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XrpcAgent")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl AgentInner {
    fn emit(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            trace!("No event subscribers");
        }
    }

    fn emit_refreshed(&self, session: &SessionData) {
        if let (Some(service), Some(access_token), Some(refresh_token)) = (
            session.service.clone(),
            session.access_token.clone(),
            session.refresh_token.clone(),
        ) {
            self.emit(SessionEvent::Refreshed {
                did: session.did.clone(),
                service,
                access_token,
                refresh_token,
            });
        }
    }

    /// Run `operation` unless `cancel` or the agent shutdown fires first.
    async fn cancellable<T>(
        &self,
        cancel: &CancellationToken,
        operation: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            _ = self.shutdown.cancelled() => Err(Error::Cancelled),
            result = operation => result,
        }
    }

    /// Arm the refresh timer for the installed session.
    fn arm(this: &Arc<Self>, shared: &mut AgentShared) {
        shared.stop_timer();

        let Some(session) = shared.session.as_ref() else {
            return;
        };
        if session.refresh_token.is_none() || session.service.is_none() {
            debug!("Session cannot be refreshed; timer not armed");
            return;
        }

        let now = Utc::now();
        let remaining = session
            .access_token
            .as_ref()
            .map(|t| t.time_to_expiry(now))
            .unwrap_or_else(TimeDelta::zero);

        let delay = match refresh_schedule(
            remaining,
            this.config.refresh_margin,
            this.config.refresh_interval,
        ) {
            RefreshSchedule::Immediate => {
                debug!("Access token near expiry; refreshing now");
                Duration::ZERO
            }
            RefreshSchedule::After(delay) => delay,
        };

        let cancel = this.shutdown.child_token();
        let due = now + TimeDelta::from_std(delay).unwrap_or_else(|_| TimeDelta::zero());
        let task = tokio::spawn(Self::fire(
            Arc::downgrade(this),
            cancel.clone(),
            delay,
            shared.timer_epoch,
        ));

        debug!(%due, "Refresh timer armed");
        shared.timer = Some(RefreshTimer {
            cancel,
            due,
            _task: task,
        });
    }

    /// Return to a steady state after a refresh, or after an operation failed
    /// or was cancelled.
    ///
    /// The timer is rearmed for the session that is still installed, unless
    /// its access token is already inside the refresh margin. After a failure
    /// an immediate retry would only repeat it; after a success the PDS is
    /// issuing tokens shorter than the margin and rearming would spin.
    fn settle(this: &Arc<Self>, shared: &mut AgentShared, generation: u64) {
        if shared.generation != generation {
            return;
        }

        let Some(session) = shared.session.as_ref() else {
            shared.state = AgentState::Anonymous;
            return;
        };

        shared.state = AgentState::Authenticated;
        let remaining = session
            .access_token
            .as_ref()
            .map(|t| t.time_to_expiry(Utc::now()))
            .and_then(|r| r.to_std().ok())
            .unwrap_or(Duration::ZERO);

        if remaining < this.config.refresh_margin {
            warn!("Access token near expiry; refresh timer left disarmed");
            shared.stop_timer();
        } else {
            Self::arm(this, shared);
        }
    }

    /// Body of the one-shot refresh timer.
    async fn fire(agent: Weak<Self>, cancel: CancellationToken, delay: Duration, epoch: u64) {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(delay) => {}
        }

        let Some(inner) = agent.upgrade() else {
            return;
        };

        {
            let mut shared = inner.shared.lock().await;
            if cancel.is_cancelled() || shared.timer_epoch != epoch {
                return;
            }
            // Detach so the refresh below does not stop its own timer
            shared.timer = None;
        }

        match Self::refresh(&inner, None, None, Some(epoch), &cancel).await {
            Ok(Ok(_)) => debug!("Background refresh succeeded"),
            Ok(Err(e)) => warn!(error = %e, "Background refresh refused"),
            Err(Error::Cancelled) => debug!("Background refresh cancelled"),
            Err(e) => warn!(error = %e, "Background refresh failed"),
        }
    }

    async fn login_exchange(
        &self,
        credentials: &Credentials,
        service: Option<PdsUrl>,
        cancel: &CancellationToken,
    ) -> Result<Exchange<SessionData>> {
        let (expected, service) = match service {
            Some(service) => (None, service),
            None => {
                let identifier = AtIdentifier::new(credentials.identifier())?;

                let did = self
                    .cancellable(cancel, self.resolver.resolve_identifier(&identifier))
                    .await?;
                let Some(did) = did else {
                    warn!(%identifier, "Identifier did not resolve");
                    return Ok(Err(ProtocolError::new(
                        404,
                        Some(HANDLE_NOT_RESOLVABLE.to_string()),
                        Some(format!("unable to resolve {}", identifier)),
                    )));
                };

                let service = self
                    .cancellable(cancel, self.resolver.resolve_service_endpoint(&did))
                    .await?;
                let Some(service) = service else {
                    warn!(%did, "No PDS found");
                    return Ok(Err(ProtocolError::new(
                        404,
                        Some(PDS_NOT_RESOLVABLE.to_string()),
                        Some(format!("no personal data server listed for {}", did)),
                    )));
                };

                (Some(did), service)
            }
        };

        debug!(%service, "Creating session");
        let pds = XrpcPds::new(self.client.clone(), service.clone());
        let response = match self.cancellable(cancel, pds.create_session(credentials)).await {
            Ok(response) => response,
            Err(Error::Protocol(e)) => {
                warn!(error = %e, "Login refused");
                return Ok(Err(e));
            }
            Err(e) => return Err(e),
        };

        let did = Did::new(response.did.clone())?;
        if let Some(expected) = expected.filter(|expected| *expected != did) {
            return Err(AuthError::TokenValidation {
                reason: format!("server returned a session for {} instead of {}", did, expected),
            }
            .into());
        }

        session_from_response(did, service, response).map(Ok)
    }

    async fn restore_exchange(
        &self,
        did: &Did,
        access_token: Option<AccessToken>,
        refresh_token: RefreshToken,
        service: &PdsUrl,
        cancel: &CancellationToken,
    ) -> Result<Option<(SessionData, bool)>> {
        let pds = XrpcPds::new(self.client.clone(), service.clone());

        if let Some(access_token) = access_token {
            let remaining = access_token
                .time_to_expiry(Utc::now())
                .to_std()
                .unwrap_or(Duration::ZERO);
            let reusable = remaining > self.config.restore_reuse_threshold
                && TokenValidator::validate(access_token.as_str(), did, service);

            if reusable {
                match self.cancellable(cancel, pds.get_session(&access_token)).await {
                    Ok(info) => {
                        ensure_same_account(did, &info.did)?;
                        let handle = Handle::new(info.handle).ok();
                        let session = SessionData::new(
                            did.clone(),
                            handle,
                            service.clone(),
                            access_token,
                            refresh_token,
                        );
                        return Ok(Some((session, false)));
                    }
                    Err(Error::Cancelled) => return Err(Error::Cancelled),
                    Err(e) => debug!(error = %e, "Access token probe failed; refreshing"),
                }
            } else {
                debug!("Access token not reusable; refreshing");
            }
        }

        let response = match self.cancellable(cancel, pds.refresh_session(&refresh_token)).await {
            Ok(response) => response,
            Err(Error::Cancelled) => return Err(Error::Cancelled),
            Err(e) => {
                warn!(error = %e, "Session could not be restored");
                return Ok(None);
            }
        };

        ensure_same_account(did, &response.did)?;
        session_from_response(did.clone(), service.clone(), response)
            .map(|session| Some((session, true)))
    }

    /// Exchange the refresh token. `timer_epoch` is set when the refresh
    /// timer is the caller; the refresh is then skipped if the timer was
    /// stopped or rearmed while it waited for the previous refresh.
    async fn refresh(
        this: &Arc<Self>,
        refresh_token: Option<RefreshToken>,
        service: Option<PdsUrl>,
        timer_epoch: Option<u64>,
        cancel: &CancellationToken,
    ) -> Result<Exchange<SessionData>> {
        let _serial = this.refreshing.lock().await;

        let (did, refresh_token, service, generation) = {
            let mut guard = this.shared.lock().await;
            let shared = &mut *guard;

            if timer_epoch.is_some_and(|epoch| epoch != shared.timer_epoch) {
                debug!("Timer refresh superseded");
                return Err(Error::Cancelled);
            }

            let Some(session) = shared.session.as_ref() else {
                this.emit(SessionEvent::RefreshFailed {
                    errors: SessionConfigurationError::NULL_SESSION,
                    did: None,
                    service,
                    status: None,
                    error: None,
                });
                return Err(AuthError::AuthenticationRequired.into());
            };

            let refresh_token = refresh_token.or_else(|| session.refresh_token.clone());
            let service = service.or_else(|| session.service.clone());
            let (Some(refresh_token), Some(service)) = (refresh_token, service) else {
                let missing = session.missing()
                    & (SessionConfigurationError::MISSING_REFRESH_TOKEN
                        | SessionConfigurationError::MISSING_SERVICE);
                this.emit(SessionEvent::RefreshFailed {
                    errors: missing,
                    did: Some(session.did.clone()),
                    service: session.service.clone(),
                    status: None,
                    error: None,
                });
                return Err(AuthError::InvalidSessionConfiguration(missing).into());
            };

            let did = session.did.clone();
            shared.stop_timer();
            shared.state = AgentState::Refreshing;
            (did, refresh_token, service, shared.generation)
        };

        info!(%did, "Refreshing session");
        let pds = XrpcPds::new(this.client.clone(), service.clone());
        // The new access token must still name the session DID as its subject
        let outcome = this
            .cancellable(cancel, pds.refresh_session(&refresh_token))
            .await
            .and_then(|response| session_from_response(did.clone(), service.clone(), response));

        let mut guard = this.shared.lock().await;
        let shared = &mut *guard;

        let refreshed = match outcome {
            Ok(refreshed) => refreshed,
            Err(e) => {
                Self::settle(this, shared, generation);
                drop(guard);
                return this.refresh_failed(did, service, e);
            }
        };

        if shared.generation != generation {
            debug!("Refresh superseded by a concurrent session change");
            return Err(Error::Cancelled);
        }
        let Some(session) = shared.session.as_mut() else {
            return Err(Error::Cancelled);
        };

        session.access_token = refreshed.access_token;
        session.refresh_token = refreshed.refresh_token;
        session.service = refreshed.service;
        if refreshed.handle.is_some() {
            session.handle = refreshed.handle;
        }
        let snapshot = session.clone();

        Self::settle(this, shared, generation);
        drop(guard);

        info!(did = %snapshot.did, "Session refreshed");
        this.emit_refreshed(&snapshot);
        Ok(Ok(snapshot))
    }

    /// Publish a failed refresh and split it into refusal or fatal error.
    fn refresh_failed(&self, did: Did, service: PdsUrl, error: Error) -> Result<Exchange<SessionData>> {
        if matches!(error, Error::Cancelled) {
            return Err(error);
        }

        warn!(error = %error, "Session refresh failed");
        let protocol = match &error {
            Error::Protocol(e) => Some(e.clone()),
            _ => None,
        };
        self.emit(SessionEvent::RefreshFailed {
            errors: SessionConfigurationError::empty(),
            did: Some(did),
            service: Some(service),
            status: error.status(),
            error: protocol,
        });

        match error {
            Error::Protocol(e) => Ok(Err(e)),
            other => Err(other),
        }
    }
}

/// Build a session from a create or refresh response, validating its tokens.
fn session_from_response(did: Did, service: PdsUrl, response: SessionResponse) -> Result<SessionData> {
    let access_token = AccessToken::new(response.access_jwt);
    let refresh_token = RefreshToken::new(response.refresh_jwt);
    validate_token("access", access_token.as_str(), &did, &service)?;

    let handle = Handle::new(response.handle).ok();
    Ok(SessionData::new(
        did,
        handle,
        service,
        access_token,
        refresh_token,
    ))
}

fn validate_token(kind: &str, token: &str, did: &Did, service: &PdsUrl) -> Result<()> {
    TokenValidator::check(token, did, service)
        .map(|_| ())
        .map_err(|rejection| {
            AuthError::TokenValidation {
                reason: format!("{} token: {}", kind, rejection),
            }
            .into()
        })
}

fn ensure_same_account(expected: &Did, actual: &str) -> Result<()> {
    if actual == expected.as_str() {
        Ok(())
    } else {
        Err(AuthError::SessionRestoration {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
        .into())
    }
}

//! Rate-limited dispatcher
//!
//! The `Dispatcher` owns the session: the connected socket, the session key
//! and the instant the last request/response cycle ended. It is the only place
//! that paces requests and the only place that decides whether a response lets
//! the run continue.

use crate::config::{Credentials, NetworkConfig};
use crate::mask::FieldMask;
use crate::progress::{ProgressProvider, ProgressUpdate, SharedProvider};
use crate::protocol::error::{ProtocolError, Result};
use crate::protocol::messages::auth::session_token_from;
use crate::protocol::messages::{
    AuthCommand, Command, FileCommand, FileRecord, LogoutCommand, PingCommand, ProtocolResponse,
};
use crate::protocol::transport::SessionChannel;
use crate::queue::WorkItem;
use crate::shutdown::Shutdown;
use log::{debug, trace, warn};
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use tokio::time::{Instant, sleep};

static CREDENTIALS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"user=(?:[^&]|&amp;)*&pass=(?:[^&]|&amp;)*&").expect("valid credentials pattern")
});

/// Mask every `user=...&pass=...&` segment of an encoded command
pub fn redact_credentials(encoded: &str) -> String {
    CREDENTIALS
        .replace_all(encoded, "user=******&pass=******&")
        .into_owned()
}

/// Enforces the minimum gap between rate-limited requests
#[derive(Debug)]
struct RateLimiter {
    /// End of the previous request/response cycle
    last_request: Option<Instant>,
    min_delay: Duration,
}

impl RateLimiter {
    fn new(min_delay: Duration) -> Self {
        Self {
            last_request: None,
            min_delay,
        }
    }

    /// Time still to wait before the next rate-limited request
    fn remaining(&self) -> Option<Duration> {
        let elapsed = self.last_request?.elapsed();
        self.min_delay
            .checked_sub(elapsed)
            .filter(|wait| !wait.is_zero())
    }

    fn record(&mut self) {
        self.last_request = Some(Instant::now());
    }

    fn idle_for(&self) -> Duration {
        self.last_request
            .map(|last| last.elapsed())
            .unwrap_or_default()
    }
}

/// Sole owner of the AniDB session
pub struct Dispatcher {
    channel: SessionChannel,
    limiter: RateLimiter,
    session: Option<String>,
    client_name: String,
    client_version: String,
    shutdown: Shutdown,
    progress: SharedProvider,
}

impl Dispatcher {
    /// Open the session channel
    ///
    /// A failure here sets Abort like any other dispatcher error.
    pub async fn connect(
        config: &NetworkConfig,
        shutdown: Shutdown,
        progress: SharedProvider,
    ) -> Result<Self> {
        let channel = match SessionChannel::open(config).await {
            Ok(channel) => channel,
            Err(e) => {
                shutdown.abort();
                return Err(e);
            }
        };

        Ok(Self {
            channel,
            limiter: RateLimiter::new(config.request_delay()),
            session: None,
            client_name: config.client_name.clone(),
            client_version: config.client_version.clone(),
            shutdown,
            progress,
        })
    }

    /// Send one command and classify the reply
    ///
    /// Any error, and any status outside the continuation set, sets Abort.
    pub async fn send(&mut self, command: &Command) -> Result<ProtocolResponse> {
        let result = self.exchange(command).await.and_then(|response| {
            match response.to_error() {
                Some(err) => Err(err),
                None => Ok(response),
            }
        });

        if let Err(e) = &result {
            warn!("{} failed: {e}", command.name());
            self.shutdown.abort();
        }
        result
    }

    /// Pace, send, receive and decode without classifying
    async fn exchange(&mut self, command: &Command) -> Result<ProtocolResponse> {
        let redacted = command.redacted();
        debug!("Sending {redacted}");
        self.progress.report(ProgressUpdate::Request {
            command: redacted,
        });

        if !command.skips_rate_limit() && let Some(delay) = self.limiter.remaining() {
            trace!("Rate limiter: waiting {delay:?}");
            self.progress.report(ProgressUpdate::Waiting { delay });
            sleep(delay).await;
        }

        let sent = self.channel.send(command.encode().as_bytes()).await;
        let received = match sent {
            Ok(()) => self.channel.recv().await,
            Err(e) => Err(e),
        };
        self.limiter.record();

        let response = ProtocolResponse::parse(&received?)?;
        debug!("Received {} {}", response.code, response.message);
        self.progress.report(ProgressUpdate::Response {
            code: response.code,
            message: response.message.clone(),
        });

        Ok(response)
    }

    /// AUTH and store the session key
    pub async fn authenticate(&mut self, credentials: &Credentials) -> Result<String> {
        let command = Command::Auth(
            AuthCommand::new(
                credentials.user.as_str(),
                credentials.pass.clone(),
                self.client_name.as_str(),
                self.client_version.as_str(),
            )
            .with_nat(),
        );

        let response = self.send(&command).await?;

        match session_token_from(&response.message) {
            Some(token) => {
                debug!("Authenticated, session established");
                self.session = Some(token.to_string());
                Ok(token.to_string())
            }
            None => {
                self.shutdown.abort();
                Err(ProtocolError::authentication_failed(format!(
                    "no session key in response {} {}",
                    response.code, response.message
                )))
            }
        }
    }

    /// FILE lookup for one work item, decoded against `mask`
    pub async fn lookup_file(&mut self, item: &WorkItem, mask: &FieldMask) -> Result<FileRecord> {
        let Some(session) = self.session.as_deref() else {
            self.shutdown.abort();
            return Err(ProtocolError::NotAuthenticated);
        };

        let command = Command::File(
            FileCommand::by_hash(item.size, item.ed2k.as_str())
                .with_masks(mask)
                .with_session(session),
        );

        let response = self.send(&command).await?;
        Ok(FileRecord::decode(&response.message, mask.fields()))
    }

    /// Keep-alive
    pub async fn ping(&mut self) -> Result<()> {
        self.send(&Command::Ping(PingCommand::new())).await?;
        Ok(())
    }

    /// Best-effort LOGOUT; the reply is logged and never classified
    pub async fn logout(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };

        match self
            .exchange(&Command::Logout(LogoutCommand::new(session)))
            .await
        {
            Ok(response) => debug!("Logout: {} {}", response.code, response.message),
            Err(e) => warn!("Logout failed: {e}"),
        }
    }

    /// Time since the last request/response cycle ended
    pub fn idle_for(&self) -> Duration {
        self.limiter.idle_for()
    }

    /// Current session key, if authenticated
    pub fn session(&self) -> Option<&str> {
        self.session.as_deref()
    }

    /// Log out if a session exists, then release the socket
    pub async fn close(mut self) {
        self.logout().await;
        debug!("Closing session channel to {}", self.channel.server_addr());
    }
}

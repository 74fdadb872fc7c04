//! Command dispatch wrapper
//!
//! `Command` is the closed set of requests the dispatcher can put on the wire.

use crate::protocol::client::redact_credentials;
use crate::protocol::messages::{
    AniDBCommand, AuthCommand, FileCommand, LogoutCommand, PingCommand,
};

/// Any request the renamer sends
#[derive(Debug, Clone)]
pub enum Command {
    Auth(AuthCommand),
    Logout(LogoutCommand),
    Ping(PingCommand),
    File(FileCommand),
}

impl Command {
    fn inner(&self) -> &dyn AniDBCommand {
        match self {
            Command::Auth(cmd) => cmd,
            Command::Logout(cmd) => cmd,
            Command::Ping(cmd) => cmd,
            Command::File(cmd) => cmd,
        }
    }

    /// Command name as sent on the wire
    pub fn name(&self) -> &str {
        self.inner().name()
    }

    /// Wire form of the command
    pub fn encode(&self) -> String {
        self.inner().encode()
    }

    /// Wire form with credentials masked, safe for diagnostics
    pub fn redacted(&self) -> String {
        match self {
            Command::Auth(cmd) => cmd.encode_redacted(),
            other => redact_credentials(&other.encode()),
        }
    }

    /// AUTH, PING and LOGOUT go out without waiting for the request delay
    pub fn skips_rate_limit(&self) -> bool {
        self.inner().skips_rate_limit()
    }
}

impl From<AuthCommand> for Command {
    fn from(cmd: AuthCommand) -> Self {
        Command::Auth(cmd)
    }
}

impl From<LogoutCommand> for Command {
    fn from(cmd: LogoutCommand) -> Self {
        Command::Logout(cmd)
    }
}

impl From<PingCommand> for Command {
    fn from(cmd: PingCommand) -> Self {
        Command::Ping(cmd)
    }
}

impl From<FileCommand> for Command {
    fn from(cmd: FileCommand) -> Self {
        Command::File(cmd)
    }
}

//! SSH transport for shop sessions: a russh server whose connections each drive one
//! terminal session over their pty.

mod connection;
mod host_key;
mod input;
mod server;
mod shell;
mod terminal;

pub use crate::connection::{Connection, key_fingerprint, parse_command};
pub use crate::host_key::{HostKey, HostKeyError};
pub use crate::input::parse_keys;
pub use crate::server::{ServerOptions, SshServer};
pub use crate::shell::{ShellOptions, run_shell};
pub use crate::terminal::{ChannelWriter, RemoteTerminal, TerminalEvent};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SshError {
    #[error(transparent)]
    HostKey(#[from] HostKeyError),

    #[error("failed to encode client public key: {0}")]
    PublicKey(#[source] russh::keys::ssh_key::Error),

    #[error("ssh protocol error: {0}")]
    Russh(#[from] russh::Error),

    #[error("failed to listen for ssh connections: {0}")]
    Listen(#[source] std::io::Error),

    #[error("failed to write to the client terminal: {0}")]
    Output(#[source] std::io::Error),
}

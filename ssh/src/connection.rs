use std::net::SocketAddr;

use md5::{Digest, Md5};
use russh::keys::PublicKey;
use russh::server::{Auth, Handle, Handler, Msg, Response, Session};
use russh::{Channel, ChannelId, CryptoVec, Pty};
use shopterm_tui::{Identity, Services};
use tokio::sync::mpsc;
use tracing::{Instrument, Span, debug, info, info_span, warn};

use crate::SshError;
use crate::input::parse_keys;
use crate::shell::{ShellOptions, run_shell};
use crate::terminal::TerminalEvent;

const PTY_REQUIRED: &str = "this shop needs an interactive terminal, try `ssh -t`\r\n";

/// One client connection: authentication, its session channel and the running shell.
pub struct Connection {
    services: Services,
    identity: Identity,
    span: Span,
    channel: Option<ChannelId>,
    pty: Option<(u16, u16)>,
    events: Option<mpsc::UnboundedSender<TerminalEvent>>,
}

impl Connection {
    pub fn new(services: Services, peer: Option<SocketAddr>) -> Self {
        let id = cuid2::create_id();
        let span = info_span!("connection", %id, peer = ?peer);
        span.in_scope(|| info!("client connected"));
        Self {
            services,
            identity: Identity {
                client_ip: peer.map(|peer| peer.ip().to_string()),
                ..Identity::default()
            },
            span,
            channel: None,
            pty: None,
            events: None,
        }
    }

    fn send(&self, event: TerminalEvent) {
        if let Some(events) = &self.events {
            if events.send(event).is_err() {
                debug!(parent: &self.span, "input after shell exit");
            }
        }
    }

    /// Start the shell on `channel`, or turn the client away if it has no pty.
    fn start(&mut self, channel: ChannelId, command: Vec<String>, handle: Handle) {
        let Some((width, height)) = self.pty else {
            self.span.in_scope(|| warn!("no pty requested"));
            tokio::spawn(async move {
                let _ = handle.data(channel, CryptoVec::from_slice(PTY_REQUIRED.as_bytes())).await;
                close(&handle, channel, 1).await;
            });
            return;
        };

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        self.events = Some(events_tx);
        let identity = Identity {
            command,
            ..self.identity.clone()
        };
        let options = ShellOptions {
            services: self.services.clone(),
            identity,
            width,
            height,
        };

        tokio::spawn(
            async move {
                let (output_tx, output_rx) = mpsc::unbounded_channel();
                let writer = tokio::spawn(forward_output(handle.clone(), channel, output_rx));
                let status = match run_shell(options, events_rx, output_tx).await {
                    Ok(()) => 0,
                    Err(error) => {
                        warn!(%error, "shell failed");
                        1
                    }
                };
                let _ = writer.await;
                close(&handle, channel, status).await;
                info!(status, "shell closed");
            }
            .instrument(self.span.clone()),
        );
    }
}

async fn forward_output(
    handle: Handle,
    channel: ChannelId,
    mut output: mpsc::UnboundedReceiver<Vec<u8>>,
) {
    while let Some(chunk) = output.recv().await {
        if handle.data(channel, CryptoVec::from_slice(&chunk)).await.is_err() {
            debug!("channel closed while writing");
            break;
        }
    }
}

async fn close(handle: &Handle, channel: ChannelId, status: u32) {
    let _ = handle.exit_status_request(channel, status).await;
    let _ = handle.eof(channel).await;
    let _ = handle.close(channel).await;
}

/// Stable identifier for a client key: hex MD5 of its wire encoding, the form
/// `ssh-keygen -l -E md5` prints without colons.
pub fn key_fingerprint(key: &PublicKey) -> Result<String, SshError> {
    let bytes = key.to_bytes().map_err(SshError::PublicKey)?;
    Ok(hex::encode(Md5::digest(&bytes)))
}

/// Split an exec request into words, as a shell would for `ssh host cart`.
pub fn parse_command(data: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(data)
        .split_whitespace()
        .map(str::to_owned)
        .collect()
}

fn cells(value: u32) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

impl Handler for Connection {
    type Error = SshError;

    async fn auth_publickey(&mut self, user: &str, key: &PublicKey) -> Result<Auth, Self::Error> {
        self.identity.fingerprint = key_fingerprint(key)?;
        self.identity.anonymous = false;
        self.span.in_scope(|| {
            info!(user, fingerprint = %self.identity.fingerprint, "public key accepted");
        });
        Ok(Auth::Accept)
    }

    async fn auth_keyboard_interactive<'a>(
        &'a mut self,
        user: &str,
        _submethods: &str,
        _response: Option<Response<'a>>,
    ) -> Result<Auth, Self::Error> {
        self.identity.fingerprint = cuid2::create_id();
        self.identity.anonymous = true;
        self.span.in_scope(|| info!(user, "anonymous client accepted"));
        Ok(Auth::Accept)
    }

    async fn channel_open_session(
        &mut self,
        channel: Channel<Msg>,
        _session: &mut Session,
    ) -> Result<bool, Self::Error> {
        if self.channel.is_some() {
            return Ok(false);
        }
        self.channel = Some(channel.id());
        Ok(true)
    }

    #[allow(clippy::too_many_arguments)]
    async fn pty_request(
        &mut self,
        channel: ChannelId,
        term: &str,
        col_width: u32,
        row_height: u32,
        _pix_width: u32,
        _pix_height: u32,
        _modes: &[(Pty, u32)],
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        let size = (cells(col_width), cells(row_height));
        self.span
            .in_scope(|| debug!(term, width = size.0, height = size.1, "pty requested"));
        self.pty = Some(size);
        session.channel_success(channel)?;
        Ok(())
    }

    async fn shell_request(
        &mut self,
        channel: ChannelId,
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        session.channel_success(channel)?;
        self.start(channel, Vec::new(), session.handle());
        Ok(())
    }

    async fn exec_request(
        &mut self,
        channel: ChannelId,
        data: &[u8],
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        let command = parse_command(data);
        self.span.in_scope(|| info!(?command, "exec requested"));
        session.channel_success(channel)?;
        self.start(channel, command, session.handle());
        Ok(())
    }

    async fn data(
        &mut self,
        _channel: ChannelId,
        data: &[u8],
        _session: &mut Session,
    ) -> Result<(), Self::Error> {
        for key in parse_keys(data) {
            self.send(TerminalEvent::Key(key));
        }
        Ok(())
    }

    async fn window_change_request(
        &mut self,
        _channel: ChannelId,
        col_width: u32,
        row_height: u32,
        _pix_width: u32,
        _pix_height: u32,
        _session: &mut Session,
    ) -> Result<(), Self::Error> {
        let (width, height) = (cells(col_width), cells(row_height));
        self.pty = Some((width, height));
        self.send(TerminalEvent::Resize { width, height });
        Ok(())
    }

    async fn channel_close(
        &mut self,
        _channel: ChannelId,
        _session: &mut Session,
    ) -> Result<(), Self::Error> {
        self.events = None;
        Ok(())
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.span.in_scope(|| info!("client disconnected"));
    }
}

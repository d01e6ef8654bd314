use shopterm_tui::{Dispatcher, Identity, Msg, Services, Session};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::SshError;
use crate::terminal::{ChannelWriter, RemoteTerminal, TerminalEvent};

/// Everything one interactive session needs from its connection.
#[derive(Debug)]
pub struct ShellOptions {
    pub services: Services,
    pub identity: Identity,
    pub width: u16,
    pub height: u16,
}

/// Drive one session until the user quits or the client goes away.
///
/// This loop is the only owner of the session. Command results and client input are
/// folded in one message at a time, and the screen is redrawn after each.
#[tracing::instrument(skip_all)]
pub async fn run_shell(
    options: ShellOptions,
    mut events: mpsc::UnboundedReceiver<TerminalEvent>,
    output: mpsc::UnboundedSender<Vec<u8>>,
) -> Result<(), SshError> {
    let ShellOptions {
        services,
        identity,
        width,
        height,
    } = options;

    let mut terminal =
        RemoteTerminal::enter(ChannelWriter::new(output), width, height).map_err(SshError::Output)?;
    let mut session = Session::new(services, identity, width, height);
    let (mut dispatcher, mut results) = Dispatcher::new();
    dispatcher.dispatch(session.init());
    terminal.draw(&session).map_err(SshError::Output)?;

    loop {
        let msg = tokio::select! {
            Some(msg) = results.recv() => msg,
            event = events.recv() => match event {
                Some(TerminalEvent::Key(key)) => Msg::Key(key),
                Some(TerminalEvent::Resize { width, height }) => {
                    terminal.resize(width, height).map_err(SshError::Output)?;
                    Msg::Resize { width, height }
                }
                None => {
                    debug!("client input closed");
                    return Ok(());
                }
            },
        };

        let (next, commands) = session.update(msg);
        session = next;
        if session.is_quitting() {
            break;
        }
        dispatcher.dispatch(commands);
        terminal.draw(&session).map_err(SshError::Output)?;
    }

    info!(in_flight = dispatcher.in_flight(), "session finished");
    terminal.leave().map_err(SshError::Output)?;
    Ok(())
}

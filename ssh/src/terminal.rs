use std::io::{self, Write};

use crossterm::cursor::Hide;
use crossterm::event::KeyEvent;
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::{Terminal, TerminalOptions, Viewport};
use tokio::sync::mpsc;

/// Input from the client side of a session channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalEvent {
    Key(KeyEvent),
    Resize { width: u16, height: u16 },
}

/// Buffers rendered output and hands it off as one chunk per flush, in order, to the
/// task that writes it to the SSH channel.
#[derive(Debug)]
pub struct ChannelWriter {
    sink: Vec<u8>,
    sender: mpsc::UnboundedSender<Vec<u8>>,
}

impl ChannelWriter {
    pub fn new(sender: mpsc::UnboundedSender<Vec<u8>>) -> Self {
        Self {
            sink: Vec::new(),
            sender,
        }
    }
}

impl Write for ChannelWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.sink.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.sink.is_empty() {
            return Ok(());
        }
        let chunk = std::mem::take(&mut self.sink);
        self.sender
            .send(chunk)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "ssh channel closed"))
    }
}

/// A ratatui terminal drawing over an SSH channel.
///
/// The viewport is fixed to the client's pty size; the host's own terminal is never
/// consulted.
pub struct RemoteTerminal {
    terminal: Terminal<CrosstermBackend<ChannelWriter>>,
}

impl RemoteTerminal {
    pub fn enter(writer: ChannelWriter, width: u16, height: u16) -> io::Result<Self> {
        let backend = CrosstermBackend::new(writer);
        let mut terminal = Terminal::with_options(
            backend,
            TerminalOptions {
                viewport: Viewport::Fixed(Rect::new(0, 0, width, height)),
            },
        )?;
        execute!(terminal.backend_mut(), EnterAlternateScreen, Hide)?;
        Ok(Self { terminal })
    }

    pub fn resize(&mut self, width: u16, height: u16) -> io::Result<()> {
        execute!(self.terminal.backend_mut(), Clear(ClearType::All))?;
        self.terminal.resize(Rect::new(0, 0, width, height))
    }

    pub fn draw(&mut self, session: &shopterm_tui::Session) -> io::Result<()> {
        self.terminal
            .draw(|frame| shopterm_tui::draw(frame, session))?;
        Ok(())
    }

    pub fn leave(mut self) -> io::Result<()> {
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flush_sends_one_chunk() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut writer = ChannelWriter::new(tx);
        writer.write_all(b"hello ").unwrap();
        writer.write_all(b"world").unwrap();
        assert!(rx.try_recv().is_err());

        writer.flush().unwrap();
        assert_eq!(rx.try_recv().unwrap(), b"hello world");
        writer.flush().unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn closed_channel_is_a_broken_pipe() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let mut writer = ChannelWriter::new(tx);
        writer.write_all(b"x").unwrap();
        let error = writer.flush().unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn enter_and_leave_toggle_the_alternate_screen() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let terminal = RemoteTerminal::enter(ChannelWriter::new(tx), 80, 24).unwrap();
        let entered = rx.try_recv().unwrap();
        assert!(String::from_utf8_lossy(&entered).contains("\x1b[?1049h"));

        terminal.leave().unwrap();
        let left = rx.try_recv().unwrap();
        assert!(String::from_utf8_lossy(&left).contains("\x1b[?1049l"));
    }
}

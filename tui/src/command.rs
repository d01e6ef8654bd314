use std::fmt;
use std::future::Future;
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, trace};

use crate::msg::Msg;

/// A unit of asynchronous work that yields exactly one message.
pub struct Command {
    label: &'static str,
    future: BoxFuture<'static, Msg>,
}

impl Command {
    pub fn new<F>(label: &'static str, future: F) -> Self
    where
        F: Future<Output = Msg> + Send + 'static,
    {
        Self {
            label,
            future: future.boxed(),
        }
    }

    /// Run `future` once `delay` has elapsed.
    pub fn after<F>(label: &'static str, delay: Duration, future: F) -> Self
    where
        F: Future<Output = Msg> + Send + 'static,
    {
        Self::new(label, async move {
            tokio::time::sleep(delay).await;
            future.await
        })
    }

    /// A command that resolves immediately.
    pub fn message(label: &'static str, msg: Msg) -> Self {
        Self::new(label, async move { msg })
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub async fn run(self) -> Msg {
        self.future.await
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Command").field(&self.label).finish()
    }
}

/// Runs commands on the tokio runtime and feeds their results back to the session loop.
///
/// Outstanding commands are aborted when the dispatcher is dropped.
pub struct Dispatcher {
    tx: mpsc::UnboundedSender<Msg>,
    tasks: JoinSet<()>,
}

impl Dispatcher {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Msg>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let dispatcher = Self {
            tx,
            tasks: JoinSet::new(),
        };
        (dispatcher, rx)
    }

    pub fn dispatch(&mut self, commands: Vec<Command>) {
        while self.tasks.try_join_next().is_some() {}

        for command in commands {
            let tx = self.tx.clone();
            let label = command.label();
            trace!(command = label, "dispatch");
            self.tasks.spawn(async move {
                let msg = command.run().await;
                if tx.send(msg).is_err() {
                    debug!(command = label, "session closed before command completed");
                }
            });
        }
    }

    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn results_arrive_in_completion_order() {
        let (mut dispatcher, mut rx) = Dispatcher::new();
        dispatcher.dispatch(vec![
            Command::after("slow", Duration::from_millis(40), async {
                Msg::Resize {
                    width: 1,
                    height: 1,
                }
            }),
            Command::message(
                "fast",
                Msg::Resize {
                    width: 2,
                    height: 2,
                },
            ),
        ]);

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert!(matches!(first, Msg::Resize { width: 2, .. }));
        assert!(matches!(second, Msg::Resize { width: 1, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_command_waits() {
        let start = tokio::time::Instant::now();
        let msg = Command::after("tick", Duration::from_secs(1), async {
            Msg::SplashDelayElapsed
        })
        .run()
        .await;
        assert!(matches!(msg, Msg::SplashDelayElapsed));
        assert!(start.elapsed() >= Duration::from_secs(1));
    }
}

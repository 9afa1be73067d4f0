use std::ops::ControlFlow;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use socklog_logs::LogStore;

/// A user command typed on stdin
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Control {
    /// Show only entries containing the text
    Search(String),
    ClearSearch,
    Pause,
    Resume,
    TogglePause,
    /// Drop every stored entry
    Clear,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ControlError {
    #[error("unknown command '/{0}' (try /search, /pause, /resume, /toggle, /clear, /quit)")]
    Unknown(String),
    #[error("'/{0}' takes no argument")]
    UnexpectedArgument(String),
}

impl Control {
    /// Parse one input line
    ///
    /// Blank lines yield `None`. Text without a leading `/` is a search.
    pub fn parse(line: &str) -> Result<Option<Self>, ControlError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let Some(command) = line.strip_prefix('/') else {
            return Ok(Some(Self::Search(line.to_string())));
        };

        let (name, rest) = match command.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (command, ""),
        };

        let control = match name {
            "search" | "s" if rest.is_empty() => Self::ClearSearch,
            "search" | "s" => Self::Search(rest.to_string()),
            "pause" => Self::Pause,
            "resume" => Self::Resume,
            "toggle" | "p" => Self::TogglePause,
            "clear" => Self::Clear,
            "quit" | "q" => Self::Quit,
            _ => return Err(ControlError::Unknown(name.to_string())),
        };

        if !rest.is_empty() && !matches!(control, Self::Search(_)) {
            return Err(ControlError::UnexpectedArgument(name.to_string()));
        }
        Ok(Some(control))
    }

    /// Apply to the store; `Break` means exit
    pub fn apply(&self, store: &LogStore) -> ControlFlow<()> {
        match self {
            Self::Search(text) => store.set_search(text),
            Self::ClearSearch => store.set_search(""),
            Self::Pause => store.set_paused(true),
            Self::Resume => store.set_paused(false),
            Self::TogglePause => {
                store.toggle_pause();
            }
            Self::Clear => store.clear(),
            Self::Quit => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }
}

/// Reads controls from stdin on a background task
pub struct ControlReader {
    receiver: mpsc::UnboundedReceiver<Control>,
    cancel: CancellationToken,
}

impl ControlReader {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(tokio::io::stdin()).lines();

                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => break,

                        line = lines.next_line() => match line {
                            Ok(Some(line)) => match Control::parse(&line) {
                                Ok(Some(control)) => {
                                    if sender.send(control).is_err() {
                                        break;
                                    }
                                }
                                Ok(None) => {}
                                Err(e) => warn!("{}", e),
                            },
                            Ok(None) => {
                                debug!("stdin closed, controls disabled");
                                break;
                            }
                            Err(e) => {
                                warn!("failed to read stdin: {}", e);
                                break;
                            }
                        },
                    }
                }
            });
        }

        Self { receiver, cancel }
    }

    /// Next control; `None` once stdin is closed
    pub async fn recv(&mut self) -> Option<Control> {
        self.receiver.recv().await
    }
}

impl Drop for ControlReader {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

use crossterm::event::{self, Event as CEvent, KeyEvent, KeyEventKind};
use std::{io, sync::mpsc, thread, time::Duration};

pub(crate) enum Event<I> {
    Input(I),
    Tick,
    /// SIGINT delivered from outside the terminal.
    Interrupt,
}

/// A small event handler that wraps crossterm input, tick and interrupt
/// events. Input and ticks are each produced on their own thread and
/// returned to a common `Receiver`.
pub(crate) struct Events {
    rx: mpsc::Receiver<Event<KeyEvent>>,
    _input_handle: thread::JoinHandle<()>,
    _tick_handle: thread::JoinHandle<()>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Config {
    pub(crate) tick_rate: Duration,
}

/// Sends key presses until the receiver goes away or the terminal stops
/// producing events.
fn forward_input(
    mut read: impl FnMut() -> io::Result<CEvent>,
    tx: &mpsc::Sender<Event<KeyEvent>>,
) {
    loop {
        match read() {
            Ok(CEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                if let Err(err) = tx.send(Event::Input(key)) {
                    tracing::debug!(%err, "input receiver dropped");
                    return;
                }
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(%err, "failed to read terminal event");
                return;
            }
        }
    }
}

impl Events {
    pub(crate) fn with_config(config: Config) -> Result<Self, ctrlc::Error> {
        let (tx, rx) = mpsc::channel();

        {
            let tx = tx.clone();
            ctrlc::set_handler(move || {
                let _ = tx.send(Event::Interrupt);
            })?;
        }

        Ok(Self {
            rx,
            _input_handle: {
                let tx = tx.clone();
                thread::spawn(move || forward_input(event::read, &tx))
            },
            _tick_handle: {
                thread::spawn(move || loop {
                    if tx.send(Event::Tick).is_err() {
                        break;
                    }
                    thread::sleep(config.tick_rate);
                })
            },
        })
    }

    pub(crate) fn next(&self) -> Result<Event<KeyEvent>, mpsc::RecvError> {
        self.rx.recv()
    }
}

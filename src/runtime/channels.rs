//! Channel type definitions for session communication
//!
//! A session talks to its UI over two channels:
//! - **Input channel** (mpsc): user messages and shutdown, into the session task
//! - **Output channel** (broadcast): stream chunks, out to every subscriber

use tokio::sync::{broadcast, mpsc};

use crate::core::{InputMessage, OutputChunk};

/// Default buffer size for input channel
pub const INPUT_CHANNEL_SIZE: usize = 32;

/// Default buffer size for output broadcast channel
pub const OUTPUT_CHANNEL_SIZE: usize = 1024;

/// Sender half of the input channel (used by SessionHandle)
pub type InputSender = mpsc::Sender<InputMessage>;

/// Receiver half of the input channel (used by SessionInternals)
pub type InputReceiver = mpsc::Receiver<InputMessage>;

/// Sender half of the output broadcast channel (used by SessionInternals)
pub type OutputSender = broadcast::Sender<OutputChunk>;

/// Receiver half of the output broadcast channel (used by subscribers)
pub type OutputReceiver = broadcast::Receiver<OutputChunk>;

/// Create a new input channel pair
pub fn create_input_channel() -> (InputSender, InputReceiver) {
    mpsc::channel(INPUT_CHANNEL_SIZE)
}

/// Create a new output broadcast channel.
///
/// Receivers are created by calling `sender.subscribe()`.
pub fn create_output_channel() -> OutputSender {
    let (tx, _) = broadcast::channel(OUTPUT_CHANNEL_SIZE);
    tx
}

/// Create both input and output channels for one session
pub fn create_session_channels() -> (InputSender, InputReceiver, OutputSender) {
    let (input_tx, input_rx) = create_input_channel();
    let output_tx = create_output_channel();
    (input_tx, input_rx, output_tx)
}

//! Terminal rendering for `polypuff run`.

use std::io::Write;

use agent::{ChatState, TurnOutcome};
use proto::{Action, ActionPayload, ImageRef, MessageStatus, StreamEvent};

pub fn format_run_header(prompt: &str) -> String {
    format!("polypuff run: {prompt}\n")
}

/// One-line summary of a wallet action.
pub fn format_action(action: &Action) -> String {
    let kind = action.kind().as_str();
    match &action.payload {
        ActionPayload::SignTransaction(tx) => format!(
            "[action:{kind}] to={} chain={} value={}",
            tx.to,
            tx.chain_id,
            tx.value.as_deref().unwrap_or("0")
        ),
        ActionPayload::SignSwap(swap) => format!(
            "[action:{kind}] to={} chain={}",
            swap.transaction.to, swap.transaction.chain_id
        ),
        ActionPayload::MonitorTransaction(monitor) => {
            format!("[action:{kind}] transaction={}", monitor.transaction_id)
        }
    }
}

pub fn format_image(image: &ImageRef) -> String {
    format!("[image] {} ({}x{})", image.url, image.width, image.height)
}

/// Streams turn events to a writer as they arrive.
///
/// Deltas are written inline; thinking labels, actions and images go on their
/// own lines.
pub struct TurnPrinter<W: Write> {
    out: W,
    mid_line: bool,
    last_label: Option<String>,
}

impl<W: Write> TurnPrinter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            mid_line: false,
            last_label: None,
        }
    }

    fn line(&mut self, text: &str) -> std::io::Result<()> {
        if self.mid_line {
            writeln!(self.out)?;
            self.mid_line = false;
        }
        writeln!(self.out, "{text}")
    }

    pub fn on_event(&mut self, event: &StreamEvent, state: &ChatState) -> std::io::Result<()> {
        match event {
            StreamEvent::Presence { .. } => {
                let label = state.thinking.label.clone();
                if state.thinking.active && label != self.last_label {
                    if let Some(label) = &label {
                        self.line(&format!("… {label}"))?;
                    }
                    self.last_label = label;
                }
            }
            StreamEvent::Delta { text: Some(text) } => {
                write!(self.out, "{text}")?;
                self.mid_line = !text.ends_with('\n');
            }
            StreamEvent::Action(action) => self.line(&format_action(action))?,
            StreamEvent::Image(image) => self.line(&format_image(image))?,
            _ => {}
        }
        self.out.flush()
    }

    /// Writes the closing line; failed turns print the error notice.
    pub fn finish(&mut self, outcome: &TurnOutcome, state: &ChatState) -> std::io::Result<()> {
        if outcome.status == MessageStatus::Error {
            let notice = state
                .message(outcome.message_id)
                .and_then(|m| m.content.rsplit_once("❌ Error: "))
                .map(|(_, notice)| notice.to_string())
                .unwrap_or_default();
            self.line(&format!("error: {notice}"))?;
        } else if self.mid_line {
            writeln!(self.out)?;
            self.mid_line = false;
        }
        self.out.flush()
    }
}

//! Streaming scan API: the same pipeline, delivered as events.
//!
//! [`scan_stream`] runs [`Scanner::process_scan`] on a spawned task and turns
//! its progress callbacks into a `Stream` of [`ScanEvent`]s, ending with
//! exactly one [`ScanEvent::Finished`]. Useful for UIs that already consume
//! streams and do not want to implement [`ScanProgressCallback`].
//!
//! Dropping the stream does not cancel the scan; the task runs to completion
//! and its remaining events are discarded.

use crate::error::CardScanError;
use crate::output::ScanOutput;
use crate::pipeline::input::RawImage;
use crate::progress::{ScanProgressCallback, ScanStage};
use crate::scan::Scanner;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::Stream;
use tracing::debug;

/// One event from a running scan.
#[derive(Debug)]
pub enum ScanEvent {
    Stage(ScanStage),
    /// Overall progress, 0–100, non-decreasing.
    Progress(f32),
    /// The scan outcome. Always the last event.
    Finished(Result<ScanOutput, CardScanError>),
}

pub type ScanEventStream = Pin<Box<dyn Stream<Item = ScanEvent> + Send>>;

struct ChannelCallback {
    tx: mpsc::UnboundedSender<ScanEvent>,
}

impl ScanProgressCallback for ChannelCallback {
    fn on_stage(&self, stage: ScanStage) {
        let _ = self.tx.send(ScanEvent::Stage(stage));
    }

    fn on_progress(&self, percent: f32) {
        let _ = self.tx.send(ScanEvent::Progress(percent));
    }
}

/// Scan `image`, streaming stage and progress events as they happen.
///
/// Must be called from within a Tokio runtime.
///
/// # Example
/// ```rust,no_run
/// use cardscan::{scan_stream, RawImage, ScanConfig, ScanEvent, Scanner};
/// use futures::StreamExt;
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let scanner = Arc::new(Scanner::from_config(&ScanConfig::default())?);
/// let image = RawImage::Encoded(std::fs::read("card.jpg")?);
/// let mut events = scan_stream(scanner, image);
/// while let Some(event) = events.next().await {
///     match event {
///         ScanEvent::Stage(s) => eprintln!("{s}"),
///         ScanEvent::Progress(p) => eprintln!("{p:.0}%"),
///         ScanEvent::Finished(Ok(out)) => println!("{} candidates", out.cards.len()),
///         ScanEvent::Finished(Err(e)) => eprintln!("{e}"),
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub fn scan_stream(scanner: Arc<Scanner>, image: RawImage) -> ScanEventStream {
    let (tx, rx) = mpsc::unbounded_channel();
    let callback = Arc::new(ChannelCallback { tx: tx.clone() });

    tokio::spawn(async move {
        let result = scanner.process_scan(&image, Some(callback)).await;
        if tx.send(ScanEvent::Finished(result)).is_err() {
            debug!("Scan stream dropped before the scan finished");
        }
    });

    Box::pin(UnboundedReceiverStream::new(rx))
}

//! Asynchronous image dimension probes.
//!
//! An [`ImageProbe`] resolves an image reference to its intrinsic pixel
//! dimensions. Probes never surface errors to their consumers: every probe
//! settles to a [`ProbeOutcome`], either `Resolved` with the real dimensions
//! or `Fallback`, which stands for a 300×200 image (aspect ratio 1.5).
//!
//! ## Discarding results
//!
//! [`spawn_probe`] runs the probe as its own task and hands back a
//! [`PendingProbe`]. The pending probe can be awaited once, which consumes
//! it, so there is at most one observed outcome per probe. Dropping it
//! instead is always safe: the task still finishes and its result is
//! silently thrown away. There is no hard cancellation.
//!
//! ## Progressive display
//!
//! [`load_progressive`] shows a low-resolution placeholder first, then swaps
//! in the full-resolution asset with a cross-fade. The swap goes through
//! [`DisplaySlot::swap_if_current`], which compares the [`DisplayToken`]
//! issued when the placeholder was shown against the slot's current
//! generation, so a slow full-resolution probe never overwrites a view that
//! has since moved on.

use std::future::Future;
use std::io::Cursor;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::oneshot;

/// Dimensions substituted for any probe that fails.
pub const FALLBACK_DIMENSIONS: Dimensions = Dimensions {
    width: 300,
    height: 200,
};

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode error: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Unusable image: {0}")]
    Unusable(String),
}

/// Intrinsic pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Dimensions of one artwork's image together with its aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageDimension {
    pub width: u32,
    pub height: u32,
    /// `width / height`
    pub aspect_ratio: f64,
}

impl From<Dimensions> for ImageDimension {
    fn from(d: Dimensions) -> Self {
        Self {
            width: d.width,
            height: d.height,
            aspect_ratio: f64::from(d.width) / f64::from(d.height),
        }
    }
}

/// How a probe settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Resolved(Dimensions),
    Fallback,
}

impl ProbeOutcome {
    /// Turn a raw probe result into an outcome. Zero-sized images count as
    /// failures since they have no usable aspect ratio.
    pub fn settle(reference: &str, result: Result<Dimensions, ProbeError>) -> Self {
        match result {
            Ok(d) if d.width > 0 && d.height > 0 => Self::Resolved(d),
            Ok(d) => {
                tracing::debug!(reference, ?d, "zero-sized image, using fallback");
                Self::Fallback
            }
            Err(err) => {
                tracing::debug!(reference, %err, "probe failed, using fallback");
                Self::Fallback
            }
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    pub fn dimensions(&self) -> Dimensions {
        match self {
            Self::Resolved(d) => *d,
            Self::Fallback => FALLBACK_DIMENSIONS,
        }
    }

    pub fn dimension(&self) -> ImageDimension {
        self.dimensions().into()
    }
}

/// Future returned by [`ImageProbe::probe`].
pub type ProbeFuture = Pin<Box<dyn Future<Output = Result<Dimensions, ProbeError>> + Send>>;

/// Resolves image references to dimensions.
///
/// The returned future must not borrow from `self` so that it can run as an
/// independent task.
pub trait ImageProbe: Send + Sync {
    fn probe(&self, reference: &str) -> ProbeFuture;
}

/// Probe for images stored under a directory, decoding only the headers.
#[derive(Debug, Clone)]
pub struct FsProbe {
    root: PathBuf,
}

impl FsProbe {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ImageProbe for FsProbe {
    fn probe(&self, reference: &str) -> ProbeFuture {
        let path = self.root.join(reference);
        Box::pin(async move {
            let bytes = tokio::fs::read(&path).await?;
            let (width, height) = image::ImageReader::new(Cursor::new(bytes))
                .with_guessed_format()?
                .into_dimensions()?;
            if width == 0 || height == 0 {
                return Err(ProbeError::Unusable(format!(
                    "{} has zero size",
                    path.display()
                )));
            }
            Ok(Dimensions { width, height })
        })
    }
}

/// A probe running as its own task.
#[derive(Debug)]
pub struct PendingProbe {
    reference: String,
    receiver: oneshot::Receiver<ProbeOutcome>,
}

impl PendingProbe {
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Wait for the probe to settle.
    pub async fn settled(self) -> ProbeOutcome {
        match self.receiver.await {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::warn!(reference = %self.reference, "probe task ended without a result");
                ProbeOutcome::Fallback
            }
        }
    }
}

/// Start probing `reference` on the current tokio runtime.
pub fn spawn_probe<P: ImageProbe + ?Sized>(probe: &P, reference: &str) -> PendingProbe {
    let (sender, receiver) = oneshot::channel();
    let future = probe.probe(reference);
    let task_reference = reference.to_string();
    tokio::spawn(async move {
        let outcome = ProbeOutcome::settle(&task_reference, future.await);
        if sender.send(outcome).is_err() {
            tracing::debug!(reference = %task_reference, "probe result discarded");
        }
    });
    PendingProbe {
        reference: reference.to_string(),
        receiver,
    }
}

/// Identifies one `show` on a [`DisplaySlot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayToken(u64);

/// The image currently presented in a slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Displayed {
    pub reference: String,
    pub dimension: ImageDimension,
    pub full_resolution: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossFade {
    pub duration_ms: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapOutcome {
    /// The full-resolution image replaced the placeholder.
    Swapped(CrossFade),
    /// The slot moved on; the result was dropped.
    Stale,
    /// The full-resolution probe failed; the placeholder stays.
    Kept,
}

/// A place where one image is displayed, e.g. the detail view.
#[derive(Debug, Default)]
pub struct DisplaySlot {
    generation: u64,
    current: Option<Displayed>,
}

impl DisplaySlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&Displayed> {
        self.current.as_ref()
    }

    /// Display a placeholder, invalidating every earlier token.
    pub fn show(&mut self, reference: &str, dimension: ImageDimension) -> DisplayToken {
        self.generation += 1;
        self.current = Some(Displayed {
            reference: reference.to_string(),
            dimension,
            full_resolution: false,
        });
        DisplayToken(self.generation)
    }

    pub fn is_current(&self, token: DisplayToken) -> bool {
        token.0 == self.generation && self.current.is_some()
    }

    /// Swap in the full-resolution image if `token` is still current.
    pub fn swap_if_current(
        &mut self,
        token: DisplayToken,
        reference: &str,
        dimension: ImageDimension,
        crossfade_ms: u32,
    ) -> SwapOutcome {
        if !self.is_current(token) {
            tracing::debug!(reference, "display moved on, dropping full-resolution image");
            return SwapOutcome::Stale;
        }
        self.current = Some(Displayed {
            reference: reference.to_string(),
            dimension,
            full_resolution: true,
        });
        SwapOutcome::Swapped(CrossFade {
            duration_ms: crossfade_ms,
        })
    }

    /// Empty the slot, invalidating every outstanding token.
    pub fn clear(&mut self) {
        self.generation += 1;
        self.current = None;
    }
}

/// Lock a mutex, taking over the data of a poisoned one.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Show `placeholder` as soon as it is probed, then swap in `full` when its
/// probe succeeds and the slot still shows this placeholder.
///
/// Both probes start immediately; the lock is only held while touching the
/// slot.
pub async fn load_progressive<P: ImageProbe + ?Sized>(
    probe: &P,
    slot: &Mutex<DisplaySlot>,
    placeholder: &str,
    full: &str,
    crossfade_ms: u32,
) -> SwapOutcome {
    let full_probe = spawn_probe(probe, full);
    let placeholder_outcome = spawn_probe(probe, placeholder).settled().await;
    let token = lock(slot).show(placeholder, placeholder_outcome.dimension());

    match full_probe.settled().await {
        ProbeOutcome::Resolved(d) => lock(slot).swap_if_current(token, full, d.into(), crossfade_ms),
        ProbeOutcome::Fallback if lock(slot).is_current(token) => SwapOutcome::Kept,
        ProbeOutcome::Fallback => SwapOutcome::Stale,
    }
}

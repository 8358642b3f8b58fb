//! Containers that overlay elements are attached to.

use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

use super::element::OverlayElement;

/// A display container that owns overlay elements.
///
/// `append` returns a handle the renderer later passes back to `remove`.
/// Removing a handle that is no longer attached is a no-op.
pub trait OverlaySurface {
    type Handle;

    fn append(&mut self, element: &OverlayElement) -> Self::Handle;

    fn remove(&mut self, handle: Self::Handle);
}

/// In-memory surface that keeps attached elements in insertion order.
#[derive(Debug, Default)]
pub struct MemorySurface {
    next_id: u64,
    attached: Vec<(u64, OverlayElement)>,
    appends: usize,
    removals: usize,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Elements currently attached, in insertion order.
    pub fn elements(&self) -> impl Iterator<Item = &OverlayElement> {
        self.attached.iter().map(|(_, e)| e)
    }

    pub fn len(&self) -> usize {
        self.attached.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attached.is_empty()
    }

    /// Total `append` calls since creation.
    pub fn append_count(&self) -> usize {
        self.appends
    }

    /// Total `remove` calls that detached an element.
    pub fn removal_count(&self) -> usize {
        self.removals
    }
}

impl OverlaySurface for MemorySurface {
    type Handle = u64;

    fn append(&mut self, element: &OverlayElement) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.appends += 1;
        self.attached.push((id, element.clone()));
        id
    }

    fn remove(&mut self, handle: u64) {
        if let Some(pos) = self.attached.iter().position(|(id, _)| *id == handle) {
            self.attached.remove(pos);
            self.removals += 1;
        }
    }
}

/// A surface shared between the loop that draws on it and a renderer
/// that reads it.
#[derive(Debug, Default)]
pub struct SharedSurface<S> {
    inner: Arc<Mutex<S>>,
}

impl<S> Clone for SharedSurface<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> SharedSurface<S> {
    pub fn new(surface: S) -> Self {
        Self {
            inner: Arc::new(Mutex::new(surface)),
        }
    }

    /// Run `f` with the surface locked.
    pub fn with<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

impl SharedSurface<MemorySurface> {
    /// Copy of the attached elements, in insertion order.
    pub fn snapshot(&self) -> Vec<OverlayElement> {
        self.with(|s| s.elements().cloned().collect())
    }
}

impl<S: OverlaySurface> OverlaySurface for SharedSurface<S> {
    type Handle = S::Handle;

    fn append(&mut self, element: &OverlayElement) -> S::Handle {
        self.with(|s| s.append(element))
    }

    fn remove(&mut self, handle: S::Handle) {
        self.with(|s| s.remove(handle))
    }
}

/// Writes each label's text as a line; highlights are not shown.
#[derive(Debug)]
pub struct ConsoleSurface<W: Write> {
    out: W,
}

impl<W: Write> ConsoleSurface<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl ConsoleSurface<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> OverlaySurface for ConsoleSurface<W> {
    type Handle = ();

    fn append(&mut self, element: &OverlayElement) {
        if let OverlayElement::Label(label) = element {
            if let Err(e) = writeln!(self.out, "{}", label.text) {
                log::warn!("failed to write label: {}", e);
            }
        }
    }

    fn remove(&mut self, _handle: ()) {}
}

//! Tracks the elements drawn for the current frame so they can be cleared.

use super::element::OverlayElement;
use super::surface::OverlaySurface;
use crate::model::Detection;

/// Owns every overlay element it has attached to a surface.
///
/// Elements are kept in creation order. `clear` detaches all of them,
/// and only elements this renderer created are ever removed.
pub struct OverlayRenderer<S: OverlaySurface> {
    surface: S,
    retained: Vec<(S::Handle, OverlayElement)>,
}

impl<S: OverlaySurface> OverlayRenderer<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            retained: Vec::new(),
        }
    }

    /// Attach a highlight and then a label for `detection`.
    pub fn add(&mut self, detection: &Detection) {
        for element in OverlayElement::pair_for(detection) {
            let handle = self.surface.append(&element);
            self.retained.push((handle, element));
        }
    }

    /// Detach every retained element. No-op when nothing is retained.
    pub fn clear(&mut self) {
        for (handle, _) in self.retained.drain(..) {
            self.surface.remove(handle);
        }
    }

    /// Number of retained elements (two per rendered detection).
    pub fn len(&self) -> usize {
        self.retained.len()
    }

    pub fn is_empty(&self) -> bool {
        self.retained.is_empty()
    }

    /// Retained elements in creation order.
    pub fn elements(&self) -> impl Iterator<Item = &OverlayElement> {
        self.retained.iter().map(|(_, e)| e)
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::MemorySurface;

    fn det(class: &str, score: f32) -> Detection {
        Detection::new(class, score, [10.0, 20.0, 30.0, 40.0])
    }

    #[test]
    fn test_add_retains_highlight_then_label() {
        let mut renderer = OverlayRenderer::new(MemorySurface::new());
        renderer.add(&det("cat", 0.9));
        renderer.add(&det("dog", 0.7));

        let kinds: Vec<bool> = renderer.elements().map(|e| e.as_highlight().is_some()).collect();
        assert_eq!(kinds, vec![true, false, true, false]);
        assert_eq!(renderer.len(), 4);
        assert_eq!(renderer.surface().len(), 4);
    }

    #[test]
    fn test_clear_detaches_everything() {
        let mut renderer = OverlayRenderer::new(MemorySurface::new());
        renderer.add(&det("cat", 0.9));
        renderer.clear();
        assert!(renderer.is_empty());
        assert!(renderer.surface().is_empty());
    }

    #[test]
    fn test_clear_on_empty_is_noop() {
        let mut renderer = OverlayRenderer::new(MemorySurface::new());
        renderer.clear();
        renderer.clear();
        assert_eq!(renderer.surface().removal_count(), 0);
    }

    #[test]
    fn test_clear_leaves_foreign_elements() {
        let mut surface = MemorySurface::new();
        let foreign = det("tree", 0.99);
        surface.append(&OverlayElement::highlight_for(&foreign));

        let mut renderer = OverlayRenderer::new(surface);
        renderer.add(&det("cat", 0.9));
        renderer.clear();
        assert_eq!(renderer.surface().len(), 1);
    }
}

//! Memoizing image nodes and gamma families.
//!
//! An [`Image`] owns one pixel buffer in a canonical color mode and lazily
//! derives (and keeps) the buffer for every other mode it is asked for.
//! Buffers are never mutated once computed; they are handed out as
//! `Arc<PixelBuffer<f64>>`.
//!
//! Images that show the same content at different transfer curves belong to
//! one [`GammaFamily`], a shared map from gamma to node. The family holds weak
//! references, so nodes still drop as soon as the caller releases them.
//!
//! ```text
//!   decode ──> Image(γ=2.2) ──convert_gamma(1.0)──> Image(γ=1.0)
//!                  │                                   │
//!                  └──────────── GammaFamily ──────────┘
//!                              {2.2 -> w, 1.0 -> w}
//! ```
//!
//! Lock order is family first, then node; no node lock is held while a
//! family lock is taken.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

use crate::buffer::PixelBuffer;
use crate::color::{convert, ColorMode};

/// Exact-match key for a gamma value.
///
/// Two gammas are the same only if their `f64` bits match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct GammaKey(u64);

impl From<f64> for GammaKey {
    fn from(gamma: f64) -> Self {
        GammaKey(gamma.to_bits())
    }
}

/// Shared gamma -> node map of one photographic content.
#[derive(Debug, Default)]
pub struct GammaFamily {
    members: Mutex<HashMap<GammaKey, Weak<Image>>>,
}

impl GammaFamily {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Live node registered for `gamma`, if any.
    #[cfg(test)]
    pub(crate) fn get(&self, gamma: f64) -> Option<Arc<Image>> {
        let members = self.members.lock().unwrap_or_else(PoisonError::into_inner);
        members.get(&GammaKey::from(gamma)).and_then(Weak::upgrade)
    }

    /// Number of live members.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        let members = self.members.lock().unwrap_or_else(PoisonError::into_inner);
        members.values().filter(|w| w.strong_count() > 0).count()
    }

    fn insert(&self, gamma: f64, node: &Arc<Image>) {
        let mut members = self.members.lock().unwrap_or_else(PoisonError::into_inner);
        members.insert(GammaKey::from(gamma), Arc::downgrade(node));
    }

    /// Drop the entry for `gamma` if it still points at `node`.
    fn remove(&self, gamma: f64, node: &Arc<Image>) {
        let mut members = self.members.lock().unwrap_or_else(PoisonError::into_inner);
        let key = GammaKey::from(gamma);
        if members
            .get(&key)
            .is_some_and(|w| std::ptr::eq(w.as_ptr(), Arc::as_ptr(node)))
        {
            members.remove(&key);
        }
    }
}

#[derive(Debug)]
struct NodeState {
    gamma: f64,
    canonical: ColorMode,
    variants: HashMap<ColorMode, Arc<PixelBuffer<f64>>>,
    family: Arc<GammaFamily>,
}

/// One logical image at one gamma, with per-mode memoization.
#[derive(Debug)]
pub struct Image {
    state: RwLock<NodeState>,
}

impl Image {
    /// Create the first node of a new gamma family.
    ///
    /// `buffer` holds `[0, 1]` samples in `mode`, encoded at `gamma`.
    pub fn new(buffer: PixelBuffer<f64>, mode: ColorMode, gamma: f64) -> Arc<Self> {
        Self::with_family(buffer, mode, gamma, GammaFamily::new())
    }

    fn with_family(
        buffer: PixelBuffer<f64>,
        mode: ColorMode,
        gamma: f64,
        family: Arc<GammaFamily>,
    ) -> Arc<Self> {
        let mut variants = HashMap::new();
        variants.insert(mode, Arc::new(buffer));
        let node = Arc::new(Self {
            state: RwLock::new(NodeState {
                gamma,
                canonical: mode,
                variants,
                family: family.clone(),
            }),
        });
        family.insert(gamma, &node);
        node
    }

    pub fn gamma(&self) -> f64 {
        self.read().gamma
    }

    /// Mode of the buffer other modes are derived from.
    pub fn canonical_mode(&self) -> ColorMode {
        self.read().canonical
    }

    /// Handle to this node's gamma family.
    pub fn family(&self) -> Arc<GammaFamily> {
        self.read().family.clone()
    }

    /// Whether the buffer for `mode` has already been computed.
    pub fn is_cached(&self, mode: ColorMode) -> bool {
        self.read().variants.contains_key(&mode)
    }

    /// Buffer in `mode`, computed from the canonical buffer on first access.
    ///
    /// Once RGB has been computed it becomes the canonical mode, so later
    /// conversions take one step instead of two.
    pub fn get(&self, mode: ColorMode) -> Arc<PixelBuffer<f64>> {
        let (canonical, source) = {
            let state = self.read();
            if let Some(buffer) = state.variants.get(&mode) {
                return buffer.clone();
            }
            (state.canonical, state.variants[&state.canonical].clone())
        };

        tracing::trace!(from = %canonical, to = %mode, "computing color variant");
        let computed = Arc::new(convert(&source, canonical, mode));

        let mut state = self.write();
        let entry = state.variants.entry(mode).or_insert(computed).clone();
        if mode == ColorMode::Rgb {
            state.canonical = ColorMode::Rgb;
        }
        entry
    }

    /// Same content re-encoded for `target` gamma.
    ///
    /// Returns the existing family member for `target` if one is alive;
    /// otherwise builds a node whose RGB samples are `rgb ^ (gamma / target)`
    /// and registers it in the shared family.
    pub fn convert_gamma(self: &Arc<Self>, target: f64) -> Arc<Image> {
        let (family, gamma) = {
            let state = self.read();
            (state.family.clone(), state.gamma)
        };

        let mut members = family.members.lock().unwrap_or_else(PoisonError::into_inner);
        let key = GammaKey::from(target);
        if let Some(existing) = members.get(&key).and_then(Weak::upgrade) {
            tracing::trace!(gamma, target, "gamma family hit");
            return existing;
        }

        tracing::trace!(gamma, target, "gamma family miss");
        let exponent = gamma / target;
        let rgb = self.get(ColorMode::Rgb).map(|v| v.powf(exponent));

        let mut variants = HashMap::new();
        variants.insert(ColorMode::Rgb, Arc::new(rgb));
        let node = Arc::new(Self {
            state: RwLock::new(NodeState {
                gamma: target,
                canonical: ColorMode::Rgb,
                variants,
                family: family.clone(),
            }),
        });
        members.insert(key, Arc::downgrade(&node));
        node
    }

    /// Declare the existing samples to be encoded at `target` without
    /// resampling.
    ///
    /// The node leaves its old family, since its pixels no longer match the
    /// siblings' content, and starts a new family containing only itself.
    pub fn reassign_gamma(self: &Arc<Self>, target: f64) {
        let fresh = GammaFamily::new();
        let (old_family, old_gamma) = {
            let mut state = self.write();
            let old_gamma = std::mem::replace(&mut state.gamma, target);
            let old_family = std::mem::replace(&mut state.family, fresh.clone());
            (old_family, old_gamma)
        };
        old_family.remove(old_gamma, self);
        fresh.insert(target, self);
        tracing::debug!(from = old_gamma, to = target, "reassigned gamma");
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, NodeState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, NodeState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

//! Owning wrappers for GPU objects.
//!
//! Every buffer, texture, sampler and pipeline the crate creates is wrapped in
//! a [`GpuHandle`]. The handle is move-only: it derefs to the wgpu object but
//! cannot be cloned, and dropping it releases the GPU object exactly once.
//! Creations and releases are counted per [`ResourceKind`] by a shared
//! [`ResourceLedger`], so a leak shows up as a non-zero live count at
//! shutdown.

use std::{
    fmt,
    ops::Deref,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Buffer,
    Texture,
    Sampler,
    Program,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Buffer,
        ResourceKind::Texture,
        ResourceKind::Sampler,
        ResourceKind::Program,
    ];

    fn index(self) -> usize {
        match self {
            ResourceKind::Buffer => 0,
            ResourceKind::Texture => 1,
            ResourceKind::Sampler => 2,
            ResourceKind::Program => 3,
        }
    }
}

/// A GPU object that can be owned by a [`GpuHandle`].
pub trait GPUResource {
    const KIND: ResourceKind;

    /// Frees the GPU side eagerly. Called once, right before the wrapper drops.
    fn release(&self) {}
}

impl GPUResource for wgpu::Buffer {
    const KIND: ResourceKind = ResourceKind::Buffer;

    fn release(&self) {
        self.destroy();
    }
}

impl GPUResource for wgpu::Texture {
    const KIND: ResourceKind = ResourceKind::Texture;

    fn release(&self) {
        self.destroy();
    }
}

impl GPUResource for wgpu::Sampler {
    const KIND: ResourceKind = ResourceKind::Sampler;
}

impl GPUResource for wgpu::RenderPipeline {
    const KIND: ResourceKind = ResourceKind::Program;
}

#[derive(Default)]
struct Counters {
    created: [AtomicUsize; 4],
    released: [AtomicUsize; 4],
}

/// Shared creation/release counters.
///
/// Cloning the ledger shares the counters.
#[derive(Clone, Default)]
pub struct ResourceLedger {
    counters: Arc<Counters>,
}

impl ResourceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes ownership of `resource` and starts counting it.
    pub fn track<T: GPUResource>(&self, resource: T) -> GpuHandle<T> {
        self.counters.created[T::KIND.index()].fetch_add(1, Ordering::Relaxed);
        GpuHandle {
            resource,
            ledger: self.clone(),
        }
    }

    pub fn created(&self, kind: ResourceKind) -> usize {
        self.counters.created[kind.index()].load(Ordering::Relaxed)
    }

    pub fn released(&self, kind: ResourceKind) -> usize {
        self.counters.released[kind.index()].load(Ordering::Relaxed)
    }

    pub fn live(&self, kind: ResourceKind) -> usize {
        self.created(kind).saturating_sub(self.released(kind))
    }

    pub fn total_live(&self) -> usize {
        ResourceKind::ALL.iter().map(|kind| self.live(*kind)).sum()
    }

    /// Logs the balance; returns `true` when nothing leaked.
    pub fn report(&self) -> bool {
        let live = self.total_live();
        if live == 0 {
            let created: usize = ResourceKind::ALL.iter().map(|k| self.created(*k)).sum();
            log::info!("released all {} GPU handles", created);
            true
        } else {
            for kind in ResourceKind::ALL {
                if self.live(kind) > 0 {
                    log::warn!(
                        "{:?}: {} created, {} released, {} leaked",
                        kind,
                        self.created(kind),
                        self.released(kind),
                        self.live(kind)
                    );
                }
            }
            false
        }
    }

    fn note_release(&self, kind: ResourceKind) {
        self.counters.released[kind.index()].fetch_add(1, Ordering::Relaxed);
    }
}

impl fmt::Debug for ResourceLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_struct("ResourceLedger");
        for kind in ResourceKind::ALL {
            dbg.field(
                &format!("{:?}", kind),
                &(self.created(kind), self.released(kind)),
            );
        }
        dbg.finish()
    }
}

/// Move-only owner of one GPU object.
pub struct GpuHandle<T: GPUResource> {
    resource: T,
    ledger: ResourceLedger,
}

impl<T: GPUResource> Deref for GpuHandle<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.resource
    }
}

impl<T: GPUResource> Drop for GpuHandle<T> {
    fn drop(&mut self) {
        self.resource.release();
        self.ledger.note_release(T::KIND);
    }
}

impl<T: GPUResource + fmt::Debug> fmt::Debug for GpuHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GpuHandle").field(&self.resource).finish()
    }
}

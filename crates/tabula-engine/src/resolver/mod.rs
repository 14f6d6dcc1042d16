//! # Resolver Framework
//!
//! A resolver turns cell text into model data. Every instance goes through
//! one cycle: `prepare_for_reading` once, `process` once per row, `close`
//! once. [`BatchResolver`]s additionally bracket each block with
//! `begin_batch` / `end_batch`.
//!
//! The scanner never probes a resolver's type at runtime: the capability is
//! fixed when the registry creates it, as a [`BoundResolver`] variant.

pub mod buffer;
pub mod context;
pub mod error;
pub mod options;
pub mod registry;

use crate::converter::Converter;
use crate::model::{ItemId, LayerHandle};

pub use buffer::{BufferFull, PositionBuffer};
pub use context::{ProxyContext, ResolverContext};
pub use error::{ErrorKind, ResolverError};
pub use options::ResolverOptions;
pub use registry::ResolverRegistry;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReadMode {
    /// Validate content and collect statistics without storing results.
    Scan,
    /// Store everything.
    #[default]
    Full,
}

/// Source of sizing hints for resolver buffers.
pub trait CacheProvider {
    /// Expected number of rows per block for blocks feeding `layer`.
    fn size_hint(&self, _layer: LayerHandle) -> Option<usize> {
        None
    }
}

/// Provides no hints; buffers grow on demand.
pub struct NoCache;

impl CacheProvider for NoCache {}

/// Everything a resolver receives when it is bound.
#[derive(Clone, Copy)]
pub struct ResolverSetup<'a> {
    pub converter: &'a Converter,
    pub mode: ReadMode,
    pub cache: &'a dyn CacheProvider,
    pub options: &'a ResolverOptions,
}

impl<'a> ResolverSetup<'a> {
    /// The same setup with different options, for nested resolvers.
    pub fn with_options(self, options: &'a ResolverOptions) -> Self {
        Self { options, ..self }
    }
}

pub trait Resolver {
    fn prepare_for_reading(&mut self, setup: &ResolverSetup<'_>) -> Result<(), ResolverError>;

    /// Handles one cell. Returns the item the cell was applied to.
    fn process(&mut self, ctx: &mut dyn ResolverContext) -> Result<Option<ItemId>, ResolverError>;

    /// Releases everything retained since `prepare_for_reading`.
    fn close(&mut self);
}

pub trait BatchResolver: Resolver {
    /// Called when a block's container opens, before any `process`.
    fn begin_batch(&mut self, ctx: &mut dyn ResolverContext) -> Result<(), ResolverError>;

    /// Called after the block's last `process`, with the container holding
    /// every row of the block.
    fn end_batch(&mut self, ctx: &mut dyn ResolverContext) -> Result<(), ResolverError>;
}

pub enum BoundResolver {
    Simple(Box<dyn Resolver>),
    Batch(Box<dyn BatchResolver>),
}

impl BoundResolver {
    pub fn is_batch(&self) -> bool {
        matches!(self, BoundResolver::Batch(_))
    }

    pub fn prepare_for_reading(&mut self, setup: &ResolverSetup<'_>) -> Result<(), ResolverError> {
        match self {
            BoundResolver::Simple(r) => r.prepare_for_reading(setup),
            BoundResolver::Batch(r) => r.prepare_for_reading(setup),
        }
    }

    pub fn process(
        &mut self,
        ctx: &mut dyn ResolverContext,
    ) -> Result<Option<ItemId>, ResolverError> {
        match self {
            BoundResolver::Simple(r) => r.process(ctx),
            BoundResolver::Batch(r) => r.process(ctx),
        }
    }

    pub fn close(&mut self) {
        match self {
            BoundResolver::Simple(r) => r.close(),
            BoundResolver::Batch(r) => r.close(),
        }
    }
}

/// A bound resolver that is closed exactly once, at the latest on drop.
pub struct PreparedResolver {
    inner: BoundResolver,
    closed: bool,
}

impl PreparedResolver {
    /// Binds `resolver` with `setup`. A failed binding still closes the
    /// resolver before the error is returned.
    pub fn prepare(
        mut resolver: BoundResolver,
        setup: &ResolverSetup<'_>,
    ) -> Result<Self, ResolverError> {
        if let Err(err) = resolver.prepare_for_reading(setup) {
            resolver.close();
            return Err(err);
        }
        Ok(Self {
            inner: resolver,
            closed: false,
        })
    }

    pub fn is_batch(&self) -> bool {
        self.inner.is_batch()
    }

    pub fn process(
        &mut self,
        ctx: &mut dyn ResolverContext,
    ) -> Result<Option<ItemId>, ResolverError> {
        self.inner.process(ctx)
    }

    /// No-op for simple resolvers.
    pub fn begin_batch(&mut self, ctx: &mut dyn ResolverContext) -> Result<(), ResolverError> {
        match &mut self.inner {
            BoundResolver::Batch(r) => r.begin_batch(ctx),
            BoundResolver::Simple(_) => Ok(()),
        }
    }

    /// No-op for simple resolvers.
    pub fn end_batch(&mut self, ctx: &mut dyn ResolverContext) -> Result<(), ResolverError> {
        match &mut self.inner {
            BoundResolver::Batch(r) => r.end_batch(ctx),
            BoundResolver::Simple(_) => Ok(()),
        }
    }

    pub fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.inner.close();
        }
    }
}

impl Drop for PreparedResolver {
    fn drop(&mut self) {
        self.close();
    }
}

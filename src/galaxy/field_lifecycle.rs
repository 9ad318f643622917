use super::{GalaxyParameters, PointField};
use crate::error::GalaxyError;

/// Renderer side of a point field: builds a buffer from a field and gives it back.
///
/// `release` consumes the buffer, so a buffer cannot be released twice.
pub trait PointFieldBackend {
    type Buffer;

    fn upload(&mut self, field: &PointField, generation: i32) -> Self::Buffer;

    fn release(&mut self, buffer: Self::Buffer) -> Result<(), GalaxyError>;
}

struct LiveField<B> {
    field: PointField,
    buffer: B,
    generation: i32,
}

/// Owner of the single live point field and the buffer built over it.
pub struct GalaxyField<B> {
    live: Option<LiveField<B>>,
}

impl<B> Default for GalaxyField<B> {
    fn default() -> Self {
        Self { live: None }
    }
}

impl<B> GalaxyField<B> {
    pub fn current(&self) -> Option<&PointField> {
        self.live.as_ref().map(|live| &live.field)
    }

    pub fn buffer(&self) -> Option<&B> {
        self.live.as_ref().map(|live| &live.buffer)
    }

    pub fn generation(&self) -> Option<i32> {
        self.live.as_ref().map(|live| live.generation)
    }

    /// Samples a new field from `params` and installs it in place of the current one.
    /// The new field is fully built before the old buffer is touched.
    pub fn regenerate<P>(
        &mut self,
        params: &GalaxyParameters,
        seed: u64,
        generation: i32,
        backend: &mut P,
    ) -> Result<&PointField, GalaxyError>
    where
        P: PointFieldBackend<Buffer = B>,
    {
        let field = PointField::generate_seeded(params, seed);
        self.install(field, generation, backend)
    }

    /// Releases the previous buffer, then uploads and installs `field`.
    ///
    /// If the release fails the live slot is left empty and the error is returned;
    /// nothing is uploaded.
    pub fn install<P>(
        &mut self,
        field: PointField,
        generation: i32,
        backend: &mut P,
    ) -> Result<&PointField, GalaxyError>
    where
        P: PointFieldBackend<Buffer = B>,
    {
        self.dispose(backend)?;

        let buffer = backend.upload(&field, generation);
        let live = self.live.insert(LiveField {
            field,
            buffer,
            generation,
        });
        Ok(&live.field)
    }

    /// Releases the live field, if any.
    pub fn dispose<P>(&mut self, backend: &mut P) -> Result<(), GalaxyError>
    where
        P: PointFieldBackend<Buffer = B>,
    {
        match self.live.take() {
            Some(previous) => backend.release(previous.buffer),
            None => Ok(()),
        }
    }
}

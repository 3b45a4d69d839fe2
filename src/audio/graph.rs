use crate::{
    foundation::error::{ComposeError, ComposeResult},
    media::traits::{AudioBackend, AudioContext, AudioStream, AudioTap, BranchId},
};

/// One source fed into the mix.
#[derive(Clone, Debug, PartialEq)]
pub struct MixInput {
    /// Live output of a playing element.
    pub tap: AudioTap,
    /// Connected at zero gain.
    pub muted: bool,
    /// A required input that cannot be connected fails the build; any other is skipped.
    pub required: bool,
}

#[derive(Debug)]
struct Branch {
    tap: AudioTap,
    id: BranchId,
    muted: bool,
}

/// Unweighted sum of live audio sources into one destination stream.
///
/// Owns its audio context. [`teardown`](Self::teardown) closes it and is idempotent; dropping
/// the graph tears it down as well.
pub struct MixGraph {
    ctx: Option<Box<dyn AudioContext>>,
    branches: Vec<Branch>,
    output: AudioStream,
}

impl std::fmt::Debug for MixGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MixGraph")
            .field("open", &self.is_open())
            .field("branches", &self.branches)
            .field("output", &self.output)
            .finish()
    }
}

impl MixGraph {
    /// Create a context and connect every input at unit gain (zero when muted).
    ///
    /// Branch indices follow the connected inputs, so an optional input that failed to
    /// connect takes no index.
    pub fn build(backend: &dyn AudioBackend, inputs: &[MixInput]) -> ComposeResult<Self> {
        let ctx = backend.create_context()?;
        let output = ctx.destination();
        let mut graph = Self {
            ctx: Some(ctx),
            branches: Vec::with_capacity(inputs.len()),
            output,
        };
        // An early return drops `graph`, which closes the context.
        for input in inputs {
            let ctx = graph.context_mut()?;
            let id = match ctx.connect(&input.tap) {
                Ok(id) => id,
                Err(e) if !input.required => {
                    tracing::warn!(
                        tap = %input.tap.0,
                        error = %e,
                        "optional audio input not connected, mixing without it"
                    );
                    continue;
                }
                Err(e) => return Err(e),
            };
            if input.muted {
                ctx.set_gain(id, 0.0)?;
            }
            graph.branches.push(Branch {
                tap: input.tap.clone(),
                id,
                muted: input.muted,
            });
        }
        tracing::debug!(branches = graph.branches.len(), "audio mix graph built");
        Ok(graph)
    }

    /// Destination stream handed to the recorder.
    pub fn output(&self) -> &AudioStream {
        &self.output
    }

    /// Number of connected inputs.
    pub fn branch_count(&self) -> usize {
        self.branches.len()
    }

    /// Mute state of branch `index`, if it exists.
    pub fn is_muted(&self, index: usize) -> Option<bool> {
        self.branches.get(index).map(|b| b.muted)
    }

    /// Zero-gain or restore one branch. Playback of the source is unaffected.
    pub fn set_muted(&mut self, index: usize, muted: bool) -> ComposeResult<()> {
        let id = self
            .branches
            .get(index)
            .map(|b| b.id)
            .ok_or_else(|| ComposeError::validation(format!("no audio branch {index}")))?;
        self.context_mut()?
            .set_gain(id, if muted { 0.0 } else { 1.0 })?;
        if let Some(b) = self.branches.get_mut(index) {
            b.muted = muted;
        }
        Ok(())
    }

    /// `false` once the context has been closed.
    pub fn is_open(&self) -> bool {
        self.ctx.is_some()
    }

    /// Close the context. Later calls do nothing.
    pub fn teardown(&mut self) {
        if let Some(mut ctx) = self.ctx.take() {
            ctx.close();
            tracing::debug!(
                taps = ?self.branches.iter().map(|b| &b.tap.0).collect::<Vec<_>>(),
                "audio mix graph closed"
            );
        }
    }

    fn context_mut(&mut self) -> ComposeResult<&mut Box<dyn AudioContext>> {
        self.ctx
            .as_mut()
            .ok_or_else(|| ComposeError::recording("audio graph already torn down"))
    }
}

impl Drop for MixGraph {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/graph.rs"]
mod tests;

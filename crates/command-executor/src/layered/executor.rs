//! Layered executor implementation for runtime command composition.

use super::ExecutionLayer;
use crate::{Command, error::Result, launcher::Launcher};
use async_trait::async_trait;
use tracing::debug;

/// Launcher that applies a series of execution layers before delegating
pub struct LayeredExecutor<L: Launcher> {
    launcher: L,
    layers: Vec<Box<dyn ExecutionLayer>>,
}

impl<L: Launcher> LayeredExecutor<L> {
    /// Create a new layered executor with the given launcher
    pub fn new(launcher: L) -> Self {
        Self {
            launcher,
            layers: Vec::new(),
        }
    }

    /// Add an execution layer to the stack
    pub fn with_layer<Layer: ExecutionLayer + 'static>(mut self, layer: Layer) -> Self {
        self.layers.push(Box::new(layer));
        self
    }

    /// Get the number of layers in the stack
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Get descriptions of all layers for debugging
    pub fn layer_descriptions(&self) -> Vec<String> {
        self.layers
            .iter()
            .map(|layer| layer.description())
            .collect()
    }

    /// Apply every layer, innermost first, without launching anything
    pub fn transform(&self, command: Command) -> Result<Command> {
        self.layers
            .iter()
            .try_fold(command, |cmd, layer| {
                layer
                    .wrap_command(cmd)
                    .map_err(|e| e.with_layer_context(layer.description()))
            })
    }
}

#[async_trait]
impl<L: Launcher> Launcher for LayeredExecutor<L> {
    type EventStream = L::EventStream;
    type Handle = L::Handle;

    async fn launch(&self, command: Command) -> Result<(Self::EventStream, Self::Handle)> {
        let final_command = self.transform(command)?;
        debug!(layers = ?self.layer_descriptions(), "launching layered command");
        self.launcher.launch(final_command).await
    }
}

impl<L: Launcher> std::fmt::Debug for LayeredExecutor<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayeredExecutor")
            .field("layers", &self.layer_descriptions())
            .finish()
    }
}

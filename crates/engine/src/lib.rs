//! Weir Engine - Topology assembly and lifecycle
//!
//! `Stream::build` turns a configuration document into a running topology:
//!
//! ```text
//! input → (input processors) → buffer → pipeline → (output processors) → output
//! ```
//!
//! Each arrow is a bounded transaction channel; each stage owns its driver
//! tasks. `Stream::run` then waits for either natural exhaustion (the input
//! closes and everything drains) or an external shutdown signal, in which
//! case stages are closed top-down - inputs first, outputs last - so every
//! message already read still reaches its terminal before the grace period
//! expires. Stages stuck past the deadline are abandoned after the kill
//! token resolves their open transactions.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error as ThisError;
use tokio_util::sync::CancellationToken;
use weir_buffer::{Buffer, new_buffer};
use weir_config::Config;
use weir_input::{Input, new_input};
use weir_manager::Manager;
use weir_metrics::Metrics;
use weir_output::{Output, new_output};
use weir_pipeline::Pipeline;
use weir_processor::new_processors;

/// How long abandoned stages get after the kill token fires
const FORCED_EXIT_DEADLINE: Duration = Duration::from_secs(2);

/// Errors raised while building a stream
#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] weir_config::ConfigError),

    #[error("failed to build resources: {0}")]
    Manager(#[from] weir_manager::Error),

    #[error("failed to build input: {0}")]
    Input(#[from] weir_input::Error),

    #[error("failed to build output: {0}")]
    Output(#[from] weir_output::Error),

    #[error("failed to build processors: {0}")]
    Processor(#[from] weir_processor::Error),

    #[error("failed to build buffer: {0}")]
    Buffer(#[from] weir_buffer::Error),
}

/// A fully wired, running topology
pub struct Stream {
    input: Input,
    buffer: Option<Buffer>,
    stages: Vec<Pipeline>,
    output: Output,
    kill: CancellationToken,
    grace: Duration,
}

impl Stream {
    /// Build and start every component of the topology
    ///
    /// The returned stream is already moving data; call [`Stream::run`] to
    /// supervise it.
    pub fn build(config: &Config, metrics: Metrics) -> Result<Stream, Error> {
        config.validate()?;

        let kill = CancellationToken::new();
        let manager = Arc::new(Manager::build(&config.resources)?);
        let mut stages = Vec::new();

        let input_metrics = metrics.child("input");
        let input_ctx =
            weir_input::Context::new(Arc::clone(&manager), input_metrics.clone(), kill.clone());
        let input = new_input(&config.input, &input_ctx)?;
        let mut rx = input.transactions();

        if !config.input.processors.is_empty() {
            let stage_metrics = input_metrics.child("processor");
            let processors =
                new_processors(&config.input.processors, manager.as_ref(), &stage_metrics)?;
            let stage = Pipeline::spawn(processors, 1, rx, stage_metrics, kill.child_token());
            rx = stage.transactions();
            stages.push(stage);
        }

        let (buffered_rx, buffer) = new_buffer(
            &config.buffer,
            rx,
            &metrics.child("buffer"),
            kill.child_token(),
        )?;
        rx = buffered_rx;

        if !config.pipeline.processors.is_empty() {
            let stage_metrics = metrics.child("pipeline");
            let processors = new_processors(
                &config.pipeline.processors,
                manager.as_ref(),
                &stage_metrics.child("processor"),
            )?;
            let stage = Pipeline::spawn(
                processors,
                config.pipeline.threads,
                rx,
                stage_metrics,
                kill.child_token(),
            );
            rx = stage.transactions();
            stages.push(stage);
        }

        let output_metrics = metrics.child("output");
        if !config.output.processors.is_empty() {
            let stage_metrics = output_metrics.child("processor");
            let processors =
                new_processors(&config.output.processors, manager.as_ref(), &stage_metrics)?;
            let stage = Pipeline::spawn(processors, 1, rx, stage_metrics, kill.child_token());
            rx = stage.transactions();
            stages.push(stage);
        }

        let output_ctx =
            weir_output::Context::new(Arc::clone(&manager), output_metrics, kill.clone());
        let output = new_output(&config.output, rx, &output_ctx)?;

        tracing::info!(
            input = input.name(),
            output = output.name(),
            buffered = buffer.is_some(),
            pipeline_stages = stages.len(),
            "stream assembled"
        );

        Ok(Stream {
            input,
            buffer,
            stages,
            output,
            kill,
            grace: config.shutdown_timeout(),
        })
    }

    /// Supervise the stream until it finishes or `shutdown` resolves
    ///
    /// Natural completion happens when the input's upstream is exhausted:
    /// channel closure cascades through the stages and the output exits on
    /// its own. An external signal instead triggers the orderly shutdown
    /// choreography.
    pub async fn run<F>(mut self, shutdown: F) -> Result<(), Error>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let finished_naturally = {
            let output_done = self.output.join();
            tokio::pin!(output_done);
            tokio::select! {
                _ = &mut shutdown => false,
                _ = &mut output_done => true,
            }
        };

        if finished_naturally {
            tracing::info!("input exhausted, stream finished");
            self.finish().await;
        } else {
            tracing::info!("shutdown signal received, stopping stream");
            self.stop().await;
        }
        Ok(())
    }

    /// Orderly shutdown: close the input, drain towards the output, abandon
    /// whatever outlives the grace period
    async fn stop(&mut self) {
        self.input.close();

        let mut stuck = false;
        if self.input.wait_closed(self.grace).await.is_err() {
            tracing::warn!("input did not close within the grace period");
            stuck = true;
        }
        if let Some(buffer) = self.buffer.as_mut() {
            if buffer.wait_closed(self.grace).await.is_err() {
                tracing::warn!("buffer did not drain within the grace period");
                stuck = true;
            }
        }
        for stage in &mut self.stages {
            if stage.wait_closed(self.grace).await.is_err() {
                tracing::warn!("pipeline stage did not finish within the grace period");
                stuck = true;
            }
        }
        if self.output.wait_closed(self.grace).await.is_err() {
            tracing::warn!("output did not drain within the grace period");
            stuck = true;
        }

        if stuck {
            // Forced shutdown: every open transaction resolves as closed so
            // producers unblock, then stragglers get one short deadline
            tracing::warn!("forcing shutdown of remaining components");
            self.kill.cancel();
            let _ = self.input.wait_closed(FORCED_EXIT_DEADLINE).await;
            if let Some(buffer) = self.buffer.as_mut() {
                let _ = buffer.wait_closed(FORCED_EXIT_DEADLINE).await;
            }
            for stage in &mut self.stages {
                let _ = stage.wait_closed(FORCED_EXIT_DEADLINE).await;
            }
            if self.output.wait_closed(FORCED_EXIT_DEADLINE).await.is_err() {
                tracing::warn!("abandoning output past forced deadline");
            }
        }
        tracing::info!("stream shutdown complete");
    }

    /// Wind down after natural completion; upstream stages are already done
    /// or about to be
    async fn finish(&mut self) {
        if self.input.wait_closed(self.grace).await.is_err() {
            tracing::warn!("input still running after output finished");
        }
        if let Some(buffer) = self.buffer.as_mut() {
            let _ = buffer.wait_closed(self.grace).await;
        }
        for stage in &mut self.stages {
            let _ = stage.wait_closed(self.grace).await;
        }
    }
}

impl std::fmt::Debug for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stream")
            .field("input", &self.input.name())
            .field("output", &self.output.name())
            .field("buffered", &self.buffer.is_some())
            .field("stages", &self.stages.len())
            .finish()
    }
}

/*
 * SPDX-FileCopyrightText: 2026 The semgraph authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Run-time error and outcome types for the engine.
//!
//! Load-time failures (bad paths, malformed headers, index/graph mismatches)
//! are reported through [`anyhow`] with context, as they are not meant to be
//! matched on. Failures that abort a running computation are typed so that
//! callers can distinguish them.

use crate::graph::VertexId;
use thiserror::Error;

/// An error that aborts a running computation.
///
/// The first worker to fail publishes its error; the coordinator stops
/// releasing barriers and [`wait_for_complete`](crate::engine::GraphEngine::wait_for_complete)
/// returns the error to the waiter. There is no local recovery.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The I/O substrate returned a failed or short read.
    ///
    /// The substrate is expected to have already retried; the engine does not.
    #[error("I/O failed while reading adjacency of vertex {vertex}: {source}")]
    IoFailed {
        vertex: VertexId,
        #[source]
        source: std::io::Error,
    },

    /// A worker thread terminated abnormally (panicked).
    #[error("worker {worker} terminated abnormally")]
    WorkerDied { worker: usize },
}

/// The outcome of a completed run.
///
/// Cancellation is a distinguished outcome, not an error: the workers drain
/// to a consistent barrier point and stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The computation reached a fixpoint: some level produced no
    /// next-level activation and no message.
    Complete {
        /// Number of levels executed.
        levels: usize,
    },
    /// The run was cancelled cooperatively via
    /// [`cancel`](crate::engine::GraphEngine::cancel).
    Cancelled {
        /// The level at which the cancellation was observed.
        levels: usize,
    },
}

impl RunOutcome {
    /// Returns the number of levels the run executed before stopping.
    pub fn levels(&self) -> usize {
        match *self {
            RunOutcome::Complete { levels } => levels,
            RunOutcome::Cancelled { levels } => levels,
        }
    }

    /// Returns true if the run completed by fixpoint.
    pub fn is_complete(&self) -> bool {
        matches!(self, RunOutcome::Complete { .. })
    }
}

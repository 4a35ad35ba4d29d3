// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types surfaced by the engine.
//!
//! Nothing here is fatal: the worst outcome of any of these is a missed visual update.

use crate::types::NodeId;

/// A node's render bounds could not be computed this frame.
///
/// The scheduler treats the node as invisible for the frame and keeps it dirty,
/// so a later successful computation is not lost.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum GeometryError {
    /// The pipeline does not know this node.
    #[error("node {0:?} is not part of the scene")]
    UnknownNode(NodeId),
    /// The geometry produced NaN or infinite coordinates.
    #[error("node {0:?} has non-finite geometry")]
    NonFinite(NodeId),
    /// Any other failure reported by an external geometry pipeline.
    #[error("geometry pipeline failed for node {node:?}: {reason}")]
    Pipeline {
        /// The node being measured.
        node: NodeId,
        /// Human readable cause.
        reason: String,
    },
}

/// A shared resource could not be produced.
///
/// This is `Clone` because one fetch result is delivered to every caller that
/// requested the same key before it resolved.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ResourceError {
    /// Fetching the source bytes failed.
    #[error("failed to fetch `{key}`: {reason}")]
    Fetch {
        /// Debug rendering of the resource key.
        key: String,
        /// Human readable cause.
        reason: String,
    },
    /// The source was fetched but could not be decoded or computed.
    #[error("failed to decode `{key}`: {reason}")]
    Decode {
        /// Debug rendering of the resource key.
        key: String,
        /// Human readable cause.
        reason: String,
    },
    /// Every owner released the key before the fetch resolved.
    #[error("`{0}` was released before it resolved")]
    Abandoned(String),
    /// The fetch could not be handed to the executor.
    #[error("could not spawn fetch for `{key}`: {reason}")]
    Spawn {
        /// Debug rendering of the resource key.
        key: String,
        /// Human readable cause.
        reason: String,
    },
}

/// Misuse of the frame state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// `begin_frame` was called while a frame was already accumulating.
    #[error("begin_frame called while frame {0} is still accumulating")]
    AlreadyAccumulating(u64),
    /// `end_frame` was called without a matching `begin_frame`.
    #[error("end_frame called without a matching begin_frame")]
    NotAccumulating,
}

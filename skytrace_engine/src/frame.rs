//! Per-frame submission protocol
//!
//! Idle -> ComputeSubmitted -> ImageAcquired -> GraphicsSubmitted -> Presented -> Idle
//!
//! The fence wait happens on entry to ComputeSubmitted. The cycle has no
//! terminal state.
//!
//! A failed frame drops the state back to Idle and is remembered by
//! `FrameTracker`: the fence may never signal again, so later frames are
//! refused with the original failure instead of waiting on it.

use std::fmt;
use crate::error::{Error, Result};

/// Steps of one rendered frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameState {
    /// Nothing recorded for the current frame yet
    Idle,
    /// Compute dispatch submitted, fence pending
    ComputeSubmitted,
    /// Swapchain image acquired
    ImageAcquired { image_index: u32 },
    /// Graphics command buffer for the image submitted
    GraphicsSubmitted { image_index: u32 },
    /// Image queued for presentation and graphics queue drained
    Presented,
}

/// Events driving the frame state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameEvent {
    SubmitCompute,
    AcquireImage { image_index: u32 },
    SubmitGraphics,
    Present,
    Finish,
}

impl FrameState {
    /// Next state for `event`, or `FrameFailed` when the event is out of order
    pub fn transition(self, event: FrameEvent) -> Result<FrameState> {
        match (self, event) {
            (FrameState::Idle, FrameEvent::SubmitCompute) => Ok(FrameState::ComputeSubmitted),
            (FrameState::ComputeSubmitted, FrameEvent::AcquireImage { image_index }) => {
                Ok(FrameState::ImageAcquired { image_index })
            }
            (FrameState::ImageAcquired { image_index }, FrameEvent::SubmitGraphics) => {
                Ok(FrameState::GraphicsSubmitted { image_index })
            }
            (FrameState::GraphicsSubmitted { .. }, FrameEvent::Present) => Ok(FrameState::Presented),
            (FrameState::Presented, FrameEvent::Finish) => Ok(FrameState::Idle),
            (state, event) => Err(Error::FrameFailed(format!(
                "Invalid frame transition: {:?} on {}",
                event, state
            ))),
        }
    }

    /// Swapchain image bound to the frame, once acquired
    pub fn image_index(self) -> Option<u32> {
        match self {
            FrameState::ImageAcquired { image_index }
            | FrameState::GraphicsSubmitted { image_index } => Some(image_index),
            _ => None,
        }
    }

    pub fn is_idle(self) -> bool {
        self == FrameState::Idle
    }
}

impl Default for FrameState {
    fn default() -> Self {
        FrameState::Idle
    }
}

impl fmt::Display for FrameState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FrameState::Idle => write!(f, "Idle"),
            FrameState::ComputeSubmitted => write!(f, "ComputeSubmitted"),
            FrameState::ImageAcquired { image_index } => write!(f, "ImageAcquired({})", image_index),
            FrameState::GraphicsSubmitted { image_index } => {
                write!(f, "GraphicsSubmitted({})", image_index)
            }
            FrameState::Presented => write!(f, "Presented"),
        }
    }
}

/// Frame state, completed frame count and the failure that stopped the loop
#[derive(Debug, Clone, Default)]
pub struct FrameTracker {
    state: FrameState,
    frame_count: u64,
    failure: Option<Error>,
}

impl FrameTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Err once a frame has failed
    pub fn ensure_usable(&self) -> Result<()> {
        match &self.failure {
            Some(failure) => Err(Error::FrameFailed(format!(
                "Frame loop stopped after an earlier failure: {}",
                failure.message()
            ))),
            None => Ok(()),
        }
    }

    /// Apply `event`; `Finish` completes a frame
    pub fn advance(&mut self, event: FrameEvent) -> Result<()> {
        self.state = self.state.transition(event)?;
        if event == FrameEvent::Finish {
            self.frame_count += 1;
        }
        Ok(())
    }

    /// Record a failed frame and hand the error back
    pub fn fail(&mut self, error: Error) -> Error {
        self.state = FrameState::Idle;
        self.failure = Some(error.clone());
        error
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    /// Frames completed so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn failure(&self) -> Option<&Error> {
        self.failure.as_ref()
    }
}

/// Dispatch group counts for a target of `width` x `height` with square
/// workgroups of `local_size`
pub fn dispatch_group_counts(width: u32, height: u32, local_size: u32) -> [u32; 3] {
    [width.div_ceil(local_size), height.div_ceil(local_size), 1]
}

/// Workgroup edge of the ray tracing shader
pub const WORKGROUP_SIZE: u32 = 16;

#[cfg(test)]
#[path = "frame_tests.rs"]
mod tests;

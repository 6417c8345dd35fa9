//! Unit tests for frame.rs

use crate::frame::*;
use crate::skytrace::Error;

#[test]
fn test_full_cycle_returns_to_idle() {
    let mut state = FrameState::default();
    assert!(state.is_idle());

    state = state.transition(FrameEvent::SubmitCompute).unwrap();
    assert_eq!(state, FrameState::ComputeSubmitted);

    state = state.transition(FrameEvent::AcquireImage { image_index: 2 }).unwrap();
    assert_eq!(state.image_index(), Some(2));

    state = state.transition(FrameEvent::SubmitGraphics).unwrap();
    assert_eq!(state, FrameState::GraphicsSubmitted { image_index: 2 });

    state = state.transition(FrameEvent::Present).unwrap();
    assert_eq!(state, FrameState::Presented);
    assert_eq!(state.image_index(), None);

    state = state.transition(FrameEvent::Finish).unwrap();
    assert!(state.is_idle());
}

#[test]
fn test_cycle_repeats() {
    let mut state = FrameState::Idle;
    for frame in 0..3 {
        state = state
            .transition(FrameEvent::SubmitCompute)
            .and_then(|s| s.transition(FrameEvent::AcquireImage { image_index: frame }))
            .and_then(|s| s.transition(FrameEvent::SubmitGraphics))
            .and_then(|s| s.transition(FrameEvent::Present))
            .and_then(|s| s.transition(FrameEvent::Finish))
            .unwrap();
    }
    assert!(state.is_idle());
}

#[test]
fn test_acquire_before_compute_is_rejected() {
    let result = FrameState::Idle.transition(FrameEvent::AcquireImage { image_index: 0 });
    assert!(matches!(result, Err(Error::FrameFailed(_))));
}

#[test]
fn test_present_without_graphics_is_rejected() {
    let state = FrameState::ImageAcquired { image_index: 1 };
    assert!(state.transition(FrameEvent::Present).is_err());
}

#[test]
fn test_double_compute_submit_is_rejected() {
    let state = FrameState::ComputeSubmitted;
    assert!(state.transition(FrameEvent::SubmitCompute).is_err());
}

#[test]
fn test_display() {
    assert_eq!(FrameState::ImageAcquired { image_index: 3 }.to_string(), "ImageAcquired(3)");
    assert_eq!(FrameState::Idle.to_string(), "Idle");
}

#[test]
fn test_dispatch_group_counts_round_up() {
    assert_eq!(dispatch_group_counts(800, 600, WORKGROUP_SIZE), [50, 38, 1]);
    assert_eq!(dispatch_group_counts(16, 16, WORKGROUP_SIZE), [1, 1, 1]);
    assert_eq!(dispatch_group_counts(17, 1, WORKGROUP_SIZE), [2, 1, 1]);
}

fn run_frame(tracker: &mut FrameTracker, image_index: u32) -> crate::skytrace::Result<()> {
    tracker.advance(FrameEvent::SubmitCompute)?;
    tracker.advance(FrameEvent::AcquireImage { image_index })?;
    tracker.advance(FrameEvent::SubmitGraphics)?;
    tracker.advance(FrameEvent::Present)?;
    tracker.advance(FrameEvent::Finish)
}

#[test]
fn test_tracker_counts_finished_frames() {
    let mut tracker = FrameTracker::new();
    run_frame(&mut tracker, 0).unwrap();
    run_frame(&mut tracker, 1).unwrap();

    assert_eq!(tracker.frame_count(), 2);
    assert!(tracker.state().is_idle());
    assert!(tracker.ensure_usable().is_ok());
}

#[test]
fn test_tracker_failure_returns_to_idle() {
    let mut tracker = FrameTracker::new();
    tracker.advance(FrameEvent::SubmitCompute).unwrap();
    tracker.advance(FrameEvent::AcquireImage { image_index: 1 }).unwrap();

    let error = tracker.fail(Error::FrameFailed("device lost".to_string()));

    assert_eq!(error.message(), "device lost");
    assert_eq!(tracker.state(), FrameState::Idle);
    assert_eq!(tracker.frame_count(), 0);
    assert_eq!(tracker.failure().map(Error::message), Some("device lost"));
}

#[test]
fn test_tracker_refuses_frames_after_failure() {
    let mut tracker = FrameTracker::new();
    run_frame(&mut tracker, 0).unwrap();
    tracker.advance(FrameEvent::SubmitCompute).unwrap();
    tracker.fail(Error::FrameFailed("present failed".to_string()));

    match tracker.ensure_usable() {
        Err(Error::FrameFailed(msg)) => assert!(msg.contains("present failed")),
        other => panic!("expected FrameFailed, got {:?}", other),
    }
    assert_eq!(tracker.frame_count(), 1);
}

#[test]
fn test_tracker_out_of_order_event_keeps_state() {
    let mut tracker = FrameTracker::new();
    assert!(tracker.advance(FrameEvent::Present).is_err());
    assert!(tracker.state().is_idle());
    assert!(tracker.failure().is_none());
}

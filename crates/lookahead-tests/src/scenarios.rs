//! Integration tests for the push/pop/peek protocol.
//!
//! Exercises the queue the way an encoder drives it: fill to the look-ahead
//! depth, commit in steady state, drain at end of stream.

use lookahead_core::{FrameGeometry, LookaheadError, PictureBuffer, PlaneKind};
use lookahead_queue::{
    FrameFlags, LookaheadConfig, LookaheadQueue, QueueState, RETENTION_MARGIN,
};

// ── Helpers ────────────────────────────────────────────────────

const W: u32 = 96;
const H: u32 = 64;

fn queue(depth: usize) -> LookaheadQueue {
    LookaheadQueue::new(W, H, 1, 1, false, depth).unwrap()
}

fn frame(seed: u32) -> PictureBuffer {
    PictureBuffer::test_pattern(FrameGeometry::yuv420(W, H), 0, seed).unwrap()
}

fn push_seq(q: &mut LookaheadQueue, seed: u32) -> Result<(), LookaheadError> {
    let ts = seed as i64 * 3000;
    q.push(&frame(seed), ts, ts + 3000, false, FrameFlags(seed))
}

fn luma_row(q: &LookaheadQueue, offset: isize) -> Option<Vec<u8>> {
    q.peek(offset)
        .and_then(|f| f.picture().plane(PlaneKind::Y).row_u8(7).map(<[u8]>::to_vec))
}

// ── End-to-end and drain ───────────────────────────────────────

#[test]
fn pop_waits_until_window_is_full() {
    let mut q = queue(4);
    assert_eq!(q.max_size(), 4 + RETENTION_MARGIN);

    for seed in 0..3 {
        push_seq(&mut q, seed).unwrap();
    }
    assert_eq!(q.depth(), 3);
    assert!(q.pop(false).is_none());
    assert_eq!(q.depth(), 3);

    push_seq(&mut q, 3).unwrap();
    assert_eq!(q.state(), QueueState::Ready);
    let first = q.pop(false).unwrap();
    assert_eq!(first.display_index(), 0);
    assert_eq!(first.ts_start(), 0);
    assert_eq!(q.depth(), 3);
}

#[test]
fn drain_returns_remaining_frames_in_push_order() {
    let mut q = queue(4);
    for seed in 0..4 {
        push_seq(&mut q, seed).unwrap();
    }
    assert_eq!(q.pop(false).map(|f| f.display_index()), Some(0));

    let mut drained = Vec::new();
    while let Some(f) = q.pop(true) {
        drained.push(f.display_index());
    }
    assert_eq!(drained, vec![1, 2, 3]);
    assert!(q.pop(true).is_none());
    assert_eq!(q.state(), QueueState::Empty);
}

#[test]
fn push_rejected_once_depth_frames_are_queued() {
    for depth in [1usize, 2, 5, 25] {
        let mut q = queue(depth);
        for seed in 0..depth as u32 {
            push_seq(&mut q, seed).unwrap();
        }
        assert!(q.is_full());
        assert_eq!(push_seq(&mut q, 99), Err(LookaheadError::QueueFull));
        assert_eq!(q.depth(), depth);
    }
}

#[test]
fn requested_depth_is_clamped() {
    assert_eq!(queue(0).max_size(), 1 + RETENTION_MARGIN);
    assert_eq!(
        queue(500).max_size(),
        lookahead_queue::MAX_LOOKAHEAD_DEPTH + RETENTION_MARGIN
    );
}

// ── Peek ───────────────────────────────────────────────────────

#[test]
fn peek_zero_matches_next_pop() {
    let mut q = queue(3);
    for seed in 0..3 {
        push_seq(&mut q, seed).unwrap();
    }
    for seed in 3..20 {
        let (ts, flags, idx, row) = {
            let f = q.peek(0).unwrap();
            (f.ts_start(), f.flags(), f.display_index(), luma_row(&q, 0))
        };
        let popped = q.pop(false).unwrap();
        assert_eq!(popped.ts_start(), ts);
        assert_eq!(popped.flags(), flags);
        assert_eq!(popped.display_index(), idx);
        assert_eq!(
            popped.picture().plane(PlaneKind::Y).row_u8(7).map(<[u8]>::to_vec),
            row
        );
        push_seq(&mut q, seed).unwrap();
    }
}

#[test]
fn backward_peek_sees_last_popped_frame() {
    let mut q = queue(4);
    for seed in 0..4 {
        push_seq(&mut q, seed).unwrap();
    }
    let expected = luma_row(&q, 0);
    assert_eq!(q.pop(false).map(|f| f.display_index()), Some(0));

    assert_eq!(q.peek(-1).map(|f| f.display_index()), Some(0));
    assert_eq!(luma_row(&q, -1), expected);

    // The retained slot survives the push that refills the window.
    push_seq(&mut q, 4).unwrap();
    assert_eq!(q.peek(-1).map(|f| f.display_index()), Some(0));
    assert_eq!(luma_row(&q, -1), expected);

    assert!(q.peek(-(RETENTION_MARGIN as isize) - 1).is_none());
}

#[test]
fn backward_peek_follows_read_position_across_wraparound() {
    let mut q = queue(2);
    push_seq(&mut q, 0).unwrap();
    push_seq(&mut q, 1).unwrap();
    for seed in 2..12u32 {
        let popped = q.pop(false).unwrap().display_index();
        assert_eq!(q.peek(-1).unwrap().display_index(), popped);
        assert_eq!(q.peek(-1).unwrap().flags(), FrameFlags(popped as u32));
        push_seq(&mut q, seed).unwrap();
    }
}

#[test]
fn forward_peek_bounded_by_depth() {
    let mut q = queue(6);
    for seed in 0..4 {
        push_seq(&mut q, seed).unwrap();
    }
    for i in 0..4 {
        assert_eq!(q.peek(i).map(|f| f.display_index()), Some(i as u64));
    }
    assert!(q.peek(4).is_none());
    assert!(q.peek(5).is_none());
}

// ── Display order ──────────────────────────────────────────────

#[test]
fn display_indices_are_gapless_across_pops_and_rejections() {
    let mut q = queue(3);
    let mut seen = Vec::new();
    let mut pushed = 0u32;

    // Two pushes per pop, so the producer keeps running into a full queue.
    for _ in 0..30 {
        for _ in 0..2 {
            match push_seq(&mut q, pushed) {
                Ok(()) => pushed += 1,
                Err(LookaheadError::QueueFull) => {}
                Err(err) => panic!("unexpected push error: {err}"),
            }
            assert_eq!(q.next_display_index(), pushed as u64);
        }
        if let Some(f) = q.pop(false) {
            seen.push(f.display_index());
        }
    }
    while let Some(f) = q.pop(true) {
        seen.push(f.display_index());
    }
    let expected: Vec<u64> = (0..pushed as u64).collect();
    assert_eq!(seen, expected);
    assert!(q.stats().rejected_full > 0);
    assert_eq!(q.stats().pushed, pushed as u64);
}

// ── Resolution changes ─────────────────────────────────────────

#[test]
fn resolution_change_mid_stream() {
    let config = LookaheadConfig {
        depth: 3,
        ..LookaheadConfig::default()
    };
    let base = FrameGeometry::yuv420(64, 48);
    let mut q = LookaheadQueue::with_config(base, config).unwrap();
    let sizes = [(64, 48), (32, 32), (128, 72), (64, 48), (33, 17), (128, 72), (64, 48)];

    let mut popped = Vec::new();
    for (i, &(w, h)) in sizes.iter().enumerate() {
        let pic = PictureBuffer::test_pattern(base.with_size(w, h), 0, i as u32).unwrap();
        q.push(&pic, i as i64, i as i64 + 1, false, FrameFlags::NONE)
            .unwrap();
        if let Some(f) = q.pop(false) {
            let g = f.picture().geometry();
            popped.push((g.width, g.height));
        }
    }
    while let Some(f) = q.pop(true) {
        let g = f.picture().geometry();
        popped.push((g.width, g.height));
    }
    assert_eq!(popped, sizes.to_vec());

    let stats = q.stats();
    assert!(stats.reallocated >= 1);
    assert!(stats.reshaped >= 1);
    // Every slot that grew kept its larger allocation.
    assert_eq!(q.peek(-1).unwrap().picture().capacity().width, 128);
}

#[test]
fn frame_pixels_survive_in_place_reshape() {
    let mut q = LookaheadQueue::with_config(
        FrameGeometry::yuv420(128, 96),
        LookaheadConfig::with_depth(1),
    )
    .unwrap();
    let small = PictureBuffer::test_pattern(FrameGeometry::yuv420(50, 30), 0, 11).unwrap();
    q.push(&small, 0, 1, false, FrameFlags::NONE).unwrap();
    assert_eq!(q.stats().reshaped, 1);
    let f = q.pop(false).unwrap();
    for kind in PlaneKind::ALL {
        let (got, want) = (f.picture().plane(kind), small.plane(kind));
        assert_eq!(got.crop_width(), want.crop_width());
        for row in 0..want.crop_height() {
            assert_eq!(got.row_u8(row), want.row_u8(row));
        }
        // Right border continues the last visible column.
        let last = got.crop_width() as isize - 1;
        assert_eq!(got.sample(last + 5, 0), got.sample(last, 0));
    }
}

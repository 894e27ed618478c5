//! Integration tests for picture geometry as seen through the queue.

use lookahead_core::{FrameGeometry, PictureBuffer, PictureLayout, PlaneKind, SampleDepth};
use lookahead_queue::{FrameFlags, LookaheadConfig, LookaheadQueue, SlotAction, ENCODER_BORDER};

// ── Helpers ────────────────────────────────────────────────────

fn single_slot_queue(geometry: FrameGeometry) -> LookaheadQueue {
    LookaheadQueue::with_config(geometry, LookaheadConfig::with_depth(1)).unwrap()
}

fn push_and_pop_layout(q: &mut LookaheadQueue, geometry: FrameGeometry) -> PictureLayout {
    let pic = PictureBuffer::test_pattern(geometry, 0, 1).unwrap();
    q.push(&pic, 0, 1, geometry.depth.is_high(), FrameFlags::NONE)
        .unwrap();
    q.pop(false).unwrap().picture().layout()
}

// ── Layout ─────────────────────────────────────────────────────

#[test]
fn cif_layout_with_encoder_border() {
    let q = LookaheadQueue::new(352, 288, 1, 1, false, 1).unwrap();
    assert_eq!(q.config().border, ENCODER_BORDER);

    let layout = PictureLayout::for_geometry(&FrameGeometry::yuv420(352, 288), ENCODER_BORDER);
    // 352 + 2 * 160 = 672, already a multiple of 32.
    assert_eq!(layout.luma.stride, 672);
    assert_eq!(layout.luma.border_y, 160);
    assert_eq!(layout.chroma.stride, 336);
    assert_eq!(layout.chroma.border_x, 80);
    assert_eq!(layout.chroma.crop_width, 176);
    assert_eq!(layout.chroma.crop_height, 144);
}

#[test]
fn odd_dimensions_round_chroma_up() {
    let g = FrameGeometry::yuv420(33, 17);
    assert_eq!(g.aligned_width(), 40);
    assert_eq!(g.aligned_height(), 24);
    assert_eq!(g.crop_size(PlaneKind::U), (17, 9));

    let layout = PictureLayout::for_geometry(&g, 32);
    assert_eq!(layout.luma.stride, 128);
    assert_eq!(layout.chroma.stride, 64);
}

#[test]
fn subsampling_modes() {
    let cases = [
        ((0u8, 0u8), (64usize, 48usize)),
        ((1, 0), (32, 48)),
        ((1, 1), (32, 24)),
    ];
    for ((ssx, ssy), chroma) in cases {
        let g = FrameGeometry::new(64, 48, ssx, ssy, SampleDepth::Eight);
        let q = single_slot_queue(g);
        assert_eq!(q.max_size(), 2);
        assert_eq!(g.crop_size(PlaneKind::V), chroma);
    }
}

// ── Reshape and regrowth ───────────────────────────────────────

#[test]
fn restored_size_gets_original_stride() {
    let big = FrameGeometry::yuv420(320, 240);
    let mut q = single_slot_queue(big);
    let original = PictureLayout::for_geometry(&big, ENCODER_BORDER);

    for size in [(160, 120), (72, 40), (320, 240), (200, 200), (320, 240)] {
        let g = big.with_size(size.0, size.1);
        let layout = push_and_pop_layout(&mut q, g);
        assert_eq!(layout, PictureLayout::for_geometry(&g, ENCODER_BORDER));
        if size == (320, 240) {
            assert_eq!(layout, original);
        }
    }
    assert_eq!(q.stats().reallocated, 0);
}

#[test]
fn growing_past_capacity_reallocates_once_per_slot() {
    let mut q = single_slot_queue(FrameGeometry::yuv420(64, 48));
    let before = q.allocated_bytes();
    let large = FrameGeometry::yuv420(256, 144);

    for _ in 0..6 {
        push_and_pop_layout(&mut q, large);
    }
    // Two slots, each grown on first use.
    assert_eq!(q.stats().reallocated, 2);
    assert!(q.allocated_bytes() > before);
    assert_eq!(
        q.allocated_bytes(),
        2 * PictureBuffer::required_bytes(&large, ENCODER_BORDER).unwrap()
    );
}

#[test]
fn taller_but_narrower_frame_still_grows() {
    let slot = PictureBuffer::new(FrameGeometry::yuv420(320, 180), 32).unwrap();
    let portrait = FrameGeometry::yuv420(180, 320);
    assert_eq!(SlotAction::decide(&slot, &portrait), SlotAction::GrowReplace);
}

#[test]
fn sample_depth_switch_replaces_storage() {
    let eight = FrameGeometry::yuv420(64, 48);
    let high = FrameGeometry::new(64, 48, 1, 1, SampleDepth::High);
    let mut q = single_slot_queue(eight);

    push_and_pop_layout(&mut q, high);
    assert_eq!(q.stats().reallocated, 1);
    assert_eq!(q.peek(-1).unwrap().picture().depth(), SampleDepth::High);

    let pic = PictureBuffer::test_pattern(high, 0, 3).unwrap();
    q.push(&pic, 1, 2, true, FrameFlags::NONE).unwrap();
    let f = q.pop(false).unwrap();
    assert_eq!(
        f.picture().plane(PlaneKind::Y).row_u16(5),
        pic.plane(PlaneKind::Y).row_u16(5)
    );
}

#[test]
fn border_replicates_edges_in_every_plane() {
    let g = FrameGeometry::yuv420(50, 30);
    let mut q = single_slot_queue(g);
    let pic = PictureBuffer::test_pattern(g, 0, 4).unwrap();
    q.push(&pic, 0, 1, false, FrameFlags::NONE).unwrap();
    let stored = q.pop(false).unwrap().picture();

    for kind in PlaneKind::ALL {
        let plane = stored.plane(kind);
        let l = *plane.layout();
        let (w, h) = (plane.crop_width() as isize, plane.crop_height() as isize);
        let bx = l.border_x as isize;
        let by = l.border_y as isize;

        assert_eq!(plane.sample(-bx, -by), plane.sample(0, 0));
        assert_eq!(plane.sample(w - 1 + bx, -1), plane.sample(w - 1, 0));
        assert_eq!(plane.sample(-1, h - 1 + by), plane.sample(0, h - 1));
        assert_eq!(plane.sample(3, h + 2), plane.sample(3, h - 1));
    }
}

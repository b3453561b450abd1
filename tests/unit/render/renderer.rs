use super::*;
use crate::foundation::core::CanvasSize;
use crate::render::display::LatestResult;

fn renderer(opts: RendererOpts) -> MultiResolutionRenderer {
    let target = Arc::new(LatestResult::new(CanvasSize::new(8, 8)));
    MultiResolutionRenderer::new(opts, target).unwrap()
}

fn three_scales(target_render_nanos: u64) -> RendererOpts {
    RendererOpts {
        screen_scales: vec![1.0, 0.5, 0.25],
        target_render_nanos,
        num_rendering_threads: Some(1),
        ..RendererOpts::default()
    }
}

#[test]
fn starts_at_coarsest_scale() {
    let r = renderer(three_scales(10));
    assert_eq!(r.max_screen_scale_index(), 2);
    assert_eq!(r.mipmap_bias(), 0);
}

#[test]
fn slow_coarsest_pass_moves_start_coarser() {
    let r = renderer(three_scales(10));
    r.max_scale_index.store(0, Ordering::Relaxed);
    r.adapt_screen_scale(0, 11);
    assert_eq!(r.max_screen_scale_index(), 1);
    // At the boundary nothing changes.
    r.adapt_screen_scale(1, 10);
    assert_eq!(r.max_screen_scale_index(), 1);
    r.adapt_screen_scale(1, 50);
    assert_eq!(r.max_screen_scale_index(), 2);
    // Already coarsest.
    r.adapt_screen_scale(2, 50);
    assert_eq!(r.max_screen_scale_index(), 2);
}

#[test]
fn fast_second_coarsest_pass_moves_start_finer() {
    // A finer start needs a pass under a third of the 30ns budget.
    let r = renderer(three_scales(30));
    r.adapt_screen_scale(1, 9);
    assert_eq!(r.max_screen_scale_index(), 1);
    r.adapt_screen_scale(1, 9);
    assert_eq!(r.max_screen_scale_index(), 1);
    r.adapt_screen_scale(0, 9);
    assert_eq!(r.max_screen_scale_index(), 0);
}

#[test]
fn pass_times_near_budget_do_not_flip_start_scale() {
    let r = renderer(three_scales(30));
    r.max_scale_index.store(1, Ordering::Relaxed);
    let mut starts = Vec::new();
    for slow in [true, false, true, false, true, false] {
        let start = r.max_screen_scale_index();
        if start == 2 {
            r.adapt_screen_scale(2, 7);
            r.adapt_screen_scale(1, if slow { 31 } else { 29 });
        } else {
            r.adapt_screen_scale(1, if slow { 31 } else { 29 });
        }
        starts.push(r.max_screen_scale_index());
    }
    assert_eq!(starts, vec![2, 2, 2, 2, 2, 2]);
}

#[test]
fn finer_start_fraction_is_configurable() {
    let r = renderer(RendererOpts {
        finer_start_fraction: 1.0,
        ..three_scales(30)
    });
    r.adapt_screen_scale(1, 29);
    assert_eq!(r.max_screen_scale_index(), 1);
}

#[test]
fn passes_at_other_scales_do_not_adapt() {
    let r = renderer(three_scales(10));
    r.adapt_screen_scale(0, 1);
    r.adapt_screen_scale(0, 1_000);
    assert_eq!(r.max_screen_scale_index(), 2);
}

#[test]
fn mipmap_bias_is_debounced() {
    let r = renderer(RendererOpts {
        fast_frames_to_refine: 2,
        ..three_scales(10)
    });
    let mut guard = r.lock_painter();
    let painter = &mut *guard;

    r.update_mipmap_bias(painter, false);
    assert_eq!(r.mipmap_bias(), 1);
    r.update_mipmap_bias(painter, true);
    assert_eq!(r.mipmap_bias(), 1);
    // A slow frame resets the streak.
    r.update_mipmap_bias(painter, false);
    r.update_mipmap_bias(painter, true);
    assert_eq!(r.mipmap_bias(), 1);
    r.update_mipmap_bias(painter, true);
    assert_eq!(r.mipmap_bias(), 0);
}

#[test]
fn mipmap_bias_stays_off_without_fallback() {
    let r = renderer(RendererOpts {
        allow_coarse_fallback: false,
        ..three_scales(10)
    });
    let mut guard = r.lock_painter();
    r.update_mipmap_bias(&mut guard, false);
    assert_eq!(r.mipmap_bias(), 0);
}

#[test]
fn zero_threads_are_rejected() {
    assert!(build_thread_pool(Some(0)).is_err());
    assert_eq!(build_thread_pool(Some(2)).unwrap().current_num_threads(), 2);
}

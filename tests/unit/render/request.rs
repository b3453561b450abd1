use super::*;

fn dirty(x0: i64, y0: i64, x1: i64, y1: i64) -> RepaintRequest {
    RepaintRequest {
        scale_index: 0,
        mipmap_bias: 0,
        dirty: Some(Interval::new(x0, y0, x1, y1).unwrap()),
    }
}

#[test]
fn merge_takes_coarser_targets() {
    let a = RepaintRequest::full(1, 0);
    let b = RepaintRequest::full(3, 1);
    assert_eq!(a.merge(b), RepaintRequest::full(3, 1));
    assert_eq!(b.merge(a), RepaintRequest::full(3, 1));
}

#[test]
fn merge_unions_dirty_regions_and_full_canvas_wins() {
    let merged = dirty(0, 0, 2, 2).merge(dirty(5, 5, 6, 8));
    assert_eq!(merged.dirty, Some(Interval::new(0, 0, 6, 8).unwrap()));

    let merged = dirty(0, 0, 2, 2).merge(RepaintRequest::full(0, 0));
    assert_eq!(merged.dirty, None);
    let merged = RepaintRequest::full(0, 0).merge(dirty(0, 0, 2, 2));
    assert_eq!(merged.dirty, None);
}

#[test]
fn submit_cancels_in_flight_pass() {
    let mut state = RequestState::default();
    let handle = CancelHandle::new();
    assert!(state.begin_pass(handle.clone(), RepaintRequest::full(2, 0)));
    state.submit(RepaintRequest::full(2, 0));
    assert!(handle.is_cancelled());
    assert!(state.is_pending());
}

#[test]
fn cancelled_full_pass_survives_a_dirty_region_request() {
    let mut state = RequestState::default();
    state.submit(RepaintRequest::full(3, 0));
    let running = state.take().unwrap();
    let handle = CancelHandle::new();
    assert!(state.begin_pass(handle.clone(), running));

    state.submit(RepaintRequest {
        scale_index: 1,
        ..dirty(0, 0, 2, 2)
    });
    assert!(handle.is_cancelled());
    state.end_pass();

    let next = state.take().unwrap();
    assert_eq!(next.dirty, None);
    assert_eq!(next.scale_index, 3);
    assert_eq!(state.take(), None);
}

#[test]
fn cancelled_dirty_pass_is_unioned_with_the_next_one() {
    let mut state = RequestState::default();
    assert!(state.begin_pass(CancelHandle::new(), dirty(0, 0, 2, 2)));
    state.submit(dirty(4, 4, 6, 6));
    state.end_pass();
    assert_eq!(
        state.take().unwrap().dirty,
        Some(Interval::new(0, 0, 6, 6).unwrap())
    );
}

#[test]
fn finished_pass_is_not_requeued() {
    let mut state = RequestState::default();
    assert!(state.begin_pass(CancelHandle::new(), RepaintRequest::full(0, 0)));
    state.end_pass();
    state.submit(dirty(0, 0, 1, 1));
    assert_eq!(state.take().unwrap().dirty, Some(Interval::new(0, 0, 1, 1).unwrap()));
}

#[test]
fn followup_does_not_cancel() {
    let mut state = RequestState::default();
    let handle = CancelHandle::new();
    assert!(state.begin_pass(handle.clone(), RepaintRequest::full(2, 0)));
    state.submit_followup(RepaintRequest::full(1, 0));
    assert!(!handle.is_cancelled());
    state.end_pass();
    assert_eq!(state.take(), Some(RepaintRequest::full(1, 0)));
    assert_eq!(state.take(), None);
}

#[test]
fn refused_pass_is_merged_back_into_pending() {
    let mut state = RequestState::default();
    state.submit(dirty(0, 0, 1, 1));
    assert!(!state.begin_pass(CancelHandle::new(), RepaintRequest::full(2, 0)));
    let next = state.take().unwrap();
    assert_eq!(next.dirty, None);
    assert_eq!(next.scale_index, 2);
}

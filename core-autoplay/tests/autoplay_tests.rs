//! Autoplay coordinator tests.
//!
//! Covers:
//! - Switching between candidates and redundant play suppression
//! - The drag/deceleration settlement protocol
//! - Suspension, stop, and end-of-display handling
//! - Weak references to the list, its items and the delegate

use core_autoplay::{
    AutoplayCandidate, AutoplayConfig, AutoplayCoordinator, AutoplayDelegate, CandidateSource,
    Playable, Rect, Viewport, Visible,
};
use core_runtime::events::{AutoplayEvent, CoreEvent, EventBus};
use mockall::mock;
use parking_lot::Mutex;
use std::sync::Arc;

// ============================================================================
// Test list
// ============================================================================

struct Cell {
    frame: Mutex<Rect>,
    playing: Mutex<bool>,
    plays: Mutex<usize>,
    pauses: Mutex<usize>,
}

impl Cell {
    fn new(min_y: f64, max_y: f64) -> Arc<Self> {
        Arc::new(Self {
            frame: Mutex::new(Rect::from_vertical_span(min_y, max_y)),
            playing: Mutex::new(false),
            plays: Mutex::new(0),
            pauses: Mutex::new(0),
        })
    }

    fn plays(&self) -> usize {
        *self.plays.lock()
    }

    fn pauses(&self) -> usize {
        *self.pauses.lock()
    }

    fn is_playing_now(&self) -> bool {
        *self.playing.lock()
    }
}

impl Playable for Cell {
    fn is_playing(&self) -> bool {
        *self.playing.lock()
    }

    fn play(&self) {
        *self.plays.lock() += 1;
        *self.playing.lock() = true;
    }

    fn pause(&self) {
        *self.pauses.lock() += 1;
        *self.playing.lock() = false;
    }
}

impl Visible for Cell {
    fn frame_in_viewport(&self) -> Rect {
        *self.frame.lock()
    }
}

struct FeedList {
    viewport: Mutex<Viewport>,
    rows: Mutex<Vec<(u32, Arc<Cell>)>>,
}

impl FeedList {
    fn new(rows: Vec<(u32, Arc<Cell>)>) -> Arc<Self> {
        Arc::new(Self {
            viewport: Mutex::new(Viewport::new(0.0, 100.0)),
            rows: Mutex::new(rows),
        })
    }

    /// Scroll so the viewport starts at `offset`.
    fn scroll_to(&self, offset: f64) {
        *self.viewport.lock() = Viewport::new(offset, offset + 100.0);
    }

    fn remove(&self, identity: u32) {
        self.rows.lock().retain(|(id, _)| *id != identity);
    }
}

impl CandidateSource<u32> for FeedList {
    fn viewport(&self) -> Viewport {
        *self.viewport.lock()
    }

    fn candidates(&self) -> Vec<u32> {
        self.rows.lock().iter().map(|(id, _)| *id).collect()
    }

    fn candidate(&self, identity: &u32) -> Option<Arc<dyn AutoplayCandidate>> {
        self.rows
            .lock()
            .iter()
            .find(|(id, _)| id == identity)
            .map(|(_, cell)| Arc::clone(cell) as Arc<dyn AutoplayCandidate>)
    }
}

#[derive(Default)]
struct RecordingDelegate {
    switches: Mutex<Vec<u32>>,
}

impl AutoplayDelegate<u32> for RecordingDelegate {
    fn on_switch(&self, identity: &u32) {
        self.switches.lock().push(*identity);
    }
}

/// Rows 1..=3 stacked 80 points apart, each 80 tall.
fn three_rows() -> (Arc<FeedList>, Vec<Arc<Cell>>) {
    let cells = vec![Cell::new(0.0, 80.0), Cell::new(80.0, 160.0), Cell::new(160.0, 240.0)];
    let list = FeedList::new(
        cells
            .iter()
            .enumerate()
            .map(|(i, cell)| (i as u32 + 1, Arc::clone(cell)))
            .collect(),
    );
    (list, cells)
}

/// Run one drag gesture that ends with deceleration.
fn fling(autoplay: &mut AutoplayCoordinator<u32>, list: &FeedList, offset: f64) {
    autoplay.will_begin_dragging();
    list.scroll_to(offset);
    autoplay.did_scroll();
    autoplay.will_end_dragging();
    autoplay.did_end_dragging(true);
    autoplay.will_begin_decelerating();
    autoplay.did_end_decelerating();
}

// ============================================================================
// Settlement protocol (mock-verified call counts)
// ============================================================================

mock! {
    Source {}

    impl CandidateSource<u32> for Source {
        fn viewport(&self) -> Viewport;
        fn candidates(&self) -> Vec<u32>;
        fn candidate(&self, identity: &u32) -> Option<Arc<dyn AutoplayCandidate>>;
    }
}

mock! {
    Candidate {}

    impl Playable for Candidate {
        fn is_playing(&self) -> bool;
        fn play(&self);
        fn pause(&self);
    }

    impl Visible for Candidate {
        fn frame_in_viewport(&self) -> Rect;
    }
}

#[test]
fn test_decelerating_gesture_evaluates_exactly_once() {
    let mut candidate = MockCandidate::new();
    candidate
        .expect_frame_in_viewport()
        .times(1)
        .return_const(Rect::from_vertical_span(0.0, 100.0));
    candidate.expect_play().times(1).return_const(());
    candidate.expect_pause().never();
    let candidate = Arc::new(candidate);

    let mut source = MockSource::new();
    // One viewport read per evaluation.
    source
        .expect_viewport()
        .times(1)
        .return_const(Viewport::new(0.0, 100.0));
    source.expect_candidates().times(1).returning(|| vec![7]);
    source
        .expect_candidate()
        .returning(move |_| Some(Arc::clone(&candidate) as Arc<dyn AutoplayCandidate>));
    let source = Arc::new(source);

    let mut autoplay = AutoplayCoordinator::new(&source);

    autoplay.will_begin_dragging();
    autoplay.did_scroll();
    autoplay.did_scroll();
    autoplay.did_scroll();
    autoplay.will_end_dragging();
    autoplay.did_end_dragging(true);
    assert_eq!(autoplay.current_playing(), None);
    assert!(autoplay.is_drag_scrolling());

    autoplay.will_begin_decelerating();
    autoplay.did_end_decelerating();
    assert_eq!(autoplay.current_playing(), Some(&7));
    assert!(!autoplay.is_drag_scrolling());
}

#[test]
fn test_drag_without_deceleration_settles_on_end_dragging() {
    let mut source = MockSource::new();
    source
        .expect_viewport()
        .times(1)
        .return_const(Viewport::new(0.0, 100.0));
    source.expect_candidates().times(1).returning(Vec::new);
    let source = Arc::new(source);

    let mut autoplay = AutoplayCoordinator::new(&source);
    autoplay.will_begin_dragging();
    autoplay.did_scroll();
    autoplay.will_end_dragging();
    autoplay.did_end_dragging(false);

    // A stray deceleration end for the same gesture must not evaluate again.
    autoplay.did_end_decelerating();
}

#[test]
fn test_scrolls_without_drag_do_not_evaluate() {
    let mut source = MockSource::new();
    source.expect_viewport().never();
    let source = Arc::new(source);

    let mut autoplay = AutoplayCoordinator::new(&source)
        .with_config(AutoplayConfig::default().with_play_while_dragging(true))
        .unwrap();

    // Programmatic scroll and deceleration with no drag behind them.
    autoplay.did_scroll();
    autoplay.will_begin_decelerating();
    autoplay.did_end_decelerating();
}

#[test]
fn test_play_while_dragging_evaluates_each_scroll() {
    let mut source = MockSource::new();
    // Three scrolls plus the settlement.
    source
        .expect_viewport()
        .times(4)
        .return_const(Viewport::new(0.0, 100.0));
    source.expect_candidates().times(4).returning(Vec::new);
    let source = Arc::new(source);

    let mut autoplay = AutoplayCoordinator::new(&source)
        .with_config(AutoplayConfig::default().with_play_while_dragging(true))
        .unwrap();

    autoplay.will_begin_dragging();
    autoplay.did_scroll();
    autoplay.did_scroll();
    autoplay.did_scroll();
    autoplay.did_end_dragging(false);
}

// ============================================================================
// Switching
// ============================================================================

#[test]
fn test_switch_pauses_old_and_plays_new() {
    let (list, cells) = three_rows();
    let delegate = Arc::new(RecordingDelegate::default());
    let bus = EventBus::new(16);
    let mut events = bus.subscribe();

    let mut autoplay = AutoplayCoordinator::new(&list)
        .with_delegate(&delegate)
        .with_event_bus(bus);

    autoplay.reload();
    assert_eq!(autoplay.current_playing(), Some(&1));
    assert!(cells[0].is_playing_now());

    fling(&mut autoplay, &list, 90.0);
    assert_eq!(autoplay.current_playing(), Some(&2));
    assert_eq!(cells[0].pauses(), 1);
    assert_eq!(cells[1].plays(), 1);
    assert_eq!(cells[2].plays(), 0);
    assert_eq!(*delegate.switches.lock(), vec![1, 2]);

    assert_eq!(
        events.try_recv().unwrap(),
        CoreEvent::Autoplay(AutoplayEvent::Switched {
            from: None,
            to: "1".to_string(),
        })
    );
    assert_eq!(
        events.try_recv().unwrap(),
        CoreEvent::Autoplay(AutoplayEvent::Switched {
            from: Some("1".to_string()),
            to: "2".to_string(),
        })
    );
}

#[test]
fn test_same_candidate_is_not_replayed() {
    let (list, cells) = three_rows();
    let mut autoplay = AutoplayCoordinator::new(&list);

    autoplay.reload();
    fling(&mut autoplay, &list, 10.0);
    fling(&mut autoplay, &list, 20.0);

    assert_eq!(autoplay.current_playing(), Some(&1));
    assert_eq!(cells[0].plays(), 1);
    assert_eq!(cells[0].pauses(), 0);

    // Paused from elsewhere (e.g. the user tapped pause): the next
    // evaluation resumes it without a pause/play cycle.
    Playable::pause(cells[0].as_ref());
    fling(&mut autoplay, &list, 15.0);
    assert_eq!(cells[0].plays(), 2);
    assert_eq!(cells[0].pauses(), 1);
}

#[test]
fn test_nothing_visible_keeps_current() {
    let (list, cells) = three_rows();
    let mut autoplay = AutoplayCoordinator::new(&list);
    autoplay.reload();

    fling(&mut autoplay, &list, 1000.0);
    assert_eq!(autoplay.current_playing(), Some(&1));
    assert_eq!(cells[0].pauses(), 0);
}

#[test]
fn test_min_visible_extent_filters_slivers() {
    let (list, cells) = three_rows();
    // Only the last 10 points of row 3 remain on screen.
    list.scroll_to(230.0);

    let mut strict = AutoplayCoordinator::new(&list)
        .with_config(AutoplayConfig::default().with_min_visible_extent(20.0))
        .unwrap();
    strict.reload();
    assert_eq!(strict.current_playing(), None);
    assert_eq!(cells[2].plays(), 0);

    let mut lenient = AutoplayCoordinator::new(&list);
    lenient.reload();
    assert_eq!(lenient.current_playing(), Some(&3));
}

#[test]
fn test_invalid_config_is_rejected() {
    let (list, _cells) = three_rows();
    let result = AutoplayCoordinator::new(&list)
        .with_config(AutoplayConfig::default().with_min_visible_extent(f64::NAN));
    assert!(result.is_err());
}

// ============================================================================
// Suspension, stop, end of display
// ============================================================================

#[test]
fn test_suspension_pauses_and_resumes_immediately() {
    let (list, cells) = three_rows();
    let bus = EventBus::new(16);
    let mut events = bus.subscribe();
    let mut autoplay = AutoplayCoordinator::new(&list).with_event_bus(bus);
    autoplay.reload();

    autoplay.set_autoplay_suspended(true);
    assert!(autoplay.is_autoplay_suspended());
    assert!(!cells[0].is_playing_now());
    assert_eq!(autoplay.current_playing(), Some(&1));

    // Scrolling while suspended never starts anything.
    fling(&mut autoplay, &list, 90.0);
    assert_eq!(cells[1].plays(), 0);

    autoplay.set_autoplay_suspended(false);
    assert_eq!(autoplay.current_playing(), Some(&2));
    assert!(cells[1].is_playing_now());

    let suspension: Vec<bool> = std::iter::from_fn(|| events.try_recv().ok())
        .filter_map(|event| match event {
            CoreEvent::Autoplay(AutoplayEvent::SuspensionChanged { suspended }) => Some(suspended),
            _ => None,
        })
        .collect();
    assert_eq!(suspension, vec![true, false]);
}

#[test]
fn test_resume_during_drag_waits_for_settlement() {
    let (list, cells) = three_rows();
    let mut autoplay = AutoplayCoordinator::new(&list);
    autoplay.set_autoplay_suspended(true);
    assert_eq!(cells[0].plays(), 0);

    autoplay.will_begin_dragging();
    autoplay.set_autoplay_suspended(false);
    assert_eq!(cells[0].plays(), 0);

    autoplay.did_end_dragging(false);
    assert_eq!(cells[0].plays(), 1);
}

#[test]
fn test_stop_and_end_displaying() {
    let (list, cells) = three_rows();
    let mut autoplay = AutoplayCoordinator::new(&list);
    autoplay.reload();

    autoplay.did_end_displaying(&2);
    assert_eq!(autoplay.current_playing(), Some(&1));

    autoplay.did_end_displaying(&1);
    assert_eq!(autoplay.current_playing(), None);
    assert_eq!(cells[0].pauses(), 1);

    autoplay.reload();
    autoplay.stop();
    assert_eq!(autoplay.current_playing(), None);
    assert_eq!(cells[0].pauses(), 2);

    // Nothing to stop.
    autoplay.stop();
    assert_eq!(cells[0].pauses(), 2);
}

#[test]
fn test_reload_is_deferred_while_dragging() {
    let (list, cells) = three_rows();
    let mut autoplay = AutoplayCoordinator::new(&list);

    autoplay.will_begin_dragging();
    autoplay.reload();
    assert_eq!(cells[0].plays(), 0);

    autoplay.did_end_dragging(false);
    assert_eq!(cells[0].plays(), 1);
}

// ============================================================================
// Weak references
// ============================================================================

#[test]
fn test_removed_rows_are_skipped() {
    let (list, cells) = three_rows();
    let mut autoplay = AutoplayCoordinator::new(&list);
    autoplay.reload();

    list.remove(1);
    autoplay.reload();
    assert_eq!(autoplay.current_playing(), Some(&2));
    // Row 1 is gone, so it could not be paused through the list.
    assert_eq!(cells[0].pauses(), 0);
}

/// Source whose candidates vanish after their frame has been read.
struct VanishingSource {
    cell: Mutex<Option<Arc<Cell>>>,
}

impl CandidateSource<u32> for VanishingSource {
    fn viewport(&self) -> Viewport {
        Viewport::new(0.0, 100.0)
    }

    fn candidates(&self) -> Vec<u32> {
        vec![1]
    }

    fn candidate(&self, _identity: &u32) -> Option<Arc<dyn AutoplayCandidate>> {
        self.cell
            .lock()
            .take()
            .map(|cell| cell as Arc<dyn AutoplayCandidate>)
    }
}

#[test]
fn test_candidate_vanishing_before_play_is_a_noop() {
    let cell = Cell::new(0.0, 100.0);
    let source = Arc::new(VanishingSource {
        cell: Mutex::new(Some(Arc::clone(&cell))),
    });
    let mut autoplay = AutoplayCoordinator::new(&source);

    autoplay.reload();
    assert_eq!(autoplay.current_playing(), None);
    assert_eq!(cell.plays(), 0);
}

/// Wraps a list so that one row stops resolving after a fixed number of lookups.
struct ExpiringSource {
    list: Arc<FeedList>,
    expiring: Mutex<Option<(u32, usize)>>,
}

impl CandidateSource<u32> for ExpiringSource {
    fn viewport(&self) -> Viewport {
        self.list.viewport()
    }

    fn candidates(&self) -> Vec<u32> {
        self.list.candidates()
    }

    fn candidate(&self, identity: &u32) -> Option<Arc<dyn AutoplayCandidate>> {
        if let Some((id, remaining)) = self.expiring.lock().as_mut() {
            if *id == *identity {
                if *remaining == 0 {
                    return None;
                }
                *remaining -= 1;
            }
        }
        self.list.candidate(identity)
    }
}

#[test]
fn test_switch_to_vanished_candidate_keeps_current_playing() {
    let (list, cells) = three_rows();
    let source = Arc::new(ExpiringSource {
        list: Arc::clone(&list),
        expiring: Mutex::new(None),
    });
    let mut autoplay = AutoplayCoordinator::new(&source);

    autoplay.reload();
    assert_eq!(autoplay.current_playing(), Some(&1));

    // Row 2 becomes the best candidate but is gone once its frame was read.
    *source.expiring.lock() = Some((2, 1));
    list.scroll_to(90.0);
    autoplay.reload();

    assert_eq!(autoplay.current_playing(), Some(&1));
    assert!(cells[0].is_playing_now());
    assert_eq!(cells[0].pauses(), 0);
    assert_eq!(cells[1].plays(), 0);
}

#[test]
fn test_dropped_list_and_delegate_are_tolerated() {
    let (list, cells) = three_rows();
    let delegate = Arc::new(RecordingDelegate::default());
    let mut autoplay = AutoplayCoordinator::new(&list).with_delegate(&delegate);

    drop(delegate);
    autoplay.reload();
    assert_eq!(autoplay.current_playing(), Some(&1));

    drop(list);
    autoplay.set_autoplay_suspended(true);
    autoplay.stop();
    fling_without_list(&mut autoplay);
    // The cell is only reachable through the dropped list, so it keeps playing.
    assert!(cells[0].is_playing_now());
}

fn fling_without_list(autoplay: &mut AutoplayCoordinator<u32>) {
    autoplay.will_begin_dragging();
    autoplay.did_scroll();
    autoplay.did_end_dragging(true);
    autoplay.did_end_decelerating();
}

#[test]
fn test_coordinator_does_not_extend_list_lifetime() {
    let (list, _cells) = three_rows();
    let autoplay = AutoplayCoordinator::new(&list);
    assert_eq!(Arc::strong_count(&list), 1);
    drop(autoplay);
}

//! Collection row layout.
//!
//! Every collection renders as one horizontal row in which all artworks share
//! the same height and keep their aspect ratio:
//!
//! ```text
//! candidate_i = standard_width / aspect_i
//! row_height  = clamp(max(candidate_i), min_row_height, max_row_height)
//! width_i     = row_height * aspect_i
//! ```
//!
//! The tallest candidate wins, so the narrowest (most portrait) artwork
//! decides the row height. A failed probe contributes the fallback aspect
//! ratio of 1.5. If every probe in the collection fails, the row uses
//! `fallback_row_height` instead.
//!
//! ## Barrier
//!
//! [`layout_collection`] starts one probe per artwork and only computes the
//! layout once all of them have settled. Outcomes are kept by artwork
//! position and the row height is a maximum, so the order in which probes
//! finish never changes the result.
//!
//! ## Render passes
//!
//! A [`LayoutBoard`] collects the rows of the current render pass. Each pass
//! gets a [`RenderToken`]; rows finished under an older token are dropped, so
//! a re-render never shows geometry computed for a previous catalog.
//!
//! ## Scrolling
//!
//! [`RowScroller`] keeps the horizontal position of one row within
//! `[0, max(0, content_width - viewport_width)]`. Arrow navigation steps by
//! `scroll_step`; a [`SwipeGesture`] steps once when the finger travels
//! further than `swipe_threshold`.

use crate::config::LayoutConfig;
use crate::probe::{ImageProbe, ProbeOutcome, lock, spawn_probe};
use crate::types::{CatalogSnapshot, Collection};
use std::sync::Mutex;

/// Geometry of one artwork in a row.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemGeometry {
    pub artwork_id: String,
    /// Distance from the start of the row.
    pub offset: f64,
    pub width: f64,
    pub height: f64,
    pub aspect_ratio: f64,
    /// `false` when the fallback aspect ratio was substituted.
    pub resolved: bool,
}

/// Layout of one collection row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowLayout {
    pub collection_id: String,
    pub row_height: f64,
    pub items: Vec<ItemGeometry>,
    /// Sum of the item widths.
    pub content_width: f64,
}

impl RowLayout {
    /// Number of items laid out with the fallback aspect ratio.
    pub fn fallback_count(&self) -> usize {
        self.items.iter().filter(|i| !i.resolved).count()
    }
}

/// Compute the row layout from settled probe outcomes, given in artwork order.
pub fn compute_row_layout(
    collection_id: &str,
    outcomes: &[(String, ProbeOutcome)],
    config: &LayoutConfig,
) -> RowLayout {
    let any_resolved = outcomes.iter().any(|(_, o)| o.is_resolved());
    let row_height = if any_resolved {
        let tallest = outcomes
            .iter()
            .map(|(_, o)| config.standard_width / o.dimension().aspect_ratio)
            .fold(0.0, f64::max);
        tallest.max(config.min_row_height).min(config.max_row_height)
    } else {
        config.fallback_row_height
    };

    let mut offset = 0.0;
    let items = outcomes
        .iter()
        .map(|(artwork_id, outcome)| {
            let aspect_ratio = outcome.dimension().aspect_ratio;
            let width = row_height * aspect_ratio;
            let item = ItemGeometry {
                artwork_id: artwork_id.clone(),
                offset,
                width,
                height: row_height,
                aspect_ratio,
                resolved: outcome.is_resolved(),
            };
            offset += width;
            item
        })
        .collect();

    RowLayout {
        collection_id: collection_id.to_string(),
        row_height,
        items,
        content_width: offset,
    }
}

/// Probe every artwork of `collection` concurrently and lay out the row once
/// all probes have settled.
#[tracing::instrument(skip_all, fields(collection = %collection.id, artworks = collection.artworks.len()))]
pub async fn layout_collection<P: ImageProbe + ?Sized>(
    probe: &P,
    collection: &Collection,
    config: &LayoutConfig,
) -> RowLayout {
    let pending: Vec<_> = collection
        .artworks
        .iter()
        .map(|artwork| spawn_probe(probe, &artwork.image_ref))
        .collect();

    let mut outcomes = Vec::with_capacity(pending.len());
    for (artwork, pending) in collection.artworks.iter().zip(pending) {
        outcomes.push((artwork.id.clone(), pending.settled().await));
    }

    let layout = compute_row_layout(&collection.id, &outcomes, config);
    if layout.fallback_count() > 0 {
        tracing::warn!(
            fallbacks = layout.fallback_count(),
            "some images could not be measured"
        );
    }
    layout
}

/// Lay out every collection of a catalog, in catalog order.
pub async fn layout_catalog<P: ImageProbe + ?Sized>(
    probe: &P,
    snapshot: &CatalogSnapshot,
    config: &LayoutConfig,
) -> Vec<RowLayout> {
    let mut rows = Vec::with_capacity(snapshot.collections.len());
    for collection in &snapshot.collections {
        rows.push(layout_collection(probe, collection, config).await);
    }
    rows
}

/// Identifies one render pass of a [`LayoutBoard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderToken(u64);

/// Rows of the current render pass.
#[derive(Debug, Default)]
pub struct LayoutBoard {
    generation: u64,
    rows: Vec<RowLayout>,
}

impl LayoutBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new pass. Rows of earlier passes are discarded and their
    /// tokens stop being accepted.
    pub fn begin_pass(&mut self) -> RenderToken {
        self.generation += 1;
        self.rows.clear();
        RenderToken(self.generation)
    }

    pub fn is_current(&self, token: RenderToken) -> bool {
        token.0 == self.generation
    }

    /// Record a finished row. Returns `false` and drops the row when `token`
    /// belongs to an earlier pass.
    pub fn apply(&mut self, token: RenderToken, layout: RowLayout) -> bool {
        if !self.is_current(token) {
            tracing::debug!(collection = %layout.collection_id, "dropping layout from stale render pass");
            return false;
        }
        match self
            .rows
            .iter_mut()
            .find(|r| r.collection_id == layout.collection_id)
        {
            Some(row) => *row = layout,
            None => self.rows.push(layout),
        }
        true
    }

    pub fn rows(&self) -> &[RowLayout] {
        &self.rows
    }

    pub fn row(&self, collection_id: &str) -> Option<&RowLayout> {
        self.rows.iter().find(|r| r.collection_id == collection_id)
    }
}

/// Run one render pass over `snapshot`, applying each row as it completes.
///
/// Returns the number of rows applied; the pass stops early once a newer
/// pass has begun.
pub async fn render_catalog<P: ImageProbe + ?Sized>(
    probe: &P,
    board: &Mutex<LayoutBoard>,
    snapshot: &CatalogSnapshot,
    config: &LayoutConfig,
) -> usize {
    let token = lock(board).begin_pass();
    let mut applied = 0;
    for collection in &snapshot.collections {
        let layout = layout_collection(probe, collection, config).await;
        if !lock(board).apply(token, layout) {
            break;
        }
        applied += 1;
    }
    applied
}

/// Horizontal scroll state of one row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowScroller {
    position: f64,
    content_width: f64,
    viewport_width: f64,
    step: f64,
    item_offsets: Vec<f64>,
}

impl RowScroller {
    pub fn new(content_width: f64, viewport_width: f64, step: f64) -> Self {
        Self {
            position: 0.0,
            content_width: content_width.max(0.0),
            viewport_width: viewport_width.max(0.0),
            step,
            item_offsets: Vec::new(),
        }
    }

    pub fn for_row(layout: &RowLayout, viewport_width: f64, config: &LayoutConfig) -> Self {
        Self {
            item_offsets: layout.items.iter().map(|i| i.offset).collect(),
            ..Self::new(layout.content_width, viewport_width, config.scroll_step)
        }
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    /// Largest reachable position.
    pub fn max_position(&self) -> f64 {
        (self.content_width - self.viewport_width).max(0.0)
    }

    pub fn can_scroll_prev(&self) -> bool {
        self.position > 0.0
    }

    pub fn can_scroll_next(&self) -> bool {
        self.position < self.max_position()
    }

    /// Move to `x`, clamped to the scrollable range. Returns the new position.
    pub fn scroll_to(&mut self, x: f64) -> f64 {
        self.position = x.max(0.0).min(self.max_position());
        self.position
    }

    pub fn scroll_by(&mut self, dx: f64) -> f64 {
        self.scroll_to(self.position + dx)
    }

    pub fn next(&mut self) -> f64 {
        self.scroll_by(self.step)
    }

    pub fn prev(&mut self) -> f64 {
        self.scroll_by(-self.step)
    }

    /// Bring item `index` to the start of the viewport, as far as the range
    /// allows. Unknown indices leave the position unchanged.
    pub fn jump_to_item(&mut self, index: usize) -> f64 {
        match self.item_offsets.get(index) {
            Some(&offset) => self.scroll_to(offset),
            None => self.position,
        }
    }

    /// Change the viewport width and re-clamp the position.
    pub fn resize(&mut self, viewport_width: f64) -> f64 {
        self.viewport_width = viewport_width.max(0.0);
        self.scroll_to(self.position)
    }

    /// Step according to a finished swipe.
    pub fn apply_swipe(&mut self, swipe: Option<SwipeDirection>) -> f64 {
        match swipe {
            Some(SwipeDirection::Next) => self.next(),
            Some(SwipeDirection::Previous) => self.prev(),
            None => self.position,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    Next,
    Previous,
}

/// A touch drag across a row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwipeGesture {
    start_x: f64,
    threshold: f64,
}

impl SwipeGesture {
    pub fn begin(start_x: f64, threshold: f64) -> Self {
        Self { start_x, threshold }
    }

    /// Direction of the swipe, if the finger moved further than the threshold.
    /// Moving left reveals the next items.
    pub fn finish(self, end_x: f64) -> Option<SwipeDirection> {
        let delta = end_x - self.start_x;
        if delta < -self.threshold {
            Some(SwipeDirection::Next)
        } else if delta > self.threshold {
            Some(SwipeDirection::Previous)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::Dimensions;
    use crate::probe::tests::MockProbe;
    use crate::test_helpers::collection;
    use proptest::prelude::*;

    const EPSILON: f64 = 1e-9;

    fn resolved(id: &str, width: u32, height: u32) -> (String, ProbeOutcome) {
        (
            id.to_string(),
            ProbeOutcome::Resolved(Dimensions { width, height }),
        )
    }

    fn failed(id: &str) -> (String, ProbeOutcome) {
        (id.to_string(), ProbeOutcome::Fallback)
    }

    fn assert_row_invariant(layout: &RowLayout, config: &LayoutConfig) {
        for item in &layout.items {
            assert_eq!(item.height, layout.row_height);
            assert!((item.width - layout.row_height * item.aspect_ratio).abs() < EPSILON);
        }
        if layout.items.iter().any(|i| i.resolved) {
            assert!(layout.row_height >= config.min_row_height);
            assert!(layout.row_height <= config.max_row_height);
        }
    }

    // =========================================================================
    // compute_row_layout() tests
    // =========================================================================

    #[test]
    fn portrait_item_sets_row_height() {
        let config = LayoutConfig::default();
        let layout = compute_row_layout(
            "c",
            &[resolved("wide", 300, 200), resolved("tall", 200, 250)],
            &config,
        );
        // tall: 250 / 0.8 = 312.5 beats wide: 250 / 1.5
        assert!((layout.row_height - 312.5).abs() < EPSILON);
        assert!((layout.items[0].width - 468.75).abs() < EPSILON);
        assert!((layout.items[1].width - 250.0).abs() < EPSILON);
        assert!((layout.content_width - 718.75).abs() < EPSILON);
        assert_row_invariant(&layout, &config);
    }

    #[test]
    fn row_height_clamped_to_max() {
        let config = LayoutConfig::default();
        let layout = compute_row_layout(
            "c",
            &[resolved("a", 300, 200), resolved("needle", 100, 200)],
            &config,
        );
        assert_eq!(layout.row_height, 400.0);
        assert_eq!(layout.items[0].width, 600.0);
        assert_eq!(layout.items[1].width, 200.0);
    }

    #[test]
    fn row_height_clamped_to_min() {
        let config = LayoutConfig::default();
        let layout = compute_row_layout("c", &[resolved("pano", 400, 100)], &config);
        assert_eq!(layout.row_height, 150.0);
        assert_eq!(layout.items[0].width, 600.0);
    }

    #[test]
    fn square_item_uses_standard_width() {
        let layout = compute_row_layout("c", &[resolved("sq", 50, 50)], &LayoutConfig::default());
        assert_eq!(layout.row_height, 250.0);
        assert_eq!(layout.items[0].width, 250.0);
    }

    #[test]
    fn failed_probe_uses_fallback_aspect() {
        let config = LayoutConfig::default();
        let layout = compute_row_layout("c", &[resolved("sq", 50, 50), failed("x")], &config);
        assert_eq!(layout.row_height, 250.0);
        assert_eq!(layout.items[1].aspect_ratio, 1.5);
        assert_eq!(layout.items[1].width, 375.0);
        assert!(!layout.items[1].resolved);
        assert_eq!(layout.fallback_count(), 1);
    }

    #[test]
    fn all_failed_uses_fallback_height() {
        let config = LayoutConfig::default();
        let layout = compute_row_layout("c", &[failed("a"), failed("b")], &config);
        assert_eq!(layout.row_height, 200.0);
        assert!(layout.items.iter().all(|i| i.width == 300.0));
        assert_eq!(layout.content_width, 600.0);
    }

    #[test]
    fn empty_collection_has_no_items() {
        let layout = compute_row_layout("c", &[], &LayoutConfig::default());
        assert!(layout.items.is_empty());
        assert_eq!(layout.row_height, 200.0);
        assert_eq!(layout.content_width, 0.0);
    }

    #[test]
    fn item_offsets_accumulate() {
        let layout = compute_row_layout(
            "c",
            &[resolved("a", 50, 50), resolved("b", 100, 50), resolved("c", 50, 50)],
            &LayoutConfig::default(),
        );
        let offsets: Vec<f64> = layout.items.iter().map(|i| i.offset).collect();
        assert_eq!(offsets, vec![0.0, 250.0, 750.0]);
    }

    proptest! {
        #[test]
        fn rows_share_height_and_keep_aspect(
            dims in prop::collection::vec((1u32..5000, 1u32..5000), 1..12)
        ) {
            let config = LayoutConfig::default();
            let outcomes: Vec<_> = dims
                .iter()
                .enumerate()
                .map(|(i, &(w, h))| resolved(&format!("a{i}"), w, h))
                .collect();
            let layout = compute_row_layout("c", &outcomes, &config);
            prop_assert!(layout.row_height >= config.min_row_height);
            prop_assert!(layout.row_height <= config.max_row_height);
            for item in &layout.items {
                prop_assert_eq!(item.height, layout.row_height);
                prop_assert!((item.width - layout.row_height * item.aspect_ratio).abs() < 1e-6);
            }
        }
    }

    // =========================================================================
    // layout_collection() barrier tests
    // =========================================================================

    fn mixed_probe(delays: &[usize]) -> MockProbe {
        let sizes = [(300, 200), (200, 250), (640, 480), (100, 100), (1200, 400)];
        let mut probe = MockProbe::new();
        for (i, &(w, h)) in sizes.iter().enumerate() {
            let reference = format!("a{i}.jpg");
            probe = probe.with(&reference, w, h);
            if let Some(&delay) = delays.get(i) {
                probe = probe.delayed(&reference, delay);
            }
        }
        // a5 has no image and falls back
        probe
    }

    fn six_artworks() -> Collection {
        collection("gallery", &["a0", "a1", "a2", "a3", "a4", "a5"])
    }

    #[tokio::test]
    async fn waits_for_every_probe() {
        let probe = mixed_probe(&[0, 40, 0, 0, 0]);
        let layout = layout_collection(&probe, &six_artworks(), &LayoutConfig::default()).await;

        assert_eq!(layout.items.len(), 6);
        // The slow portrait probe still determines the height
        assert!((layout.row_height - 312.5).abs() < EPSILON);
        assert!(layout.items[1].resolved);
        assert_eq!(layout.fallback_count(), 1);
        assert_row_invariant(&layout, &LayoutConfig::default());
    }

    #[tokio::test]
    async fn arrival_order_does_not_matter() {
        let config = LayoutConfig::default();
        let in_order = mixed_probe(&[0, 1, 2, 3, 4]);
        let reversed = mixed_probe(&[8, 6, 4, 2, 0]);

        let a = layout_collection(&in_order, &six_artworks(), &config).await;
        let b = layout_collection(&reversed, &six_artworks(), &config).await;

        assert_ne!(in_order.get_completed(), reversed.get_completed());
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn layout_follows_artwork_order() {
        let probe = mixed_probe(&[9, 0, 0, 0, 0]);
        let layout = layout_collection(&probe, &six_artworks(), &LayoutConfig::default()).await;
        let ids: Vec<&str> = layout.items.iter().map(|i| i.artwork_id.as_str()).collect();
        assert_eq!(ids, vec!["a0", "a1", "a2", "a3", "a4", "a5"]);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn barrier_is_deterministic(delays in prop::collection::vec(0usize..30, 5)) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            let config = LayoutConfig::default();
            let baseline = runtime.block_on(layout_collection(&mixed_probe(&[]), &six_artworks(), &config));
            let raced = runtime.block_on(layout_collection(&mixed_probe(&delays), &six_artworks(), &config));
            prop_assert_eq!(baseline, raced);
        }
    }

    #[tokio::test]
    async fn all_failures_yield_usable_row() {
        let probe = MockProbe::new();
        let layout = layout_collection(&probe, &six_artworks(), &LayoutConfig::default()).await;
        assert_eq!(layout.row_height, 200.0);
        assert_eq!(layout.fallback_count(), 6);
    }

    // =========================================================================
    // LayoutBoard tests
    // =========================================================================

    #[test]
    fn board_accepts_current_pass() {
        let mut board = LayoutBoard::new();
        let token = board.begin_pass();
        let row = compute_row_layout("c", &[failed("a")], &LayoutConfig::default());
        assert!(board.apply(token, row.clone()));
        assert_eq!(board.row("c"), Some(&row));
    }

    #[test]
    fn board_replaces_row_of_same_collection() {
        let mut board = LayoutBoard::new();
        let token = board.begin_pass();
        let config = LayoutConfig::default();
        board.apply(token, compute_row_layout("c", &[failed("a")], &config));
        board.apply(token, compute_row_layout("c", &[resolved("a", 1, 1)], &config));
        assert_eq!(board.rows().len(), 1);
        assert!(board.rows()[0].items[0].resolved);
    }

    #[test]
    fn board_rejects_stale_pass() {
        let mut board = LayoutBoard::new();
        let old = board.begin_pass();
        let current = board.begin_pass();
        let row = compute_row_layout("c", &[failed("a")], &LayoutConfig::default());
        assert!(!board.apply(old, row.clone()));
        assert!(board.rows().is_empty());
        assert!(board.is_current(current));
    }

    #[tokio::test]
    async fn rerender_discards_previous_pass() {
        let snapshot = crate::types::CatalogSnapshot::new(
            vec![
                collection("first", &["a0"]),
                collection("second", &["a1"]),
            ],
            chrono::DateTime::<chrono::Utc>::UNIX_EPOCH,
        );
        let probe = mixed_probe(&[0, 60]);
        let board = Mutex::new(LayoutBoard::new());
        let config = LayoutConfig::default();

        let rerender = async {
            // Once the first row lands, start a new pass
            while lock(&board).rows().is_empty() {
                tokio::task::yield_now().await;
            }
            lock(&board).begin_pass()
        };

        let (applied, newer) = tokio::join!(render_catalog(&probe, &board, &snapshot, &config), rerender);
        assert_eq!(applied, 1);
        let board = lock(&board);
        assert!(board.is_current(newer));
        assert!(board.rows().is_empty());
    }

    // =========================================================================
    // RowScroller / SwipeGesture tests
    // =========================================================================

    #[test]
    fn scroll_clamped_to_range() {
        let mut scroller = RowScroller::new(1000.0, 400.0, 250.0);
        assert_eq!(scroller.max_position(), 600.0);
        assert_eq!(scroller.scroll_to(-50.0), 0.0);
        assert_eq!(scroller.scroll_to(900.0), 600.0);
        assert!(!scroller.can_scroll_next());
        assert!(scroller.can_scroll_prev());
    }

    #[test]
    fn short_content_never_scrolls() {
        let mut scroller = RowScroller::new(300.0, 800.0, 250.0);
        assert_eq!(scroller.max_position(), 0.0);
        assert_eq!(scroller.next(), 0.0);
        assert!(!scroller.can_scroll_next());
    }

    #[test]
    fn arrows_step_by_item_width() {
        let mut scroller = RowScroller::new(1000.0, 400.0, 250.0);
        assert_eq!(scroller.next(), 250.0);
        assert_eq!(scroller.next(), 500.0);
        assert_eq!(scroller.next(), 600.0);
        assert_eq!(scroller.prev(), 350.0);
    }

    #[test]
    fn resize_reclamps_position() {
        let mut scroller = RowScroller::new(1000.0, 400.0, 250.0);
        scroller.scroll_to(600.0);
        assert_eq!(scroller.resize(700.0), 300.0);
        assert_eq!(scroller.resize(1200.0), 0.0);
    }

    #[test]
    fn jump_to_item_uses_offsets() {
        let config = LayoutConfig::default();
        let layout = compute_row_layout(
            "c",
            &[resolved("a", 50, 50), resolved("b", 50, 50), resolved("c", 50, 50)],
            &config,
        );
        let mut scroller = RowScroller::for_row(&layout, 300.0, &config);
        assert_eq!(scroller.jump_to_item(1), 250.0);
        assert_eq!(scroller.jump_to_item(2), 450.0);
        assert_eq!(scroller.jump_to_item(7), 450.0);
    }

    #[test]
    fn swipe_needs_threshold() {
        assert_eq!(SwipeGesture::begin(200.0, 50.0).finish(170.0), None);
        assert_eq!(SwipeGesture::begin(200.0, 50.0).finish(150.0), None);
        assert_eq!(
            SwipeGesture::begin(200.0, 50.0).finish(120.0),
            Some(SwipeDirection::Next)
        );
        assert_eq!(
            SwipeGesture::begin(200.0, 50.0).finish(260.0),
            Some(SwipeDirection::Previous)
        );
    }

    #[test]
    fn swipe_steps_scroller() {
        let mut scroller = RowScroller::new(1000.0, 400.0, 250.0);
        let swipe = SwipeGesture::begin(300.0, 50.0).finish(100.0);
        assert_eq!(scroller.apply_swipe(swipe), 250.0);
        let swipe = SwipeGesture::begin(100.0, 50.0).finish(300.0);
        assert_eq!(scroller.apply_swipe(swipe), 0.0);
        assert_eq!(scroller.apply_swipe(None), 0.0);
    }

    proptest! {
        #[test]
        fn scroll_always_in_range(
            content in 0.0f64..5000.0,
            viewport in 0.0f64..2000.0,
            moves in prop::collection::vec(-3000.0f64..3000.0, 0..20),
        ) {
            let mut scroller = RowScroller::new(content, viewport, 250.0);
            for dx in moves {
                let position = scroller.scroll_by(dx);
                prop_assert!(position >= 0.0);
                prop_assert!(position <= (content - viewport).max(0.0));
            }
        }
    }
}

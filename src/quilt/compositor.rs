use super::QuiltLayout;
use itertools::iproduct;
use std::{error::Error, fmt};

/// Grid position of a view. `(0, 0)` is the first view of the quilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewIndex {
    pub x: u32,
    pub y: u32,
}

impl fmt::Display for ViewIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A pixel rectangle in the quilt texture. The origin is the bottom-left corner, the way
/// the bridge reads quilts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn top(&self) -> u32 {
        self.y + self.height
    }

    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    #[cfg(test)]
    pub fn overlaps(&self, other: &PixelRect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.top()
            && other.y < self.top()
    }

    /// The same rectangle measured from the top edge of a target `target_height` pixels
    /// high, for APIs whose framebuffer origin is the top-left corner.
    pub fn flipped(&self, target_height: u32) -> PixelRect {
        PixelRect {
            x: self.x,
            y: target_height.saturating_sub(self.top()),
            width: self.width,
            height: self.height,
        }
    }
}

/// Everything a scene renderer needs to draw one view of the quilt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTile {
    pub index: ViewIndex,
    /// Row-major index, ignoring the vertical inversion of the tile placement.
    pub linear_index: u32,
    pub rect: PixelRect,
    /// Horizontal eye translation for this view.
    pub camera_offset: f32,
}

/// Horizontal camera translation of view `linear_index`, spread symmetrically around zero.
pub fn camera_offset(step: f32, linear_index: u32, total_views: u32) -> f32 {
    let center = (total_views.saturating_sub(1)) as f32 / 2.0;
    step * (linear_index as f32 - center)
}

/// The tiles of `layout` in composition order.
///
/// Rows are walked first to last, but row `y` is placed at `(rows - 1 - y) * view_height`
/// from the bottom, so the first views land in the top row of the texture.
///
/// The texture and view sizes are truncated separately when a layout is scaled, so the
/// grid can overhang the texture by a pixel. Tiles on the far edges are clipped to fit.
pub fn tiles(layout: &QuiltLayout, camera_offset_step: f32) -> impl Iterator<Item = ViewTile> {
    let QuiltLayout {
        columns,
        rows,
        view_width,
        view_height,
        texture_width,
        texture_height,
        ..
    } = *layout;
    let total_views = layout.total_views();

    iproduct!(0..rows, 0..columns).map(move |(y, x)| {
        let inverted_y = rows - 1 - y;
        let linear_index = y * columns + x;
        let left = x * view_width;
        let bottom = inverted_y * view_height;
        ViewTile {
            index: ViewIndex { x, y },
            linear_index,
            rect: PixelRect {
                x: left,
                y: bottom,
                width: view_width.min(texture_width.saturating_sub(left)),
                height: view_height.min(texture_height.saturating_sub(bottom)),
            },
            camera_offset: camera_offset(camera_offset_step, linear_index, total_views),
        }
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositorState {
    /// The composed texture may be recreated or handed to presentation.
    Idle,
    /// A frame is being composed; the texture must not be touched.
    Composing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComposedFrame {
    pub views_rendered: u32,
}

#[derive(Debug)]
pub enum ComposeError<E> {
    EmptyLayout,
    /// At least one view failed to render. All other views were still rendered, but the
    /// frame must not be presented.
    ViewFailed {
        view: ViewIndex,
        failed_views: u32,
        source: E,
    },
}

impl<E: fmt::Display> fmt::Display for ComposeError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComposeError::EmptyLayout => write!(f, "quilt layout has no pixels"),
            ComposeError::ViewFailed {
                view,
                failed_views,
                source,
            } => write!(
                f,
                "view {} failed to render ({} failed in total): {}",
                view, failed_views, source
            ),
        }
    }
}

impl<E: Error + 'static> Error for ComposeError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ComposeError::EmptyLayout => None,
            ComposeError::ViewFailed { source, .. } => Some(source),
        }
    }
}

/// Drives one render callback per view of a quilt.
#[derive(Debug)]
pub struct QuiltCompositor {
    camera_offset_step: f32,
    state: CompositorState,
}

impl QuiltCompositor {
    pub fn new(camera_offset_step: f32) -> Self {
        Self {
            camera_offset_step,
            state: CompositorState::Idle,
        }
    }

    pub fn camera_offset_step(&self) -> f32 {
        self.camera_offset_step
    }

    pub fn state(&self) -> CompositorState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state() == CompositorState::Idle
    }

    /// Calls `render_view` once for every tile of `layout`.
    ///
    /// Composition is never cut short: a failing view is recorded and the remaining views
    /// are still rendered. The first failure is returned so the caller can skip presenting
    /// the frame.
    pub fn compose_frame<E, F>(
        &mut self,
        layout: &QuiltLayout,
        mut render_view: F,
    ) -> Result<ComposedFrame, ComposeError<E>>
    where
        F: FnMut(&ViewTile) -> Result<(), E>,
    {
        if layout.is_empty() {
            return Err(ComposeError::EmptyLayout);
        }

        self.state = CompositorState::Composing;

        let mut views_rendered = 0;
        let mut failed_views = 0;
        let mut first_failure = None;
        for tile in tiles(layout, self.camera_offset_step) {
            match render_view(&tile) {
                Ok(()) => views_rendered += 1,
                Err(error) => {
                    failed_views += 1;
                    if first_failure.is_none() {
                        first_failure = Some((tile.index, error));
                    }
                }
            }
        }

        self.state = CompositorState::Idle;

        match first_failure {
            None => Ok(ComposedFrame { views_rendered }),
            Some((view, source)) => Err(ComposeError::ViewFailed {
                view,
                failed_views,
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quilt::{compute_layout, DisplayCapability, QuiltRequest};
    use approx::assert_abs_diff_eq;
    use std::collections::HashSet;

    fn layout(columns: u32, rows: u32, window_width: u32, window_height: u32) -> QuiltLayout {
        compute_layout(
            &DisplayCapability {
                max_texture_dimension: 16384,
                window_width,
                window_height,
            },
            &QuiltRequest { columns, rows },
        )
    }

    fn collect_tiles(layout: &QuiltLayout, step: f32) -> Vec<ViewTile> {
        let mut compositor = QuiltCompositor::new(step);
        let mut tiles = Vec::new();
        let frame = compositor
            .compose_frame(layout, |tile| {
                tiles.push(*tile);
                Ok::<(), String>(())
            })
            .unwrap();
        assert_eq!(frame.views_rendered as usize, tiles.len());
        tiles
    }

    #[test]
    fn tiles_cover_texture_exactly() {
        let layout = layout(5, 9, 400, 300);
        let tiles = collect_tiles(&layout, 0.5);
        assert_eq!(tiles.len(), 45);

        let rects: HashSet<PixelRect> = tiles.iter().map(|tile| tile.rect).collect();
        assert_eq!(rects.len(), 45);

        for (i, a) in tiles.iter().enumerate() {
            assert!(a.rect.right() <= layout.texture_width);
            assert!(a.rect.top() <= layout.texture_height);
            for b in &tiles[i + 1..] {
                assert!(!a.rect.overlaps(&b.rect), "{:?} overlaps {:?}", a, b);
            }
        }

        let covered: u64 = tiles.iter().map(|tile| tile.rect.area()).sum();
        assert_eq!(
            covered,
            u64::from(layout.texture_width) * u64::from(layout.texture_height)
        );
    }

    #[test]
    fn scaled_tiles_stay_inside_texture() {
        let layout = compute_layout(
            &DisplayCapability {
                max_texture_dimension: 8192,
                window_width: 2560,
                window_height: 1600,
            },
            &QuiltRequest {
                columns: 5,
                rows: 9,
            },
        );
        for tile in collect_tiles(&layout, 0.5) {
            assert!(tile.rect.right() <= layout.texture_width);
            assert!(tile.rect.top() <= layout.texture_height);
        }
    }

    fn within(rect: &PixelRect, layout: &QuiltLayout) -> bool {
        rect.right() <= layout.texture_width && rect.top() <= layout.texture_height
    }

    #[test]
    fn overhanging_grid_is_clipped_to_texture() {
        let layout = compute_layout(
            &DisplayCapability {
                max_texture_dimension: 8192,
                window_width: 1431,
                window_height: 1696,
            },
            &QuiltRequest {
                columns: 5,
                rows: 9,
            },
        );
        assert_eq!((layout.view_width, layout.view_height), (768, 910));
        assert_eq!(layout.texture_size(), (3839, 8191));

        let mut compositor = QuiltCompositor::new(0.5);
        let mut last_column = Vec::new();
        let frame = compositor
            .compose_frame(&layout, |tile| {
                if !within(&tile.rect, &layout) {
                    return Err(tile.rect);
                }
                if tile.index.x == 4 {
                    last_column.push(tile.rect);
                }
                Ok(())
            })
            .unwrap();
        assert_eq!(frame.views_rendered, 45);

        assert_eq!(last_column.len(), 9);
        for rect in &last_column {
            assert_eq!((rect.x, rect.width), (3072, 767));
            assert_eq!(rect.height, 910);
        }
    }

    #[test]
    fn tiles_stay_inside_texture_for_any_display() {
        let grids = [(5, 9), (8, 6), (4, 8), (7, 7), (1, 1)];
        for &max in &[4096, 8192, 16384] {
            for &(columns, rows) in &grids {
                for width in (600..3000).step_by(23) {
                    for height in (600..3000).step_by(29) {
                        let layout = compute_layout(
                            &DisplayCapability {
                                max_texture_dimension: max,
                                window_width: width,
                                window_height: height,
                            },
                            &QuiltRequest { columns, rows },
                        );
                        for tile in tiles(&layout, 0.5) {
                            assert!(within(&tile.rect, &layout), "{:?} in {:?}", tile, layout);
                            // clipping never takes more than the truncation slack
                            assert!(tile.rect.width + 1 >= layout.view_width, "{:?}", tile);
                            assert!(tile.rect.height + 1 >= layout.view_height, "{:?}", tile);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn first_row_is_placed_at_the_top() {
        let layout = layout(5, 9, 400, 300);
        let tiles = collect_tiles(&layout, 0.5);

        let first = tiles[0];
        assert_eq!(first.index, ViewIndex { x: 0, y: 0 });
        assert_eq!(first.rect.y, 8 * 300);
        assert_eq!(first.rect.top(), layout.texture_height);

        let last = tiles[44];
        assert_eq!(last.index, ViewIndex { x: 4, y: 8 });
        assert_eq!((last.rect.x, last.rect.y), (1600, 0));

        // measured from the top, the first row starts at pixel row zero
        assert_eq!(first.rect.flipped(layout.texture_height).y, 0);
        assert_eq!(last.rect.flipped(layout.texture_height).y, 8 * 300);
    }

    #[test]
    fn traversal_is_row_major() {
        let layout = layout(3, 2, 10, 10);
        let order: Vec<(u32, u32, u32)> = collect_tiles(&layout, 1.0)
            .iter()
            .map(|tile| (tile.index.x, tile.index.y, tile.linear_index))
            .collect();
        assert_eq!(
            order,
            vec![
                (0, 0, 0),
                (1, 0, 1),
                (2, 0, 2),
                (0, 1, 3),
                (1, 1, 4),
                (2, 1, 5)
            ]
        );
    }

    #[test]
    fn camera_offsets_are_symmetric() {
        let layout = layout(5, 9, 400, 300);
        let tiles = collect_tiles(&layout, 0.5);

        let sum: f32 = tiles.iter().map(|tile| tile.camera_offset).sum();
        assert_abs_diff_eq!(sum, 0.0, epsilon = 1e-4);

        assert_abs_diff_eq!(tiles[0].camera_offset, -11.0);
        assert_abs_diff_eq!(tiles[22].camera_offset, 0.0);
        assert_abs_diff_eq!(tiles[44].camera_offset, 11.0);

        for pair in tiles.windows(2) {
            assert_abs_diff_eq!(pair[1].camera_offset - pair[0].camera_offset, 0.5);
        }
    }

    #[test]
    fn even_view_count_has_no_centered_view() {
        assert_abs_diff_eq!(camera_offset(0.01, 0, 4), -0.015);
        assert_abs_diff_eq!(camera_offset(0.01, 1, 4), -0.005);
        assert_abs_diff_eq!(camera_offset(0.01, 2, 4), 0.005);
        assert_abs_diff_eq!(camera_offset(0.01, 3, 4), 0.015);
    }

    #[test]
    fn single_view_is_centered() {
        let layout = layout(1, 1, 640, 480);
        let tiles = collect_tiles(&layout, 0.5);
        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0].camera_offset, 0.0);
        assert_eq!(
            tiles[0].rect,
            PixelRect {
                x: 0,
                y: 0,
                width: 640,
                height: 480
            }
        );
    }

    #[test]
    fn failing_view_does_not_stop_composition() {
        let layout = layout(5, 9, 100, 100);
        let mut compositor = QuiltCompositor::new(0.5);
        let mut calls = 0;

        let result = compositor.compose_frame(&layout, |tile| {
            calls += 1;
            if tile.index.y == 3 {
                Err(format!("view {} failed", tile.linear_index))
            } else {
                Ok(())
            }
        });

        assert_eq!(calls, 45);
        assert!(compositor.is_idle());
        match result {
            Err(ComposeError::ViewFailed {
                view,
                failed_views,
                source,
            }) => {
                assert_eq!(view, ViewIndex { x: 0, y: 3 });
                assert_eq!(failed_views, 5);
                assert_eq!(source, "view 15 failed");
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn empty_layout_renders_nothing() {
        let layout = layout(5, 9, 0, 0);
        let mut compositor = QuiltCompositor::new(0.5);
        let mut calls = 0;
        let result = compositor.compose_frame(&layout, |_| {
            calls += 1;
            Ok::<(), String>(())
        });
        assert!(matches!(result, Err(ComposeError::EmptyLayout)));
        assert_eq!(calls, 0);
        assert_eq!(compositor.state(), CompositorState::Idle);
    }

    #[test]
    fn compositor_is_idle_between_frames() {
        let layout = layout(2, 2, 10, 10);
        let mut compositor = QuiltCompositor::new(0.5);
        assert_eq!(compositor.state(), CompositorState::Idle);
        for _ in 0..3 {
            compositor
                .compose_frame(&layout, |_| Ok::<(), String>(()))
                .unwrap();
            assert_eq!(compositor.state(), CompositorState::Idle);
        }
    }

    #[test]
    fn flipping_respects_texture_height() {
        let rect = PixelRect {
            x: 10,
            y: 0,
            width: 100,
            height: 50,
        };
        // leftover rows from truncation sit above the tiled area
        assert_eq!(rect.flipped(52).y, 2);
        assert_eq!(rect.flipped(50).y, 0);
    }
}

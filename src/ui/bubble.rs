use std::collections::HashMap;
use std::f64::consts::{FRAC_PI_2, PI};

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use crate::chat::Direction;

pub const DEFAULT_CORNER_RADIUS: f64 = 12.0;

/// Size of one terminal cell in bubble units. Cells are roughly twice as tall
/// as they are wide.
pub const CELL_WIDTH_UNITS: f64 = 6.0;
pub const CELL_HEIGHT_UNITS: f64 = 12.0;

/// Columns of padding between the bubble edge and its text.
pub const BUBBLE_PAD_X: u16 = 2;
/// Rows of padding above and below the text.
pub const BUBBLE_PAD_Y: u16 = 1;

pub const RECEIVED_FILL: Color = Color::Rgb(230, 230, 230);
pub const SENT_FILL: Color = Color::Rgb(255, 255, 0);
pub const BUBBLE_TEXT: Color = Color::Black;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Corners {
    pub top_left: bool,
    pub top_right: bool,
    pub bottom_left: bool,
    pub bottom_right: bool,
}

impl Corners {
    /// Rounded corners for a bubble. The corner pointing at the speaker stays
    /// square.
    pub const fn rounded_for(direction: Direction) -> Self {
        match direction {
            Direction::Received => Corners {
                top_left: false,
                top_right: true,
                bottom_left: true,
                bottom_right: true,
            },
            Direction::Sent => Corners {
                top_left: true,
                top_right: false,
                bottom_left: true,
                bottom_right: true,
            },
        }
    }
}

pub fn fill_for(direction: Direction) -> Color {
    match direction {
        Direction::Received => RECEIVED_FILL,
        Direction::Sent => SENT_FILL,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Path segments use y-down coordinates; angles are radians measured
/// clockwise from the positive x axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    MoveTo(Point),
    LineTo(Point),
    ArcTo {
        center: Point,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
    },
    Close,
}

/// A rounded rectangle with a chosen subset of rounded corners, in the
/// bubble's own coordinate space (origin top-left).
#[derive(Debug, Clone, PartialEq)]
pub struct ClipPath {
    pub width: f64,
    pub height: f64,
    pub radius: f64,
    pub segments: Vec<PathSegment>,
}

impl ClipPath {
    pub fn rounded_rect(width: f64, height: f64, radius: f64, corners: Corners) -> Self {
        let width = width.max(0.0);
        let height = height.max(0.0);
        // Same clamp as the usual rounded-rect primitive.
        let radius = radius.max(0.0).min(width / 2.0).min(height / 2.0);

        let r = |rounded: bool| if rounded { radius } else { 0.0 };
        let (tl, tr, bl, br) = (
            r(corners.top_left),
            r(corners.top_right),
            r(corners.bottom_left),
            r(corners.bottom_right),
        );

        let mut segments = Vec::with_capacity(9);
        segments.push(PathSegment::MoveTo(Point::new(0.0, tl)));
        if tl > 0.0 {
            segments.push(PathSegment::ArcTo {
                center: Point::new(tl, tl),
                radius: tl,
                start_angle: PI,
                end_angle: PI + FRAC_PI_2,
            });
        }
        segments.push(PathSegment::LineTo(Point::new(width - tr, 0.0)));
        if tr > 0.0 {
            segments.push(PathSegment::ArcTo {
                center: Point::new(width - tr, tr),
                radius: tr,
                start_angle: PI + FRAC_PI_2,
                end_angle: 2.0 * PI,
            });
        }
        segments.push(PathSegment::LineTo(Point::new(width, height - br)));
        if br > 0.0 {
            segments.push(PathSegment::ArcTo {
                center: Point::new(width - br, height - br),
                radius: br,
                start_angle: 0.0,
                end_angle: FRAC_PI_2,
            });
        }
        segments.push(PathSegment::LineTo(Point::new(bl, height)));
        if bl > 0.0 {
            segments.push(PathSegment::ArcTo {
                center: Point::new(bl, height - bl),
                radius: bl,
                start_angle: FRAC_PI_2,
                end_angle: PI,
            });
        }
        segments.push(PathSegment::Close);

        Self {
            width,
            height,
            radius,
            segments,
        }
    }

    /// Inclusive hit test against the path outline. Each arc owns the square
    /// between its center and the corner it rounds; inside that square a point
    /// must lie within the arc's radius.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        if x < 0.0 || y < 0.0 || x > self.width || y > self.height {
            return false;
        }

        self.segments.iter().all(|segment| match *segment {
            PathSegment::ArcTo {
                center,
                radius,
                start_angle,
                end_angle,
            } => {
                let mid = (start_angle + end_angle) / 2.0;
                let (dx, dy) = (x - center.x, y - center.y);
                let beyond_center = dx * mid.cos() > 0.0 && dy * mid.sin() > 0.0;
                !beyond_center || dx * dx + dy * dy <= radius * radius
            }
            _ => true,
        })
    }
}

/// Cell coverage as a quadrant bit mask: 1 top-left, 2 top-right,
/// 4 bottom-left, 8 bottom-right.
pub const FULL_CELL: u8 = 0b1111;

const QUADRANT_GLYPHS: [&str; 16] = [
    " ", "▘", "▝", "▀", "▖", "▌", "▞", "▛", "▗", "▚", "▐", "▜", "▄", "▙", "▟", "█",
];

pub fn quadrant_glyph(mask: u8) -> &'static str {
    QUADRANT_GLYPHS[(mask & FULL_CELL) as usize]
}

/// Output of the bubble renderer for one direction and size.
#[derive(Debug, Clone, PartialEq)]
pub struct BubbleShape {
    pub direction: Direction,
    pub cols: u16,
    pub rows: u16,
    pub fill: Color,
    pub path: ClipPath,
    masks: Vec<u8>,
}

impl BubbleShape {
    pub fn compute(direction: Direction, cols: u16, rows: u16, radius: f64) -> Self {
        let path = ClipPath::rounded_rect(
            f64::from(cols) * CELL_WIDTH_UNITS,
            f64::from(rows) * CELL_HEIGHT_UNITS,
            radius,
            Corners::rounded_for(direction),
        );

        let mut masks = Vec::with_capacity(usize::from(cols) * usize::from(rows));
        for row in 0..rows {
            for col in 0..cols {
                masks.push(cell_mask(&path, col, row));
            }
        }

        Self {
            direction,
            cols,
            rows,
            fill: fill_for(direction),
            path,
            masks,
        }
    }

    pub fn mask(&self, col: u16, row: u16) -> u8 {
        if col >= self.cols || row >= self.rows {
            return 0;
        }
        self.masks[usize::from(row) * usize::from(self.cols) + usize::from(col)]
    }
}

fn cell_mask(path: &ClipPath, col: u16, row: u16) -> u8 {
    let x0 = f64::from(col) * CELL_WIDTH_UNITS;
    let y0 = f64::from(row) * CELL_HEIGHT_UNITS;
    let samples = [
        (0.25, 0.25, 0b0001),
        (0.75, 0.25, 0b0010),
        (0.25, 0.75, 0b0100),
        (0.75, 0.75, 0b1000),
    ];
    samples
        .iter()
        .filter(|(fx, fy, _)| {
            path.contains(x0 + fx * CELL_WIDTH_UNITS, y0 + fy * CELL_HEIGHT_UNITS)
        })
        .fold(0, |mask, (_, _, bit)| mask | bit)
}

/// Memoizes bubble shapes by direction and size; moving a bubble does not
/// recompute it.
#[derive(Debug)]
pub struct BubbleCache {
    radius: f64,
    shapes: HashMap<(Direction, u16, u16), BubbleShape>,
    computed: usize,
}

impl BubbleCache {
    pub fn new(radius: f64) -> Self {
        Self {
            radius,
            shapes: HashMap::new(),
            computed: 0,
        }
    }

    pub fn shape(&mut self, direction: Direction, cols: u16, rows: u16) -> &BubbleShape {
        let radius = self.radius;
        let computed = &mut self.computed;
        self.shapes
            .entry((direction, cols, rows))
            .or_insert_with(|| {
                *computed += 1;
                tracing::trace!(?direction, cols, rows, total = *computed, "Computing bubble shape");
                BubbleShape::compute(direction, cols, rows, radius)
            })
    }

    #[cfg(test)]
    pub fn computed(&self) -> usize {
        self.computed
    }
}

/// Draws a bubble: fully covered cells get the fill as background, partly
/// covered edge cells get a quadrant glyph in the fill colour.
pub struct Bubble<'a> {
    shape: &'a BubbleShape,
    lines: &'a [String],
}

impl<'a> Bubble<'a> {
    pub fn new(shape: &'a BubbleShape, lines: &'a [String]) -> Self {
        Self { shape, lines }
    }
}

impl Widget for Bubble<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let cols = self.shape.cols.min(area.width);
        let rows = self.shape.rows.min(area.height);

        for row in 0..rows {
            for col in 0..cols {
                let mask = self.shape.mask(col, row);
                if mask == 0 {
                    continue;
                }
                let cell = buf.get_mut(area.x + col, area.y + row);
                if mask == FULL_CELL {
                    cell.set_symbol(" ");
                    cell.set_style(Style::default().fg(BUBBLE_TEXT).bg(self.shape.fill));
                } else {
                    cell.set_symbol(quadrant_glyph(mask));
                    cell.set_style(Style::default().fg(self.shape.fill).bg(Color::Reset));
                }
            }
        }

        let text_width = cols.saturating_sub(2 * BUBBLE_PAD_X);
        let text_style = Style::default().fg(BUBBLE_TEXT).bg(self.shape.fill);
        for (i, line) in self.lines.iter().enumerate() {
            let row = BUBBLE_PAD_Y + i as u16;
            if row >= rows {
                break;
            }
            buf.set_stringn(
                area.x + BUBBLE_PAD_X,
                area.y + row,
                line,
                usize::from(text_width),
                text_style,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corner_policy_per_direction() {
        let received = Corners::rounded_for(Direction::Received);
        assert!(!received.top_left);
        assert!(received.top_right && received.bottom_left && received.bottom_right);

        let sent = Corners::rounded_for(Direction::Sent);
        assert!(!sent.top_right);
        assert!(sent.top_left && sent.bottom_left && sent.bottom_right);
    }

    #[test]
    fn fill_per_direction() {
        assert_eq!(fill_for(Direction::Received), Color::Rgb(230, 230, 230));
        assert_eq!(fill_for(Direction::Sent), Color::Rgb(255, 255, 0));
        assert_ne!(fill_for(Direction::Sent), fill_for(Direction::Received));
    }

    #[test]
    fn radius_is_clamped_to_half_the_short_side() {
        let path = ClipPath::rounded_rect(100.0, 10.0, 12.0, Corners::rounded_for(Direction::Sent));
        assert_eq!(path.radius, 5.0);

        let path = ClipPath::rounded_rect(100.0, 60.0, 12.0, Corners::rounded_for(Direction::Sent));
        assert_eq!(path.radius, 12.0);
    }

    #[test]
    fn path_has_an_arc_per_rounded_corner() {
        for direction in [Direction::Sent, Direction::Received] {
            let path = ClipPath::rounded_rect(120.0, 48.0, 12.0, Corners::rounded_for(direction));
            let arcs = path
                .segments
                .iter()
                .filter(|s| matches!(s, PathSegment::ArcTo { .. }))
                .count();
            assert_eq!(arcs, 3);
            assert_eq!(path.segments.last(), Some(&PathSegment::Close));
        }
    }

    #[test]
    fn received_path_starts_at_square_top_left() {
        let path = ClipPath::rounded_rect(120.0, 48.0, 12.0, Corners::rounded_for(Direction::Received));
        assert_eq!(path.segments[0], PathSegment::MoveTo(Point::new(0.0, 0.0)));

        let path = ClipPath::rounded_rect(120.0, 48.0, 12.0, Corners::rounded_for(Direction::Sent));
        assert_eq!(path.segments[0], PathSegment::MoveTo(Point::new(0.0, 12.0)));
        match path.segments[1] {
            PathSegment::ArcTo {
                center,
                radius,
                end_angle,
                ..
            } => {
                let end_x = center.x + radius * end_angle.cos();
                let end_y = center.y + radius * end_angle.sin();
                assert!((end_x - 12.0).abs() < 1e-9 && end_y.abs() < 1e-9);
            }
            other => panic!("expected the top-left arc, got {:?}", other),
        }
    }

    #[test]
    fn square_corner_contains_its_tip() {
        let received = ClipPath::rounded_rect(120.0, 48.0, 12.0, Corners::rounded_for(Direction::Received));
        assert!(received.contains(0.5, 0.5));
        assert!(!received.contains(119.5, 0.5));
        assert!(!received.contains(0.5, 47.5));
        assert!(!received.contains(119.5, 47.5));
        assert!(received.contains(60.0, 24.0));

        let sent = ClipPath::rounded_rect(120.0, 48.0, 12.0, Corners::rounded_for(Direction::Sent));
        assert!(!sent.contains(0.5, 0.5));
        assert!(sent.contains(119.5, 0.5));
        assert!(!sent.contains(121.0, 24.0));
    }

    #[test]
    fn hit_test_follows_the_arcs() {
        for direction in [Direction::Sent, Direction::Received] {
            let path = ClipPath::rounded_rect(120.0, 48.0, 12.0, Corners::rounded_for(direction));
            let mut arcs = 0;
            for segment in &path.segments {
                if let PathSegment::ArcTo {
                    center,
                    radius,
                    start_angle,
                    end_angle,
                } = *segment
                {
                    arcs += 1;
                    let mid = (start_angle + end_angle) / 2.0;
                    let at = |scale: f64| {
                        (
                            center.x + scale * radius * mid.cos(),
                            center.y + scale * radius * mid.sin(),
                        )
                    };
                    let (x, y) = at(0.98);
                    assert!(path.contains(x, y), "{:?} just inside arc at {}", direction, mid);
                    let (x, y) = at(1.02);
                    assert!(!path.contains(x, y), "{:?} just outside arc at {}", direction, mid);
                }
            }
            assert_eq!(arcs, 3);
        }
    }

    #[test]
    fn shape_masks_cut_only_rounded_corner_cells() {
        let shape = BubbleShape::compute(Direction::Received, 10, 3, DEFAULT_CORNER_RADIUS);
        assert_eq!(shape.mask(0, 0), FULL_CELL);
        assert_ne!(shape.mask(9, 0), FULL_CELL);
        assert_ne!(shape.mask(0, 2), FULL_CELL);
        assert_ne!(shape.mask(9, 2), FULL_CELL);
        assert_eq!(shape.mask(5, 1), FULL_CELL);
        assert_eq!(shape.mask(10, 0), 0);

        let sent = BubbleShape::compute(Direction::Sent, 10, 3, DEFAULT_CORNER_RADIUS);
        assert_ne!(sent.mask(0, 0), FULL_CELL);
        assert_eq!(sent.mask(9, 0), FULL_CELL);
        assert_eq!(sent.fill, SENT_FILL);
    }

    #[test]
    fn cache_recomputes_only_on_new_size() {
        let mut cache = BubbleCache::new(DEFAULT_CORNER_RADIUS);
        cache.shape(Direction::Sent, 20, 3);
        cache.shape(Direction::Sent, 20, 3);
        assert_eq!(cache.computed(), 1);

        cache.shape(Direction::Sent, 21, 3);
        cache.shape(Direction::Received, 20, 3);
        assert_eq!(cache.computed(), 3);
    }

    #[test]
    fn widget_fills_and_writes_text() {
        let shape = BubbleShape::compute(Direction::Sent, 9, 3, DEFAULT_CORNER_RADIUS);
        let lines = vec!["hi".to_string()];
        let area = Rect::new(0, 0, 9, 3);
        let mut buf = Buffer::empty(area);
        Bubble::new(&shape, &lines).render(area, &mut buf);

        assert_eq!(buf.get(2, 1).symbol(), "h");
        assert_eq!(buf.get(3, 1).symbol(), "i");
        assert_eq!(buf.get(2, 1).bg, SENT_FILL);
        assert_eq!(buf.get(8, 0).bg, SENT_FILL);
        assert_ne!(buf.get(0, 0).symbol(), " ");
    }
}

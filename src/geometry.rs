/// Width/height pair in viewport units (terminal cells in the TUI)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Zero dimensions are treated as 1 so random placement never draws from an empty range
    pub fn sanitized(self) -> Self {
        Self {
            width: self.width.max(1),
            height: self.height.max(1),
        }
    }
}

/// Top-left corner of the target inside the viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub x: u32,
    pub y: u32,
}

impl Position {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// A tap location in viewport space
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub origin: Position,
    pub size: Size,
}

impl Rect {
    pub fn new(origin: Position, size: Size) -> Self {
        Self { origin, size }
    }

    /// Containment with strict inequalities on all four edges: a point on the border is outside.
    pub fn contains_strict(&self, point: Point) -> bool {
        let left = self.origin.x as f64;
        let top = self.origin.y as f64;
        let right = left + self.size.width as f64;
        let bottom = top + self.size.height as f64;

        (point.x > left && point.x < right) && (point.y > top && point.y < bottom)
    }
}

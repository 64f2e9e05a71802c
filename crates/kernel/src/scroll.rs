use serde::{Deserialize, Serialize};

/// One terrain tile. Only its position along the travel axis ever changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub position: f32,
}

impl Segment {
    pub fn at(position: f32) -> Self {
        Self { position }
    }
}

/// Travel speed plus the two constants of the recycle scheme.
///
/// `threshold` is the far edge of the visible window; `tile_length` is the
/// spacing kept between the two segments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollState {
    pub speed: f32,
    threshold: f32,
    tile_length: f32,
}

impl ScrollState {
    pub fn new(speed: f32, threshold: f32, tile_length: f32) -> Self {
        Self {
            speed,
            threshold,
            tile_length,
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn tile_length(&self) -> f32 {
        self.tile_length
    }
}

impl Default for ScrollState {
    fn default() -> Self {
        Self::new(0.1, 25.0, 50.0)
    }
}

/// Which segments were moved behind their partner during one `advance`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Recycled {
    pub a: bool,
    pub b: bool,
}

impl Recycled {
    pub fn any(&self) -> bool {
        self.a || self.b
    }

    pub fn count(&self) -> u32 {
        self.a as u32 + self.b as u32
    }
}

/// Two-tile infinite scroll.
///
/// Both segments advance by the same speed every frame. A segment that
/// passes the threshold is placed one tile length behind the *other*
/// segment's current position, so the spacing stays exactly one tile length
/// no matter how far the threshold was overshot.
///
/// Only correct for two tiles sharing one speed. Negative speeds never
/// trigger a recycle and the tiles travel backwards without bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrollRecycler {
    a: Segment,
    b: Segment,
    state: ScrollState,
}

impl ScrollRecycler {
    /// Place A one tile length short of the threshold and B one tile further back.
    pub fn new(state: ScrollState) -> Self {
        let a = state.threshold - state.tile_length;
        Self::with_positions(state, a, a - state.tile_length)
    }

    pub fn with_positions(state: ScrollState, a: f32, b: f32) -> Self {
        Self {
            a: Segment::at(a),
            b: Segment::at(b),
            state,
        }
    }

    pub fn state(&self) -> &ScrollState {
        &self.state
    }

    pub fn speed(&self) -> f32 {
        self.state.speed
    }

    /// Speed may change between any two frames.
    pub fn set_speed(&mut self, speed: f32) {
        self.state.speed = speed;
    }

    pub fn a(&self) -> Segment {
        self.a
    }

    pub fn b(&self) -> Segment {
        self.b
    }

    pub fn positions(&self) -> (f32, f32) {
        (self.a.position, self.b.position)
    }

    /// Distance between the two segments along the travel axis.
    pub fn spacing(&self) -> f32 {
        (self.a.position - self.b.position).abs()
    }

    /// Advance both segments by `speed`, then recycle each one that passed
    /// the threshold, A first.
    pub fn advance(&mut self, speed: f32) -> Recycled {
        let threshold = self.state.threshold;
        let tile_length = self.state.tile_length;
        let mut recycled = Recycled::default();

        self.a.position += speed;
        self.b.position += speed;

        if self.a.position > threshold {
            self.a.position = self.b.position - tile_length;
            recycled.a = true;
        }
        if self.b.position > threshold {
            self.b.position = self.a.position - tile_length;
            recycled.b = true;
        }

        if recycled.any() {
            tracing::trace!(
                a = self.a.position,
                b = self.b.position,
                ?recycled,
                "segments recycled"
            );
        }
        recycled
    }

    /// Advance by the configured speed.
    pub fn step(&mut self) -> Recycled {
        self.advance(self.state.speed)
    }
}

impl Default for ScrollRecycler {
    fn default() -> Self {
        Self::new(ScrollState::default())
    }
}

use serde::{Deserialize, Serialize};

/// Reduced gaze direction. Also the screen slot of a round's word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GazeDirection {
    Left,
    Center,
    Right,
}

impl GazeDirection {
    /// Resolution order when several flags are set, and tie-break order.
    pub const PRIORITY: [GazeDirection; 3] = [Self::Left, Self::Center, Self::Right];

    pub fn slot(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Center => 1,
            Self::Right => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }
}

/// One classifier reading. The flags are independent; more than one may be
/// set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GazeObservation {
    pub is_left: bool,
    pub is_center: bool,
    pub is_right: bool,
}

impl GazeObservation {
    pub const NONE: GazeObservation = GazeObservation {
        is_left: false,
        is_center: false,
        is_right: false,
    };

    pub fn looking(direction: GazeDirection) -> Self {
        Self {
            is_left: direction == GazeDirection::Left,
            is_center: direction == GazeDirection::Center,
            is_right: direction == GazeDirection::Right,
        }
    }

    pub fn direction(&self) -> Option<GazeDirection> {
        if self.is_left {
            Some(GazeDirection::Left)
        } else if self.is_center {
            Some(GazeDirection::Center)
        } else if self.is_right {
            Some(GazeDirection::Right)
        } else {
            None
        }
    }
}

/// Per-round frame counts per direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GazeTally {
    counts: [u32; 3],
}

impl GazeTally {
    pub fn new(left: u32, center: u32, right: u32) -> Self {
        Self {
            counts: [left, center, right],
        }
    }

    pub fn record(&mut self, direction: GazeDirection) {
        self.counts[direction.slot()] += 1;
    }

    pub fn count(&self, direction: GazeDirection) -> u32 {
        self.counts[direction.slot()]
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    /// Direction with the highest count and that count. Ties go to the
    /// earliest direction in [`GazeDirection::PRIORITY`].
    pub fn winner(&self) -> (GazeDirection, u32) {
        let mut best = (GazeDirection::Left, self.count(GazeDirection::Left));
        for direction in &GazeDirection::PRIORITY[1..] {
            let count = self.count(*direction);
            if count > best.1 {
                best = (*direction, count);
            }
        }
        best
    }

    pub fn reset(&mut self) {
        self.counts = [0; 3];
    }
}

//! Universe - 2D occupancy grid
//!
//! Each cell holds the id of the agent standing on it, or nothing. Agents
//! claim cells through the shared `RwLock<Universe>` held by the lab.

use vivarium_common::{AgentId, LabError};

/// Occupancy grid indexed by `(y, x)`
#[derive(Debug, Clone)]
pub struct Universe {
    height: usize,
    width: usize,
    space: Vec<Option<AgentId>>,
}

impl Universe {
    /// Create an empty universe; both dimensions must be non-zero
    pub fn new(height: usize, width: usize) -> Result<Self, LabError> {
        if height == 0 || width == 0 {
            return Err(LabError::EmptyUniverse { height, width });
        }
        let cells = height.checked_mul(width).ok_or_else(|| {
            LabError::InvalidConfig(format!("a {}x{} universe overflows usize", height, width))
        })?;
        Ok(Self {
            height,
            width,
            space: vec![None; cells],
        })
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of cells
    #[inline]
    pub fn capacity(&self) -> usize {
        self.height * self.width
    }

    /// Reset every cell to empty
    pub fn init_space(&mut self) {
        self.space.fill(None);
    }

    #[inline]
    pub fn contains(&self, y: usize, x: usize) -> bool {
        y < self.height && x < self.width
    }

    /// Occupant of a cell; `None` when empty or out of bounds
    #[inline]
    pub fn get(&self, y: usize, x: usize) -> Option<AgentId> {
        if self.contains(y, x) {
            self.space[y * self.width + x]
        } else {
            None
        }
    }

    /// In bounds and unoccupied
    #[inline]
    pub fn is_free(&self, y: usize, x: usize) -> bool {
        self.contains(y, x) && self.space[y * self.width + x].is_none()
    }

    /// Mark a cell as occupied; out-of-bounds writes are ignored
    pub fn set(&mut self, y: usize, x: usize, id: AgentId) {
        if self.contains(y, x) {
            self.space[y * self.width + x] = Some(id);
        }
    }

    pub fn clear(&mut self, y: usize, x: usize) {
        if self.contains(y, x) {
            self.space[y * self.width + x] = None;
        }
    }

    /// Move `id` from one cell to another if the target is free.
    ///
    /// Returns false, leaving the grid untouched, when the target is taken or
    /// out of bounds.
    pub fn relocate(&mut self, id: AgentId, from: (usize, usize), to: (usize, usize)) -> bool {
        if from == to {
            return self.get(to.0, to.1) == Some(id);
        }
        if !self.is_free(to.0, to.1) {
            return false;
        }
        if self.get(from.0, from.1) == Some(id) {
            self.clear(from.0, from.1);
        }
        self.set(to.0, to.1, id);
        true
    }

    /// Number of occupied cells
    pub fn occupied_count(&self) -> usize {
        self.space.iter().filter(|c| c.is_some()).count()
    }

    /// Free 4-neighbours of a cell, in up/down/left/right order
    pub fn free_neighbors(&self, y: usize, x: usize) -> Vec<(usize, usize)> {
        let mut out = Vec::with_capacity(4);
        if y > 0 && self.is_free(y - 1, x) {
            out.push((y - 1, x));
        }
        if self.is_free(y + 1, x) {
            out.push((y + 1, x));
        }
        if x > 0 && self.is_free(y, x - 1) {
            out.push((y, x - 1));
        }
        if self.is_free(y, x + 1) {
            out.push((y, x + 1));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_dimension_rejected() {
        assert_eq!(
            Universe::new(0, 4).unwrap_err(),
            LabError::EmptyUniverse { height: 0, width: 4 }
        );
    }

    #[test]
    fn test_overflowing_dimensions_rejected() {
        let err = Universe::new(usize::MAX, 2).unwrap_err();
        assert!(matches!(err, LabError::InvalidConfig(_)));
    }

    #[test]
    fn test_set_get_clear() {
        let mut u = Universe::new(3, 4).unwrap();
        let id = AgentId::new();
        u.set(2, 3, id);
        assert_eq!(u.get(2, 3), Some(id));
        assert!(!u.is_free(2, 3));
        assert_eq!(u.occupied_count(), 1);
        u.clear(2, 3);
        assert!(u.is_free(2, 3));
    }

    #[test]
    fn test_out_of_bounds_is_never_free() {
        let u = Universe::new(2, 2).unwrap();
        assert!(!u.is_free(2, 0));
        assert_eq!(u.get(0, 9), None);
    }

    #[test]
    fn test_init_space_clears_everything() {
        let mut u = Universe::new(2, 2).unwrap();
        u.set(0, 0, AgentId::new());
        u.set(1, 1, AgentId::new());
        u.init_space();
        assert_eq!(u.occupied_count(), 0);
    }

    #[test]
    fn test_relocate_respects_occupancy() {
        let mut u = Universe::new(1, 3).unwrap();
        let a = AgentId::new();
        let b = AgentId::new();
        u.set(0, 0, a);
        u.set(0, 2, b);

        assert!(u.relocate(a, (0, 0), (0, 1)));
        assert_eq!(u.get(0, 0), None);
        assert_eq!(u.get(0, 1), Some(a));

        assert!(!u.relocate(a, (0, 1), (0, 2)));
        assert_eq!(u.get(0, 1), Some(a));
        assert_eq!(u.get(0, 2), Some(b));
    }

    #[test]
    fn test_free_neighbors_at_corner() {
        let mut u = Universe::new(3, 3).unwrap();
        assert_eq!(u.free_neighbors(0, 0), vec![(1, 0), (0, 1)]);
        u.set(1, 0, AgentId::new());
        assert_eq!(u.free_neighbors(0, 0), vec![(0, 1)]);
    }
}

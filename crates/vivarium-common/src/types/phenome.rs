//! Phenome - fixed visual attributes of an agent

use rand::Rng;
use serde::{Deserialize, Serialize};

/// 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const BLACK: Rgb = Rgb([0, 0, 0]);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }

    /// Random color, never pure black so agents stay visible on the background
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        loop {
            let color = Rgb(rng.gen());
            if color != Self::BLACK {
                return color;
            }
        }
    }

    #[inline]
    pub fn r(&self) -> u8 {
        self.0[0]
    }

    #[inline]
    pub fn g(&self) -> u8 {
        self.0[1]
    }

    #[inline]
    pub fn b(&self) -> u8 {
        self.0[2]
    }
}

/// Agent phenome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phenome {
    pub color: Rgb,
}

impl Phenome {
    pub fn new(color: Rgb) -> Self {
        Self { color }
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::new(Rgb::random(rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_random_color_is_not_background() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            assert_ne!(Rgb::random(&mut rng), Rgb::BLACK);
        }
    }

    #[test]
    fn test_channels() {
        let c = Rgb::new(1, 2, 3);
        assert_eq!((c.r(), c.g(), c.b()), (1, 2, 3));
    }
}

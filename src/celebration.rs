use rand::seq::SliceRandom;
use rand::Rng;

/// Ticks a burst stays on screen (about two seconds at the default rate)
pub const BURST_TICKS: u32 = 20;

const BUBBLES: [char; 5] = ['·', '∘', '○', '◦', '✦'];

/// One floating glyph of a completion burst
#[derive(Debug, Clone)]
pub struct BurstParticle {
    pub x: f64,
    pub y: f64,
    pub vel_x: f64,
    pub vel_y: f64,
    pub symbol: char,
    pub color_index: usize,
    /// Label glyphs hold their position; bubbles drift upward
    pub is_label: bool,
}

impl BurstParticle {
    fn bubble<R: Rng>(x: f64, y: f64, rng: &mut R) -> Self {
        Self {
            x,
            y,
            vel_x: rng.gen_range(-0.6..0.6),
            vel_y: rng.gen_range(-1.2..-0.3),
            symbol: *BUBBLES.choose(rng).unwrap_or(&'·'),
            color_index: rng.gen_range(0..5),
            is_label: false,
        }
    }

    fn label(x: f64, y: f64, symbol: char) -> Self {
        Self {
            x,
            y,
            vel_x: 0.0,
            vel_y: 0.0,
            symbol,
            color_index: 0,
            is_label: true,
        }
    }

    fn update(&mut self) {
        self.x += self.vel_x;
        self.y += self.vel_y;
    }
}

/// "+N XP" burst shown when a session pays out
#[derive(Debug, Default)]
pub struct CompletionBurst {
    pub particles: Vec<BurstParticle>,
    pub ticks_left: u32,
    pub width: f64,
    pub height: f64,
}

impl CompletionBurst {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.ticks_left > 0
    }

    pub fn start(&mut self, xp: u32, width: u16, height: u16) {
        let mut rng = rand::thread_rng();
        self.particles.clear();
        self.ticks_left = BURST_TICKS;
        self.width = f64::from(width);
        self.height = f64::from(height);

        let center_x = self.width / 2.0;
        let center_y = self.height / 2.0;

        let text = format!("+{xp} XP");
        let start_x = center_x - (text.chars().count() as f64 / 2.0);
        for (i, ch) in text.chars().enumerate().filter(|(_, c)| *c != ' ') {
            self.particles
                .push(BurstParticle::label(start_x + i as f64, center_y - 3.0, ch));
        }

        for _ in 0..18 {
            let x = center_x + rng.gen_range(-12.0..12.0);
            let y = center_y + rng.gen_range(-2.0..4.0);
            self.particles.push(BurstParticle::bubble(x, y, &mut rng));
        }
    }

    /// Advance one tick; bubbles leaving the screen are dropped
    pub fn update(&mut self) {
        if self.ticks_left == 0 {
            return;
        }
        self.ticks_left -= 1;
        if self.ticks_left == 0 {
            self.particles.clear();
            return;
        }

        let (width, height) = (self.width, self.height);
        self.particles.retain_mut(|p| {
            p.update();
            p.is_label || (p.y >= 0.0 && p.x >= 0.0 && p.x < width && p.y < height)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_by_default() {
        let burst = CompletionBurst::new();
        assert!(!burst.is_active());
        assert!(burst.particles.is_empty());
    }

    #[test]
    fn start_places_label_and_bubbles() {
        let mut burst = CompletionBurst::new();
        burst.start(10, 80, 24);
        assert!(burst.is_active());

        let label: String = burst
            .particles
            .iter()
            .filter(|p| p.is_label)
            .map(|p| p.symbol)
            .collect();
        assert_eq!(label, "+10XP");
        assert!(burst.particles.iter().any(|p| !p.is_label));
    }

    #[test]
    fn bubbles_rise() {
        let mut burst = CompletionBurst::new();
        burst.start(10, 80, 24);
        let before: f64 = burst.particles.iter().filter(|p| !p.is_label).map(|p| p.y).sum();
        let count = burst.particles.iter().filter(|p| !p.is_label).count();
        burst.update();
        let after: f64 = burst.particles.iter().filter(|p| !p.is_label).map(|p| p.y).sum();
        if burst.particles.iter().filter(|p| !p.is_label).count() == count {
            assert!(after < before);
        }
    }

    #[test]
    fn ends_after_fixed_ticks() {
        let mut burst = CompletionBurst::new();
        burst.start(25, 40, 12);
        for _ in 0..BURST_TICKS - 1 {
            burst.update();
            assert!(burst.is_active());
        }
        burst.update();
        assert!(!burst.is_active());
        assert!(burst.particles.is_empty());
    }
}

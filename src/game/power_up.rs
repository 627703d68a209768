use super::geometry::Position;
use rand::Rng;
use serde::Serialize;
use std::ops::RangeInclusive;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PowerUpKind {
    SpeedBoost,
    Shield,
    DoublePoints,
    Shrink,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 4] = [
        PowerUpKind::SpeedBoost,
        PowerUpKind::Shield,
        PowerUpKind::DoublePoints,
        PowerUpKind::Shrink,
    ];

    /// Seconds an uncollected power-up of this kind stays on the board, inclusive.
    pub fn lifetime_secs(self) -> RangeInclusive<i64> {
        match self {
            PowerUpKind::SpeedBoost => 5..=15,
            PowerUpKind::Shield => 8..=20,
            PowerUpKind::DoublePoints => 10..=25,
            PowerUpKind::Shrink => 3..=10,
        }
    }

    /// Zero means the effect is applied once on pickup.
    pub fn effect_duration_secs(self) -> i64 {
        match self {
            PowerUpKind::SpeedBoost => 15,
            PowerUpKind::Shield => 10,
            PowerUpKind::DoublePoints => 20,
            PowerUpKind::Shrink => 0,
        }
    }

    pub fn effect_duration_ms(self) -> i64 {
        self.effect_duration_secs() * 1000
    }

    pub fn is_instant(self) -> bool {
        self.effect_duration_secs() == 0
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

/// A collectible sitting on the board, and later the record of its running effect.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerUp {
    pub kind: PowerUpKind,
    pub position: Position,
    pub spawned_at: i64,
    pub expires_at: i64,
    active: bool,
    activated_at: Option<i64>,
    deactivates_at: Option<i64>,
}

impl PowerUp {
    pub fn spawn<R: Rng + ?Sized>(
        kind: PowerUpKind,
        position: Position,
        now: i64,
        rng: &mut R,
    ) -> Self {
        let lifetime_ms = rng.gen_range(kind.lifetime_secs()) * 1000;
        Self::with_lifetime(kind, position, now, lifetime_ms)
    }

    pub fn with_lifetime(kind: PowerUpKind, position: Position, now: i64, lifetime_ms: i64) -> Self {
        Self {
            kind,
            position,
            spawned_at: now,
            expires_at: now + lifetime_ms,
            active: false,
            activated_at: None,
            deactivates_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    #[cfg(test)]
    pub fn activated_at(&self) -> Option<i64> {
        self.activated_at
    }

    #[cfg(test)]
    pub fn deactivates_at(&self) -> Option<i64> {
        self.deactivates_at
    }

    pub fn is_expired(&self, now: i64) -> bool {
        now > self.expires_at
    }

    pub fn is_active_effect(&self, now: i64) -> bool {
        if !self.active || self.activated_at.is_none() {
            return false;
        }
        match self.deactivates_at {
            Some(deactivates_at) => now < deactivates_at,
            None => true,
        }
    }

    /// Starts (or restarts) the effect window at `now`.
    pub fn activate(&mut self, now: i64) {
        self.active = true;
        self.activated_at = Some(now);
        self.deactivates_at = Some(now + self.kind.effect_duration_ms());
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn remaining_effect_fraction(&self, now: i64) -> f64 {
        let (Some(activated_at), Some(deactivates_at)) = (self.activated_at, self.deactivates_at)
        else {
            return 0.0;
        };
        if !self.active || now >= deactivates_at {
            return 0.0;
        }
        remaining_fraction(activated_at, deactivates_at, now)
    }

    pub fn remaining_expiry_fraction(&self, now: i64) -> f64 {
        if now >= self.expires_at {
            return 0.0;
        }
        remaining_fraction(self.spawned_at, self.expires_at, now)
    }
}

fn remaining_fraction(start: i64, end: i64, now: i64) -> f64 {
    let total = (end - start) as f64;
    if total <= 0.0 {
        return 0.0;
    }
    ((end - now) as f64 / total).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const ORIGIN: Position = Position::new(4, 4);

    #[test]
    fn spawned_lifetime_stays_inside_kind_window() {
        let mut rng = StdRng::seed_from_u64(7);
        for kind in PowerUpKind::ALL {
            for _ in 0..50 {
                let power_up = PowerUp::spawn(kind, ORIGIN, 1_000, &mut rng);
                let lifetime_secs = (power_up.expires_at - power_up.spawned_at) / 1000;
                assert!(kind.lifetime_secs().contains(&lifetime_secs));
            }
        }
    }

    #[test]
    fn expiry_turns_on_after_lifetime_and_stays_on() {
        let power_up = PowerUp::with_lifetime(PowerUpKind::Shield, ORIGIN, 0, 8_000);
        assert!(!power_up.is_expired(0));
        assert!(!power_up.is_expired(8_000));
        assert!(power_up.is_expired(8_001));
        assert!(power_up.is_expired(60_000));
    }

    #[test]
    fn effect_window_spans_activation_to_duration() {
        let mut power_up = PowerUp::with_lifetime(PowerUpKind::DoublePoints, ORIGIN, 0, 10_000);
        assert!(!power_up.is_active_effect(0));

        power_up.activate(1_000);
        assert!(power_up.is_active());
        assert_eq!(power_up.deactivates_at(), Some(21_000));
        assert!(power_up.is_active_effect(1_000));
        assert!(power_up.is_active_effect(20_999));
        assert!(!power_up.is_active_effect(21_000));

        power_up.deactivate();
        assert!(!power_up.is_active_effect(5_000));
    }

    #[test]
    fn instant_effects_end_on_activation() {
        let mut power_up = PowerUp::with_lifetime(PowerUpKind::Shrink, ORIGIN, 0, 3_000);
        power_up.activate(500);
        assert!(power_up.is_active());
        assert!(!power_up.is_active_effect(500));
        assert_eq!(power_up.remaining_effect_fraction(500), 0.0);
    }

    #[test]
    fn reactivation_restarts_the_timer() {
        let mut power_up = PowerUp::with_lifetime(PowerUpKind::Shield, ORIGIN, 0, 8_000);
        power_up.activate(0);
        power_up.activate(9_000);
        assert_eq!(power_up.activated_at(), Some(9_000));
        assert!(power_up.is_active_effect(18_000));
    }

    #[test]
    fn remaining_fractions_shrink_linearly() {
        let mut power_up = PowerUp::with_lifetime(PowerUpKind::SpeedBoost, ORIGIN, 0, 10_000);
        assert!((power_up.remaining_expiry_fraction(0) - 1.0).abs() < 1e-9);
        assert!((power_up.remaining_expiry_fraction(2_500) - 0.75).abs() < 1e-9);
        assert_eq!(power_up.remaining_expiry_fraction(10_000), 0.0);

        assert_eq!(power_up.remaining_effect_fraction(0), 0.0);
        power_up.activate(0);
        assert!((power_up.remaining_effect_fraction(7_500) - 0.5).abs() < 1e-9);
        assert_eq!(power_up.remaining_effect_fraction(15_000), 0.0);
    }
}

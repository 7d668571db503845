use crate::vector::Vec2;

/// What a visual effect depicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    /// A melee or ranged hit landed.
    Hit,
    /// A blow was parried.
    Parry,
    /// An arrow stuck in the ground.
    Embed,
    /// A character was born.
    Birth,
    /// A character died.
    Death,
    /// A tree was chopped.
    Chop,
    /// A building was completed.
    Build,
}

/// A short-lived marker for presentation layers.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualEffect {
    /// What happened.
    pub kind: EffectKind,
    /// Where.
    pub position: Vec2,
    /// World time (hours) of creation.
    pub created_at: f64,
    /// Lifetime in hours.
    pub duration: f64,
}

impl VisualEffect {
    /// Returns `true` once the effect has outlived its duration.
    pub fn is_expired(&self, now: f64) -> bool {
        now - self.created_at >= self.duration
    }
}

/// Outbox of visual effects.
#[derive(Debug, Clone, Default)]
pub struct EffectQueue {
    effects: Vec<VisualEffect>,
}

impl EffectQueue {
    /// Default effect lifetime in hours.
    pub const DEFAULT_DURATION: f64 = 0.5;

    /// Record an effect with the default lifetime.
    pub fn push(&mut self, kind: EffectKind, position: Vec2, now: f64) {
        self.effects.push(VisualEffect {
            kind,
            position,
            created_at: now,
            duration: Self::DEFAULT_DURATION,
        });
    }

    /// Drop effects whose lifetime has passed.
    pub fn expire(&mut self, now: f64) {
        self.effects.retain(|e| !e.is_expired(now));
    }

    /// Take every live effect, leaving the outbox empty.
    pub fn drain(&mut self) -> Vec<VisualEffect> {
        std::mem::take(&mut self.effects)
    }

    /// Live effects.
    pub fn as_slice(&self) -> &[VisualEffect] {
        &self.effects
    }

    /// Number of live effects.
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Returns `true` if the outbox is empty.
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effects_expire_after_duration() {
        let mut q = EffectQueue::default();
        q.push(EffectKind::Hit, Vec2::ZERO, 0.0);
        q.push(EffectKind::Birth, Vec2::ZERO, 0.4);
        q.expire(0.5);
        assert_eq!(q.len(), 1);
        assert_eq!(q.drain()[0].kind, EffectKind::Birth);
        assert!(q.is_empty());
    }
}

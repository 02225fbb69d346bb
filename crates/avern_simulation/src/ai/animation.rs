//! Часы анимации
//!
//! Само проигрывание (скелет, блендинг) снаружи. Здесь только время клипа,
//! которое нужно поведению: crucial frame атаки и момент окончания клипа.

use bevy::prelude::*;

use super::events::AnimationFinished;

/// Частота кадров клипов (crucial frame считается в этих кадрах)
pub const ANIMATION_SAMPLE_RATE: f32 = 30.0;

/// Длительность зацикленных клипов (idle / walk)
const LOOP_CLIP_DURATION: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum AnimationClip {
    Idle,
    Walk,
    Attack,
    Death,
}

/// Текущий клип и его время
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct AnimationPlayback {
    pub clip: AnimationClip,
    pub time: f32,
    pub duration: f32,
    pub looping: bool,
    finished: bool,
}

impl Default for AnimationPlayback {
    fn default() -> Self {
        Self::looped(AnimationClip::Idle)
    }
}

impl AnimationPlayback {
    pub fn looped(clip: AnimationClip) -> Self {
        Self {
            clip,
            time: 0.0,
            duration: LOOP_CLIP_DURATION,
            looping: true,
            finished: false,
        }
    }

    /// One-shot: клампится на последнем кадре и один раз шлёт `AnimationFinished`
    pub fn once(clip: AnimationClip, duration: f32) -> Self {
        Self {
            clip,
            time: 0.0,
            duration,
            looping: false,
            finished: false,
        }
    }

    /// Текущий кадр (floor(time * 30))
    pub fn frame(&self) -> u32 {
        (self.time * ANIMATION_SAMPLE_RATE).floor() as u32
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Продвигает время; true: клип только что закончился
    pub fn advance(&mut self, delta: f32) -> bool {
        if self.finished {
            return false;
        }
        self.time += delta;
        if self.looping {
            if self.duration > 0.0 {
                self.time %= self.duration;
            }
            false
        } else if self.time >= self.duration {
            self.time = self.duration;
            self.finished = true;
            true
        } else {
            false
        }
    }
}

/// Система: продвигает клипы, шлёт `AnimationFinished` для доигранных one-shot
pub fn advance_animations(
    time: Res<Time>,
    mut playbacks: Query<(Entity, &mut AnimationPlayback)>,
    mut finished: EventWriter<AnimationFinished>,
) {
    let delta = time.delta_secs();
    for (entity, mut playback) in playbacks.iter_mut() {
        if playback.advance(delta) {
            finished.write(AnimationFinished {
                entity,
                clip: playback.clip,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_shot_finishes_once_and_clamps() {
        let mut playback = AnimationPlayback::once(AnimationClip::Attack, 1.0);

        assert!(!playback.advance(0.6));
        assert!(playback.advance(0.6));
        assert_eq!(playback.time, 1.0);
        assert!(playback.is_finished());
        assert!(!playback.advance(0.6));
    }

    #[test]
    fn test_crucial_frame_sampling() {
        let mut playback = AnimationPlayback::once(AnimationClip::Attack, 2.5);
        playback.advance(0.79);
        assert_eq!(playback.frame(), 23);
        playback.advance(0.02);
        assert_eq!(playback.frame(), 24);
    }

    #[test]
    fn test_looping_clip_never_finishes() {
        let mut playback = AnimationPlayback::looped(AnimationClip::Walk);
        for _ in 0..100 {
            assert!(!playback.advance(0.1));
        }
        assert!(playback.time < playback.duration);
    }
}

//! Obstacles: falling hazards and the explosion effect a bomb leaves behind.

use dodge_protocol::SnapshotObstacle;

use crate::geometry::Rect;

/// The closed set of obstacle kinds. The discriminant is the `k` field on
/// the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ObstacleKind {
    Blade = 0,
    Bomb = 1,
    Flame = 2,
    /// Produced only by a bomb landing; never spawned directly.
    Explosion = 3,
}

impl ObstacleKind {
    /// Width and height. Fixed per kind.
    pub fn size(self) -> (f32, f32) {
        match self {
            Self::Blade => (24.0, 24.0),
            Self::Bomb => (30.0, 30.0),
            Self::Flame => (20.0, 20.0),
            Self::Explosion => (96.0, 96.0),
        }
    }

    /// Downward speed in px/s.
    pub fn fall_speed(self) -> f32 {
        match self {
            Self::Blade => 320.0,
            Self::Bomb => 260.0,
            Self::Flame => 380.0,
            Self::Explosion => 0.0,
        }
    }

    /// Hit box scale applied around the obstacle's centre.
    pub fn hitbox_scale(self) -> f32 {
        match self {
            Self::Flame => 0.5,
            _ => 0.7,
        }
    }

    /// Whether touching this kind kills. Bombs in flight and explosions
    /// are harmless; the blast pushes instead.
    pub fn is_lethal(self) -> bool {
        matches!(self, Self::Blade | Self::Flame)
    }

    pub fn wire_code(self) -> u8 {
        self as u8
    }
}

/// A single obstacle in the world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub rect: Rect,
    pub kind: ObstacleKind,
    /// Remaining lifetime. Only meaningful for [`ObstacleKind::Explosion`].
    pub life_ms: f64,
}

impl Obstacle {
    /// A falling obstacle whose bottom edge sits on the top of the world.
    pub fn falling(kind: ObstacleKind, x: f32) -> Self {
        let (w, h) = kind.size();
        Self {
            rect: Rect::new(x, -h, w, h),
            kind,
            life_ms: 0.0,
        }
    }

    /// An explosion effect centred on `(cx, cy)`.
    pub fn explosion(cx: f32, cy: f32, life_ms: f64) -> Self {
        let (w, h) = ObstacleKind::Explosion.size();
        Self {
            rect: Rect::centered(cx, cy, w, h),
            kind: ObstacleKind::Explosion,
            life_ms,
        }
    }

    pub fn hitbox(&self) -> Rect {
        let s = self.kind.hitbox_scale();
        self.rect.deflate_around_center(s, s)
    }

    pub fn to_wire(&self) -> SnapshotObstacle {
        SnapshotObstacle {
            x: self.rect.x,
            y: self.rect.y,
            w: self.rect.w,
            h: self.rect.h,
            k: self.kind.wire_code(),
        }
    }
}

//! Object entities
//!
//! An [`Entity`] is one decorated item on the tree: an ornament, a dust mote
//! or a framed photo. It owns the node it moves and carries the immutable
//! layout data computed when it was created. The per-frame behavior lives in
//! [`Entity::update`], which only ever touches the entity's own transform.

use cgmath::{Vector3, VectorSpace};

use crate::config::FocusConfig;
use crate::gfx::scene::{NodeId, Transform};

use super::layout::LayoutTargets;
use super::state::Mode;

/// Yaw added per second while the tree is formed
const TREE_SPIN_RATE: f32 = 0.5;
/// Rate at which tilt decays toward upright while the tree is formed
const TILT_DECAY_RATE: f32 = 1.0;
/// Scale multiplier for photos floating in the scatter field
const SCATTERED_PHOTO_SCALE: f32 = 2.5;
/// Scale multiplier for entities receding behind a focused photo
const RECEDING_SCALE: f32 = 0.8;
/// Angular frequency of the dust pulse
const DUST_PULSE_RATE: f32 = 4.0;

/// Stable index of an entity in its [`ParticleSystem`](super::particles::ParticleSystem)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(usize);

impl EntityId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    OrnamentBox,
    GoldBox,
    GoldSphere,
    Red,
    CandyCane,
    Photo,
    Dust,
}

impl EntityKind {
    pub fn is_photo(self) -> bool {
        self == EntityKind::Photo
    }

    pub fn is_dust(self) -> bool {
        self == EntityKind::Dust
    }

    /// Multiplier applied to the random spin velocity
    pub fn spin_multiplier(self) -> f32 {
        if self.is_photo() {
            0.3
        } else {
            2.0
        }
    }
}

/// Everything an entity needs to know about the current frame
#[derive(Debug, Clone, Copy)]
pub struct FrameContext<'a> {
    /// Seconds since the previous frame, already clamped
    pub dt: f32,
    /// Seconds since the loop started
    pub elapsed: f32,
    pub mode: Mode,
    pub focus_target: Option<EntityId>,
    /// Where the focused entity settles, and the camera eye it turns toward,
    /// both in the focused entity's parent space
    pub focus_frame: Option<FocusFrame>,
    /// Largest footprint (width, height) the focused entity may cover, set
    /// only on compact viewports
    pub viewport_limit: Option<(f32, f32)>,
    pub focus: &'a FocusConfig,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocusFrame {
    pub point: Vector3<f32>,
    pub eye: Vector3<f32>,
}

#[derive(Debug, Clone)]
pub struct Entity {
    id: EntityId,
    node: NodeId,
    kind: EntityKind,
    targets: LayoutTargets,
    base_scale: f32,
    spin_velocity: Vector3<f32>,
    /// Outer frame size of a photo, in the entity's local units
    frame_size: Option<(f32, f32)>,
}

/// Exponential blend factor for `rate * dt`, capped so a long frame lands
/// on the target instead of overshooting it
fn blend(rate_dt: f32) -> f32 {
    rate_dt.clamp(0.0, 1.0)
}

fn lerp(from: f32, to: f32, amount: f32) -> f32 {
    from + (to - from) * amount
}

impl Entity {
    pub fn new(
        id: EntityId,
        node: NodeId,
        kind: EntityKind,
        targets: LayoutTargets,
        base_scale: f32,
        spin_velocity: Vector3<f32>,
    ) -> Self {
        Self {
            id,
            node,
            kind,
            targets,
            base_scale,
            spin_velocity,
            frame_size: None,
        }
    }

    pub fn with_frame_size(mut self, width: f32, height: f32) -> Self {
        self.frame_size = Some((width, height));
        self
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn is_dust(&self) -> bool {
        self.kind.is_dust()
    }

    pub fn is_photo(&self) -> bool {
        self.kind.is_photo()
    }

    pub fn target_tree(&self) -> Vector3<f32> {
        self.targets.tree
    }

    pub fn target_scatter(&self) -> Vector3<f32> {
        self.targets.scatter
    }

    pub fn base_scale(&self) -> f32 {
        self.base_scale
    }

    pub fn spin_velocity(&self) -> Vector3<f32> {
        self.spin_velocity
    }

    pub fn frame_size(&self) -> Option<(f32, f32)> {
        self.frame_size
    }

    fn is_focused(&self, ctx: &FrameContext) -> bool {
        ctx.mode == Mode::Focus && ctx.focus_target == Some(self.id)
    }

    /// Position this entity is heading toward this frame
    pub fn target_position(&self, ctx: &FrameContext) -> Vector3<f32> {
        match ctx.mode {
            Mode::Tree => self.targets.tree,
            Mode::Scatter => self.targets.scatter,
            Mode::Focus => match ctx.focus_frame {
                Some(frame) if self.is_focused(ctx) => frame.point,
                _ => self.targets.scatter,
            },
        }
    }

    /// Scale this entity is heading toward this frame
    pub fn target_scale(&self, ctx: &FrameContext) -> f32 {
        if self.is_dust() {
            if ctx.mode == Mode::Tree {
                return 0.0;
            }
            let pulse = (ctx.elapsed * DUST_PULSE_RATE + self.id.0 as f32).sin();
            return self.base_scale * (0.8 + 0.4 * pulse);
        }

        match ctx.mode {
            Mode::Scatter if self.is_photo() => self.base_scale * SCATTERED_PHOTO_SCALE,
            Mode::Focus if self.is_focused(ctx) => {
                let mut scale = ctx.focus.scale;
                if let (Some((max_w, max_h)), Some((frame_w, frame_h))) =
                    (ctx.viewport_limit, self.frame_size)
                {
                    scale = scale.min((max_w / frame_w).min(max_h / frame_h));
                }
                scale
            }
            Mode::Focus => self.base_scale * RECEDING_SCALE,
            _ => self.base_scale,
        }
    }

    /// Advances the entity's transform by one frame
    pub fn update(&self, transform: &mut Transform, ctx: &FrameContext) {
        let dt = ctx.dt;
        let focused = self.is_focused(ctx);

        let lerp_speed = if focused {
            ctx.focus.focused_lerp_speed
        } else {
            ctx.focus.lerp_speed
        };
        let target = self.target_position(ctx);
        transform.position = transform.position.lerp(target, blend(lerp_speed * dt));

        match ctx.mode {
            Mode::Scatter => transform.rotation += self.spin_velocity * dt,
            Mode::Tree => {
                let decay = blend(TILT_DECAY_RATE * dt);
                transform.rotation.x = lerp(transform.rotation.x, 0.0, decay);
                transform.rotation.z = lerp(transform.rotation.z, 0.0, decay);
                transform.rotation.y += TREE_SPIN_RATE * dt;
            }
            // Everything but the focused photo holds its rotation
            Mode::Focus => {}
        }

        if focused {
            if let Some(frame) = ctx.focus_frame {
                transform.look_at(frame.eye);
            }
        }

        let scale = self.target_scale(ctx);
        transform.scale = lerp(transform.scale, scale, blend(ctx.focus.scale_lerp_rate * dt));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::SceneGraph;
    use cgmath::{InnerSpace, Vector4, Zero};
    use float_cmp::approx_eq;

    fn targets() -> LayoutTargets {
        LayoutTargets {
            tree: Vector3::new(1.0, 2.0, 3.0),
            scatter: Vector3::new(-10.0, 4.0, 0.0),
        }
    }

    fn entity(index: usize, kind: EntityKind, base_scale: f32) -> Entity {
        Entity::new(
            EntityId::new(index),
            SceneGraph::new().root(),
            kind,
            targets(),
            base_scale,
            Vector3::new(0.2, -0.1, 0.05),
        )
    }

    fn context(focus: &FocusConfig, mode: Mode, target: Option<EntityId>) -> FrameContext<'_> {
        FrameContext {
            dt: 0.016,
            elapsed: 0.0,
            mode,
            focus_target: target,
            focus_frame: Some(FocusFrame {
                point: Vector3::new(0.0, 2.0, 35.0),
                eye: Vector3::new(0.0, 2.0, 50.0),
            }),
            viewport_limit: None,
            focus,
        }
    }

    #[test]
    fn test_dust_is_hidden_in_tree_mode() {
        let focus = FocusConfig::default();
        let dust = entity(17, EntityKind::Dust, 1.2);
        let mut ctx = context(&focus, Mode::Tree, None);

        for step in 0..500 {
            ctx.elapsed = step as f32 * 0.37;
            assert_eq!(dust.target_scale(&ctx), 0.0);
        }

        ctx.mode = Mode::Scatter;
        for step in 0..100 {
            ctx.elapsed = step as f32 * 0.37;
            let s = dust.target_scale(&ctx);
            assert!(s >= 1.2 * 0.4 - 1e-5 && s <= 1.2 * 1.2 + 1e-5);
        }
    }

    #[test]
    fn test_target_positions_per_mode() {
        let focus = FocusConfig::default();
        let photo = entity(0, EntityKind::Photo, 0.8);
        let other = entity(1, EntityKind::Photo, 0.8);

        assert_eq!(photo.target_position(&context(&focus, Mode::Tree, None)), targets().tree);
        assert_eq!(photo.target_position(&context(&focus, Mode::Scatter, None)), targets().scatter);

        let ctx = context(&focus, Mode::Focus, Some(photo.id()));
        assert_eq!(photo.target_position(&ctx), Vector3::new(0.0, 2.0, 35.0));
        assert_eq!(other.target_position(&ctx), targets().scatter);
    }

    #[test]
    fn test_target_scales() {
        let focus = FocusConfig::default();
        let photo = entity(0, EntityKind::Photo, 0.8).with_frame_size(1.4, 1.4);
        let ornament = entity(1, EntityKind::GoldSphere, 0.5);

        let scatter = context(&focus, Mode::Scatter, None);
        assert!(approx_eq!(f32, photo.target_scale(&scatter), 2.0, epsilon = 1e-6));
        assert_eq!(ornament.target_scale(&scatter), 0.5);

        let mut focused = context(&focus, Mode::Focus, Some(photo.id()));
        assert_eq!(photo.target_scale(&focused), 4.5);
        assert!(approx_eq!(f32, ornament.target_scale(&focused), 0.4, epsilon = 1e-6));

        focused.viewport_limit = Some((2.8, 7.0));
        assert!(approx_eq!(f32, photo.target_scale(&focused), 2.0, epsilon = 1e-6));

        assert_eq!(photo.target_scale(&context(&focus, Mode::Tree, None)), 0.8);
    }

    #[test]
    fn test_update_blends_toward_target() {
        let focus = FocusConfig::default();
        let ornament = entity(0, EntityKind::OrnamentBox, 0.6);
        let mut transform = Transform::default();
        let mut ctx = context(&focus, Mode::Tree, None);
        ctx.dt = 0.1;

        ornament.update(&mut transform, &ctx);
        // Position moves 2.0 * 0.1 of the way, scale 4.0 * 0.1 of the way
        let expected = targets().tree * 0.2;
        assert!((transform.position - expected).magnitude() < 1e-5);
        assert!(approx_eq!(f32, transform.scale, 1.0 + (0.6 - 1.0) * 0.4, epsilon = 1e-6));
        assert!(approx_eq!(f32, transform.rotation.y, 0.05, epsilon = 1e-6));

        for _ in 0..200 {
            ornament.update(&mut transform, &ctx);
        }
        assert!((transform.position - targets().tree).magnitude() < 1e-3);
        assert!(approx_eq!(f32, transform.scale, 0.6, epsilon = 1e-4));
    }

    #[test]
    fn test_long_frame_does_not_overshoot() {
        let focus = FocusConfig::default();
        let ornament = entity(0, EntityKind::Red, 0.6);
        let mut transform = Transform::default();
        let mut ctx = context(&focus, Mode::Scatter, None);
        ctx.dt = 5.0;

        ornament.update(&mut transform, &ctx);
        assert_eq!(transform.position, targets().scatter);
        assert!(approx_eq!(f32, transform.scale, 0.6, epsilon = 1e-6));
    }

    #[test]
    fn test_scatter_spins_and_focus_holds_rotation() {
        let focus = FocusConfig::default();
        let ornament = entity(0, EntityKind::CandyCane, 0.6);
        let mut transform = Transform::default();
        let mut ctx = context(&focus, Mode::Scatter, None);
        ctx.dt = 0.5;

        ornament.update(&mut transform, &ctx);
        assert!((transform.rotation - Vector3::new(0.1, -0.05, 0.025)).magnitude() < 1e-6);

        ctx.mode = Mode::Focus;
        ctx.focus_target = Some(EntityId::new(99));
        let before = transform.rotation;
        ornament.update(&mut transform, &ctx);
        assert_eq!(transform.rotation, before);
    }

    #[test]
    fn test_focused_photo_faces_camera() {
        let focus = FocusConfig::default();
        let photo = entity(3, EntityKind::Photo, 0.8);
        let mut transform = Transform::from_position(Vector3::new(5.0, -3.0, 10.0));
        let ctx = context(&focus, Mode::Focus, Some(photo.id()));

        photo.update(&mut transform, &ctx);

        let facing = (transform.rotation_matrix() * Vector4::unit_z()).truncate();
        let to_eye = (Vector3::new(0.0, 2.0, 50.0) - transform.position).normalize();
        assert!(facing.dot(to_eye) > 0.9999);
        assert!(transform.position != Vector3::zero());
    }
}

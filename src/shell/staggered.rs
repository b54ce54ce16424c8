//! Staggered workspace animation when swiping home from an app
//!
//! Rows slide up into place one after another, bottom row first, while the
//! scrim fades out. The initial row offset grows with the release velocity.
//! Rows draw outside their cells while moving, so clipping is disabled for
//! the duration and restored by the group epilogue once every row and the
//! scrim have ended (finished or canceled).

use crate::anim::{AnimatedSetter, AnimationGroup, Animator, FrameClock, Interpolator, PropertySetter};
use crate::config::StaggeredConfig;
use crate::state::{DeviceGeometry, UiState};

use super::scene::HomeScene;

/// Largest initial row offset, as a fraction of screen height
const MAX_OFFSET_FRACTION: f32 = 0.1;
/// Release speed (px/ms) at which the offset reaches its maximum
const FULL_OFFSET_VELOCITY: f32 = 5.0;

pub struct StaggeredWorkspaceAnim {
    group: AnimationGroup,
    animators: Vec<Animator>,
}

impl StaggeredWorkspaceAnim {
    pub fn new(
        clock: &FrameClock,
        scene: &HomeScene,
        velocity: f32,
        config: &StaggeredConfig,
        geometry: &dyn DeviceGeometry,
    ) -> Self {
        let offset = geometry.height()
            * MAX_OFFSET_FRACTION
            * (velocity.abs() / FULL_OFFSET_VELOCITY).min(1.0);
        let row_count = scene.rows.len();

        let mut animators = Vec::with_capacity(row_count + 1);
        for (index, row) in scene.rows.iter().enumerate() {
            row.set(offset);
            let mut setter = AnimatedSetter::new();
            setter.set_float(row, 0.0, Interpolator::Decelerate);
            let delay = (row_count - 1 - index) as u64 * config.row_stagger_ms;
            animators.push(
                setter
                    .build(clock, config.row_duration_ms, 0.0)
                    .with_start_delay(delay),
            );
        }

        let mut scrim = AnimatedSetter::new();
        scrim.set_float(&scene.scrim_alpha, UiState::Normal.scrim_alpha(), Interpolator::Linear);
        animators.push(scrim.build(clock, config.scrim_fade_ms, 0.0));

        let clip = scene.clip.clone();
        let saved = (
            clip.workspace_clip_children.get(),
            clip.cell_layout_clip_children.get(),
        );
        clip.workspace_clip_children.set(false);
        clip.cell_layout_clip_children.set(false);

        let group = AnimationGroup::new(animators.clone(), move || {
            clip.workspace_clip_children.set(saved.0);
            clip.cell_layout_clip_children.set(saved.1);
            tracing::debug!("staggered home animation done, clipping restored");
        });

        tracing::debug!(rows = row_count, offset, velocity, "staggered home animation");
        Self { group, animators }
    }

    pub fn start(&self) {
        self.group.start();
    }

    /// Jump rows and scrim to their final values
    pub fn end(&self) {
        self.group.end();
    }

    pub fn cancel(&self) {
        self.group.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.group.has_completed()
    }

    pub fn animators(&self) -> &[Animator] {
        &self.animators
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::FixedGeometry;

    fn setup() -> (FrameClock, HomeScene, FixedGeometry) {
        let geometry = FixedGeometry::default();
        (FrameClock::new(), HomeScene::new(4, geometry.width), geometry)
    }

    #[test]
    fn test_rows_bottom_first() {
        let (clock, scene, geometry) = setup();
        scene.scrim_alpha.set(0.5);
        let anim = StaggeredWorkspaceAnim::new(
            &clock,
            &scene,
            -5.0,
            &StaggeredConfig::default(),
            &geometry,
        );
        let offset = geometry.height * MAX_OFFSET_FRACTION;
        assert!(scene.rows.iter().all(|r| (r.get() - offset).abs() < 1e-3));
        assert!(!scene.clip.workspace_clip_children.get());

        anim.start();
        clock.run_for(100);
        let top = scene.rows[0].get();
        let bottom = scene.rows[3].get();
        assert!(bottom < top, "bottom row moves first ({} vs {})", bottom, top);
        assert!(scene.scrim_alpha.get() < 0.5);

        clock.run_for(1000);
        assert!(anim.is_finished());
        assert!(scene.rows.iter().all(|r| r.get() == 0.0));
        assert_eq!(scene.scrim_alpha.get(), 0.0);
        assert!(scene.clip.workspace_clip_children.get());
        assert!(scene.clip.cell_layout_clip_children.get());
    }

    #[test]
    fn test_slow_release_small_offset() {
        let (clock, scene, geometry) = setup();
        let _anim = StaggeredWorkspaceAnim::new(
            &clock,
            &scene,
            0.5,
            &StaggeredConfig::default(),
            &geometry,
        );
        let max = geometry.height * MAX_OFFSET_FRACTION;
        assert!(scene.rows[0].get() < max / 2.0);
    }

    #[test]
    fn test_cancel_restores_clip() {
        let (clock, scene, geometry) = setup();
        scene.clip.cell_layout_clip_children.set(false);
        let anim = StaggeredWorkspaceAnim::new(
            &clock,
            &scene,
            -3.0,
            &StaggeredConfig::default(),
            &geometry,
        );
        anim.start();
        clock.run_for(50);
        anim.cancel();
        assert!(anim.is_finished());
        assert!(scene.clip.workspace_clip_children.get());
        // Restores what was there before, not a default
        assert!(!scene.clip.cell_layout_clip_children.get());
    }

    #[test]
    fn test_end_settles_rows() {
        let (clock, scene, geometry) = setup();
        let anim = StaggeredWorkspaceAnim::new(
            &clock,
            &scene,
            -5.0,
            &StaggeredConfig::default(),
            &geometry,
        );
        anim.start();
        anim.end();
        assert!(scene.rows.iter().all(|r| r.get() == 0.0));
        assert_eq!(anim.animators().len(), 5);
    }
}

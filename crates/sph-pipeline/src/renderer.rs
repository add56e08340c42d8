//! Host renderer settings
//!
//! The simulation output should be the only thing on screen, so the host's
//! built-in sky and world effects are switched off once at startup.

use serde::{Deserialize, Serialize};

/// Built-in render features the host can toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderFeatures {
    pub sun: bool,
    pub horizon: bool,
    pub clouds: bool,
    pub moon: bool,
    pub vignette: bool,
    pub water_overlay: bool,
    pub entity_shadow: bool,
    pub stars: bool,
    pub block_outline: bool,
    pub hand: bool,
}

impl Default for RenderFeatures {
    fn default() -> Self {
        Self {
            sun: true,
            horizon: true,
            clouds: true,
            moon: true,
            vignette: true,
            water_overlay: true,
            entity_shadow: true,
            stars: true,
            block_outline: true,
            hand: true,
        }
    }
}

/// Renderer state as exposed by the host
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RendererState {
    /// Sun path rotation in degrees
    pub sun_path_rotation: f32,
    pub ambient_occlusion_level: f32,
    pub merged_hand_depth: bool,
    pub disable_shade: bool,
    pub shadow_map_resolution: u32,
    pub render: RenderFeatures,
}

impl Default for RendererState {
    fn default() -> Self {
        Self {
            sun_path_rotation: 0.0,
            ambient_occlusion_level: 1.0,
            merged_hand_depth: true,
            disable_shade: true,
            shadow_map_resolution: 1024,
            render: RenderFeatures::default(),
        }
    }
}

/// Disables every host effect that would draw over the simulation
///
/// Touches exactly twelve fields; everything else keeps its value.
pub fn configure_renderer(renderer: &mut RendererState) {
    renderer.sun_path_rotation = 0.0;
    renderer.ambient_occlusion_level = 0.0;
    renderer.merged_hand_depth = false;
    renderer.disable_shade = false;

    let render = &mut renderer.render;
    render.sun = false;
    render.horizon = false;
    render.clouds = false;
    render.moon = false;
    render.vignette = false;
    render.water_overlay = false;
    render.entity_shadow = false;
    render.stars = false;

    tracing::debug!("configured renderer state");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configure_renderer() {
        let mut renderer = RendererState {
            sun_path_rotation: 30.0,
            ..RendererState::default()
        };
        configure_renderer(&mut renderer);

        assert_eq!(renderer.sun_path_rotation, 0.0);
        assert_eq!(renderer.ambient_occlusion_level, 0.0);
        assert!(!renderer.merged_hand_depth);
        assert!(!renderer.disable_shade);
        let render = renderer.render;
        assert!(!(render.sun || render.horizon || render.clouds || render.moon || render.vignette || render.water_overlay || render.entity_shadow || render.stars));
    }

    #[test]
    fn test_other_fields_untouched() {
        let mut renderer = RendererState {
            shadow_map_resolution: 4096,
            ..RendererState::default()
        };
        renderer.render.block_outline = false;
        configure_renderer(&mut renderer);

        assert_eq!(renderer.shadow_map_resolution, 4096);
        assert!(!renderer.render.block_outline);
        assert!(renderer.render.hand);
    }

    #[test]
    fn test_configure_renderer_is_idempotent() {
        let mut once = RendererState::default();
        configure_renderer(&mut once);
        let mut twice = once;
        configure_renderer(&mut twice);
        assert_eq!(once, twice);
    }
}

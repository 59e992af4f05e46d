use crate::{
    config::InteractionConfig,
    geo::{rotation_yaw_pitch_roll, Matrix4f},
};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    SingleView,
    QuiltPreview,
}

impl DisplayMode {
    pub fn toggled(self) -> Self {
        match self {
            DisplayMode::SingleView => DisplayMode::QuiltPreview,
            DisplayMode::QuiltPreview => DisplayMode::SingleView,
        }
    }
}

/// The spinning cube and the user's grip on it.
#[derive(Debug)]
pub struct CubeModel {
    settings: InteractionConfig,
    /// Automatic rotation, applied as yaw and roll.
    pub spin: f32,
    pub drag_yaw: f32,
    pub drag_pitch: f32,
    cursor: Option<(f64, f64)>,
    dragging: bool,
    since_input: Option<Duration>,
    pub display_mode: DisplayMode,
}

impl CubeModel {
    pub fn new(settings: InteractionConfig) -> Self {
        Self {
            settings,
            spin: 0.0,
            drag_yaw: 0.0,
            drag_pitch: 0.0,
            cursor: None,
            dragging: false,
            since_input: None,
            display_mode: DisplayMode::SingleView,
        }
    }

    /// Whether auto rotation is currently held back by recent input.
    pub fn user_controlling(&self) -> bool {
        if self.dragging {
            return true;
        }
        match self.since_input {
            Some(elapsed) => elapsed.as_secs_f32() <= self.settings.input_cooldown_secs,
            None => false,
        }
    }

    pub fn update(&mut self, dt: Duration) {
        if let Some(elapsed) = &mut self.since_input {
            if !self.dragging {
                *elapsed += dt;
            }
        }
        if !self.user_controlling() {
            self.spin += self.settings.rotation_speed * dt.as_secs_f32();
        }
    }

    pub fn press(&mut self) {
        self.dragging = true;
        self.since_input = Some(Duration::from_secs(0));
    }

    pub fn release(&mut self) {
        self.dragging = false;
    }

    pub fn cursor_moved(&mut self, x: f64, y: f64) {
        if let (true, Some((last_x, last_y))) = (self.dragging, self.cursor) {
            self.drag_yaw += (x - last_x) as f32 * self.settings.drag_sensitivity;
            self.drag_pitch += (y - last_y) as f32 * self.settings.drag_sensitivity;
            self.since_input = Some(Duration::from_secs(0));
        }
        self.cursor = Some((x, y));
    }

    pub fn toggle_display_mode(&mut self) {
        self.display_mode = self.display_mode.toggled();
    }

    pub fn model_matrix(&self) -> Matrix4f {
        rotation_yaw_pitch_roll(self.spin + self.drag_yaw, self.drag_pitch, self.spin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn model() -> CubeModel {
        CubeModel::new(InteractionConfig {
            rotation_speed: 1.0,
            drag_sensitivity: 0.01,
            input_cooldown_secs: 3.0,
        })
    }

    #[test]
    fn spins_without_input() {
        let mut model = model();
        model.update(Duration::from_millis(500));
        model.update(Duration::from_millis(500));
        assert_abs_diff_eq!(model.spin, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn drag_rotates_and_pauses_spin() {
        let mut model = model();
        model.cursor_moved(100.0, 100.0);
        model.press();
        model.cursor_moved(150.0, 80.0);
        assert_abs_diff_eq!(model.drag_yaw, 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(model.drag_pitch, -0.2, epsilon = 1e-6);

        model.update(Duration::from_secs(10));
        assert_eq!(model.spin, 0.0);

        model.release();
        model.update(Duration::from_secs(2));
        assert_eq!(model.spin, 0.0);
        assert!(model.user_controlling());

        model.update(Duration::from_secs(2));
        assert!(!model.user_controlling());
        assert_abs_diff_eq!(model.spin, 2.0, epsilon = 1e-6);
    }

    #[test]
    fn moving_without_press_does_not_rotate() {
        let mut model = model();
        model.cursor_moved(0.0, 0.0);
        model.cursor_moved(300.0, 300.0);
        assert_eq!((model.drag_yaw, model.drag_pitch), (0.0, 0.0));
        assert!(!model.user_controlling());
    }

    #[test]
    fn display_mode_toggles() {
        let mut model = model();
        assert_eq!(model.display_mode, DisplayMode::SingleView);
        model.toggle_display_mode();
        assert_eq!(model.display_mode, DisplayMode::QuiltPreview);
        model.toggle_display_mode();
        assert_eq!(model.display_mode, DisplayMode::SingleView);
    }
}

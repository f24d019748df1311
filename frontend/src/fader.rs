//! Fader gestures: pointer drag and wheel steps to percent and gain.

use mixdesk_types::console::{WHEEL_FINE_STEP, WHEEL_STEP};

use crate::gain::percent_to_gain;

/// Pixel geometry of a vertical fader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaderGeometry {
    pub track_height: f32,
    pub thumb_height: f32,
}

impl FaderGeometry {
    pub fn new(track_height: f32, thumb_height: f32) -> Self {
        Self {
            track_height,
            thumb_height,
        }
    }

    /// Distance the thumb can travel. Zero for degenerate tracks.
    pub fn travel(&self) -> f32 {
        let travel = self.track_height - self.thumb_height;
        if travel.is_finite() && travel > 0.0 {
            travel
        } else {
            0.0
        }
    }

    /// Thumb top for a percent: 100 at the top, 0 at the bottom.
    pub fn top_for_percent(&self, percent: f32) -> f32 {
        self.travel() * (1.0 - percent.clamp(0.0, 100.0) / 100.0)
    }

    /// Percent for a thumb top. A track without travel is always at 0.
    pub fn percent_for_top(&self, top: f32) -> f32 {
        let travel = self.travel();
        if travel <= 0.0 {
            return 0.0;
        }
        (100.0 * (1.0 - top.clamp(0.0, travel) / travel)).clamp(0.0, 100.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FaderState {
    Idle,
    Dragging { drag_offset: f32 },
}

/// New fader position and the gain to send for it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaderUpdate {
    pub percent: f32,
    pub thumb_top: f32,
    pub gain: f32,
}

/// Gesture state machine for one channel fader.
///
/// The fader position is owned locally: moves are committed immediately and
/// never rolled back, whatever the engine answers.
#[derive(Debug, Clone, PartialEq)]
pub struct FaderController {
    geometry: FaderGeometry,
    state: FaderState,
    percent: f32,
    thumb_top: f32,
}

impl FaderController {
    pub fn new(geometry: FaderGeometry, percent: f32) -> Self {
        let mut fader = Self {
            geometry,
            state: FaderState::Idle,
            percent: 0.0,
            thumb_top: 0.0,
        };
        fader.place(percent);
        fader
    }

    pub fn geometry(&self) -> FaderGeometry {
        self.geometry
    }

    pub fn state(&self) -> FaderState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, FaderState::Dragging { .. })
    }

    pub fn percent(&self) -> f32 {
        self.percent
    }

    pub fn thumb_top(&self) -> f32 {
        self.thumb_top
    }

    /// Resize the fader, keeping its percent.
    pub fn set_geometry(&mut self, geometry: FaderGeometry) {
        if geometry != self.geometry {
            self.geometry = geometry;
            self.place(self.percent);
        }
    }

    /// Move the thumb without emitting a gain.
    pub fn set_percent(&mut self, percent: f32) {
        self.place(percent);
    }

    /// Pointer pressed on the thumb. Remembers where the thumb was grabbed.
    pub fn pointer_down(&mut self, pointer_y: f32) {
        self.state = FaderState::Dragging {
            drag_offset: pointer_y - self.thumb_top,
        };
    }

    /// Pointer moved anywhere. Emits an update while dragging.
    pub fn pointer_move(&mut self, pointer_y: f32) -> Option<FaderUpdate> {
        let FaderState::Dragging { drag_offset } = self.state else {
            return None;
        };
        if !pointer_y.is_finite() {
            return None;
        }

        let top = (pointer_y - drag_offset).clamp(0.0, self.geometry.travel());
        let percent = self.geometry.percent_for_top(top).round();
        Some(self.place(percent))
    }

    /// Pointer released anywhere. Returns whether a drag ended.
    pub fn pointer_up(&mut self) -> bool {
        let was_dragging = self.is_dragging();
        self.state = FaderState::Idle;
        was_dragging
    }

    /// One wheel notch. Positive `delta_y` scrolls down and lowers the fader;
    /// `fine` selects the small step.
    pub fn wheel(&mut self, delta_y: f32, fine: bool) -> Option<FaderUpdate> {
        if delta_y == 0.0 || !delta_y.is_finite() {
            return None;
        }
        let step = if fine { WHEEL_FINE_STEP } else { WHEEL_STEP };
        let current = self.geometry.percent_for_top(self.thumb_top);
        let percent = (current - step * delta_y.signum()).clamp(0.0, 100.0);
        Some(self.place(percent))
    }

    fn place(&mut self, percent: f32) -> FaderUpdate {
        let percent = if self.geometry.travel() <= 0.0 || percent.is_nan() {
            0.0
        } else {
            percent.clamp(0.0, 100.0)
        };
        self.percent = percent;
        self.thumb_top = self.geometry.top_for_percent(percent);
        FaderUpdate {
            percent,
            thumb_top: self.thumb_top,
            gain: percent_to_gain(percent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fader_200() -> FaderController {
        // 200px track, 20px thumb: 180px of travel
        FaderController::new(FaderGeometry::new(200.0, 20.0), 0.0)
    }

    #[test]
    fn test_initial_position() {
        let fader = FaderController::new(FaderGeometry::new(200.0, 20.0), 100.0);
        assert_eq!(fader.thumb_top(), 0.0);
        assert_eq!(fader.state(), FaderState::Idle);

        let fader = FaderController::new(FaderGeometry::new(200.0, 20.0), 0.0);
        assert_eq!(fader.thumb_top(), 180.0);
    }

    #[test]
    fn test_move_without_drag_is_ignored() {
        let mut fader = fader_200();
        assert_eq!(fader.pointer_move(10.0), None);
    }

    #[test]
    fn test_drag_to_top_and_bottom() {
        let mut fader = fader_200();
        // Grab the thumb 5px below its top edge
        fader.pointer_down(185.0);
        assert_eq!(fader.state(), FaderState::Dragging { drag_offset: 5.0 });

        let update = fader.pointer_move(-500.0).unwrap();
        assert_eq!(update.percent, 100.0);
        assert_eq!(update.thumb_top, 0.0);
        assert_eq!(update.gain, 1.0);

        let update = fader.pointer_move(900.0).unwrap();
        assert_eq!(update.percent, 0.0);
        assert_eq!(update.thumb_top, 180.0);
        assert!((update.gain - 0.001).abs() < 1e-6);
    }

    #[test]
    fn test_drag_is_relative_to_grab_point() {
        let mut fader = FaderController::new(FaderGeometry::new(200.0, 20.0), 50.0);
        assert_eq!(fader.thumb_top(), 90.0);

        fader.pointer_down(95.0);
        // Pointer did not move relative to the thumb: same position
        let update = fader.pointer_move(95.0).unwrap();
        assert_eq!(update.percent, 50.0);
        assert_eq!(update.thumb_top, 90.0);
    }

    #[test]
    fn test_drag_rounds_and_snaps_thumb() {
        let mut fader = fader_200();
        fader.pointer_down(180.0);
        // 100px from top of 180px travel: 44.44% -> 44
        let update = fader.pointer_move(100.0).unwrap();
        assert_eq!(update.percent, 44.0);
        assert!((update.thumb_top - 180.0 * 0.56).abs() < 1e-4);
    }

    #[test]
    fn test_settle_is_idempotent() {
        let mut fader = fader_200();
        fader.pointer_down(180.0);
        for y in [170.0, 123.4, 77.7, 33.3] {
            fader.pointer_move(y);
        }
        assert!(fader.pointer_up());
        assert!(!fader.pointer_up());

        let settled = fader.percent();
        let requeried = fader.geometry().percent_for_top(fader.thumb_top()).round();
        assert_eq!(settled, requeried);
        assert_eq!(fader.pointer_move(0.0), None);
    }

    #[test]
    fn test_wheel_steps() {
        let mut fader = FaderController::new(FaderGeometry::new(200.0, 20.0), 50.0);

        let update = fader.wheel(-120.0, false).unwrap();
        assert!((update.percent - 51.0).abs() < 1e-3);

        let update = fader.wheel(3.0, false).unwrap();
        assert!((update.percent - 50.0).abs() < 1e-3);

        let update = fader.wheel(-1.0, true).unwrap();
        assert!((update.percent - 50.1).abs() < 1e-3);
        assert!((update.gain - percent_to_gain(update.percent)).abs() < 1e-6);
    }

    #[test]
    fn test_wheel_clamps_at_ends() {
        let mut fader = FaderController::new(FaderGeometry::new(200.0, 20.0), 100.0);
        let update = fader.wheel(-1.0, false).unwrap();
        assert_eq!(update.percent, 100.0);
        assert_eq!(update.gain, 1.0);

        let mut fader = fader_200();
        let update = fader.wheel(1.0, false).unwrap();
        assert_eq!(update.percent, 0.0);
    }

    #[test]
    fn test_wheel_works_while_idle_and_without_delta_does_nothing() {
        let mut fader = fader_200();
        assert_eq!(fader.wheel(0.0, false), None);
        assert!(fader.wheel(-1.0, false).is_some());
        assert_eq!(fader.state(), FaderState::Idle);
    }

    #[test]
    fn test_zero_height_track() {
        let mut fader = FaderController::new(FaderGeometry::new(0.0, 0.0), 75.0);
        assert_eq!(fader.percent(), 0.0);

        fader.pointer_down(0.0);
        let update = fader.pointer_move(40.0).unwrap();
        assert_eq!(update.percent, 0.0);
        assert!(!update.thumb_top.is_nan());

        let update = fader.wheel(-1.0, false).unwrap();
        assert_eq!(update.percent, 0.0);
        assert!(!update.gain.is_nan());
    }

    #[test]
    fn test_thumb_taller_than_track() {
        let fader = FaderController::new(FaderGeometry::new(10.0, 30.0), 50.0);
        assert_eq!(fader.geometry().travel(), 0.0);
        assert_eq!(fader.percent(), 0.0);
    }

    #[test]
    fn test_set_geometry_keeps_percent() {
        let mut fader = FaderController::new(FaderGeometry::new(200.0, 20.0), 50.0);
        fader.set_geometry(FaderGeometry::new(120.0, 20.0));
        assert_eq!(fader.percent(), 50.0);
        assert_eq!(fader.thumb_top(), 50.0);
    }
}

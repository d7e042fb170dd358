// src/ui/panel.rs
//! On-screen controls
//!
//! A small overlay with the title, gesture hints and live status. `H` hides
//! and shows the hint section; the status line stays visible.

use crate::simulation::Mode;

/// Gesture hints, one per line
pub const GESTURE_HINTS: [&str; 4] = [
    "Open hand: scatter",
    "Fist: gather into the tree",
    "Pinch: focus a photo",
    "Move hand: turn the tree",
];

/// Pointer and keyboard hints
pub const POINTER_HINTS: [&str; 3] = [
    "Click a photo to focus it, click again to release",
    "Drop image files on the window to add photos",
    "H: hide hints    Esc: quit",
];

/// What the overlay shows this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStatus {
    pub mode: Mode,
    pub photo_count: usize,
    pub hand_tracking: bool,
    pub hand_detected: bool,
    pub pending_photos: usize,
}

impl OverlayStatus {
    pub fn mode_line(&self) -> String {
        format!("Mode: {}", self.mode)
    }

    pub fn photo_line(&self) -> String {
        match self.pending_photos {
            0 => format!("Photos: {}", self.photo_count),
            pending => format!("Photos: {} ({} loading)", self.photo_count, pending),
        }
    }

    pub fn hand_line(&self) -> &'static str {
        match (self.hand_tracking, self.hand_detected) {
            (false, _) => "Hand tracking: off",
            (true, false) => "Hand tracking: no hand",
            (true, true) => "Hand tracking: hand detected",
        }
    }
}

/// Overlay with a toggleable hint section
#[derive(Debug, Clone)]
pub struct OverlayPanel {
    show_hints: bool,
}

impl Default for OverlayPanel {
    fn default() -> Self {
        Self { show_hints: true }
    }
}

impl OverlayPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hints_visible(&self) -> bool {
        self.show_hints
    }

    pub fn toggle_hints(&mut self) {
        self.show_hints = !self.show_hints;
        log::debug!("Hints {}", if self.show_hints { "shown" } else { "hidden" });
    }

    pub fn draw(&self, ui: &imgui::Ui, status: &OverlayStatus) {
        let display_size = ui.io().display_size;
        if display_size[0] <= 0.0 || display_size[1] <= 0.0 {
            return;
        }

        ui.window("Merry Christmas")
            .position([20.0, 20.0], imgui::Condition::FirstUseEver)
            .bg_alpha(0.45)
            .always_auto_resize(true)
            .resizable(false)
            .collapsible(false)
            .build(|| {
                ui.text_colored([0.93, 0.73, 0.4, 1.0], "Merry Christmas");
                ui.separator();

                if self.show_hints {
                    for hint in GESTURE_HINTS.iter().chain(POINTER_HINTS.iter()) {
                        ui.text(hint);
                    }
                    ui.separator();
                }

                ui.text(status.mode_line());
                ui.text(status.photo_line());
                ui.text(status.hand_line());
            });
    }
}

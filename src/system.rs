//! System collaborators used by the swipe controller
//!
//! Provides:
//! - Haptic feedback (sysfs LED vibrator, or a log-only fallback)
//! - System UI state flags queried at drag start

use std::cell::Cell;
use std::fs;

use bitflags::bitflags;

/// Haptic effects the shell asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HapticCue {
    /// Overview peeked in or out during a swipe
    OverviewPeek,
}

impl HapticCue {
    fn duration_ms(self) -> u32 {
        match self {
            HapticCue::OverviewPeek => 15,
        }
    }
}

/// Fire-and-forget haptic output
pub trait HapticSink {
    fn vibrate(&self, cue: HapticCue);
}

/// Vibrator exposed through the LED class (`/sys/class/leds/vibrator`)
pub struct LedVibrator {
    path: String,
}

impl LedVibrator {
    /// Find the vibrator LED path
    pub fn find() -> Option<Self> {
        let leds_dir = "/sys/class/leds";
        if let Ok(entries) = fs::read_dir(leds_dir) {
            for entry in entries.flatten() {
                let name = entry.file_name().to_string_lossy().to_string();
                if name.contains("vibrator") {
                    return Some(Self {
                        path: entry.path().to_string_lossy().to_string(),
                    });
                }
            }
        }
        None
    }
}

impl HapticSink for LedVibrator {
    fn vibrate(&self, cue: HapticCue) {
        let duration = cue.duration_ms().to_string();
        if let Err(e) = fs::write(format!("{}/duration", self.path), duration)
            .and_then(|_| fs::write(format!("{}/activate", self.path), "1"))
        {
            tracing::warn!("Failed to trigger vibrator at {}: {:?}", self.path, e);
        }
    }
}

/// Haptics for hosts without a vibrator: logs the cue
#[derive(Debug, Default)]
pub struct TracingHaptics;

impl HapticSink for TracingHaptics {
    fn vibrate(&self, cue: HapticCue) {
        tracing::debug!(?cue, "haptic");
    }
}

bitflags! {
    /// System UI state published by the system bars
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SystemUiFlags: u32 {
        const SCREEN_PINNING = 1 << 0;
        const NAV_BAR_HIDDEN = 1 << 1;
        const NOTIFICATION_PANEL_EXPANDED = 1 << 2;
        const HOME_DISABLED = 1 << 3;
        /// Overview (recents) is unavailable, e.g. during device setup
        const OVERVIEW_DISABLED = 1 << 4;
    }
}

pub trait SystemUiFlagSource {
    fn system_ui_flags(&self) -> SystemUiFlags;
}

/// Flags set directly by the embedder
#[derive(Debug, Default)]
pub struct StaticSystemUiFlags {
    flags: Cell<SystemUiFlags>,
}

impl StaticSystemUiFlags {
    pub fn new(flags: SystemUiFlags) -> Self {
        Self {
            flags: Cell::new(flags),
        }
    }

    pub fn set(&self, flags: SystemUiFlags) {
        self.flags.set(flags);
    }
}

impl SystemUiFlagSource for StaticSystemUiFlags {
    fn system_ui_flags(&self) -> SystemUiFlags {
        self.flags.get()
    }
}

use ecplink_transport::{LogicStore, LOGIC_STATE_FEEDBACK};
use serde::{Deserialize, Serialize};

/// 24-bit RGB colour as used by host button styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Packed `0xRRGGBB` form.
    pub fn packed(self) -> u32 {
        (u32::from(self.0) << 16) | (u32::from(self.1) << 8) | u32::from(self.2)
    }
}

/// Style applied by the host while a feedback is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackStyle {
    pub bgcolor: Rgb,
    pub color: Rgb,
}

/// Boolean feedback: active when a logic's last reported state matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicStateFeedback {
    pub logic_id: u16,
    #[serde(default = "default_expected")]
    pub expected: bool,
}

fn default_expected() -> bool {
    true
}

impl LogicStateFeedback {
    /// Feedback class re-evaluated on every logic report.
    pub const CLASS: &'static str = LOGIC_STATE_FEEDBACK;

    pub fn new(logic_id: u16, expected: bool) -> Self {
        Self { logic_id, expected }
    }

    /// Unknown state never matches, whichever state is expected.
    pub fn evaluate(&self, store: &LogicStore) -> bool {
        store.get(self.logic_id) == Some(self.expected)
    }

    /// Green background, black text.
    pub fn default_style() -> FeedbackStyle {
        FeedbackStyle {
            bgcolor: Rgb(0, 255, 0),
            color: Rgb(0, 0, 0),
        }
    }
}

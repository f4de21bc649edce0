//! Named harness scenarios.

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// One lap with looping off: playback must stop at the end
    SingleLap,

    /// Several laps with looping on: index and start time re-anchor
    Looping,

    /// Seeded wobbly track: heading stays continuous and smooth
    WobblyTrack,

    /// Lane width edits: rails stay exactly one width from the centerline
    LaneSweep,

    /// Follow camera: fixed distance behind and height above the agent
    FollowCam,

    /// Manual nudges while stopped in follow mode
    ManualDrive,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::SingleLap,
            ScenarioId::Looping,
            ScenarioId::WobblyTrack,
            ScenarioId::LaneSweep,
            ScenarioId::FollowCam,
            ScenarioId::ManualDrive,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::SingleLap => "single_lap",
            ScenarioId::Looping => "looping",
            ScenarioId::WobblyTrack => "wobbly_track",
            ScenarioId::LaneSweep => "lane_sweep",
            ScenarioId::FollowCam => "follow_cam",
            ScenarioId::ManualDrive => "manual_drive",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::SingleLap => "Play one lap without looping and verify playback stops",
            ScenarioId::Looping => "Loop for the full duration and verify every restart re-anchors",
            ScenarioId::WobblyTrack => "Seeded wobbly track, bounded per-tick heading change",
            ScenarioId::LaneSweep => "Sweep lane widths, verify rail offsets to 1e-4",
            ScenarioId::FollowCam => "Chase camera keeps its offset from the agent every tick",
            ScenarioId::ManualDrive => "Drive a square by hand while stopped in follow mode",
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single_lap" | "singlelap" | "lap" => Ok(ScenarioId::SingleLap),
            "looping" | "loop" => Ok(ScenarioId::Looping),
            "wobbly_track" | "wobbly" => Ok(ScenarioId::WobblyTrack),
            "lane_sweep" | "lanes" => Ok(ScenarioId::LaneSweep),
            "follow_cam" | "follow" => Ok(ScenarioId::FollowCam),
            "manual_drive" | "manual" => Ok(ScenarioId::ManualDrive),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::catalog::RegionKind;
use crate::plot::NitrogenPart;
use crate::save::SaveState;
use crate::snapshot::EngineSnapshot;
use crate::world::Phase;

/// Presentation-level events raised after a command or resolve has completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cue", rename_all = "snake_case")]
pub enum Cue {
    Planted {
        region: RegionKind,
        plot: usize,
        crop: String,
    },
    Irrigated {
        region: RegionKind,
        plot: usize,
        mm: f64,
    },
    Fertilized {
        region: RegionKind,
        plot: usize,
        part: NitrogenPart,
    },
    Harvested {
        region: RegionKind,
        plot: usize,
        gold: i64,
    },
    Runoff {
        region: RegionKind,
        plot: usize,
    },
    CropFailed {
        region: RegionKind,
        plot: usize,
        crop: String,
    },
}

/// Hooks a host can install on the engine. Every method defaults to a no-op.
pub trait EngineObserver: Send {
    fn phase_changed(&mut self, _from: Phase, _to: Phase, _snapshot: &EngineSnapshot) {}

    fn cue(&mut self, _cue: &Cue) {}

    /// Called once the week has advanced, with a save of the new state.
    fn week_committed(&mut self, _save: &SaveState) {}
}

/// Records everything it is told. Handy for hosts that poll and for tests.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    pub transitions: Vec<(Phase, Phase)>,
    pub cues: Vec<Cue>,
    pub commits: Vec<u32>,
}

impl EngineObserver for RecordingObserver {
    fn phase_changed(&mut self, from: Phase, to: Phase, _snapshot: &EngineSnapshot) {
        self.transitions.push((from, to));
    }

    fn cue(&mut self, cue: &Cue) {
        self.cues.push(cue.clone());
    }

    fn week_committed(&mut self, save: &SaveState) {
        self.commits.push(save.farm.week_index());
    }
}

/// Lets a host keep a handle on an observer it has given to the engine.
impl<T: EngineObserver> EngineObserver for Arc<Mutex<T>> {
    fn phase_changed(&mut self, from: Phase, to: Phase, snapshot: &EngineSnapshot) {
        if let Ok(mut inner) = self.lock() {
            inner.phase_changed(from, to, snapshot);
        }
    }

    fn cue(&mut self, cue: &Cue) {
        if let Ok(mut inner) = self.lock() {
            inner.cue(cue);
        }
    }

    fn week_committed(&mut self, save: &SaveState) {
        if let Ok(mut inner) = self.lock() {
            inner.week_committed(save);
        }
    }
}

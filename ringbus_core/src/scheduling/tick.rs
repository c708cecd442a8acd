use crate::communication::Outputs;
use bytemuck::Pod;

/// What one call of a component's update function produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tick {
    /// `false` ends the loop after this tick completes
    pub keep_running: bool,
    /// Messages to publish this tick, keyed by topic
    pub outputs: Outputs,
}

impl Default for Tick {
    fn default() -> Self {
        Self::proceed()
    }
}

impl Tick {
    /// Keep running, nothing to publish yet
    pub fn proceed() -> Self {
        Self {
            keep_running: true,
            outputs: Outputs::new(),
        }
    }

    /// Stop after this tick
    pub fn finish() -> Self {
        Self {
            keep_running: false,
            outputs: Outputs::new(),
        }
    }

    pub fn continue_if(keep_running: bool) -> Self {
        Self {
            keep_running,
            outputs: Outputs::new(),
        }
    }

    pub fn with_output(mut self, topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        self.outputs.insert(topic, payload);
        self
    }

    pub fn with_pod_output<T: Pod>(mut self, topic: impl Into<String>, value: &T) -> Self {
        self.outputs.insert_pod(topic, value);
        self
    }
}

impl From<bool> for Tick {
    fn from(keep_running: bool) -> Self {
        Tick::continue_if(keep_running)
    }
}

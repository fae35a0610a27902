use anyhow::Result;
use async_trait::async_trait;

use super::WindowSampler;
use vigil_storage::SamplerError;

pub struct LinuxSampler;

impl LinuxSampler {
    /// Create a new Linux sampler
    ///
    /// # Errors
    ///
    /// Currently always succeeds, but returns `Result` for future
    /// compatibility
    pub fn new() -> Result<Self> {
        log::warn!("Linux focus sampling is not implemented yet; all time lands on the no-window key");
        Ok(Self)
    }
}

#[async_trait]
impl WindowSampler for LinuxSampler {
    // TODO: query the active window via _NET_ACTIVE_WINDOW on X11;
    // Wayland has no portable equivalent.
    async fn active_window_title(&self) -> Result<Option<String>, SamplerError> {
        Ok(None)
    }
}

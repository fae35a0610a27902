use anyhow::Result;
use async_trait::async_trait;
use vigil_storage::SamplerError;

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(target_os = "windows")]
pub mod windows;

/// Source of raw focused-window titles, one per sampling tick.
#[async_trait]
pub trait WindowSampler: Send + Sync {
    /// Title of the window currently holding keyboard focus.
    ///
    /// `Ok(None)` means no window has focus (the desktop, a lock
    /// screen); the caller accounts that time to the reserved
    /// no-window key.
    ///
    /// # Errors
    ///
    /// Returns `SamplerError` when the OS query itself fails. The
    /// tracking loop treats that as "focus unchanged" for the tick.
    async fn active_window_title(&self) -> Result<Option<String>, SamplerError>;
}

/// Create the platform-specific sampler
///
/// # Errors
///
/// Returns an error if the current platform is not supported or if
/// sampler initialization fails
pub fn create_sampler() -> Result<Box<dyn WindowSampler>> {
    #[cfg(target_os = "macos")]
    {
        Ok(Box::new(macos::MacOsSampler::new()?))
    }

    #[cfg(target_os = "linux")]
    {
        Ok(Box::new(linux::LinuxSampler::new()?))
    }

    #[cfg(target_os = "windows")]
    {
        Ok(Box::new(windows::WindowsSampler::new()?))
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        anyhow::bail!("Unsupported platform")
    }
}

use anyhow::Result;
use async_trait::async_trait;

use super::WindowSampler;
use vigil_storage::SamplerError;

pub struct WindowsSampler;

impl WindowsSampler {
    /// Create a new Windows sampler
    ///
    /// # Errors
    ///
    /// Currently always succeeds, but returns `Result` for consistency
    /// with other platforms
    pub fn new() -> Result<Self> {
        Ok(Self)
    }

    fn foreground_window_title() -> Result<Option<String>, SamplerError> {
        use windows::Win32::UI::WindowsAndMessaging::{
            GetForegroundWindow, GetWindowTextLengthW, GetWindowTextW,
        };

        unsafe {
            let hwnd = GetForegroundWindow();
            if hwnd.0 == 0 {
                return Ok(None);
            }

            let length = GetWindowTextLengthW(hwnd);
            if length <= 0 {
                // A focused window with no title text (e.g. the desktop)
                return Ok(None);
            }

            let mut buffer: Vec<u16> = vec![0; (length + 1) as usize];
            let copied = GetWindowTextW(hwnd, &mut buffer);
            if copied <= 0 {
                return Err(SamplerError(String::from(
                    "GetWindowTextW returned no characters for a titled window",
                )));
            }

            buffer.truncate(copied as usize);
            let title = String::from_utf16_lossy(&buffer);
            if title.trim().is_empty() {
                Ok(None)
            } else {
                Ok(Some(title))
            }
        }
    }
}

#[async_trait]
impl WindowSampler for WindowsSampler {
    async fn active_window_title(&self) -> Result<Option<String>, SamplerError> {
        Self::foreground_window_title()
    }
}

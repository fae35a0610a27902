use anyhow::Result;
use async_trait::async_trait;
use cocoa::base::{id, nil};
use cocoa::foundation::NSAutoreleasePool;
use objc::{class, msg_send, sel, sel_impl};
use tokio::process::Command;

use super::WindowSampler;
use vigil_storage::SamplerError;

pub struct MacOsSampler;

impl MacOsSampler {
    /// Create a new macOS sampler
    ///
    /// # Errors
    ///
    /// Currently always succeeds, but returns `Result` for consistency
    /// with other platforms
    pub fn new() -> Result<Self> {
        Ok(Self)
    }

    /// Fallback when AppleScript is unavailable: the frontmost app's
    /// localized name. No window title is reachable from here, so the
    /// classifier will file it under the default context.
    fn frontmost_app_name() -> Option<String> {
        unsafe {
            let _pool = NSAutoreleasePool::new(nil);

            let workspace: id = msg_send![class!(NSWorkspace), sharedWorkspace];
            let frontmost_app: id = msg_send![workspace, frontmostApplication];
            if frontmost_app == nil {
                return None;
            }

            let app_name: id = msg_send![frontmost_app, localizedName];
            if app_name.is_null() {
                return None;
            }
            let bytes: *const u8 = msg_send![app_name, UTF8String];
            let len: usize = msg_send![app_name, length];
            let slice = std::slice::from_raw_parts(bytes, len);
            Some(String::from_utf8_lossy(slice).to_string())
        }
    }
}

#[async_trait]
impl WindowSampler for MacOsSampler {
    async fn active_window_title(&self) -> Result<Option<String>, SamplerError> {
        // AppleScript yields the real window title; System Events needs
        // the accessibility permission the first time it runs.
        let script = r#"
            tell application "System Events"
                set frontProc to first application process whose frontmost is true
                try
                    set winTitle to name of first window of frontProc
                on error
                    set winTitle to ""
                end try
                return winTitle
            end tell
        "#;

        let output = Command::new("osascript")
            .arg("-e")
            .arg(script)
            .output()
            .await
            .map_err(|e| SamplerError(format!("osascript failed to run: {e}")))?;

        if output.status.success() {
            let title = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !title.is_empty() {
                return Ok(Some(title));
            }
        }

        Ok(Self::frontmost_app_name())
    }
}

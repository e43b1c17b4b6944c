//! Runtime browser identities used across scenarios.

use scoped_config::RuntimeBrowser;

/// Google Chrome, part of the Chromium family.
#[must_use]
pub fn chrome() -> RuntimeBrowser {
    RuntimeBrowser::new("chrome", "chromium")
}

/// Plain Chromium.
#[must_use]
pub fn chromium() -> RuntimeBrowser {
    RuntimeBrowser::new("chromium", "chromium")
}

/// Mozilla Firefox.
#[must_use]
pub fn firefox() -> RuntimeBrowser {
    RuntimeBrowser::new("firefox", "firefox")
}

/// Electron, which reports the Chromium family.
#[must_use]
pub fn electron() -> RuntimeBrowser {
    RuntimeBrowser::new("electron", "chromium")
}

/// Look up a browser by name.
///
/// # Errors
///
/// Returns an error for names outside the known set.
pub fn by_name(name: &str) -> anyhow::Result<RuntimeBrowser> {
    match name {
        "chrome" => Ok(chrome()),
        "chromium" => Ok(chromium()),
        "firefox" => Ok(firefox()),
        "electron" => Ok(electron()),
        other => Err(anyhow::anyhow!("unknown browser '{other}'")),
    }
}

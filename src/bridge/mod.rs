//! The boundary to the holographic display bridge.
//!
//! Everything the renderer knows about the display goes through [`DisplayBridge`]. Handles
//! crossing the boundary are opaque tokens; nothing on this side ever looks inside them.

use std::{error::Error, fmt};

pub use session::*;
pub use simulated::*;

mod session;
mod simulated;

/// A graphics device as identified to the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeDevice(u64);

impl NativeDevice {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

/// A window the bridge opened on the holographic display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BridgeWindow(u64);

impl BridgeWindow {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for BridgeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window#{}", self.0)
    }
}

/// A texture shared with the bridge for interop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeTexture(u64);

impl NativeTexture {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for NativeTexture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "texture#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DisplayInfo {
    pub name: String,
    pub serial: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    InitializationFailed(String),
    /// No compatible display is attached.
    NoDisplay,
    NotInitialized,
    UnknownWindow(BridgeWindow),
    TextureNotRegistered(NativeTexture),
    /// The requested quilt has more views than can be addressed.
    UnsupportedGrid { columns: u32, rows: u32 },
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeError::InitializationFailed(reason) => {
                write!(f, "bridge initialization failed: {}", reason)
            }
            BridgeError::NoDisplay => write!(f, "no compatible display attached"),
            BridgeError::NotInitialized => write!(f, "bridge is not initialized"),
            BridgeError::UnknownWindow(window) => write!(f, "unknown bridge window {}", window),
            BridgeError::TextureNotRegistered(texture) => {
                write!(f, "{} is not registered with the bridge", texture)
            }
            BridgeError::UnsupportedGrid { columns, rows } => {
                write!(f, "a {}x{} quilt has too many views", columns, rows)
            }
        }
    }
}

impl Error for BridgeError {}

/// Synchronous interface to the display bridge library.
///
/// `initialize` must be called before anything else and is process-wide; `uninitialize`
/// tears everything down.
pub trait DisplayBridge {
    fn initialize(&mut self, application_name: &str) -> Result<(), BridgeError>;

    fn create_window(&mut self, device: NativeDevice) -> Result<BridgeWindow, BridgeError>;

    fn display_info(&self, window: BridgeWindow) -> Result<DisplayInfo, BridgeError>;

    fn window_dimensions(&self, window: BridgeWindow) -> Result<(u32, u32), BridgeError>;

    fn max_texture_dimension(&self, window: BridgeWindow) -> Result<u32, BridgeError>;

    fn register_texture(
        &mut self,
        window: BridgeWindow,
        texture: NativeTexture,
    ) -> Result<(), BridgeError>;

    /// Must be called before the texture is destroyed.
    fn unregister_texture(
        &mut self,
        window: BridgeWindow,
        texture: NativeTexture,
    ) -> Result<(), BridgeError>;

    fn present_quilt(
        &mut self,
        window: BridgeWindow,
        texture: NativeTexture,
        columns: u32,
        rows: u32,
        aspect_multiplier: f32,
        zoom_multiplier: f32,
    ) -> Result<(), BridgeError>;

    fn uninitialize(&mut self);
}

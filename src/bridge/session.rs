use super::{BridgeError, BridgeWindow, DisplayBridge, DisplayInfo, NativeDevice, NativeTexture};
use crate::quilt::{compute_layout, DisplayCapability, QuiltLayout, QuiltRequest};
use log::{info, warn};

/// Tuning values handed to the bridge along with every quilt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresentSettings {
    pub aspect_multiplier: f32,
    pub zoom_multiplier: f32,
}

/// An initialized bridge with a window on an attached display and the quilt layout planned
/// for it.
pub struct HologramSession {
    bridge: Box<dyn DisplayBridge>,
    window: BridgeWindow,
    display: DisplayInfo,
    capability: DisplayCapability,
    layout: QuiltLayout,
    registered: Option<NativeTexture>,
    settings: PresentSettings,
}

impl HologramSession {
    /// Initializes the bridge and plans the quilt layout.
    ///
    /// Returns `Ok(None)` when no usable display is attached; the caller should render a
    /// single view only. A bridge that fails to initialize is an error.
    pub fn open(
        mut bridge: Box<dyn DisplayBridge>,
        application_name: &str,
        device: NativeDevice,
        request: QuiltRequest,
        settings: PresentSettings,
    ) -> Result<Option<Self>, BridgeError> {
        bridge.initialize(application_name)?;

        match Self::attach(&mut *bridge, device, &request) {
            Ok((window, display, capability, layout)) => {
                info!(
                    "bridge display {} ({}): {}x{}, max texture {}",
                    display.name,
                    display.serial,
                    capability.window_width,
                    capability.window_height,
                    capability.max_texture_dimension
                );
                match layout.scaled_by {
                    Some(axis) => info!(
                        "quilt {}x{} views of {}x{} in {}x{} (scaled by {} along {:?})",
                        layout.columns,
                        layout.rows,
                        layout.view_width,
                        layout.view_height,
                        layout.texture_width,
                        layout.texture_height,
                        layout.scale_factor,
                        axis
                    ),
                    None => info!(
                        "quilt {}x{} views of {}x{} in {}x{}",
                        layout.columns,
                        layout.rows,
                        layout.view_width,
                        layout.view_height,
                        layout.texture_width,
                        layout.texture_height
                    ),
                }

                Ok(Some(Self {
                    bridge,
                    window,
                    display,
                    capability,
                    layout,
                    registered: None,
                    settings,
                }))
            }
            Err(error) => {
                warn!("holographic display unavailable, rendering single view: {}", error);
                bridge.uninitialize();
                Ok(None)
            }
        }
    }

    fn attach(
        bridge: &mut dyn DisplayBridge,
        device: NativeDevice,
        request: &QuiltRequest,
    ) -> Result<(BridgeWindow, DisplayInfo, DisplayCapability, QuiltLayout), BridgeError> {
        if request.total_views().is_none() {
            return Err(BridgeError::UnsupportedGrid {
                columns: request.columns,
                rows: request.rows,
            });
        }
        let window = bridge.create_window(device)?;
        let display = bridge.display_info(window)?;
        let (window_width, window_height) = bridge.window_dimensions(window)?;
        let capability = DisplayCapability {
            max_texture_dimension: bridge.max_texture_dimension(window)?,
            window_width,
            window_height,
        };

        let layout = compute_layout(&capability, request);
        if layout.is_empty() {
            return Err(BridgeError::NoDisplay);
        }

        Ok((window, display, capability, layout))
    }

    pub fn display(&self) -> &DisplayInfo {
        &self.display
    }

    pub fn capability(&self) -> &DisplayCapability {
        &self.capability
    }

    pub fn layout(&self) -> &QuiltLayout {
        &self.layout
    }

    #[cfg(test)]
    pub fn registered_texture(&self) -> Option<NativeTexture> {
        self.registered
    }

    /// Binds `texture` as the quilt target, replacing any previously registered one.
    pub fn register_texture(&mut self, texture: NativeTexture) -> Result<(), BridgeError> {
        if self.registered == Some(texture) {
            return Ok(());
        }
        self.unregister_texture()?;
        self.bridge.register_texture(self.window, texture)?;
        self.registered = Some(texture);
        Ok(())
    }

    /// Must be called before the registered texture is dropped.
    pub fn unregister_texture(&mut self) -> Result<(), BridgeError> {
        if let Some(texture) = self.registered.take() {
            self.bridge.unregister_texture(self.window, texture)?;
        }
        Ok(())
    }

    /// Hands a finished quilt to the display. The GPU must be done writing `texture`.
    pub fn present(&mut self, texture: NativeTexture) -> Result<(), BridgeError> {
        if self.registered != Some(texture) {
            return Err(BridgeError::TextureNotRegistered(texture));
        }
        self.bridge.present_quilt(
            self.window,
            texture,
            self.layout.columns,
            self.layout.rows,
            self.settings.aspect_multiplier,
            self.settings.zoom_multiplier,
        )
    }

    pub fn close(mut self) {
        if let Err(error) = self.unregister_texture() {
            warn!("failed to unregister quilt texture: {}", error);
        }
        self.bridge.uninitialize();
        info!("bridge uninitialized");
    }
}

use super::{BridgeError, BridgeWindow, DisplayBridge, DisplayInfo, NativeDevice, NativeTexture};
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};

/// A display that only exists in software.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedDisplay {
    pub width: u32,
    pub height: u32,
    pub max_texture_dimension: u32,
    pub name: String,
    pub serial: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Presentation {
    pub window: BridgeWindow,
    pub texture: NativeTexture,
    pub columns: u32,
    pub rows: u32,
    pub aspect_multiplier: f32,
    pub zoom_multiplier: f32,
}

/// Stand-in for the vendor bridge when no SDK is linked. It validates call order and handle
/// usage the way the real library expects, and remembers what was presented.
#[derive(Debug)]
pub struct SimulatedBridge {
    display: Option<SimulatedDisplay>,
    application_name: Option<String>,
    next_window: u64,
    windows: HashMap<BridgeWindow, HashSet<NativeTexture>>,
    presented_frames: u64,
    last_presentation: Option<Presentation>,
}

impl SimulatedBridge {
    pub fn connected(display: SimulatedDisplay) -> Self {
        Self::new(Some(display))
    }

    pub fn disconnected() -> Self {
        Self::new(None)
    }

    fn new(display: Option<SimulatedDisplay>) -> Self {
        Self {
            display,
            application_name: None,
            next_window: 1,
            windows: HashMap::new(),
            presented_frames: 0,
            last_presentation: None,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.application_name.is_some()
    }

    pub fn presented_frames(&self) -> u64 {
        self.presented_frames
    }

    pub fn last_presentation(&self) -> Option<&Presentation> {
        self.last_presentation.as_ref()
    }

    pub fn registered_textures(&self, window: BridgeWindow) -> usize {
        self.windows.get(&window).map_or(0, HashSet::len)
    }

    fn check_initialized(&self) -> Result<(), BridgeError> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(BridgeError::NotInitialized)
        }
    }

    fn display_for(&self, window: BridgeWindow) -> Result<&SimulatedDisplay, BridgeError> {
        self.check_initialized()?;
        if !self.windows.contains_key(&window) {
            return Err(BridgeError::UnknownWindow(window));
        }
        self.display.as_ref().ok_or(BridgeError::NoDisplay)
    }

    fn textures_mut(
        &mut self,
        window: BridgeWindow,
    ) -> Result<&mut HashSet<NativeTexture>, BridgeError> {
        self.check_initialized()?;
        self.windows
            .get_mut(&window)
            .ok_or(BridgeError::UnknownWindow(window))
    }
}

impl DisplayBridge for SimulatedBridge {
    fn initialize(&mut self, application_name: &str) -> Result<(), BridgeError> {
        if application_name.is_empty() {
            return Err(BridgeError::InitializationFailed(
                "application name is empty".to_string(),
            ));
        }
        self.application_name = Some(application_name.to_string());
        Ok(())
    }

    fn create_window(&mut self, device: NativeDevice) -> Result<BridgeWindow, BridgeError> {
        self.check_initialized()?;
        if self.display.is_none() {
            return Err(BridgeError::NoDisplay);
        }

        let window = BridgeWindow::from_raw(self.next_window);
        self.next_window += 1;
        self.windows.insert(window, HashSet::new());
        debug!("simulated bridge opened {} for {:?}", window, device);
        Ok(window)
    }

    fn display_info(&self, window: BridgeWindow) -> Result<DisplayInfo, BridgeError> {
        let display = self.display_for(window)?;
        Ok(DisplayInfo {
            name: display.name.clone(),
            serial: display.serial.clone(),
        })
    }

    fn window_dimensions(&self, window: BridgeWindow) -> Result<(u32, u32), BridgeError> {
        let display = self.display_for(window)?;
        Ok((display.width, display.height))
    }

    fn max_texture_dimension(&self, window: BridgeWindow) -> Result<u32, BridgeError> {
        Ok(self.display_for(window)?.max_texture_dimension)
    }

    fn register_texture(
        &mut self,
        window: BridgeWindow,
        texture: NativeTexture,
    ) -> Result<(), BridgeError> {
        self.textures_mut(window)?.insert(texture);
        Ok(())
    }

    fn unregister_texture(
        &mut self,
        window: BridgeWindow,
        texture: NativeTexture,
    ) -> Result<(), BridgeError> {
        if self.textures_mut(window)?.remove(&texture) {
            Ok(())
        } else {
            Err(BridgeError::TextureNotRegistered(texture))
        }
    }

    fn present_quilt(
        &mut self,
        window: BridgeWindow,
        texture: NativeTexture,
        columns: u32,
        rows: u32,
        aspect_multiplier: f32,
        zoom_multiplier: f32,
    ) -> Result<(), BridgeError> {
        if !self.textures_mut(window)?.contains(&texture) {
            return Err(BridgeError::TextureNotRegistered(texture));
        }

        self.presented_frames += 1;
        self.last_presentation = Some(Presentation {
            window,
            texture,
            columns,
            rows,
            aspect_multiplier,
            zoom_multiplier,
        });
        Ok(())
    }

    fn uninitialize(&mut self) {
        for &window in self.windows.keys() {
            let leaked = self.registered_textures(window);
            if leaked > 0 {
                warn!("{} still has {} registered texture(s) at shutdown", window, leaked);
            }
        }
        if let Some(presentation) = self.last_presentation() {
            info!(
                "simulated display presented {} quilts, last {}x{} from {}",
                self.presented_frames(),
                presentation.columns,
                presentation.rows,
                presentation.texture
            );
        }
        self.windows.clear();
        self.application_name = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn portrait() -> SimulatedDisplay {
        SimulatedDisplay {
            width: 1536,
            height: 2048,
            max_texture_dimension: 16384,
            name: "Portrait".to_string(),
            serial: "LKG-P-0001".to_string(),
        }
    }

    #[test]
    fn calls_before_initialize_fail() {
        let mut bridge = SimulatedBridge::connected(portrait());
        assert_eq!(
            bridge.create_window(NativeDevice::from_raw(1)),
            Err(BridgeError::NotInitialized)
        );
    }

    #[test]
    fn reports_display_capabilities() {
        let mut bridge = SimulatedBridge::connected(portrait());
        bridge.initialize("test").unwrap();
        let window = bridge.create_window(NativeDevice::from_raw(1)).unwrap();

        assert_eq!(bridge.window_dimensions(window), Ok((1536, 2048)));
        assert_eq!(bridge.max_texture_dimension(window), Ok(16384));
        assert_eq!(bridge.display_info(window).unwrap().serial, "LKG-P-0001");
    }

    #[test]
    fn disconnected_has_no_display() {
        let mut bridge = SimulatedBridge::disconnected();
        bridge.initialize("test").unwrap();
        assert_eq!(
            bridge.create_window(NativeDevice::from_raw(1)),
            Err(BridgeError::NoDisplay)
        );
    }

    #[test]
    fn presenting_requires_registration() {
        let mut bridge = SimulatedBridge::connected(portrait());
        bridge.initialize("test").unwrap();
        let window = bridge.create_window(NativeDevice::from_raw(1)).unwrap();
        let texture = NativeTexture::from_raw(7);

        assert_eq!(
            bridge.present_quilt(window, texture, 5, 9, 1.0, 1.0),
            Err(BridgeError::TextureNotRegistered(texture))
        );

        bridge.register_texture(window, texture).unwrap();
        bridge.present_quilt(window, texture, 5, 9, 0.75, 1.0).unwrap();
        assert_eq!(bridge.presented_frames(), 1);
        let presentation = bridge.last_presentation().unwrap();
        assert_eq!((presentation.columns, presentation.rows), (5, 9));
        assert_eq!(presentation.aspect_multiplier, 0.75);

        bridge.unregister_texture(window, texture).unwrap();
        assert_eq!(bridge.registered_textures(window), 0);
        assert_eq!(
            bridge.unregister_texture(window, texture),
            Err(BridgeError::TextureNotRegistered(texture))
        );
    }

    #[test]
    fn uninitialize_forgets_windows() {
        let mut bridge = SimulatedBridge::connected(portrait());
        bridge.initialize("test").unwrap();
        let window = bridge.create_window(NativeDevice::from_raw(1)).unwrap();
        bridge.uninitialize();

        assert!(!bridge.is_initialized());
        assert_eq!(
            bridge.window_dimensions(window),
            Err(BridgeError::NotInitialized)
        );
    }
}

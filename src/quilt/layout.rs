/// Some drivers report limits they cannot actually allocate, so the reported maximum is
/// never trusted beyond this.
pub const MAX_TEXTURE_DIMENSION_CEILING: u32 = 16384;

/// What the display bridge reports about the attached display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayCapability {
    pub max_texture_dimension: u32,
    pub window_width: u32,
    pub window_height: u32,
}

/// The desired view grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuiltRequest {
    pub columns: u32,
    pub rows: u32,
}

impl QuiltRequest {
    /// `None` when the grid has more views than fit in a `u32`.
    pub fn total_views(&self) -> Option<u32> {
        self.columns.checked_mul(self.rows)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Width,
    Height,
}

/// Tiling geometry of a quilt texture. Computed once by [`compute_layout`] and passed around
/// by reference afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuiltLayout {
    pub columns: u32,
    pub rows: u32,
    pub view_width: u32,
    pub view_height: u32,
    pub texture_width: u32,
    pub texture_height: u32,
    pub scale_factor: f32,
    /// The axis the scale factor was derived from, if downscaling happened.
    pub scaled_by: Option<Axis>,
}

impl QuiltLayout {
    pub fn total_views(&self) -> u32 {
        self.columns.saturating_mul(self.rows)
    }

    /// A layout with no pixels means there is nothing to render into; the caller should
    /// treat the bridge as unavailable.
    pub fn is_empty(&self) -> bool {
        self.view_width == 0
            || self.view_height == 0
            || self.texture_width == 0
            || self.texture_height == 0
            || self.total_views() == 0
    }

    pub fn texture_size(&self) -> (u32, u32) {
        (self.texture_width, self.texture_height)
    }

    /// Aspect ratio of a full view. Tiles clipped at the texture edge still use this.
    pub fn view_aspect(&self) -> f32 {
        self.view_width as f32 / self.view_height as f32
    }
}

/// Fits `request` views of the display's natural resolution into one texture.
///
/// When the naive texture exceeds the (clamped) maximum dimension on either axis, everything
/// is scaled by `max / naive[dominant]`, where the dominant axis is simply the larger of the
/// two naive texture dimensions (height wins ties). Each dimension is then truncated
/// independently from its own unscaled value, so the texture is not necessarily an exact
/// multiple of the view size.
pub fn compute_layout(capability: &DisplayCapability, request: &QuiltRequest) -> QuiltLayout {
    let max_dimension = capability
        .max_texture_dimension
        .min(MAX_TEXTURE_DIMENSION_CEILING);

    let view_width = capability.window_width;
    let view_height = capability.window_height;

    let texture_width = u64::from(view_width) * u64::from(request.columns);
    let texture_height = u64::from(view_height) * u64::from(request.rows);
    let max = u64::from(max_dimension);

    if texture_width <= max && texture_height <= max {
        return QuiltLayout {
            columns: request.columns,
            rows: request.rows,
            view_width,
            view_height,
            texture_width: texture_width as u32,
            texture_height: texture_height as u32,
            scale_factor: 1.0,
            scaled_by: None,
        };
    }

    let (axis, dominant) = if texture_width > texture_height {
        (Axis::Width, texture_width)
    } else {
        (Axis::Height, texture_height)
    };
    let scale_factor = max_dimension as f32 / dominant as f32;
    let scale = |dimension: u64| (dimension as f32 * scale_factor) as u32;

    QuiltLayout {
        columns: request.columns,
        rows: request.rows,
        view_width: scale(u64::from(view_width)),
        view_height: scale(u64::from(view_height)),
        texture_width: scale(texture_width),
        texture_height: scale(texture_height),
        scale_factor,
        scaled_by: Some(axis),
    }
}

use image::{ImageBuffer, Rgba, RgbaImage};

use crate::foundation::error::{BackdropError, BackdropResult};
use crate::foundation::math::rgba_len;

/// Straight (non-premultiplied) RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_array(px: [u8; 4]) -> Self {
        Self::rgba(px[0], px[1], px[2], px[3])
    }

    pub fn opaque(self) -> Self {
        Self { a: 255, ..self }
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA` (leading `#` optional, case-insensitive).
    pub fn from_hex(s: &str) -> BackdropResult<Self> {
        let s = s.trim();
        let s = s.strip_prefix('#').unwrap_or(s);

        fn hex_byte(pair: &str) -> BackdropResult<u8> {
            u8::from_str_radix(pair, 16)
                .map_err(|_| BackdropError::invalid_config(format!("invalid hex byte \"{pair}\"")))
        }

        if !s.is_ascii() {
            return Err(BackdropError::invalid_config(
                "hex color must be ascii #RRGGBB or #RRGGBBAA",
            ));
        }
        match s.len() {
            6 => Ok(Self::rgb(
                hex_byte(&s[0..2])?,
                hex_byte(&s[2..4])?,
                hex_byte(&s[4..6])?,
            )),
            8 => Ok(Self::rgba(
                hex_byte(&s[0..2])?,
                hex_byte(&s[2..4])?,
                hex_byte(&s[4..6])?,
                hex_byte(&s[6..8])?,
            )),
            _ => Err(BackdropError::invalid_config(
                "hex color must be #RRGGBB or #RRGGBBAA (case-insensitive)",
            )),
        }
    }

    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// Integer placement rectangle. The origin may sit outside the destination.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    /// Center `inner` inside `outer`, flooring odd remainders toward the top-left.
    pub fn centered(outer: Size, inner: Size) -> Self {
        let x = (i64::from(outer.width) - i64::from(inner.width)).div_euclid(2);
        let y = (i64::from(outer.height) - i64::from(inner.height)).div_euclid(2);
        Self {
            origin: Point::new(x, y),
            size: inner,
        }
    }

    /// Intersection with `[0, bounds)`, as `(x0, y0, x1, y1)`; `None` when disjoint.
    pub fn clip_to(self, bounds: Size) -> Option<(u32, u32, u32, u32)> {
        let x0 = self.origin.x.max(0);
        let y0 = self.origin.y.max(0);
        let x1 = (self.origin.x + i64::from(self.size.width))
            .min(i64::from(bounds.width));
        let y1 = (self.origin.y + i64::from(self.size.height))
            .min(i64::from(bounds.height));
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }
}

/// Owned RGBA8 raster: straight alpha, row-major, top-left origin.
///
/// `data.len() == width * height * 4` always holds; the fields are private so the
/// constructors can enforce it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Bitmap {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> BackdropResult<Self> {
        if width == 0 || height == 0 {
            return Err(BackdropError::invalid_bitmap(format!(
                "bitmap must have non-zero area (got {width}x{height})"
            )));
        }
        let expected = rgba_len(width, height)
            .ok_or_else(|| BackdropError::invalid_bitmap("bitmap buffer size overflow"))?;
        if data.len() != expected {
            return Err(BackdropError::invalid_bitmap(format!(
                "bitmap buffer is {} bytes, expected {expected} for {width}x{height} rgba8",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn filled(width: u32, height: u32, color: Color) -> BackdropResult<Self> {
        let px = (width as usize).saturating_mul(height as usize);
        Self::new(width, height, color.to_array().repeat(px))
    }

    pub fn from_rgba_image(img: RgbaImage) -> BackdropResult<Self> {
        let (width, height) = img.dimensions();
        Self::new(width, height, img.into_raw())
    }

    /// Borrow the pixels as an `image` view without copying.
    pub fn as_image_view(&self) -> BackdropResult<ImageBuffer<Rgba<u8>, &[u8]>> {
        ImageBuffer::from_raw(self.width, self.height, self.data.as_slice())
            .ok_or_else(|| BackdropError::invalid_bitmap("bitmap buffer does not match dimensions"))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = self.index(x, y);
        Some(Color::from_array([
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]))
    }

    pub fn put_pixel(&mut self, x: u32, y: u32, color: Color) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = self.index(x, y);
        self.data[idx..idx + 4].copy_from_slice(&color.to_array());
    }

    /// Copy rotated by 180 degrees (pixel order reversed).
    pub fn rotated_180(&self) -> Self {
        let mut data = Vec::with_capacity(self.data.len());
        for px in self.data.chunks_exact(4).rev() {
            data.extend_from_slice(px);
        }
        Self {
            width: self.width,
            height: self.height,
            data,
        }
    }

    pub fn is_opaque(&self) -> bool {
        self.data.chunks_exact(4).all(|px| px[3] == 255)
    }

    fn index(&self, x: u32, y: u32) -> usize {
        ((y as usize) * (self.width as usize) + (x as usize)) * 4
    }
}

//! Scene materials
//!
//! The scene uses a small fixed palette, so materials are plain values that
//! resolve to per-instance shading parameters instead of GPU-side material
//! objects. Photo quads carry the texture they sample.

/// Index of an uploaded photo texture in [`Scene`](crate::gfx::scene::Scene)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub usize);

/// Surface appearance of a drawable
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Material {
    /// Deep green matte ornament boxes
    Green,
    /// Metallic champagne gold, also used by photo frames
    Gold,
    /// Glossy accent red
    Red,
    /// Red and white striped candy canes
    CandyStripe,
    /// Pale glowing dust motes
    Dust,
    /// The emissive star topping the tree
    Star,
    /// Textured photo quad
    Photo(TextureId),
}

/// Per-instance shading parameters consumed by the solid pipeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shading {
    /// Linear RGBA base color
    pub base_color: [f32; 4],
    /// Linear RGB emissive color, `w` is 1.0 for procedural stripes
    pub emissive: [f32; 4],
}

const fn hex(rgb: u32) -> [f32; 3] {
    [
        ((rgb >> 16) & 0xff) as f32 / 255.0,
        ((rgb >> 8) & 0xff) as f32 / 255.0,
        (rgb & 0xff) as f32 / 255.0,
    ]
}

pub const CHAMPAGNE_GOLD: [f32; 3] = hex(0xffd966);
pub const DEEP_GREEN: [f32; 3] = hex(0x03180a);
pub const ACCENT_RED: [f32; 3] = hex(0x990000);

impl Material {
    pub fn shading(&self) -> Shading {
        let (base, emissive, intensity, stripes) = match self {
            Material::Green => (DEEP_GREEN, hex(0x002200), 0.2, false),
            Material::Gold => (CHAMPAGNE_GOLD, hex(0x443300), 0.3, false),
            Material::Red => (ACCENT_RED, hex(0x330000), 1.0, false),
            Material::CandyStripe => ([1.0, 1.0, 1.0], hex(0x880000), 0.0, true),
            Material::Dust => (hex(0xffeebb), hex(0xffeebb), 0.8, false),
            Material::Star => (hex(0xffdd88), hex(0xffaa00), 1.0, false),
            Material::Photo(_) => ([1.0, 1.0, 1.0], [0.0, 0.0, 0.0], 0.0, false),
        };

        Shading {
            base_color: [base[0], base[1], base[2], 1.0],
            emissive: [
                emissive[0] * intensity,
                emissive[1] * intensity,
                emissive[2] * intensity,
                if stripes { 1.0 } else { 0.0 },
            ],
        }
    }

    pub fn texture(&self) -> Option<TextureId> {
        match self {
            Material::Photo(texture) => Some(*texture),
            _ => None,
        }
    }
}

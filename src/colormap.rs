//! Sequential colormaps for heatmap rendering.
//!
//! Each map is a 256-entry lookup table built lazily from a handful of anchor
//! colours with linear interpolation between them.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

const LUT_SIZE: usize = 256;

type Lut = [[u8; 3]; LUT_SIZE];

// Anchors sampled from the matplotlib maps of the same name.
const VIRIDIS: &[[u8; 3]] = &[
    [68, 1, 84],
    [72, 40, 120],
    [62, 74, 137],
    [49, 104, 142],
    [38, 130, 142],
    [31, 158, 137],
    [53, 183, 121],
    [109, 205, 89],
    [180, 222, 44],
    [253, 231, 37],
];

const MAGMA: &[[u8; 3]] = &[
    [0, 0, 4],
    [28, 16, 68],
    [79, 18, 123],
    [129, 37, 129],
    [181, 54, 122],
    [229, 80, 100],
    [251, 135, 97],
    [254, 194, 135],
    [252, 253, 191],
];

const BALANCE: &[[u8; 3]] = &[
    [24, 28, 67],
    [37, 84, 171],
    [117, 146, 200],
    [241, 236, 235],
    [214, 129, 106],
    [165, 40, 40],
    [60, 9, 18],
];

const GRAYSCALE: &[[u8; 3]] = &[[0, 0, 0], [255, 255, 255]];

static VIRIDIS_LUT: Lazy<Lut> = Lazy::new(|| build_lut(VIRIDIS));
static MAGMA_LUT: Lazy<Lut> = Lazy::new(|| build_lut(MAGMA));
static BALANCE_LUT: Lazy<Lut> = Lazy::new(|| build_lut(BALANCE));
static GRAYSCALE_LUT: Lazy<Lut> = Lazy::new(|| build_lut(GRAYSCALE));

fn build_lut(anchors: &[[u8; 3]]) -> Lut {
    let mut lut = [[0u8; 3]; LUT_SIZE];
    let segments = (anchors.len() - 1) as f64;
    for (i, entry) in lut.iter_mut().enumerate() {
        let t = i as f64 / (LUT_SIZE - 1) as f64 * segments;
        let k = (t.floor() as usize).min(anchors.len() - 2);
        let w = t - k as f64;
        for c in 0..3 {
            let a = anchors[k][c] as f64;
            let b = anchors[k + 1][c] as f64;
            entry[c] = (a + (b - a) * w).round() as u8;
        }
    }
    lut
}

/// Colour scale used to map field values to pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Colormap {
    #[default]
    Viridis,
    Magma,
    /// Diverging blue-white-red.
    Balance,
    Grayscale,
}

impl Colormap {
    pub fn all() -> &'static [Colormap] {
        &[
            Colormap::Viridis,
            Colormap::Magma,
            Colormap::Balance,
            Colormap::Grayscale,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Colormap::Viridis => "Viridis",
            Colormap::Magma => "Magma",
            Colormap::Balance => "Balance",
            Colormap::Grayscale => "Grayscale",
        }
    }

    fn lut(&self) -> &'static Lut {
        match self {
            Colormap::Viridis => &VIRIDIS_LUT,
            Colormap::Magma => &MAGMA_LUT,
            Colormap::Balance => &BALANCE_LUT,
            Colormap::Grayscale => &GRAYSCALE_LUT,
        }
    }

    /// Colour for a normalized value `t`; values outside `0..=1` saturate.
    pub fn sample(&self, t: f64) -> [u8; 3] {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let idx = (t * (LUT_SIZE - 1) as f64).round() as usize;
        self.lut()[idx]
    }
}

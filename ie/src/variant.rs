//! Variant classification (Normal / Golden / Rainbow / Shiny).
//!
//! A fixed decision sequence over the refined card crop:
//!
//! 1. golden check over the whole card (short-circuits, with its own shiny check)
//! 2. bottom edge of the exclusive tag
//! 3. top edge of the gray description text below it
//! 4. the band between the two, cut above any shiny label
//! 5. distinct-color count of the colorful pixels in that band
//! 6. verdict plus the band as an audit crop
//!
//! Every step is a standalone function; a missing anchor ends the sequence
//! with a NORMAL verdict.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::error::{DetectError, Result};
use crate::{Color, ColorSpace, ColorTarget, Image, Mask, OwnedImage};

pub const GOLDEN_PALETTE: [ColorTarget; 3] = [
    ColorTarget::new(Color::hex(0xfeed4f), 2),
    ColorTarget::new(Color::hex(0xffdf33), 2),
    ColorTarget::new(Color::hex(0xfee844), 2),
];

pub const SHINY_PALETTE: [ColorTarget; 3] = [
    ColorTarget::new(Color::hex(0xf9d5f0), 2),
    ColorTarget::new(Color::hex(0xffd9d6), 2),
    ColorTarget::new(Color::hex(0xffdacf), 2),
];

/// Light purple/pink of the exclusive tag. Distinct from the frame palette
/// in [`crate::card::BORDER_PALETTE`] and the dark tag fill used for names.
pub const EXCLUSIVE_TAG_PALETTE: [ColorTarget; 4] = [
    ColorTarget::new(Color::hex(0xa973ff), 15),
    ColorTarget::new(Color::hex(0xa876ff), 15),
    ColorTarget::new(Color::hex(0xa275f6), 15),
    ColorTarget::new(Color::hex(0xa378f9), 15),
];

pub const GRAY_TEXT_PALETTE: [ColorTarget; 3] = [
    ColorTarget::exact(Color::hex(0x878788)),
    ColorTarget::exact(Color::hex(0xeeebf4)),
    ColorTarget::exact(Color::hex(0xa4a3a6)),
];

const SHINY_MIN_PIXELS: usize = 4;

/// Only the top of the card is searched; charms lower down share the tag's colors.
const EXCLUSIVE_SEARCH_FRACTION: f64 = 0.35;
const GRAY_FALLBACK_OFFSET: u32 = 40;
const MIN_TRUNCATED_HEIGHT: u32 = 5;

const ENTROPY_MIN_HEIGHT: u32 = 10;
const ENTROPY_CORE_START: f64 = 0.15;
const ENTROPY_CORE_END: f64 = 0.85;
const COLORFUL_MIN_SATURATION: u8 = 50;
const COLORFUL_MIN_VALUE: u8 = 50;
const MIN_COLORFUL_PIXELS: usize = 50;
/// Rainbow gradients show hundreds of shades; single-hue text a few dozen at most.
const RAINBOW_MIN_DISTINCT: usize = 80;

/// Independent variant flags. Golden and rainbow are never both set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct VariantVerdict {
    pub golden: bool,
    pub rainbow: bool,
    pub shiny: bool,
}

impl VariantVerdict {
    pub const NORMAL: Self = Self {
        golden: false,
        rainbow: false,
        shiny: false,
    };

    pub fn is_normal(&self) -> bool {
        *self == Self::NORMAL
    }
}

impl fmt::Display for VariantVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = [
            (self.golden, "GOLDEN"),
            (self.shiny, "SHINY"),
            (self.rainbow, "RAINBOW"),
        ]
        .into_iter()
        .filter_map(|(set, name)| set.then_some(name))
        .collect::<Vec<_>>();

        if parts.is_empty() {
            f.write_str("NORMAL")
        } else {
            f.write_str(&parts.join(" "))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseVerdictError {
    #[error("unknown variant word {0:?}")]
    UnknownWord(String),
    #[error("a variant cannot be both golden and rainbow")]
    GoldenRainbow,
}

impl FromStr for VariantVerdict {
    type Err = ParseVerdictError;

    /// Accepts labels such as `"GOLDEN SHINY"`, `"rainbow+shiny"` or `"Gold"`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut verdict = Self::NORMAL;
        for word in s.split(|c: char| c.is_whitespace() || c == '+').filter(|w| !w.is_empty()) {
            match word.to_ascii_uppercase().as_str() {
                "GOLD" | "GOLDEN" => verdict.golden = true,
                "RAINBOW" => verdict.rainbow = true,
                "SHINY" => verdict.shiny = true,
                "NORMAL" => {}
                _ => return Err(ParseVerdictError::UnknownWord(word.to_string())),
            }
        }
        if verdict.golden && verdict.rainbow {
            return Err(ParseVerdictError::GoldenRainbow);
        }
        Ok(verdict)
    }
}

#[derive(Debug, Clone)]
pub struct Classification {
    pub verdict: VariantVerdict,
    /// Region the verdict was read from: the whole card for golden items,
    /// the rainbow band otherwise. `None` when the sequence stopped early.
    pub audit: Option<OwnedImage>,
}

/// Run the full decision sequence over a refined card crop.
pub fn classify(card: Image) -> Classification {
    if golden_check(card) {
        let verdict = VariantVerdict {
            golden: true,
            rainbow: false,
            shiny: shiny_check(card).shiny,
        };
        debug!(%verdict, "golden card");
        return Classification {
            verdict,
            audit: Some(card.to_owned_image()),
        };
    }

    match classify_band(card) {
        Ok(classification) => classification,
        Err(reason) => {
            debug!(%reason, "variant sequence stopped, NORMAL");
            Classification {
                verdict: VariantVerdict::NORMAL,
                audit: None,
            }
        }
    }
}

fn classify_band(card: Image) -> Result<Classification> {
    let exclusive_bottom = exclusive_anchor(card)?;
    let gray_top = gray_text_anchor(card, exclusive_bottom).unwrap_or_else(|| {
        debug!("gray text not found, using fixed offset");
        exclusive_bottom + GRAY_FALLBACK_OFFSET
    });
    let band = shiny_aware_sub_crop(card, exclusive_bottom, gray_top)?;
    let entropy = rainbow_entropy(band.image);

    let verdict = VariantVerdict {
        golden: false,
        rainbow: entropy.rainbow,
        shiny: band.shiny,
    };
    debug!(%verdict, distinct = entropy.distinct, colorful = entropy.colorful, "band classified");
    Ok(Classification {
        verdict,
        audit: Some(band.image.to_owned_image()),
    })
}

/// Any pixel of the golden palette anywhere on the card.
pub fn golden_check(card: Image) -> bool {
    !Mask::build(card, &GOLDEN_PALETTE, ColorSpace::Rgb).is_empty()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShinyReading {
    pub shiny: bool,
    pub pixels: usize,
    /// Topmost row with a shiny pixel, relative to the checked region.
    pub first_row: Option<u32>,
}

pub fn shiny_check(region: Image) -> ShinyReading {
    let mask = Mask::build(region, &SHINY_PALETTE, ColorSpace::Rgb);
    let pixels = mask.count();
    ShinyReading {
        shiny: pixels >= SHINY_MIN_PIXELS,
        pixels,
        first_row: mask.min_row(),
    }
}

/// Bottom row of the exclusive tag, searched in the top part of the card.
pub fn exclusive_anchor(card: Image) -> Result<u32> {
    let band = (card.height() as f64 * EXCLUSIVE_SEARCH_FRACTION) as u32;
    let bottom = Mask::build(card.trimmed_top(band), &EXCLUSIVE_TAG_PALETTE, ColorSpace::Rgb)
        .max_row()
        .ok_or(DetectError::NoColorMatch {
            palette: "exclusive tag",
        })?;
    debug!(bottom, "exclusive tag bottom");
    Ok(bottom)
}

/// Top row of the gray description text at or below `from_row`, in card coordinates.
pub fn gray_text_anchor(card: Image, from_row: u32) -> Option<u32> {
    let below = card.rows(from_row, card.height());
    let top = from_row + Mask::build(below, &GRAY_TEXT_PALETTE, ColorSpace::Rgb).min_row()?;
    debug!(top, "gray text top");
    Some(top)
}

#[derive(Clone, Copy)]
pub struct SubCrop<'a> {
    pub image: Image<'a>,
    /// First card row of the band.
    pub top: u32,
    pub shiny: bool,
}

/// Rows between two anchors (either order), cut above a shiny label if one is present.
pub fn shiny_aware_sub_crop<'a>(card: Image<'a>, a: u32, b: u32) -> Result<SubCrop<'a>> {
    let top = a.min(b);
    let span = card.rows(top, a.max(b));
    if span.is_empty() {
        return Err(DetectError::EmptyRegion {
            region: "variant band",
        });
    }

    let reading = shiny_check(span);
    let mut image = span;
    if reading.shiny {
        match reading.first_row {
            Some(row) if row >= MIN_TRUNCATED_HEIGHT => {
                debug!(row, pixels = reading.pixels, "shiny label, truncating band");
                image = span.trimmed_top(row);
            }
            _ => debug!(pixels = reading.pixels, "shiny label too close to the top, keeping band"),
        }
    }

    Ok(SubCrop {
        image,
        top,
        shiny: reading.shiny,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntropyReading {
    pub colorful: usize,
    pub distinct: usize,
    pub rainbow: bool,
}

/// Count distinct exact colors among the colorful pixels of the band's core.
pub fn rainbow_entropy(band: Image) -> EntropyReading {
    let none = EntropyReading {
        colorful: 0,
        distinct: 0,
        rainbow: false,
    };
    let h = band.height();
    if h < ENTROPY_MIN_HEIGHT || band.width() == 0 {
        return none;
    }

    // Trim the edges so anchor pixels don't bleed into the count.
    let core = band.rows((h as f64 * ENTROPY_CORE_START) as u32, (h as f64 * ENTROPY_CORE_END) as u32);
    let mask = Mask::saturated(core, COLORFUL_MIN_SATURATION, COLORFUL_MIN_VALUE);

    let mut colorful = 0usize;
    let mut colors = HashSet::new();
    for (x, y, c) in core.pixels() {
        if mask.get(x, y) {
            colorful += 1;
            colors.insert(c);
        }
    }

    if colorful < MIN_COLORFUL_PIXELS {
        return EntropyReading { colorful, ..none };
    }

    EntropyReading {
        colorful,
        distinct: colors.len(),
        rainbow: colors.len() > RAINBOW_MIN_DISTINCT,
    }
}

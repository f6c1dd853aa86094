/// Default score threshold between light and dark foregrounds.
pub const DEFAULT_THRESHOLD: u32 = 500;

/// Which foreground reads best over a given backdrop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contrast {
    /// Light text for dark backdrops.
    Light,
    /// Dark text for light backdrops.
    Dark,
}

impl Contrast {
    /// Weighted brightness `2R + 7G + B` of an 8-bit colour (0 – 2550).
    pub fn score([r, g, b]: [u8; 3]) -> u32 {
        2 * r as u32 + 7 * g as u32 + b as u32
    }

    /// Pick the foreground for `backdrop`: light below `threshold`, dark otherwise.
    pub fn for_backdrop(backdrop: [u8; 3], threshold: u32) -> Self {
        if Self::score(backdrop) < threshold {
            Self::Light
        } else {
            Self::Dark
        }
    }
}

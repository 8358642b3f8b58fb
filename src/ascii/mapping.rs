//! Brightness to glyph mapping.

/// Glyph for one brightness value. An empty ramp renders blank.
#[inline]
pub fn glyph(brightness: u8, charset: &[char], invert: bool) -> char {
    if charset.is_empty() {
        return ' ';
    }
    let b = if invert { 255 - brightness } else { brightness };
    charset[b as usize * (charset.len() - 1) / 255]
}

/// Map brightness values to characters, reusing `buffer`.
///
/// Lower brightness maps to earlier characters in the ramp (typically
/// sparser glyphs), higher brightness to later, denser ones.
///
/// # Arguments
/// * `brightness` - Brightness values (0-255), one per character cell
/// * `charset` - Character ramp, ordered from darkest to brightest
/// * `invert` - If true, invert brightness before mapping (for light terminals)
/// * `buffer` - A mutable buffer to store the characters
///
/// # Returns
/// The number of characters written, one per input brightness value.
///
/// # Example
/// ```ignore
/// let mut chars = Vec::new();
/// map_to_chars_into(&[0, 255], STANDARD_CHARSET, false, &mut chars);
/// // chars == [' ', '@']
/// ```
pub fn map_to_chars_into(
    brightness: &[u8],
    charset: &[char],
    invert: bool,
    buffer: &mut Vec<char>,
) -> usize {
    buffer.clear();
    buffer.extend(brightness.iter().map(|&b| glyph(b, charset, invert)));
    buffer.len()
}

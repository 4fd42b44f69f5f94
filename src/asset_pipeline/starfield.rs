use rand::Rng;

use crate::asset_pipeline::materials::TextureData;

/// Paints a procedural star field, used as the backdrop when no space texture is available.
pub fn starfield(width: u32, height: u32, star_count: usize, rng: &mut impl Rng) -> TextureData {
    let mut pixels = [4u8, 4, 10, 255].repeat((width * height) as usize);

    for _ in 0..star_count {
        let x = rng.gen_range(0..width);
        let y = rng.gen_range(0..height);
        let brightness: u8 = rng.gen_range(90..=255);
        // Slight blue or warm tint per star
        let tint: i16 = rng.gen_range(-25..=25);

        let offset = ((y * width + x) * 4) as usize;
        pixels[offset] = (brightness as i16 + tint).clamp(0, 255) as u8;
        pixels[offset + 1] = brightness;
        pixels[offset + 2] = (brightness as i16 - tint).clamp(0, 255) as u8;
    }

    TextureData {
        width,
        height,
        pixels,
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    #[test]
    fn stars_are_brighter_than_the_sky() {
        let mut rng = StdRng::seed_from_u64(7);
        let texture = starfield(64, 32, 40, &mut rng);

        assert_eq!(texture.pixels.len(), 64 * 32 * 4);

        let lit = texture
            .pixels
            .chunks_exact(4)
            .filter(|pixel| pixel[1] >= 90)
            .count();
        assert!(lit > 0 && lit <= 40);
        assert!(texture.pixels.chunks_exact(4).all(|pixel| pixel[3] == 255));
    }
}

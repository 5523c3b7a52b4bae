// THEORY:
// The `color` module reduces one tile's worth of raw RGBA bytes to the single
// color the tile server is asked about.
//
// Key architectural principles:
// 1.  **Spatial Pooling**: A tile is summarized by the plain average of its red,
//     green and blue channels. Alpha is ignored. Because it is a sum, the result is
//     independent of pixel order.
// 2.  **Purity**: `average_color` has no state and no side effects, so it can run
//     inline, on a blocking thread, or in a worker pool and always give the same
//     answer for the same bytes.
// 3.  **Explicit Rejection**: A buffer that is not a whole number of RGBA quadruples
//     is a broken contract upstream. It is reported as `InvalidPixelData`, never
//     truncated.
// 4.  **Wire Format**: The result is a `ColorSample`, six lowercase hex digits with
//     no prefix. It is the only thing that crosses the network.

pub mod color {
    use crate::{MosaicError, Result};
    use std::fmt;
    use std::str::FromStr;

    pub type Byte = u8;
    /// Row-major RGBA bytes of one tile, four bytes per pixel.
    pub type PixelBuffer = Vec<Byte>;
    /// The reduced colors of one tile row, in column order.
    pub type Row = Vec<ColorSample>;

    const CHANNELS: usize = 4;

    /// A tile's average color as `rrggbb`: six lowercase hex digits, no `#`.
    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    pub struct ColorSample(String);

    impl ColorSample {
        pub fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
            Self(format!("{red:02x}{green:02x}{blue:02x}"))
        }

        pub fn as_str(&self) -> &str {
            &self.0
        }

        /// Decodes the sample back into its channels.
        pub fn rgb(&self) -> (u8, u8, u8) {
            let channel = |i: usize| u8::from_str_radix(&self.0[i..i + 2], 16).unwrap_or_default();
            (channel(0), channel(2), channel(4))
        }
    }

    impl FromStr for ColorSample {
        type Err = MosaicError;

        fn from_str(s: &str) -> Result<Self> {
            let valid = s.len() == 6 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
            if !valid {
                return Err(MosaicError::InvalidColor(s.to_string()));
            }
            Ok(Self(s.to_string()))
        }
    }

    impl fmt::Display for ColorSample {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.0)
        }
    }

    /// Averages the red, green and blue channels of an RGBA buffer.
    ///
    /// Each channel average is `round(sum / pixel_count)`, with halves rounded up.
    /// An empty buffer averages to black.
    pub fn average_color(bytes: &[Byte]) -> Result<ColorSample> {
        if bytes.len() % CHANNELS != 0 {
            return Err(MosaicError::InvalidPixelData { len: bytes.len() });
        }

        let pixel_count = (bytes.len() / CHANNELS) as u64;
        if pixel_count == 0 {
            return Ok(ColorSample::from_rgb(0, 0, 0));
        }

        let mut sum_r = 0u64;
        let mut sum_g = 0u64;
        let mut sum_b = 0u64;
        for pixel in bytes.chunks_exact(CHANNELS) {
            sum_r += pixel[0] as u64;
            sum_g += pixel[1] as u64;
            sum_b += pixel[2] as u64;
        }

        let average = |sum: u64| ((2 * sum + pixel_count) / (2 * pixel_count)) as u8;
        Ok(ColorSample::from_rgb(average(sum_r), average(sum_g), average(sum_b)))
    }

    /// Reduces every tile of a row, preserving column order. Fails on the first bad buffer.
    pub fn reduce_row(buffers: &[PixelBuffer]) -> Result<Row> {
        buffers.iter().map(|bytes| average_color(bytes)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::color::*;
    use crate::MosaicError;

    fn uniform(pixel: [u8; 4], count: usize) -> PixelBuffer {
        pixel.iter().copied().cycle().take(count * 4).collect()
    }

    #[test]
    fn rejects_partial_pixels() {
        for len in [1usize, 2, 3, 5, 7, 4097] {
            let err = average_color(&vec![0u8; len]).unwrap_err();
            assert!(matches!(err, MosaicError::InvalidPixelData { len: l } if l == len));
        }
        assert!(average_color(&vec![0u8; 64]).is_ok());
    }

    #[test]
    fn uniform_tile_is_encoded_exactly() {
        assert_eq!(average_color(&uniform([255, 0, 0, 255], 256)).unwrap().as_str(), "ff0000");
        assert_eq!(average_color(&uniform([0, 255, 0, 0], 3)).unwrap().as_str(), "00ff00");
        assert_eq!(average_color(&uniform([18, 52, 86, 7], 9)).unwrap().as_str(), "123456");
    }

    #[test]
    fn small_channels_are_zero_padded() {
        assert_eq!(average_color(&uniform([0x0f, 0x01, 0x10, 0], 4)).unwrap().as_str(), "0f0110");
        assert_eq!(average_color(&uniform([0, 0, 0, 255], 1)).unwrap().as_str(), "000000");
    }

    #[test]
    fn alpha_is_ignored() {
        let opaque = average_color(&uniform([10, 20, 30, 255], 4)).unwrap();
        let clear = average_color(&uniform([10, 20, 30, 0], 4)).unwrap();
        assert_eq!(opaque, clear);
    }

    #[test]
    fn averages_round_to_nearest() {
        // red: (0 + 1) / 2 = 0.5 -> 1, blue: (254 + 255) / 2 = 254.5 -> 255
        let bytes = vec![0, 0, 254, 0, 1, 0, 255, 0];
        assert_eq!(average_color(&bytes).unwrap(), ColorSample::from_rgb(1, 0, 255));

        let thirds = vec![0, 0, 0, 0, 1, 1, 1, 0, 1, 1, 1, 0];
        assert_eq!(average_color(&thirds).unwrap(), ColorSample::from_rgb(1, 1, 1));
    }

    #[test]
    fn pixel_order_does_not_matter() {
        let pixels: Vec<[u8; 4]> = (0..50u32)
            .map(|i| [(i * 37 % 256) as u8, (i * 91 % 256) as u8, (i * 13 % 256) as u8, 255])
            .collect();
        let forward: Vec<u8> = pixels.iter().flatten().copied().collect();
        let backward: Vec<u8> = pixels.iter().rev().flatten().copied().collect();
        let mut rotated = pixels.clone();
        rotated.rotate_left(17);
        let rotated: Vec<u8> = rotated.iter().flatten().copied().collect();

        let expected = average_color(&forward).unwrap();
        assert_eq!(average_color(&backward).unwrap(), expected);
        assert_eq!(average_color(&rotated).unwrap(), expected);
    }

    #[test]
    fn reduce_row_keeps_column_order_and_fails_fast() {
        let row = vec![uniform([255, 0, 0, 255], 4), uniform([0, 0, 255, 255], 2)];
        let colors = reduce_row(&row).unwrap();
        assert_eq!(colors, vec![ColorSample::from_rgb(255, 0, 0), ColorSample::from_rgb(0, 0, 255)]);

        let broken = vec![uniform([1, 2, 3, 4], 1), vec![1, 2, 3]];
        assert!(matches!(reduce_row(&broken), Err(MosaicError::InvalidPixelData { len: 3 })));
    }

    #[test]
    fn color_sample_parsing() {
        let sample: ColorSample = "a0b1c2".parse().unwrap();
        assert_eq!(sample.rgb(), (0xa0, 0xb1, 0xc2));
        assert_eq!(sample.to_string(), "a0b1c2");

        for bad in ["", "fff", "#a0b1c2", "A0B1C2", "a0b1cg", "a0b1c2d"] {
            assert!(bad.parse::<ColorSample>().is_err(), "{bad}");
        }
    }
}

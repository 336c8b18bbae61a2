// THEORY:
// The `Pixel` module is the most fundamental unit of the motion system. It is a
// "dumb" data container for a single RGBA sample plus the one heuristic the rest
// of the runner cares about: its luma.
//
// Key principles:
// 1) Single-pixel scope: nothing here reads neighbours or history. Comparing two
//    frames is the job of the `FrameDifferencer`.
// 2) Rec. 601 weights on the raw 0..255 channels. This is the cheap brightness
//    proxy webcams and browsers both agree on, and it is stable under the colour
//    noise of cheap sensors.
// 3) Alpha is carried but never contributes to brightness.

pub mod pixel {
    pub type Channel = u8;
    pub type Luma = u8;
    pub type Luminance = f64;

    const CHANNELS: usize = 4;

    /// A "dumb" data container representing a single RGBA pixel.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct Pixel {
        /// The red channel value (0-255).
        pub red: Channel,
        /// The green channel value (0-255).
        pub green: Channel,
        /// The blue channel value (0-255).
        pub blue: Channel,
        /// The alpha (transparency) channel value (0-255).
        pub alpha: Channel,
    }

    impl Pixel {
        pub fn new(red: Channel, green: Channel, blue: Channel, alpha: Channel) -> Self {
            Pixel {
                red,
                green,
                blue,
                alpha,
            }
        }

        /// Builds a pixel from the first four bytes of an RGBA slice.
        /// Returns `None` for short slices instead of panicking.
        pub fn from_rgba(bytes: &[u8]) -> Option<Self> {
            match bytes {
                [r, g, b, a, ..] => Some(Pixel::new(*r, *g, *b, *a)),
                _ => None,
            }
        }

        /// Luminance estimate (Rec. 601 luma) on the 0..255 scale.
        pub fn luminance(&self) -> Luminance {
            0.299_f64 * self.red as f64 + 0.587_f64 * self.green as f64 + 0.114_f64 * self.blue as f64
        }

        /// Luma rounded to the nearest integer, the unit stored in a `LumaBuffer`.
        pub fn luma(&self) -> Luma {
            // The weights sum to 1.0, so the result never leaves 0..=255.
            self.luminance().round() as Luma
        }

        pub fn channels(&self) -> [Channel; CHANNELS] {
            [self.red, self.green, self.blue, self.alpha]
        }
    }

    impl From<image::Rgba<u8>> for Pixel {
        fn from(rgba: image::Rgba<u8>) -> Self {
            let [r, g, b, a] = rgba.0;
            Pixel::new(r, g, b, a)
        }
    }

    impl From<Pixel> for image::Rgba<u8> {
        fn from(pixel: Pixel) -> Self {
            image::Rgba(pixel.channels())
        }
    }
}

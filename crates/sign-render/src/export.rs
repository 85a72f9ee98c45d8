//! Bitmap → encoded image → `data:` URL.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{Rgb, RgbImage, RgbaImage};
use sign_core::model::ImageType;
use sign_core::surface::SurfaceError;

/// Encode straight-alpha RGBA pixels in `format`.
///
/// JPEG carries no alpha channel, so translucent pixels are flattened onto
/// white first. WebP is written lossless; `quality` only affects JPEG.
pub fn encode_rgba(
    width: u32,
    height: u32,
    rgba: Vec<u8>,
    format: ImageType,
    quality: f64,
) -> Result<Vec<u8>, SurfaceError> {
    let encode_err = |reason: String| SurfaceError::Encode { format, reason };
    let img = RgbaImage::from_raw(width, height, rgba)
        .ok_or_else(|| encode_err(format!("buffer does not match {width}x{height}")))?;

    let mut buf = Vec::new();
    let result = match format {
        ImageType::Png => img.write_with_encoder(PngEncoder::new(&mut buf)),
        ImageType::Webp => img.write_with_encoder(WebPEncoder::new_lossless(&mut buf)),
        ImageType::Jpeg => {
            let q = (quality.clamp(0.0, 1.0) * 100.0).round().max(1.0) as u8;
            flatten_on_white(&img).write_with_encoder(JpegEncoder::new_with_quality(&mut buf, q))
        }
    };
    result.map_err(|e| encode_err(e.to_string()))?;
    Ok(buf)
}

/// Wrap encoded bytes as `data:<mime>;base64,<payload>`.
pub fn data_url(format: ImageType, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", format.mime(), STANDARD.encode(bytes))
}

fn flatten_on_white(img: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(img.width(), img.height(), |x, y| {
        let [r, g, b, a] = img.get_pixel(x, y).0;
        let a = a as u32;
        let over = |c: u8| ((c as u32 * a + 255 * (255 - a) + 127) / 255) as u8;
        Rgb([over(r), over(g), over(b)])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(width: u32, height: u32) -> Vec<u8> {
        (0..width * height)
            .flat_map(|i| if i % 2 == 0 { [16, 16, 16, 255] } else { [0, 0, 0, 0] })
            .collect()
    }

    #[test]
    fn png_data_url() {
        let bytes = encode_rgba(4, 4, checker(4, 4), ImageType::Png, 0.92).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
        let url = data_url(ImageType::Png, &bytes);
        assert!(url.starts_with("data:image/png;base64,iVBORw0KGgo"));
    }

    #[test]
    fn jpeg_and_webp_headers() {
        let jpeg = encode_rgba(8, 8, checker(8, 8), ImageType::Jpeg, 0.5).unwrap();
        assert_eq!(&jpeg[..2], &[0xFFu8, 0xD8]);

        let webp = encode_rgba(8, 8, checker(8, 8), ImageType::Webp, 1.0).unwrap();
        assert_eq!(&webp[..4], b"RIFF");
        assert_eq!(&webp[8..12], b"WEBP");
    }

    #[test]
    fn mismatched_buffer_is_an_error() {
        let err = encode_rgba(4, 4, vec![0; 3], ImageType::Png, 1.0).unwrap_err();
        assert!(matches!(err, SurfaceError::Encode { format: ImageType::Png, .. }));
    }

    #[test]
    fn transparent_flattens_to_white() {
        let img = RgbaImage::from_raw(2, 1, vec![0, 0, 0, 0, 16, 16, 16, 255]).unwrap();
        let flat = flatten_on_white(&img);
        assert_eq!(flat.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(flat.get_pixel(1, 0).0, [16, 16, 16]);
    }
}

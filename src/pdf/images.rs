use std::io::Cursor;

use image::codecs::jpeg::JpegDecoder;
use image::{DynamicImage, ExtendedColorType, ImageDecoder, ImageFormat, RgbaImage};
use pdf_writer::{Filter, Pdf, Ref};
use rayon::prelude::*;

use crate::config::PageGeometry;

use super::canvas::{Canvas, Placed};

/// Image grid dimensions in millimetres.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImageBox {
    pub max_width: f32,
    pub max_height: f32,
    /// Portraits start from this narrower width so they do not dominate a row.
    pub max_portrait_width: f32,
    pub column_gap: f32,
    pub row_gap: f32,
    pub gap_after: f32,
}

impl ImageBox {
    pub fn for_page(page: &PageGeometry) -> Self {
        let column_gap = 10.0;
        ImageBox {
            max_width: (page.content_width() - column_gap) / 2.0,
            max_height: 40.0,
            max_portrait_width: 30.0,
            column_gap,
            row_gap: 5.0,
            gap_after: 10.0,
        }
    }

    pub fn row_pitch(&self) -> f32 {
        self.max_height + self.row_gap
    }
}

/// Size in mm for an image of `px_w × px_h` pixels, preserving its aspect ratio.
pub fn fit_image(px_w: u32, px_h: u32, bx: &ImageBox) -> (f32, f32) {
    let ratio = px_w as f32 / px_h as f32;
    let start = if ratio < 1.0 {
        bx.max_portrait_width
    } else {
        bx.max_width
    };
    let (mut w, mut h) = (start, start / ratio);
    if h > bx.max_height {
        h = bx.max_height;
        w = h * ratio;
    }
    (w, h)
}

/// Column and row of the `index`-th image in the two-column grid.
pub fn grid_position(index: usize) -> (usize, usize) {
    (index % 2, index / 2)
}

enum Pixels {
    /// Baseline RGB or grayscale JPEG, embedded as-is.
    Jpeg { data: Vec<u8>, gray: bool },
    Rgba(RgbaImage),
}

pub struct DecodedImage {
    /// Position in the caller's image list.
    pub index: usize,
    pub width_px: u32,
    pub height_px: u32,
    pixels: Pixels,
}

fn decode_jpeg(blob: &[u8]) -> Result<(Pixels, (u32, u32)), String> {
    let decoder = JpegDecoder::new(Cursor::new(blob)).map_err(|e| e.to_string())?;
    let color = decoder.original_color_type();
    let dimensions = decoder.dimensions();
    let decoded = DynamicImage::from_decoder(decoder).map_err(|e| e.to_string())?;
    let pixels = match color {
        ExtendedColorType::Rgb8 => Pixels::Jpeg {
            data: blob.to_vec(),
            gray: false,
        },
        ExtendedColorType::L8 => Pixels::Jpeg {
            data: blob.to_vec(),
            gray: true,
        },
        // CMYK and friends: re-encode from the decoded pixels.
        _ => Pixels::Rgba(decoded.to_rgba8()),
    };
    Ok((pixels, dimensions))
}

fn decode_one(index: usize, blob: &[u8]) -> Result<DecodedImage, String> {
    let format = image::guess_format(blob).map_err(|e| e.to_string())?;
    let (pixels, (width_px, height_px)) = if format == ImageFormat::Jpeg {
        decode_jpeg(blob)?
    } else {
        let rgba = image::load_from_memory_with_format(blob, format)
            .map_err(|e| e.to_string())?
            .to_rgba8();
        let dimensions = rgba.dimensions();
        (Pixels::Rgba(rgba), dimensions)
    };
    if width_px == 0 || height_px == 0 {
        return Err(format!("zero-sized image ({width_px}×{height_px})"));
    }
    Ok(DecodedImage {
        index,
        width_px,
        height_px,
        pixels,
    })
}

/// Decode every blob on the rayon pool. Results keep the input order; blobs
/// that fail to decode are logged and come back as `None`.
pub fn decode_all(blobs: &[Vec<u8>]) -> Vec<Option<DecodedImage>> {
    let t0 = std::time::Instant::now();
    let decoded: Vec<Option<DecodedImage>> = blobs
        .par_iter()
        .enumerate()
        .map(|(i, blob)| match decode_one(i, blob) {
            Ok(img) => {
                log::debug!("image {i}: {}×{} px", img.width_px, img.height_px);
                Some(img)
            }
            Err(e) => {
                log::warn!("image {i} skipped: {e}");
                None
            }
        })
        .collect();
    log::info!(
        "Image decode: {} of {} in {:.1}ms",
        decoded.iter().flatten().count(),
        blobs.len(),
        t0.elapsed().as_secs_f64() * 1000.0,
    );
    decoded
}

fn embed(pdf: &mut Pdf, alloc: &mut impl FnMut() -> Ref, img: &DecodedImage) -> Ref {
    let xobj_ref = alloc();
    let (w, h) = (img.width_px as i32, img.height_px as i32);

    match &img.pixels {
        Pixels::Jpeg { data, gray } => {
            let mut xobj = pdf.image_xobject(xobj_ref, data);
            xobj.filter(Filter::DctDecode);
            xobj.width(w);
            xobj.height(h);
            if *gray {
                xobj.color_space().device_gray();
            } else {
                xobj.color_space().device_rgb();
            }
            xobj.bits_per_component(8);
        }
        Pixels::Rgba(rgba) => {
            let has_alpha = rgba.pixels().any(|p| p.0[3] < 255);
            let rgb_data: Vec<u8> = rgba
                .pixels()
                .flat_map(|p| [p.0[0], p.0[1], p.0[2]])
                .collect();
            let compressed_rgb = miniz_oxide::deflate::compress_to_vec_zlib(&rgb_data, 6);

            let smask_ref = has_alpha.then(|| {
                let alpha_data: Vec<u8> = rgba.pixels().map(|p| p.0[3]).collect();
                let compressed_alpha = miniz_oxide::deflate::compress_to_vec_zlib(&alpha_data, 6);
                let mask_ref = alloc();
                let mut mask = pdf.image_xobject(mask_ref, &compressed_alpha);
                mask.filter(Filter::FlateDecode);
                mask.width(w);
                mask.height(h);
                mask.color_space().device_gray();
                mask.bits_per_component(8);
                mask_ref
            });

            let mut xobj = pdf.image_xobject(xobj_ref, &compressed_rgb);
            xobj.filter(Filter::FlateDecode);
            xobj.width(w);
            xobj.height(h);
            xobj.color_space().device_rgb();
            xobj.bits_per_component(8);
            if let Some(mask_ref) = smask_ref {
                xobj.s_mask(mask_ref);
            }
        }
    }
    xobj_ref
}

/// Lay the images out in the two-column grid at the cursor. Each row is one
/// atomic block. Rows whose images all failed to decode take no space.
pub fn place_images(canvas: &mut Canvas, images: &[Option<DecodedImage>]) {
    if images.iter().all(Option::is_none) {
        return;
    }
    let geometry = canvas.cursor().geometry();
    let bx = ImageBox::for_page(&geometry);

    for row in images.chunks(2) {
        if row.iter().all(Option::is_none) {
            continue;
        }
        canvas.reserve(bx.row_pitch());
        let top = canvas.cursor().y();
        for img in row.iter().flatten() {
            let (column, _) = grid_position(img.index);
            let x = geometry.margin + column as f32 * (bx.max_width + bx.column_gap);
            let (w, h) = fit_image(img.width_px, img.height_px, &bx);

            let xobj_ref = {
                let (pdf, mut alloc) = canvas.writer();
                embed(pdf, &mut alloc, img)
            };
            let name = canvas.add_image_xobject(xobj_ref);
            canvas.draw_xobject(&name, x, top, w, h);
            let page = canvas.cursor().page_index();
            canvas.record(Placed::Image {
                index: img.index,
                page,
                x,
                y: top,
                width: w,
                height: h,
            });
        }
        canvas.advance(bx.row_pitch());
    }
    canvas.advance(bx.gap_after);
}

use pdf_writer::{Filter, Pdf, Ref};

use crate::assets::{PixelData, RasterImage};

/// Write `img` as an image XObject at `xobj_ref`. JPEG passes through as
/// DCT; RGBA is split into Flate RGB plus a soft mask when any pixel is
/// translucent.
pub(super) fn embed_image(
    pdf: &mut Pdf,
    xobj_ref: Ref,
    img: &RasterImage,
    alloc: &mut impl FnMut() -> Ref,
) {
    let (w, h) = (img.width as i32, img.height as i32);
    match &img.data {
        PixelData::Jpeg(data) => {
            let mut xobj = pdf.image_xobject(xobj_ref, data);
            xobj.filter(Filter::DctDecode);
            xobj.width(w);
            xobj.height(h);
            xobj.color_space().device_rgb();
            xobj.bits_per_component(8);
        }
        PixelData::Rgba(rgba) => {
            let has_alpha = rgba.chunks_exact(4).any(|p| p[3] < 255);

            let rgb_data: Vec<u8> = rgba
                .chunks_exact(4)
                .flat_map(|p| [p[0], p[1], p[2]])
                .collect();
            let compressed_rgb = miniz_oxide::deflate::compress_to_vec_zlib(&rgb_data, 6);

            let smask_ref = if has_alpha {
                let alpha_data: Vec<u8> = rgba.chunks_exact(4).map(|p| p[3]).collect();
                let compressed_alpha = miniz_oxide::deflate::compress_to_vec_zlib(&alpha_data, 6);
                let mask_ref = alloc();
                let mut mask = pdf.image_xobject(mask_ref, &compressed_alpha);
                mask.filter(Filter::FlateDecode);
                mask.width(w);
                mask.height(h);
                mask.color_space().device_gray();
                mask.bits_per_component(8);
                Some(mask_ref)
            } else {
                None
            };

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
}

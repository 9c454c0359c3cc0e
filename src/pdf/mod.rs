//! Serialises a laid-out [`Page`] to PDF bytes.

mod xobject;

use std::collections::BTreeSet;

use pdf_writer::{Content, Filter, Name, Pdf, Rect as PdfRect, Ref, Str, TextStr};

use crate::canvas::{Align, Color, DrawOp, Page, Rect, TextOp, Weight};
use crate::error::Error;
use crate::fonts::{FontEntry, register_font};

use xobject::embed_image;

pub(crate) const PT_PER_MM: f32 = 72.0 / 25.4;

/// Stroke width of outlines, in points (0.2 mm).
const LINE_WIDTH_PT: f32 = 0.2 * PT_PER_MM;

struct Fonts {
    regular: FontEntry,
    bold: FontEntry,
}

impl Fonts {
    fn get(&self, weight: Weight) -> &FontEntry {
        match weight {
            Weight::Regular => &self.regular,
            Weight::Bold => &self.bold,
        }
    }
}

fn used_chars(page: &Page, weight: Weight) -> BTreeSet<char> {
    page.texts()
        .filter(|t| t.style.weight == weight)
        .flat_map(|t| t.text.chars())
        .collect()
}

fn set_fill(content: &mut Content, c: Color) {
    content.set_fill_rgb(c.r as f32 / 255.0, c.g as f32 / 255.0, c.b as f32 / 255.0);
}

fn set_stroke(content: &mut Content, c: Color) {
    content.set_stroke_rgb(c.r as f32 / 255.0, c.g as f32 / 255.0, c.b as f32 / 255.0);
}

/// Top-left millimetre rect to PDF user space (bottom-left origin, points):
/// `(x, y_bottom, w, h)`.
fn to_user_space(rect: &Rect, page_height: f32) -> (f32, f32, f32, f32) {
    (
        rect.x * PT_PER_MM,
        (page_height - rect.y - rect.h) * PT_PER_MM,
        rect.w * PT_PER_MM,
        rect.h * PT_PER_MM,
    )
}

fn draw_text(content: &mut Content, t: &TextOp, fonts: &Fonts, page_height: f32) {
    let font = fonts.get(t.style.weight);
    let mut x = t.x * PT_PER_MM;
    if t.style.align == Align::Right {
        x -= font.text_width(&t.text, t.style.size);
    }
    let y = (page_height - t.y) * PT_PER_MM;

    content.begin_text();
    set_fill(content, t.style.color);
    content.set_font(Name(font.pdf_name.as_bytes()), t.style.size);
    content.next_line(x, y);
    content.show(Str(&font.encode(&t.text)));
    content.end_text();
}

pub fn render(page: &Page) -> Result<Vec<u8>, Error> {
    let t0 = std::time::Instant::now();
    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();
    let page_id = alloc();
    let content_id = alloc();
    let info_id = alloc();

    // Phase 1: fonts, subset to the characters each weight actually shows
    let fonts = Fonts {
        regular: register_font(
            &mut pdf,
            Weight::Regular,
            "F1".to_string(),
            &mut alloc,
            &used_chars(page, Weight::Regular),
        ),
        bold: register_font(
            &mut pdf,
            Weight::Bold,
            "F2".to_string(),
            &mut alloc,
            &used_chars(page, Weight::Bold),
        ),
    };
    let t_fonts = t0.elapsed();

    // Phase 2: images, one XObject per image op
    let mut image_xobjects: Vec<(String, Ref)> = Vec::new();
    for op in &page.ops {
        if let DrawOp::Image { image, .. } = op {
            let xobj_ref = alloc();
            embed_image(&mut pdf, xobj_ref, image, &mut alloc);
            image_xobjects.push((format!("Im{}", image_xobjects.len() + 1), xobj_ref));
        }
    }
    let t_images = t0.elapsed();

    // Phase 3: content stream in display-list order
    let mut content = Content::new();
    let mut image_idx = 0usize;
    for op in &page.ops {
        match op {
            DrawOp::Text(t) => draw_text(&mut content, t, &fonts, page.height),
            DrawOp::FillRect { rect, color } => {
                let (x, y, w, h) = to_user_space(rect, page.height);
                content.save_state();
                set_fill(&mut content, *color);
                content.rect(x, y, w, h);
                content.fill_nonzero();
                content.restore_state();
            }
            DrawOp::StrokeRect { rect, color } => {
                let (x, y, w, h) = to_user_space(rect, page.height);
                content.save_state();
                set_stroke(&mut content, *color);
                content.set_line_width(LINE_WIDTH_PT);
                content.rect(x, y, w, h);
                content.stroke();
                content.restore_state();
            }
            DrawOp::Image { rect, .. } => {
                let (name, _) = &image_xobjects[image_idx];
                image_idx += 1;
                let (x, y, w, h) = to_user_space(rect, page.height);
                content.save_state();
                content.transform([w, 0.0, 0.0, h, x, y]);
                content.x_object(Name(name.as_bytes()));
                content.restore_state();
            }
        }
    }
    let raw = content.finish();
    let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
    pdf.stream(content_id, &compressed).filter(Filter::FlateDecode);
    let t_content = t0.elapsed();

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id).kids([page_id]).count(1);
    {
        let mut pdf_page = pdf.page(page_id);
        pdf_page
            .media_box(PdfRect::new(
                0.0,
                0.0,
                page.width * PT_PER_MM,
                page.height * PT_PER_MM,
            ))
            .parent(pages_id)
            .contents(content_id);
        let mut resources = pdf_page.resources();
        {
            let mut font_dict = resources.fonts();
            for font in [&fonts.regular, &fonts.bold] {
                font_dict.pair(Name(font.pdf_name.as_bytes()), font.font_ref);
            }
        }
        if !image_xobjects.is_empty() {
            let mut xobjects = resources.x_objects();
            for (name, xobj_ref) in &image_xobjects {
                xobjects.pair(Name(name.as_bytes()), *xobj_ref);
            }
        }
    }

    {
        let meta = &page.metadata;
        let mut info = pdf.document_info(info_id);
        info.title(TextStr(&meta.title));
        info.subject(TextStr(&meta.subject));
        info.author(TextStr(&meta.author));
        info.creator(TextStr(&meta.creator));
        info.producer(TextStr(concat!("bizdoc-pdf ", env!("CARGO_PKG_VERSION"))));
    }

    log::info!(
        "PDF phases: fonts={:.1}ms, images={:.1}ms, content={:.1}ms, assembly={:.1}ms",
        t_fonts.as_secs_f64() * 1000.0,
        (t_images - t_fonts).as_secs_f64() * 1000.0,
        (t_content - t_images).as_secs_f64() * 1000.0,
        (t0.elapsed() - t_content).as_secs_f64() * 1000.0,
    );

    Ok(pdf.finish())
}

mod assets;
mod canvas;
mod codes;
mod error;
mod fonts;
pub mod layout;
mod model;
mod output;
mod pdf;
mod render;
mod settings;

pub use assets::{AssetLoader, ImageSource, PixelData, RasterImage};
pub use canvas::{Align, Canvas, Color, DrawOp, Metadata, Page, Rect, TextOp, TextStyle, Weight};
pub use codes::{BATCH_SIZE, CODE_LENGTH, CodeStore, DownloadCode, VALIDITY_HOURS};
pub use error::Error;
pub use layout::{Cursor, LayoutConfig};
pub use model::{BusinessInfo, ClientInfo, Currency, DocumentData, DocumentKind, LineItem, Totals};
pub use output::{OutputMode, PrintJob, PrintOptions, Rendered, data_url};
pub use render::DocumentRenderer;
pub use settings::{BusinessSettings, SettingsExport};

use std::path::Path;

/// Read a JSON document, fill gaps from `settings`, and render it with the
/// default renderer.
pub async fn render_file(
    input: &Path,
    settings: Option<&BusinessSettings>,
    mode: OutputMode,
) -> Result<Rendered, Error> {
    let mut doc = DocumentData::load(input)?;
    if let Some(settings) = settings {
        settings.apply_to(&mut doc);
    }
    DocumentRenderer::new()?.render(&doc, mode).await
}

/// Encode an already composed page.
pub fn page_to_pdf(page: &Page) -> Result<Vec<u8>, Error> {
    pdf::render(page)
}

use std::sync::Arc;
use std::time::Duration;

use crate::assets::{AssetLoader, ImageSource, RasterImage};
use crate::canvas::Page;
use crate::error::Error;
use crate::layout::{self, LayoutConfig};
use crate::model::DocumentData;
use crate::output::{self, OutputMode, Rendered};

/// Lays out business documents and hands the result to an output sink.
pub struct DocumentRenderer {
    config: LayoutConfig,
    images: Box<dyn ImageSource>,
}

impl DocumentRenderer {
    /// Default layout, images loaded with a 10 s timeout.
    pub fn new() -> Result<Self, Error> {
        Ok(Self::with_images(
            LayoutConfig::default(),
            AssetLoader::new(Duration::from_secs(10))?,
        ))
    }

    pub fn with_images(config: LayoutConfig, images: impl ImageSource + 'static) -> Self {
        DocumentRenderer {
            config,
            images: Box::new(images),
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Run every stage, in order, against a fresh page.
    pub async fn compose(&self, data: &DocumentData) -> Result<Page, Error> {
        data.validate()?;
        data.audit_totals();
        let cfg = &self.config;
        let mut page = Page::new(cfg.page_width, cfg.page_height);

        layout::metadata(&mut page, data);
        let logo = self.load_optional(data.business.logo_url(), "Logo").await;
        let cursor = layout::header(&mut page, cfg, data, logo);
        let cursor = layout::title(&mut page, cfg, data, cursor);
        let cursor = layout::parties(&mut page, cfg, data, cursor);
        let cursor = layout::line_items(&mut page, cfg, data, cursor);
        let cursor = layout::totals(&mut page, cfg, data, cursor);
        let signature = self
            .load_optional(data.business.signature_url(), "Signature")
            .await;
        layout::footer(&mut page, cfg, signature, cursor);

        Ok(page)
    }

    /// Compose once, encode once, then dispatch to the sink `mode` selects.
    pub async fn render(&self, data: &DocumentData, mode: OutputMode) -> Result<Rendered, Error> {
        let t0 = std::time::Instant::now();
        let page = self.compose(data).await?;
        let t_layout = t0.elapsed();
        let bytes = encode(page).await?;
        let t_encode = t0.elapsed();

        let file_name = format!("{}.pdf", data.file_stem());
        let rendered = match mode {
            OutputMode::Save { dir } => {
                Rendered::Saved(output::save(&bytes, &dir, &file_name).await?)
            }
            OutputMode::Preview => Rendered::Preview(output::data_url(&bytes, &file_name)),
            OutputMode::Print(options) => Rendered::Printed(output::print(&bytes, &options)?),
        };

        log::info!(
            "Timing: layout={:.1}ms, encode={:.1}ms, sink={:.1}ms, total={:.1}ms (output {} bytes)",
            t_layout.as_secs_f64() * 1000.0,
            (t_encode - t_layout).as_secs_f64() * 1000.0,
            (t0.elapsed() - t_encode).as_secs_f64() * 1000.0,
            t0.elapsed().as_secs_f64() * 1000.0,
            bytes.len(),
        );
        Ok(rendered)
    }

    /// Layout plus PDF encoding, without a sink.
    pub async fn render_bytes(&self, data: &DocumentData) -> Result<Vec<u8>, Error> {
        let page = self.compose(data).await?;
        encode(page).await
    }

    async fn load_optional(&self, url: Option<&str>, what: &str) -> Option<Arc<RasterImage>> {
        let url = url?;
        match self.images.load(url).await {
            Ok(image) => {
                log::debug!("{what} loaded: {url} ({}x{})", image.width, image.height);
                Some(Arc::new(image))
            }
            Err(e) => {
                log::warn!("{what} load failed, rendering without it: {url}: {e}");
                None
            }
        }
    }
}

/// Font discovery and subsetting touch the filesystem, so encoding runs on
/// the blocking pool.
async fn encode(page: Page) -> Result<Vec<u8>, Error> {
    tokio::task::spawn_blocking(move || crate::pdf::render(&page))
        .await
        .map_err(|e| Error::Pdf(format!("PDF encoding task failed: {e}")))?
}

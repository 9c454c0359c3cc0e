//! Fetching and rasterizing the logo and signature images.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::error::Error;

pub enum PixelData {
    /// Baseline RGB JPEG, embedded unchanged.
    Jpeg(Vec<u8>),
    /// 8-bit RGBA, row-major.
    Rgba(Vec<u8>),
}

pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub data: PixelData,
}

impl fmt::Debug for RasterImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.data {
            PixelData::Jpeg(ref d) => format!("jpeg, {} bytes", d.len()),
            PixelData::Rgba(_) => "rgba".to_string(),
        };
        write!(f, "RasterImage({}x{}, {kind})", self.width, self.height)
    }
}

impl RasterImage {
    pub fn decode(bytes: &[u8]) -> Result<Self, Error> {
        let format = image::guess_format(bytes)
            .map_err(|e| Error::Image(format!("Unrecognised image format: {e}")))?;
        let decoded = image::load_from_memory_with_format(bytes, format)
            .map_err(|e| Error::Image(format!("Failed to decode image: {e}")))?;
        let (width, height) = (decoded.width(), decoded.height());
        if width == 0 || height == 0 {
            return Err(Error::Image("Image has no pixels".into()));
        }

        // CMYK and YCCK JPEGs also decode to Rgb8; only three-component
        // streams can be embedded as DeviceRGB.
        if format == image::ImageFormat::Jpeg
            && decoded.color() == image::ColorType::Rgb8
            && jpeg_components(bytes) == Some(3)
        {
            return Ok(RasterImage {
                width,
                height,
                data: PixelData::Jpeg(bytes.to_vec()),
            });
        }

        Ok(RasterImage {
            width,
            height,
            data: PixelData::Rgba(decoded.to_rgba8().into_raw()),
        })
    }

    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Self {
        RasterImage {
            width,
            height,
            data: PixelData::Rgba(rgba),
        }
    }
}

/// Component count from the first start-of-frame segment of a JPEG stream.
fn jpeg_components(bytes: &[u8]) -> Option<u8> {
    if bytes.get(..2)? != [0xFF, 0xD8] {
        return None;
    }
    let mut pos = 2;
    loop {
        if *bytes.get(pos)? != 0xFF {
            return None;
        }
        while *bytes.get(pos)? == 0xFF {
            pos += 1;
        }
        let marker = *bytes.get(pos)?;
        pos += 1;
        match marker {
            0x01 | 0xD0..=0xD7 => continue,
            0xD9 | 0xDA => return None,
            0xC0..=0xCF if !matches!(marker, 0xC4 | 0xC8 | 0xCC) => {
                return bytes.get(pos + 7).copied();
            }
            _ => {}
        }
        let len = u16::from_be_bytes([*bytes.get(pos)?, *bytes.get(pos + 1)?]) as usize;
        pos += len;
    }
}

/// Resolves an image URL to pixels. One attempt, no retries.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn load(&self, url: &str) -> Result<RasterImage, Error>;
}

#[async_trait]
impl<T: ImageSource + ?Sized> ImageSource for Arc<T> {
    async fn load(&self, url: &str) -> Result<RasterImage, Error> {
        (**self).load(url).await
    }
}

/// Loads `http(s)://`, `data:` and `file://` URLs, or plain filesystem paths.
pub struct AssetLoader {
    client: reqwest::Client,
}

impl AssetLoader {
    pub fn new(timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("bizdoc-pdf/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Image(format!("HTTP client error: {e}")))?;
        Ok(AssetLoader { client })
    }

    async fn read_bytes(&self, url: &str) -> Result<Vec<u8>, Error> {
        if url.starts_with("http://") || url.starts_with("https://") {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| Error::Image(format!("Failed to download {url}: {e}")))?;
            if !response.status().is_success() {
                return Err(Error::Image(format!(
                    "Failed to download {url}: HTTP {}",
                    response.status()
                )));
            }
            let bytes = response
                .bytes()
                .await
                .map_err(|e| Error::Image(format!("Failed to read image data: {e}")))?;
            return Ok(bytes.to_vec());
        }

        if let Some(rest) = url.strip_prefix("data:") {
            return decode_data_url(rest);
        }

        let path = url.strip_prefix("file://").unwrap_or(url);
        tokio::fs::read(path)
            .await
            .map_err(|e| Error::Image(format!("Failed to read {path}: {e}")))
    }
}

#[async_trait]
impl ImageSource for AssetLoader {
    async fn load(&self, url: &str) -> Result<RasterImage, Error> {
        let bytes = self.read_bytes(url).await?;
        RasterImage::decode(&bytes)
    }
}

/// `[<mime>][;base64],<payload>`, the part after `data:`.
fn decode_data_url(rest: &str) -> Result<Vec<u8>, Error> {
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| Error::Image("Malformed data URL".into()))?;
    if header.split(';').any(|p| p == "base64") {
        BASE64
            .decode(payload.trim())
            .map_err(|e| Error::Image(format!("Invalid base64 in data URL: {e}")))
    } else {
        Ok(urlencoding::decode_binary(payload.as_bytes()).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_url_payload_is_base64_decoded() {
        let bytes = decode_data_url("image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn plain_data_url_payload_is_percent_decoded() {
        let bytes = decode_data_url("image/png,%89PNG%0D%0A").unwrap();
        assert_eq!(bytes, b"\x89PNG\r\n");
        assert_eq!(decode_data_url(",a%20b").unwrap(), b"a b");
    }

    fn sof_stream(components: u8) -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xD8];
        // APP0 with a two-byte body, then fill bytes before the frame marker
        bytes.extend([0xFF, 0xE0, 0x00, 0x04, 0x00, 0x00]);
        bytes.extend([0xFF, 0xFF, 0xC0, 0x00, 0x11, 0x08, 0x00, 0x10, 0x00, 0x10, components]);
        bytes
    }

    #[test]
    fn frame_header_component_count() {
        assert_eq!(jpeg_components(&sof_stream(3)), Some(3));
        assert_eq!(jpeg_components(&sof_stream(4)), Some(4));
        assert_eq!(jpeg_components(&sof_stream(1)), Some(1));
        assert_eq!(jpeg_components(b"\x89PNG"), None);
        assert_eq!(jpeg_components(&[0xFF, 0xD8, 0xFF, 0xDA, 0x00, 0x02]), None);
        assert_eq!(jpeg_components(&sof_stream(3)[..10]), None);
    }

    #[test]
    fn data_url_without_comma_is_rejected() {
        assert!(decode_data_url("image/png;base64").is_err());
    }

    #[test]
    fn garbage_bytes_do_not_decode() {
        assert!(RasterImage::decode(b"not an image").is_err());
    }
}

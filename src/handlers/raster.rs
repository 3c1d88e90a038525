use async_trait::async_trait;
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use std::any::Any;
use std::fmt;
use std::io::Cursor;
use std::str::FromStr;
use std::sync::Arc;

use super::traits::{Artifact, DecodeCache, Filter, Generator, Handler, HandlerError, Reader};
use crate::encoding::{EncodingOptions, Format};
use crate::specification::{Size, Specification};
use crate::storage::{StorageClient, StorageError};

pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Handler for standard raster images (JPEG, PNG, GIF, BMP sources)
///
/// Decoding and encoding are delegated to the `image` crate. A raster target
/// accepts readers from other handlers by decoding their content, once per
/// reader when the reader offers a [`DecodeCache`]. Pixel work runs on the
/// blocking pool.
#[derive(Clone)]
pub struct RasterHandler {
    storage: StorageClient,
}

impl RasterHandler {
    pub fn new(storage: StorageClient) -> Self {
        Self { storage }
    }
}

pub struct RasterReader {
    spec: Specification,
    content: Bytes,
    image: Arc<DynamicImage>,
}

impl RasterReader {
    pub fn decode(spec: Specification, content: Bytes) -> Result<Self, HandlerError> {
        let image = decode(&content)?;
        Ok(Self {
            spec,
            content,
            image: Arc::new(image),
        })
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }
}

impl Reader for RasterReader {
    fn specification(&self) -> &Specification {
        &self.spec
    }

    fn content(&self) -> Bytes {
        self.content.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Filters understood by [`RasterHandler`], applied in the order given
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterFilter {
    Grayscale,
    FlipHorizontal,
    FlipVertical,
}

impl RasterFilter {
    fn apply(&self, image: &DynamicImage) -> DynamicImage {
        match self {
            RasterFilter::Grayscale => image.grayscale(),
            RasterFilter::FlipHorizontal => image.fliph(),
            RasterFilter::FlipVertical => image.flipv(),
        }
    }
}

impl Filter for RasterFilter {
    fn name(&self) -> &str {
        match self {
            RasterFilter::Grayscale => "grayscale",
            RasterFilter::FlipHorizontal => "fliph",
            RasterFilter::FlipVertical => "flipv",
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Display for RasterFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RasterFilter {
    type Err = HandlerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "grayscale" | "greyscale" => Ok(RasterFilter::Grayscale),
            "fliph" => Ok(RasterFilter::FlipHorizontal),
            "flipv" => Ok(RasterFilter::FlipVertical),
            other => Err(HandlerError::UnsupportedFilter(other.to_string())),
        }
    }
}

struct RasterGenerator {
    image: Arc<DynamicImage>,
    filters: Vec<RasterFilter>,
    size: Option<Size>,
}

impl RasterGenerator {
    fn render(&self) -> DynamicImage {
        let mut image = self
            .filters
            .iter()
            .fold((*self.image).clone(), |image, filter| filter.apply(&image));

        if let Some(size) = self.size {
            if image.width() != size.width || image.height() != size.height {
                image = image.resize_exact(size.width, size.height, FilterType::Triangle);
            }
        }
        image
    }
}

#[async_trait]
impl Generator for RasterGenerator {
    async fn generate(self: Box<Self>) -> Result<Arc<dyn Artifact>, HandlerError> {
        let image = tokio::task::spawn_blocking(move || self.render()).await?;
        Ok(Arc::new(RasterArtifact(image)))
    }
}

/// Decoded image ready for encoding
#[derive(Debug, Clone)]
pub struct RasterArtifact(pub DynamicImage);

impl Artifact for RasterArtifact {
    fn encode(&self, format: Format, options: &EncodingOptions) -> Result<Bytes, HandlerError> {
        let mut buffer = Vec::new();
        let encoded = match format {
            Format::Jpeg => {
                let quality = options.quality.unwrap_or(DEFAULT_JPEG_QUALITY).clamp(1, 100);
                let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
                // JPEG has no alpha channel
                DynamicImage::ImageRgb8(self.0.to_rgb8()).write_with_encoder(encoder)
            }
            Format::Png => {
                let encoder = PngEncoder::new_with_quality(
                    &mut buffer,
                    png_compression(options.compression),
                    PngFilter::Adaptive,
                );
                self.0.write_with_encoder(encoder)
            }
            // GIF takes 8-bit RGB(A) only
            Format::Gif => DynamicImage::ImageRgba8(self.0.to_rgba8())
                .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Gif),
            Format::Bmp => self.0.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Bmp),
            Format::Raw => return Ok(Bytes::copy_from_slice(self.0.as_bytes())),
        };

        encoded.map_err(|e| HandlerError::Encode(format!("{format}: {e}")))?;
        Ok(Bytes::from(buffer))
    }
}

fn png_compression(level: Option<u8>) -> CompressionType {
    match level {
        Some(0..=3) => CompressionType::Fast,
        Some(7..) => CompressionType::Best,
        _ => CompressionType::Default,
    }
}

fn decode(content: &[u8]) -> Result<DynamicImage, HandlerError> {
    image::load_from_memory(content).map_err(|e| HandlerError::Decode(e.to_string()))
}

/// Decoded source for a generator, decoding a foreign reader at most once
async fn source_image(reader: &dyn Reader) -> Result<Arc<DynamicImage>, HandlerError> {
    if let Some(raster) = reader.as_any().downcast_ref::<RasterReader>() {
        return Ok(raster.image.clone());
    }

    let cache = reader.decode_cache();
    if let Some(image) = cache.and_then(|cache| cache.get::<DynamicImage>()) {
        return Ok(image);
    }

    let content = reader.content();
    let image = Arc::new(tokio::task::spawn_blocking(move || decode(&content)).await??);
    tracing::debug!(
        location = reader.specification().location(),
        cached = cache.is_some(),
        "Decoded foreign reader content"
    );

    Ok(match cache {
        Some(cache) => cache.insert(image),
        None => image,
    })
}

#[async_trait]
impl Handler for RasterHandler {
    async fn read(&self, spec: &Specification) -> Result<Arc<dyn Reader>, HandlerError> {
        let content = self
            .storage
            .download(spec.location())
            .await
            .map_err(|e| match e {
                StorageError::NotFound(_) => HandlerError::Read {
                    location: spec.location().to_string(),
                    reason: "no such object".to_string(),
                },
                other => other.into(),
            })?;

        let source = spec.clone();
        let reader =
            tokio::task::spawn_blocking(move || RasterReader::decode(source, content)).await??;
        tracing::debug!(
            location = spec.location(),
            width = reader.image.width(),
            height = reader.image.height(),
            "Decoded raster source"
        );
        Ok(Arc::new(reader))
    }

    async fn create_generator(
        &self,
        reader: Arc<dyn Reader>,
        target: &Specification,
        filters: &[Arc<dyn Filter>],
    ) -> Result<Box<dyn Generator>, HandlerError> {
        let filters = filters
            .iter()
            .map(|filter| {
                filter
                    .as_any()
                    .downcast_ref::<RasterFilter>()
                    .copied()
                    .ok_or_else(|| HandlerError::UnsupportedFilter(filter.name().to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let image = source_image(reader.as_ref()).await?;

        Ok(Box::new(RasterGenerator {
            image,
            filters,
            size: target.size(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::RawReader;
    use image::{GenericImageView, Rgb, RgbImage};

    fn sample_png(width: u32, height: u32) -> Bytes {
        let image = RgbImage::from_fn(width, height, |x, _| {
            if x == 0 { Rgb([255, 0, 0]) } else { Rgb([0, 0, 255]) }
        });
        let mut buffer = Vec::new();
        DynamicImage::ImageRgb8(image)
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        Bytes::from(buffer)
    }

    async fn handler_with_png(key: &str, width: u32, height: u32) -> RasterHandler {
        let storage = StorageClient::in_memory();
        storage
            .upload(key, sample_png(width, height), &mime::IMAGE_PNG)
            .await
            .unwrap();
        RasterHandler::new(storage)
    }

    #[tokio::test]
    async fn test_read_decodes_source() {
        let handler = handler_with_png("in.png", 4, 2).await;
        let reader = handler
            .read(&Specification::new("raster", "in.png"))
            .await
            .unwrap();

        let raster = reader.as_any().downcast_ref::<RasterReader>().unwrap();
        assert_eq!(raster.image().dimensions(), (4, 2));
    }

    #[tokio::test]
    async fn test_read_rejects_undecodable() {
        let storage = StorageClient::in_memory();
        storage
            .upload("bad.png", Bytes::from_static(b"not an image"), &mime::IMAGE_PNG)
            .await
            .unwrap();
        let handler = RasterHandler::new(storage);

        let result = handler.read(&Specification::new("raster", "bad.png")).await;
        assert!(matches!(result, Err(HandlerError::Decode(_))));
    }

    #[tokio::test]
    async fn test_generator_resizes_to_target() {
        let handler = handler_with_png("in.png", 4, 2).await;
        let reader = handler
            .read(&Specification::new("raster", "in.png"))
            .await
            .unwrap();
        let target: Specification = "raster:out.png@8x6".parse().unwrap();

        let artifact = handler
            .create_generator(reader, &target, &[])
            .await
            .unwrap()
            .generate()
            .await
            .unwrap();
        let png = artifact.encode(Format::Png, &EncodingOptions::default()).unwrap();

        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.dimensions(), (8, 6));
    }

    #[tokio::test]
    async fn test_filters_apply_in_order() {
        let handler = handler_with_png("in.png", 2, 1).await;
        let reader = handler
            .read(&Specification::new("raster", "in.png"))
            .await
            .unwrap();
        let filters: Vec<Arc<dyn Filter>> = vec![Arc::new(RasterFilter::FlipHorizontal)];

        let artifact = handler
            .create_generator(reader, &Specification::new("raster", "out.bin"), &filters)
            .await
            .unwrap()
            .generate()
            .await
            .unwrap();
        let raw = artifact.encode(Format::Raw, &EncodingOptions::default()).unwrap();

        // red pixel moved from the left edge to the right edge
        assert_eq!(&raw[..], &[0, 0, 255, 255, 0, 0]);
    }

    #[tokio::test]
    async fn test_accepts_foreign_reader() {
        let handler = RasterHandler::new(StorageClient::in_memory());
        let reader: Arc<dyn Reader> = Arc::new(RawReader::new(
            Specification::new("raw", "in.png"),
            sample_png(3, 3),
        ));

        let artifact = handler
            .create_generator(reader, &Specification::new("raster", "out.jpg"), &[])
            .await
            .unwrap()
            .generate()
            .await
            .unwrap();
        let jpeg = artifact
            .encode(Format::Jpeg, &EncodingOptions::new().with_quality(70))
            .unwrap();

        assert_eq!(image::guess_format(&jpeg).unwrap(), ImageFormat::Jpeg);
    }

    #[derive(Debug)]
    struct Sharpen;

    impl Filter for Sharpen {
        fn name(&self) -> &str {
            "sharpen"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[tokio::test]
    async fn test_rejects_unknown_filter() {
        let handler = handler_with_png("in.png", 2, 2).await;
        let reader = handler
            .read(&Specification::new("raster", "in.png"))
            .await
            .unwrap();
        let filters: Vec<Arc<dyn Filter>> = vec![Arc::new(Sharpen)];

        let result = handler
            .create_generator(reader, &Specification::new("raster", "out.png"), &filters)
            .await;
        assert!(matches!(result, Err(HandlerError::UnsupportedFilter(ref name)) if name == "sharpen"));
    }

    #[test]
    fn test_encode_all_formats() {
        let artifact = RasterArtifact(DynamicImage::new_rgba8(2, 2));
        let options = EncodingOptions::default();

        for (format, expected) in [
            (Format::Jpeg, ImageFormat::Jpeg),
            (Format::Png, ImageFormat::Png),
            (Format::Gif, ImageFormat::Gif),
            (Format::Bmp, ImageFormat::Bmp),
        ] {
            let bytes = artifact.encode(format, &options).unwrap();
            assert_eq!(image::guess_format(&bytes).unwrap(), expected);
        }

        let raw = artifact.encode(Format::Raw, &options).unwrap();
        assert_eq!(raw.len(), 2 * 2 * 4);
    }

    #[test]
    fn test_gif_accepts_grayscale_and_deep_images() {
        let options = EncodingOptions::default();
        let gray = RasterArtifact(RasterFilter::Grayscale.apply(&DynamicImage::new_rgb8(2, 2)));
        let deep = RasterArtifact(DynamicImage::new_rgb16(2, 2));

        for artifact in [gray, deep] {
            let bytes = artifact.encode(Format::Gif, &options).unwrap();
            assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Gif);
            assert_eq!(image::load_from_memory(&bytes).unwrap().dimensions(), (2, 2));
        }
    }

    #[tokio::test]
    async fn test_foreign_reader_decoded_once_across_targets() {
        let handler = RasterHandler::new(StorageClient::in_memory());
        let reader: Arc<dyn Reader> = Arc::new(RawReader::new(
            Specification::new("raw", "in.png"),
            sample_png(3, 2),
        ));

        let mut images = Vec::new();
        for location in ["a.png", "b.png", "c.png"] {
            handler
                .create_generator(reader.clone(), &Specification::new("raster", location), &[])
                .await
                .unwrap();
            images.push(source_image(reader.as_ref()).await.unwrap());
        }

        let cached = reader.decode_cache().unwrap().get::<DynamicImage>().unwrap();
        assert!(images.iter().all(|image| Arc::ptr_eq(image, &cached)));
        assert_eq!(cached.dimensions(), (3, 2));
    }

    #[tokio::test]
    async fn test_cached_decoding_skips_content() {
        let handler = RasterHandler::new(StorageClient::in_memory());
        // content is not an image, so any decode attempt would fail
        let reader: Arc<dyn Reader> = Arc::new(RawReader::new(
            Specification::new("raw", "in.bin"),
            Bytes::from_static(b"not an image"),
        ));
        reader
            .decode_cache()
            .unwrap()
            .insert(Arc::new(DynamicImage::new_rgb8(5, 4)));

        for location in ["a.png", "b.png", "c.png"] {
            let artifact = handler
                .create_generator(reader.clone(), &Specification::new("raster", location), &[])
                .await
                .unwrap()
                .generate()
                .await
                .unwrap();
            let png = artifact.encode(Format::Png, &EncodingOptions::default()).unwrap();
            assert_eq!(image::load_from_memory(&png).unwrap().dimensions(), (5, 4));
        }
    }

    #[test]
    fn test_filter_parse() {
        assert_eq!("Grayscale".parse::<RasterFilter>().unwrap(), RasterFilter::Grayscale);
        assert_eq!("fliph".parse::<RasterFilter>().unwrap(), RasterFilter::FlipHorizontal);
        assert!("blur".parse::<RasterFilter>().is_err());
    }

    #[test]
    fn test_png_compression_mapping() {
        assert!(matches!(png_compression(Some(1)), CompressionType::Fast));
        assert!(matches!(png_compression(None), CompressionType::Default));
        assert!(matches!(png_compression(Some(9)), CompressionType::Best));
    }
}

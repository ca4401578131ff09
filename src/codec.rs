//! PNG encode/decode on top of the `png` crate.
//!
//! Every decoded image is normalized to RGBA8 so the diff engine only ever
//! sees one pixel layout.

use crate::{Error, RasterImage, Result};
use log::debug;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Decode PNG bytes into an RGBA8 raster.
pub fn decode(bytes: &[u8]) -> Result<RasterImage> {
    let mut decoder = png::Decoder::new(bytes);
    // Palette -> RGB, low bit depth -> 8 bit, tRNS -> alpha; 16 bit -> 8 bit
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder.read_info()?;
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf)?;
    buf.truncate(info.buffer_size());

    let pixels = match info.color_type {
        png::ColorType::Rgba => buf,
        png::ColorType::Rgb => buf
            .chunks_exact(3)
            .flat_map(|c| [c[0], c[1], c[2], 255])
            .collect(),
        png::ColorType::GrayscaleAlpha => buf
            .chunks_exact(2)
            .flat_map(|c| [c[0], c[0], c[0], c[1]])
            .collect(),
        png::ColorType::Grayscale => buf.iter().flat_map(|&g| [g, g, g, 255]).collect(),
        other => {
            return Err(Error::CodecFailure(format!("unsupported PNG color type {:?}", other)));
        }
    };

    RasterImage::from_rgba(info.width, info.height, pixels)
}

/// Encode an RGBA8 raster as PNG bytes.
pub fn encode(image: &RasterImage) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, image.width, image.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&image.pixels)?;
        writer.finish()?;
    }
    Ok(out)
}

/// Read and decode a PNG file. A missing file is reported as `MissingBaseline`.
pub fn read_png(path: &Path) -> Result<RasterImage> {
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(Error::MissingBaseline(path.to_path_buf()));
        }
        Err(e) => return Err(Error::Io(e)),
    };
    debug!("read {} bytes from {}", bytes.len(), path.display());
    decode(&bytes)
}

/// Encode and write a PNG file, creating parent directories as needed.
pub fn write_png(path: &Path, image: &RasterImage) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let bytes = encode(image)?;
    fs::write(path, &bytes)?;
    debug!("wrote {}x{} PNG to {}", image.width, image.height, path.display());
    Ok(())
}

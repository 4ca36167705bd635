//! Native GeoTIFF reading/writing
//!
//! Uses the `tiff` crate for TIFF I/O plus the GeoTIFF tags needed to
//! georeference a population grid: ModelPixelScale/ModelTiepoint for the
//! transform, the GeoKey directory for an EPSG code, and GDAL_NODATA for the
//! nodata sentinel.

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster, RasterElement};
use std::fs::File;
use std::io::Cursor;
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::Gray32Float;
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

// GeoKey ids inside the key directory
const KEY_GEOGRAPHIC_TYPE: u64 = 2048;
const KEY_PROJECTED_CS_TYPE: u64 = 3072;

/// Read a GeoTIFF file into a Raster
pub fn read_geotiff<T, P>(path: P) -> Result<Raster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::open(path.as_ref())?;
    decode_geotiff(file)
}

/// Read a GeoTIFF from an in-memory buffer into a Raster
///
/// Same as `read_geotiff` but operates on a byte slice. This is the entry
/// point for grids handed over by a remote fetcher that never touches disk.
pub fn read_geotiff_from_buffer<T>(data: &[u8]) -> Result<Raster<T>>
where
    T: RasterElement,
{
    let cursor = Cursor::new(data);
    decode_geotiff(cursor)
}

/// Internal: decode a GeoTIFF from any `Read + Seek` source
fn decode_geotiff<T, R>(reader: R) -> Result<Raster<T>>
where
    T: RasterElement,
    R: std::io::Read + std::io::Seek,
{
    let mut decoder = Decoder::new(reader)
        .map_err(|e| Error::Decode(format!("TIFF decode error: {}", e)))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| Error::Decode(format!("Cannot read dimensions: {}", e)))?;

    let rows = height as usize;
    let cols = width as usize;

    let result = decoder
        .read_image()
        .map_err(|e| Error::Decode(format!("Cannot read image data: {}", e)))?;

    let data: Vec<T> = match result {
        DecodingResult::F32(buf) => cast_buffer(&buf),
        DecodingResult::F64(buf) => cast_buffer(&buf),
        DecodingResult::U8(buf) => cast_buffer(&buf),
        DecodingResult::U16(buf) => cast_buffer(&buf),
        DecodingResult::U32(buf) => cast_buffer(&buf),
        DecodingResult::I8(buf) => cast_buffer(&buf),
        DecodingResult::I16(buf) => cast_buffer(&buf),
        DecodingResult::I32(buf) => cast_buffer(&buf),
        _ => {
            return Err(Error::UnsupportedDataType(
                "Unsupported TIFF pixel format".to_string(),
            ))
        }
    };

    if data.len() != rows * cols {
        return Err(Error::InvalidDimensions {
            width: cols,
            height: rows,
        });
    }

    let mut raster = Raster::from_vec(data, rows, cols)?;

    if let Ok(transform) = read_geotransform(&mut decoder) {
        raster.set_transform(transform);
    }
    raster.set_crs(read_crs(&mut decoder));
    raster.set_nodata(read_nodata(&mut decoder));

    Ok(raster)
}

fn cast_buffer<S, T>(buf: &[S]) -> Vec<T>
where
    S: Copy + num_traits::NumCast,
    T: RasterElement,
{
    buf.iter()
        .map(|&v| num_traits::cast(v).unwrap_or(T::default_nodata()))
        .collect()
}

/// Attempt to read GeoTransform from TIFF tags (ModelTiepoint + ModelPixelScale)
fn read_geotransform<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
) -> Result<GeoTransform> {
    let scale = decoder
        .get_tag_f64_vec(Tag::ModelPixelScaleTag)
        .map_err(|_| Error::Decode("No pixel scale tag".into()))?;

    let tiepoint = decoder
        .get_tag_f64_vec(Tag::ModelTiepointTag)
        .map_err(|_| Error::Decode("No tiepoint tag".into()))?;

    if scale.len() >= 2 && tiepoint.len() >= 6 {
        // tiepoint: [I, J, K, X, Y, Z]; scale: [ScaleX, ScaleY, ScaleZ]
        let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
        let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
        let pixel_width = scale[0];
        let pixel_height = -scale[1]; // Negative for north-up

        return Ok(GeoTransform::new(origin_x, origin_y, pixel_width, pixel_height));
    }

    Err(Error::Decode("Cannot determine geotransform".into()))
}

/// Read an EPSG code from the GeoKey directory, if present.
///
/// Checks the geographic CS key first (WorldPop grids are EPSG:4326), then
/// the projected CS key. Keys come in groups of four:
/// (key id, location, count, value).
fn read_crs<R: std::io::Read + std::io::Seek>(decoder: &mut Decoder<R>) -> Option<CRS> {
    let keys = decoder.get_tag_u64_vec(Tag::GeoKeyDirectoryTag).ok()?;

    let mut geographic = None;
    let mut projected = None;

    for entry in keys.chunks_exact(4).skip(1) {
        match entry[0] {
            KEY_GEOGRAPHIC_TYPE if entry[1] == 0 => geographic = Some(entry[3] as u32),
            KEY_PROJECTED_CS_TYPE if entry[1] == 0 => projected = Some(entry[3] as u32),
            _ => {}
        }
    }

    projected
        .or(geographic)
        .filter(|&code| code != 0 && code != u16::MAX as u32)
        .map(CRS::from_epsg)
}

/// Read the GDAL_NODATA ASCII tag, if present
fn read_nodata<T, R>(decoder: &mut Decoder<R>) -> Option<T>
where
    T: RasterElement,
    R: std::io::Read + std::io::Seek,
{
    let text = decoder.get_tag_ascii_string(Tag::GdalNodata).ok()?;
    let value: f64 = text.trim().trim_end_matches('\0').parse().ok()?;
    num_traits::cast(value)
}

/// Write a Raster to a GeoTIFF file
///
/// Writes as 32-bit float with transform, minimal GeoKeys and nodata tags.
/// Used to persist distance rasters alongside their population source.
pub fn write_geotiff<T, P>(raster: &Raster<T>, path: P) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::create(path.as_ref())?;
    encode_geotiff(raster, file)
}

/// Write a Raster to an in-memory GeoTIFF buffer
pub fn write_geotiff_to_buffer<T>(raster: &Raster<T>) -> Result<Vec<u8>>
where
    T: RasterElement,
{
    let mut buf = Vec::new();
    encode_geotiff(raster, Cursor::new(&mut buf))?;
    Ok(buf)
}

/// Internal: encode a Raster as GeoTIFF into any `Write + Seek` sink
fn encode_geotiff<T, W>(raster: &Raster<T>, writer: W) -> Result<()>
where
    T: RasterElement,
    W: std::io::Write + std::io::Seek,
{
    let mut encoder = TiffEncoder::new(writer)
        .map_err(|e| Error::Decode(format!("TIFF encoder error: {}", e)))?;

    let (rows, cols) = raster.shape();

    let data: Vec<f32> = raster
        .data()
        .iter()
        .map(|&v| num_traits::cast(v).unwrap_or(f32::NAN))
        .collect();

    let mut image = encoder
        .new_image::<Gray32Float>(cols as u32, rows as u32)
        .map_err(|e| Error::Decode(format!("Cannot create TIFF image: {}", e)))?;

    let gt = raster.transform();

    let scale = vec![gt.pixel_width, gt.pixel_height.abs(), 0.0];
    image
        .encoder()
        .write_tag(Tag::ModelPixelScaleTag, scale.as_slice())
        .map_err(|e| Error::Decode(format!("Cannot write scale tag: {}", e)))?;

    let tiepoint = vec![0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
    image
        .encoder()
        .write_tag(Tag::ModelTiepointTag, tiepoint.as_slice())
        .map_err(|e| Error::Decode(format!("Cannot write tiepoint tag: {}", e)))?;

    // GTModelTypeGeoKey=2 (Geographic), GTRasterTypeGeoKey=1 (PixelIsArea),
    // GeographicTypeGeoKey from the raster CRS when it carries an EPSG code.
    let epsg = raster.crs().and_then(|c| c.epsg()).unwrap_or(4326) as u16;
    let geokeys: Vec<u16> = vec![
        1, 1, 0, 3, // Version 1.1.0, 3 keys
        1024, 0, 1, 2, // GTModelTypeGeoKey = ModelTypeGeographic
        1025, 0, 1, 1, // GTRasterTypeGeoKey = RasterPixelIsArea
        2048, 0, 1, epsg, // GeographicTypeGeoKey
    ];
    image
        .encoder()
        .write_tag(Tag::GeoKeyDirectoryTag, geokeys.as_slice())
        .map_err(|e| Error::Decode(format!("Cannot write geokey tag: {}", e)))?;

    if let Some(nd) = raster.nodata().and_then(|v| v.to_f64()) {
        let text = format!("{}", nd);
        image
            .encoder()
            .write_tag(Tag::GdalNodata, text.as_str())
            .map_err(|e| Error::Decode(format!("Cannot write nodata tag: {}", e)))?;
    }

    image
        .write_data(&data)
        .map_err(|e| Error::Decode(format!("Cannot write image data: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_geotiff_buffer_roundtrip() {
        let mut raster: Raster<f32> = Raster::new(8, 8);
        raster.set_transform(GeoTransform::new(-13.5, 9.5, 0.05, -0.05));
        raster.set_crs(Some(CRS::wgs84()));
        raster.set_nodata(Some(-99999.0));
        for row in 0..8 {
            for col in 0..8 {
                raster.set(row, col, (row * 8 + col) as f32).unwrap();
            }
        }

        let buf = write_geotiff_to_buffer(&raster).unwrap();
        let back: Raster<f32> = read_geotiff_from_buffer(&buf).unwrap();

        assert_eq!(back.shape(), (8, 8));
        assert_eq!(back.get(3, 4).unwrap(), 28.0);
        assert_relative_eq!(back.transform().origin_x, -13.5, epsilon = 1e-9);
        assert_relative_eq!(back.transform().pixel_height, -0.05, epsilon = 1e-9);
        assert_eq!(back.crs().and_then(|c| c.epsg()), Some(4326));
        assert_eq!(back.nodata(), Some(-99999.0));
    }

    #[test]
    fn test_georeferencing_tags_survive_roundtrip() {
        // The scale/tiepoint/geokey/nodata tags must be written and read
        // under their registered TIFF ids, or the reader silently falls
        // back to the default transform and unfiltered nodata.
        let mut raster: Raster<f64> = Raster::filled(3, 3, 1.0);
        raster.set_transform(GeoTransform::new(-11.25, 7.75, 0.00083, -0.00083));
        raster.set_crs(Some(CRS::from_epsg(4326)));
        raster.set_nodata(Some(-99999.0));

        let buf = write_geotiff_to_buffer(&raster).unwrap();
        let back: Raster<f64> = read_geotiff_from_buffer(&buf).unwrap();

        assert_ne!(*back.transform(), GeoTransform::default());
        assert_relative_eq!(back.transform().origin_x, -11.25, epsilon = 1e-9);
        assert_relative_eq!(back.transform().origin_y, 7.75, epsilon = 1e-9);
        assert_relative_eq!(back.transform().pixel_width, 0.00083, epsilon = 1e-9);
        assert_relative_eq!(back.transform().pixel_height, -0.00083, epsilon = 1e-9);
        assert!(back.crs().unwrap().is_equivalent(&CRS::wgs84()));
        assert_eq!(back.nodata(), Some(-99999.0));
        assert!(back.is_nodata(-99999.0));
    }

    #[test]
    fn test_decode_garbage_fails() {
        let result: Result<Raster<f32>> = read_geotiff_from_buffer(&[0u8; 16]);
        assert!(result.is_err());
    }
}

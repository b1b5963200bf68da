use nom_exif::*;
use std::io::Cursor;

// IFD1 tags locating the embedded JPEG thumbnail
const TAG_JPEG_INTERCHANGE_FORMAT: u16 = 0x0201;
const TAG_JPEG_INTERCHANGE_FORMAT_LENGTH: u16 = 0x0202;

/// Offset and length of the IFD1 thumbnail, relative to the TIFF header.
pub(crate) fn locate(image: &[u8]) -> Option<(usize, usize)> {
    let mut parser = MediaParser::new();
    let ms = MediaSource::seekable(Cursor::new(image.to_vec())).ok()?;

    let iter: ExifIter = match parser.parse(ms) {
        Ok(iter) => iter,
        Err(_) => {
            log::debug!("No EXIF data found for thumbnail lookup");
            return None;
        }
    };
    let exif: Exif = iter.into();

    let offset = entry_to_usize(exif.get_by_ifd_tag_code(1, TAG_JPEG_INTERCHANGE_FORMAT)?)?;
    let length = entry_to_usize(exif.get_by_ifd_tag_code(1, TAG_JPEG_INTERCHANGE_FORMAT_LENGTH)?)?;
    (length > 0).then_some((offset, length))
}

/// Slice the thumbnail out of a TIFF payload.
pub(crate) fn extract(tiff: &[u8], offset: usize, length: usize) -> Option<&[u8]> {
    let data = tiff.get(offset..offset.checked_add(length)?)?;
    data.starts_with(&[0xFF, 0xD8]).then_some(data)
}

fn entry_to_usize(val: &EntryValue) -> Option<usize> {
    val.to_string().trim().parse().ok()
}

use crate::{Header, ImageError, ImageReader, ImageWriter, MAX_ALIGN, TypeCode};

#[test]
fn writer_pads_to_boundary() {
    let mut out = Vec::new();
    let mut w = ImageWriter::new(&mut out);
    w.put(7u32).unwrap();
    assert_eq!(w.pos(), 4);
    w.pad().unwrap();
    assert_eq!(w.pos(), MAX_ALIGN);
    w.pad().unwrap();
    assert_eq!(w.pos(), MAX_ALIGN);
    assert_eq!(out.len(), MAX_ALIGN);
    assert!(out[4..].iter().all(|&b| b == 0));
}

#[test]
fn scalars_round_trip_through_stream() {
    let mut out = Vec::new();
    let mut w = ImageWriter::new(&mut out);
    w.put(0x11u8).unwrap();
    w.put(0x2233u16).unwrap();
    w.put(0x4455_6677u32).unwrap();
    w.put(0x8899_AABB_CCDD_EEFFu64).unwrap();
    w.pad().unwrap();

    let mut r = ImageReader::new(&out[..]);
    assert_eq!(r.take::<u8>().unwrap(), 0x11);
    assert_eq!(r.take::<u16>().unwrap(), 0x2233);
    assert_eq!(r.take::<u32>().unwrap(), 0x4455_6677);
    assert_eq!(r.take::<u64>().unwrap(), 0x8899_AABB_CCDD_EEFF);
    r.skip_pad().unwrap();
    assert_eq!(r.pos(), out.len());
}

#[test]
fn header_round_trip_through_stream() {
    let h = Header::new(TypeCode::Flat, 8);
    let mut out = Vec::new();
    let mut w = ImageWriter::new(&mut out);
    w.put_header(&h).unwrap();
    assert_eq!(out.len(), 32);

    let mut r = ImageReader::new(&out[..]);
    assert_eq!(r.take_header().unwrap(), h);
    assert_eq!(r.pos(), 32);
}

#[test]
fn short_read_is_truncated() {
    let bytes = [1u8, 2, 3];
    let mut r = ImageReader::new(&bytes[..]);
    assert!(matches!(
        r.take::<u32>(),
        Err(ImageError::Truncated)
    ));
}

#[test]
fn eof_inside_padding_is_truncated() {
    let mut out = Vec::new();
    let mut w = ImageWriter::new(&mut out);
    w.put(1u32).unwrap();
    w.pad().unwrap();

    let mut r = ImageReader::new(&out[..6]);
    r.take::<u32>().unwrap();
    assert!(matches!(r.skip_pad(), Err(ImageError::Truncated)));
}

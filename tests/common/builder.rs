//! Builders for synthetic M4A byte streams.

#![allow(dead_code)]

/// A plain atom: 32-bit size, type, payload.
pub fn atom(kind: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = ((payload.len() + 8) as u32).to_be_bytes().to_vec();
    out.extend_from_slice(kind);
    out.extend_from_slice(payload);
    out
}

/// An atom using the 64-bit extended size field.
pub fn extended_atom(kind: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = 1u32.to_be_bytes().to_vec();
    out.extend_from_slice(kind);
    out.extend_from_slice(&((payload.len() + 16) as u64).to_be_bytes());
    out.extend_from_slice(payload);
    out
}

/// A container atom holding `children` back to back.
pub fn container(kind: &[u8; 4], children: &[Vec<u8>]) -> Vec<u8> {
    atom(kind, &children.concat())
}

pub fn ftyp(brand: &[u8; 4], version: u32) -> Vec<u8> {
    let mut payload = brand.to_vec();
    payload.extend_from_slice(&version.to_be_bytes());
    payload.extend_from_slice(b"M4A mp42isom");
    atom(b"ftyp", &payload)
}

/// Version 0 timing header shared by mvhd and mdhd.
fn timing_v0(scale: u32, units: u32) -> Vec<u8> {
    let mut payload = vec![0u8; 4]; // version, flags
    payload.extend_from_slice(&[0u8; 8]); // created, modified
    payload.extend_from_slice(&scale.to_be_bytes());
    payload.extend_from_slice(&units.to_be_bytes());
    payload
}

/// Version 1 timing header with 64-bit dates and duration.
fn timing_v1(scale: u32, units: u64) -> Vec<u8> {
    let mut payload = vec![1u8, 0, 0, 0];
    payload.extend_from_slice(&[0u8; 16]);
    payload.extend_from_slice(&scale.to_be_bytes());
    payload.extend_from_slice(&units.to_be_bytes());
    payload
}

/// mvhd with rate 1.0 and volume 1.0.
pub fn mvhd(scale: u32, units: u32) -> Vec<u8> {
    let mut payload = timing_v0(scale, units);
    payload.extend_from_slice(&[0x00, 0x01, 0x00, 0x00]); // rate
    payload.extend_from_slice(&[0x01, 0x00]); // volume
    payload.extend_from_slice(&[0u8; 10]); // reserved
    atom(b"mvhd", &payload)
}

pub fn mvhd_v1(scale: u32, units: u64) -> Vec<u8> {
    let mut payload = timing_v1(scale, units);
    payload.extend_from_slice(&[0x00, 0x01, 0x00, 0x00, 0x01, 0x00]);
    atom(b"mvhd", &payload)
}

/// trak/mdia/mdhd
pub fn trak(scale: u32, units: u32) -> Vec<u8> {
    let mut mdhd = timing_v0(scale, units);
    mdhd.extend_from_slice(&[0u8; 4]); // language, quality
    let mdia = container(b"mdia", &[atom(b"mdhd", &mdhd), atom(b"hdlr", &[0u8; 24])]);
    container(b"trak", &[atom(b"tkhd", &[0u8; 84]), mdia])
}

/// An ilst item wrapping a single data atom.
pub fn item(kind: &[u8; 4], value: &[u8]) -> Vec<u8> {
    let mut data = vec![0, 0, 0, 1, 0, 0, 0, 0];
    data.extend_from_slice(value);
    atom(kind, &atom(b"data", &data))
}

/// udta/meta/ilst around `items`.
pub fn udta(items: &[Vec<u8>]) -> Vec<u8> {
    let ilst = container(b"ilst", items);
    let mut meta = vec![0u8; 4];
    meta.extend(atom(b"hdlr", &[0u8; 25]));
    meta.extend(ilst);
    container(b"udta", &[atom(b"meta", &meta)])
}

/// A complete file: ftyp, moov with the given children, then mdat.
pub fn m4a(moov_children: &[Vec<u8>]) -> Vec<u8> {
    let mut file = ftyp(b"M4A ", 0x200);
    file.extend(container(b"moov", moov_children));
    file.extend(atom(b"mdat", &[0u8; 32]));
    file
}

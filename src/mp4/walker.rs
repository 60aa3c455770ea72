// Container traversal
//
// ftyp -> moov -> { mvhd, trak/mdia/mdhd, udta/meta/ilst }
//
// Everything up to and including the moov children is mandatory: a fault
// there aborts the parse. Faults inside a single ilst item only cost that
// item.

use crate::error::Result;
use crate::metadata::AudioMetadata;
use crate::mp4::atom::{AtomNode, FourCC};
use crate::mp4::atoms;
use crate::mp4::tags::{decode_data, TagContext};
use crate::utils::encoding::TextEncoding;
use crate::utils::io::ByteSource;

/// Brands of files this reader was built for.
const AUDIO_BRANDS: [&str; 2] = ["M4A", "M4P"];
/// Brands that usually parse fine but are not audio-only containers.
const EXPERIMENTAL_BRANDS: [&str; 4] = ["M4V", "MP4", "mp42", "isom"];

/// Walks one file's atom tree into an [`AudioMetadata`] accumulator.
pub struct ContainerWalker<'m, 'c> {
    metadata: &'m mut AudioMetadata,
    ctx: TagContext<'c>,
}

impl<'m, 'c> ContainerWalker<'m, 'c> {
    pub fn new(metadata: &'m mut AudioMetadata, ctx: TagContext<'c>) -> Self {
        ContainerWalker { metadata, ctx }
    }

    /// Run the full traversal from the root atom.
    pub fn walk(&mut self, root: &mut AtomNode<'_>) -> Result<()> {
        log::trace!("{}", root);
        {
            let mut ftyp = root.next_child_of(&[atoms::FTYP])?;
            self.ftyp(&mut ftyp)?;
        }
        let mut moov = root.next_child_up_to(&[atoms::MOOV])?;
        self.moov(&mut moov)
    }

    fn ftyp(&mut self, atom: &mut AtomNode<'_>) -> Result<()> {
        log::trace!("{}", atom);

        let brand = atom.read_string(4, TextEncoding::Latin1)?.trim().to_string();
        if EXPERIMENTAL_BRANDS.contains(&brand.as_str()) {
            log::warn!("{}: brand={} (experimental)", atom.path(), brand);
        } else if !AUDIO_BRANDS.contains(&brand.as_str()) {
            log::warn!("{}: brand={} (expected M4A or M4P)", atom.path(), brand);
        }
        self.metadata.brand = Some(brand);
        self.metadata.version = Some(atom.read_u32()?);
        Ok(())
    }

    fn moov(&mut self, atom: &mut AtomNode<'_>) -> Result<()> {
        log::trace!("{}", atom);

        while atom.has_more_children() {
            let mut child = atom.next_child()?;
            match child.kind() {
                atoms::MVHD => self.mvhd(&mut child)?,
                atoms::TRAK => self.trak(&mut child)?,
                atoms::UDTA => self.udta(&mut child)?,
                _ => log::trace!("{}: skipped", child.path()),
            }
        }
        // the declared moov length must be backed by real bytes
        atom.skip_all()
    }

    /// Read a version dependent time scale and duration, in that order.
    fn timing(atom: &mut AtomNode<'_>) -> Result<(u32, u64)> {
        let version = atom.read_u8()?;
        atom.skip(3)?; // flags
        atom.skip(if version == 1 { 16 } else { 8 })?; // created/modified date

        let scale = atom.read_u32()?;
        let units = if version == 1 {
            atom.read_u64()?
        } else {
            atom.read_u32()? as u64
        };
        Ok((scale, units))
    }

    fn offer_duration(&mut self, atom: &AtomNode<'_>, scale: u32, units: u64) {
        if scale == 0 {
            log::warn!("{}: zero time scale, duration unknown", atom.path());
            return;
        }
        let millis = 1000u128 * units as u128 / scale as u128;
        let millis = u64::try_from(millis).unwrap_or(u64::MAX);
        self.metadata.offer_duration(atom.path(), millis);
    }

    fn mvhd(&mut self, atom: &mut AtomNode<'_>) -> Result<()> {
        log::trace!("{}", atom);

        let (scale, units) = Self::timing(atom)?;
        self.offer_duration(atom, scale, units);

        self.metadata.speed = Some(atom.read_integer_fixed_point()?);
        self.metadata.volume = Some(atom.read_short_fixed_point()?);
        Ok(())
    }

    fn trak(&mut self, atom: &mut AtomNode<'_>) -> Result<()> {
        log::trace!("{}", atom);

        let mut mdia = atom.next_child_up_to(&[atoms::MDIA])?;
        log::trace!("{}", mdia);
        let mut mdhd = mdia.next_child_of(&[atoms::MDHD])?;
        self.mdhd(&mut mdhd)
    }

    fn mdhd(&mut self, atom: &mut AtomNode<'_>) -> Result<()> {
        log::trace!("{}", atom);

        let (sample_rate, samples) = Self::timing(atom)?;
        self.offer_duration(atom, sample_rate, samples);
        Ok(())
    }

    fn udta(&mut self, atom: &mut AtomNode<'_>) -> Result<()> {
        log::trace!("{}", atom);

        let mut meta = match atom.find_child(&[atoms::META])? {
            Some(meta) => meta,
            None => {
                log::debug!("{}: no meta", atom.path());
                return Ok(());
            }
        };
        log::trace!("{}", meta);
        meta.skip(4)?; // version/flags

        match meta.find_child(&[atoms::ILST])? {
            Some(mut ilst) => self.ilst(&mut ilst),
            None => {
                log::debug!("{}: no ilst", meta.path());
                Ok(())
            }
        }
    }

    fn ilst(&mut self, atom: &mut AtomNode<'_>) -> Result<()> {
        log::trace!("{}", atom);

        while atom.has_more_children() {
            let mut item = atom.next_child()?;
            log::trace!("{}", item);

            if item.remaining() == 0 {
                log::trace!("{}: contains no value", item.path());
                continue;
            }

            if let Err(e) = self.item(&mut item) {
                log::warn!("{}: {}", item.path(), e);
            }
        }
        Ok(())
    }

    fn item(&mut self, item: &mut AtomNode<'_>) -> Result<()> {
        let kind: FourCC = item.kind();
        match item.find_child(&[atoms::DATA])? {
            Some(mut data) => decode_data(&mut data, kind, self.metadata, &self.ctx),
            None => {
                log::debug!("{}: no data atom", item.path());
                Ok(())
            }
        }
    }
}

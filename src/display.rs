//! Live preview from the renderer's tile stream.
//!
//! The renderer reports progress as a sequence of fixed size packets: a
//! big-endian 32 bit type tag followed by four 32 bit data words. Tile
//! packets are followed by the tile's pixels as RGBA byte quads. The
//! [`TileDecoder`] reads one packet per call and applies it to an
//! [`image::RgbaImage`] that a host can show or save.

use std::io::{self, Read};

use image::{Rgba, RgbaImage};
use log::{info, warn};

pub const PACKET_SIZE: usize = 20;

pub const TILE_UPDATE: i32 = 2;
pub const CONNECTION_DENIED: i32 = 3;
pub const FRAME_END: i32 = 4;
pub const IMAGE_BEGIN: i32 = 5;
pub const FRAME_START: i32 = 6;

/// Largest image a stream may announce, in pixels.
pub const MAX_IMAGE_PIXELS: u64 = 1 << 28;

/// Tile payloads are consumed through a buffer of this many bytes.
const PAYLOAD_CHUNK: usize = 64 * 1024;

/// Inclusive pixel bounds of a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileBounds {
    pub x_low: i32,
    pub x_high: i32,
    pub y_low: i32,
    pub y_high: i32,
}

impl TileBounds {
    pub fn width(&self) -> u64 {
        (self.x_high as i64 - self.x_low as i64 + 1).max(0) as u64
    }

    pub fn height(&self) -> u64 {
        (self.y_high as i64 - self.y_low as i64 + 1).max(0) as u64
    }

    /// Number of RGBA quads following the tile header.
    pub fn pixel_count(&self) -> u64 {
        self.width().saturating_mul(self.height())
    }

    /// Payload size in bytes, saturated for extents no stream can deliver.
    pub fn payload_len(&self) -> u64 {
        self.pixel_count().saturating_mul(4)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Packet {
    FrameStart { frame: i32 },
    ImageBegin { width: i32, height: i32, gamma: f32 },
    TileUpdate(TileBounds),
    FrameEnd,
    ConnectionDenied,
    Unknown { tag: i32, data: [i32; 4] },
}

impl Packet {
    pub fn parse(bytes: &[u8; PACKET_SIZE]) -> Self {
        let word = |i: usize| {
            i32::from_be_bytes([bytes[i * 4], bytes[i * 4 + 1], bytes[i * 4 + 2], bytes[i * 4 + 3]])
        };
        let tag = word(0);
        let data = [word(1), word(2), word(3), word(4)];
        match tag {
            FRAME_START => Packet::FrameStart { frame: data[0] },
            IMAGE_BEGIN => Packet::ImageBegin {
                width: data[0],
                height: data[1],
                gamma: f32::from_bits(data[2] as u32),
            },
            TILE_UPDATE => Packet::TileUpdate(TileBounds {
                x_low: data[0],
                x_high: data[1],
                y_low: data[2],
                y_high: data[3],
            }),
            FRAME_END => Packet::FrameEnd,
            CONNECTION_DENIED => Packet::ConnectionDenied,
            tag => Packet::Unknown { tag, data },
        }
    }

    /// Wire form of the packet header, unused words are zero.
    pub fn to_bytes(&self) -> [u8; PACKET_SIZE] {
        let (tag, data) = match *self {
            Packet::FrameStart { frame } => (FRAME_START, [frame, 0, 0, 0]),
            Packet::ImageBegin {
                width,
                height,
                gamma,
            } => (IMAGE_BEGIN, [width, height, gamma.to_bits() as i32, 0]),
            Packet::TileUpdate(b) => (TILE_UPDATE, [b.x_low, b.x_high, b.y_low, b.y_high]),
            Packet::FrameEnd => (FRAME_END, [0; 4]),
            Packet::ConnectionDenied => (CONNECTION_DENIED, [0; 4]),
            Packet::Unknown { tag, data } => (tag, data),
        };
        let mut bytes = [0; PACKET_SIZE];
        for (i, word) in std::iter::once(tag).chain(data).enumerate() {
            bytes[i * 4..i * 4 + 4].copy_from_slice(&word.to_be_bytes());
        }
        bytes
    }
}

/// What a decoded packet did, for the host to react on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DisplayEvent {
    FrameStarted(i32),
    ImageStarted { width: u32, height: u32, gamma: f32 },
    TileUpdated(TileBounds),
    FrameEnded,
    ConnectionDenied,
    Ignored(i32),
}

/// Decodes a tile stream into a live image buffer.
#[derive(Debug, Default)]
pub struct TileDecoder {
    image: Option<RgbaImage>,
    gamma: f32,
    frame: Option<i32>,
}

impl TileDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The live buffer, once an image was announced.
    pub fn image(&self) -> Option<&RgbaImage> {
        self.image.as_ref()
    }

    pub fn gamma(&self) -> f32 {
        self.gamma
    }

    pub fn frame(&self) -> Option<i32> {
        self.frame
    }

    /// Reads and applies exactly one packet. Meant to be called from the
    /// host's idle callback; blocks until the packet is complete.
    ///
    /// Returns `Ok(None)` when the stream ended cleanly between packets.
    pub fn check_stream<R: Read>(&mut self, stream: &mut R) -> io::Result<Option<DisplayEvent>> {
        let Some(header) = read_header(stream)? else {
            return Ok(None);
        };
        let packet = Packet::parse(&header);
        let event = match packet {
            Packet::TileUpdate(bounds) => self.read_tile(bounds, stream)?,
            packet => self.apply(packet),
        };
        Ok(Some(event))
    }

    /// Applies a header only packet. Tile packets need their pixels, see
    /// [`TileDecoder::apply_tile`].
    pub fn apply(&mut self, packet: Packet) -> DisplayEvent {
        match packet {
            Packet::FrameStart { frame } => {
                info!("  * starting to receive frame {}", frame);
                self.frame = Some(frame);
                DisplayEvent::FrameStarted(frame)
            }
            Packet::ImageBegin {
                width,
                height,
                gamma,
            } => {
                let width = width.max(0) as u32;
                let height = height.max(0) as u32;
                if width as u64 * height as u64 > MAX_IMAGE_PIXELS {
                    warn!(
                        "  * image of {} x {} exceeds {} pixels, ignored",
                        width, height, MAX_IMAGE_PIXELS
                    );
                    return DisplayEvent::Ignored(IMAGE_BEGIN);
                }
                info!(
                    "  * starting image ({} x {}), gamma={}",
                    width, height, gamma
                );
                self.image = Some(RgbaImage::new(width, height));
                self.gamma = gamma;
                DisplayEvent::ImageStarted {
                    width,
                    height,
                    gamma,
                }
            }
            Packet::TileUpdate(bounds) => {
                warn!("Tile {:?} arrived without pixel data", bounds);
                DisplayEvent::Ignored(TILE_UPDATE)
            }
            Packet::FrameEnd => {
                info!("  * done receiving frame");
                DisplayEvent::FrameEnded
            }
            Packet::ConnectionDenied => {
                warn!("  * connection denied!");
                DisplayEvent::ConnectionDenied
            }
            Packet::Unknown { tag, .. } => {
                warn!("  * unknown packet type {}", tag);
                DisplayEvent::Ignored(tag)
            }
        }
    }

    /// Copies a tile's RGBA quads into the live buffer, row by row. Pixels
    /// outside the current image are dropped.
    pub fn apply_tile(&mut self, bounds: TileBounds, pixels: &[u8]) -> DisplayEvent {
        if self.image.is_none() {
            warn!("Tile {:?} arrived before any image, dropped", bounds);
            return DisplayEvent::TileUpdated(bounds);
        }
        let quads = pixels.len() as u64 / 4;
        self.put_pixels(bounds, 0, &pixels[..(quads.min(bounds.pixel_count()) * 4) as usize]);
        DisplayEvent::TileUpdated(bounds)
    }

    /// Streams a tile's payload through a fixed buffer, so the header alone
    /// never decides how much memory is taken.
    fn read_tile<R: Read>(&mut self, bounds: TileBounds, stream: &mut R) -> io::Result<DisplayEvent> {
        if self.image.is_none() {
            warn!("Tile {:?} arrived before any image, dropped", bounds);
        }
        let total = bounds.payload_len();
        let mut buffer = vec![0; total.min(PAYLOAD_CHUNK as u64) as usize];
        let mut consumed = 0;
        while consumed < total {
            let len = (total - consumed).min(PAYLOAD_CHUNK as u64) as usize;
            stream.read_exact(&mut buffer[..len])?;
            self.put_pixels(bounds, consumed / 4, &buffer[..len]);
            consumed += len as u64;
        }
        Ok(DisplayEvent::TileUpdated(bounds))
    }

    /// Writes whole quads starting at tile pixel `first`.
    fn put_pixels(&mut self, bounds: TileBounds, first: u64, bytes: &[u8]) {
        let Some(image) = self.image.as_mut() else {
            return;
        };
        let width = bounds.width();
        if width == 0 {
            return;
        }
        for (i, rgba) in bytes.chunks_exact(4).enumerate() {
            let index = first + i as u64;
            let x = bounds.x_low as i64 + (index % width) as i64;
            let Some(y) = i64::try_from(index / width)
                .ok()
                .and_then(|row| row.checked_add(bounds.y_low as i64))
            else {
                continue;
            };
            if x < 0 || y < 0 || x >= image.width() as i64 || y >= image.height() as i64 {
                continue;
            }
            image.put_pixel(x as u32, y as u32, Rgba([rgba[0], rgba[1], rgba[2], rgba[3]]));
        }
    }
}

/// Reads a packet header, `None` on end of stream before the first byte.
fn read_header<R: Read>(stream: &mut R) -> io::Result<Option<[u8; PACKET_SIZE]>> {
    let mut header = [0; PACKET_SIZE];
    let mut filled = 0;
    while filled < PACKET_SIZE {
        match stream.read(&mut header[filled..]) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("stream ended inside a packet after {} bytes", filled),
                ));
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(Some(header))
}

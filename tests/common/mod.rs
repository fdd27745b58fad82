#![allow(dead_code)]

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use camino::Utf8PathBuf;
use tempfile::TempDir;
use tiff::encoder::{TiffEncoder, TiffValue, colortype::ColorType};

use dmid_explorer::app::{App, AssemblyEvent, AssemblySink};
use dmid_explorer::config::ResolvedConfig;
use dmid_explorer::domain::{AssetRole, StudyId};
use dmid_explorer::layout::DatasetLayout;

pub const METADATA_HEADER: &str = ",Density,Abnormality,Classification\n";

/// Dataset tree in a temporary directory, laid out with the default names.
pub struct Dataset {
    pub dir: TempDir,
    pub layout: DatasetLayout,
}

impl Dataset {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let layout = DatasetLayout::new(root);
        for role in AssetRole::ALL {
            fs::create_dir_all(layout.role_dir(role)).unwrap();
        }
        fs::create_dir_all(layout.reports_dir()).unwrap();
        fs::write(layout.metadata_path(), METADATA_HEADER).unwrap();
        Self { dir, layout }
    }

    pub fn root(&self) -> &str {
        self.layout.root().as_str()
    }

    pub fn config(&self) -> ResolvedConfig {
        ResolvedConfig::default().with_root(Some(self.root()))
    }

    pub fn open(&self) -> App {
        App::open(&self.config()).unwrap()
    }

    pub fn raster_path(&self, role: AssetRole, id: u32) -> PathBuf {
        self.layout
            .raster_path(role, StudyId::new(id))
            .into_std_path_buf()
    }

    pub fn gray8(&self, role: AssetRole, id: u32, width: u32, height: u32, data: &[u8]) {
        write_tiff::<tiff::encoder::colortype::Gray8>(
            &self.raster_path(role, id),
            width,
            height,
            data,
        );
    }

    pub fn rgb8(&self, role: AssetRole, id: u32, width: u32, height: u32, data: &[u8]) {
        write_tiff::<tiff::encoder::colortype::RGB8>(
            &self.raster_path(role, id),
            width,
            height,
            data,
        );
    }

    /// Raw, annotation and ROI rasters for one study, all 4x4 grayscale.
    pub fn full_study(&self, id: u32) {
        let data: Vec<u8> = (0..16).map(|v| v * 10).collect();
        for role in AssetRole::ALL {
            self.gray8(role, id, 4, 4, &data);
        }
    }

    pub fn corrupt(&self, role: AssetRole, id: u32) {
        fs::write(self.raster_path(role, id), b"II*\0 definitely not a tiff").unwrap();
    }

    pub fn metadata(&self, rows: &str) {
        fs::write(self.layout.metadata_path(), format!("{METADATA_HEADER}{rows}")).unwrap();
    }

    pub fn report(&self, id: u32, text: &str) {
        fs::write(self.layout.report_path(StudyId::new(id)), text).unwrap();
    }
}

pub fn write_tiff<C: ColorType>(path: &Path, width: u32, height: u32, data: &[C::Inner])
where
    [C::Inner]: TiffValue,
{
    let file = BufWriter::new(File::create(path).unwrap());
    let mut encoder = TiffEncoder::new(file).unwrap();
    encoder.write_image::<C>(width, height, data).unwrap();
}

/// Two pages in one file.
pub fn write_stack(path: &Path, width: u32, height: u32, data: &[u8]) {
    let file = BufWriter::new(File::create(path).unwrap());
    let mut encoder = TiffEncoder::new(file).unwrap();
    encoder
        .write_image::<tiff::encoder::colortype::Gray8>(width, height, data)
        .unwrap();
    encoder
        .write_image::<tiff::encoder::colortype::Gray8>(width, height, data)
        .unwrap();
}

pub const BLACK_IS_ZERO: u16 = 1;

/// Single-strip little-endian TIFF with arbitrary sample layout, for rasters
/// the encoder cannot produce.
pub fn write_raw_tiff(
    path: &Path,
    width: u16,
    height: u16,
    bits: &[u16],
    photometric: u16,
    data: &[u8],
) {
    const ENTRIES: u16 = 9;
    let extra_offset = 8 + 2 + usize::from(ENTRIES) * 12 + 4;
    let bits_inline = bits.len() <= 2;
    let data_offset = if bits_inline {
        extra_offset
    } else {
        extra_offset + bits.len() * 2
    };
    let bits_value = if bits_inline {
        u32::from(bits[0]) | u32::from(bits.get(1).copied().unwrap_or(0)) << 16
    } else {
        extra_offset as u32
    };

    let mut out = Vec::new();
    out.extend_from_slice(b"II");
    out.extend_from_slice(&42u16.to_le_bytes());
    out.extend_from_slice(&8u32.to_le_bytes());
    out.extend_from_slice(&ENTRIES.to_le_bytes());
    let entries: [(u16, u16, u32, u32); ENTRIES as usize] = [
        (256, 3, 1, u32::from(width)),
        (257, 3, 1, u32::from(height)),
        (258, 3, bits.len() as u32, bits_value),
        (259, 3, 1, 1),
        (262, 3, 1, u32::from(photometric)),
        (273, 4, 1, data_offset as u32),
        (277, 3, 1, bits.len() as u32),
        (278, 3, 1, u32::from(height)),
        (279, 4, 1, data.len() as u32),
    ];
    for (tag, kind, count, value) in entries {
        out.extend_from_slice(&tag.to_le_bytes());
        out.extend_from_slice(&kind.to_le_bytes());
        out.extend_from_slice(&count.to_le_bytes());
        out.extend_from_slice(&value.to_le_bytes());
    }
    out.extend_from_slice(&0u32.to_le_bytes());
    if !bits_inline {
        for bit in bits {
            out.extend_from_slice(&bit.to_le_bytes());
        }
    }
    out.extend_from_slice(data);
    fs::write(path, out).unwrap();
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<AssemblyEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<AssemblyEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl AssemblySink for RecordingSink {
    fn event(&self, event: AssemblyEvent) {
        self.events.lock().unwrap().push(event);
    }
}

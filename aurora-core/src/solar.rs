//! Solar wind feeds and the SDO sun image catalog.

use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::{
    error::{FetchError, FetchResult},
    model::{DownloadedImage, MagReading, PlasmaReading, SunImage},
    source::{ImageSource, parse_swpc_time, value_f64},
};

/// SDO "latest" images, one per AIA/HMI channel.
pub const SUN_IMAGES: &[SunImage] = &[
    sun("solar_disk_aia_0193", "https://sdo.gsfc.nasa.gov/assets/img/latest/latest_1024_0193.jpg"),
    sun("solar_disk_aia_0304", "https://sdo.gsfc.nasa.gov/assets/img/latest/latest_1024_0304.jpg"),
    sun("solar_disk_aia_0171", "https://sdo.gsfc.nasa.gov/assets/img/latest/latest_1024_0171.jpg"),
    sun("solar_disk_aia_0211", "https://sdo.gsfc.nasa.gov/assets/img/latest/latest_1024_0211.jpg"),
    sun("solar_disk_aia_0131", "https://sdo.gsfc.nasa.gov/assets/img/latest/latest_1024_0131.jpg"),
    sun("solar_disk_aia_0335", "https://sdo.gsfc.nasa.gov/assets/img/latest/latest_1024_0335.jpg"),
    sun("solar_disk_aia_0094", "https://sdo.gsfc.nasa.gov/assets/img/latest/latest_1024_0094.jpg"),
    sun("solar_disk_aia_1600", "https://sdo.gsfc.nasa.gov/assets/img/latest/latest_1024_1600.jpg"),
    sun("solar_disk_aia_1700", "https://sdo.gsfc.nasa.gov/assets/img/latest/latest_1024_1700.jpg"),
    sun(
        "solar_disk_aia_211193171",
        "https://sdo.gsfc.nasa.gov/assets/img/latest/latest_1024_211193171.jpg",
    ),
    sun("solar_disk_aia_304211171", "https://sdo.gsfc.nasa.gov/assets/img/latest/f_304_211_171_1024.jpg"),
    sun("solar_disk_aia_94335193", "https://sdo.gsfc.nasa.gov/assets/img/latest/f_094_335_193_1024.jpg"),
    sun("solar_disk_aia_0171_HMIB", "https://sdo.gsfc.nasa.gov/assets/img/latest/f_HMImag_171_1024.jpg"),
    sun("solar_disk_HMIB", "https://sdo.gsfc.nasa.gov/assets/img/latest/latest_1024_HMIB.jpg"),
    sun("solar_disk_HMIBC", "https://sdo.gsfc.nasa.gov/assets/img/latest/latest_1024_HMIBC.jpg"),
    sun("solar_disk_HMIIC", "https://sdo.gsfc.nasa.gov/assets/img/latest/latest_1024_HMIIC.jpg"),
    sun("solar_disk_HMIIF", "https://sdo.gsfc.nasa.gov/assets/img/latest/latest_1024_HMIIF.jpg"),
    sun("solar_disk_HMII", "https://sdo.gsfc.nasa.gov/assets/img/latest/latest_1024_HMII.jpg"),
    sun("solar_disk_HMID", "https://sdo.gsfc.nasa.gov/assets/img/latest/latest_1024_HMID.jpg"),
];

const fn sun(name: &'static str, url: &'static str) -> SunImage {
    SunImage { name, url }
}

pub fn find_sun_image(name: &str) -> Option<SunImage> {
    SUN_IMAGES.iter().copied().find(|img| img.name.eq_ignore_ascii_case(name))
}

/// Rows of an SWPC product table, with the header row turned into a column lookup.
struct Table {
    source_name: &'static str,
    header: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    fn parse(source_name: &'static str, body: &str) -> FetchResult<Self> {
        let mut rows: Vec<Vec<Value>> = serde_json::from_str(body)
            .map_err(|e| FetchError::malformed(source_name, e.to_string()))?;

        if rows.is_empty() {
            return Err(FetchError::malformed(source_name, "empty table"));
        }

        let header = rows
            .remove(0)
            .into_iter()
            .map(|v| v.as_str().map(str::to_owned))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| FetchError::malformed(source_name, "first row is not a header"))?;

        Ok(Self { source_name, header, rows })
    }

    fn column(&self, name: &str) -> FetchResult<usize> {
        self.header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| FetchError::malformed(self.source_name, format!("missing column {name}")))
    }
}

/// Parse `plasma-1-day.json`. Rows with null or unreadable required fields are skipped.
pub fn parse_plasma(body: &str) -> FetchResult<Vec<PlasmaReading>> {
    let table = Table::parse("solar wind plasma", body)?;
    let (t, d, s) = (table.column("time_tag")?, table.column("density")?, table.column("speed")?);
    let temp = table.column("temperature").ok();

    let readings: Vec<PlasmaReading> = table
        .rows
        .iter()
        .filter_map(|row| {
            Some(PlasmaReading {
                time: parse_swpc_time(row.get(t)?.as_str()?)?,
                density: value_f64(row.get(d)?)?,
                speed: value_f64(row.get(s)?)?,
                temperature: temp.and_then(|i| row.get(i)).and_then(value_f64),
            })
        })
        .collect();

    let skipped = table.rows.len() - readings.len();
    if skipped > 0 {
        warn!(skipped, "skipped incomplete plasma rows");
    }
    Ok(readings)
}

/// Parse `mag-1-day.json`, keeping Bz (GSM) and Bt.
pub fn parse_mag(body: &str) -> FetchResult<Vec<MagReading>> {
    let table = Table::parse("solar wind magnetometer", body)?;
    let (t, bz, bt) = (table.column("time_tag")?, table.column("bz_gsm")?, table.column("bt")?);

    let readings: Vec<MagReading> = table
        .rows
        .iter()
        .filter_map(|row| {
            Some(MagReading {
                time: parse_swpc_time(row.get(t)?.as_str()?)?,
                bz: value_f64(row.get(bz)?)?,
                bt: value_f64(row.get(bt)?)?,
            })
        })
        .collect();

    let skipped = table.rows.len() - readings.len();
    if skipped > 0 {
        warn!(skipped, "skipped incomplete magnetometer rows");
    }
    Ok(readings)
}

/// Fetch one sun image and write it to `<dir>/<name>.jpg`.
pub async fn download_sun_image(
    source: &dyn ImageSource,
    image: SunImage,
    dir: &Path,
) -> FetchResult<DownloadedImage> {
    let bytes = source.fetch_image(image.url).await?;
    if bytes.is_empty() {
        return Err(FetchError::Unavailable(format!("{} returned no image data", image.name)));
    }

    let path = dir.join(format!("{}.jpg", image.name));
    write_file(&path, &bytes)?;
    info!(path = %path.display(), "sun image saved");

    Ok(DownloadedImage { name: image.name.to_string(), path })
}

/// Download every image in `images`, one after another.
///
/// Individual failures are logged and left out of the result.
pub async fn download_all(
    source: &dyn ImageSource,
    images: &[SunImage],
    dir: &Path,
) -> Vec<DownloadedImage> {
    let mut saved = Vec::with_capacity(images.len());
    for image in images {
        match download_sun_image(source, *image, dir).await {
            Ok(downloaded) => saved.push(downloaded),
            Err(err) => warn!(name = image.name, error = %err, "sun image download failed"),
        }
    }
    saved
}

pub(crate) fn write_file(path: &Path, bytes: &[u8]) -> FetchResult<()> {
    let io_err = |source| FetchError::Io { path: PathBuf::from(path), source };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::write(path, bytes).map_err(io_err)
}

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use sg_core::series::RecordedSeries;
use sg_core::traits::SeriesStore;
use tempfile::NamedTempFile;

use crate::error::StoreError;

/// Séries stockées en JSON, un fichier `<dir>/<name>.json` par nom.
///
/// Le fichier contient les deux tableaux parallèles :
/// `{"values": [...], "times": [...]}`. L'écriture passe par un fichier
/// temporaire renommé, un lecteur ne voit jamais de fichier à moitié écrit.
///
/// # Example
/// ```no_run
/// use sg_core::series::RecordedSeries;
/// use sg_core::traits::SeriesStore;
/// use sg_store::JsonSeriesStore;
///
/// let store = JsonSeriesStore::new("recordings");
/// let series = RecordedSeries::new(vec![512.0], vec![0.1]).unwrap();
/// store.save("Data_2", &series).unwrap();
/// assert_eq!(store.load("Data_2").unwrap(), series);
/// ```
#[derive(Debug, Clone)]
pub struct JsonSeriesStore {
    dir: PathBuf,
}

impl JsonSeriesStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Chemin du fichier associé à `name`.
    #[must_use]
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl SeriesStore for JsonSeriesStore {
    type Error = StoreError;

    fn save(&self, name: &str, series: &RecordedSeries) -> Result<(), StoreError> {
        crate::check_name(name)?;
        fs::create_dir_all(&self.dir).map_err(io_err(&self.dir))?;

        let path = self.path_for(name);
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(io_err(&self.dir))?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer(&mut writer, series).map_err(|source| StoreError::Format {
                path: path.clone(),
                source,
            })?;
            writer.flush().map_err(io_err(&path))?;
        }
        tmp.persist(&path)
            .map_err(|e| StoreError::Io {
                path: path.clone(),
                source: e.error,
            })?;

        log::info!(
            "Série '{name}' sauvegardée ({} échantillons) dans {}",
            series.len(),
            path.display()
        );
        Ok(())
    }

    fn load(&self, name: &str) -> Result<RecordedSeries, StoreError> {
        crate::check_name(name)?;
        let path = self.path_for(name);
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound {
                    name: name.to_string(),
                });
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        let series: RecordedSeries = serde_json::from_reader(BufReader::new(file))
            .map_err(|source| StoreError::Format {
                path: path.clone(),
                source,
            })?;
        log::debug!("Série '{name}' chargée ({} échantillons)", series.len());
        Ok(series)
    }
}

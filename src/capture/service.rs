//! Asynchronous save of annotated images
//!
//! The encoded image is written to a temporary sibling in the destination
//! directory and only moved to its final name once fully on disk. A failed
//! write never leaves a file under the chosen name.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::{NamedTempFile, PersistError};

use crate::config::AppConfig;
use crate::domain::ImageReference;
use crate::error::SaveError;
use crate::render::PixelBuffer;

use super::{encode, naming};

/// Path of the newly written file, or why nothing was written
pub type SaveResult = Result<PathBuf, SaveError>;

#[derive(Clone, Debug)]
pub struct CaptureService {
    quality: u8,
    max_name_attempts: u32,
}

impl Default for CaptureService {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl CaptureService {
    pub fn new(quality: u8, max_name_attempts: u32) -> Self {
        Self {
            quality: quality.clamp(1, 100),
            max_name_attempts: max_name_attempts.max(1),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.jpeg_quality, config.max_name_attempts)
    }

    /// Save `buffer` under a name derived from `image`, off the interactive thread
    ///
    /// The buffer is moved in and dropped once the write completes.
    pub async fn save(
        &self,
        buffer: PixelBuffer,
        image: ImageReference,
        destination: PathBuf,
    ) -> SaveResult {
        let service = self.clone();
        tokio::task::spawn_blocking(move || service.save_blocking(&buffer, &image, &destination))
            .await
            .map_err(|err| SaveError::Task(err.to_string()))?
    }

    pub fn save_blocking(
        &self,
        buffer: &PixelBuffer,
        image: &ImageReference,
        destination: &Path,
    ) -> SaveResult {
        ensure_directory(destination)?;

        let stem = image
            .file_stem()
            .ok_or_else(|| SaveError::InvalidReference(image.path().to_path_buf()))?;

        let mut file = tempfile::Builder::new()
            .prefix(".snapmark-")
            .suffix(".part")
            .tempfile_in(destination)
            .map_err(|err| SaveError::io(destination, err))?;
        let temp_path = file.path().to_path_buf();
        {
            let mut writer = BufWriter::new(file.as_file_mut());
            encode::write_jpeg(&mut writer, buffer, self.quality)
                .map_err(|err| SaveError::io(&temp_path, encode::into_io(err)))?;
            writer
                .flush()
                .map_err(|err| SaveError::io(&temp_path, err))?;
        }
        file.as_file()
            .sync_all()
            .map_err(|err| SaveError::io(&temp_path, err))?;

        let path = persist_first_free(
            file,
            destination,
            stem,
            self.max_name_attempts,
            |file, path| file.persist_noclobber(path),
        )?;
        log::info!(
            "Saved annotated {} ({}x{}) to {}",
            image,
            buffer.width(),
            buffer.height(),
            path.display()
        );
        Ok(path)
    }
}

/// Move `file` to the first free name for `stem`
///
/// `persist` must refuse to replace an existing file. When a name is taken
/// between the existence check and the persist, the search resumes at the
/// next suffix.
fn persist_first_free<P>(
    mut file: NamedTempFile,
    dir: &Path,
    stem: &str,
    max_suffix: u32,
    mut persist: P,
) -> SaveResult
where
    P: FnMut(NamedTempFile, &Path) -> Result<File, PersistError>,
{
    let mut start = 0;
    loop {
        let (path, suffix) = naming::next_free_name(dir, stem, start, max_suffix)?;
        match persist(file, &path) {
            Ok(_) => return Ok(path),
            // Someone else took the name since it was checked
            Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => {
                log::debug!("{} appeared before persist, trying the next name", path.display());
                file = err.file;
                start = suffix.checked_add(1).ok_or_else(|| SaveError::NamingExhausted {
                    stem: stem.to_string(),
                    attempts: max_suffix.saturating_add(1),
                })?;
            }
            Err(err) => return Err(SaveError::io(path, err.error)),
        }
    }
}

fn ensure_directory(dir: &Path) -> Result<(), SaveError> {
    if dir.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(dir).map_err(|source| SaveError::DirectoryUnavailable {
        path: dir.to_path_buf(),
        source,
    })?;
    log::debug!("Created destination directory {}", dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn buffer() -> PixelBuffer {
        RgbaImage::from_pixel(10, 6, Rgba([30, 60, 90, 255]))
    }

    fn photo() -> ImageReference {
        ImageReference::from_path("/sdcard/DCIM/photo.png")
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_first_save_uses_base_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = CaptureService::default()
            .save(buffer(), photo(), dir.path().to_path_buf())
            .await
            .unwrap();

        assert_eq!(path, dir.path().join("photo.jpg"));
        let saved = image::open(&path).unwrap();
        assert_eq!((saved.width(), saved.height()), (10, 6));
    }

    #[tokio::test]
    async fn test_repeated_saves_never_clobber() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("photo.jpg"), b"original").unwrap();
        let service = CaptureService::default();

        let first = service
            .save(buffer(), photo(), dir.path().to_path_buf())
            .await
            .unwrap();
        let second = service
            .save(buffer(), photo(), dir.path().to_path_buf())
            .await
            .unwrap();

        assert_eq!(first, dir.path().join("photo_1.jpg"));
        assert_eq!(second, dir.path().join("photo_2.jpg"));
        assert_eq!(
            std::fs::read(dir.path().join("photo.jpg")).unwrap(),
            b"original"
        );
        assert_eq!(entries(dir.path()), ["photo.jpg", "photo_1.jpg", "photo_2.jpg"]);
    }

    #[tokio::test]
    async fn test_missing_destination_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("cache").join("annotations");
        let path = CaptureService::default()
            .save(buffer(), photo(), destination.clone())
            .await
            .unwrap();
        assert_eq!(path, destination.join("photo.jpg"));
    }

    #[test]
    fn test_unusable_destination_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("annotations");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let err = CaptureService::default()
            .save_blocking(&buffer(), &photo(), &blocker)
            .unwrap_err();
        assert!(matches!(err, SaveError::DirectoryUnavailable { .. }));
    }

    #[test]
    fn test_exhausted_names_leave_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["photo.jpg", "photo_1.jpg", "photo_2.jpg"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }

        let err = CaptureService::new(100, 2)
            .save_blocking(&buffer(), &photo(), dir.path())
            .unwrap_err();
        assert!(matches!(err, SaveError::NamingExhausted { .. }));
        assert_eq!(entries(dir.path()), ["photo.jpg", "photo_1.jpg", "photo_2.jpg"]);
    }

    fn part_file(dir: &Path) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .prefix(".snapmark-")
            .suffix(".part")
            .tempfile_in(dir)
            .unwrap();
        file.write_all(b"annotated").unwrap();
        file
    }

    #[test]
    fn test_name_taken_before_persist_moves_to_next_suffix() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("photo.jpg"), b"x").unwrap();

        let mut planted = false;
        let path = persist_first_free(part_file(dir.path()), dir.path(), "photo", 10, |file, path| {
            if !planted {
                std::fs::write(path, b"other writer").unwrap();
                planted = true;
            }
            file.persist_noclobber(path)
        })
        .unwrap();

        assert_eq!(path, dir.path().join("photo_2.jpg"));
        assert_eq!(std::fs::read(&path).unwrap(), b"annotated");
        assert_eq!(
            std::fs::read(dir.path().join("photo_1.jpg")).unwrap(),
            b"other writer"
        );
        assert_eq!(entries(dir.path()), ["photo.jpg", "photo_1.jpg", "photo_2.jpg"]);
    }

    #[test]
    fn test_names_taken_up_to_limit_exhaust_the_search() {
        let dir = tempfile::tempdir().unwrap();

        let err = persist_first_free(part_file(dir.path()), dir.path(), "photo", 1, |file, path| {
            std::fs::write(path, b"other writer").unwrap();
            file.persist_noclobber(path)
        })
        .unwrap_err();

        assert!(matches!(
            err,
            SaveError::NamingExhausted { attempts: 2, .. }
        ));
        assert_eq!(entries(dir.path()), ["photo.jpg", "photo_1.jpg"]);
    }

    #[test]
    fn test_reference_without_file_name_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = CaptureService::default()
            .save_blocking(&buffer(), &ImageReference::from_path("/"), dir.path())
            .unwrap_err();
        assert!(matches!(err, SaveError::InvalidReference(_)));
        assert!(entries(dir.path()).is_empty());
    }
}

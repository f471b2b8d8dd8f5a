//! Directory walking implementation using walkdir.

use super::{filter::ImageFilter, ImageFile, ImageScanner, ScanResult};
use crate::core::raster::ImageId;
use crate::error::ScanError;
use crate::events::{Event, EventSender, ScanEvent, ScanProgress};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Extensions scanned when none are configured
pub const DEFAULT_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Configuration for the directory scanner
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Descend into subdirectories; otherwise only the top level is read
    pub recursive: bool,
    /// Whether to include hidden files and directories
    pub include_hidden: bool,
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Extensions to include, case-insensitive, without the dot
    pub extensions: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            recursive: false,
            include_hidden: false,
            follow_symlinks: false,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl ScanConfig {
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn include_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }
}

/// Scanner implementation using the walkdir crate
pub struct WalkDirScanner {
    config: ScanConfig,
    filter: ImageFilter,
}

impl WalkDirScanner {
    /// Create a new scanner with the given configuration
    pub fn new(config: ScanConfig) -> Self {
        let filter = ImageFilter::new()
            .with_hidden(config.include_hidden)
            .with_extensions(&config.extensions);

        Self { config, filter }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    fn skip_entry(&self, entry: &DirEntry) -> bool {
        // The root is always walked, even when its own name is hidden
        entry.depth() > 0
            && entry.file_type().is_dir()
            && !self.config.include_hidden
            && ImageFilter::is_hidden(entry.path())
    }

    /// Scan a single root directory
    fn scan_directory(
        &self,
        root: &Path,
        events: &EventSender,
    ) -> Result<(Vec<ImageFile>, Vec<ScanError>), ScanError> {
        if !root.exists() {
            return Err(ScanError::DirectoryNotFound {
                path: root.to_path_buf(),
            });
        }
        if !root.is_dir() {
            return Err(ScanError::NotADirectory {
                path: root.to_path_buf(),
            });
        }

        let root = fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());

        let mut images = Vec::new();
        let mut errors = Vec::new();
        let mut directories_scanned = 0;

        let mut walker = WalkDir::new(&root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name();
        if !self.config.recursive {
            walker = walker.max_depth(1);
        }

        for entry_result in walker.into_iter().filter_entry(|e| !self.skip_entry(e)) {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone());
                    let error = match e.io_error().map(|io| io.kind()) {
                        Some(std::io::ErrorKind::PermissionDenied) => {
                            ScanError::PermissionDenied { path: path.clone() }
                        }
                        _ => ScanError::ReadDirectory {
                            path: path.clone(),
                            source: std::io::Error::other(e.to_string()),
                        },
                    };
                    warn!("{}", error);
                    events.send(Event::Scan(ScanEvent::Error {
                        path,
                        message: error.to_string(),
                    }));
                    errors.push(error);
                    continue;
                }
            };

            let path = entry.path();

            if entry.file_type().is_dir() {
                directories_scanned += 1;
                events.send(Event::Scan(ScanEvent::Progress(ScanProgress {
                    directories_scanned,
                    images_found: images.len(),
                    current_path: path.to_path_buf(),
                })));
                continue;
            }

            if !self.filter.should_include(path) {
                continue;
            }

            match entry.metadata() {
                Ok(metadata) if metadata.is_file() => {
                    let image = ImageFile {
                        id: ImageId::new(path),
                        size: metadata.len(),
                        modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
                        format: self.filter.format_of(path),
                    };

                    events.send(Event::Scan(ScanEvent::ImageFound {
                        path: path.to_path_buf(),
                    }));
                    images.push(image);
                }
                Ok(_) => debug!("skipping {}: not a regular file", path.display()),
                Err(e) => {
                    let error = ScanError::ReadDirectory {
                        path: path.to_path_buf(),
                        source: std::io::Error::other(e.to_string()),
                    };
                    warn!("{}", error);
                    events.send(Event::Scan(ScanEvent::Error {
                        path: path.to_path_buf(),
                        message: error.to_string(),
                    }));
                    errors.push(error);
                }
            }
        }

        Ok((images, errors))
    }
}

impl ImageScanner for WalkDirScanner {
    fn scan(&self, paths: &[PathBuf]) -> Result<ScanResult, ScanError> {
        self.scan_with_events(paths, &crate::events::null_sender())
    }

    fn scan_with_events(&self, paths: &[PathBuf], events: &EventSender) -> Result<ScanResult, ScanError> {
        events.send(Event::Scan(ScanEvent::Started {
            paths: paths.to_vec(),
        }));

        let mut result = ScanResult::default();
        let mut seen: HashSet<ImageId> = HashSet::new();

        for path in paths {
            match self.scan_directory(path, events) {
                Ok((images, errors)) => {
                    // Overlapping roots reach the same files more than once
                    for image in images {
                        if seen.insert(image.id.clone()) {
                            result.images.push(image);
                        } else {
                            debug!("{} already found under an earlier root", image.id);
                        }
                    }
                    result.errors.extend(errors);
                }
                Err(e) => {
                    warn!("{}", e);
                    events.send(Event::Scan(ScanEvent::Error {
                        path: path.clone(),
                        message: e.to_string(),
                    }));
                    result.errors.push(e);
                }
            }
        }

        debug!(
            "scan found {} images with {} errors",
            result.images.len(),
            result.errors.len()
        );
        events.send(Event::Scan(ScanEvent::Completed {
            total_images: result.images.len(),
        }));

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::super::ImageFormat;
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn create_test_image(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        // Only the extension matters to the scanner
        file.write_all(&[0x89, b'P', b'N', b'G']).unwrap();
        path
    }

    fn names(result: &ScanResult) -> Vec<String> {
        result
            .images
            .iter()
            .map(|i| i.path().file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn scan_empty_directory_returns_empty_vec() {
        let temp_dir = TempDir::new().unwrap();
        let scanner = WalkDirScanner::new(ScanConfig::default());

        let result = scanner.scan(&[temp_dir.path().to_path_buf()]).unwrap();

        assert!(result.images.is_empty());
        assert!(result.errors.is_empty());
    }

    #[test]
    fn scan_finds_default_formats_in_name_order() {
        let temp_dir = TempDir::new().unwrap();
        create_test_image(temp_dir.path(), "c.png");
        create_test_image(temp_dir.path(), "a.jpg");
        create_test_image(temp_dir.path(), "b.JPEG");
        create_test_image(temp_dir.path(), "d.gif");
        File::create(temp_dir.path().join("notes.txt")).unwrap();

        let scanner = WalkDirScanner::new(ScanConfig::default());
        let result = scanner.scan(&[temp_dir.path().to_path_buf()]).unwrap();

        assert_eq!(names(&result), vec!["a.jpg", "b.JPEG", "c.png"]);
        assert_eq!(result.images[0].format, ImageFormat::Jpeg);
        assert_eq!(result.images[2].format, ImageFormat::Png);
        assert_eq!(result.images[0].size, 4);
    }

    #[test]
    fn non_recursive_scan_stays_at_top_level() {
        let temp_dir = TempDir::new().unwrap();
        let subdir = temp_dir.path().join("subdir");
        fs::create_dir(&subdir).unwrap();
        create_test_image(temp_dir.path(), "root.png");
        create_test_image(&subdir, "nested.png");

        let flat = WalkDirScanner::new(ScanConfig::default());
        let deep = WalkDirScanner::new(ScanConfig::default().recursive(true));

        let root = [temp_dir.path().to_path_buf()];
        assert_eq!(names(&flat.scan(&root).unwrap()), vec!["root.png"]);
        assert_eq!(names(&deep.scan(&root).unwrap()), vec!["root.png", "nested.png"]);
    }

    #[test]
    fn overlapping_roots_list_each_file_once() {
        let temp_dir = TempDir::new().unwrap();
        let subdir = temp_dir.path().join("subdir");
        fs::create_dir(&subdir).unwrap();
        create_test_image(temp_dir.path(), "root.png");
        create_test_image(&subdir, "nested.png");

        let scanner = WalkDirScanner::new(ScanConfig::default().recursive(true));
        let roots = [
            temp_dir.path().to_path_buf(),
            subdir.clone(),
            temp_dir.path().to_path_buf(),
        ];
        let result = scanner.scan(&roots).unwrap();

        assert_eq!(names(&result), vec!["root.png", "nested.png"]);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn custom_extensions_replace_defaults() {
        let temp_dir = TempDir::new().unwrap();
        create_test_image(temp_dir.path(), "a.png");
        create_test_image(temp_dir.path(), "b.bmp");

        let scanner = WalkDirScanner::new(ScanConfig::default().extensions(["BMP"]));
        let result = scanner.scan(&[temp_dir.path().to_path_buf()]).unwrap();

        assert_eq!(names(&result), vec!["b.bmp"]);
    }

    #[test]
    fn scan_excludes_hidden_files_and_directories_by_default() {
        let temp_dir = TempDir::new().unwrap();
        let hidden_dir = temp_dir.path().join(".cache");
        fs::create_dir(&hidden_dir).unwrap();
        create_test_image(temp_dir.path(), "visible.jpg");
        create_test_image(temp_dir.path(), ".hidden.jpg");
        create_test_image(&hidden_dir, "inside.jpg");

        let scanner = WalkDirScanner::new(ScanConfig::default().recursive(true));
        let result = scanner.scan(&[temp_dir.path().to_path_buf()]).unwrap();
        assert_eq!(names(&result), vec!["visible.jpg"]);

        let scanner = WalkDirScanner::new(ScanConfig::default().recursive(true).include_hidden(true));
        let result = scanner.scan(&[temp_dir.path().to_path_buf()]).unwrap();
        assert_eq!(result.images.len(), 3);
    }

    #[test]
    fn missing_root_is_recorded_and_other_roots_still_scanned() {
        let temp_dir = TempDir::new().unwrap();
        create_test_image(temp_dir.path(), "a.png");

        let scanner = WalkDirScanner::new(ScanConfig::default());
        let result = scanner
            .scan(&[
                PathBuf::from("/nonexistent/path/12345"),
                temp_dir.path().to_path_buf(),
            ])
            .unwrap();

        assert_eq!(result.images.len(), 1);
        assert!(matches!(
            result.errors.as_slice(),
            [ScanError::DirectoryNotFound { .. }]
        ));
    }

    #[test]
    fn file_root_is_not_a_directory() {
        let temp_dir = TempDir::new().unwrap();
        let file = create_test_image(temp_dir.path(), "a.png");

        let result = WalkDirScanner::new(ScanConfig::default()).scan(&[file]).unwrap();

        assert!(matches!(result.errors.as_slice(), [ScanError::NotADirectory { .. }]));
    }

    #[test]
    fn scan_reports_events() {
        let temp_dir = TempDir::new().unwrap();
        create_test_image(temp_dir.path(), "a.png");
        create_test_image(temp_dir.path(), "b.png");

        let (sender, receiver) = crate::events::EventChannel::new();
        WalkDirScanner::new(ScanConfig::default())
            .scan_with_events(&[temp_dir.path().to_path_buf()], &sender)
            .unwrap();
        drop(sender);

        let events: Vec<Event> = receiver.iter().collect();
        let found = events
            .iter()
            .filter(|e| matches!(e, Event::Scan(ScanEvent::ImageFound { .. })))
            .count();

        assert_eq!(found, 2);
        assert!(matches!(
            events.last(),
            Some(Event::Scan(ScanEvent::Completed { total_images: 2 }))
        ));
    }
}

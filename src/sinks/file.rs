//! File sink with date, line-count and size rotation
//!
//! Every admitted message goes to the access file (`filename`), and also to the
//! per-severity file configured for its exact severity, if any. Each file
//! rotates independently before a write:
//!
//! - **date slice**: when the current period (year, month, day or hour) differs
//!   from the one the file was started in, it is renamed to
//!   `<stem>_<period>.<ext>`
//! - **max lines / max size**: once the file holds that many lines or bytes it
//!   is renamed to `<stem>.<time>.<ext>`
//!
//! Rotated files can be gzip-compressed.

use crate::core::{
    DateSlice, LoggerError, Message, OutputFormat, Result, Severity, Sink, SinkConfig,
};
use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Default)]
struct Rotation {
    max_size: u64,
    max_lines: u64,
    date_slice: DateSlice,
    compress: bool,
}

struct RotatingFile {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    size: u64,
    lines: u64,
    /// Start of the file's current period
    opened_at: DateTime<Local>,
}

impl RotatingFile {
    fn open(path: PathBuf) -> Result<Self> {
        let mut file = Self {
            path,
            writer: None,
            size: 0,
            lines: 0,
            opened_at: Local::now(),
        };
        file.reopen()?;
        Ok(file)
    }

    fn display(&self) -> String {
        self.path.display().to_string()
    }

    /// (Re)open the file for appending and resume its size, line count and
    /// start time from what is already on disk.
    fn reopen(&mut self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                LoggerError::io_operation(
                    "create log directory",
                    format!("Failed to create directory '{}'", parent.display()),
                    e,
                )
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| LoggerError::file_sink(self.display(), format!("Failed to open: {}", e)))?;

        let metadata = file.metadata().map_err(|e| {
            LoggerError::file_sink(self.display(), format!("Cannot access file metadata: {}", e))
        })?;

        self.lines = if metadata.len() == 0 {
            0
        } else {
            count_lines(&self.path)?
        };
        self.size = metadata.len();
        self.opened_at = metadata
            .modified()
            .map(DateTime::<Local>::from)
            .unwrap_or_else(|_| Local::now());
        self.writer = Some(BufWriter::new(file));
        Ok(())
    }

    fn write_line(&mut self, line: &str, rotation: &Rotation) -> Result<()> {
        self.rotate_if_needed(rotation)?;

        if self.writer.is_none() {
            self.reopen()?;
        }
        let writer = self.writer.as_mut().ok_or_else(|| {
            LoggerError::file_sink(self.path.display().to_string(), "File writer not initialized")
        })?;

        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;

        self.size += line.len() as u64 + 1;
        self.lines += line.matches('\n').count() as u64 + 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush()?;
        }
        Ok(())
    }

    fn rotate_if_needed(&mut self, rotation: &Rotation) -> Result<()> {
        if let Some(period_format) = rotation.date_slice.period_format() {
            let started = self.opened_at.format(period_format).to_string();
            if started != Local::now().format(period_format).to_string() {
                let target = rotated_path(&self.path, &format!("_{}", started));
                return self.rotate_to(target, rotation.compress);
            }
        }

        let too_many_lines = rotation.max_lines > 0 && self.lines >= rotation.max_lines;
        let too_large = rotation.max_size > 0 && self.size >= rotation.max_size;
        if too_many_lines || too_large {
            let flag = Local::now().format("%Y-%m-%d-%H.%M.%S%.3f");
            let target = rotated_path(&self.path, &format!(".{}", flag));
            return self.rotate_to(target, rotation.compress);
        }

        Ok(())
    }

    fn rotate_to(&mut self, target: PathBuf, compress: bool) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|e| {
                LoggerError::file_rotation(self.display(), format!("Failed to flush before rotation: {}", e))
            })?;
        }

        let target = unique_path(target);
        fs::rename(&self.path, &target).map_err(|e| {
            LoggerError::file_rotation(self.display(), format!("Failed to rotate current log file: {}", e))
        })?;

        self.reopen()?;
        self.opened_at = Local::now();

        // The fresh file is already open; a failed gzip leaves the rotated file
        // uncompressed but must not cost the pending write.
        if compress {
            if let Err(e) = compress_file(&target) {
                eprintln!(
                    "[LOGGER WARNING] Rotated {} but failed to compress it: {}",
                    target.display(),
                    e
                );
            }
        }
        Ok(())
    }
}

/// `<stem><infix>.<ext>` next to `path`
fn rotated_path(path: &Path, infix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}{}.{}", stem, infix, ext.to_string_lossy()),
        None => format!("{}{}", stem, infix),
    };
    path.with_file_name(name)
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// `candidate`, or `candidate` with a counter if it (or its `.gz`) is taken
fn unique_path(candidate: PathBuf) -> PathBuf {
    let taken = |p: &Path| p.exists() || with_suffix(p, ".gz").exists();
    if !taken(&candidate) {
        return candidate;
    }
    let mut n = 1;
    loop {
        let path = rotated_path(&candidate, &format!(".{}", n));
        if !taken(&path) {
            return path;
        }
        n += 1;
    }
}

fn count_lines(path: &Path) -> Result<u64> {
    let file = File::open(path).map_err(|e| {
        LoggerError::io_operation("count log lines", format!("Failed to open '{}'", path.display()), e)
    })?;
    let mut reader = BufReader::new(file);
    let mut count = 0u64;
    loop {
        let buffer = reader.fill_buf()?;
        if buffer.is_empty() {
            break;
        }
        count += buffer.iter().filter(|&&b| b == b'\n').count() as u64;
        let consumed = buffer.len();
        reader.consume(consumed);
    }
    Ok(count)
}

/// Gzip `path` into `path.gz`, removing the original only once the archive is
/// complete
fn compress_file(path: &Path) -> Result<()> {
    let gz_path = with_suffix(path, ".gz");
    let temp_gz_path = with_suffix(path, ".gz.tmp");

    let input = File::open(path).map_err(|e| {
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to open file for compression: {}", path.display()),
            e,
        )
    })?;
    let mut reader = BufReader::with_capacity(64 * 1024, input);

    let output = File::create(&temp_gz_path).map_err(|e| {
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to create temporary compressed file: {}", temp_gz_path.display()),
            e,
        )
    })?;
    let mut encoder = flate2::write::GzEncoder::new(
        BufWriter::with_capacity(64 * 1024, output),
        flate2::Compression::default(),
    );

    let mut buffer = vec![0u8; 64 * 1024];
    let streamed: std::io::Result<()> = (|| {
        loop {
            let bytes_read = reader.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            encoder.write_all(&buffer[..bytes_read])?;
        }
        encoder.finish()?.flush()
    })();

    if let Err(e) = streamed {
        let _ = fs::remove_file(&temp_gz_path);
        return Err(LoggerError::io_operation(
            "compress log file",
            format!("Failed to compress '{}'", path.display()),
            e,
        ));
    }

    fs::rename(&temp_gz_path, &gz_path).map_err(|e| {
        let _ = fs::remove_file(&temp_gz_path);
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to rename compressed file to: {}", gz_path.display()),
            e,
        )
    })?;

    if let Err(e) = fs::remove_file(path) {
        eprintln!(
            "[LOGGER WARNING] Compression succeeded but failed to remove original file {}: {}",
            path.display(),
            e
        );
    }
    Ok(())
}

/// Writes messages to an access file and optional per-severity files.
#[derive(Default)]
pub struct FileSink {
    access: Option<RotatingFile>,
    by_level: BTreeMap<Severity, RotatingFile>,
    rotation: Rotation,
    output_format: OutputFormat,
}

impl FileSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths currently written to, access file first
    pub fn paths(&self) -> Vec<&Path> {
        self.access
            .iter()
            .chain(self.by_level.values())
            .map(|file| file.path.as_path())
            .collect()
    }
}

impl Sink for FileSink {
    fn name(&self) -> &str {
        "file"
    }

    fn init(&mut self, config: &SinkConfig) -> Result<()> {
        let SinkConfig::File(config) = config else {
            return Err(LoggerError::config(
                "FileSink",
                format!("expected a file config, got '{}'", config.kind()),
            ));
        };

        let filename = config
            .filename
            .as_ref()
            .filter(|path| !path.as_os_str().is_empty());
        if filename.is_none() && config.level_filenames.is_empty() {
            return Err(LoggerError::config(
                "FileSink",
                "filename can't be empty when no level_filenames are given",
            ));
        }

        let access = filename.map(|path| RotatingFile::open(path.clone())).transpose()?;
        let mut by_level = BTreeMap::new();
        for (severity, path) in &config.level_filenames {
            by_level.insert(*severity, RotatingFile::open(path.clone())?);
        }

        self.access = access;
        self.by_level = by_level;
        self.rotation = Rotation {
            max_size: config.max_size,
            max_lines: config.max_lines,
            date_slice: config.date_slice,
            compress: config.compress,
        };
        self.output_format = OutputFormat::from_settings(config.json_format, &config.format);
        Ok(())
    }

    fn write(&mut self, message: &Message) -> Result<()> {
        let line = self.output_format.format(message)?;
        let rotation = self.rotation;

        let access = match self.access.as_mut() {
            Some(file) => file.write_line(&line, &rotation),
            None => Ok(()),
        };
        let level = match self.by_level.get_mut(&message.severity) {
            Some(file) => file.write_line(&line, &rotation),
            None => Ok(()),
        };
        access.and(level)
    }

    fn flush(&mut self) -> Result<()> {
        let mut first_error = None;
        for file in self.access.iter_mut().chain(self.by_level.values_mut()) {
            if let Err(e) = file.flush() {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        // Ensure all buffered data is flushed to disk
        let _ = self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CallSite, FileConfig};
    use tempfile::TempDir;

    fn message(severity: Severity, body: &str) -> Message {
        Message::new(severity, body, CallSite::new("src/app.rs", 9, "app::run"))
    }

    fn init(config: FileConfig) -> FileSink {
        let mut sink = FileSink::new();
        sink.init(&SinkConfig::File(config)).expect("file sink init");
        sink
    }

    fn rotated_siblings(dir: &Path, current: &str) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|p| p.file_name().and_then(|n| n.to_str()) != Some(current))
            .collect();
        paths.sort();
        paths
    }

    #[test]
    fn test_init_requires_a_file() {
        let mut sink = FileSink::new();
        let err = sink.init(&SinkConfig::File(FileConfig::default())).unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));

        let err = sink.init(&SinkConfig::File(FileConfig::new(""))).unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_access_and_level_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let access = temp_dir.path().join("access.log");
        let errors = temp_dir.path().join("logs").join("error.log");

        let mut sink = init(
            FileConfig::new(&access)
                .with_level_file(Severity::Error, &errors)
                .with_format("%level_string%|%body%"),
        );
        sink.write(&message(Severity::Info, "started")).unwrap();
        sink.write(&message(Severity::Error, "failed")).unwrap();
        sink.write(&message(Severity::Critical, "worse")).unwrap();
        sink.flush().unwrap();

        assert_eq!(
            fs::read_to_string(&access).unwrap(),
            "Info|started\nError|failed\nCritical|worse\n"
        );
        assert_eq!(fs::read_to_string(&errors).unwrap(), "Error|failed\n");
        assert_eq!(sink.paths(), vec![access.as_path(), errors.as_path()]);
    }

    #[test]
    fn test_level_files_only() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let debug = temp_dir.path().join("debug.log");

        let mut sink = init(
            FileConfig::default()
                .with_level_file(Severity::Debug, &debug)
                .with_format("%body%"),
        );
        sink.write(&message(Severity::Info, "skipped")).unwrap();
        sink.write(&message(Severity::Debug, "kept")).unwrap();
        sink.flush().unwrap();

        assert_eq!(fs::read_to_string(&debug).unwrap(), "kept\n");
    }

    #[test]
    fn test_appends_to_existing_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("app.log");
        fs::write(&path, "old\n").unwrap();

        let mut sink = init(FileConfig::new(&path).with_format("%body%"));
        sink.write(&message(Severity::Info, "new")).unwrap();
        drop(sink);

        assert_eq!(fs::read_to_string(&path).unwrap(), "old\nnew\n");
    }

    #[test]
    fn test_rotation_by_lines() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("app.log");

        let mut sink = init(FileConfig::new(&path).with_format("%body%").with_max_lines(2));
        for i in 1..=5 {
            sink.write(&message(Severity::Info, &format!("line {}", i))).unwrap();
        }
        sink.flush().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "line 5\n");

        let rotated = rotated_siblings(temp_dir.path(), "app.log");
        assert_eq!(rotated.len(), 2);
        let mut contents: Vec<String> = rotated
            .iter()
            .map(|p| fs::read_to_string(p).unwrap())
            .collect();
        contents.sort();
        assert_eq!(contents, vec!["line 1\nline 2\n", "line 3\nline 4\n"]);
        for path in &rotated {
            let name = path.file_name().unwrap().to_str().unwrap();
            assert!(name.starts_with("app.") && name.ends_with(".log"), "{}", name);
        }
    }

    #[test]
    fn test_existing_lines_count_toward_limit() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("app.log");
        fs::write(&path, "a\nb\nc\n").unwrap();

        let mut sink = init(FileConfig::new(&path).with_format("%body%").with_max_lines(3));
        sink.write(&message(Severity::Info, "d")).unwrap();
        sink.flush().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "d\n");
        assert_eq!(rotated_siblings(temp_dir.path(), "app.log").len(), 1);
    }

    #[test]
    fn test_rotation_by_size() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("app.log");

        let mut sink = init(FileConfig::new(&path).with_format("%body%").with_max_size(10));
        sink.write(&message(Severity::Info, "0123456789")).unwrap();
        sink.write(&message(Severity::Info, "next")).unwrap();
        sink.flush().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "next\n");
        let rotated = rotated_siblings(temp_dir.path(), "app.log");
        assert_eq!(rotated.len(), 1);
        assert_eq!(fs::read_to_string(&rotated[0]).unwrap(), "0123456789\n");
    }

    #[test]
    fn test_rotation_by_date_slice() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("app.log");

        let mut file = RotatingFile::open(path.clone()).unwrap();
        let rotation = Rotation {
            date_slice: DateSlice::Year,
            ..Rotation::default()
        };
        file.write_line("last year", &rotation).unwrap();
        file.opened_at = Local::now() - chrono::Duration::days(400);
        let period = file.opened_at.format("%Y").to_string();

        file.write_line("this year", &rotation).unwrap();
        file.flush().unwrap();

        let rotated = temp_dir.path().join(format!("app_{}.log", period));
        assert_eq!(fs::read_to_string(&rotated).unwrap(), "last year\n");
        assert_eq!(fs::read_to_string(&path).unwrap(), "this year\n");
    }

    #[test]
    fn test_rotated_files_are_compressed() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("app.log");

        let mut sink = init(
            FileConfig::new(&path)
                .with_format("%body%")
                .with_max_lines(1)
                .with_compression(true),
        );
        sink.write(&message(Severity::Info, "first")).unwrap();
        sink.write(&message(Severity::Info, "second")).unwrap();
        sink.flush().unwrap();

        let rotated = rotated_siblings(temp_dir.path(), "app.log");
        assert_eq!(rotated.len(), 1);
        assert!(rotated[0].to_string_lossy().ends_with(".log.gz"));

        let mut decoder = flate2::read::GzDecoder::new(File::open(&rotated[0]).unwrap());
        let mut text = String::new();
        decoder.read_to_string(&mut text).unwrap();
        assert_eq!(text, "first\n");
    }

    #[test]
    fn test_failed_compression_keeps_the_write() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("app.log");

        let mut file = RotatingFile::open(path.clone()).unwrap();
        let rotation = Rotation {
            date_slice: DateSlice::Year,
            compress: true,
            ..Rotation::default()
        };
        file.write_line("old", &rotation).unwrap();
        file.opened_at = Local::now() - chrono::Duration::days(400);
        let period = file.opened_at.format("%Y").to_string();

        // A directory in place of the temporary archive makes gzip fail
        let rotated = temp_dir.path().join(format!("app_{}.log", period));
        fs::create_dir(with_suffix(&rotated, ".gz.tmp")).unwrap();

        file.write_line("hello", &rotation).unwrap();
        file.flush().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "hello\n");
        assert_eq!(fs::read_to_string(&rotated).unwrap(), "old\n");
        assert!(!with_suffix(&rotated, ".gz").exists());
    }

    #[test]
    fn test_json_lines() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("app.json");

        let mut sink = init(FileConfig::new(&path).with_json_format(true));
        sink.write(&message(Severity::Alert, "paged")).unwrap();
        sink.flush().unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(text.trim_end()).unwrap();
        assert_eq!(value["level_string"], "Alert");
        assert_eq!(value["file"], "app.rs");
    }

    #[test]
    fn test_rotated_path_names() {
        assert_eq!(
            rotated_path(Path::new("/var/log/app.log"), "_2025"),
            PathBuf::from("/var/log/app_2025.log")
        );
        assert_eq!(
            rotated_path(Path::new("logs/app"), ".x"),
            PathBuf::from("logs/app.x")
        );
    }
}

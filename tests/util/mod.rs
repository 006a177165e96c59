use std::path::{Path, PathBuf};

use orgdir::store::RecordStore;
use orgdir::store::RowSources;
use orgdir::store::loader::parse_rows;
use tempfile::TempDir;

/// Captures tracing output for tests.
#[allow(dead_code)]
pub struct TestTracing {
    buffer: std::sync::Arc<std::sync::Mutex<Vec<u8>>>,
}

#[allow(dead_code)]
impl TestTracing {
    pub fn new() -> Self {
        Self {
            buffer: std::sync::Arc::new(std::sync::Mutex::new(Vec::new())),
        }
    }

    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.buffer.clone();
        let make_writer = move || TestWriter(writer.clone());
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .without_time()
            .with_max_level(tracing::Level::TRACE)
            .with_writer(make_writer)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn output(&self) -> String {
        let buf = self.buffer.lock().unwrap();
        String::from_utf8_lossy(&buf).to_string()
    }
}

#[allow(dead_code)]
pub struct EnvGuard {
    key: String,
    prev: Option<String>,
}

#[allow(dead_code)]
impl EnvGuard {
    pub fn set(key: &str, val: impl AsRef<str>) -> Self {
        let prev = std::env::var(key).ok();
        unsafe { std::env::set_var(key, val.as_ref()) };
        Self {
            key: key.to_string(),
            prev,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match &self.prev {
            Some(v) => unsafe { std::env::set_var(&self.key, v) },
            None => unsafe { std::env::remove_var(&self.key) },
        }
    }
}

struct TestWriter(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

impl std::io::Write for TestWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut guard = self.0.lock().unwrap();
        guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Directory holding the checked-in row files.
#[allow(dead_code)]
pub fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

#[allow(dead_code)]
fn fixture_rows(name: &str) -> Vec<orgdir::store::rows::RawRow> {
    let path = fixture_dir().join(name);
    let content = std::fs::read_to_string(&path).expect("read fixture");
    parse_rows(&path, &content).expect("parse fixture")
}

/// Snapshot built synchronously from the checked-in fixtures.
#[allow(dead_code)]
pub fn fixture_store() -> RecordStore {
    RecordStore::build(RowSources {
        organizations: fixture_rows("organizations.json"),
        locations: fixture_rows("locations.json"),
        infra: fixture_rows("infra.json"),
        identifiers: fixture_rows("identifiers.json"),
    })
}

/// Scratch data directory seeded with copies of the fixtures.
#[allow(dead_code)]
pub struct TempFixtureDir {
    pub dir: TempDir,
}

#[allow(dead_code)]
impl TempFixtureDir {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("tempdir"),
        }
    }

    /// Copies the named fixture files into the directory.
    pub fn with_fixtures(names: &[&str]) -> Self {
        let this = Self::new();
        for name in names {
            std::fs::copy(fixture_dir().join(name), this.dir.path().join(name))
                .expect("copy fixture");
        }
        this
    }

    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).expect("write file");
        path
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

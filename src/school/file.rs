//! JSON file backed school store
//!
//! The whole school is one JSON document:
//!
//! ```json
//! {
//!   "classes": [{ "id": "…", "name": "Class 1" }],
//!   "students": [{ "id": "…", "class_id": "…" }]
//! }
//! ```
//!
//! Reads are served from memory. A mutation is applied to a copy of the
//! document, the copy is written through a temp file which is fsynced and
//! renamed over the original, and only then does the copy replace the
//! working set. A failed write changes nothing, on disk or in memory.
//!
//! An open store holds `<data file>.lock` until it is dropped. A second
//! open of the same data file, from this process or another, fails with
//! `StoreError::Locked`.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::errors::{StoreError, StoreResult};
use super::memory::{InMemorySchoolStore, SchoolDocument};
use super::model::{
    ClassId, ClassRecord, ClassSummary, DeleteOutcome, MoveOutcome, StudentId, StudentRecord,
    TeacherId,
};
use super::store::SchoolStore;

/// Exclusive claim on a data file, released on drop.
#[derive(Debug)]
struct DataFileLock {
    path: PathBuf,
}

impl DataFileLock {
    fn acquire(data_path: &Path) -> StoreResult<Self> {
        let path = sibling(data_path, ".lock");
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                // dropping `lock` on a failed write removes the file again
                let lock = Self { path };
                writeln!(file, "pid={}", std::process::id())?;
                file.sync_all()?;
                Ok(lock)
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(StoreError::Locked(format!(
                "{} is in use (lock file {} exists; remove it if no gradeflow process is running)",
                data_path.display(),
                path.display()
            ))),
            Err(e) => Err(StoreError::Io(format!(
                "failed to create lock file {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

impl Drop for DataFileLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// `<path><suffix>` in the same directory as `path`.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

/// Write `contents` to `path` through `<path>.tmp`: write, fsync, rename,
/// then fsync the directory where the platform allows it.
pub(crate) fn write_atomically(path: &Path, contents: &[u8]) -> io::Result<()> {
    let tmp = sibling(path, ".tmp");
    let mut file = File::create(&tmp)?;
    file.write_all(contents)?;
    file.sync_all()?;
    fs::rename(&tmp, path)?;

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        // Directory fsync is not available on every platform.
        if let Ok(handle) = File::open(dir) {
            let _ = handle.sync_all();
        }
    }
    Ok(())
}

pub struct JsonFileStore {
    path: PathBuf,
    inner: InMemorySchoolStore,
    write_lock: Mutex<()>,
    _lock: DataFileLock,
}

impl JsonFileStore {
    /// Create a new, empty data file. Fails if the file already exists.
    pub fn create(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        if path.exists() {
            return Err(StoreError::Io(format!(
                "data file already exists: {}",
                path.display()
            )));
        }
        let lock = DataFileLock::acquire(&path)?;
        persist(&path, &SchoolDocument::default())?;

        Ok(Self {
            path,
            inner: InMemorySchoolStore::new(),
            write_lock: Mutex::new(()),
            _lock: lock,
        })
    }

    /// Open an existing data file.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let lock = DataFileLock::acquire(&path)?;
        let content = fs::read_to_string(&path).map_err(|e| {
            StoreError::Io(format!("failed to read {}: {}", path.display(), e))
        })?;
        let doc: SchoolDocument = serde_json::from_str(&content)
            .map_err(|e| StoreError::Corrupt(format!("{}: {}", path.display(), e)))?;
        let inner = InMemorySchoolStore::from_document(doc)?;

        Ok(Self {
            path,
            inner,
            write_lock: Mutex::new(()),
            _lock: lock,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read access to the working set.
    pub fn records(&self) -> &InMemorySchoolStore {
        &self.inner
    }

    /// Insert a class and persist.
    pub fn insert_class(&self, class: ClassRecord) -> StoreResult<ClassId> {
        self.mutate(|working| working.insert_class(class))
    }

    /// Insert a student and persist.
    pub fn insert_student(&self, student: StudentRecord) -> StoreResult<StudentId> {
        self.mutate(|working| working.insert_student(student))
    }

    /// Apply `op` to a copy, persist the copy, then swap it in.
    fn mutate<T>(&self, op: impl FnOnce(&InMemorySchoolStore) -> StoreResult<T>) -> StoreResult<T> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::LockPoisoned)?;
        let working = InMemorySchoolStore::from_document(self.inner.to_document()?)?;
        let out = op(&working)?;

        let doc = working.to_document()?;
        persist(&self.path, &doc)?;
        self.inner.replace_contents(doc)?;
        Ok(out)
    }
}

fn persist(path: &Path, doc: &SchoolDocument) -> StoreResult<()> {
    let json = serde_json::to_string_pretty(doc)
        .map_err(|e| StoreError::Io(format!("failed to encode school document: {}", e)))?;
    write_atomically(path, json.as_bytes())?;
    Ok(())
}

impl SchoolStore for JsonFileStore {
    fn list_classes(&self) -> StoreResult<Vec<ClassSummary>> {
        self.inner.list_classes()
    }

    fn list_students_by_class(&self, class_id: ClassId) -> StoreResult<Vec<StudentRecord>> {
        self.inner.list_students_by_class(class_id)
    }

    fn create_class(&self, name: &str, teacher_id: Option<TeacherId>) -> StoreResult<ClassRecord> {
        self.mutate(|working| working.create_class(name, teacher_id))
    }

    fn move_students(
        &self,
        student_ids: &[StudentId],
        from: ClassId,
        to: ClassId,
    ) -> StoreResult<Vec<(StudentId, MoveOutcome)>> {
        self.mutate(|working| working.move_students(student_ids, from, to))
    }

    fn delete_student(
        &self,
        student_id: StudentId,
        expected_class: ClassId,
    ) -> StoreResult<DeleteOutcome> {
        self.mutate(|working| working.delete_student(student_id, expected_class))
    }
}

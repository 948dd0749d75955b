//! The in-memory-plus-file record store.
//!
//! The whole dataset lives in memory behind a mutex and is mirrored to a
//! single JSON file. Every mutating operation ends with a synchronous
//! [`RecordStore::persist`] of the full document before returning success.
//! The mutex serializes individual operations within one process; it does
//! not provide cross-request transactions, and separate processes sharing
//! the same file will clobber each other's writes.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;

use crate::error::StoreError;
use crate::model::{Dataset, NewStudent, Student, StudentUpdate, User};

/// Email of the administrator account seeded into a fresh dataset.
const SEED_ADMIN_EMAIL: &str = "admin@example.com";
/// Display name of the seeded administrator.
const SEED_ADMIN_NAME: &str = "Admin User";
/// Initial password of the seeded administrator (stored as a bcrypt hash).
const SEED_ADMIN_PASSWORD: &str = "admin123";

/// The record store described in the crate docs: a process-lifetime cache
/// of one JSON document, loaded once at construction.
#[derive(Debug)]
pub struct RecordStore {
    /// Backing file. `None` for an in-memory store (used by tests and as
    /// the seam for swapping in a real database later).
    path: Option<PathBuf>,
    data: Mutex<Dataset>,
}

impl RecordStore {
    /// Opens the store backed by a JSON file.
    ///
    /// If the file exists it is parsed as the full dataset; a corrupt file
    /// fails the whole operation. If it does not exist, an empty dataset
    /// seeded with one administrator user is created and persisted, with
    /// parent directories created as needed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the file cannot be read or written and
    /// `StoreError::Json` if its contents are not a valid dataset.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        if path.exists() {
            let contents = fs::read_to_string(&path)?;
            let data: Dataset = serde_json::from_str(&contents)?;
            tracing::debug!(
                users = data.users.len(),
                students = data.students.len(),
                "loaded dataset from file"
            );
            return Ok(Self {
                path: Some(path),
                data: Mutex::new(data),
            });
        }

        let store = Self {
            path: Some(path),
            data: Mutex::new(seeded_dataset()?),
        };
        store.persist(&store.lock())?;
        Ok(store)
    }

    /// Creates a store with no backing file, seeded like a fresh [`open`].
    ///
    /// Mutations skip the file write; everything else behaves identically.
    ///
    /// [`open`]: RecordStore::open
    pub fn in_memory() -> Result<Self, StoreError> {
        Ok(Self {
            path: None,
            data: Mutex::new(seeded_dataset()?),
        })
    }

    /// Looks up a user by email.
    pub fn find_user_by_email(&self, email: &str) -> Option<User> {
        self.lock().users.iter().find(|u| u.email == email).cloned()
    }

    /// Creates a new user with `id = max(existing ids, 0) + 1`.
    ///
    /// `password_hash` must already be a bcrypt hash; the store never sees
    /// plaintext passwords.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateEmail` if a user with this email
    /// already exists.
    pub fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, StoreError> {
        let mut data = self.lock();

        if data.users.iter().any(|u| u.email == email) {
            return Err(StoreError::DuplicateEmail(email.to_string()));
        }

        let id = data.users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
        let user = User {
            id,
            email: email.to_string(),
            password: password_hash.to_string(),
            name: name.to_string(),
            created_at: Utc::now().to_rfc3339(),
        };
        data.users.push(user.clone());
        self.persist(&data)?;
        Ok(user)
    }

    /// Returns all students owned by `owner_id`, in insertion order.
    pub fn list_students(&self, owner_id: i64) -> Vec<Student> {
        self.lock()
            .students
            .iter()
            .filter(|s| s.user_id == owner_id)
            .cloned()
            .collect()
    }

    /// Looks up a student by id, scoped to its owner.
    ///
    /// A record owned by someone else is indistinguishable from a record
    /// that does not exist.
    pub fn get_student(&self, owner_id: i64, id: i64) -> Option<Student> {
        self.lock()
            .students
            .iter()
            .find(|s| s.id == id && s.user_id == owner_id)
            .cloned()
    }

    /// Creates a new student owned by `owner_id`, with
    /// `id = max(existing ids, 0) + 1`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateStudentNumber` if the student number
    /// exists anywhere in the store, regardless of owner.
    pub fn create_student(
        &self,
        owner_id: i64,
        fields: NewStudent,
    ) -> Result<Student, StoreError> {
        let mut data = self.lock();

        if data
            .students
            .iter()
            .any(|s| s.student_number == fields.student_number)
        {
            return Err(StoreError::DuplicateStudentNumber(fields.student_number));
        }

        let id = data.students.iter().map(|s| s.id).max().unwrap_or(0) + 1;
        let now = Utc::now().to_rfc3339();
        let student = Student {
            id,
            user_id: owner_id,
            first_name: fields.first_name,
            last_name: fields.last_name,
            email: fields.email,
            phone: fields.phone,
            date_of_birth: fields.date_of_birth,
            student_number: fields.student_number,
            address: fields.address,
            created_at: now.clone(),
            updated_at: now,
        };
        data.students.push(student.clone());
        self.persist(&data)?;
        Ok(student)
    }

    /// Merges a partial update over an existing student and refreshes its
    /// `updated_at`. Merge rules are documented on [`StudentUpdate`].
    ///
    /// Returns `Ok(None)` when no record matches `(id, owner_id)`. An
    /// update with no fields present leaves the record untouched,
    /// timestamp included.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io`/`StoreError::Json` if persisting fails.
    pub fn update_student(
        &self,
        owner_id: i64,
        id: i64,
        update: StudentUpdate,
    ) -> Result<Option<Student>, StoreError> {
        let mut data = self.lock();

        let Some(student) = data
            .students
            .iter_mut()
            .find(|s| s.id == id && s.user_id == owner_id)
        else {
            return Ok(None);
        };

        if update.is_empty() {
            return Ok(Some(student.clone()));
        }

        if let Some(v) = update.first_name.filter(|v| !v.is_empty()) {
            student.first_name = v;
        }
        if let Some(v) = update.last_name.filter(|v| !v.is_empty()) {
            student.last_name = v;
        }
        if let Some(v) = update.email.filter(|v| !v.is_empty()) {
            student.email = v;
        }
        if let Some(v) = update.date_of_birth.filter(|v| !v.is_empty()) {
            student.date_of_birth = Some(v);
        }
        if let Some(v) = update.phone {
            student.phone = v;
        }
        if let Some(v) = update.address {
            student.address = v;
        }
        student.updated_at = Utc::now().to_rfc3339();

        let updated = student.clone();
        self.persist(&data)?;
        Ok(Some(updated))
    }

    /// Deletes a student by id, scoped to its owner.
    ///
    /// Returns `Ok(true)` if a record was found and removed, `Ok(false)`
    /// otherwise (including when the id belongs to another owner).
    pub fn delete_student(&self, owner_id: i64, id: i64) -> Result<bool, StoreError> {
        let mut data = self.lock();

        let before = data.students.len();
        data.students
            .retain(|s| !(s.id == id && s.user_id == owner_id));
        if data.students.len() == before {
            return Ok(false);
        }

        self.persist(&data)?;
        Ok(true)
    }

    /// Serializes the full dataset and overwrites the backing file.
    ///
    /// Pretty-printed with 2-space indentation (cosmetic, not a contract).
    /// No atomic rename and no lock file: concurrent processes race and the
    /// last writer wins.
    fn persist(&self, data: &Dataset) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }
        fs::write(path, serde_json::to_string_pretty(data)?)?;
        Ok(())
    }

    /// Acquires the dataset lock, recovering from poisoning.
    ///
    /// A poisoned lock means a thread panicked mid-operation; the dataset
    /// may hold a half-applied mutation, but refusing all further requests
    /// would turn one failed request into a full outage.
    fn lock(&self) -> MutexGuard<'_, Dataset> {
        match self.data.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!("record store lock poisoned, recovering with current state");
                poisoned.into_inner()
            }
        }
    }
}

/// Builds a fresh dataset containing only the seeded administrator user.
fn seeded_dataset() -> Result<Dataset, StoreError> {
    let admin = User {
        id: 1,
        email: SEED_ADMIN_EMAIL.to_string(),
        password: bcrypt::hash(SEED_ADMIN_PASSWORD, bcrypt::DEFAULT_COST)?,
        name: SEED_ADMIN_NAME.to_string(),
        created_at: Utc::now().to_rfc3339(),
    };
    Ok(Dataset {
        users: vec![admin],
        students: Vec::new(),
    })
}

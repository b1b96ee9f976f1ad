//! Class Registry
//!
//! Find-or-create access to classes by name. Callers serialize through the
//! cycle orchestrator; the store's unique-name constraint backs that up, and a
//! lost creation race resolves to the class that won it.

use crate::school::{ClassId, ClassSummary, SchoolStore, StoreError, StoreResult, StudentId};

use super::ordinal::ClassOrdinal;

/// A class resolved by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedClass {
    pub id: ClassId,
    pub name: String,
    /// True if this call created the class.
    pub created: bool,
}

/// Registry view over a school store.
pub struct ClassRegistry<'a> {
    store: &'a dyn SchoolStore,
}

impl<'a> ClassRegistry<'a> {
    pub fn new(store: &'a dyn SchoolStore) -> Self {
        Self { store }
    }

    /// All classes with their current roster sizes.
    pub fn list(&self) -> StoreResult<Vec<ClassSummary>> {
        self.store.list_classes()
    }

    /// Exact-name lookup.
    pub fn find_by_name(&self, name: &str) -> StoreResult<Option<ClassSummary>> {
        Ok(self.store.list_classes()?.into_iter().find(|c| c.name == name))
    }

    /// Return the class named `name`, creating it (with no teacher) if absent.
    ///
    /// A numbered name is refused when a differently named class already
    /// holds the same ordinal; two classes may not share a grade.
    pub fn find_or_create(&self, name: &str) -> StoreResult<ResolvedClass> {
        let classes = self.store.list_classes()?;
        if let Some(existing) = classes.iter().find(|c| c.name == name) {
            return Ok(ResolvedClass {
                id: existing.id,
                name: existing.name.clone(),
                created: false,
            });
        }

        if let Some(ordinal) = ClassOrdinal::ordinal_of(name) {
            if let Some(clash) = classes
                .iter()
                .find(|c| ClassOrdinal::ordinal_of(&c.name) == Some(ordinal))
            {
                return Err(StoreError::DuplicateClassName(format!(
                    "{} (ordinal {} already held by '{}')",
                    name, ordinal, clash.name
                )));
            }
        }

        match self.store.create_class(name, None) {
            Ok(class) => Ok(ResolvedClass {
                id: class.id,
                name: class.name,
                created: true,
            }),
            Err(StoreError::DuplicateClassName(_)) => {
                // Someone else created it between our read and our write.
                let existing = self
                    .find_by_name(name)?
                    .ok_or_else(|| StoreError::DuplicateClassName(name.to_string()))?;
                Ok(ResolvedClass {
                    id: existing.id,
                    name: existing.name,
                    created: false,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Student ids currently in a class, in stable (id) order.
    pub fn roster_of(&self, class_id: ClassId) -> StoreResult<Vec<StudentId>> {
        let mut ids: Vec<StudentId> = self
            .store
            .list_students_by_class(class_id)?
            .into_iter()
            .filter(|s| s.class_id == Some(class_id))
            .map(|s| s.id)
            .collect();
        ids.sort();
        Ok(ids)
    }
}

//! Generic model use-case service.
//!
//! # Responsibility
//! - Provide stable CRUD entry points over any `Repository` implementation.
//! - Add the small save/require helpers callers would otherwise repeat.
//!
//! # Invariants
//! - Service APIs never bypass repository persistence contracts.
//! - Service layer remains storage-agnostic.

use crate::model::Model;
use crate::repo::{Criteria, RepoError, RepoResult, Repository};
use std::marker::PhantomData;

/// Use-case service wrapper for one model's repository.
pub struct ModelService<M, R> {
    repo: R,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model, R: Repository<M>> ModelService<M, R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            _model: PhantomData,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn all(&self) -> RepoResult<Vec<M>> {
        self.repo.all()
    }

    pub fn filter(&self, criteria: &Criteria) -> RepoResult<Vec<M>> {
        self.repo.filter(criteria)
    }

    pub fn by_id(&self, id: i64) -> RepoResult<Option<M>> {
        self.repo.by_id(id)
    }

    /// Like `by_id`, but a missing row is `RepoError::NotFound`.
    pub fn require(&self, id: i64) -> RepoResult<M> {
        self.repo.by_id(id)?.ok_or(RepoError::NotFound {
            model: M::TYPE_NAME,
            id,
        })
    }

    pub fn create(&self, record: M) -> RepoResult<M> {
        self.repo.create(record)
    }

    pub fn update(&self, record: M) -> RepoResult<M> {
        self.repo.update(record)
    }

    /// Inserts unsaved records and updates persisted ones.
    pub fn save(&self, record: M) -> RepoResult<M> {
        match record.id() {
            None => self.repo.create(record),
            Some(_) => self.repo.update(record),
        }
    }

    /// Updates a record whose row must already exist.
    ///
    /// # Errors
    /// - `MissingId` when the record was never persisted.
    /// - `NotFound` when no row carries the record's id.
    pub fn update_existing(&self, record: M) -> RepoResult<M> {
        let id = record.id().ok_or(RepoError::MissingId {
            model: M::TYPE_NAME,
        })?;
        self.require(id)?;
        self.repo.update(record)
    }

    pub fn delete(&self, id: i64) -> RepoResult<()> {
        self.repo.delete(id)
    }
}

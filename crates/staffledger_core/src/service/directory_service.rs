//! Directory use-case service for departments and positions.

use std::time::Instant;

use chrono::NaiveDate;

use super::log_outcome;
use crate::model::deletion::{DeleteMode, DeleteOutcome};
use crate::model::directory::{
    Department, DepartmentDraft, DepartmentId, Position, PositionDetails, PositionId,
};
use crate::repo::directory_repo::DirectoryRepository;
use crate::repo::{EntityRef, RepoError, RepoResult};

const MODULE: &str = "directory";

pub struct DirectoryService<R: DirectoryRepository> {
    repo: R,
}

impl<R: DirectoryRepository> DirectoryService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create_department(&self, draft: &DepartmentDraft) -> RepoResult<Department> {
        let started = Instant::now();
        let result = self.repo.create_department(draft);
        let subject = result
            .as_ref()
            .map(|department| department.id.to_string())
            .unwrap_or_else(|_| "new".to_string());
        log_outcome("department_create", MODULE, started, &subject, result)
    }

    pub fn get_department(&self, id: DepartmentId) -> RepoResult<Department> {
        self.repo
            .get_department(id, false)?
            .ok_or(RepoError::NotFound(EntityRef::Department(id)))
    }

    pub fn list_departments(&self) -> RepoResult<Vec<Department>> {
        self.repo.list_departments(false)
    }

    pub fn update_department(
        &self,
        id: DepartmentId,
        draft: &DepartmentDraft,
    ) -> RepoResult<Department> {
        let started = Instant::now();
        let result = self.repo.update_department(id, draft);
        log_outcome("department_update", MODULE, started, &id, result)
    }

    pub fn delete_department(
        &self,
        id: DepartmentId,
        mode: DeleteMode,
        as_of: NaiveDate,
    ) -> RepoResult<DeleteOutcome> {
        let started = Instant::now();
        let result = self.repo.delete_department(id, mode, as_of);
        log_outcome("department_delete", MODULE, started, &id, result)
    }

    pub fn create_position(
        &self,
        department_id: DepartmentId,
        details: &PositionDetails,
    ) -> RepoResult<Position> {
        let started = Instant::now();
        let result = self.repo.create_position(department_id, details);
        log_outcome("position_create", MODULE, started, &department_id, result)
    }

    pub fn get_position(&self, id: PositionId) -> RepoResult<Position> {
        self.repo
            .get_position(id, false)?
            .ok_or(RepoError::NotFound(EntityRef::Position(id)))
    }

    /// Live positions, optionally limited to one current department.
    pub fn list_positions(&self, department_id: Option<DepartmentId>) -> RepoResult<Vec<Position>> {
        self.repo.list_positions(department_id, false)
    }

    pub fn update_position(&self, id: PositionId, details: &PositionDetails) -> RepoResult<Position> {
        let started = Instant::now();
        let result = self.repo.update_position(id, details);
        log_outcome("position_update", MODULE, started, &id, result)
    }

    /// Moves a position; existing employment attribution is untouched.
    pub fn reassign_position(
        &self,
        id: PositionId,
        department_id: DepartmentId,
    ) -> RepoResult<Position> {
        let started = Instant::now();
        let result = self.repo.reassign_position_department(id, department_id);
        log_outcome("position_reassign", MODULE, started, &id, result)
    }

    pub fn delete_position(
        &self,
        id: PositionId,
        mode: DeleteMode,
        as_of: NaiveDate,
    ) -> RepoResult<DeleteOutcome> {
        let started = Instant::now();
        let result = self.repo.delete_position(id, mode, as_of);
        log_outcome("position_delete", MODULE, started, &id, result)
    }
}

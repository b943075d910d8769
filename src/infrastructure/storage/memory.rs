//! In-memory storage implementation
//!
//! DashMap-backed `RepositoryProvider` for development and tests. The
//! conditional execution-state write relies on DashMap's per-key locking:
//! `get_mut` holds the shard lock for the whole check-and-set.

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{
    CreditAccountingEntry, Device, DeviceRepository, DomainError, DomainResult, Execution,
    ExecutionRepository, ExecutionState, LedgerRepository, Program, ProgramRepository,
    RepositoryProvider, User, UserGroup, UserGroupRepository, UserRepository,
};

pub struct InMemoryStorage {
    programs: DashMap<i32, Program>,
    devices: DashMap<i32, Device>,
    users: DashMap<Uuid, User>,
    groups: DashMap<i32, UserGroup>,
    executions: DashMap<Uuid, Execution>,
    entries: DashMap<Uuid, CreditAccountingEntry>,
    /// Append order of ledger entries, for insertion-ordered queries
    entry_order: RwLock<Vec<Uuid>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            programs: DashMap::new(),
            devices: DashMap::new(),
            users: DashMap::new(),
            groups: DashMap::new(),
            executions: DashMap::new(),
            entries: DashMap::new(),
            entry_order: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl RepositoryProvider for InMemoryStorage {
    fn programs(&self) -> &dyn ProgramRepository {
        self
    }
    fn devices(&self) -> &dyn DeviceRepository {
        self
    }
    fn users(&self) -> &dyn UserRepository {
        self
    }
    fn groups(&self) -> &dyn UserGroupRepository {
        self
    }
    fn executions(&self) -> &dyn ExecutionRepository {
        self
    }
    fn ledger(&self) -> &dyn LedgerRepository {
        self
    }
}

#[async_trait]
impl ProgramRepository for InMemoryStorage {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Program>> {
        Ok(self.programs.get(&id).map(|p| p.clone()))
    }

    async fn find_all(&self) -> DomainResult<Vec<Program>> {
        Ok(self.programs.iter().map(|e| e.value().clone()).collect())
    }

    async fn save(&self, program: Program) -> DomainResult<Program> {
        self.programs.insert(program.id, program.clone());
        Ok(program)
    }

    async fn update(&self, program: Program) -> DomainResult<()> {
        if !self.programs.contains_key(&program.id) {
            return Err(DomainError::NotFound {
                entity: "Program",
                field: "id",
                value: program.id.to_string(),
            });
        }
        self.programs.insert(program.id, program);
        Ok(())
    }
}

#[async_trait]
impl DeviceRepository for InMemoryStorage {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Device>> {
        Ok(self.devices.get(&id).map(|d| d.clone()))
    }

    async fn find_all(&self) -> DomainResult<Vec<Device>> {
        Ok(self.devices.iter().map(|e| e.value().clone()).collect())
    }

    async fn save(&self, device: Device) -> DomainResult<Device> {
        self.devices.insert(device.id, device.clone());
        Ok(device)
    }

    async fn update(&self, device: Device) -> DomainResult<()> {
        if !self.devices.contains_key(&device.id) {
            return Err(DomainError::NotFound {
                entity: "Device",
                field: "id",
                value: device.id.to_string(),
            });
        }
        self.devices.insert(device.id, device);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryStorage {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn find_all(&self) -> DomainResult<Vec<User>> {
        Ok(self.users.iter().map(|e| e.value().clone()).collect())
    }

    async fn save(&self, user: User) -> DomainResult<User> {
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> DomainResult<()> {
        if !self.users.contains_key(&user.id) {
            return Err(DomainError::NotFound {
                entity: "User",
                field: "id",
                value: user.id.to_string(),
            });
        }
        self.users.insert(user.id, user);
        Ok(())
    }
}

#[async_trait]
impl UserGroupRepository for InMemoryStorage {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<UserGroup>> {
        Ok(self.groups.get(&id).map(|g| g.clone()))
    }

    async fn find_all(&self) -> DomainResult<Vec<UserGroup>> {
        Ok(self.groups.iter().map(|e| e.value().clone()).collect())
    }

    async fn save(&self, group: UserGroup) -> DomainResult<UserGroup> {
        self.groups.insert(group.id, group.clone());
        Ok(group)
    }
}

#[async_trait]
impl ExecutionRepository for InMemoryStorage {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<Execution>> {
        Ok(self.executions.get(&id).map(|e| e.clone()))
    }

    async fn find_running_for_device(&self, device_id: i32) -> DomainResult<Option<Execution>> {
        Ok(self
            .executions
            .iter()
            .find(|e| e.device_id == device_id && e.is_running())
            .map(|e| e.value().clone()))
    }

    async fn find_running(&self) -> DomainResult<Vec<Execution>> {
        Ok(self
            .executions
            .iter()
            .filter(|e| e.is_running())
            .map(|e| e.value().clone())
            .collect())
    }

    async fn find_expired(&self, user_id: Option<Uuid>) -> DomainResult<Vec<Execution>> {
        Ok(self
            .executions
            .iter()
            .filter(|e| e.state == ExecutionState::Expired)
            .filter(|e| user_id.map_or(true, |u| e.user_id == u))
            .map(|e| e.value().clone())
            .collect())
    }

    async fn save(&self, execution: Execution) -> DomainResult<Execution> {
        self.executions.insert(execution.id, execution.clone());
        Ok(execution)
    }

    async fn transition_state(
        &self,
        id: Uuid,
        from: ExecutionState,
        to: ExecutionState,
        end_date: Option<DateTime<Utc>>,
        price: Option<Decimal>,
    ) -> DomainResult<bool> {
        let mut execution = self.executions.get_mut(&id).ok_or(DomainError::NotFound {
            entity: "Execution",
            field: "id",
            value: id.to_string(),
        })?;

        if execution.state != from {
            return Ok(false);
        }
        execution.state = to;
        if end_date.is_some() {
            execution.end_date = end_date;
        }
        if price.is_some() {
            execution.price = price;
        }
        Ok(true)
    }
}

#[async_trait]
impl LedgerRepository for InMemoryStorage {
    async fn append(&self, entry: CreditAccountingEntry) -> DomainResult<CreditAccountingEntry> {
        let id = entry.id;
        self.entries.insert(id, entry.clone());
        self.entry_order
            .write()
            .map_err(|_| DomainError::Storage("ledger order lock poisoned".into()))?
            .push(id);
        Ok(entry)
    }

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<CreditAccountingEntry>> {
        Ok(self.entries.get(&id).map(|e| e.clone()))
    }

    async fn find_by_execution(
        &self,
        execution_id: Uuid,
    ) -> DomainResult<Option<CreditAccountingEntry>> {
        Ok(self
            .entries
            .iter()
            .find(|e| e.execution_id == Some(execution_id) && !e.deleted)
            .map(|e| e.value().clone()))
    }

    async fn find_for_user(&self, user_id: Uuid) -> DomainResult<Vec<CreditAccountingEntry>> {
        let order = self
            .entry_order
            .read()
            .map_err(|_| DomainError::Storage("ledger order lock poisoned".into()))?;
        Ok(order
            .iter()
            .filter_map(|id| self.entries.get(id))
            .filter(|e| e.user_id == user_id && !e.deleted)
            .map(|e| e.clone())
            .collect())
    }

    async fn mark_deleted(&self, id: Uuid) -> DomainResult<()> {
        let mut entry = self.entries.get_mut(&id).ok_or(DomainError::NotFound {
            entity: "CreditAccountingEntry",
            field: "id",
            value: id.to_string(),
        })?;
        entry.deleted = true;
        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────────

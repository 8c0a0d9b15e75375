//! In-memory store implementing every store trait.
//!
//! All tables live behind one [`tokio::sync::RwLock`]. Each write holds
//! the write lock across its checks and its mutation, so a failed check
//! never leaves a partial change behind, mirroring a rolled-back
//! transaction. Rows are soft-deleted exactly like the SQL stores; update
//! timestamps are only tracked by the SQL stores.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{FarmStore, PondStore, TelemetryStore, keyword_matches};
use crate::context::RequestContext;
use crate::domain::request_log::round2;
use crate::domain::{
    Farm, FarmQuery, Pagination, Pond, PondQuery, PondWithFarm, RequestLog, RequestMetricSummary,
};
use crate::error::ApiError;

#[derive(Debug, Clone)]
struct FarmRecord {
    id: i64,
    name: String,
    deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
struct PondRecord {
    id: i64,
    farm_id: i64,
    name: String,
    deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct Tables {
    farms: Vec<FarmRecord>,
    ponds: Vec<PondRecord>,
    request_logs: Vec<RequestLog>,
    last_farm_id: i64,
    last_pond_id: i64,
}

impl Tables {
    fn live_farm(&self, id: i64) -> Option<&FarmRecord> {
        self.farms
            .iter()
            .find(|f| f.id == id && f.deleted_at.is_none())
    }

    fn insert_farm(&mut self, name: &str) {
        self.last_farm_id += 1;
        self.farms.push(FarmRecord {
            id: self.last_farm_id,
            name: name.to_string(),
            deleted_at: None,
        });
    }

    fn insert_pond(&mut self, farm_id: i64, name: &str) {
        self.last_pond_id += 1;
        self.ponds.push(PondRecord {
            id: self.last_pond_id,
            farm_id,
            name: name.to_string(),
            deleted_at: None,
        });
    }

    /// Live ponds of a live farm, joined with the farm name.
    fn joined_ponds<'a>(&'a self, farm_id: i64) -> impl Iterator<Item = PondWithFarm> + 'a {
        let farm = self.live_farm(farm_id);
        self.ponds
            .iter()
            .filter(move |p| p.farm_id == farm_id && p.deleted_at.is_none())
            .filter_map(move |p| {
                farm.map(|f| PondWithFarm {
                    id: p.id,
                    farm_id: f.id,
                    farm_name: f.name.clone(),
                    name: p.name.clone(),
                })
            })
    }
}

/// Takes one page out of an iterator, like `LIMIT .. OFFSET ..`.
fn page<T>(rows: impl Iterator<Item = T>, pagination: Pagination) -> Vec<T> {
    let skip = usize::try_from(pagination.offset()).unwrap_or(usize::MAX);
    let take = usize::try_from(pagination.limit).unwrap_or(usize::MAX);
    rows.skip(skip).take(take).collect()
}

fn to_u64(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}

fn to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Database-free backend for tests and `PERSISTENCE_ENABLED=false`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FarmStore for MemoryStore {
    async fn get_all(&self, _ctx: &RequestContext, query: &FarmQuery) -> Result<Vec<Farm>, ApiError> {
        let tables = self.tables.read().await;
        let rows = tables
            .farms
            .iter()
            .filter(|f| f.deleted_at.is_none() && keyword_matches(&f.name, &query.keyword))
            .map(|f| Farm {
                id: f.id,
                name: f.name.clone(),
            });
        Ok(page(rows, query.pagination))
    }

    async fn count(&self, _ctx: &RequestContext, query: &FarmQuery) -> Result<u64, ApiError> {
        let tables = self.tables.read().await;
        let n = tables
            .farms
            .iter()
            .filter(|f| f.deleted_at.is_none() && keyword_matches(&f.name, &query.keyword))
            .count();
        Ok(to_u64(n))
    }

    async fn get_one(&self, _ctx: &RequestContext, id: i64) -> Result<Option<Farm>, ApiError> {
        let tables = self.tables.read().await;
        Ok(tables.live_farm(id).map(|f| Farm {
            id: f.id,
            name: f.name.clone(),
        }))
    }

    async fn store(&self, _ctx: &RequestContext, name: &str) -> Result<(), ApiError> {
        let mut tables = self.tables.write().await;
        if tables
            .farms
            .iter()
            .any(|f| f.name == name && f.deleted_at.is_none())
        {
            return Err(ApiError::DuplicatedResource);
        }
        tables.insert_farm(name);
        Ok(())
    }

    async fn upsert(&self, _ctx: &RequestContext, farm: &Farm) -> Result<(), ApiError> {
        let mut tables = self.tables.write().await;
        if tables
            .farms
            .iter()
            .any(|f| f.id != farm.id && f.name == farm.name && f.deleted_at.is_none())
        {
            return Err(ApiError::DuplicatedResource);
        }
        match tables
            .farms
            .iter_mut()
            .find(|f| f.id == farm.id && f.deleted_at.is_none())
        {
            Some(existing) => {
                existing.name.clone_from(&farm.name);
            }
            None => tables.insert_farm(&farm.name),
        }
        Ok(())
    }

    async fn delete(&self, _ctx: &RequestContext, id: i64) -> Result<(), ApiError> {
        let mut tables = self.tables.write().await;
        let farm = tables
            .farms
            .iter_mut()
            .find(|f| f.id == id && f.deleted_at.is_none())
            .ok_or(ApiError::NotFound)?;
        farm.deleted_at = Some(Utc::now());
        Ok(())
    }
}

#[async_trait]
impl PondStore for MemoryStore {
    async fn get_all(
        &self,
        _ctx: &RequestContext,
        query: &PondQuery,
    ) -> Result<Vec<PondWithFarm>, ApiError> {
        let tables = self.tables.read().await;
        let rows = tables
            .joined_ponds(query.farm_id)
            .filter(|p| keyword_matches(&p.name, &query.keyword));
        Ok(page(rows, query.pagination))
    }

    async fn count(&self, _ctx: &RequestContext, query: &PondQuery) -> Result<u64, ApiError> {
        let tables = self.tables.read().await;
        let n = tables
            .joined_ponds(query.farm_id)
            .filter(|p| keyword_matches(&p.name, &query.keyword))
            .count();
        Ok(to_u64(n))
    }

    async fn get_one(
        &self,
        _ctx: &RequestContext,
        farm_id: i64,
        id: i64,
    ) -> Result<Option<PondWithFarm>, ApiError> {
        let tables = self.tables.read().await;
        Ok(tables.joined_ponds(farm_id).find(|p| p.id == id))
    }

    async fn store(&self, _ctx: &RequestContext, pond: &Pond) -> Result<(), ApiError> {
        let mut tables = self.tables.write().await;
        if tables.live_farm(pond.farm_id).is_none() {
            return Err(ApiError::NotFound);
        }
        if tables
            .ponds
            .iter()
            .any(|p| p.name == pond.name && p.deleted_at.is_none())
        {
            return Err(ApiError::DuplicatedResource);
        }
        tables.insert_pond(pond.farm_id, &pond.name);
        Ok(())
    }

    async fn upsert(&self, _ctx: &RequestContext, pond: &Pond) -> Result<(), ApiError> {
        let mut tables = self.tables.write().await;
        if tables.live_farm(pond.farm_id).is_none() {
            return Err(ApiError::NotFound);
        }
        if tables
            .ponds
            .iter()
            .any(|p| p.id != pond.id && p.name == pond.name && p.deleted_at.is_none())
        {
            return Err(ApiError::DuplicatedResource);
        }
        match tables
            .ponds
            .iter_mut()
            .find(|p| p.id == pond.id && p.deleted_at.is_none())
        {
            Some(existing) => {
                existing.name.clone_from(&pond.name);
            }
            None => tables.insert_pond(pond.farm_id, &pond.name),
        }
        Ok(())
    }

    async fn delete(&self, _ctx: &RequestContext, id: i64) -> Result<(), ApiError> {
        let mut tables = self.tables.write().await;
        let pond = tables
            .ponds
            .iter_mut()
            .find(|p| p.id == id && p.deleted_at.is_none())
            .ok_or(ApiError::NotFound)?;
        pond.deleted_at = Some(Utc::now());
        Ok(())
    }
}

#[async_trait]
impl TelemetryStore for MemoryStore {
    async fn store(&self, _ctx: &RequestContext, log: &RequestLog) -> Result<(), ApiError> {
        self.tables.write().await.request_logs.push(log.clone());
        Ok(())
    }

    async fn summary(&self, _ctx: &RequestContext) -> Result<Vec<RequestMetricSummary>, ApiError> {
        let tables = self.tables.read().await;
        let mut grouped: BTreeMap<&str, Vec<&RequestLog>> = BTreeMap::new();
        for log in &tables.request_logs {
            grouped.entry(log.endpoint.as_str()).or_default().push(log);
        }

        let summaries = grouped
            .into_iter()
            .map(|(endpoint, logs)| {
                let latencies = logs.iter().map(|l| l.latency);
                let min = latencies.clone().fold(f64::INFINITY, f64::min);
                let max = latencies.clone().fold(f64::NEG_INFINITY, f64::max);
                #[allow(clippy::cast_precision_loss)]
                let avg = latencies.sum::<f64>() / logs.len() as f64;
                let agents: BTreeSet<&str> = logs.iter().map(|l| l.user_agent.as_str()).collect();
                RequestMetricSummary {
                    endpoint: endpoint.to_string(),
                    min_latency: round2(min),
                    avg_latency: round2(avg),
                    max_latency: round2(max),
                    count: to_i64(logs.len()),
                    unique_user_agent: to_i64(agents.len()),
                }
            })
            .collect();
        Ok(summaries)
    }
}

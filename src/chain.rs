//! # Execution Chain
//!
//! Ordered trace of every result produced under one top-level invocation.
//! A chain is created by the top-level task and handed explicitly to nested
//! invocations; concurrent top-level invocations therefore never share one.
//!
//! Entries are appended when a task is built (the entry's position becomes the
//! result's `index`) and overwritten with the final snapshot when that task's
//! worker finalizes it. The top-level finalization seals the chain.

use crate::error::{Result, RuntimeError};
use crate::state_machine::TaskResult;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug)]
struct ChainInner {
    id: Uuid,
    results: Vec<TaskResult>,
    sealed: bool,
}

#[derive(Debug, Clone)]
pub struct Chain {
    inner: Arc<Mutex<ChainInner>>,
}

impl Chain {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ChainInner {
                id: Uuid::new_v4(),
                results: Vec::new(),
                sealed: false,
            })),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.lock().id
    }

    /// Append a new result, building it with its assigned index
    pub fn append(&self, build: impl FnOnce(Uuid, usize) -> TaskResult) -> Result<TaskResult> {
        let mut inner = self.inner.lock();
        if inner.sealed {
            return Err(RuntimeError::Sealed("chain"));
        }
        let result = build(inner.id, inner.results.len());
        inner.results.push(result.clone());
        Ok(result)
    }

    /// Replace the entry at the result's index with its latest snapshot
    pub fn record(&self, result: &TaskResult) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.sealed {
            return Err(RuntimeError::Sealed("chain"));
        }
        if result.chain_id() != inner.id {
            return Err(RuntimeError::ConfigurationError(format!(
                "result {} does not belong to chain {}",
                result.task_id(),
                inner.id
            )));
        }
        match inner.results.get_mut(result.index()) {
            Some(entry) => {
                *entry = result.clone();
                Ok(())
            }
            None => Err(RuntimeError::ConfigurationError(format!(
                "chain {} has no entry at index {}",
                inner.id,
                result.index()
            ))),
        }
    }

    pub fn get(&self, index: usize) -> Option<TaskResult> {
        self.inner.lock().results.get(index).cloned()
    }

    pub fn results(&self) -> Vec<TaskResult> {
        self.inner.lock().results.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().results.is_empty()
    }

    pub fn seal(&self) {
        self.inner.lock().sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.inner.lock().sealed
    }

    pub fn to_json(&self) -> Value {
        let inner = self.inner.lock();
        json!({
            "id": inner.id,
            "results": inner.results.iter().map(TaskResult::to_json).collect::<Vec<_>>(),
        })
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;

    fn append(chain: &Chain, name: &str) -> TaskResult {
        chain
            .append(|chain_id, index| {
                TaskResult::new(Uuid::new_v4(), name, chain_id, index, Context::new())
            })
            .unwrap()
    }

    #[test]
    fn test_indexes_follow_append_order() {
        let chain = Chain::new();
        let first = append(&chain, "Parent");
        let second = append(&chain, "Child");

        assert_eq!(first.index(), 0);
        assert_eq!(second.index(), 1);
        assert_eq!(second.chain_id(), chain.id());
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn test_record_replaces_snapshot() {
        let chain = Chain::new();
        let mut result = append(&chain, "Parent");
        result.fail("boom").unwrap();

        chain.record(&result).unwrap();
        assert!(chain.get(0).unwrap().is_failed());
    }

    #[test]
    fn test_sealed_chain_rejects_appends() {
        let chain = Chain::new();
        append(&chain, "Parent");
        chain.seal();

        let err = chain
            .append(|chain_id, index| {
                TaskResult::new(Uuid::new_v4(), "Late", chain_id, index, Context::new())
            })
            .unwrap_err();
        assert_eq!(err, RuntimeError::Sealed("chain"));
    }

    #[test]
    fn test_foreign_results_are_rejected() {
        let chain = Chain::new();
        append(&chain, "Parent");
        let other = Chain::new();
        let foreign = append(&other, "Elsewhere");

        assert!(chain.record(&foreign).is_err());
    }
}

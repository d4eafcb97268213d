//! In-process executer over the basic resource store.
//!
//! Input commands are `resource = literal` assignments separated by `;`. Each
//! accepted command becomes one action list in the pool, and every tick
//! applies the oldest pending list to memory.

use super::{ExecutionEngine, ExecutionSnapshot, PoolElem};
use crate::control::LogLevel;
use crate::error::InputError;
use crate::memory::{parse_value, ResourceStore, Value, ValueKind};
use std::collections::VecDeque;
use tracing::{debug, info};

/// A pending assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub resource: String,
    pub value: Value,
}

impl Action {
    fn to_pool_elem(&self) -> PoolElem {
        PoolElem {
            resource: self.resource.clone(),
            value: self.value.to_string(),
        }
    }
}

pub struct BasicExecuter {
    name: String,
    memory: ResourceStore,
    rules: Vec<String>,
    pool: VecDeque<Vec<Action>>,
    log_level: LogLevel,
    ticks: u64,
}

impl BasicExecuter {
    pub fn new(name: impl Into<String>, memory: ResourceStore, rules: Vec<String>) -> Self {
        let executer = Self {
            name: name.into(),
            memory,
            rules,
            pool: VecDeque::new(),
            log_level: LogLevel::default(),
            ticks: 0,
        };
        info!(
            agent = %executer.name,
            resources = executer.memory.len(),
            rules = executer.rules.len(),
            "Executer created"
        );
        executer
    }

    fn parse_assignment(&self, assignment: &str) -> Result<Action, InputError> {
        let (resource, literal) = assignment
            .split_once('=')
            .ok_or_else(|| InputError::Syntax(assignment.to_string()))?;
        let resource = resource.trim();
        if resource.is_empty() {
            return Err(InputError::Syntax(assignment.to_string()));
        }
        let kind = self
            .memory
            .kind_of(resource)
            .ok_or_else(|| InputError::UnknownResource(resource.to_string()))?;
        let literal = literal.trim();
        let literal = match kind {
            ValueKind::Text => literal
                .strip_prefix('"')
                .and_then(|rest| rest.strip_suffix('"'))
                .unwrap_or(literal),
            _ => literal,
        };
        let value = parse_value(kind, resource, literal)?;
        Ok(Action {
            resource: resource.to_string(),
            value,
        })
    }
}

impl ExecutionEngine for BasicExecuter {
    fn tick(&mut self) {
        self.ticks += 1;
        let Some(actions) = self.pool.pop_front() else {
            return;
        };
        for action in &actions {
            if self.log_level.allows(LogLevel::Debug) {
                debug!(
                    agent = %self.name,
                    tick = self.ticks,
                    resource = %action.resource,
                    value = %action.value,
                    "Applying action"
                );
            }
            self.memory.insert(action.resource.clone(), action.value.clone());
        }
        if self.log_level.allows(LogLevel::Info) {
            info!(
                agent = %self.name,
                tick = self.ticks,
                actions = actions.len(),
                pending = self.pool.len(),
                "Executed action list"
            );
        }
    }

    fn input(&mut self, command: &str) -> Result<(), InputError> {
        let actions = command
            .split(';')
            .map(str::trim)
            .filter(|assignment| !assignment.is_empty())
            .map(|assignment| self.parse_assignment(assignment))
            .collect::<Result<Vec<_>, _>>()?;
        if actions.is_empty() {
            return Err(InputError::Empty);
        }
        self.pool.push_back(actions);
        Ok(())
    }

    fn snapshot(&self) -> ExecutionSnapshot {
        ExecutionSnapshot {
            memory: self.memory.clone(),
            pool: self
                .pool
                .iter()
                .map(|actions| actions.iter().map(Action::to_pool_elem).collect())
                .collect(),
        }
    }

    fn log_level(&self) -> LogLevel {
        self.log_level
    }

    fn set_log_level(&mut self, level: LogLevel) {
        self.log_level = level;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Value;

    fn executer() -> BasicExecuter {
        let mut memory = ResourceStore::new();
        memory.insert("count", Value::Integer(0));
        memory.insert("lamp", Value::Bool(false));
        memory.insert("label", Value::Text(String::new()));
        memory.insert("ratio", Value::Float(1.0));
        BasicExecuter::new("agent-test", memory, vec!["rule noop on count".to_string()])
    }

    #[test]
    fn test_input_queues_until_tick() {
        let mut exec = executer();
        exec.input("count = 5; lamp = true").unwrap();

        let snapshot = exec.snapshot();
        assert_eq!(snapshot.memory.integer.get("count"), Some(&0));
        assert_eq!(
            snapshot.pool,
            vec![vec![
                PoolElem {
                    resource: "count".to_string(),
                    value: "5".to_string()
                },
                PoolElem {
                    resource: "lamp".to_string(),
                    value: "true".to_string()
                },
            ]]
        );

        exec.tick();
        let snapshot = exec.snapshot();
        assert_eq!(snapshot.memory.integer.get("count"), Some(&5));
        assert_eq!(snapshot.memory.bool.get("lamp"), Some(&true));
        assert!(snapshot.pool.is_empty());
        assert_eq!(exec.ticks, 1);
    }

    #[test]
    fn test_tick_applies_one_action_list_per_tick() {
        let mut exec = executer();
        exec.input("count = 1").unwrap();
        exec.input("count = 2").unwrap();

        exec.tick();
        assert_eq!(exec.snapshot().memory.integer.get("count"), Some(&1));
        exec.tick();
        assert_eq!(exec.snapshot().memory.integer.get("count"), Some(&2));
        exec.tick();
        assert_eq!(exec.snapshot().memory.integer.get("count"), Some(&2));
        assert_eq!(exec.ticks, 3);
    }

    #[test]
    fn test_rejected_input_leaves_pool_untouched() {
        let mut exec = executer();
        assert_eq!(
            exec.input("count = 1; ghost = 2"),
            Err(InputError::UnknownResource("ghost".to_string()))
        );
        assert!(matches!(exec.input("count = many"), Err(InputError::Value(_))));
        assert_eq!(
            exec.input("count"),
            Err(InputError::Syntax("count".to_string()))
        );
        assert_eq!(exec.input(" ; "), Err(InputError::Empty));
        assert!(exec.snapshot().pool.is_empty());
    }

    #[test]
    fn test_non_finite_float_input_is_rejected() {
        let mut exec = executer();
        for command in ["ratio = NaN", "ratio = inf", "ratio = 0.5; ratio = -inf"] {
            assert!(matches!(exec.input(command), Err(InputError::Value(_))));
        }
        assert!(exec.snapshot().pool.is_empty());

        exec.input("ratio = 0.5").unwrap();
        exec.tick();
        assert_eq!(exec.snapshot().memory.float.get("ratio"), Some(&0.5));
    }

    #[test]
    fn test_text_literal_quotes_are_stripped() {
        let mut exec = executer();
        exec.input(r#"label = "hello world""#).unwrap();
        exec.tick();
        assert_eq!(
            exec.snapshot().memory.text.get("label").map(String::as_str),
            Some("hello world")
        );
    }

    #[test]
    fn test_log_level_defaults_to_error() {
        let mut exec = executer();
        assert_eq!(exec.log_level(), LogLevel::Error);
        exec.set_log_level(LogLevel::Debug);
        assert_eq!(exec.log_level(), LogLevel::Debug);
        assert_eq!(exec.rules.len(), 1);
    }
}

//! 状态机
//!
//! 定义分诊单、预约和紧急警报的合法状态转换

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;
use triage_core::{AlertStatus, AppointmentStatus, ReceiptStatus, Result, TriageError};

/// 分诊队列策略
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueuePolicy {
    /// 是否允许 PENDING 直接转为 COMPLETED（自动分诊）
    pub allow_direct_completion: bool,
}

impl Default for QueuePolicy {
    fn default() -> Self {
        Self {
            allow_direct_completion: true,
        }
    }
}

/// 状态转换表
#[derive(Debug, Clone)]
pub struct StateMachine<S> {
    entity: &'static str,
    transitions: HashMap<S, HashSet<S>>,
}

impl<S> StateMachine<S>
where
    S: Copy + Eq + Hash + Debug + std::fmt::Display,
{
    pub fn new(entity: &'static str) -> Self {
        Self {
            entity,
            transitions: HashMap::new(),
        }
    }

    /// 添加一条转换规则
    pub fn allow(mut self, from: S, to: S) -> Self {
        self.transitions.entry(from).or_default().insert(to);
        self
    }

    /// 检查状态转换是否有效
    pub fn can_transition(&self, from: S, to: S) -> bool {
        self.transitions
            .get(&from)
            .map(|targets| targets.contains(&to))
            .unwrap_or(false)
    }

    /// 校验状态转换，不合法时返回 InvalidTransition
    pub fn check(&self, from: S, to: S) -> Result<()> {
        if self.can_transition(from, to) {
            Ok(())
        } else {
            tracing::warn!("Rejected {} transition {} -> {}", self.entity, from, to);
            Err(TriageError::InvalidTransition {
                entity: self.entity,
                from: from.to_string(),
                to: to.to_string(),
            })
        }
    }

    /// 获取某状态下所有可达状态
    pub fn possible_targets(&self, from: S) -> Vec<S> {
        self.transitions
            .get(&from)
            .map(|targets| targets.iter().copied().collect())
            .unwrap_or_default()
    }

    /// 没有出边的状态即终态
    pub fn is_terminal(&self, state: S) -> bool {
        self.transitions
            .get(&state)
            .map(|targets| targets.is_empty())
            .unwrap_or(true)
    }
}

/// 分诊单状态机
///
/// PENDING → {QUEUED, PROCESSED, COMPLETED}，QUEUED → PROCESSED，PROCESSED → COMPLETED。
/// PROCESSED 重新入队走 `enqueue`，不在此表中。
pub fn receipt_state_machine(policy: &QueuePolicy) -> StateMachine<ReceiptStatus> {
    let machine = StateMachine::new("receipt")
        .allow(ReceiptStatus::Pending, ReceiptStatus::Queued)
        .allow(ReceiptStatus::Pending, ReceiptStatus::Processed)
        .allow(ReceiptStatus::Queued, ReceiptStatus::Processed)
        .allow(ReceiptStatus::Processed, ReceiptStatus::Completed);

    if policy.allow_direct_completion {
        machine.allow(ReceiptStatus::Pending, ReceiptStatus::Completed)
    } else {
        machine
    }
}

/// 预约状态机
pub fn appointment_state_machine() -> StateMachine<AppointmentStatus> {
    StateMachine::new("appointment")
        .allow(AppointmentStatus::Pending, AppointmentStatus::Confirmed)
        .allow(AppointmentStatus::Pending, AppointmentStatus::Cancelled)
        .allow(AppointmentStatus::Confirmed, AppointmentStatus::Completed)
        .allow(AppointmentStatus::Confirmed, AppointmentStatus::Cancelled)
}

/// 紧急警报状态机，严格线性不可跳过
pub fn alert_state_machine() -> StateMachine<AlertStatus> {
    StateMachine::new("emergency_alert")
        .allow(AlertStatus::Pending, AlertStatus::Acknowledged)
        .allow(AlertStatus::Acknowledged, AlertStatus::Responded)
        .allow(AlertStatus::Responded, AlertStatus::Closed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_transitions() {
        let sm = receipt_state_machine(&QueuePolicy::default());

        assert!(sm.can_transition(ReceiptStatus::Pending, ReceiptStatus::Queued));
        assert!(sm.can_transition(ReceiptStatus::Queued, ReceiptStatus::Processed));
        assert!(sm.can_transition(ReceiptStatus::Processed, ReceiptStatus::Completed));
        assert!(!sm.can_transition(ReceiptStatus::Queued, ReceiptStatus::Completed));
        assert!(!sm.can_transition(ReceiptStatus::Completed, ReceiptStatus::Pending));
        assert!(!sm.can_transition(ReceiptStatus::Processed, ReceiptStatus::Queued));
        assert!(sm.is_terminal(ReceiptStatus::Completed));
    }

    #[test]
    fn test_direct_completion_follows_policy() {
        let enabled = receipt_state_machine(&QueuePolicy::default());
        assert!(enabled.check(ReceiptStatus::Pending, ReceiptStatus::Completed).is_ok());

        let disabled = receipt_state_machine(&QueuePolicy {
            allow_direct_completion: false,
        });
        let err = disabled
            .check(ReceiptStatus::Pending, ReceiptStatus::Completed)
            .unwrap_err();
        assert!(matches!(err, TriageError::InvalidTransition { entity: "receipt", .. }));
    }

    #[test]
    fn test_appointment_terminal_states() {
        let sm = appointment_state_machine();

        assert!(sm.can_transition(AppointmentStatus::Confirmed, AppointmentStatus::Cancelled));
        assert!(!sm.can_transition(AppointmentStatus::Pending, AppointmentStatus::Completed));
        assert!(sm.is_terminal(AppointmentStatus::Completed));
        assert!(sm.is_terminal(AppointmentStatus::Cancelled));
        assert!(!sm.is_terminal(AppointmentStatus::Confirmed));
    }

    #[test]
    fn test_alert_is_strictly_linear() {
        let sm = alert_state_machine();

        assert_eq!(sm.possible_targets(AlertStatus::Pending), vec![AlertStatus::Acknowledged]);
        assert!(sm.check(AlertStatus::Pending, AlertStatus::Responded).is_err());
        assert!(sm.check(AlertStatus::Pending, AlertStatus::Closed).is_err());
        assert!(sm.check(AlertStatus::Acknowledged, AlertStatus::Pending).is_err());
        assert!(sm.check(AlertStatus::Responded, AlertStatus::Closed).is_ok());
    }
}

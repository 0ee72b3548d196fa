//! Registre des novedades (vacances, permis, incapacités).
//!
//! Le registre appartient à l'appelant : il est créé pour une session, reçoit
//! des soumissions puis est passé en lecture au `ScheduleBuilder`. Deux vues
//! coexistent :
//! - l'historique brut, en ajout seul, pour l'audit ;
//! - l'ensemble dérivé (opérateur, date) utilisé par le calcul du planning.

use crate::model::{LeaveKind, Operator, OperatorId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

/// Nombre maximal de jours d'une novedad en intervalle.
pub const MAX_RANGE_DAYS: i64 = 366;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LeaveError {
    #[error("invalid date range: {start} is after {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
    #[error("date range {start}..={end} spans more than {max} days")]
    RangeTooLong {
        start: NaiveDate,
        end: NaiveDate,
        max: i64,
    },
    #[error("empty date selection for operator {0}")]
    EmptySelection(String),
    #[error("unknown operator: {0}")]
    UnknownOperator(String),
}

/// Identifiant fort pour une soumission
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubmissionId(String);

impl SubmissionId {
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LeaveDates {
    /// Intervalle inclusif `[start, end]`.
    Range { start: NaiveDate, end: NaiveDate },
    List { dates: Vec<NaiveDate> },
}

impl LeaveDates {
    pub fn expand(&self) -> Vec<NaiveDate> {
        match self {
            LeaveDates::Range { start, end } => start
                .iter_days()
                .take_while(|d| d <= end)
                .collect(),
            LeaveDates::List { dates } => dates
                .iter()
                .copied()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionMode {
    /// S'ajoute aux congés existants de l'opérateur.
    Append,
    /// Remplace toute la sélection précédente de l'opérateur.
    Replace,
}

/// Soumission brute telle que conservée dans l'historique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveSubmission {
    pub id: SubmissionId,
    pub operator: OperatorId,
    pub kind: LeaveKind,
    pub dates: LeaveDates,
    pub mode: SubmissionMode,
    /// Dates reprises à une soumission antérieure (dernier enregistré gagne).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<NaiveDate>,
}

/// Accusé de réception d'une soumission acceptée.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveReceipt {
    pub id: SubmissionId,
    pub dates: usize,
    pub overrides: Vec<NaiveDate>,
}

impl LeaveReceipt {
    pub fn has_overlap(&self) -> bool {
        !self.overrides.is_empty()
    }
}

/// Registre des congés d'une session.
#[derive(Debug, Clone, Default)]
pub struct LeaveRegistry {
    operators: Vec<OperatorId>,
    history: Vec<LeaveSubmission>,
    // date -> index dans `history` de la soumission propriétaire
    by_operator: HashMap<OperatorId, HashMap<NaiveDate, usize>>,
}

impl LeaveRegistry {
    pub fn new(operators: &[Operator]) -> Self {
        Self {
            operators: operators.iter().map(|o| o.id.clone()).collect(),
            history: Vec::new(),
            by_operator: HashMap::new(),
        }
    }

    /// Reconstruit un registre en rejouant un historique sauvegardé.
    pub fn replay(
        operators: &[Operator],
        history: Vec<LeaveSubmission>,
    ) -> Result<Self, LeaveError> {
        let mut registry = Self::new(operators);
        for submission in history {
            registry.apply(
                submission.operator,
                submission.kind,
                submission.dates,
                submission.mode,
                Some(submission.id),
            )?;
        }
        Ok(registry)
    }

    pub fn history(&self) -> &[LeaveSubmission] {
        &self.history
    }

    pub fn submit_range(
        &mut self,
        operator: &OperatorId,
        start: NaiveDate,
        end: NaiveDate,
        kind: LeaveKind,
    ) -> Result<LeaveReceipt, LeaveError> {
        check_range(start, end)?;
        let dates = LeaveDates::Range { start, end };
        self.apply(operator.clone(), kind, dates, SubmissionMode::Append, None)
    }

    pub fn submit_dates(
        &mut self,
        operator: &OperatorId,
        dates: &[NaiveDate],
        kind: LeaveKind,
    ) -> Result<LeaveReceipt, LeaveError> {
        if dates.is_empty() {
            return Err(LeaveError::EmptySelection(operator.to_string()));
        }
        let dates = LeaveDates::List {
            dates: dates.to_vec(),
        };
        self.apply(operator.clone(), kind, dates, SubmissionMode::Append, None)
    }

    /// Sélection directe par opérateur : remplace toutes ses dates précédentes.
    pub fn replace_range(
        &mut self,
        operator: &OperatorId,
        start: NaiveDate,
        end: NaiveDate,
        kind: LeaveKind,
    ) -> Result<LeaveReceipt, LeaveError> {
        check_range(start, end)?;
        let dates = LeaveDates::Range { start, end };
        self.apply(operator.clone(), kind, dates, SubmissionMode::Replace, None)
    }

    /// Retire toute la sélection d'un opérateur (tracé dans l'historique).
    pub fn clear_operator(&mut self, operator: &OperatorId) -> Result<LeaveReceipt, LeaveError> {
        let dates = LeaveDates::List { dates: Vec::new() };
        self.apply(operator.clone(), LeaveKind::Vacation, dates, SubmissionMode::Replace, None)
    }

    pub fn is_on_leave(&self, operator: &OperatorId, date: NaiveDate) -> bool {
        self.by_operator
            .get(operator)
            .is_some_and(|dates| dates.contains_key(&date))
    }

    /// Soumission qui détient actuellement la date.
    pub fn leave_on(&self, operator: &OperatorId, date: NaiveDate) -> Option<&LeaveSubmission> {
        let idx = *self.by_operator.get(operator)?.get(&date)?;
        self.history.get(idx)
    }

    pub fn dates_for(&self, operator: &OperatorId) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self
            .by_operator
            .get(operator)
            .map(|d| d.keys().copied().collect())
            .unwrap_or_default();
        dates.sort();
        dates
    }

    fn apply(
        &mut self,
        operator: OperatorId,
        kind: LeaveKind,
        dates: LeaveDates,
        mode: SubmissionMode,
        id: Option<SubmissionId>,
    ) -> Result<LeaveReceipt, LeaveError> {
        if !self.operators.contains(&operator) {
            return Err(LeaveError::UnknownOperator(operator.to_string()));
        }
        if let LeaveDates::Range { start, end } = dates {
            check_range(start, end)?;
        }
        let expanded = dates.expand();
        if expanded.is_empty() && mode == SubmissionMode::Append {
            return Err(LeaveError::EmptySelection(operator.to_string()));
        }

        let index = self.history.len();
        let owned = self.by_operator.entry(operator.clone()).or_default();
        if mode == SubmissionMode::Replace {
            owned.clear();
        }
        let mut overrides = Vec::new();
        for date in &expanded {
            if owned.insert(*date, index).is_some() {
                overrides.push(*date);
            }
        }

        if !overrides.is_empty() {
            warn!(
                operator = %operator,
                overlapping = overrides.len(),
                "leave submission overlaps earlier leave; last registered wins"
            );
        }

        let id = id.unwrap_or_else(SubmissionId::random);
        self.history.push(LeaveSubmission {
            id: id.clone(),
            operator,
            kind,
            dates,
            mode,
            overrides: overrides.clone(),
        });

        Ok(LeaveReceipt {
            id,
            dates: expanded.len(),
            overrides,
        })
    }
}

fn check_range(start: NaiveDate, end: NaiveDate) -> Result<(), LeaveError> {
    if start > end {
        return Err(LeaveError::InvalidDateRange { start, end });
    }
    if end.signed_duration_since(start).num_days() >= MAX_RANGE_DAYS {
        return Err(LeaveError::RangeTooLong {
            start,
            end,
            max: MAX_RANGE_DAYS,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    fn registry() -> LeaveRegistry {
        LeaveRegistry::new(&Operator::default_roster())
    }

    #[test]
    fn range_marks_each_inclusive_date() {
        let mut reg = registry();
        let op2 = OperatorId::new("Op2");
        let receipt = reg.submit_range(&op2, d(10), d(12), LeaveKind::Vacation).unwrap();
        assert_eq!(receipt.dates, 3);
        assert!(!reg.is_on_leave(&op2, d(9)));
        assert!(reg.is_on_leave(&op2, d(10)));
        assert!(reg.is_on_leave(&op2, d(12)));
        assert!(!reg.is_on_leave(&op2, d(13)));
        assert!(!reg.is_on_leave(&OperatorId::new("Op1"), d(11)));
    }

    #[test]
    fn inverted_range_is_rejected_without_side_effect() {
        let mut reg = registry();
        let op1 = OperatorId::new("Op1");
        let err = reg.submit_range(&op1, d(12), d(10), LeaveKind::Permission).unwrap_err();
        assert!(matches!(err, LeaveError::InvalidDateRange { .. }));
        assert!(reg.history().is_empty());
        assert!(reg.dates_for(&op1).is_empty());
    }

    #[test]
    fn oversized_range_is_rejected() {
        let mut reg = registry();
        let op1 = OperatorId::new("Op1");
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(9999, 12, 31).unwrap();
        let err = reg.submit_range(&op1, start, end, LeaveKind::Vacation).unwrap_err();
        assert!(matches!(err, LeaveError::RangeTooLong { max: 366, .. }));
        assert!(reg.history().is_empty());
        assert!(reg.dates_for(&op1).is_empty());

        // 2024 est bissextile : 366 jours passent encore
        let last = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let receipt = reg.submit_range(&op1, start, last, LeaveKind::Vacation).unwrap();
        assert_eq!(receipt.dates, 366);
    }

    #[test]
    fn replay_rejects_oversized_stored_range() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let history = vec![LeaveSubmission {
            id: SubmissionId::random(),
            operator: OperatorId::new("Op1"),
            kind: LeaveKind::Vacation,
            dates: LeaveDates::Range {
                start,
                end: NaiveDate::from_ymd_opt(2099, 1, 1).unwrap(),
            },
            mode: SubmissionMode::Append,
            overrides: Vec::new(),
        }];
        let err = LeaveRegistry::replay(&Operator::default_roster(), history).unwrap_err();
        assert!(matches!(err, LeaveError::RangeTooLong { .. }));
    }

    #[test]
    fn empty_selection_is_rejected() {
        let mut reg = registry();
        let err = reg
            .submit_dates(&OperatorId::new("Op3"), &[], LeaveKind::Incapacity)
            .unwrap_err();
        assert_eq!(err, LeaveError::EmptySelection("Op3".into()));
    }

    #[test]
    fn unknown_operator_is_rejected() {
        let mut reg = registry();
        let err = reg
            .submit_range(&OperatorId::new("Op9"), d(1), d(2), LeaveKind::Vacation)
            .unwrap_err();
        assert_eq!(err, LeaveError::UnknownOperator("Op9".into()));
    }

    #[test]
    fn overlap_is_last_write_wins_and_audited() {
        let mut reg = registry();
        let op4 = OperatorId::new("Op4");
        reg.submit_range(&op4, d(1), d(5), LeaveKind::Vacation).unwrap();
        let receipt = reg.submit_range(&op4, d(4), d(6), LeaveKind::Incapacity).unwrap();
        assert!(receipt.has_overlap());
        assert_eq!(receipt.overrides, vec![d(4), d(5)]);
        assert_eq!(reg.leave_on(&op4, d(4)).unwrap().kind, LeaveKind::Incapacity);
        assert_eq!(reg.leave_on(&op4, d(3)).unwrap().kind, LeaveKind::Vacation);
        assert_eq!(reg.history().len(), 2);
        assert_eq!(reg.history()[1].overrides, vec![d(4), d(5)]);
    }

    #[test]
    fn replace_drops_previous_selection() {
        let mut reg = registry();
        let op1 = OperatorId::new("Op1");
        reg.submit_range(&op1, d(1), d(3), LeaveKind::Vacation).unwrap();
        reg.replace_range(&op1, d(20), d(21), LeaveKind::Vacation).unwrap();
        assert_eq!(reg.dates_for(&op1), vec![d(20), d(21)]);

        reg.clear_operator(&op1).unwrap();
        assert!(reg.dates_for(&op1).is_empty());
        assert_eq!(reg.history().len(), 3);
    }

    #[test]
    fn replay_rebuilds_the_same_state() {
        let mut reg = registry();
        let op2 = OperatorId::new("Op2");
        reg.submit_range(&op2, d(10), d(12), LeaveKind::Vacation).unwrap();
        reg.submit_dates(&op2, &[d(20), d(20), d(22)], LeaveKind::Permission).unwrap();

        let again =
            LeaveRegistry::replay(&Operator::default_roster(), reg.history().to_vec()).unwrap();
        assert_eq!(again.dates_for(&op2), reg.dates_for(&op2));
        assert_eq!(again.history(), reg.history());
    }
}

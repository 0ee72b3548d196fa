//! Stratégies de rotation : affectation de base (sans congés) pour chaque
//! couple (opérateur, jour).
//!
//! Le jour est un index relatif à une date d'ancrage (index 0). Les deux
//! stratégies sont des fonctions pures de `(index opérateur, index jour)`.

use crate::model::ShiftCode;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RotationError {
    #[error("rotation table must contain at least one row")]
    EmptyTable,
    #[error("rotation table row {row} has {found} entries, roster has {expected} operators")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("rotation table row {row} contains a leave code")]
    LeaveInTable { row: usize },
    #[error("staggered cycle needs at least one work day")]
    NoWorkDays,
}

/// Stratégie d'affectation interchangeable.
pub trait RotationStrategy {
    fn name(&self) -> &'static str;

    /// Code de base pour l'opérateur `operator` au jour `day` (relatif à l'ancrage).
    fn shift_for(&self, operator: usize, day: i64) -> ShiftCode;

    /// Vérifie que la stratégie est applicable à un roster de `operators` personnes.
    fn check_roster(&self, _operators: usize) -> Result<(), RotationError> {
        Ok(())
    }
}

/// Cycle décalé : `work_days` jours d'un même turno puis `rest_days` de repos ;
/// le turno avance de un (mod 3) à chaque bloc, et chaque opérateur démarre un
/// turno plus loin que le précédent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaggeredCycle {
    #[serde(default = "default_work_days")]
    pub work_days: u32,
    #[serde(default = "default_rest_days")]
    pub rest_days: u32,
}

fn default_work_days() -> u32 {
    6
}

fn default_rest_days() -> u32 {
    2
}

impl Default for StaggeredCycle {
    fn default() -> Self {
        Self {
            work_days: default_work_days(),
            rest_days: default_rest_days(),
        }
    }
}

impl StaggeredCycle {
    pub fn cycle_len(&self) -> i64 {
        i64::from(self.work_days) + i64::from(self.rest_days)
    }
}

impl RotationStrategy for StaggeredCycle {
    fn name(&self) -> &'static str {
        "staggered"
    }

    fn shift_for(&self, operator: usize, day: i64) -> ShiftCode {
        let len = self.cycle_len();
        if self.work_days == 0 || len == 0 {
            return ShiftCode::RestDay;
        }
        let block = day.div_euclid(len);
        let pos = day.rem_euclid(len);
        if pos >= i64::from(self.work_days) {
            return ShiftCode::RestDay;
        }
        let kinds = ShiftCode::WORK.len() as i64;
        let slot = (operator as i64 + block).rem_euclid(kinds) as usize;
        ShiftCode::WORK[slot]
    }

    fn check_roster(&self, _operators: usize) -> Result<(), RotationError> {
        if self.work_days == 0 {
            return Err(RotationError::NoWorkDays);
        }
        Ok(())
    }
}

/// Table explicite : une ligne par jour du cycle, une colonne par opérateur.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedTable {
    #[serde(default = "FixedTable::default_rows")]
    pub rows: Vec<Vec<ShiftCode>>,
}

impl Default for FixedTable {
    fn default() -> Self {
        Self {
            rows: Self::default_rows(),
        }
    }
}

impl FixedTable {
    pub fn new(rows: Vec<Vec<ShiftCode>>) -> Result<Self, RotationError> {
        let table = Self { rows };
        let width = table.rows.first().map(Vec::len).unwrap_or(0);
        table.check_roster(width)?;
        Ok(table)
    }

    /// Table 8 jours pour 4 opérateurs : 6 jours travaillés / 2 de repos
    /// chacun, T1, T2 et T3 couverts chaque jour.
    pub fn default_rows() -> Vec<Vec<ShiftCode>> {
        use crate::model::ShiftCode::{
            RestDay as X, WorkShift1 as T1, WorkShift2 as T2, WorkShift3 as T3,
        };
        let pairs = [
            [T1, T2, T3, X],
            [X, T1, T2, T3],
            [T3, X, T1, T2],
            [T2, T3, X, T1],
        ];
        pairs
            .iter()
            .flat_map(|row| [row.to_vec(), row.to_vec()])
            .collect()
    }
}

impl RotationStrategy for FixedTable {
    fn name(&self) -> &'static str {
        "fixed_table"
    }

    fn shift_for(&self, operator: usize, day: i64) -> ShiftCode {
        if self.rows.is_empty() {
            return ShiftCode::RestDay;
        }
        let row = day.rem_euclid(self.rows.len() as i64) as usize;
        self.rows[row]
            .get(operator)
            .copied()
            .unwrap_or(ShiftCode::RestDay)
    }

    fn check_roster(&self, operators: usize) -> Result<(), RotationError> {
        if self.rows.is_empty() {
            return Err(RotationError::EmptyTable);
        }
        for (row, codes) in self.rows.iter().enumerate() {
            if codes.len() != operators {
                return Err(RotationError::RowWidth {
                    row,
                    expected: operators,
                    found: codes.len(),
                });
            }
            if codes.contains(&ShiftCode::OnLeave) {
                return Err(RotationError::LeaveInTable { row });
            }
        }
        Ok(())
    }
}

/// Choix de stratégie par configuration (`"strategy": "staggered" | "fixed_table"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum Rotation {
    Staggered(StaggeredCycle),
    FixedTable(FixedTable),
}

impl Default for Rotation {
    fn default() -> Self {
        Rotation::Staggered(StaggeredCycle::default())
    }
}

impl Rotation {
    pub fn strategy(&self) -> &dyn RotationStrategy {
        match self {
            Rotation::Staggered(s) => s,
            Rotation::FixedTable(t) => t,
        }
    }

    /// Stratégie par nom, avec ses paramètres par défaut.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "staggered" | "6x2" => Some(Rotation::Staggered(StaggeredCycle::default())),
            "fixed_table" | "table" => Some(Rotation::FixedTable(FixedTable::default())),
            _ => None,
        }
    }
}

/// Affectation de base pour chaque date : une ligne par date, un code par
/// opérateur. La séquence est tronquée exactement aux dates demandées.
pub fn base_rows(
    strategy: &dyn RotationStrategy,
    operators: usize,
    anchor: NaiveDate,
    dates: &[NaiveDate],
) -> Vec<Vec<ShiftCode>> {
    dates
        .iter()
        .map(|date| {
            let day = date.signed_duration_since(anchor).num_days();
            (0..operators).map(|op| strategy.shift_for(op, day)).collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ShiftCode::{
        RestDay as X, WorkShift1 as T1, WorkShift2 as T2, WorkShift3 as T3,
    };

    fn column(
        strategy: &dyn RotationStrategy,
        op: usize,
        days: std::ops::Range<i64>,
    ) -> Vec<ShiftCode> {
        days.map(|d| strategy.shift_for(op, d)).collect()
    }

    #[test]
    fn staggered_first_operator_walks_t1_t2_t3() {
        let s = StaggeredCycle::default();
        let col = column(&s, 0, 0..24);
        assert_eq!(&col[0..6], &[T1; 6]);
        assert_eq!(&col[6..8], &[X; 2]);
        assert_eq!(&col[8..14], &[T2; 6]);
        assert_eq!(&col[16..22], &[T3; 6]);
    }

    #[test]
    fn staggered_operators_are_offset_by_one_kind() {
        let s = StaggeredCycle::default();
        assert_eq!(s.shift_for(1, 0), T2);
        assert_eq!(s.shift_for(2, 0), T3);
        assert_eq!(s.shift_for(3, 0), T1);
        assert_eq!(s.shift_for(1, 8), T3);
    }

    #[test]
    fn staggered_handles_days_before_anchor() {
        let s = StaggeredCycle::default();
        // jour -1 : dernier jour de repos du bloc précédent
        assert_eq!(s.shift_for(0, -1), X);
        // jour -8 : premier jour du bloc -1, turno précédent (T3)
        assert_eq!(s.shift_for(0, -8), T3);
    }

    #[test]
    fn default_table_covers_every_kind_each_day() {
        let t = FixedTable::default();
        t.check_roster(4).unwrap();
        for row in &t.rows {
            for kind in ShiftCode::WORK {
                assert_eq!(row.iter().filter(|c| **c == kind).count(), 1);
            }
        }
        for op in 0..4 {
            let rest = column(&t, op, 0..8).iter().filter(|c| **c == X).count();
            assert_eq!(rest, 2);
        }
    }

    #[test]
    fn table_wraps_modulo_its_length() {
        let t = FixedTable::new(vec![vec![T1, X], vec![X, T2], vec![T3, T3]]).unwrap();
        assert_eq!(t.shift_for(0, 3), T1);
        assert_eq!(t.shift_for(1, 4), T2);
        assert_eq!(t.shift_for(1, -1), T3);
    }

    #[test]
    fn table_rejects_bad_shapes() {
        let t = FixedTable::new(vec![vec![T1, T2]]).unwrap();
        assert_eq!(
            t.check_roster(3),
            Err(RotationError::RowWidth { row: 0, expected: 3, found: 2 })
        );
        assert_eq!(
            FixedTable::new(vec![vec![ShiftCode::OnLeave]]),
            Err(RotationError::LeaveInTable { row: 0 })
        );
        assert_eq!(FixedTable::new(vec![]), Err(RotationError::EmptyTable));
    }

    #[test]
    fn base_rows_truncates_to_requested_dates() {
        let anchor = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        let dates: Vec<NaiveDate> = anchor.iter_days().take(28).collect();
        let rows = base_rows(&StaggeredCycle::default(), 4, anchor, &dates);
        assert_eq!(rows.len(), 28);
        assert!(rows.iter().all(|r| r.len() == 4));
        // 28 = 3 cycles + 4 jours : le dernier bloc commence en T1 pour l'op 0
        assert_eq!(rows[27][0], T1);
    }

    #[test]
    fn rotation_deserializes_by_strategy_tag() {
        let r: Rotation = serde_json::from_str(r#"{"strategy":"staggered"}"#).unwrap();
        assert_eq!(r, Rotation::Staggered(StaggeredCycle::default()));
        let r: Rotation =
            serde_json::from_str(r#"{"strategy":"fixed_table","rows":[["T1","X"]]}"#).unwrap();
        assert_eq!(r.strategy().name(), "fixed_table");
    }
}

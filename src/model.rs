use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifiant fort pour un opérateur
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OperatorId(String);

impl OperatorId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opérateur du roster (ordre fixe pour toute la génération)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    pub id: OperatorId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl Operator {
    pub fn new<S: AsRef<str>>(handle: S) -> Self {
        Self {
            id: OperatorId::new(handle),
            display_name: None,
        }
    }

    /// Roster par défaut : `Op1..Op4`.
    pub fn default_roster() -> Vec<Operator> {
        (1..=4).map(|i| Operator::new(format!("Op{i}"))).collect()
    }
}

/// Code de turno pour un couple (opérateur, date).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShiftCode {
    #[serde(rename = "T1")]
    WorkShift1,
    #[serde(rename = "T2")]
    WorkShift2,
    #[serde(rename = "T3")]
    WorkShift3,
    #[serde(rename = "X")]
    RestDay,
    #[serde(rename = "V")]
    OnLeave,
}

impl ShiftCode {
    /// Les trois turnos travaillés, dans l'ordre de rotation.
    pub const WORK: [ShiftCode; 3] = [
        ShiftCode::WorkShift1,
        ShiftCode::WorkShift2,
        ShiftCode::WorkShift3,
    ];

    pub fn is_work(self) -> bool {
        self.work_slot().is_some()
    }

    /// Position 0..=2 dans la rotation, `None` pour repos et congé.
    pub fn work_slot(self) -> Option<usize> {
        match self {
            ShiftCode::WorkShift1 => Some(0),
            ShiftCode::WorkShift2 => Some(1),
            ShiftCode::WorkShift3 => Some(2),
            ShiftCode::RestDay | ShiftCode::OnLeave => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            ShiftCode::WorkShift1 => "T1",
            ShiftCode::WorkShift2 => "T2",
            ShiftCode::WorkShift3 => "T3",
            ShiftCode::RestDay => "X",
            ShiftCode::OnLeave => "V",
        }
    }
}

impl fmt::Display for ShiftCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ShiftCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "T1" => Ok(ShiftCode::WorkShift1),
            "T2" => Ok(ShiftCode::WorkShift2),
            "T3" => Ok(ShiftCode::WorkShift3),
            "X" => Ok(ShiftCode::RestDay),
            "V" => Ok(ShiftCode::OnLeave),
            other => Err(format!("unknown shift code: {other}")),
        }
    }
}

/// Type de novedad. N'intervient pas dans le calcul : tout congé devient `OnLeave`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveKind {
    Vacation,
    Permission,
    Incapacity,
}

impl fmt::Display for LeaveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LeaveKind::Vacation => "vacation",
            LeaveKind::Permission => "permission",
            LeaveKind::Incapacity => "incapacity",
        };
        f.write_str(s)
    }
}

impl FromStr for LeaveKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "vacation" | "vacations" | "vacaciones" => Ok(LeaveKind::Vacation),
            "permission" | "permiso" => Ok(LeaveKind::Permission),
            "incapacity" | "incapacidad" => Ok(LeaveKind::Incapacity),
            other => Err(format!("unknown leave kind: {other}")),
        }
    }
}

/// Une journée du planning final.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRecord {
    pub date: NaiveDate,
    /// Un code par opérateur, dans l'ordre du roster.
    pub shifts: Vec<ShiftCode>,
    pub is_holiday: bool,
    pub is_sunday: bool,
}

/// Planning mensuel complet, immuable une fois construit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub year: i32,
    pub month: u32,
    pub operators: Vec<Operator>,
    pub days: Vec<DayRecord>,
}

impl Schedule {
    pub fn operator_index(&self, id: &OperatorId) -> Option<usize> {
        self.operators.iter().position(|o| &o.id == id)
    }

    pub fn day(&self, date: NaiveDate) -> Option<&DayRecord> {
        self.days
            .binary_search_by_key(&date, |d| d.date)
            .ok()
            .map(|i| &self.days[i])
    }

    pub fn shift_of(&self, id: &OperatorId, date: NaiveDate) -> Option<ShiftCode> {
        let idx = self.operator_index(id)?;
        self.day(date).and_then(|d| d.shifts.get(idx).copied())
    }

    /// Triplets (date, opérateur, code) dans l'ordre date puis roster.
    pub fn triples(&self) -> impl Iterator<Item = (NaiveDate, &OperatorId, ShiftCode)> + '_ {
        self.days.iter().flat_map(move |d| {
            self.operators
                .iter()
                .zip(d.shifts.iter())
                .map(move |(op, code)| (d.date, &op.id, *code))
        })
    }
}

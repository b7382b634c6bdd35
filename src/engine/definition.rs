use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::engine::error::FlowError;
use crate::engine::types::{ProcessVariable, ProcessVariableValue};

/// Unit name that terminates an execution path.
pub const END_UNIT: &str = "end";

/// Discriminant of a unit in the workflow graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Step,
    SRoute,
    PRoute,
    PRouteDynamic,
    Pause,
    Persist,
    PJoin,
}

impl std::fmt::Display for UnitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            UnitKind::Step => "step",
            UnitKind::SRoute => "s_route",
            UnitKind::PRoute => "p_route",
            UnitKind::PRouteDynamic => "p_route_dynamic",
            UnitKind::Pause => "pause",
            UnitKind::Persist => "persist",
            UnitKind::PJoin => "p_join",
        };
        write!(f, "{}", s)
    }
}

/// The three flavours of route unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    /// Picks exactly one way forward.
    Sequential,
    /// Fans out over branches declared in the definition.
    ParallelStatic,
    /// Fans out over branch names computed by the component at run time.
    ParallelDynamic,
}

impl RouteKind {
    pub fn unit_kind(self) -> UnitKind {
        match self {
            RouteKind::Sequential => UnitKind::SRoute,
            RouteKind::ParallelStatic => UnitKind::PRoute,
            RouteKind::ParallelDynamic => UnitKind::PRouteDynamic,
        }
    }
}

/// One declared way out of a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub name: String,
    pub next: String,
}

/// Where a route sends control: a single next unit, or a set of named
/// branches. One polymorphic target keeps fan-out handling uniform for
/// declared and runtime-computed branches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteTarget {
    Next(String),
    Branches(BTreeMap<String, Branch>),
}

/// One node in the workflow graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unit {
    Step {
        name: String,
        component: String,
        next: String,
        user_data: String,
    },
    Route {
        name: String,
        kind: RouteKind,
        component: String,
        user_data: String,
        target: RouteTarget,
    },
    Pause {
        name: String,
        next: String,
    },
    Persist {
        name: String,
        next: String,
    },
    Join {
        name: String,
        next: String,
    },
}

impl Unit {
    pub fn name(&self) -> &str {
        match self {
            Unit::Step { name, .. }
            | Unit::Route { name, .. }
            | Unit::Pause { name, .. }
            | Unit::Persist { name, .. }
            | Unit::Join { name, .. } => name,
        }
    }

    pub fn kind(&self) -> UnitKind {
        match self {
            Unit::Step { .. } => UnitKind::Step,
            Unit::Route { kind, .. } => kind.unit_kind(),
            Unit::Pause { .. } => UnitKind::Pause,
            Unit::Persist { .. } => UnitKind::Persist,
            Unit::Join { .. } => UnitKind::PJoin,
        }
    }

    /// The single next unit, when this unit has one.
    pub fn next(&self) -> Option<&str> {
        match self {
            Unit::Step { next, .. }
            | Unit::Pause { next, .. }
            | Unit::Persist { next, .. }
            | Unit::Join { next, .. } => Some(next),
            Unit::Route { target, .. } => match target {
                RouteTarget::Next(next) => Some(next),
                RouteTarget::Branches(_) => None,
            },
        }
    }
}

/// A named checkpoint binding a ticket to a step in the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub name: String,
    pub step: String,
}

/// The immutable workflow graph for one journey.
#[derive(Debug, Clone)]
pub struct ProcessDefinition {
    name: String,
    first_unit: String,
    units: HashMap<String, Unit>,
    process_variables: Vec<ProcessVariable>,
    tickets: HashMap<String, Ticket>,
}

impl ProcessDefinition {
    /// Parse a journey document. Branch and `next` targets are resolved
    /// lazily at execution time; parse-time validation covers structural
    /// rules only.
    pub fn from_value(doc: &serde_json::Value) -> Result<Self, FlowError> {
        let parsed: JourneyDoc = serde_json::from_value(doc.clone())
            .map_err(|e| FlowError::Definition(format!("malformed journey document: {}", e)))?;
        Self::from_raw(parsed.journey)
    }

    /// Parse a journey document from its JSON text.
    pub fn from_json(json: &str) -> Result<Self, FlowError> {
        let parsed: JourneyDoc = serde_json::from_str(json)
            .map_err(|e| FlowError::Definition(format!("malformed journey document: {}", e)))?;
        Self::from_raw(parsed.journey)
    }

    fn from_raw(raw: RawJourney) -> Result<Self, FlowError> {
        let first_unit = raw
            .flow
            .first()
            .map(|u| u.name.clone())
            .ok_or_else(|| FlowError::Definition("journey has no flow units".to_string()))?;

        let mut units = HashMap::with_capacity(raw.flow.len());
        for entry in raw.flow {
            let unit = build_unit(entry)?;
            if unit.name() == END_UNIT {
                return Err(FlowError::Definition(format!(
                    "unit name '{}' is reserved",
                    END_UNIT
                )));
            }
            if let Some(prior) = units.insert(unit.name().to_string(), unit) {
                return Err(FlowError::Definition(format!(
                    "duplicate unit name '{}'",
                    prior.name()
                )));
            }
        }

        let mut process_variables = Vec::with_capacity(raw.process_variables.len());
        for pv in raw.process_variables {
            let value = ProcessVariableValue::parse(&pv.kind, &pv.value)?;
            process_variables.push(ProcessVariable::new(pv.name, value));
        }

        let mut tickets = HashMap::with_capacity(raw.tickets.len());
        for t in raw.tickets {
            if tickets
                .insert(
                    t.name.clone(),
                    Ticket {
                        name: t.name,
                        step: t.step,
                    },
                )
                .is_some()
            {
                return Err(FlowError::Definition("duplicate ticket name".to_string()));
            }
        }

        Ok(Self {
            name: raw.name,
            first_unit,
            units,
            process_variables,
            tickets,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the unit a fresh case starts at.
    pub fn first_unit(&self) -> &str {
        &self.first_unit
    }

    pub fn unit(&self, name: &str) -> Option<&Unit> {
        self.units.get(name)
    }

    pub fn ticket(&self, name: &str) -> Option<&Ticket> {
        self.tickets.get(name)
    }

    pub fn process_variables(&self) -> &[ProcessVariable] {
        &self.process_variables
    }
}

fn build_unit(entry: RawUnit) -> Result<Unit, FlowError> {
    let kind = match entry.kind.as_deref() {
        // a flow entry without an explicit type is a step
        None => UnitKind::Step,
        Some(s) => match s.to_ascii_lowercase().as_str() {
            "step" => UnitKind::Step,
            "s_route" => UnitKind::SRoute,
            "p_route" => UnitKind::PRoute,
            "p_route_dynamic" => UnitKind::PRouteDynamic,
            "pause" => UnitKind::Pause,
            "persist" => UnitKind::Persist,
            "p_join" => UnitKind::PJoin,
            other => {
                return Err(FlowError::Definition(format!(
                    "unknown unit type '{}' on unit '{}'",
                    other, entry.name
                )));
            }
        },
    };

    let next_or_end = |next: Option<String>| next.unwrap_or_else(|| END_UNIT.to_string());

    let unit = match kind {
        UnitKind::Step => Unit::Step {
            name: entry.name,
            component: entry.component.unwrap_or_default(),
            next: next_or_end(entry.next),
            user_data: entry.user_data.unwrap_or_default(),
        },
        UnitKind::Pause => Unit::Pause {
            name: entry.name,
            next: next_or_end(entry.next),
        },
        UnitKind::Persist => Unit::Persist {
            name: entry.name,
            next: next_or_end(entry.next),
        },
        UnitKind::PJoin => Unit::Join {
            name: entry.name,
            next: next_or_end(entry.next),
        },
        UnitKind::SRoute | UnitKind::PRoute | UnitKind::PRouteDynamic => {
            build_route(kind, entry)?
        }
    };
    Ok(unit)
}

fn build_route(kind: UnitKind, entry: RawUnit) -> Result<Unit, FlowError> {
    let route_kind = match kind {
        UnitKind::SRoute => RouteKind::Sequential,
        UnitKind::PRoute => RouteKind::ParallelStatic,
        _ => RouteKind::ParallelDynamic,
    };

    if route_kind == RouteKind::ParallelStatic && entry.next.is_some() {
        return Err(FlowError::Definition(format!(
            "parallel route '{}' must branch, not chain",
            entry.name
        )));
    }
    if route_kind == RouteKind::ParallelDynamic && !entry.branches.is_empty() {
        return Err(FlowError::Definition(format!(
            "dynamic route '{}' branches are computed at runtime, not declared",
            entry.name
        )));
    }

    let target = if let Some(next) = entry.next {
        RouteTarget::Next(next)
    } else if !entry.branches.is_empty() {
        let mut branches = BTreeMap::new();
        for b in entry.branches {
            if branches
                .insert(
                    b.name.clone(),
                    Branch {
                        name: b.name,
                        next: b.next,
                    },
                )
                .is_some()
            {
                return Err(FlowError::Definition(format!(
                    "duplicate branch name on route '{}'",
                    entry.name
                )));
            }
        }
        RouteTarget::Branches(branches)
    } else {
        return Err(FlowError::Definition(format!(
            "route '{}' declares neither next nor branches",
            entry.name
        )));
    };

    Ok(Unit::Route {
        name: entry.name,
        kind: route_kind,
        component: entry.component.unwrap_or_default(),
        user_data: entry.user_data.unwrap_or_default(),
        target,
    })
}

#[derive(Deserialize)]
struct JourneyDoc {
    journey: RawJourney,
}

#[derive(Deserialize)]
struct RawJourney {
    name: String,
    #[serde(default)]
    process_variables: Vec<RawProcessVariable>,
    #[serde(default)]
    tickets: Vec<RawTicket>,
    #[serde(default)]
    flow: Vec<RawUnit>,
}

#[derive(Deserialize)]
struct RawProcessVariable {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    value: String,
}

#[derive(Deserialize)]
struct RawTicket {
    name: String,
    step: String,
}

#[derive(Deserialize)]
struct RawUnit {
    name: String,
    #[serde(rename = "type")]
    kind: Option<String>,
    component: Option<String>,
    next: Option<String>,
    user_data: Option<String>,
    #[serde(default)]
    branches: Vec<RawBranch>,
}

#[derive(Deserialize)]
struct RawBranch {
    name: String,
    next: String,
}

// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs, dead_code)]

use std::collections::BTreeMap;

use echo_json_codec::{FieldSetBuilder, JsonRecord};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl JsonRecord for Point2D {
    const TYPE_NAME: &'static str = "Point2D";

    fn describe(fields: &mut FieldSetBuilder<Self>) {
        fields
            .field("x", |p| &p.x, |p| &mut p.x)
            .field("y", |p| &p.y, |p| &mut p.y);
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Idle,
    Patrol,
    Return,
}

/// Blackboard-style record mixing leaf, nested, container and serde fields.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mission {
    pub name: String,
    pub priority: u8,
    pub target: Point2D,
    pub waypoints: Vec<f64>,
    pub params: BTreeMap<String, i64>,
    pub deadline: Option<u64>,
    pub mode: Mode,
}

impl JsonRecord for Mission {
    const TYPE_NAME: &'static str = "mission/Mission";
    const TYPE_TAG: Option<&'static str> = Some("Mission");

    fn describe(fields: &mut FieldSetBuilder<Self>) {
        fields
            .field("name", |m| &m.name, |m| &mut m.name)
            .field("priority", |m| &m.priority, |m| &mut m.priority)
            .record("target", |m| &m.target, |m| &mut m.target)
            .field("waypoints", |m| &m.waypoints, |m| &mut m.waypoints)
            .field("params", |m| &m.params, |m| &mut m.params)
            .field("deadline", |m| &m.deadline, |m| &mut m.deadline)
            .serde("mode", |m| &m.mode, |m| &mut m.mode);
    }
}

pub fn sample_mission() -> Mission {
    let mut params = BTreeMap::new();
    params.insert("max_speed".to_owned(), 4);
    params.insert("min_battery".to_owned(), -1);
    Mission {
        name: "survey".to_owned(),
        priority: 3,
        target: Point2D { x: 10.5, y: -2.0 },
        waypoints: vec![0.0, 1.5, 3.0],
        params,
        deadline: Some(1_700_000_000),
        mode: Mode::Patrol,
    }
}

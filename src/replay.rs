//! Scripted editor events.
//!
//! A replay script is a JSON object with an `events` list. Each event names
//! a session operation and carries its arguments; region references are
//! plain indices resolved against the collection at the moment the event
//! runs, the same way a click on the current frame would be.

use std::path::Path;

use serde::Deserialize;

use crate::config::ConfigError;
use crate::format::FormatError;
use crate::geometry::{Point, Rect, Size, Viewport};
use crate::model::{CaseStatus, Workflow};
use crate::state::{EditorSession, PointerTarget, ResizeHandle};
use crate::transport::TransportError;

/// What a scripted pointer-down lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptTarget {
    #[default]
    Image,
    Region(usize),
    Background,
}

/// One scripted editor event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ReplayEvent {
    Viewport {
        container: Size,
        #[serde(default)]
        rendered: Option<Size>,
        #[serde(default)]
        natural: Option<Size>,
    },
    Status {
        status: CaseStatus,
    },
    PointerDown {
        x: f64,
        y: f64,
        #[serde(default)]
        target: ScriptTarget,
    },
    PointerMove {
        x: f64,
        y: f64,
    },
    PointerUp,
    PointerLeave,
    Move {
        index: usize,
        dx: f64,
        dy: f64,
    },
    Resize {
        index: usize,
        handle: ResizeHandle,
        dx: f64,
        dy: f64,
    },
    Place {
        index: usize,
        rect: Rect,
    },
    DoubleClick {
        index: usize,
    },
    Select {
        index: usize,
    },
    SetLabel {
        label: String,
    },
    SetConfidence {
        percent: f64,
    },
    Commit,
    Cancel,
    Remove {
        index: usize,
    },
    Hover {
        index: usize,
    },
    Unhover,
}

/// A full script.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ReplayScript {
    /// Feedback or review notes sent with the submission.
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub events: Vec<ReplayEvent>,
}

impl ReplayScript {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        let json = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&json)?)
    }
}

/// Counts of what happened during a replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReplayReport {
    pub applied: usize,
    pub ignored: usize,
}

/// Errors surfaced by the replay tool.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid script or payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Failed to read image dimensions: {0}")]
    Image(#[from] image::ImageError),
}

/// Case status a replay starts from.
///
/// An explicit request wins, then the status stored with the case. Without
/// either, the workflow's editable starting status is used.
pub fn opening_status(
    workflow: Workflow,
    requested: Option<CaseStatus>,
    stored: Option<CaseStatus>,
) -> CaseStatus {
    requested.or(stored).unwrap_or(match workflow {
        Workflow::Upload => CaseStatus::Completed,
        Workflow::Review => CaseStatus::Pending,
    })
}

/// Apply one event. Returns whether the session reported a change.
pub fn apply(session: &mut EditorSession, event: &ReplayEvent) -> bool {
    match event {
        ReplayEvent::Viewport {
            container,
            rendered,
            natural,
        } => {
            session.set_viewport(Viewport {
                container: *container,
                rendered: rendered.unwrap_or(*container),
                natural: *natural,
            });
            true
        }
        ReplayEvent::Status { status } => {
            session.set_case_status(*status);
            true
        }
        ReplayEvent::PointerDown { x, y, target } => {
            let target = match target {
                ScriptTarget::Image => PointerTarget::ImageSurface,
                ScriptTarget::Background => PointerTarget::Background,
                ScriptTarget::Region(index) => match session.key(*index) {
                    Some(key) => PointerTarget::Region(key),
                    None => return false,
                },
            };
            session.pointer_down(Point::new(*x, *y), target)
        }
        ReplayEvent::PointerMove { x, y } => session.pointer_move(Point::new(*x, *y)),
        ReplayEvent::PointerUp => session.pointer_up().is_some(),
        ReplayEvent::PointerLeave => session.pointer_leave(),
        ReplayEvent::Move { index, dx, dy } => {
            let delta = Point::new(*dx, *dy);
            session.key(*index).is_some_and(|k| session.move_region(k, delta))
        }
        ReplayEvent::Resize {
            index,
            handle,
            dx,
            dy,
        } => {
            let delta = Point::new(*dx, *dy);
            session
                .key(*index)
                .is_some_and(|k| session.resize_region(k, *handle, delta))
        }
        ReplayEvent::Place { index, rect } => {
            session.key(*index).is_some_and(|k| session.place_region(k, *rect))
        }
        ReplayEvent::DoubleClick { index } => {
            session.key(*index).is_some_and(|k| session.double_click(k))
        }
        ReplayEvent::Select { index } => session.key(*index).is_some_and(|k| session.select(k)),
        ReplayEvent::SetLabel { label } => session.set_edit_label(label.clone()),
        ReplayEvent::SetConfidence { percent } => session.set_edit_confidence_percent(*percent),
        ReplayEvent::Commit => session.commit().is_some(),
        ReplayEvent::Cancel => session.cancel(),
        ReplayEvent::Remove { index } => session.key(*index).is_some_and(|k| session.remove(k)),
        ReplayEvent::Hover { index } => session.key(*index).is_some_and(|k| session.hover(k)),
        ReplayEvent::Unhover => {
            session.unhover();
            true
        }
    }
}

/// Apply every event of `script` in order.
pub fn run(session: &mut EditorSession, script: &ReplayScript) -> ReplayReport {
    let mut report = ReplayReport::default();
    for (n, event) in script.events.iter().enumerate() {
        if apply(session, event) {
            report.applied += 1;
        } else {
            log::debug!("Replay: event {} had no effect: {:?}", n, event);
            report.ignored += 1;
        }
    }
    log::info!(
        "Replay finished: {} events applied, {} ignored",
        report.applied,
        report.ignored
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorSettings;
    use crate::format::formats::JsonFormat;
    use crate::format::{ImportOptions, Prediction, RegionFormat};
    use crate::model::CaseContext;

    fn session() -> EditorSession {
        let mut session = EditorSession::new(
            CaseContext::new(Workflow::Upload, CaseStatus::Completed),
            EditorSettings::default(),
        );
        session.load_predictions(&[
            Prediction::new(10.0, 10.0, 50.0, 50.0, "Nodular BCC", 0.8),
            Prediction::new(60.0, 60.0, 90.0, 90.0, "Glands", 0.4),
        ]);
        session
    }

    #[test]
    fn test_parse_script() {
        let script = ReplayScript::from_json(
            r#"{"notes":"ok","events":[
                {"event":"viewport","container":{"width":200,"height":200},
                 "natural":{"width":100,"height":100}},
                {"event":"pointer_down","x":5,"y":5},
                {"event":"pointer_down","x":5,"y":5,"target":{"region":1}},
                {"event":"resize","index":0,"handle":"top_left","dx":1,"dy":1},
                {"event":"commit"}
            ]}"#,
        )
        .expect("parse");
        assert_eq!(script.notes.as_deref(), Some("ok"));
        assert_eq!(script.events.len(), 5);
        assert_eq!(
            script.events[2],
            ReplayEvent::PointerDown {
                x: 5.0,
                y: 5.0,
                target: ScriptTarget::Region(1)
            }
        );
        assert_eq!(script.events[4], ReplayEvent::Commit);
    }

    #[test]
    fn test_replay_draw_and_edit() {
        let mut session = session();
        let script = ReplayScript {
            notes: None,
            events: vec![
                ReplayEvent::Viewport {
                    container: Size::new(200.0, 200.0),
                    rendered: None,
                    natural: Some(Size::new(100.0, 100.0)),
                },
                ReplayEvent::PointerDown {
                    x: 5.0,
                    y: 5.0,
                    target: ScriptTarget::Image,
                },
                ReplayEvent::PointerMove { x: 40.0, y: 40.0 },
                ReplayEvent::PointerUp,
                ReplayEvent::SetLabel {
                    label: "Glands".to_string(),
                },
                ReplayEvent::Commit,
                ReplayEvent::Remove { index: 0 },
                ReplayEvent::Select { index: 7 },
            ],
        };

        let report = run(&mut session, &script);
        assert_eq!(report.applied, 7);
        assert_eq!(report.ignored, 1);

        let regions = session.regions();
        assert_eq!(regions.len(), 2);
        let drawn = regions.get(1).expect("drawn region");
        assert_eq!(drawn.label, "Glands");
        assert!(drawn.is_new);
    }

    #[test]
    fn test_pointer_down_on_region_does_not_draw() {
        let mut session = session();
        let event = ReplayEvent::PointerDown {
            x: 20.0,
            y: 20.0,
            target: ScriptTarget::Region(0),
        };
        assert!(!apply(&mut session, &event));
        assert!(!session.drawing().is_drawing());
    }

    #[test]
    fn test_opening_status_precedence() {
        assert_eq!(
            opening_status(Workflow::Review, None, None),
            CaseStatus::Pending
        );
        assert_eq!(
            opening_status(Workflow::Upload, None, None),
            CaseStatus::Completed
        );
        assert_eq!(
            opening_status(Workflow::Review, None, Some(CaseStatus::Reviewed)),
            CaseStatus::Reviewed
        );
        assert_eq!(
            opening_status(
                Workflow::Review,
                Some(CaseStatus::InProgress),
                Some(CaseStatus::Reviewed)
            ),
            CaseStatus::InProgress
        );
    }

    #[test]
    fn test_reviewed_case_rejects_scripted_remove() {
        let dir = std::env::temp_dir().join(format!("dermannot_replay_{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("create dir");
        let path = dir.join("case.json");
        std::fs::write(
            &path,
            r#"{"predictions":[{"xmin":10,"ymin":10,"xmax":50,"ymax":50,"name":"Glands","confidence":0.9}],
               "status":"reviewed","review_notes":"done"}"#,
        )
        .expect("write");

        let stored = JsonFormat
            .import(&path, &ImportOptions::new())
            .expect("import");
        let original: Vec<Prediction> = stored.regions.iter().map(Prediction::from).collect();
        let status = opening_status(Workflow::Review, None, stored.status);

        let mut session = EditorSession::new(
            CaseContext::new(Workflow::Review, status),
            EditorSettings::default(),
        );
        session.load_predictions(&original);
        session.set_viewport(Viewport::filled(
            Size::new(100.0, 100.0),
            Some(Size::new(100.0, 100.0)),
        ));

        let script =
            ReplayScript::from_json(r#"{"events":[{"event":"remove","index":0}]}"#).expect("parse");
        let report = run(&mut session, &script);
        assert_eq!(report.applied, 0);
        assert_eq!(report.ignored, 1);
        assert_eq!(session.regions().len(), 1);

        let submission = session.review_submission(script.notes.clone().or(stored.notes));
        assert_eq!(submission.review_notes, "done");
        assert_eq!(submission.predictions.len(), 1);

        let _ = std::fs::remove_dir_all(&dir);
    }
}

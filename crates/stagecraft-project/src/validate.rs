//! Load-time validation of project documents.
//!
//! Validation runs in three passes so a rejected document reports every
//! problem it can, not just the first:
//!
//! 1. structural: the required top-level fields exist with the right JSON kind;
//! 2. typed: the document deserializes into [`Project`];
//! 3. semantic: invariants serde cannot express (scene count, object sizes,
//!    layer range, id uniqueness).

use std::collections::HashSet;

use serde_json::Value;

use crate::model::{Project, MAX_LAYER};

/// Top-level fields every persisted project must carry, the JSON kind check
/// for each, and how that kind reads in an error message.
const REQUIRED_FIELDS: [(&str, fn(&Value) -> bool, &str); 4] = [
    ("version", Value::is_string, "a string"),
    ("meta", Value::is_object, "an object"),
    ("settings", Value::is_object, "an object"),
    ("scenes", Value::is_array, "an array"),
];

/// A document failed validation. `issues` lists each problem found.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid project: {}", issues.join("; "))]
pub struct ValidationError {
    pub issues: Vec<String>,
}

impl ValidationError {
    fn single(issue: impl Into<String>) -> Self {
        Self {
            issues: vec![issue.into()],
        }
    }
}

/// Validate an untyped document and convert it into a [`Project`].
pub fn project_from_value(value: Value) -> Result<Project, ValidationError> {
    let Some(root) = value.as_object() else {
        return Err(ValidationError::single("document root must be an object"));
    };

    let issues: Vec<String> = REQUIRED_FIELDS
        .iter()
        .filter_map(|(field, is_kind, kind)| match root.get(*field) {
            None => Some(format!("missing required field '{field}'")),
            Some(v) if !is_kind(v) => Some(format!("field '{field}' must be {kind}")),
            Some(_) => None,
        })
        .collect();
    if !issues.is_empty() {
        return Err(ValidationError { issues });
    }

    let project: Project = serde_json::from_value(value)
        .map_err(|e| ValidationError::single(format!("malformed project: {e}")))?;
    validate_project(&project)?;
    Ok(project)
}

/// Check the invariants of an already typed project.
pub fn validate_project(project: &Project) -> Result<(), ValidationError> {
    let mut issues = Vec::new();

    if project.scenes.is_empty() {
        issues.push("project must contain at least one scene".to_owned());
    }

    for scene in &project.scenes {
        let mut seen = HashSet::new();
        for object in &scene.objects {
            let at = format!("scene '{}' object '{}'", scene.id, object.id);
            if !seen.insert(object.id.as_str()) {
                issues.push(format!("{at}: duplicate object id"));
            }
            if !(object.width.is_finite() && object.width > 0.0)
                || !(object.height.is_finite() && object.height > 0.0)
            {
                issues.push(format!(
                    "{at}: size {}x{} must be positive and finite",
                    object.width, object.height
                ));
            }
            if !(object.x.is_finite() && object.y.is_finite()) {
                issues.push(format!("{at}: position must be finite"));
            }
            if !(0..=MAX_LAYER).contains(&object.layer) {
                issues.push(format!("{at}: layer {} outside 0..={MAX_LAYER}", object.layer));
            }
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { issues })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Template;
    use crate::template::default_project;
    use chrono::Utc;

    fn valid_value() -> Value {
        serde_json::to_value(default_project(Template::Platformer, Utc::now())).unwrap()
    }

    #[test]
    fn default_project_passes() {
        let project = project_from_value(valid_value()).expect("default project must validate");
        assert_eq!(project.scenes.len(), 1);
    }

    #[test]
    fn missing_scenes_is_reported_by_name() {
        let mut value = valid_value();
        value.as_object_mut().unwrap().remove("scenes");
        let err = project_from_value(value).unwrap_err();
        assert_eq!(err.issues, vec!["missing required field 'scenes'".to_owned()]);
    }

    #[test]
    fn all_structural_problems_are_collected() {
        let value = serde_json::json!({ "version": 1, "meta": {} });
        let err = project_from_value(value).unwrap_err();
        assert_eq!(err.issues.len(), 3, "issues: {:?}", err.issues);
        assert!(err.issues[0].contains("'version' must be a string"));
    }

    #[test]
    fn semantic_checks_catch_bad_objects() {
        let mut value = valid_value();
        let objects = value["scenes"][0]["objects"].as_array_mut().unwrap();
        objects[0]["width"] = serde_json::json!(0);
        objects[1]["id"] = objects[0]["id"].clone();
        objects[2]["layer"] = serde_json::json!(11);

        let err = project_from_value(value).unwrap_err();
        assert_eq!(err.issues.len(), 3, "issues: {:?}", err.issues);
    }

    #[test]
    fn empty_scene_list_is_invalid() {
        let mut value = valid_value();
        value["scenes"] = serde_json::json!([]);
        assert!(project_from_value(value).is_err());
    }
}

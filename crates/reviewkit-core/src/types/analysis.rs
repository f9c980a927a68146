// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use serde::Deserialize;
use serde::Serialize;

use crate::error::Fallible;
use crate::types::ids::TopicId;

/// Topic assigned to items whose analysis names none.
pub const GENERAL_TOPIC: &str = "general";

/// The analysis attached to a problem. The extraction service sometimes
/// returns structured fields and sometimes only free text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Analysis {
    Structured(StructuredAnalysis),
    Raw(String),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredAnalysis {
    #[serde(default)]
    pub knowledge_points: Vec<String>,
    /// Hierarchical path such as `algebra/quadratics/roots`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<u8>,
}

impl Analysis {
    pub fn from_json(text: &str) -> Fallible<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Fallible<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// The topic an item belongs to: the root of the knowledge path, else
    /// the first knowledge point, else the general topic.
    pub fn topic(&self) -> TopicId {
        match self {
            Analysis::Structured(s) => s
                .knowledge_path
                .as_deref()
                .and_then(path_root)
                .or_else(|| {
                    s.knowledge_points
                        .iter()
                        .map(|p| p.trim())
                        .find(|p| !p.is_empty())
                })
                .map(TopicId::new)
                .unwrap_or_else(|| TopicId::new(GENERAL_TOPIC)),
            Analysis::Raw(_) => TopicId::new(GENERAL_TOPIC),
        }
    }
}

fn path_root(path: &str) -> Option<&str> {
    path.split(['/', '>'])
        .map(str::trim)
        .find(|segment| !segment.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_from_object() -> Fallible<()> {
        let analysis = Analysis::from_json(
            r#"{"knowledge_points": ["quadratics", "factoring"], "difficulty": 3}"#,
        )?;
        let Analysis::Structured(s) = &analysis else {
            panic!("expected structured analysis");
        };
        assert_eq!(s.knowledge_points.len(), 2);
        assert_eq!(s.difficulty, Some(3));
        assert_eq!(analysis.topic(), TopicId::new("quadratics"));
        Ok(())
    }

    #[test]
    fn test_raw_from_string() -> Fallible<()> {
        let analysis = Analysis::from_json(r#""model returned prose""#)?;
        assert_eq!(analysis, Analysis::Raw("model returned prose".to_string()));
        assert_eq!(analysis.topic(), TopicId::new(GENERAL_TOPIC));
        Ok(())
    }

    #[test]
    fn test_path_takes_precedence() {
        let analysis = Analysis::Structured(StructuredAnalysis {
            knowledge_points: vec!["roots".to_string()],
            knowledge_path: Some(" functions > quadratic > roots".to_string()),
            difficulty: None,
        });
        assert_eq!(analysis.topic(), TopicId::new("functions"));
    }

    #[test]
    fn test_blank_fields_fall_back() {
        let analysis = Analysis::Structured(StructuredAnalysis {
            knowledge_points: vec!["  ".to_string()],
            knowledge_path: Some("//".to_string()),
            difficulty: None,
        });
        assert_eq!(analysis.topic(), TopicId::new(GENERAL_TOPIC));
    }

    #[test]
    fn test_empty_object() -> Fallible<()> {
        let analysis = Analysis::from_json("{}")?;
        assert_eq!(analysis, Analysis::Structured(StructuredAnalysis::default()));
        Ok(())
    }

    #[test]
    fn test_serialization_keeps_shape() -> Fallible<()> {
        let raw = Analysis::Raw("text".to_string());
        assert_eq!(raw.to_json()?, "\"text\"");
        let structured = Analysis::Structured(StructuredAnalysis {
            knowledge_points: vec!["geometry".to_string()],
            knowledge_path: None,
            difficulty: None,
        });
        assert_eq!(structured.to_json()?, r#"{"knowledge_points":["geometry"]}"#);
        Ok(())
    }
}

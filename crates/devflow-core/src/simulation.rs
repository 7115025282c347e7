use crate::code::{self, GeneratedCode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationTurn {
    pub agent: String,
    pub message: String,
}

/// Outcome of one multi-agent simulation. Transient until approved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub turns: Vec<SimulationTurn>,
    pub files: Vec<GeneratedCode>,
}

impl SimulationResult {
    /// Apply the simulated file set to a project's generated code,
    /// overriding by path.
    pub fn approve_into(self, generated_code: &mut Vec<GeneratedCode>) {
        code::merge(generated_code, self.files);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approve_overrides_by_path() {
        let mut files = vec![
            GeneratedCode::new("src/App.js", "v1"),
            GeneratedCode::new("README.md", "readme"),
        ];
        let result = SimulationResult {
            turns: vec![SimulationTurn {
                agent: "Project Manager".into(),
                message: "Plan ready".into(),
            }],
            files: vec![
                GeneratedCode::new("src/App.js", "v2"),
                GeneratedCode::new("src/App.test.js", "test"),
            ],
        };
        result.approve_into(&mut files);
        assert_eq!(files.len(), 3);
        assert_eq!(files[0].content, "v2");
        assert_eq!(files[2].path, "src/App.test.js");
    }
}

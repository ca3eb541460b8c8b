//! Prompt template

/// Prompt asking the model to break `task` into numbered, actionable subtasks
pub fn build_prompt(task: &str) -> String {
    format!(
        "Break down the following programming task into detailed, actionable subtasks:

Task: {task}

Provide a structured breakdown following these rules:
1. Each subtask must be specific, clear, and directly actionable
2. Focus on implementation steps a developer would take
3. Include necessary technical considerations
4. Order subtasks logically from setup to implementation
5. Include error handling and validation steps where appropriate
6. Consider performance and maintainability

Format each subtask as a numbered list item starting with a number and dot (e.g. '1.', '2.', etc.).
Ensure each subtask is self-contained and can be completed independently.
"
    )
}

//! Prompt assembly for the reasoning loop.
//!
//! Two pieces per completion call: a system prompt carrying the tool
//! catalog and the wire contract, and an iteration prompt carrying the
//! task, a transcript excerpt, and the remaining-budget hint.

use baton_core::ToolDefinition;

/// Render the system prompt for an agent with the given tool catalog.
pub fn build_system_prompt(agent_id: &str, tools: &[ToolDefinition]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "You are {agent_id}, an agent that solves tasks by reasoning step by step and calling tools.\n\n"
    ));

    if tools.is_empty() {
        out.push_str("No tools are available; answer from your own knowledge.\n");
    } else {
        out.push_str("Available tools:\n");
        for tool in tools {
            out.push_str(&format!(
                "- {} ({}): {}\n",
                tool.name, tool.tool_type, tool.description
            ));
            for param in &tool.parameters {
                let requirement = if param.required { "required" } else { "optional" };
                match &param.default {
                    Some(default) => out.push_str(&format!(
                        "    {} ({}, {}, default {}): {}\n",
                        param.name, param.param_type, requirement, default, param.description
                    )),
                    None => out.push_str(&format!(
                        "    {} ({}, {}): {}\n",
                        param.name, param.param_type, requirement, param.description
                    )),
                }
            }
        }
    }

    out.push_str(concat!(
        "\nRespond with exactly one JSON object per turn and nothing else. ",
        "Use one of these forms:\n\n",
        "To call a tool:\n",
        "{\"thought\": \"<your reasoning>\", \"action\": \"<tool name>\", ",
        "\"action_input\": {<arguments>}, \"is_final\": false}\n\n",
        "To ask the user a question before continuing:\n",
        "{\"thought\": \"<your reasoning>\", \"clarification_question\": \"<the question>\"}\n\n",
        "To finish:\n",
        "{\"thought\": \"<your reasoning>\", \"final_answer\": \"<the answer>\", \"is_final\": true}\n\n",
        "Rules:\n",
        "- action must be one of the tool names listed above.\n",
        "- action_input must be a JSON object matching the tool's parameters.\n",
        "- Set is_final to true only together with final_answer.\n",
    ));

    out
}

/// Render the per-iteration prompt: task, progress excerpt, budget hint.
pub fn build_iteration_prompt(
    task_prompt: &str,
    excerpt: &str,
    iteration: u32,
    max_iterations: u32,
) -> String {
    let progress = if excerpt.trim().is_empty() {
        "(none yet)"
    } else {
        excerpt.trim_end()
    };
    let left = max_iterations.saturating_sub(iteration);

    format!(
        "Task: {task_prompt}\n\n\
         Progress so far:\n{progress}\n\n\
         This is iteration {iteration} of {max_iterations}; {left} more remain after this one. \
         If the budget is nearly spent, finish with your best final answer. \
         Respond with your next JSON decision."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use baton_core::{ParamType, ToolParameter};

    fn catalog() -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new("calculator", "Evaluates arithmetic expressions")
                .with_parameter(ToolParameter::required(
                    "expression",
                    ParamType::String,
                    "The expression to evaluate",
                )),
            ToolDefinition::new("clock", "Reports the current time").with_parameter(
                ToolParameter::optional(
                    "format",
                    ParamType::String,
                    serde_json::json!("rfc3339"),
                    "Output format",
                ),
            ),
        ]
    }

    #[test]
    fn system_prompt_lists_tools_and_parameters() {
        let prompt = build_system_prompt("orchestrator", &catalog());
        assert!(prompt.contains("You are orchestrator"));
        assert!(prompt.contains("- calculator (function): Evaluates arithmetic expressions"));
        assert!(prompt.contains("expression (string, required)"));
        assert!(prompt.contains("format (string, optional, default \"rfc3339\")"));
    }

    #[test]
    fn system_prompt_spells_out_the_wire_contract() {
        let prompt = build_system_prompt("orchestrator", &catalog());
        for key in ["\"thought\"", "\"action\"", "\"action_input\"", "\"final_answer\"", "\"is_final\"", "\"clarification_question\""] {
            assert!(prompt.contains(key), "missing {key}");
        }
    }

    #[test]
    fn system_prompt_handles_an_empty_catalog() {
        let prompt = build_system_prompt("orchestrator", &[]);
        assert!(prompt.contains("No tools are available"));
    }

    #[test]
    fn iteration_prompt_carries_task_and_budget() {
        let prompt = build_iteration_prompt("What is 2+2?", "", 3, 10);
        assert!(prompt.contains("Task: What is 2+2?"));
        assert!(prompt.contains("(none yet)"));
        assert!(prompt.contains("iteration 3 of 10"));
        assert!(prompt.contains("7 more remain"));
    }

    #[test]
    fn iteration_prompt_includes_the_excerpt() {
        let prompt = build_iteration_prompt("task", "Thought: first\nAction: clock({})\n", 2, 4);
        assert!(prompt.contains("Thought: first"));
        assert!(prompt.contains("Action: clock"));
        assert!(!prompt.contains("(none yet)"));
    }
}

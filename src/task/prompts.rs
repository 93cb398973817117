//! Prompt text for the action catalog.

pub const SELECT_PREAMBLE: &str = "You are thinking about the following task. ";

pub const SELECT_INSTRUCTIONS: &str = "Instructions: Your current goal is to identify the best action to take to make progress on solving the task (but do not do the action). \n                    Think about which of the following choices is best to solve the task:\n";

pub const SELECT_ANSWER_FORMAT: &str = "\nInstruction: Your output should only contain the integer corresponding to the action you select enclosed in ** **, and a one sentence justification of your choice. Do not do the action that you selected. Do not write Python code.";

pub const CODE_FORMAT: &str = concat!(
    "The Python code should be enclosed within triple backticks ``` ```. ",
    "You MUST make at least one plot in the code, and save it with plt.savefig to the ./outputs/ directory.",
    "You MUST save at least one numeric/statistical result related to the task in a text file with file.write(...) to the ./outputs/ directory.",
    "ALWAYS use the REAL data not simulated data. The variable 'data' is provided to you as a global variable which has already been loaded.",
    "Please write code in multiple functions when possible. Any function should include a comment at the beginning containg a description of the function, and the expected input(s) and output(s), including their types.",
);

const JSON_EXAMPLE: &str = r#"[
    {
        "summary": "Write a project proposal",
        "description": "Draft a comprehensive project proposal outlining the objectives, scope, timeline, and expected outcomes. Include background research, methodology, and resource requirements to ensure clarity for stakeholders."
    },
    {
        "summary": "Collect and preprocess data",
        "description": "Gather relevant datasets from multiple sources and clean the data by handling missing values, removing duplicates, and normalizing formats. Perform exploratory data analysis to identify trends and potential issues."
    },
    {
        "summary": "Write test cases",
        "description": "Design and implement unit and integration tests to ensure code reliability and functionality. Automate testing where possible and document edge cases to improve overall software robustness."
    },
]"#;

pub const BRAINSTORM_HINT: &str =
    "Brainstorm ideas about potential hypotheses and analyses to do with the dataset.";

pub const BRAINSTORM_START: &str = "Your task is to brainstorm ideas related to the following task. Ensure that each idea you come up with is testable: ";

pub const BRAINSTORM_END: &str = concat!(
    "Instructions:\n",
    "Generate a JSON-formatted list of strings of the different ideas/hypotheses/analyses. Each string in the list should be at least 2 sentences long. Do not include any idea entries that are not possible given the dataset and tools you are provided with. The tools you have are the ability to write and implement code, look at plots and read statistical results, and summarize your findings. Ensure your response is complete and comprehensive. The output should be strictly in JSON format, containing only the list of strings without any additional text.",
);

pub const BRAINSTORM_REVISE: &str = concat!(
    "Please reflect on and revise your previous response to ensure it is complete and comprehensive. ",
    "Delete any idea entries that are not possible given the dataset and tools you are provided with. ",
    "The tools you have are the ability to write and implement code, look at plots and read statistical results, and summarize your findings.",
    "The output should be strictly in JSON format, containing only the JSON data without any additional text.",
);

pub const CODE_HINT: &str =
    "Write Python code to preprocess the data, conduct an analysis, and/or make a figure";

pub const CODE_START: &str = "Your task is to write Python code to accomplish the following task: ";

pub fn code_end() -> String {
    format!(
        "You should write Python code to complete the task, following the specifications below. \nInstructions:\n{}",
        CODE_FORMAT
    )
}

pub fn code_revise() -> String {
    format!(
        "Please reflect on and revise your previous response to ensure it is complete and comprehensive.Ensure that the output meets the correct specification, provided below: \n\n{}",
        CODE_FORMAT
    )
}

/// Repair prompt for a runtime failure.
///
/// The failing code is accepted for prompt variants that quote it back; this
/// one relies on the model's own context.
pub fn default_error(output: &str, _code: &str) -> String {
    format!(
        "Your code returned this error {}. Please fix it and return the complete code with the error fixed.",
        output
    )
}

/// Prompt asking for a snippet that installs a missing module.
pub fn module_error(output: &str) -> String {
    format!(
        "My Python code returned the following error: {}. Please return Python code enclosed in in ``` ``` tags that can install the appropriate module to fix this issue with pip. Use this template for running pip from Python code:\n\nimport subprocess\nimport sys\n\ndef install(package):\n    subprocess.check_call([sys.executable, \"-m\", \"pip\", \"install\",\"--no-cache-dir\", package])\n",
        output
    )
}

pub const DIVIDE_HINT: &str = "If the task is too large or challenging to address with any one of the other options, select this action to make the task simpler by breaking it into subtasks.";

pub const DIVIDE_START: &str = "Your task is to break down the following task into smaller subtasks: ";

pub fn divide_end() -> String {
    format!(
        concat!(
            "You have decided to begin addressing this task by breaking it down into smaller subtasks. Think deeply about what subtasks you need to do to acheive the overall goal, and identify a sequence of subtasks that should be performed to acheive the goal.",
            "The subtasks should be ordered. The first subtasks that you do should help you with completing later subtasks. Ensure that by the final subtask, you will have completed the overall goal. \n\n",
            "Instructions:\n",
            "Generate a JSON-formatted list of tasks you would need to perform. Each task should be represented as a dictionary with two keys:\n",
            "summary: A one-sentence summary of the task.\n",
            "description: A thorough, multi-sentence explanation of the task.\n",
            "The output should be strictly in JSON format, containing only the JSON data without any additional text.\n",
            "An example of the output format is: \n",
            "{}"
        ),
        JSON_EXAMPLE
    )
}

pub fn divide_revise() -> String {
    format!(
        concat!(
            "Please reflect on and revise your previous response to ensure it is complete and comprehensive. ",
            "Delete any subtask entries that are not possible given the dataset and tools you are provided with. ",
            "Add subtasks that could help link the output of one subtask with the input of the next.",
            "The tools you have are the ability to write and implement code, look at plots and read statistical results, and summarize your findings.",
            "The output should be strictly in JSON format, containing only the JSON data without any additional text.",
            "An example of the output format is: \n",
            "{}"
        ),
        JSON_EXAMPLE
    )
}

/// Prompt asking the model to report what a node accomplished.
pub fn summarize(goal: &str) -> String {
    format!(
        concat!(
            "Your task was to: {}\n\n",
            "Please summarize what you have done to acheive that goal, and include all details that might be relevant ",
            "for your colleague to build upon what you have worked on. For example, if you wrote code, describe how it should be used. ",
            "If you saved any output plots, describe where they are saved and what they contain. ",
            "If you saved any statistical results text, describe where they are saved and what they contain."
        ),
        goal
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_repair_prompt_embeds_the_error() {
        let prompt = default_error("NameError: name 'x' is not defined", "print(x)");
        assert!(prompt.starts_with("Your code returned this error NameError"));
    }

    #[test]
    fn install_prompt_includes_pip_template() {
        let prompt = module_error("No module named 'sklearn'");
        assert!(prompt.contains("No module named 'sklearn'"));
        assert!(prompt.contains("def install(package):"));
    }

    #[test]
    fn summarize_prompt_leads_with_goal() {
        assert!(summarize("Plot rates").starts_with("Your task was to: Plot rates\n\n"));
    }
}

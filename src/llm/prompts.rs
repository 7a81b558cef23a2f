use crate::models::{RepositoryData, TechStack};

const README_LIMIT: usize = 3_000;
const SETUP_README_LIMIT: usize = 2_000;
const MANIFEST_LIMIT: usize = 500;
const TREE_SAMPLE: usize = 50;

/// Prompt for the free-text repository summary.
pub fn summary_prompt(data: &RepositoryData) -> String {
    let mut prompt = String::from(
        "Analyze this GitHub repository and provide a comprehensive summary:\n\n\
         Repository Information:\n",
    );
    prompt.push_str(&format!("- Name: {}\n", data.info.name));
    prompt.push_str(&format!(
        "- Description: {}\n",
        data.info.description.as_deref().unwrap_or("N/A")
    ));
    prompt.push_str(&format!(
        "- Primary Language: {}\n",
        data.info.language.as_deref().unwrap_or("N/A")
    ));
    prompt.push_str(&format!("- Stars: {}\n", data.info.stargazers_count));
    prompt.push_str(&format!("- Forks: {}\n", data.info.forks_count));
    prompt.push_str(&format!("- Topics: {}\n", data.info.topics.join(", ")));

    prompt.push_str("\nREADME Content:\n");
    prompt.push_str(&readme_excerpt(data, README_LIMIT));

    prompt.push_str("\n\nPackage Files:\n");
    prompt.push_str(&format_manifests(data));

    prompt.push_str(
        "\n\nPlease provide:\n\
         1. A clear, concise summary of what this project does (2-3 sentences)\n\
         2. The main purpose and target audience\n\
         3. Key features and capabilities\n\
         4. Notable technologies or frameworks used\n\n\
         Format the response as a well-structured summary without markdown headers.\n",
    );
    prompt
}

/// Prompt for structured tech-stack extraction. The expected JSON shape
/// matches `TechStack` field for field.
pub fn tech_stack_prompt(data: &RepositoryData) -> String {
    let mut prompt = String::from(
        "Analyze this repository's technology stack and provide a detailed breakdown:\n\n\
         Programming Languages (by bytes of code):\n",
    );
    if data.languages.is_empty() {
        prompt.push_str("No language data\n");
    } else {
        let mut langs: Vec<_> = data.languages.iter().collect();
        langs.sort_by(|a, b| b.1.cmp(a.1));
        for (lang, bytes) in langs {
            prompt.push_str(&format!("- {}: {} bytes\n", lang, bytes));
        }
    }

    prompt.push_str("\nPackage/Dependency Files:\n");
    prompt.push_str(&format_manifests(data));

    prompt.push_str("\n\nFile Structure Sample:\n");
    for entry in data.tree.iter().take(TREE_SAMPLE) {
        if entry.is_dir() {
            prompt.push_str(&format!("{}/\n", entry.path));
        } else {
            prompt.push_str(&format!("{} ({} bytes)\n", entry.path, entry.size));
        }
    }

    prompt.push_str(&format!(
        "\nRepository Metadata:\n\
         - Primary Language: {}\n\
         - Topics: {}\n",
        data.info.language.as_deref().unwrap_or("N/A"),
        data.info.topics.join(", ")
    ));

    prompt.push_str(
        r#"
Please analyze and return a JSON object with the following structure:
{
    "primary_languages": ["language1", "language2"],
    "frameworks": ["framework1", "framework2"],
    "databases": ["db1", "db2"],
    "tools_and_services": ["tool1", "tool2"],
    "deployment": ["platform1", "platform2"],
    "testing": ["testing_framework1", "testing_framework2"],
    "build_tools": ["build_tool1", "build_tool2"],
    "package_managers": ["manager1", "manager2"],
    "development_tools": ["tool1", "tool2"],
    "api_technologies": ["api1", "api2"]
}

Only include technologies that you can confidently identify from the provided information.
Return only the JSON object, no additional text.
"#,
    );
    prompt
}

/// Prompt for the setup-instructions text. Includes the already-detected
/// stack so the instructions match it.
pub fn setup_prompt(data: &RepositoryData, tech_stack: &TechStack) -> String {
    let mut prompt = String::from(
        "Generate comprehensive setup and installation instructions for this repository:\n\n",
    );
    prompt.push_str(&format!("Repository: {}\n", data.info.name));
    prompt.push_str(&format!(
        "Primary Language: {}\n",
        data.info.language.as_deref().unwrap_or("N/A")
    ));

    prompt.push_str("\nREADME Content (excerpt):\n");
    prompt.push_str(&readme_excerpt(data, SETUP_README_LIMIT));

    prompt.push_str("\n\nPackage Files:\n");
    prompt.push_str(&format_manifests(data));

    prompt.push_str("\n\nDetected Tech Stack:\n");
    if tech_stack.is_empty() {
        prompt.push_str("No tech stack data\n");
    } else {
        for (label, entries) in tech_stack.categories() {
            prompt.push_str(&format!("- {}: {}\n", label, entries.join(", ")));
        }
    }

    prompt.push_str(
        "\nPlease provide step-by-step setup instructions including:\n\
         1. Prerequisites and system requirements\n\
         2. Installation steps\n\
         3. Configuration requirements\n\
         4. How to run/start the application\n\
         5. Basic usage examples\n\
         6. Common troubleshooting tips\n\n\
         Format as clear, numbered steps without markdown headers.\n\
         Be specific about commands and file locations where possible.\n",
    );
    prompt
}

fn readme_excerpt(data: &RepositoryData, limit: usize) -> String {
    match &data.readme {
        Some(readme) => truncate(readme, limit),
        None => "No README available".to_string(),
    }
}

fn format_manifests(data: &RepositoryData) -> String {
    if data.manifests.is_empty() {
        return "No package files found".to_string();
    }
    let mut names: Vec<_> = data.manifests.keys().collect();
    names.sort();
    names
        .into_iter()
        .map(|name| format!("{}:\n{}", name, truncate(&data.manifests[name], MANIFEST_LIMIT)))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn truncate(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        return text.to_string();
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

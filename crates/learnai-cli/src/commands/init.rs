//! The `learnai init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("learnai.toml").exists() {
        println!("learnai.toml already exists, skipping.");
    } else {
        std::fs::write("learnai.toml", SAMPLE_CONFIG)?;
        println!("Created learnai.toml");
    }

    println!("\nNext steps:");
    println!("  1. Point base_url at your LearnAI service (or set LEARNAI_API_URL)");
    println!("  2. Run: learnai learn --topic \"Rust programming\"");
    println!("  3. Run: learnai history \"Rust programming\"");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# learnai configuration

base_url = "${LEARNAI_API_URL}"
# timeout_secs = 120

# "resources" builds a learning path from videos and courses,
# "tutorial" writes a tutorial from suggested subtopics.
mode = "resources"

# "local" benchmarks against your own history,
# "remote" asks the service to compare you with other learners.
grading = "local"

default_duration_minutes = 60
# data_dir = "${HOME}/.local/share/learnai"
"#;

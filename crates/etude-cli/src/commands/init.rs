//! The `etude init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    // Create etude.toml
    if std::path::Path::new("etude.toml").exists() {
        println!("etude.toml already exists, skipping.");
    } else {
        std::fs::write("etude.toml", SAMPLE_CONFIG)?;
        println!("Created etude.toml");
    }

    // Create example quiz bank
    std::fs::create_dir_all("banks")?;
    let example_path = std::path::Path::new("banks/example.toml");
    if example_path.exists() {
        println!("banks/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_BANK)?;
        println!("Created banks/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit etude.toml to point at your quiz banks and state file");
    println!("  2. Run: etude validate --bank banks/example.toml");
    println!("  3. Run: etude take --quiz example --answers \"q1=a,q2=c\"");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# etude configuration

# Quiz bank file or directory
bank_dir = "banks"

# Where attempts and streaks persist between runs
state_file = "progress.json"

# Platform statistics cache TTL in seconds
stats_ttl_secs = 300

# Recent attempts shown in a user summary
recent_limit = 5
"#;

const EXAMPLE_BANK: &str = r#"[quiz]
id = "example"
title = "Example Quiz"
description = "A short starter quiz to check your setup"
difficulty = "easy"
category = "Fundamentals"

[[questions]]
id = "q1"
prompt = "How many lines does a standard musical staff have?"
topic = "notes"

[[questions.answers]]
id = "a"
text = "5"
correct = true

[[questions.answers]]
id = "b"
text = "4"

[[questions.answers]]
id = "c"
text = "6"

[[questions]]
id = "q2"
prompt = "Which note value gets one beat in 4/4 time?"
topic = "rhythm"

[[questions.answers]]
id = "a"
text = "Half note"

[[questions.answers]]
id = "b"
text = "Whole note"

[[questions.answers]]
id = "c"
text = "Quarter note"
correct = true
"#;
